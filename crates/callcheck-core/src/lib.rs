pub mod answer;
pub mod candidate;
pub mod category;
pub mod error;
pub mod schema;
pub mod value;
pub mod verdict;

// Re-export commonly used types
pub use answer::{ExpectedCall, GroundTruth};
pub use candidate::{CallArgs, CandidateCall};
pub use category::{CategoryGroup, LeaderboardVersion, TestCategory, TestLanguage};
pub use error::CoreError;
pub use schema::{find_schema, FunctionSchema, ItemSpec, ParamSpec, Parameters};
pub use value::{Value, ValueKind};
pub use verdict::{Attempt, DiagnosticList, ErrorType, Failure, FailureMessage, Verdict};
