//! Test categories, their target languages and category groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The source language a candidate call is notionally written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestLanguage {
    Python,
    Java,
    JavaScript,
}

impl FromStr for TestLanguage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(TestLanguage::Python),
            "java" => Ok(TestLanguage::Java),
            "javascript" | "js" => Ok(TestLanguage::JavaScript),
            _ => Err(CoreError::UnknownLanguage(s.to_string())),
        }
    }
}

/// Dataset revision, which selects the file name of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardVersion {
    #[default]
    V1,
    V2,
}

impl LeaderboardVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardVersion::V1 => "v1",
            LeaderboardVersion::V2 => "v2",
        }
    }
}

/// A benchmark test category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Simple,
    Java,
    Javascript,
    Relevance,
    MultipleFunction,
    ParallelFunction,
    ParallelMultipleFunction,
    ExecutableSimple,
    ExecutableParallelFunction,
    ExecutableMultipleFunction,
    ExecutableParallelMultipleFunction,
    Rest,
}

impl TestCategory {
    pub const ALL: [TestCategory; 12] = [
        TestCategory::Simple,
        TestCategory::MultipleFunction,
        TestCategory::ParallelFunction,
        TestCategory::ParallelMultipleFunction,
        TestCategory::Java,
        TestCategory::Javascript,
        TestCategory::Relevance,
        TestCategory::ExecutableSimple,
        TestCategory::ExecutableMultipleFunction,
        TestCategory::ExecutableParallelFunction,
        TestCategory::ExecutableParallelMultipleFunction,
        TestCategory::Rest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestCategory::Simple => "simple",
            TestCategory::Java => "java",
            TestCategory::Javascript => "javascript",
            TestCategory::Relevance => "relevance",
            TestCategory::MultipleFunction => "multiple_function",
            TestCategory::ParallelFunction => "parallel_function",
            TestCategory::ParallelMultipleFunction => "parallel_multiple_function",
            TestCategory::ExecutableSimple => "executable_simple",
            TestCategory::ExecutableParallelFunction => "executable_parallel_function",
            TestCategory::ExecutableMultipleFunction => "executable_multiple_function",
            TestCategory::ExecutableParallelMultipleFunction => {
                "executable_parallel_multiple_function"
            }
            TestCategory::Rest => "rest",
        }
    }

    /// The dialect the category's parameters are typed in.
    pub fn language(self) -> TestLanguage {
        match self {
            TestCategory::Java => TestLanguage::Java,
            TestCategory::Javascript => TestLanguage::JavaScript,
            _ => TestLanguage::Python,
        }
    }

    /// Categories checked by executing the candidate (REST included).
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            TestCategory::ExecutableSimple
                | TestCategory::ExecutableParallelFunction
                | TestCategory::ExecutableMultipleFunction
                | TestCategory::ExecutableParallelMultipleFunction
                | TestCategory::Rest
        )
    }

    /// Categories where exactly one call is expected.
    pub fn is_single_call(self) -> bool {
        matches!(self, TestCategory::Simple | TestCategory::ExecutableSimple)
    }

    /// Dataset file name for this category.
    pub fn file_name(self, version: LeaderboardVersion) -> String {
        format!(
            "gorilla_openfunctions_{}_test_{}.json",
            version.as_str(),
            self.as_str()
        )
    }

    /// Score file name for this category.
    pub fn score_file_name(self) -> String {
        format!("{}_score.json", self.as_str())
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// Named collections of categories used when selecting what to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    Ast,
    Executable,
    All,
    NonPython,
    Python,
    PythonAst,
}

impl CategoryGroup {
    pub fn categories(self) -> Vec<TestCategory> {
        use TestCategory::*;
        match self {
            CategoryGroup::Ast => vec![
                Simple,
                MultipleFunction,
                ParallelFunction,
                ParallelMultipleFunction,
                Java,
                Javascript,
                Relevance,
            ],
            CategoryGroup::Executable => vec![
                ExecutableSimple,
                ExecutableMultipleFunction,
                ExecutableParallelFunction,
                ExecutableParallelMultipleFunction,
                Rest,
            ],
            CategoryGroup::All => TestCategory::ALL.to_vec(),
            CategoryGroup::NonPython => vec![Java, Javascript],
            CategoryGroup::Python => TestCategory::ALL
                .into_iter()
                .filter(|c| c.language() == TestLanguage::Python)
                .collect(),
            CategoryGroup::PythonAst => vec![
                Simple,
                MultipleFunction,
                ParallelFunction,
                ParallelMultipleFunction,
                Relevance,
            ],
        }
    }
}

impl FromStr for CategoryGroup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "ast" => Ok(CategoryGroup::Ast),
            "executable" => Ok(CategoryGroup::Executable),
            "all" => Ok(CategoryGroup::All),
            "non_python" => Ok(CategoryGroup::NonPython),
            "python" => Ok(CategoryGroup::Python),
            "python_ast" => Ok(CategoryGroup::PythonAst),
            _ => Err(CoreError::UnknownGroup(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_round_trip() {
        for category in TestCategory::ALL {
            assert_eq!(category.as_str().parse::<TestCategory>().unwrap(), category);
        }
        assert!("parallel".parse::<TestCategory>().is_err());
    }

    #[test]
    fn languages_follow_category() {
        assert_eq!(TestCategory::Java.language(), TestLanguage::Java);
        assert_eq!(TestCategory::Javascript.language(), TestLanguage::JavaScript);
        assert_eq!(TestCategory::Rest.language(), TestLanguage::Python);
    }

    #[test]
    fn file_names() {
        assert_eq!(
            TestCategory::ParallelFunction.file_name(LeaderboardVersion::V1),
            "gorilla_openfunctions_v1_test_parallel_function.json"
        );
    }

    #[test]
    fn groups_partition_languages() {
        let python = CategoryGroup::Python.categories();
        assert_eq!(python.len(), 10);
        assert!(!python.contains(&TestCategory::Java));
        assert_eq!("non-python".parse::<CategoryGroup>().unwrap(), CategoryGroup::NonPython);
        assert!(CategoryGroup::Executable
            .categories()
            .iter()
            .all(|c| c.is_executable()));
    }
}
