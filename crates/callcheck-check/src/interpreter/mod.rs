//! Sandboxed evaluator for executable candidate calls.
//!
//! Candidate output in the executable categories is a Python-style call
//! expression. Instead of running it in a host interpreter, the expression
//! is tokenized, parsed into an [`Expr`] and evaluated against a
//! [`FunctionLibrary`] of registered helpers. Nothing outside the library
//! can be reached: names that are not literals fail with
//! [`ExecError::UnknownName`], calls to unregistered functions with
//! [`ExecError::UnknownFunction`].
//!
//! # Usage
//!
//! ```ignore
//! let library = FunctionLibrary::with_defaults();
//! let area = evaluate("calculate_triangle_area(base=10, height=5)", &library)?;
//! assert_eq!(area, Value::Float(25.0));
//! ```

mod builtins;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod library;
pub mod parser;

pub use error::{ExecError, HelperError};
pub use eval::evaluate;
pub use library::FunctionLibrary;
pub use parser::{parse, Expr};

#[cfg(test)]
mod tests {
    use super::*;
    use callcheck_core::Value;

    #[test]
    fn custom_helpers_sit_beside_defaults() {
        let mut helpers = FunctionLibrary::with_defaults();
        helpers.register("get_weather", &["city", "unit"], |args| {
            let city = library::text(args, "city")?;
            let unit = args.get("unit").and_then(Value::as_str).unwrap_or("celsius");
            Ok(Value::from(format!("{}:{}", city, unit)))
        });

        assert_eq!(
            evaluate("get_weather('Paris')", &helpers).unwrap(),
            Value::from("Paris:celsius")
        );
        assert_eq!(
            evaluate("math_gcd(8, 12)", &helpers).unwrap(),
            Value::Int(4)
        );
    }

    #[test]
    fn errors_render_like_python_tracebacks() {
        let library = FunctionLibrary::with_defaults();
        let err = evaluate("math_gcd(1, 2, 3)", &library).unwrap_err();
        assert_eq!(
            err.to_string(),
            "math_gcd() takes 2 positional argument(s) but 3 were given"
        );
        let err = evaluate("math_gcd(1, b=2, c=3)", &library).unwrap_err();
        assert_eq!(
            err.to_string(),
            "math_gcd() got an unexpected keyword argument 'c'"
        );
    }
}
