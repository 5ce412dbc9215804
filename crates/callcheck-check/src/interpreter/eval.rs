//! Evaluation of parsed expressions against a [`FunctionLibrary`].

use callcheck_core::Value;
use indexmap::IndexMap;

use super::error::ExecError;
use super::library::FunctionLibrary;
use super::parser::{parse, Expr};

/// Parses and evaluates a candidate expression such as
/// `calculate_triangle_area(base=10, height=5)`.
pub fn evaluate(source: &str, library: &FunctionLibrary) -> Result<Value, ExecError> {
    let expr = parse(source)?;
    let result = eval(&expr, library);
    match &result {
        Ok(value) => tracing::debug!(call = source, result = %value, "evaluated"),
        Err(err) => tracing::debug!(call = source, error = %err, "evaluation failed"),
    }
    result
}

/// Evaluates an already parsed expression.
pub fn eval(expr: &Expr, library: &FunctionLibrary) -> Result<Value, ExecError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => Err(ExecError::UnknownName { name: name.clone() }),
        Expr::List(items) => Ok(Value::List(eval_all(items, library)?)),
        Expr::Tuple(items) => Ok(Value::Tuple(eval_all(items, library)?)),
        Expr::Set(items) => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for value in eval_all(items, library)? {
                if !unique.contains(&value) {
                    unique.push(value);
                }
            }
            Ok(Value::Set(unique))
        }
        Expr::Dict(entries) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match eval(key, library)? {
                    Value::Str(s) => s,
                    other => return Err(ExecError::InvalidKey { key: other.to_string() }),
                };
                map.insert(key, eval(value, library)?);
            }
            Ok(Value::Dict(map))
        }
        Expr::Neg(inner) => match eval(inner, library)? {
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(ExecError::BadOperand {
                op: '-',
                found: other.type_name().to_string(),
            }),
        },
        Expr::Call {
            function,
            args,
            kwargs,
        } => {
            let positional = eval_all(args, library)?;
            let keywords = kwargs
                .iter()
                .map(|(name, value)| Ok((name.clone(), eval(value, library)?)))
                .collect::<Result<Vec<_>, ExecError>>()?;
            library.call(function, positional, keywords)
        }
    }
}

fn eval_all(items: &[Expr], library: &FunctionLibrary) -> Result<Vec<Value>, ExecError> {
    items.iter().map(|item| eval(item, library)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_helper_calls_with_nested_arguments() {
        let library = FunctionLibrary::with_defaults();
        let value = evaluate("calculate_mean(numbers=[1, 2, -3.0, math_factorial(3)])", &library)
            .unwrap();
        assert_eq!(value, Value::Float(1.5));
    }

    #[test]
    fn literals_evaluate_without_helpers() {
        let library = FunctionLibrary::new();
        let value = evaluate("{'a': (1, 2), 'b': {3, 3, 4}, 'c': None}", &library).unwrap();
        let dict = value.as_dict().unwrap();
        assert!(matches!(dict["a"], Value::Tuple(_)));
        assert_eq!(dict["b"], Value::Set(vec![Value::Int(3), Value::Int(4)]));
        assert_eq!(dict["c"], Value::None);
    }

    #[test]
    fn evaluation_errors() {
        let library = FunctionLibrary::with_defaults();
        assert!(matches!(
            evaluate("math_gcd(a=x, b=1)", &library),
            Err(ExecError::UnknownName { .. })
        ));
        assert!(matches!(
            evaluate("os.system('ls')", &library),
            Err(ExecError::UnknownFunction { .. })
        ));
        assert!(matches!(
            evaluate("-'a'", &library),
            Err(ExecError::BadOperand { op: '-', .. })
        ));
        assert!(matches!(
            evaluate("{1: 2}", &library),
            Err(ExecError::InvalidKey { .. })
        ));
        assert!(matches!(
            evaluate("quadratic_roots(1, 0, 1)", &library),
            Err(ExecError::Helper { .. })
        ));
    }
}
