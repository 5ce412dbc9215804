//! Default helpers registered by [`FunctionLibrary::with_defaults`].
//!
//! All helpers are deterministic and side-effect free. Results follow Python
//! typing: integer arithmetic stays `int`, anything involving division or
//! roots is `float`.

use callcheck_core::{CallArgs, Value};

use super::error::HelperError;
use super::library::{integer, matrix, number, numbers, text, FunctionLibrary};

impl FunctionLibrary {
    /// A library preloaded with the standard math helpers.
    pub fn with_defaults() -> Self {
        let mut library = FunctionLibrary::new();
        library
            .register("calculate_triangle_area", &["base", "height"], triangle_area)
            .register("calculate_power", &["base", "exponent"], power)
            .register("calculate_factorial", &["n"], factorial)
            .register("math_factorial", &["n"], factorial)
            .register("math_gcd", &["a", "b"], gcd)
            .register("math_lcm", &["a", "b"], lcm)
            .register("calculate_mean", &["numbers"], mean)
            .register("calculate_standard_deviation", &["numbers"], standard_deviation)
            .register("calculate_permutations", &["n", "k"], permutations)
            .register("quadratic_roots", &["a", "b", "c"], quadratic_roots)
            .register("add_binary_numbers", &["a", "b"], add_binary)
            .register("get_prime_factors", &["number"], prime_factors)
            .register(
                "calculate_cosine_similarity",
                &["vectorA", "vectorB"],
                cosine_similarity,
            )
            .register("mat_mul", &["matA", "matB"], mat_mul);
        library
    }
}

fn triangle_area(args: &CallArgs) -> Result<Value, HelperError> {
    Ok(Value::Float(0.5 * number(args, "base")? * number(args, "height")?))
}

fn power(args: &CallArgs) -> Result<Value, HelperError> {
    if let (Ok(base), Ok(exponent)) = (integer(args, "base"), integer(args, "exponent")) {
        if let Ok(exponent) = u32::try_from(exponent) {
            if let Some(result) = base.checked_pow(exponent) {
                return Ok(Value::Int(result));
            }
        }
    }
    let base = number(args, "base")?;
    let exponent = number(args, "exponent")?;
    let result = base.powf(exponent);
    if result.is_nan() {
        return Err(HelperError::domain("math domain error"));
    }
    Ok(Value::Float(result))
}

fn checked_factorial(n: i64) -> Result<i64, HelperError> {
    if n < 0 {
        return Err(HelperError::domain("factorial() not defined for negative values"));
    }
    (1..=n).try_fold(1i64, |acc, k| {
        acc.checked_mul(k)
            .ok_or_else(|| HelperError::domain("integer result too large"))
    })
}

fn factorial(args: &CallArgs) -> Result<Value, HelperError> {
    checked_factorial(integer(args, "n")?).map(Value::Int)
}

fn gcd_of(a: i64, b: i64) -> Result<i64, HelperError> {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).map_err(|_| HelperError::domain("integer result too large"))
}

fn gcd(args: &CallArgs) -> Result<Value, HelperError> {
    gcd_of(integer(args, "a")?, integer(args, "b")?).map(Value::Int)
}

fn lcm(args: &CallArgs) -> Result<Value, HelperError> {
    let a = integer(args, "a")?;
    let b = integer(args, "b")?;
    if a == 0 || b == 0 {
        return Ok(Value::Int(0));
    }
    (a / gcd_of(a, b)?)
        .checked_mul(b)
        .map(|l| Value::Int(l.abs()))
        .ok_or_else(|| HelperError::domain("integer result too large"))
}

fn non_empty(args: &CallArgs, name: &str) -> Result<Vec<f64>, HelperError> {
    let values = numbers(args, name)?;
    if values.is_empty() {
        return Err(HelperError::domain(format!("'{}' must not be empty", name)));
    }
    Ok(values)
}

fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn mean(args: &CallArgs) -> Result<Value, HelperError> {
    Ok(Value::Float(mean_of(&non_empty(args, "numbers")?)))
}

/// Population standard deviation.
fn standard_deviation(args: &CallArgs) -> Result<Value, HelperError> {
    let values = non_empty(args, "numbers")?;
    let mean = mean_of(&values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(Value::Float(variance.sqrt()))
}

fn permutations(args: &CallArgs) -> Result<Value, HelperError> {
    let n = integer(args, "n")?;
    let k = integer(args, "k")?;
    if n < 0 || k < 0 {
        return Err(HelperError::domain("n and k must be non-negative"));
    }
    if k > n {
        return Ok(Value::Int(0));
    }
    ((n - k + 1)..=n)
        .try_fold(1i64, |acc, factor| acc.checked_mul(factor))
        .map(Value::Int)
        .ok_or_else(|| HelperError::domain("integer result too large"))
}

fn quadratic_roots(args: &CallArgs) -> Result<Value, HelperError> {
    let a = number(args, "a")?;
    let b = number(args, "b")?;
    let c = number(args, "c")?;
    if a == 0.0 {
        return Err(HelperError::domain("'a' must be non-zero"));
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(HelperError::domain("math domain error"));
    }
    let root = discriminant.sqrt();
    Ok(Value::List(vec![
        Value::Float((-b + root) / (2.0 * a)),
        Value::Float((-b - root) / (2.0 * a)),
    ]))
}

fn add_binary(args: &CallArgs) -> Result<Value, HelperError> {
    let parse = |name: &str| -> Result<u128, HelperError> {
        let digits = text(args, name)?;
        u128::from_str_radix(digits, 2).map_err(|_| {
            HelperError::domain(format!("invalid literal for int() with base 2: '{}'", digits))
        })
    };
    let sum = parse("a")?
        .checked_add(parse("b")?)
        .ok_or_else(|| HelperError::domain("integer result too large"))?;
    Ok(Value::Str(format!("{:b}", sum)))
}

fn prime_factors(args: &CallArgs) -> Result<Value, HelperError> {
    let mut n = integer(args, "number")?;
    let mut factors = Vec::new();
    let mut divisor = 2;
    while n > 1 && divisor <= n / divisor {
        while n % divisor == 0 {
            factors.push(Value::Int(divisor));
            n /= divisor;
        }
        divisor += 1;
    }
    if n > 1 {
        factors.push(Value::Int(n));
    }
    Ok(Value::List(factors))
}

fn cosine_similarity(args: &CallArgs) -> Result<Value, HelperError> {
    let a = numbers(args, "vectorA")?;
    let b = numbers(args, "vectorB")?;
    if a.len() != b.len() {
        return Err(HelperError::domain("vectors must have the same length"));
    }
    let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denominator = norm(&a) * norm(&b);
    if denominator == 0.0 {
        return Err(HelperError::domain("float division by zero"));
    }
    Ok(Value::Float(dot / denominator))
}

fn mat_mul(args: &CallArgs) -> Result<Value, HelperError> {
    let a = matrix(args, "matA")?;
    let b = matrix(args, "matB")?;
    let inner = b.len();
    let columns = b.first().map_or(0, Vec::len);
    if a.iter().any(|row| row.len() != inner) || b.iter().any(|row| row.len() != columns) {
        return Err(HelperError::domain("matrix dimensions do not align"));
    }
    let product = a
        .iter()
        .map(|row| {
            let cells = (0..columns)
                .map(|j| Value::Float(row.iter().zip(&b).map(|(x, brow)| x * brow[j]).sum()))
                .collect();
            Value::List(cells)
        })
        .collect();
    Ok(Value::List(product))
}
