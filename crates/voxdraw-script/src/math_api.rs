//! Built-in math namespace for draw scripts
//!
//! Every function accepts integers or floats. Functions that are closed over
//! the integers (`max`, `min`, `abs`, `mod`, `div`, `round`, `floor`, `ceil`)
//! return an integer when all arguments are integers; everything else returns
//! a float. Constants (`PI`, `TAU`, ...) are bare identifiers that resolve
//! anywhere in a script, including inside `fn draw`.

use rhai::{Array, Dynamic, Engine, EvalAltResult, FLOAT, INT};

type FnResult<T> = Result<T, Box<EvalAltResult>>;

/// Longest array `range` will build
pub const MAX_RANGE_LEN: usize = 1_000_000;

/// Named constants visible to scripts
pub const CONSTANTS: [(&str, FLOAT); 9] = [
    ("PI", std::f64::consts::PI),
    ("E", std::f64::consts::E),
    ("LN2", std::f64::consts::LN_2),
    ("LN10", std::f64::consts::LN_10),
    ("LOG2E", std::f64::consts::LOG2_E),
    ("LOG10E", std::f64::consts::LOG10_E),
    ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ("SQRT2", std::f64::consts::SQRT_2),
    ("TAU", std::f64::consts::TAU),
];

/// Look up a named constant
pub fn constant(name: &str) -> Option<FLOAT> {
    CONSTANTS
        .iter()
        .find(|(constant, _)| *constant == name)
        .map(|&(_, value)| value)
}

// ============================================================================
// Registration helpers
// ============================================================================

fn register_unary(engine: &mut Engine, name: &str, f: fn(FLOAT) -> FLOAT) {
    engine.register_fn(name, move |x: FLOAT| f(x));
    engine.register_fn(name, move |x: INT| f(x as FLOAT));
}

fn register_binary(engine: &mut Engine, name: &str, f: fn(FLOAT, FLOAT) -> FLOAT) {
    engine.register_fn(name, move |a: FLOAT, b: FLOAT| f(a, b));
    engine.register_fn(name, move |a: INT, b: FLOAT| f(a as FLOAT, b));
    engine.register_fn(name, move |a: FLOAT, b: INT| f(a, b as FLOAT));
    engine.register_fn(name, move |a: INT, b: INT| f(a as FLOAT, b as FLOAT));
}

/// Float overloads for mixed arguments, integer overload kept integral
fn register_integral_binary(
    engine: &mut Engine,
    name: &str,
    float: fn(FLOAT, FLOAT) -> FnResult<FLOAT>,
    int: fn(INT, INT) -> FnResult<INT>,
) {
    engine.register_fn(name, move |a: FLOAT, b: FLOAT| float(a, b));
    engine.register_fn(name, move |a: INT, b: FLOAT| float(a as FLOAT, b));
    engine.register_fn(name, move |a: FLOAT, b: INT| float(a, b as FLOAT));
    engine.register_fn(name, move |a: INT, b: INT| int(a, b));
}

// ============================================================================
// Integer-preserving functions
// ============================================================================

fn max_float(a: FLOAT, b: FLOAT) -> FnResult<FLOAT> {
    Ok(a.max(b))
}

fn max_int(a: INT, b: INT) -> FnResult<INT> {
    Ok(a.max(b))
}

fn min_float(a: FLOAT, b: FLOAT) -> FnResult<FLOAT> {
    Ok(a.min(b))
}

fn min_int(a: INT, b: INT) -> FnResult<INT> {
    Ok(a.min(b))
}

/// Floored modulo: the result takes the sign of the divisor
fn mod_float(a: FLOAT, b: FLOAT) -> FnResult<FLOAT> {
    if b == 0.0 {
        return Err("mod: division by zero".into());
    }
    let r = a % b;
    Ok(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
}

fn mod_int(a: INT, b: INT) -> FnResult<INT> {
    if b == 0 {
        return Err("mod: division by zero".into());
    }
    let r = a.checked_rem(b).ok_or("mod: integer overflow")?;
    Ok(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
}

/// Floored division
fn div_float(a: FLOAT, b: FLOAT) -> FnResult<FLOAT> {
    if b == 0.0 {
        return Err("div: division by zero".into());
    }
    Ok((a / b).floor())
}

fn div_int(a: INT, b: INT) -> FnResult<INT> {
    if b == 0 {
        return Err("div: division by zero".into());
    }
    let q = a.checked_div(b).ok_or("div: integer overflow")?;
    Ok(if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q })
}

fn abs_int(x: INT) -> FnResult<INT> {
    x.checked_abs().ok_or_else(|| "abs: integer overflow".into())
}

// ============================================================================
// Sequences
// ============================================================================

fn range_int(start: INT, stop: INT, step: INT) -> FnResult<Array> {
    if step == 0 {
        return Err("range: step must not be zero".into());
    }

    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let len = if span <= 0 {
        0
    } else {
        span.unsigned_abs()
            .div_ceil(u128::from(step.unsigned_abs()))
    };
    if len > MAX_RANGE_LEN as u128 {
        return Err(format!("range: more than {MAX_RANGE_LEN} elements").into());
    }

    // Elements are computed in i128; `i * step` alone can leave the INT range
    (0..len as i128)
        .map(|i| {
            INT::try_from(i128::from(start) + i * i128::from(step))
                .map(Dynamic::from)
                .map_err(|_| -> Box<EvalAltResult> { "range: integer overflow".into() })
        })
        .collect()
}

fn range_float(start: FLOAT, stop: FLOAT, step: FLOAT) -> FnResult<Array> {
    if step == 0.0 || !step.is_finite() {
        return Err("range: step must be a non-zero number".into());
    }

    let len = ((stop - start) / step).ceil().max(0.0);
    if !len.is_finite() || len > MAX_RANGE_LEN as FLOAT {
        return Err(format!("range: more than {MAX_RANGE_LEN} elements").into());
    }

    Ok((0..len as INT)
        .map(|i| Dynamic::from(start + i as FLOAT * step))
        .collect())
}

// ============================================================================
// Registration
// ============================================================================

/// Register the math namespace with a Rhai engine
#[allow(deprecated)] // `on_var` is flagged as a volatile API
pub fn register_math_api(engine: &mut Engine) {
    // Integer-preserving
    register_integral_binary(engine, "max", max_float, max_int);
    register_integral_binary(engine, "min", min_float, min_int);
    register_integral_binary(engine, "mod", mod_float, mod_int);
    register_integral_binary(engine, "div", div_float, div_int);
    engine.register_fn("abs", |x: FLOAT| x.abs());
    engine.register_fn("abs", abs_int);
    engine.register_fn("round", |x: FLOAT| x.round());
    engine.register_fn("floor", |x: FLOAT| x.floor());
    engine.register_fn("ceil", |x: FLOAT| x.ceil());
    for name in ["round", "floor", "ceil"] {
        engine.register_fn(name, |x: INT| x);
    }

    // Float-valued
    register_unary(engine, "sqrt", FLOAT::sqrt);
    register_unary(engine, "sin", FLOAT::sin);
    register_unary(engine, "cos", FLOAT::cos);
    register_unary(engine, "tan", FLOAT::tan);
    register_unary(engine, "asin", FLOAT::asin);
    register_unary(engine, "acos", FLOAT::acos);
    register_unary(engine, "atan", FLOAT::atan);
    register_unary(engine, "log", FLOAT::ln);
    register_unary(engine, "exp", FLOAT::exp);
    register_unary(engine, "log10", FLOAT::log10);
    register_unary(engine, "log2", FLOAT::log2);
    register_unary(engine, "log1p", FLOAT::ln_1p);
    register_binary(engine, "atan2", FLOAT::atan2);
    register_binary(engine, "pow", FLOAT::powf);
    register_binary(engine, "hypot", FLOAT::hypot);
    engine.register_fn("random", || rand::random::<FLOAT>());

    // Sequences
    engine.register_fn("range", range_int);
    engine.register_fn("range", |start: INT, stop: INT| range_int(start, stop, 1));
    engine.register_fn("range", range_float);
    engine.register_fn("len", |array: &mut Array| array.len() as INT);
    engine.register_fn("len", |text: &str| text.chars().count() as INT);

    // Constants
    // Script bindings shadow constants; a non-zero index means a resolved local
    engine.on_var(|name, index, context| {
        if index > 0 || context.scope().contains(name) {
            return Ok(None);
        }
        Ok(constant(name).map(Dynamic::from))
    });
}
