//! The operator table.
//!
//! A precedence-ordered registry of binary reduction operators. The
//! table is iterated in ascending precedence during reduction (lower
//! number = tighter binding = applied earlier); ties fall back to
//! declaration order. The tokenizer's atom set is derived from the
//! display names here, so adding an operator is one new entry.
//!
//! Several operators return a pair with the left operand passed through
//! unchanged (`$`, `not`, `@`, `#`). That convention is what lets them
//! act as unary operators inside a strictly binary grammar: the reducer
//! brackets the sequence with sentinels, and a pass-through handler at
//! the boundary hands the sentinel back intact.

use crate::engine::Engine;
use crate::error::EvalError;
use crate::signal::EvalResult;
use crate::value::Value;

pub struct OpEntry {
    pub name: &'static str,
    pub prec: u16,
    pub apply: fn(&mut Engine, Value, Value) -> EvalResult<Vec<Value>>,
}

// Within one precedence tier the declaration order is the tie-break and
// is observable: the tier's first listed operator reduces first, so the
// arithmetic tiers list their members in left-to-right-friendly order
// (`-` before `+`, `/` before `*`).
pub static OPERATORS: &[OpEntry] = &[
    OpEntry { name: "$", prec: 0, apply: op_deref },
    OpEntry { name: ".", prec: 1, apply: op_access },
    OpEntry { name: "@", prec: 100, apply: op_splice },
    OpEntry { name: "!", prec: 100, apply: op_not },
    OpEntry { name: "#", prec: 100, apply: op_length },
    OpEntry { name: "not", prec: 100, apply: op_not },
    OpEntry { name: "..", prec: 200, apply: op_range },
    OpEntry { name: "to", prec: 200, apply: op_range },
    OpEntry { name: "^", prec: 300, apply: op_pow },
    OpEntry { name: "%", prec: 400, apply: op_rem },
    OpEntry { name: "/", prec: 400, apply: op_div },
    OpEntry { name: "*", prec: 400, apply: op_mul },
    OpEntry { name: "-", prec: 500, apply: op_sub },
    OpEntry { name: "+", prec: 500, apply: op_add },
    OpEntry { name: "!=", prec: 600, apply: op_ne },
    OpEntry { name: "==", prec: 600, apply: op_eq },
    OpEntry { name: ">", prec: 700, apply: op_gt },
    OpEntry { name: ">=", prec: 700, apply: op_ge },
    OpEntry { name: "<", prec: 700, apply: op_lt },
    OpEntry { name: "<=", prec: 700, apply: op_le },
    OpEntry { name: "contains", prec: 800, apply: op_contains },
    OpEntry { name: "does not contain", prec: 800, apply: op_not_contains },
    OpEntry { name: "does not have", prec: 800, apply: op_not_contains },
    OpEntry { name: "doesn't contain", prec: 800, apply: op_not_contains },
    OpEntry { name: "doesn't have", prec: 800, apply: op_not_contains },
    OpEntry { name: "has", prec: 800, apply: op_contains },
    OpEntry { name: "is in", prec: 800, apply: op_in },
    OpEntry { name: "is not in", prec: 800, apply: op_not_in },
    OpEntry { name: "in", prec: 801, apply: op_in },
    OpEntry { name: "not in", prec: 801, apply: op_not_in },
    OpEntry { name: "&&", prec: 900, apply: op_and },
    OpEntry { name: "||", prec: 900, apply: op_or },
    OpEntry { name: "and", prec: 900, apply: op_and },
    OpEntry { name: "or", prec: 900, apply: op_or },
    OpEntry { name: "if", prec: 1000, apply: op_if },
    OpEntry { name: "else", prec: 1001, apply: op_else },
];

/// The atom strings the tokenizer must recognize as units.
pub fn atom_names() -> Vec<&'static str> {
    OPERATORS.iter().map(|op| op.name).collect()
}

/// `$name`: variable dereference; left passes through for chaining.
fn op_deref(engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let name = right.key_string();
    let value = engine
        .get(&name)
        .ok_or(EvalError::UnboundVariable(name))?;
    Ok(vec![left, value])
}

/// `container.key`: host attribute if the target offers one, else
/// indexed/keyed access.
fn op_access(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    if let (Value::Opaque(object), Some(name)) = (&left, right.as_text()) {
        if let Some(value) = object.attr(name) {
            return Ok(vec![value]);
        }
    }
    let value = match (&left, &right) {
        (Value::Map(entries), key) => {
            let key = key.key_string();
            entries
                .borrow()
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .ok_or(EvalError::KeyNotFound(key))?
        }
        (Value::List(items), Value::Int(index)) => {
            let items = items.borrow();
            let at = normalize_index(*index, items.len())
                .ok_or(EvalError::IndexOutOfRange(*index))?;
            items[at].clone()
        }
        (Value::Str(s), Value::Int(index)) => {
            let chars: Vec<char> = s.chars().collect();
            let at = normalize_index(*index, chars.len())
                .ok_or(EvalError::IndexOutOfRange(*index))?;
            Value::text(chars[at].to_string())
        }
        (Value::Range(start, end), Value::Int(index)) => {
            let len = (end - start).max(0) as usize;
            let at = normalize_index(*index, len).ok_or(EvalError::IndexOutOfRange(*index))?;
            Value::Int(start + at as i64)
        }
        _ => {
            return Err(EvalError::TypeError(format!(
                "cannot access '{}' on {}",
                right,
                left.type_name()
            ))
            .into());
        }
    };
    Ok(vec![value])
}

/// Negative indices count from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let at = if index < 0 { index + len as i64 } else { index };
    (0..len as i64).contains(&at).then_some(at as usize)
}

fn op_not(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![left, Value::Bool(!right.is_truthy())])
}

/// `@x`: flatten an iterable right operand in place.
fn op_splice(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    match right.iter_elements() {
        Some(elements) => {
            let mut out = vec![left];
            out.extend(elements);
            Ok(out)
        }
        None => Ok(vec![left, right]),
    }
}

fn op_length(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let len = right.length().ok_or_else(|| {
        EvalError::TypeError(format!("cannot take the length of {}", right.type_name()))
    })?;
    Ok(vec![left, Value::Int(len)])
}

fn op_range(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    match (&left, &right) {
        (Value::Int(start), Value::Int(end)) => Ok(vec![Value::Range(*start, *end)]),
        _ => Err(EvalError::TypeError(format!(
            "range bounds must be integers, found {} and {}",
            left.type_name(),
            right.type_name()
        ))
        .into()),
    }
}

fn op_pow(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let value = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) if *b >= 0 => {
            let exp = u32::try_from(*b).map_err(|_| EvalError::IntegerOverflow)?;
            Value::Int(a.checked_pow(exp).ok_or(EvalError::IntegerOverflow)?)
        }
        _ => numeric_pair(&left, &right, "^").map(|(a, b)| Value::Float(a.powf(b)))?,
    };
    Ok(vec![value])
}

fn op_mul(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let value = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            Value::Int(a.checked_mul(*b).ok_or(EvalError::IntegerOverflow)?)
        }
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Value::text(s.repeat((*n).max(0) as usize))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let items = items.borrow();
            let mut out = Vec::new();
            for _ in 0..(*n).max(0) {
                out.extend(items.iter().cloned());
            }
            Value::list(out)
        }
        _ => numeric_pair(&left, &right, "*").map(|(a, b)| Value::Float(a * b))?,
    };
    Ok(vec![value])
}

/// Division always produces a float.
fn op_div(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let (a, b) = numeric_pair(&left, &right, "/")?;
    if b == 0.0 {
        return Err(EvalError::DivisionByZero.into());
    }
    Ok(vec![Value::Float(a / b)])
}

/// Remainder follows the divisor's sign.
fn op_rem(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let value = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(EvalError::DivisionByZero.into());
            }
            Value::Int(((a % b) + b) % b)
        }
        _ => {
            let (a, b) = numeric_pair(&left, &right, "%")?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero.into());
            }
            Value::Float(a - b * (a / b).floor())
        }
    };
    Ok(vec![value])
}

fn op_add(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let value = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            Value::Int(a.checked_add(*b).ok_or(EvalError::IntegerOverflow)?)
        }
        (Value::Str(a), Value::Str(b)) => Value::text(format!("{a}{b}")),
        (Value::List(a), Value::List(b)) => {
            let mut out = a.borrow().clone();
            out.extend(b.borrow().iter().cloned());
            Value::list(out)
        }
        _ => numeric_pair(&left, &right, "+").map(|(a, b)| Value::Float(a + b))?,
    };
    Ok(vec![value])
}

fn op_sub(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    let value = match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            Value::Int(a.checked_sub(*b).ok_or(EvalError::IntegerOverflow)?)
        }
        _ => numeric_pair(&left, &right, "-").map(|(a, b)| Value::Float(a - b))?,
    };
    Ok(vec![value])
}

fn numeric_pair(left: &Value, right: &Value, op: &str) -> Result<(f64, f64), EvalError> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::TypeError(format!(
            "cannot apply '{}' to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn op_eq(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(left == right)])
}

fn op_ne(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(left != right)])
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => {
            let (a, b) = numeric_pair(left, right, "compare")?;
            a.partial_cmp(&b)
                .ok_or_else(|| EvalError::TypeError("cannot compare with NaN".to_string()))
        }
    }
}

fn op_le(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(compare(&left, &right)?.is_le())])
}

fn op_ge(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(compare(&left, &right)?.is_ge())])
}

fn op_lt(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(compare(&left, &right)?.is_lt())])
}

fn op_gt(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(compare(&left, &right)?.is_gt())])
}

/// Membership test: `item` within `container`.
fn contains_value(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) => Ok(items.borrow().iter().any(|element| element == item)),
        Value::Range(start, end) => match item {
            Value::Int(n) => Ok((*start..*end).contains(n)),
            _ => Err(EvalError::TypeError(format!(
                "a range cannot contain {}",
                item.type_name()
            ))),
        },
        Value::Str(s) => match item.as_text() {
            Some(needle) => Ok(s.contains(needle)),
            None => Err(EvalError::TypeError(format!(
                "cannot search text for {}",
                item.type_name()
            ))),
        },
        Value::Map(entries) => {
            let key = item.key_string();
            Ok(entries.borrow().iter().any(|(k, _)| *k == key))
        }
        _ => Err(EvalError::TypeError(format!(
            "{} is not a container",
            container.type_name()
        ))),
    }
}

fn op_in(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(contains_value(&right, &left)?)])
}

fn op_not_in(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(!contains_value(&right, &left)?)])
}

/// `contains`/`has` reverse operand order relative to `in`.
fn op_contains(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(contains_value(&left, &right)?)])
}

fn op_not_contains(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![Value::Bool(!contains_value(&left, &right)?)])
}

/// Eager, operand-returning conjunction; both sides are already
/// evaluated by the time the operator applies, so there is nothing to
/// short-circuit.
fn op_and(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![if left.is_truthy() { right } else { left }])
}

fn op_or(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![if left.is_truthy() { left } else { right }])
}

/// `value if cond`: a single-element list when the condition holds,
/// else the absent value; `else` unwraps the pair's output.
fn op_if(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    Ok(vec![if right.is_truthy() {
        Value::list(vec![left])
    } else {
        Value::Nil
    }])
}

fn op_else(_engine: &mut Engine, left: Value, right: Value) -> EvalResult<Vec<Value>> {
    match &left {
        Value::Nil => Ok(vec![right]),
        Value::List(items) => {
            let first = items.borrow().first().cloned();
            match first {
                Some(value) => Ok(vec![value]),
                None => Err(EvalError::TypeError(
                    "'else' without a preceding 'if'".to_string(),
                )
                .into()),
            }
        }
        _ => Err(EvalError::TypeError("'else' without a preceding 'if'".to_string()).into()),
    }
}
