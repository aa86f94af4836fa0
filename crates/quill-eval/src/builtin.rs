//! Built-in functions.
//!
//! Each builtin receives its own trimmed raw argument text and parses
//! it by convention: most reduce it as an expression, the printing ones
//! interpolate it, `list` splits it at top-level commas first.

use crate::engine::Engine;
use crate::error::EvalError;
use crate::signal::{EvalResult, Interrupt};
use crate::value::Value;

pub type BuiltinFn = fn(&mut Engine, &str) -> EvalResult<Value>;

/// Look a builtin up by its call name.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, run)| *run)
}

static BUILTINS: &[(&str, BuiltinFn)] = &[
    ("say", say),
    ("puts", puts),
    ("set", set),
    ("silently", silently),
    ("list", list),
    ("dict", dict),
    ("setsub", setsub),
    ("done", done),
    ("next", next),
    ("abort", abort),
    ("return", return_),
    ("eval", eval),
    ("quote", quote),
    ("ask", ask),
    ("confirm", confirm),
    ("call", call),
];

/// Interpolate and print with a trailing newline.
fn say(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let line = engine.interpolate(arg)?;
    engine.print_line(&line);
    Ok(Value::Nil)
}

/// Interpolate and print without a trailing newline.
fn puts(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let text = engine.interpolate(arg)?;
    engine.print(&text);
    Ok(Value::Nil)
}

/// Assign name/value pairs from the flattened expression; a trailing
/// lone name reads instead.
fn set(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let values = engine.expr(arg)?;
    let mut result = Value::Nil;
    let mut pairs = values.chunks_exact(2);
    for pair in &mut pairs {
        let name = pair[0].key_string();
        engine.set(&name, pair[1].clone());
        result = pair[1].clone();
    }
    if let [single] = pairs.remainder() {
        let name = single.key_string();
        result = engine
            .get(&name)
            .ok_or(EvalError::UnboundVariable(name))?;
    }
    Ok(result)
}

/// Evaluate the argument with output suppressed, restoring the previous
/// silencing on every exit path.
fn silently(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let previous = engine.silenced();
    engine.set_silenced(true);
    let result = engine.eval(&Value::text(arg));
    engine.set_silenced(previous);
    result
}

/// Build a list from comma-separated expression pieces, splicing each
/// piece's value sequence.
fn list(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let mut items = Vec::new();
    for piece in engine.split(arg, ',')? {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        items.extend(engine.expr(piece)?);
    }
    Ok(Value::list(items))
}

/// Build a mapping from reduced values, each a two-element [key value]
/// list.
fn dict(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let values = engine.expr(arg)?;
    let mut entries: Vec<(String, Value)> = Vec::new();
    for value in values {
        let Value::List(pair) = &value else {
            return Err(EvalError::TypeError(format!(
                "dict expects [key value] pairs, found {}",
                value.type_name()
            ))
            .into());
        };
        let pair = pair.borrow();
        let [key, item] = pair.as_slice() else {
            return Err(EvalError::TypeError(format!(
                "dict expects [key value] pairs, found {} elements",
                pair.len()
            ))
            .into());
        };
        upsert(&mut entries, key.key_string(), item.clone());
    }
    Ok(Value::map(entries))
}

fn upsert(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// Index/key assignment on a shared container: `setsub container key
/// value` yields the assigned value.
fn setsub(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let values = engine.expr(arg)?;
    let [container, key, value] = values.as_slice() else {
        return Err(EvalError::TypeError(format!(
            "setsub expects a container, a key, and a value, found {} values",
            values.len()
        ))
        .into());
    };
    match container {
        Value::Map(entries) => {
            upsert(&mut entries.borrow_mut(), key.key_string(), value.clone());
        }
        Value::List(items) => {
            let Value::Int(index) = key else {
                return Err(EvalError::TypeError(format!(
                    "list indices must be integers, found {}",
                    key.type_name()
                ))
                .into());
            };
            let mut items = items.borrow_mut();
            let len = items.len();
            let at = if *index < 0 { index + len as i64 } else { *index };
            if !(0..len as i64).contains(&at) {
                return Err(EvalError::IndexOutOfRange(*index).into());
            }
            items[at as usize] = value.clone();
        }
        other => {
            return Err(EvalError::TypeError(format!(
                "cannot assign into {}",
                other.type_name()
            ))
            .into());
        }
    }
    Ok(value.clone())
}

fn done(_engine: &mut Engine, _arg: &str) -> EvalResult<Value> {
    Err(Interrupt::Done)
}

fn next(_engine: &mut Engine, _arg: &str) -> EvalResult<Value> {
    Err(Interrupt::Next)
}

fn abort(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let message = engine.expr_single(arg)?;
    Err(Interrupt::Abort(message.to_string()))
}

fn return_(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let value = engine.expr_single(arg)?;
    Err(Interrupt::Return(value))
}

/// Re-evaluate a value as a program form.
fn eval(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let value = engine.expr_single(arg)?;
    engine.eval(&value)
}

/// Interpolate without printing.
fn quote(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    Ok(Value::text(engine.interpolate(arg)?))
}

/// Prompt for one free-text line.
fn ask(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let prompt = engine.interpolate(arg)?;
    let answer = engine.read_line(&format!("{prompt} "))?;
    Ok(Value::text(answer))
}

/// Prompt for a yes/no answer, reprompting until one is recognized.
fn confirm(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let prompt = engine.interpolate(arg)?;
    loop {
        let answer = engine.read_line(&format!("{prompt} (y/n) "))?;
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(Value::Bool(true)),
            "n" | "no" => return Ok(Value::Bool(false)),
            _ => continue,
        }
    }
}

/// Invoke a function value (or bound function name) with an explicit
/// argument list.
fn call(engine: &mut Engine, arg: &str) -> EvalResult<Value> {
    let mut values = engine.expr(arg)?;
    if values.is_empty() {
        return Err(EvalError::TypeError("call expects a function".to_string()).into());
    }
    let target = values.remove(0);
    engine.call_value(target, values)
}
