//! The template / quasiquote walker.
//!
//! A `template` block quotes its contents: structure descends untouched
//! while the depth counter stays positive. A nested single-key `insert`
//! map decrements the depth for its value; content balanced by exactly
//! as many `insert`s as enclosing `template`s reaches depth 0 and is
//! evaluated as a program form, everything else stays literal. The
//! depth is signed: surplus `insert`s push it negative, where deeper
//! content evaluates instead of quoting.

use crate::engine::Engine;
use crate::signal::EvalResult;
use crate::value::Value;

impl Engine {
    pub(crate) fn walk_template(&mut self, form: &Value, depth: i32) -> EvalResult<Value> {
        match form {
            Value::Str(text) => {
                if depth == 0 {
                    Ok(Value::text(self.interpolate(text)?))
                } else {
                    Ok(form.clone())
                }
            }
            Value::List(items) => {
                if depth == 0 {
                    return self.eval(form);
                }
                let forms = items.borrow().clone();
                let mut walked = Vec::with_capacity(forms.len());
                for item in &forms {
                    walked.push(self.walk_template(item, depth)?);
                }
                Ok(Value::list(walked))
            }
            Value::Map(map) => {
                let entries = map.borrow().clone();

                let quote_key = if entries.len() == 1 {
                    match entries[0].0.as_str() {
                        "template" => Some(1),
                        "insert" => Some(-1),
                        _ => None,
                    }
                } else {
                    None
                };
                let depth = depth + quote_key.unwrap_or(0);

                if depth == 0 {
                    if quote_key.is_some() {
                        return self.eval(&entries[0].1);
                    }
                    return self.eval(form);
                }

                let mut walked = Vec::with_capacity(entries.len());
                for (key, value) in &entries {
                    walked.push((key.clone(), self.walk_template(value, depth)?));
                }
                Ok(Value::map(walked))
            }
            other => Ok(other.clone()),
        }
    }
}
