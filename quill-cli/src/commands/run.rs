//! The `quill run` command.

use std::fs;

use quill_eval::{Engine, Value};

use crate::commands::report;

pub fn run(file: &str, verbose: bool) -> Result<(), String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("cannot read file '{}': {}", file, e))?;

    let document: serde_json::Value = serde_json::from_str(&source)
        .map_err(|e| format!("cannot parse '{}' as JSON: {}", file, e))?;
    let program = Value::from_json(&document);

    if verbose {
        if let Value::List(items) = &program {
            println!("loaded {} top-level forms", items.borrow().len());
        }
    }

    let mut engine = Engine::new();
    match engine.run(&program) {
        Ok(value) => {
            if !value.is_nil() {
                println!("{value}");
            }
            Ok(())
        }
        Err(error) => {
            report(file, &error);
            Err("evaluation failed".to_string())
        }
    }
}
