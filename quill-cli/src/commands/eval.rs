//! The `quill eval` command.

use quill_eval::{Engine, Value};

use crate::commands::report;

pub fn run(statement: &str) -> Result<(), String> {
    let mut engine = Engine::new();
    match engine.run(&Value::text(statement)) {
        Ok(value) => {
            if !value.is_nil() {
                println!("{value}");
            }
            Ok(())
        }
        Err(error) => {
            report("<eval>", &error);
            Err("evaluation failed".to_string())
        }
    }
}
