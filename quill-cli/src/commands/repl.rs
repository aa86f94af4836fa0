//! The `quill repl` command.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use quill_eval::{Engine, Value};

use crate::commands::report;

pub fn run() -> Result<(), String> {
    println!("Quill REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;

    // One engine for the whole session so bindings persist across lines
    let mut engine = Engine::new();

    loop {
        let readline = rl.readline("quill> ");
        match readline {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Handle REPL commands
                if line.starts_with(':') {
                    match line {
                        ":quit" | ":q" => break,
                        ":help" | ":h" => {
                            println!("Commands:");
                            println!("  :help, :h    Show this help");
                            println!("  :quit, :q    Exit the REPL");
                            continue;
                        }
                        _ => {
                            println!("Unknown command: {}", line);
                            continue;
                        }
                    }
                }

                match engine.run(&Value::text(line)) {
                    Ok(value) => {
                        if !value.is_nil() {
                            println!("{value}");
                        }
                    }
                    Err(error) => report("<repl>", &error),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("error: {err:?}");
                break;
            }
        }
    }

    Ok(())
}
