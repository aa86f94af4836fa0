//! Injectable I/O capabilities.

use std::io::{self, BufRead, Write};

/// The host-supplied console: output sinks for `say`/`puts` and a line
/// reader for `ask`/`confirm`. The engine owns silencing; implementors
/// just write.
pub trait EngineIo {
    fn write_line(&mut self, line: &str);

    fn write(&mut self, text: &str);

    /// Print `prompt` (no trailing newline) and read one line, with the
    /// trailing newline removed. End of input is an error.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Process stdin/stdout.
pub struct StdIo;

impl EngineIo for StdIo {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn write(&mut self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        let read = io::stdin().lock().read_line(&mut buf)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(buf)
    }
}
