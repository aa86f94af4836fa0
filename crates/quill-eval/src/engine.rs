//! The statement interpreter.

use std::rc::Rc;

use quill_diagnostic::Diagnostic;
use quill_parser::{parse_call, parse_expression, parse_interpolation, split_top_level};
use quill_syntax::{CallNode, ExprItem, ExprNode, Literal, Segment};

use crate::builtin;
use crate::error::EvalError;
use crate::io::{EngineIo, StdIo};
use crate::ops;
use crate::scope::ScopeStack;
use crate::signal::{EvalResult, Interrupt};
use crate::value::{Function, Value};

const DEFAULT_MAX_DEPTH: usize = 1000;

/// The Quill evaluation engine.
///
/// Single-threaded and synchronous; one engine is one logical thread of
/// control over one scope stack.
pub struct Engine {
    scope: ScopeStack,
    io: Box<dyn EngineIo>,
    silenced: bool,
    depth: usize,
    max_depth: usize,
    atoms: Vec<&'static str>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_io(Box::new(StdIo))
    }

    /// Create an engine with a host-supplied console.
    pub fn with_io(io: Box<dyn EngineIo>) -> Self {
        Self {
            scope: ScopeStack::new(),
            io,
            silenced: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            atoms: ops::atom_names(),
        }
    }

    /// Cap the function invocation depth. Exceeding it fails with a
    /// recursion-limit error instead of exhausting the host stack.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Seed a binding before running a program (host values, opaque
    /// objects, …).
    pub fn bind(&mut self, name: &str, value: Value) {
        self.scope.bind(name, value);
    }

    /// Look a variable up in the current scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.scope.read(name)
    }

    /// Assign a variable with the usual scope semantics.
    pub fn set(&mut self, name: &str, value: Value) {
        self.scope.write(name, value);
    }

    /// Evaluate a whole program form. Signals that escape to this level
    /// are themselves errors; `abort` carries its message out as one.
    pub fn run(&mut self, program: &Value) -> Result<Value, EvalError> {
        match self.eval(program) {
            Ok(value) => Ok(value),
            Err(Interrupt::Error(error)) => Err(error),
            Err(Interrupt::Abort(message)) => Err(EvalError::Aborted(message)),
            Err(Interrupt::Return(_)) => Err(EvalError::ReturnOutsideFunction),
            Err(Interrupt::Next) => Err(EvalError::SignalOutsideLoop("next")),
            Err(Interrupt::Done) => Err(EvalError::SignalOutsideLoop("done")),
        }
    }

    /// Evaluate one program form.
    pub fn eval(&mut self, form: &Value) -> EvalResult<Value> {
        match form {
            Value::Str(text) => {
                let line = text.trim();
                if line.is_empty() {
                    return Ok(Value::Nil);
                }
                if line.contains(';') {
                    let pieces = self.split(line, ';')?;
                    if pieces.len() > 1 {
                        let forms: Vec<Value> = pieces.into_iter().map(Value::text).collect();
                        return self.eval_sequence(&forms);
                    }
                }
                self.eval_line(line)
            }
            Value::List(items) => {
                let forms = items.borrow().clone();
                self.eval_sequence(&forms)
            }
            Value::Map(_) => self.eval_block(form),
            other => Ok(other.clone()),
        }
    }

    /// Evaluate forms in order, recording each result into the reserved
    /// `result` binding so later siblings can read it.
    fn eval_sequence(&mut self, forms: &[Value]) -> EvalResult<Value> {
        self.scope.bind("result", Value::Nil);
        for form in forms {
            let value = self.eval(form)?;
            self.scope.write("result", value);
        }
        Ok(self.scope.read("result").unwrap_or(Value::Nil))
    }

    fn eval_line(&mut self, line: &str) -> EvalResult<Value> {
        let call = parse_call(line, &self.atoms).map_err(|d| self.syntax(line, d))?;
        self.dispatch_call(&call)
    }

    /// Invoke a parsed call node: a registered builtin parses its own
    /// argument text; anything else is a user-function invocation with
    /// the argument reduced as an expression.
    pub(crate) fn dispatch_call(&mut self, call: &CallNode) -> EvalResult<Value> {
        if call.name.is_empty() {
            return Ok(Value::Nil);
        }
        if let Some(run) = builtin::lookup(&call.name) {
            return run(self, call.arg.trim());
        }
        let args = self.expr(&call.arg)?;
        self.call_value(Value::text(call.name.clone()), args)
    }

    /// Call a function value, or a name bound to one.
    pub(crate) fn call_value(&mut self, target: Value, args: Vec<Value>) -> EvalResult<Value> {
        match target {
            Value::Function(func) => self.invoke(&func, args),
            Value::Str(name) => {
                let bound = self
                    .scope
                    .read(&name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
                match bound {
                    Value::Function(func) => self.invoke(&func, args),
                    _ => Err(EvalError::NotAFunction(name.to_string()).into()),
                }
            }
            other => Err(EvalError::NotAFunction(other.to_string()).into()),
        }
    }

    /// Push a function activation and evaluate its body.
    ///
    /// The activation is one boundary marker, the captured closure
    /// frames, and a fresh frame binding `args` plus each parameter
    /// positionally. The stack is restored to its pre-call depth on
    /// every exit path.
    pub(crate) fn invoke(&mut self, func: &Rc<Function>, args: Vec<Value>) -> EvalResult<Value> {
        if self.depth >= self.max_depth {
            return Err(EvalError::RecursionLimit(self.max_depth).into());
        }
        self.depth += 1;
        let base = self.scope.len();

        self.scope.push_boundary();
        for frame in &func.closure {
            self.scope.push_frame(frame.clone());
        }
        self.scope.push_frame(Default::default());
        self.scope.bind("args", Value::list(args.clone()));
        for (param, arg) in func.params.iter().zip(args) {
            self.scope.bind(param, arg);
        }

        let result = self.eval(&func.body);

        self.scope.truncate(base);
        self.depth -= 1;

        match result {
            Err(Interrupt::Return(value)) => Ok(value),
            other => other,
        }
    }

    /// Reduce an expression string to its flat value sequence.
    pub fn expr(&mut self, text: &str) -> EvalResult<Vec<Value>> {
        let line = text.trim();
        let node = parse_expression(line, &self.atoms).map_err(|d| self.syntax(line, d))?;
        self.reduce(&node)
    }

    /// Reduce an expression string that must produce exactly one value.
    pub fn expr_single(&mut self, text: &str) -> EvalResult<Value> {
        let mut values = self.expr(text)?;
        if values.len() != 1 {
            return Err(EvalError::SingleValueExpected(values.len()).into());
        }
        Ok(values.pop().expect("length checked"))
    }

    /// Resolve an expression node's elements and apply the operator
    /// table until no operator remains.
    pub(crate) fn reduce(&mut self, node: &ExprNode) -> EvalResult<Vec<Value>> {
        let mut seq: Vec<Value> = Vec::new();
        for item in &node.items {
            match item {
                ExprItem::Literal(Literal::Int(n)) => seq.push(Value::Int(*n)),
                ExprItem::Literal(Literal::Float(x)) => seq.push(Value::Float(*x)),
                ExprItem::Literal(Literal::Text(s)) => seq.push(Value::text(s.clone())),
                ExprItem::Call(call) => seq.push(self.dispatch_call(call)?),
                ExprItem::Group(inner) => seq.extend(self.reduce(inner)?),
            }
        }

        'restart: loop {
            for op in ops::OPERATORS {
                // Sentinels stand in for the missing operand beyond each
                // end; pass-through handlers return them intact, so a
                // non-Nil edge after splicing means an operator consumed
                // a boundary it had no operand at.
                seq.insert(0, Value::Nil);
                seq.push(Value::Nil);

                let hit = seq.iter().position(|v| v.as_text() == Some(op.name));
                let applied = match hit {
                    Some(i) => {
                        let left = seq[i - 1].clone();
                        let right = seq[i + 1].clone();
                        let replacement = (op.apply)(self, left, right)?;
                        seq.splice(i - 1..=i + 1, replacement);
                        true
                    }
                    None => false,
                };

                if !matches!(seq.first(), Some(Value::Nil)) {
                    return Err(EvalError::PostfixAtStart.into());
                }
                seq.remove(0);
                if !matches!(seq.last(), Some(Value::Nil)) {
                    return Err(EvalError::PrefixAtEnd.into());
                }
                seq.pop();

                if applied {
                    continue 'restart;
                }
            }
            break;
        }
        Ok(seq)
    }

    /// Interpolate a line: literal fragments pass through, parenthesized
    /// expressions reduce and splice their values in as text.
    pub fn interpolate(&mut self, line: &str) -> EvalResult<String> {
        let segments = parse_interpolation(line, &self.atoms).map_err(|d| self.syntax(line, d))?;
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(&text),
                Segment::Expr(node) => {
                    for value in self.reduce(&node)? {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Control blocks
    // ------------------------------------------------------------------

    fn eval_block(&mut self, form: &Value) -> EvalResult<Value> {
        let Value::Map(map) = form else {
            unreachable!("eval_block is only called on maps");
        };
        let entries = map.borrow().clone();
        let mut keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();

        let field = |name: &str| {
            entries
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .expect("key set matched")
        };

        match keys.as_slice() {
            ["else", "if", "then"] => {
                if self.condition(&field("if"))? {
                    self.eval(&field("then"))
                } else {
                    self.eval(&field("else"))
                }
            }
            ["do", "while"] => self.block_while(&field("while"), &field("do")),
            ["do", "foreach", "in"] => {
                self.block_foreach(&field("foreach"), &field("in"), &field("do"))
            }
            ["do", "function", "params"] => {
                let func = self.make_function(&field("params"), &field("do"))?;
                let name = text_field(&field("function"), "function name")?;
                self.scope.write(&name, func.clone());
                Ok(func)
            }
            ["do", "lambda"] => self.make_function(&field("lambda"), &field("do")),
            ["template"] => self.walk_template(&field("template"), 1),
            _ => Err(EvalError::UnknownBlock(keys.join("_")).into()),
        }
    }

    /// A block condition: text reduces to exactly one value, anything
    /// else stands for itself.
    fn condition(&mut self, form: &Value) -> EvalResult<bool> {
        let value = match form {
            Value::Str(text) => self.expr_single(text)?,
            other => other.clone(),
        };
        Ok(value.is_truthy())
    }

    fn block_while(&mut self, cond: &Value, body: &Value) -> EvalResult<Value> {
        let mut result = Value::Nil;
        while self.condition(cond)? {
            match self.eval(body) {
                Ok(value) => result = value,
                Err(Interrupt::Next) => continue,
                Err(Interrupt::Done) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(result)
    }

    fn block_foreach(&mut self, var: &Value, iterable: &Value, body: &Value) -> EvalResult<Value> {
        let name = text_field(var, "loop variable")?;
        let value = match iterable {
            Value::Str(text) => self.expr_single(text)?,
            other => other.clone(),
        };
        let elements = value.iter_elements().ok_or_else(|| {
            EvalError::TypeError(format!("cannot iterate over {}", value.type_name()))
        })?;

        let mut result = Value::Nil;
        for element in elements {
            self.scope.write(&name, element);
            match self.eval(body) {
                Ok(value) => result = value,
                Err(Interrupt::Next) => continue,
                Err(Interrupt::Done) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(result)
    }

    /// Build a function value capturing the current scope.
    fn make_function(&mut self, params: &Value, body: &Value) -> EvalResult<Value> {
        let params = param_names(params)?;
        let closure = self.scope.capture();
        Ok(Value::Function(Rc::new(Function {
            params,
            body: body.clone(),
            closure,
        })))
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    pub(crate) fn print_line(&mut self, line: &str) {
        if !self.silenced {
            self.io.write_line(line);
        }
    }

    pub(crate) fn print(&mut self, text: &str) {
        if !self.silenced {
            self.io.write(text);
        }
    }

    /// Prompts are interactive and bypass the silenced flag.
    pub(crate) fn read_line(&mut self, prompt: &str) -> EvalResult<String> {
        self.io
            .read_line(prompt)
            .map_err(|e| EvalError::Input(e.to_string()).into())
    }

    pub(crate) fn silenced(&self) -> bool {
        self.silenced
    }

    pub(crate) fn set_silenced(&mut self, silenced: bool) {
        self.silenced = silenced;
    }

    pub(crate) fn split(&self, line: &str, delim: char) -> EvalResult<Vec<String>> {
        split_top_level(line, delim).map_err(|d| self.syntax(line, d))
    }

    fn syntax(&self, line: &str, diagnostic: Diagnostic) -> Interrupt {
        Interrupt::Error(EvalError::Syntax {
            line: line.to_string(),
            diagnostic,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a trimmed text field from a block.
fn text_field(form: &Value, what: &str) -> Result<String, EvalError> {
    match form {
        Value::Str(s) => Ok(s.trim().to_string()),
        other => Err(EvalError::TypeError(format!(
            "{} must be text, found {}",
            what,
            other.type_name()
        ))),
    }
}

/// Parameter names: a list of texts, or one whitespace-separated text.
fn param_names(form: &Value) -> Result<Vec<String>, EvalError> {
    match form {
        Value::Nil => Ok(Vec::new()),
        Value::Str(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        Value::List(items) => items
            .borrow()
            .iter()
            .map(|item| text_field(item, "parameter name"))
            .collect(),
        other => Err(EvalError::TypeError(format!(
            "parameters must be a list of names, found {}",
            other.type_name()
        ))),
    }
}
