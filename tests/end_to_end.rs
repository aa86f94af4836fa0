//! End-to-end interpreter test.
//!
//! Runs one program exercising the whole surface at once (expression
//! reduction, templates, closures, memoization, interpolation) and
//! checks the exact console transcript.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use quill_eval::{Engine, EngineIo, Value};
use serde_json::json;

struct CaptureIo {
    output: Rc<RefCell<String>>,
}

impl EngineIo for CaptureIo {
    fn write_line(&mut self, line: &str) {
        let mut out = self.output.borrow_mut();
        out.push_str(line);
        out.push('\n');
    }

    fn write(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn read_line(&mut self, _prompt: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"))
    }
}

#[test]
fn test_full_program_transcript() {
    let program = json!([
        "set x 1",
        {"if": "$x == 1", "then": "say foo bar", "else": "say bar baz"},
        "set x 0",
        {"if": "$x == 1", "then": "say hello", "else": "say goodbye"},
        "say (not 1)",
        "say ([list (not 1) @(1..10) nil])",
        {"foreach": "i", "in": "1 to 4", "do": "say hello ($i)"},
        "set x [list 1 2 3]",
        "set y foo if 6 is in $x else bar",
        "say ($y)",
        "say (foo if yes else bar)",
        "set foobarbaz {hello world}",
        {"template": {"foo": {"bar": {"template": {"bar": {"insert": "set y"}}}}}},
        "set x $result",
        {"template": {"foo": {"bar": {"baz": [
            {"insert": "set x"},
            {"insert": "set foobarbaz"}
        ]}}}},
        "set foo $result",
        "set bar $foo.foo.bar.baz.0.foo.bar",
        "set baz [eval $bar]",
        "say ($baz)",
        {"function": "foo", "params": ["bar", "baz"], "do": [
            "say ($bar) and ($baz)",
            "return [list 1 2 3]"
        ]},
        "say ($foo)",
        "say ([foo yay nay])",
        {"function": "fib", "params": ["num"], "do":
            {"if": "$num < 2", "then": "return $num",
             "else": "return [fib $num - 1] + [fib $num - 2]"}},
        {"function": "memoize", "params": ["func"], "do": [
            "set cache [dict]",
            {"lambda": [], "do": [
                "set key [quote ($args)]",
                {"if": "$cache has $key",
                 "then": "return $cache.$key",
                 "else": "return [setsub $cache $key [call $func @($args)]]"}
            ]},
            "return $result"
        ]},
        "set fib [memoize $fib]",
        "say ([fib 30])",
        "set globalvar helloiamglobal",
        {"function": "closure_vars_test", "params": [], "do":
            {"lambda": [], "do":
                {"lambda": [], "do": "say ($globalvar)"}}},
        "say ([call [call [closure_vars_test]]])",
        "say ((1 2 3) foo bar)",
        "say (#[list 1 2 3])",
        "say I'm a tomato!",
        "say (sandbox world door)"
    ]);

    let output = Rc::new(RefCell::new(String::new()));
    let mut engine = Engine::with_io(Box::new(CaptureIo {
        output: output.clone(),
    }));

    let form = Value::from_json(&program);
    engine.run(&form).expect("program should succeed");

    let expected = "\
foo bar
goodbye
false
[false, 1, 2, 3, 4, 5, 6, 7, 8, 9, \"nil\"]
hello 1
hello 2
hello 3
bar
foo
{bar: \"bar\"}
<function>
yay and nay
[1, 2, 3]
832040
helloiamglobal
nil
123foobar
3
I'm a tomato!
sandboxworlddoor
";
    assert_eq!(*output.borrow(), expected);
}
