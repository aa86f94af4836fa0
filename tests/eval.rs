//! Integration tests for quill-eval crate.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use quill_eval::{Engine, EngineIo, EvalError, HostObject, Interrupt, OPERATORS, Value};
use serde_json::json;

/// Console double: collects output, serves queued answers.
struct TestIo {
    output: Rc<RefCell<String>>,
    answers: Vec<String>,
}

impl EngineIo for TestIo {
    fn write_line(&mut self, line: &str) {
        let mut out = self.output.borrow_mut();
        out.push_str(line);
        out.push('\n');
    }

    fn write(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn read_line(&mut self, _prompt: &str) -> io::Result<String> {
        if self.answers.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        Ok(self.answers.remove(0))
    }
}

fn engine_with(answers: &[&str]) -> (Engine, Rc<RefCell<String>>) {
    let output = Rc::new(RefCell::new(String::new()));
    let io = TestIo {
        output: output.clone(),
        answers: answers.iter().map(|s| s.to_string()).collect(),
    };
    (Engine::with_io(Box::new(io)), output)
}

fn engine() -> Engine {
    engine_with(&[]).0
}

fn eval_program(program: serde_json::Value) -> (Result<Value, EvalError>, String) {
    let (mut engine, output) = engine_with(&[]);
    let form = Value::from_json(&program);
    let result = engine.run(&form);
    let text = output.borrow().clone();
    (result, text)
}

fn run_ok(program: serde_json::Value) -> Value {
    let (result, _) = eval_program(program);
    result.expect("program should succeed")
}

fn output_of(program: serde_json::Value) -> String {
    let (result, output) = eval_program(program);
    result.expect("program should succeed");
    output
}

fn single(source: &str) -> Value {
    engine().expr_single(source).expect("expression should reduce")
}

// ============================================================================
// Operator Table
// ============================================================================

#[test]
fn test_operator_table_is_sorted_ascending() {
    for pair in OPERATORS.windows(2) {
        assert!(
            pair[0].prec <= pair[1].prec,
            "'{}' is declared after '{}'",
            pair[1].name,
            pair[0].name
        );
    }
}

// ============================================================================
// Expression Reduction
// ============================================================================

#[test]
fn test_tighter_precedence_wins_regardless_of_position() {
    assert_eq!(single("3 + 4 * 2"), Value::Int(11));
}

#[test]
fn test_groups_reduce_first() {
    assert_eq!(single("3 * (1 + 1)"), Value::Int(6));
}

#[test]
fn test_same_precedence_reduces_left_to_right() {
    assert_eq!(single("10 - 2 + 3"), Value::Int(11));
    assert_eq!(single("8 / 2 * 4"), Value::Float(16.0));
}

#[test]
fn test_power() {
    assert_eq!(single("2 ^ 10"), Value::Int(1024));
}

#[test]
fn test_division_always_floats() {
    assert_eq!(single("4 / 2"), Value::Float(2.0));
    assert_eq!(single("4 / 2").to_string(), "2.0");
}

#[test]
fn test_remainder_follows_divisor_sign() {
    assert_eq!(single("-7 % 3"), Value::Int(2));
    assert_eq!(single("7 % 3"), Value::Int(1));
}

#[test]
fn test_text_concatenation() {
    assert_eq!(single("'foo' + 'bar'"), Value::text("foobar"));
}

#[test]
fn test_comparisons() {
    assert_eq!(single("2 <= 3"), Value::Bool(true));
    assert_eq!(single("2 == 2.0"), Value::Bool(true));
    assert_eq!(single("'a' < 'b'"), Value::Bool(true));
    assert_eq!(single("1 != 2"), Value::Bool(true));
}

#[test]
fn test_ranges_are_half_open() {
    assert_eq!(single("1 to 5"), Value::Range(1, 5));
    assert_eq!(single("1 .. 5"), Value::Range(1, 5));
    assert_eq!(single("#(1 to 5)"), Value::Int(4));
}

#[test]
fn test_not_passes_left_through() {
    assert_eq!(single("not 1"), Value::Bool(false));
    assert_eq!(single("not 0"), Value::Bool(true));
    assert_eq!(single("not []"), Value::Bool(true));
}

#[test]
fn test_length_operator() {
    assert_eq!(single("#[list 1 2 3]"), Value::Int(3));

    let mut engine = engine();
    engine.set("s", Value::text("hello"));
    assert_eq!(engine.expr_single("#$s").unwrap(), Value::Int(5));
}

#[test]
fn test_splice_flattens_iterables() {
    let values = engine().expr("1 @(2 to 4)").unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_splice_keeps_plain_pairs() {
    let values = engine().expr("1 @2").unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_conditional_operator_pair() {
    assert_eq!(single("foo if 1 else bar"), Value::text("foo"));
    assert_eq!(single("foo if 0 else bar"), Value::text("bar"));
}

#[test]
fn test_logic_returns_operands() {
    assert_eq!(single("0 or fallback"), Value::text("fallback"));
    assert_eq!(single("1 and 2"), Value::Int(2));
    assert_eq!(single("0 && 2"), Value::Int(0));
}

#[test]
fn test_membership() {
    assert_eq!(single("3 is in [list 1 2 3]"), Value::Bool(true));
    assert_eq!(single("4 is in [list 1 2 3]"), Value::Bool(false));
    assert_eq!(single("4 is not in [list 1 2 3]"), Value::Bool(true));
    assert_eq!(single("'ell' is in 'hello'"), Value::Bool(true));
    assert_eq!(single("3 is in 1 to 10"), Value::Bool(true));
}

#[test]
fn test_contains_reverses_operand_order() {
    assert_eq!(single("[list 1 2 3] has 3"), Value::Bool(true));
    assert_eq!(single("[list 1 2 3] contains 9"), Value::Bool(false));
    assert_eq!(single("[list 1 2 3] does not contain 9"), Value::Bool(true));
    // Symmetric truth values with `in`.
    assert_eq!(single("3 is in [list 1 2 3]"), single("[list 1 2 3] has 3"));
}

#[test]
fn test_variable_dereference() {
    let mut engine = engine();
    engine.set("x", Value::Int(5));
    assert_eq!(engine.expr_single("$x + 1").unwrap(), Value::Int(6));
}

#[test]
fn test_attribute_access_on_map_and_list() {
    let mut engine = engine();
    engine.set("m", Value::map(vec![("a".to_string(), Value::Int(1))]));
    engine.set("l", Value::list(vec![Value::Int(7), Value::Int(8)]));
    assert_eq!(engine.expr_single("$m.a").unwrap(), Value::Int(1));
    assert_eq!(engine.expr_single("$l.0").unwrap(), Value::Int(7));
    assert_eq!(engine.expr_single("$l.1").unwrap(), Value::Int(8));
}

#[test]
fn test_host_object_attribute() {
    struct Host {
        version: i64,
    }
    impl HostObject for Host {
        fn attr(&self, name: &str) -> Option<Value> {
            (name == "version").then(|| Value::Int(self.version))
        }
        fn type_name(&self) -> &'static str {
            "host"
        }
    }

    let mut engine = engine();
    engine.bind("sys", Value::Opaque(Rc::new(Host { version: 3 })));
    assert_eq!(engine.expr_single("$sys.version").unwrap(), Value::Int(3));
    assert_eq!(engine.expr_single("$sys").unwrap().to_string(), "<host>");
}

// ============================================================================
// Expression Errors
// ============================================================================

#[test]
fn test_unbound_variable_error() {
    let result = engine().expr_single("$nope");
    assert!(matches!(
        result,
        Err(Interrupt::Error(EvalError::UnboundVariable(name))) if name == "nope"
    ));
}

#[test]
fn test_operator_boundary_errors() {
    assert!(matches!(
        engine().expr("if 1"),
        Err(Interrupt::Error(EvalError::PostfixAtStart))
    ));
    assert!(matches!(
        engine().expr("1 not"),
        Err(Interrupt::Error(EvalError::PrefixAtEnd))
    ));
}

#[test]
fn test_else_without_if() {
    assert!(matches!(
        engine().expr_single("5 else 2"),
        Err(Interrupt::Error(EvalError::TypeError(_)))
    ));
}

#[test]
fn test_single_value_expected() {
    assert!(matches!(
        engine().expr_single("1 2"),
        Err(Interrupt::Error(EvalError::SingleValueExpected(2)))
    ));
}

#[test]
fn test_integer_overflow_is_an_error() {
    assert!(matches!(
        engine().expr_single("9223372036854775807 + 1"),
        Err(Interrupt::Error(EvalError::IntegerOverflow))
    ));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        engine().expr_single("1 / 0"),
        Err(Interrupt::Error(EvalError::DivisionByZero))
    ));
}

#[test]
fn test_syntax_error_carries_line() {
    let result = engine().expr("( a");
    let Err(Interrupt::Error(EvalError::Syntax { line, .. })) = result else {
        panic!("expected a syntax error");
    };
    assert_eq!(line, "( a");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_empty_statement_is_noop() {
    assert!(run_ok(json!([""])).is_nil());
}

#[test]
fn test_set_and_read_back() {
    assert_eq!(
        run_ok(json!(["set x 10", "set y $x + 5", "set y"])),
        Value::Int(15)
    );
}

#[test]
fn test_set_multiple_pairs() {
    assert_eq!(output_of(json!(["set a 1 b 2", "say ($a $b)"])), "12\n");
}

#[test]
fn test_result_binding_between_siblings() {
    assert_eq!(
        run_ok(json!(["set x 41", "set y $result + 1", "set y"])),
        Value::Int(42)
    );
}

#[test]
fn test_semicolon_statement_sequence() {
    assert_eq!(
        run_ok(json!(["set x 1; set x $x + 1; set x"])),
        Value::Int(2)
    );
}

#[test]
fn test_brace_block_strips_braces_in_expressions() {
    assert_eq!(
        output_of(json!(["set x {hello world}", "say ($x)"])),
        "hello world\n"
    );
}

#[test]
fn test_unknown_function_is_distinct_from_unbound_variable() {
    let (result, _) = eval_program(json!(["frobnicate 1"]));
    assert!(matches!(result, Err(EvalError::UnknownFunction(name)) if name == "frobnicate"));

    let (result, _) = eval_program(json!(["say ($ghost)"]));
    assert!(matches!(result, Err(EvalError::UnboundVariable(name)) if name == "ghost"));
}

#[test]
fn test_calling_a_non_function_binding() {
    let (result, _) = eval_program(json!(["set x 5", "x 1"]));
    assert!(matches!(result, Err(EvalError::NotAFunction(name)) if name == "x"));
}

// ============================================================================
// Output Builtins
// ============================================================================

#[test]
fn test_say_interpolates() {
    assert_eq!(output_of(json!(["say hello (1 + 1)!"])), "hello 2!\n");
}

#[test]
fn test_puts_omits_newline() {
    assert_eq!(output_of(json!(["puts a", "puts b", "say c"])), "abc\n");
}

#[test]
fn test_say_renders_values() {
    assert_eq!(output_of(json!(["say ([list 1 2 3])"])), "[1, 2, 3]\n");
    assert_eq!(output_of(json!(["say (4 / 2)"])), "2.0\n");
    assert_eq!(output_of(json!(["say (1 == 1)"])), "true\n");
}

#[test]
fn test_silently_suppresses_output_but_keeps_effects() {
    assert_eq!(
        output_of(json!(["silently say hidden", "say visible"])),
        "visible\n"
    );
    assert_eq!(
        output_of(json!(["silently set x 42", "say ($x)"])),
        "42\n"
    );
}

#[test]
fn test_quote_interpolates_without_printing() {
    let (result, output) = eval_program(json!(["set s [quote (1 + 2) apples]", "set s"]));
    assert_eq!(result.unwrap(), Value::text("3 apples"));
    assert_eq!(output, "");
}

// ============================================================================
// Container Builtins
// ============================================================================

#[test]
fn test_list_builtin_with_commas() {
    assert_eq!(
        run_ok(json!(["set l [list 1, 2, 1 + 2]", "set l"])),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_list_builtin_splices_without_commas() {
    assert_eq!(
        run_ok(json!(["set l [list 1 2 3]", "set l"])),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_dict_builtin_from_pairs() {
    assert_eq!(
        output_of(json!([
            "set d [dict [list a 1] [list b 2]]",
            "say ($d.b)"
        ])),
        "2\n"
    );
}

#[test]
fn test_setsub_on_map() {
    assert_eq!(
        output_of(json!(["set d [dict]", "setsub $d name quill", "say ($d.name)"])),
        "quill\n"
    );
}

#[test]
fn test_setsub_on_list() {
    assert_eq!(
        output_of(json!(["set l [list 1 2 3]", "setsub $l 0 9", "say ($l)"])),
        "[9, 2, 3]\n"
    );
}

#[test]
fn test_setsub_out_of_range() {
    let (result, _) = eval_program(json!(["set l [list 1]", "setsub $l 5 0"]));
    assert!(matches!(result, Err(EvalError::IndexOutOfRange(5))));
}

#[test]
fn test_map_iterates_in_insertion_order() {
    assert_eq!(
        output_of(json!([
            "set d [dict [list b 1] [list a 2]]",
            "set out {}",
            {"foreach": "k", "in": "$d", "do": "set out $out + $k"},
            "say ($out)"
        ])),
        "ba\n"
    );
}

#[test]
fn test_eval_builtin_reevaluates_forms() {
    assert_eq!(
        output_of(json!(["set code {say deferred}", "eval $code"])),
        "deferred\n"
    );
}

// ============================================================================
// Control Blocks
// ============================================================================

#[test]
fn test_conditional_block() {
    assert_eq!(
        output_of(json!([
            "set x 1",
            {"if": "$x == 1", "then": "say yes", "else": "say no"}
        ])),
        "yes\n"
    );
    assert_eq!(
        output_of(json!([
            "set x 0",
            {"if": "$x == 1", "then": "say yes", "else": "say no"}
        ])),
        "no\n"
    );
}

#[test]
fn test_unrecognized_block_keys() {
    let (result, _) = eval_program(json!([{"when": "1", "do": "say x"}]));
    assert!(matches!(result, Err(EvalError::UnknownBlock(_))));
}

#[test]
fn test_while_loop_with_skip_and_break() {
    assert_eq!(
        run_ok(json!([
            "set i 0",
            "set total 0",
            {"while": "$i < 10", "do": [
                "set i $i + 1",
                {"if": "$i % 2 == 0", "then": "next", "else": ""},
                {"if": "$i > 7", "then": "done", "else": ""},
                "set total $total + $i"
            ]},
            "set total"
        ])),
        Value::Int(16)
    );
}

#[test]
fn test_while_result_is_last_completed_iteration() {
    assert_eq!(
        run_ok(json!(["set i 0", {"while": "$i < 3", "do": "set i $i + 1"}])),
        Value::Int(3)
    );
}

#[test]
fn test_while_zero_iterations_yields_nil() {
    assert!(run_ok(json!([{"while": "0", "do": "abort never"}])).is_nil());
}

#[test]
fn test_foreach_over_range() {
    assert_eq!(
        run_ok(json!([
            "set sum 0",
            {"foreach": "i", "in": "1 to 5", "do": "set sum $sum + $i"},
            "set sum"
        ])),
        Value::Int(10)
    );
}

#[test]
fn test_foreach_over_list_with_done() {
    assert_eq!(
        output_of(json!([{
            "foreach": "w",
            "in": "[list a b stop c]",
            "do": [
                {"if": "$w == stop", "then": "done", "else": ""},
                "say ($w)"
            ]
        }])),
        "a\nb\n"
    );
}

#[test]
fn test_stray_signals_are_errors() {
    let (result, _) = eval_program(json!(["next"]));
    assert!(matches!(result, Err(EvalError::SignalOutsideLoop("next"))));

    let (result, _) = eval_program(json!(["done"]));
    assert!(matches!(result, Err(EvalError::SignalOutsideLoop("done"))));

    let (result, _) = eval_program(json!(["return 1"]));
    assert!(matches!(result, Err(EvalError::ReturnOutsideFunction)));
}

#[test]
fn test_abort_reaches_the_top() {
    let (result, output) = eval_program(json!([
        "say before",
        "abort 'gave up'",
        "say after"
    ]));
    assert!(matches!(result, Err(EvalError::Aborted(msg)) if msg == "gave up"));
    assert_eq!(output, "before\n");
}

// ============================================================================
// Functions and Closures
// ============================================================================

#[test]
fn test_function_definition_and_call() {
    assert_eq!(
        output_of(json!([
            {"function": "greet", "params": ["who"], "do": "say hi ($who)"},
            "greet world",
            "say ([greet again])"
        ])),
        "hi world\nhi again\nnil\n"
    );
}

#[test]
fn test_function_args_binding() {
    assert_eq!(
        output_of(json!([
            {"function": "show", "params": [], "do": "say ($args)"},
            "show 1 2 3"
        ])),
        "[1, 2, 3]\n"
    );
}

#[test]
fn test_recursion() {
    assert_eq!(
        output_of(json!([
            {"function": "fib", "params": ["num"], "do":
                {"if": "$num < 2", "then": "return $num",
                 "else": "return [fib $num - 1] + [fib $num - 2]"}},
            "say ([fib 10])"
        ])),
        "55\n"
    );
}

#[test]
fn test_recursion_limit_is_a_distinct_error() {
    let (engine, _) = engine_with(&[]);
    let mut engine = engine.with_max_depth(16);
    let program = Value::from_json(&json!([
        {"function": "loopy", "params": [], "do": "return [loopy]"},
        "loopy"
    ]));
    let result = engine.run(&program);
    assert!(matches!(result, Err(EvalError::RecursionLimit(16))));
}

#[test]
fn test_return_unwinds_through_loops_to_the_function_boundary() {
    assert_eq!(
        output_of(json!([
            {"function": "find", "params": ["limit"], "do": [
                "set i 0",
                {"while": "1", "do": [
                    "set i $i + 1",
                    {"if": "$i > $limit", "then": "return $i", "else": ""}
                ]}
            ]},
            "say ([find 3])"
        ])),
        "4\n"
    );
}

#[test]
fn test_counter_closures_have_independent_aliased_state() {
    assert_eq!(
        output_of(json!([
            {"function": "make_counter", "params": ["val"], "do": [
                {"lambda": ["plus"], "do": ["set val $val + $plus", "return $val"]},
                "return $result"
            ]},
            "set a [make_counter 5]",
            "set b [make_counter 50]",
            "say ([a 100])",
            "say ([a 100])",
            "say ([b 1])"
        ])),
        "105\n205\n51\n"
    );
}

#[test]
fn test_nested_closures_see_outer_bindings() {
    assert_eq!(
        output_of(json!([
            "set g hello",
            {"function": "outer", "params": [], "do":
                {"lambda": [], "do": {"lambda": [], "do": "return $g"}}},
            "say ([call [call [outer]]])"
        ])),
        "hello\n"
    );
}

#[test]
fn test_call_builtin_with_spliced_args() {
    assert_eq!(
        output_of(json!([
            {"function": "add", "params": ["a", "b"], "do": "return $a + $b"},
            "set args [list 2 3]",
            "say ([call $add @($args)])"
        ])),
        "5\n"
    );
}

#[test]
fn test_functions_display_opaquely() {
    assert_eq!(
        output_of(json!([{"function": "f", "params": [], "do": ""}, "say ($f)"])),
        "<function>\n"
    );
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_quotes_structure() {
    assert_eq!(
        run_ok(json!([{"template": {"greeting": "say hi (1 + 1)"}}])),
        Value::map(vec![("greeting".to_string(), Value::text("say hi (1 + 1)"))])
    );
}

#[test]
fn test_insert_evaluates_exactly_its_subtree() {
    assert_eq!(
        run_ok(json!([
            "set y 42",
            {"template": {"note": {"insert": "set y"}, "msg": "keep (1 + 1)"}}
        ])),
        Value::map(vec![
            ("note".to_string(), Value::Int(42)),
            ("msg".to_string(), Value::text("keep (1 + 1)")),
        ])
    );
}

#[test]
fn test_double_template_keeps_content_quoted() {
    assert_eq!(
        run_ok(json!([
            "set x 1",
            {"template": {"outer": {"template": {"inner": {"insert": "set x"}}}}}
        ])),
        Value::map(vec![(
            "outer".to_string(),
            Value::map(vec![(
                "template".to_string(),
                Value::map(vec![(
                    "inner".to_string(),
                    Value::map(vec![("insert".to_string(), Value::text("set x"))])
                )])
            )])
        )])
    );
}

#[test]
fn test_insert_of_a_sequence_runs_it_as_a_program() {
    assert_eq!(
        run_ok(json!([{"template": {"x": {"insert": ["set q 7", "set q"]}}}])),
        Value::map(vec![("x".to_string(), Value::Int(7))])
    );
}

// ============================================================================
// Interactive Builtins
// ============================================================================

#[test]
fn test_ask_and_confirm() {
    let (mut engine, output) = engine_with(&["Alice", "maybe", "YES"]);
    let program = Value::from_json(&json!([
        "set name [ask What is your name?]",
        "say hi ($name)",
        {"if": "[confirm proceed?]", "then": "say ok", "else": "say no"}
    ]));
    engine.run(&program).expect("program should succeed");
    assert_eq!(*output.borrow(), "hi Alice\nok\n");
}

#[test]
fn test_ask_at_end_of_input() {
    let (mut engine, _) = engine_with(&[]);
    let program = Value::from_json(&json!(["ask anyone there?"]));
    assert!(matches!(engine.run(&program), Err(EvalError::Input(_))));
}

// ============================================================================
// Scope Hygiene
// ============================================================================

#[test]
fn test_new_bindings_are_function_local() {
    let (result, output) = eval_program(json!([
        {"function": "shadow", "params": [], "do": "set local inner; return $local"},
        "say ([shadow])",
        "say ($local)"
    ]));
    assert_eq!(output, "inner\n");
    assert!(matches!(result, Err(EvalError::UnboundVariable(name)) if name == "local"));
}

#[test]
fn test_assignment_reaches_closed_over_bindings() {
    // A name visible through the closure is mutated in place, not
    // shadowed.
    assert_eq!(
        output_of(json!([
            "set x outer",
            {"function": "clobber", "params": [], "do": "set x inner"},
            "clobber",
            "say ($x)"
        ])),
        "inner\n"
    );
}

#[test]
fn test_scope_depth_restored_after_errors() {
    let (mut engine, _) = engine_with(&[]);
    let program = Value::from_json(&json!([
        {"function": "boom", "params": [], "do": "abort 'no'"},
        "boom"
    ]));
    assert!(engine.run(&program).is_err());
    // The engine remains usable with its pre-call scope intact.
    engine.set("x", Value::Int(1));
    assert_eq!(engine.expr_single("$x").unwrap(), Value::Int(1));
}
