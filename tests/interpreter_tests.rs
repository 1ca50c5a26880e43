//! Interpreter semantics: scopes, loops, suspension

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use uoscript::{lex, Engine, ExecutionState, Script, Value};

type Log = Rc<RefCell<Vec<String>>>;

fn capture_engine() -> (Engine, Log) {
    let mut engine = Engine::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.register_command("msg", move |_, _, args, _, _| {
        let mut rendered = Vec::new();
        for arg in args {
            rendered.push(arg.as_string()?);
        }
        sink.borrow_mut().push(rendered.join(" "));
        Ok(true)
    });
    engine.register_command("createlist", |engine, _, args, _, _| {
        engine.create_list(args[0].as_string()?);
        Ok(true)
    });
    engine.register_command("pushlist", |engine, _, args, _, _| {
        let name = args[0].as_string()?;
        engine.push_list(&name, args[1].clone(), false, false)?;
        Ok(true)
    });
    (engine, log)
}

fn run(engine: &mut Engine, source: &str) {
    let script = Script::new(lex(source).unwrap());
    assert!(engine.start_script(script).unwrap());
    while engine.execute_script().unwrap() {}
}

#[test]
fn test_inner_loop_variable_shadows_outer() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "createlist outer\n\
         pushlist outer first\n\
         createlist inner\n\
         pushlist inner second\n\
         foreach v in outer\n\
         msg v\n\
         foreach v in inner\n\
         msg v\n\
         endfor\n\
         msg v\n\
         endfor",
    );
    // The inner binding shadows for the inner body only; the outer binding
    // is visible again once the inner scope closes.
    assert_eq!(*log.borrow(), vec!["first", "second", "first"]);
}

#[test]
fn test_loop_variable_unreachable_after_scope_closes() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "createlist L\npushlist L bound\nforeach v in L\nmsg v\nendfor\nmsg v",
    );
    // After endfor the name no longer resolves; the lexeme passes through.
    assert_eq!(*log.borrow(), vec!["bound", "v"]);
}

#[test]
fn test_for_zero_and_negative_counts() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "for 0\nmsg never\nendfor\nmsg after");
    assert_eq!(*log.borrow(), vec!["after"]);

    log.borrow_mut().clear();
    run(&mut engine, "for -2\nmsg never\nendfor\nmsg after");
    assert_eq!(*log.borrow(), vec!["after"]);
}

#[test]
fn test_for_requires_integer_count() {
    let (mut engine, _log) = capture_engine();
    let script = Script::new(lex("for banana\nmsg x\nendfor").unwrap());
    let err = engine.start_script(script).unwrap_err();
    assert!(err.to_string().contains("integer loop count"));
}

#[test]
fn test_nested_for_counts() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "for 2\nfor 3\nmsg x\nendfor\nendfor");
    assert_eq!(log.borrow().len(), 6);
}

#[test]
fn test_break_exits_innermost_loop_only() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "for 2\nmsg outer\nwhile 1 == 1\nmsg inner\nbreak\nmsg unreachable\nendwhile\nendfor\nmsg done",
    );
    assert_eq!(
        *log.borrow(),
        vec!["outer", "inner", "outer", "inner", "done"]
    );
}

#[test]
fn test_break_lands_one_past_the_closer() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "while 0 < 1\nbreak\nendwhile\nmsg next");
    assert_eq!(*log.borrow(), vec!["next"]);
}

#[test]
fn test_continue_transfers_to_opener() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "createlist L\npushlist L a\npushlist L b\n\
         foreach v in L\nmsg v\ncontinue\nmsg skipped\nendfor",
    );
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn test_continue_inside_if_terminates_counted_loop() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "for 2\nif 1 == 1\ncontinue\nendif\nmsg unreachable\nendfor\nmsg done",
    );
    // The jump abandons the if scope; the loop keeps its own scope and
    // counter, runs exactly twice, and falls through.
    assert_eq!(*log.borrow(), vec!["done"]);
    assert!(!engine.has_active_script());
}

#[test]
fn test_break_inside_if_exits_loop_cleanly() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "for 3\nif 1 == 1\nbreak\nendif\nmsg unreachable\nendfor\nmsg done",
    );
    assert_eq!(*log.borrow(), vec!["done"]);
}

#[test]
fn test_continue_inside_if_in_while() {
    let mut engine = Engine::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.register_command("msg", move |_, _, args, _, _| {
        sink.borrow_mut().push(args[0].as_string()?);
        Ok(true)
    });

    let polls = Rc::new(RefCell::new(0i32));
    let counter = polls.clone();
    engine.register_expression("polls", move |_, _, _, _| {
        *counter.borrow_mut() += 1;
        Ok(Value::Int(*counter.borrow()))
    });

    run(
        &mut engine,
        "while polls < 3\nif 1 == 1\ncontinue\nendif\nmsg unreachable\nendwhile\nmsg done",
    );
    assert_eq!(*polls.borrow(), 3);
    assert_eq!(*log.borrow(), vec!["done"]);
}

#[test]
fn test_break_inside_if_leaves_outer_loop_running() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "for 2\nwhile 0 < 1\nif 1 == 1\nbreak\nendif\nendwhile\nmsg outer\nendfor\nmsg done",
    );
    // break leaves only the inner while; the outer for still runs twice.
    assert_eq!(*log.borrow(), vec!["outer", "outer", "done"]);
}

#[test]
fn test_continue_inside_nested_ifs() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "for 2\nif 1 == 1\nif 2 == 2\ncontinue\nendif\nendif\nmsg unreachable\nendfor\nmsg done",
    );
    assert_eq!(*log.borrow(), vec!["done"]);
}

#[test]
fn test_while_condition_reevaluates_each_pass() {
    let mut engine = Engine::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.register_command("msg", move |_, _, args, _, _| {
        sink.borrow_mut().push(args[0].as_string()?);
        Ok(true)
    });

    let polls = Rc::new(RefCell::new(0i32));
    let counter = polls.clone();
    engine.register_expression("polls", move |_, _, _, _| {
        *counter.borrow_mut() += 1;
        Ok(Value::Int(*counter.borrow()))
    });

    run(&mut engine, "while polls < 3\nmsg pass\nendwhile");
    // Evaluations: 1 < 3, 2 < 3 enter the body; 3 < 3 exits.
    assert_eq!(*polls.borrow(), 3);
    assert_eq!(*log.borrow(), vec!["pass", "pass"]);
}

#[test]
fn test_unmatched_endif_is_runtime_error() {
    let (mut engine, _log) = capture_engine();
    let script = Script::new(lex("if 1 == 2\nmsg x").unwrap());
    let err = engine.start_script(script).unwrap_err();
    assert!(err.to_string().contains("endif"));
}

#[test]
fn test_stray_endif_is_runtime_error() {
    let (mut engine, _log) = capture_engine();
    let script = Script::new(lex("endif").unwrap());
    let err = engine.start_script(script).unwrap_err();
    assert!(err.to_string().contains("matching if"));
}

#[test]
fn test_break_outside_loop_is_runtime_error() {
    let (mut engine, _log) = capture_engine();
    let script = Script::new(lex("break").unwrap());
    assert!(engine.start_script(script).is_err());
}

#[test]
fn test_pause_defers_execution() {
    let (mut engine, log) = capture_engine();

    engine.register_command("pause", |engine, _, args, _, _| {
        engine.pause(u64::from(args[0].as_uint()?));
        Ok(true)
    });

    let script = Script::new(lex("pause 40\nmsg after").unwrap());
    assert!(engine.start_script(script).unwrap());
    assert_eq!(engine.execution_state(), ExecutionState::Paused);

    // Before the deadline: ticks return true without stepping.
    assert!(engine.execute_script().unwrap());
    assert!(engine.execute_script().unwrap());
    assert!(log.borrow().is_empty());

    std::thread::sleep(Duration::from_millis(60));
    while engine.execute_script().unwrap() {}
    assert_eq!(*log.borrow(), vec!["after"]);
}

#[test]
fn test_unpause_resumes_early() {
    let (mut engine, log) = capture_engine();
    engine.register_command("pause", |engine, _, args, _, _| {
        engine.pause(u64::from(args[0].as_uint()?));
        Ok(true)
    });

    let script = Script::new(lex("pause 60000\nmsg after").unwrap());
    assert!(engine.start_script(script).unwrap());
    assert!(engine.execute_script().unwrap());
    assert!(log.borrow().is_empty());

    engine.unpause();
    while engine.execute_script().unwrap() {}
    assert_eq!(*log.borrow(), vec!["after"]);
}

#[test]
fn test_timeout_step_over_when_callback_accepts() {
    let (mut engine, log) = capture_engine();

    // Stalls forever; arms a timeout whose callback steps past it.
    let attempts = Rc::new(RefCell::new(0u32));
    let counter = attempts.clone();
    engine.register_command("wait", move |engine, _, _, _, _| {
        *counter.borrow_mut() += 1;
        engine.timeout(30, |_| true);
        Ok(false)
    });

    let script = Script::new(lex("wait\nmsg done").unwrap());
    assert!(engine.start_script(script).unwrap());
    assert_eq!(engine.execution_state(), ExecutionState::TimingOut);

    // Before the deadline the stalled statement keeps retrying.
    assert!(engine.execute_script().unwrap());
    assert!(*attempts.borrow() >= 2);
    assert!(log.borrow().is_empty());

    std::thread::sleep(Duration::from_millis(50));
    while engine.execute_script().unwrap() {}
    assert_eq!(*log.borrow(), vec!["done"]);
    assert_eq!(engine.execution_state(), ExecutionState::Running);
}

#[test]
fn test_timeout_stops_script_when_callback_declines() {
    let (mut engine, log) = capture_engine();

    engine.register_command("wait", |engine, _, _, _, _| {
        engine.timeout(20, |_| false);
        Ok(false)
    });

    let script = Script::new(lex("wait\nmsg done").unwrap());
    assert!(engine.start_script(script).unwrap());

    std::thread::sleep(Duration::from_millis(40));
    while engine.execute_script().unwrap() {}
    assert!(log.borrow().is_empty());
    assert!(!engine.has_active_script());
}

#[test]
fn test_stalled_handler_reinvoked_until_ready() {
    let (mut engine, log) = capture_engine();

    let readiness = Rc::new(RefCell::new(0u32));
    let counter = readiness.clone();
    engine.register_command("poll", move |_, _, _, _, _| {
        *counter.borrow_mut() += 1;
        Ok(*counter.borrow() >= 3)
    });

    let script = Script::new(lex("poll\nmsg ready").unwrap());
    assert!(engine.start_script(script).unwrap());
    while engine.execute_script().unwrap() {}

    assert_eq!(*readiness.borrow(), 3);
    assert_eq!(*log.borrow(), vec!["ready"]);
}

#[test]
fn test_command_advance_clears_pending_timeout() {
    let (mut engine, _log) = capture_engine();

    let calls = Rc::new(RefCell::new(0u32));
    let counter = calls.clone();
    engine.register_command("wait", move |engine, _, _, _, _| {
        *counter.borrow_mut() += 1;
        engine.timeout(60_000, |_| false);
        // Succeeds on the second attempt, well before the deadline.
        Ok(*counter.borrow() >= 2)
    });

    let script = Script::new(lex("wait").unwrap());
    assert!(engine.start_script(script).unwrap());
    while engine.execute_script().unwrap() {}

    // The successful advance disarmed the timeout.
    assert_eq!(engine.execution_state(), ExecutionState::Running);
    assert!(!engine.has_active_script());
}
