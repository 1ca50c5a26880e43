//! End-to-end tests: lex, register handlers, tick to completion

use std::cell::RefCell;
use std::rc::Rc;

use uoscript::{lex, Engine, Script, Value};

type Log = Rc<RefCell<Vec<String>>>;

/// Register a capture handler that records `cmd NAME args…` per call.
fn register_capture(engine: &mut Engine, name: &str, log: &Log) {
    let sink = log.clone();
    engine.register_command(name, move |_, name, args, _, _| {
        let mut rendered = vec![format!("cmd {name}")];
        for arg in args {
            rendered.push(arg.as_string()?);
        }
        sink.borrow_mut().push(rendered.join(" "));
        Ok(true)
    });
}

/// Handlers backing list management with the engine stores, the way a real
/// host wires them.
fn register_list_commands(engine: &mut Engine) {
    engine.register_command("createlist", |engine, _, args, _, _| {
        engine.create_list(args[0].as_string()?);
        Ok(true)
    });
    engine.register_command("pushlist", |engine, _, args, _, force| {
        let name = args[0].as_string()?;
        engine.push_list(&name, args[1].clone(), false, force)?;
        Ok(true)
    });
}

fn run(engine: &mut Engine, source: &str) {
    let script = Script::new(lex(source).unwrap());
    assert!(engine.start_script(script).unwrap());
    while engine.execute_script().unwrap() {}
}

fn capture_engine() -> (Engine, Log) {
    let mut engine = Engine::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    register_capture(&mut engine, "msg", &log);
    register_list_commands(&mut engine);
    (engine, log)
}

#[test]
fn test_single_command() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "msg 'Hello'");
    assert_eq!(*log.borrow(), vec!["cmd msg Hello"]);
    assert!(!engine.has_active_script());
}

#[test]
fn test_if_else_takes_then_branch() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "if 1 == 1\n  msg a\nelse\n  msg b\nendif");
    assert_eq!(*log.borrow(), vec!["cmd msg a"]);
}

#[test]
fn test_if_else_takes_else_branch() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "if 2 == 1\n  msg a\nelse\n  msg b\nendif");
    assert_eq!(*log.borrow(), vec!["cmd msg b"]);
}

#[test]
fn test_elseif_chain() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "if 0 > 1\n  msg a\nelseif 1 == 1\n  msg b\nelse\n  msg c\nendif",
    );
    assert_eq!(*log.borrow(), vec!["cmd msg b"]);
}

#[test]
fn test_for_runs_three_times() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "for 3\n  msg x\nendfor");
    assert_eq!(*log.borrow(), vec!["cmd msg x"; 3]);
}

#[test]
fn test_foreach_over_empty_list_skips_body() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "createlist L\nforeach v in L\nmsg v\nendfor");
    assert!(log.borrow().is_empty());
}

#[test]
fn test_foreach_binds_elements() {
    let (mut engine, log) = capture_engine();
    run(
        &mut engine,
        "createlist L\npushlist L apple\npushlist L orange\nforeach v in L\nmsg v\nendfor",
    );
    assert_eq!(*log.borrow(), vec!["cmd msg apple", "cmd msg orange"]);
}

#[test]
fn test_while_with_break_runs_once() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "while 0 < 1\nmsg loop\nbreak\nendwhile");
    assert_eq!(*log.borrow(), vec!["cmd msg loop"]);
    assert!(!engine.has_active_script());
}

#[test]
fn test_quiet_modifier_reaches_handler() {
    let mut engine = Engine::new();
    let seen: Rc<RefCell<Vec<(String, Vec<String>, bool, bool)>>> =
        Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    engine.register_command("setalias", move |_, name, args, quiet, force| {
        let mut rendered = Vec::new();
        for arg in args {
            rendered.push(arg.as_string()?);
        }
        sink.borrow_mut()
            .push((name.to_string(), rendered, quiet, force));
        Ok(true)
    });

    run(&mut engine, "@setalias 'Logs' 'Found'");

    let calls = seen.borrow();
    assert_eq!(calls.len(), 1);
    let (name, args, quiet, force) = &calls[0];
    assert_eq!(name, "setalias");
    assert_eq!(args, &vec!["Logs".to_string(), "Found".to_string()]);
    assert!(*quiet);
    assert!(!*force);
}

#[test]
fn test_unknown_command_aborts_script() {
    let (mut engine, log) = capture_engine();
    let script = Script::new(lex("msg before\nnosuchcommand\nmsg after").unwrap());
    assert!(engine.start_script(script).unwrap());
    let err = loop {
        match engine.execute_script() {
            Ok(true) => {}
            Ok(false) => panic!("expected the script to fail"),
            Err(e) => break e,
        }
    };
    assert!(err.to_string().contains("nosuchcommand"));
    assert_eq!(*log.borrow(), vec!["cmd msg before"]);
    assert!(!engine.has_active_script());
}

#[test]
fn test_logical_expression_evaluates_both_sides() {
    let mut engine = Engine::new();
    let evals: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    for (name, result) in [("lhs", false), ("rhs", true)] {
        let sink = evals.clone();
        engine.register_expression(name, move |_, name, _, _| {
            sink.borrow_mut().push(name.to_string());
            Ok(Value::Bool(result))
        });
    }

    let log: Log = Rc::new(RefCell::new(Vec::new()));
    register_capture(&mut engine, "msg", &log);

    // `and` short-circuiting would skip rhs; both handlers must run.
    run(&mut engine, "if lhs and rhs\nmsg yes\nendif");
    assert_eq!(*evals.borrow(), vec!["lhs", "rhs"]);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_or_fold() {
    let mut engine = Engine::new();
    engine.register_expression("no", |_, _, _, _| Ok(Value::Bool(false)));
    engine.register_expression("yes", |_, _, _, _| Ok(Value::Bool(true)));
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    register_capture(&mut engine, "msg", &log);

    run(&mut engine, "if no or no or yes\nmsg reached\nendif");
    assert_eq!(*log.borrow(), vec!["cmd msg reached"]);
}

#[test]
fn test_expression_arguments() {
    let mut engine = Engine::new();
    engine.register_expression("skill", |_, _, args, _| {
        // Named skill lookup; 'hiding' is trained in this fixture.
        let which = args[0].as_string()?;
        Ok(Value::Int(if which == "hiding" { 100 } else { 0 }))
    });
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    register_capture(&mut engine, "msg", &log);

    run(&mut engine, "if skill 'hiding' >= 100\nmsg hidden\nendif");
    assert_eq!(*log.borrow(), vec!["cmd msg hidden"]);
}

#[test]
fn test_unregistered_operand_compares_as_string() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "if mode == mode\nmsg same\nendif");
    assert_eq!(*log.borrow(), vec!["cmd msg same"]);
}

#[test]
fn test_stop_ends_script() {
    let (mut engine, log) = capture_engine();
    run(&mut engine, "msg one\nstop\nmsg two");
    assert_eq!(*log.borrow(), vec!["cmd msg one"]);
}

#[test]
fn test_replay_restarts_from_top() {
    let mut engine = Engine::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    register_capture(&mut engine, "msg", &log);

    // Stops the script on the second pass so the replay loop terminates.
    let passes = Rc::new(RefCell::new(0u32));
    let counter = passes.clone();
    engine.register_command("checkpoint", move |engine, _, _, _, _| {
        *counter.borrow_mut() += 1;
        if *counter.borrow() >= 2 {
            engine.stop_script();
        }
        Ok(true)
    });

    run(&mut engine, "msg pass\ncheckpoint\nreplay");
    assert_eq!(*log.borrow(), vec!["cmd msg pass", "cmd msg pass"]);
    assert_eq!(*passes.borrow(), 2);
}

#[test]
fn test_alias_resolution_in_serial_argument() {
    let mut engine = Engine::new();
    engine.set_alias("self", 0x77);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    engine.register_command("attack", move |engine, _, args, _, _| {
        sink.borrow_mut().push(args[0].as_serial(engine)?);
        Ok(true)
    });

    run(&mut engine, "attack self\nattack 0x88\nattack 12");
    assert_eq!(*seen.borrow(), vec![0x77, 0x88, 12]);
}

#[test]
fn test_lex_file_round_trip() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "// smoke test").unwrap();
    writeln!(file, "msg 'from a file'").unwrap();

    let (mut engine, log) = capture_engine();
    let ast = uoscript::lex_file(file.path()).unwrap();
    let script = Script::new(ast);
    assert!(engine.start_script(script).unwrap());
    while engine.execute_script().unwrap() {}

    assert_eq!(*log.borrow(), vec!["cmd msg from a file"]);
}
