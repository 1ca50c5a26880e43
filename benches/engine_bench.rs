//! Benchmarks for script execution

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use uoscript::{lex, Engine, Script, Value};

fn noop_engine() -> Engine {
    let mut engine = Engine::new();
    engine.register_command("work", |_, _, _, _, _| Ok(true));
    engine.register_expression("ready", |_, _, _, _| Ok(Value::Bool(true)));
    engine
}

fn run_to_completion(engine: &mut Engine, script: Script) {
    engine.start_script(script).unwrap();
    while engine.execute_script().unwrap() {}
}

fn bench_tick_loop(c: &mut Criterion) {
    let ast = lex("for 100\nwork a b c\nendfor").unwrap();

    c.bench_function("for_loop_100", |b| {
        b.iter_batched(
            || (noop_engine(), Script::new(ast.clone())),
            |(mut engine, script)| run_to_completion(black_box(&mut engine), script),
            BatchSize::SmallInput,
        )
    });
}

fn bench_condition_evaluation(c: &mut Criterion) {
    let ast = lex("for 100\nif ready and 1 == 1\nwork\nendif\nendfor").unwrap();

    c.bench_function("condition_loop_100", |b| {
        b.iter_batched(
            || (noop_engine(), Script::new(ast.clone())),
            |(mut engine, script)| run_to_completion(black_box(&mut engine), script),
            BatchSize::SmallInput,
        )
    });
}

fn bench_list_iteration(c: &mut Criterion) {
    let setup = "createlist L\nfor 50\npushlist L entry\nendfor";
    let loop_source = "foreach v in L\nwork v\nendfor";

    c.bench_function("foreach_50", |b| {
        b.iter_batched(
            || {
                let mut engine = noop_engine();
                engine.register_command("createlist", |engine, _, args, _, _| {
                    engine.create_list(args[0].as_string()?);
                    Ok(true)
                });
                engine.register_command("pushlist", |engine, _, args, _, _| {
                    let name = args[0].as_string()?;
                    engine.push_list(&name, args[1].clone(), false, false)?;
                    Ok(true)
                });
                run_to_completion(&mut engine, Script::new(lex(setup).unwrap()));
                let script = Script::new(lex(loop_source).unwrap());
                (engine, script)
            },
            |(mut engine, script)| run_to_completion(black_box(&mut engine), script),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_tick_loop,
    bench_condition_evaluation,
    bench_list_iteration
);
criterion_main!(benches);
