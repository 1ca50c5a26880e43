//! UOScript - main binary
//!
//! A demonstration host around the engine: registers a small catalog of
//! commands, expressions, and aliases, then drives scripts from files, the
//! command line, or an interactive REPL.

use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;

use uoscript::{
    lex, lex_file, Argument, Engine, ExecutionState, Result as ScriptResult, Script, Value,
    ALIAS_NONE,
};

#[derive(Parser)]
#[command(name = "uoscript")]
#[command(about = "UOScript - scripting engine for the UO Steam command language", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file to completion
    Run {
        /// Input script file
        input: PathBuf,

        /// Print a JSON run summary
        #[arg(long)]
        json: bool,

        /// Abort after this many ticks (runaway scripts)
        #[arg(long, default_value = "1000000")]
        max_ticks: u64,
    },

    /// Execute script source from the command line
    Exec {
        /// Script source; separate statements with newlines
        code: String,
    },

    /// Start interactive REPL
    Repl,

    /// Display the demo handler catalog
    Info,
}

#[derive(Serialize)]
struct RunStats {
    ticks: u64,
    elapsed_ms: u128,
    completed: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    match &cli.command {
        Commands::Run {
            input,
            json,
            max_ticks,
        } => {
            let ast = match lex_file(input) {
                Ok(ast) => ast,
                Err(e) => {
                    eprintln!("{}: {}", "Parse failed".red().bold(), e);
                    process::exit(1);
                }
            };

            let mut engine = Engine::new();
            register_demo_host(&mut engine);

            match run_to_completion(&mut engine, Script::new(ast), *max_ticks) {
                Ok(stats) => {
                    if *json {
                        println!("{}", serde_json::to_string(&stats).unwrap());
                    } else {
                        println!("{}", "✓ Script complete".green().bold());
                        println!("  Ticks: {}", stats.ticks);
                        println!("  Time: {}ms", stats.elapsed_ms);
                    }
                    if !stats.completed {
                        eprintln!("{}", "Tick limit reached before completion".yellow());
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{}: {}", "Script failed".red().bold(), e);
                    process::exit(1);
                }
            }
        }

        Commands::Exec { code } => {
            let mut engine = Engine::new();
            register_demo_host(&mut engine);

            if let Err(e) = execute_source(&mut engine, code) {
                eprintln!("{}: {}", "Error".red(), e);
                process::exit(1);
            }
        }

        Commands::Repl => run_repl(),

        Commands::Info => print_info(),
    }
}

/// Tick the engine until the script finishes or the tick budget runs out.
/// Sleeps briefly while paused or timing out so the loop does not spin.
fn run_to_completion(
    engine: &mut Engine,
    script: Script,
    max_ticks: u64,
) -> ScriptResult<RunStats> {
    let start = Instant::now();
    let mut ticks: u64 = 0;

    let mut active = engine.start_script(script)?;
    ticks += 1;

    while active && ticks < max_ticks {
        if engine.execution_state() != ExecutionState::Running {
            std::thread::sleep(Duration::from_millis(5));
        }
        active = engine.execute_script()?;
        ticks += 1;
    }

    Ok(RunStats {
        ticks,
        elapsed_ms: start.elapsed().as_millis(),
        completed: !engine.has_active_script(),
    })
}

fn execute_source(engine: &mut Engine, source: &str) -> anyhow::Result<()> {
    // Discard anything a previous run left behind (REPL reuses the engine).
    engine.stop_script();
    let ast = lex(source)?;
    run_to_completion(engine, Script::new(ast), 1_000_000)?;
    Ok(())
}

// ---- Demo handler catalog ----------------------------------------------

/// Print the invocation and succeed. Stands in for every game-side command
/// the engine itself knows nothing about.
fn echo_command(
    _engine: &mut Engine,
    name: &str,
    args: &[Argument],
    _quiet: bool,
    _force: bool,
) -> ScriptResult<bool> {
    let mut rendered = Vec::with_capacity(args.len());
    for arg in args {
        rendered.push(arg.as_string()?);
    }
    if rendered.is_empty() {
        println!("cmd {name}");
    } else {
        println!("cmd {name} {}", rendered.join(" "));
    }
    Ok(true)
}

const ECHO_COMMANDS: &[&str] = &[
    "msg", "sysmsg", "headmsg", "attack", "cast", "useobject", "useskill", "walk", "turn",
];

/// Wire up commands, expressions, and an alias handler against the engine
/// stores.
fn register_demo_host(engine: &mut Engine) {
    for name in ECHO_COMMANDS {
        engine.register_command(*name, echo_command);
    }

    engine.register_command("setalias", |engine, _, args, _, _| {
        let name = args[0].as_string()?;
        let serial = args[1].as_serial(engine)?;
        engine.set_alias(name, serial);
        Ok(true)
    });

    engine.register_command("unsetalias", |engine, _, args, _, _| {
        engine.unset_alias(&args[0].as_string()?);
        Ok(true)
    });

    engine.register_command("createlist", |engine, _, args, _, _| {
        engine.create_list(args[0].as_string()?);
        Ok(true)
    });

    engine.register_command("removelist", |engine, _, args, _, _| {
        engine.destroy_list(&args[0].as_string()?);
        Ok(true)
    });

    engine.register_command("clearlist", |engine, _, args, _, _| {
        engine.clear_list(&args[0].as_string()?)?;
        Ok(true)
    });

    // Force makes the push unique; an optional trailing 'front' prepends.
    engine.register_command("pushlist", |engine, _, args, _, force| {
        let name = args[0].as_string()?;
        let front = args
            .get(2)
            .map(|arg| arg.as_string())
            .transpose()?
            .is_some_and(|place| place == "front");
        engine.push_list(&name, args[1].clone(), front, force)?;
        Ok(true)
    });

    // `poplist NAME front|back` pops an end, anything else removes by value.
    engine.register_command("poplist", |engine, _, args, _, _| {
        let name = args[0].as_string()?;
        match args[1].as_string()?.as_str() {
            "front" => {
                engine.pop_list(&name, true)?;
            }
            "back" => {
                engine.pop_list(&name, false)?;
            }
            _ => {
                engine.pop_list_value(&name, &args[1])?;
            }
        }
        Ok(true)
    });

    engine.register_command("createtimer", |engine, _, args, _, _| {
        engine.create_timer(args[0].as_string()?);
        Ok(true)
    });

    engine.register_command("settimer", |engine, _, args, _, _| {
        let name = args[0].as_string()?;
        let ms = i64::from(args[1].as_int()?);
        engine.set_timer(name, ms);
        Ok(true)
    });

    engine.register_command("removetimer", |engine, _, args, _, _| {
        engine.remove_timer(&args[0].as_string()?);
        Ok(true)
    });

    engine.register_command("pause", |engine, _, args, _, _| {
        engine.pause(u64::from(args[0].as_uint()?));
        Ok(true)
    });

    engine.register_expression("timer", |engine, _, args, _| {
        let elapsed = engine.get_timer(&args[0].as_string()?)?;
        Ok(Value::Int(elapsed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32))
    });

    engine.register_expression("listexists", |engine, _, args, _| {
        Ok(Value::Bool(engine.list_exists(&args[0].as_string()?)))
    });

    engine.register_expression("list", |engine, _, args, _| {
        Ok(Value::Int(engine.list_length(&args[0].as_string()?)? as i32))
    });

    engine.register_expression("inlist", |engine, _, args, _| {
        Ok(Value::Bool(
            engine.list_contains(&args[0].as_string()?, &args[1])?,
        ))
    });

    engine.register_expression("findalias", |engine, _, args, _| {
        Ok(Value::Bool(
            engine.get_alias(&args[0].as_string()?) != ALIAS_NONE,
        ))
    });

    engine.register_expression("contains", |_, _, args, _| {
        let haystack = args[0].as_string()?;
        let needle = args[1].as_string()?;
        Ok(Value::Bool(haystack.contains(&needle)))
    });

    // Dynamic alias: the most recent "find" result in a real client; a
    // fixed placeholder serial here.
    engine.register_alias_handler("found", |_| 0x0040_0000);
}

// ---- REPL ---------------------------------------------------------------

/// Nesting delta contributed by one source line: control-flow headers open
/// a block, closers end one.
fn nesting_delta(line: &str) -> i32 {
    match line.split_whitespace().next() {
        Some("if" | "while" | "for" | "foreach") => 1,
        Some("endif" | "endwhile" | "endfor") => -1,
        _ => 0,
    }
}

fn run_repl() {
    let mut engine = Engine::new();
    register_demo_host(&mut engine);

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start REPL".red().bold(), e);
            process::exit(1);
        }
    };

    println!("{}", "UOScript REPL".cyan().bold());
    println!("Type {} for help, {} to exit\n", ".help".yellow(), ".quit".yellow());

    let mut buffer: Vec<String> = Vec::new();
    let mut depth: i32 = 0;

    loop {
        let prompt = if depth > 0 { "... " } else { ">> " };
        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if depth == 0 {
                    match trimmed {
                        "" => continue,
                        ".quit" | ".exit" => break,
                        ".help" => {
                            print_repl_help();
                            continue;
                        }
                        _ => {}
                    }
                }

                let _ = editor.add_history_entry(&line);
                depth = (depth + nesting_delta(trimmed)).max(0);
                buffer.push(line);

                // Run once every opened block is closed again.
                if depth == 0 {
                    let source = buffer.join("\n");
                    buffer.clear();
                    if let Err(e) = execute_source(&mut engine, &source) {
                        eprintln!("{}: {}", "Error".red(), e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                depth = 0;
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    println!("\n{}", "Goodbye!".cyan());
}

fn print_repl_help() {
    println!("\n{}", "REPL Commands:".cyan().bold());
    println!("  {}  - Show this help", ".help".yellow());
    println!("  {}  - Quit the REPL", ".quit".yellow());
    println!("\n{}", "Script Basics:".cyan().bold());
    println!("  {}      - Invoke the msg command", "msg 'Hello'".yellow());
    println!("  {}  - Conditionals (multi-line)", "if 1 == 1 ... endif".yellow());
    println!("  {}       - Counted loop", "for 3 ... endfor".yellow());
    println!("  {}       - Suspend for 500ms", "pause 500".yellow());
    println!();
}

fn print_info() {
    println!("\n{}", "UOScript Engine".cyan().bold());
    println!("{}", "=".repeat(50));
    println!();

    println!("{}", "Components:".green().bold());
    println!("  ✓ Frontend: line lexer, arena AST");
    println!("  ✓ Interpreter: scopes, lazy arguments, control flow");
    println!("  ✓ Engine: aliases, lists, timers, pause/timeout driver");
    println!();

    println!("{}", "Demo commands:".green().bold());
    println!("  {}", ECHO_COMMANDS.join(" "));
    println!("  setalias unsetalias createlist removelist clearlist");
    println!("  pushlist poplist createtimer settimer removetimer pause");
    println!();

    println!("{}", "Demo expressions:".green().bold());
    println!("  timer listexists list inlist findalias contains");
    println!();
}
