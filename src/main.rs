//! Retroscript CLI: compile, disassemble or run a script.

use std::env;
use std::fs;
use std::process;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use retroscript::error::CompileError;
use retroscript::{CompilerConfig, ParserStrategy, Target};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the source comes from.
enum Input {
    File(String),
    Eval(String),
}

/// CLI options parsed from arguments.
struct Options {
    input: Input,
    config: CompilerConfig,
    run: bool,
    verbose: bool,
}

fn print_usage() {
    eprintln!("Retroscript {} - retargetable script compiler", VERSION);
    eprintln!();
    eprintln!("Usage: retroscript [options] <script.rts>");
    eprintln!("       retroscript [options] -e <source>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <source>      Compile source given on the command line");
    eprintln!("  --pratt          Parse a single expression with the Pratt parser");
    eprintln!("  --target <a|b>   Bytecode target (default: b)");
    eprintln!("  --run            Run on the interpreter instead of compiling");
    eprintln!("  --check          Interpret before compiling, failing on runtime errors");
    eprintln!("  --verbose        Log pipeline stages (also: RETROSCRIPT_LOG=debug)");
    eprintln!("  --version        Show version");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  retroscript script.rts                Print Target-B disassembly");
    eprintln!("  retroscript --target a script.rts     Print Target-A disassembly");
    eprintln!("  retroscript --run script.rts          Run a script");
    eprintln!("  retroscript --pratt -e '1 + 2 * 3'    Compile one expression");
}

fn usage_error(message: &str) -> ! {
    eprintln!("{}", message.red());
    print_usage();
    process::exit(64);
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut input = None;
    let mut config = CompilerConfig::default();
    let mut run = false;
    let mut verbose = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--version" | "-v" => {
                println!("retroscript {}", VERSION);
                process::exit(0);
            }
            "--pratt" => config.parser = ParserStrategy::Pratt,
            "--run" => run = true,
            "--check" => config.sanity_check = true,
            "--verbose" => verbose = true,
            "--target" => {
                i += 1;
                let Some(name) = args.get(i) else {
                    usage_error("--target requires a value");
                };
                config.target = match name.parse::<Target>() {
                    Ok(target) => target,
                    Err(e) => usage_error(&e.to_string()),
                };
            }
            "-e" => {
                i += 1;
                let Some(source) = args.get(i) else {
                    usage_error("-e requires a source argument");
                };
                if input.is_some() {
                    usage_error("Only one input can be specified");
                }
                input = Some(Input::Eval(source.clone()));
            }
            _ if arg.starts_with('-') => usage_error(&format!("Unknown option: {}", arg)),
            _ => {
                if input.is_some() {
                    usage_error("Only one input can be specified");
                }
                input = Some(Input::File(arg.clone()));
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        usage_error("No input given");
    };

    Options {
        input,
        config,
        run,
        verbose,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("retroscript=debug")
    } else {
        EnvFilter::try_from_env("RETROSCRIPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let options = parse_args();
    init_logging(options.verbose);

    let source = match &options.input {
        Input::Eval(source) => source.clone(),
        Input::File(path) => match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{}", format!("Error: could not read '{}': {}", path, e).red());
                process::exit(66);
            }
        },
    };

    let result = if options.run {
        retroscript::interpret(&source, &options.config)
    } else {
        compile_and_print(&source, &options.config)
    };

    if let Err(e) = result {
        report(&e);
        process::exit(exit_code(&e));
    }
}

fn compile_and_print(source: &str, config: &CompilerConfig) -> Result<(), CompileError> {
    let chunk = retroscript::compile(source, config)?;
    println!("== {} ==", config.target);
    for line in retroscript::disassemble(&chunk, config.target)? {
        println!("{}", line);
    }
    Ok(())
}

fn report(error: &CompileError) {
    match error {
        CompileError::Lexer(errors) => {
            for e in errors {
                eprintln!("{}", format!("Error: {}", e).red());
            }
        }
        CompileError::Parser(errors) => {
            for e in errors {
                eprintln!("{}", format!("Error: {}", e).red());
            }
        }
        other => eprintln!("{}", format!("Error: {}", other).red()),
    }
}

fn exit_code(error: &CompileError) -> i32 {
    match error {
        CompileError::Lexer(_) | CompileError::Parser(_) => 65,
        CompileError::Runtime(_) | CompileError::Codegen(_) | CompileError::Decompile(_) => 70,
    }
}
