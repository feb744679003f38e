/// jspr - CLI entry point
///
/// Loads a JSON/YAML document, evaluates it as a `do`-sequence against a
/// root environment with the kernel registered, and prints the result. See
/// SPEC_FULL.md §11.
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use jspr::{Arguments, Callable, Environment, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jspr", version, about = "A homoiconic JSON/YAML language evaluator")]
struct RunConfig {
    /// Input document path, or `-` for stdin. Ignored with --repl.
    input: Option<String>,

    /// Write the result to FILE instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Start an interactive REPL instead of evaluating a file.
    #[arg(long)]
    repl: bool,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("jspr={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input)
    }
}

fn print_fn(args: &Arguments, _env: &Environment) -> jspr::JsprResult<Value> {
    let value = match args {
        Arguments::Positional(items) => items.first().cloned().unwrap_or(Value::Null),
        Arguments::Keyword(kw) => kw.first_arg().clone(),
    };
    println!("{}", value.to_display_string());
    Ok(value)
}

fn root_environment() -> Environment {
    let env = Environment::new();
    jspr::load_kernel(&env);
    env.define("print", Value::Callable(Callable::native_function(print_fn)));
    env
}

fn run_file(config: &RunConfig) -> Result<(), i32> {
    let input = config.input.as_deref().unwrap_or("-");
    let text = read_input(input).map_err(|e| {
        eprintln!("jspr: failed to read {input}: {e}");
        1
    })?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| {
        eprintln!("jspr: failed to parse {input}: {e}");
        1
    })?;
    let doc = jspr::document::from_yaml(doc).map_err(|e| {
        eprintln!("jspr: {e}");
        1
    })?;

    let env = root_environment();
    match jspr::kernel::eval_do_seq(&doc, &env) {
        Ok(value) => {
            let rendered = format!("{value:?}");
            match &config.output {
                Some(path) => {
                    fs::write(path, rendered + "\n").map_err(|e| {
                        eprintln!("jspr: failed to write {}: {e}", path.display());
                        1
                    })?;
                }
                None => {
                    let mut stdout = io::stdout();
                    writeln!(stdout, "{rendered}").ok();
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{:?}", err.payload());
            Err(1)
        }
    }
}

fn main() {
    let config = RunConfig::parse();
    init_tracing(config.verbose);

    if config.repl {
        jspr::repl::run(root_environment());
        return;
    }

    if let Err(code) = run_file(&config) {
        process::exit(code);
    }
}
