//! Interactive REPL (SPEC_FULL.md §11), grounded on the teacher's
//! `rustyline`-backed `src/repl/` but reduced to what `jspr`'s scope
//! actually needs: each line is parsed as a standalone JSON/YAML expression
//! and evaluated against a persistent root environment, so `let`/`be`
//! bindings accumulate across lines the way a human expects of a REPL. This
//! is additive convenience, isolated from the evaluator core.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::environment::Environment;
use crate::eval::eval;

const PROMPT: &str = "jspr> ";

/// Runs the REPL loop to completion (EOF or `Ctrl-D`), printing each
/// expression's `repr`-style result or raised error payload.
pub fn run(env: Environment) {
    let mut editor = match DefaultEditor::new() {
        Ok(e) => e,
        Err(err) => {
            eprintln!("jspr: failed to start REPL: {err}");
            return;
        }
    };

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str()).ok();
                eval_line(&line, &env);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("jspr: readline error: {err}");
                break;
            }
        }
    }
}

fn eval_line(line: &str, env: &Environment) {
    let parsed: serde_yaml::Value = match serde_yaml::from_str(line) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("jspr: parse error: {err}");
            return;
        }
    };
    let expr = match crate::document::from_yaml(parsed) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("jspr: {err}");
            return;
        }
    };
    match eval(&expr, env) {
        Ok(value) => println!("{value:?}"),
        Err(err) => eprintln!("{:?}", err.payload()),
    }
}
