//! hornlog CLI - a deductive database over Horn clauses.
//!
//! With file arguments, evaluates each file in order and prints query
//! results; without arguments, starts the interactive REPL.

use std::io;

use hornlog::engine::Engine;
use hornlog::repl::{eval_files, Repl};
use hornlog::trace;

fn main() {
    trace::init_subscriber();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("-h") | Some("--help") => print_usage(),
        Some(_) => run_files(&args),
        None => run_repl(),
    }
}

fn print_usage() {
    let name = std::env::args()
        .next()
        .unwrap_or_else(|| "hornlog".to_string());
    println!("usage: {} [-h|--help] [FILE]...", name);
}

fn run_files(paths: &[String]) {
    let mut engine = Engine::new();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    if let Err(err) = eval_files(&mut engine, paths, &mut output) {
        eprintln!("error: {}", err);
    }
}

fn run_repl() {
    let mut repl = Repl::new();
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(err) = repl.run(&mut stdin.lock(), &mut stdout.lock()) {
        eprintln!("error: {}", err);
    }
}
