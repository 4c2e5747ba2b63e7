mod cli;
mod rlpl;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use quark_core::{
    scanner::prelude::{Scanner, Token},
    utils::prelude::Error,
};

use cli::{print_scanned, print_scanning};

#[derive(Parser)]
enum Command {
    /// Performs lexical analysis and prints the token stream
    Scan {
        /// Path of source file
        path: PathBuf,
        /// Emit whitespace runs as SKIP tokens instead of discarding them
        #[arg(short, long, default_value_t = false)]
        emit_skips: bool,
        /// Print tokens as JSON objects
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Runs Read Lex Print Loop
    Rlpl,
}

fn main() {
    env_logger::init();

    let result = match Command::parse() {
        Command::Scan { path, emit_skips, json } => scan(path, emit_skips, json),
        Command::Rlpl => rlpl::start().map_err(|err| Error::StdIo { err: err.kind() }),
    };

    if let Err(error) = result {
        let buf_writer = cli::stderr_buffer_writer();
        let mut buf = buf_writer.buffer();

        error.pretty(&mut buf);
        buf_writer.print(&buf).expect("print error to stderr");

        std::process::exit(1);
    }
}

fn scan(path: PathBuf, emit_skips: bool, json: bool) -> Result<(), Error> {
    let src = std::fs::read_to_string(&path)
        .map_err(|err| Error::StdIo { err: err.kind() })?;

    print_scanning(&path.to_string_lossy());
    let started = Instant::now();

    let mut scanner = Scanner::new(&src, !emit_skips);
    let tokens = scanner.tokens()
        .map_err(|error| Error::Scan { path, src: src.clone(), error })?;

    print_scanned(started.elapsed());

    for token in &tokens {
        if json {
            println!("{}", token_json(token));
        } else {
            println!("{:?} {:?} at {:?}", token.kind, token.lexeme, token.position);
        }
    }

    Ok(())
}

fn token_json(token: &Token) -> String {
    serde_json::json!({
        "kind": format!("{:?}", token.kind),
        "lexeme": token.lexeme,
        "position": [token.position.0, token.position.1]
    })
    .to_string()
}
