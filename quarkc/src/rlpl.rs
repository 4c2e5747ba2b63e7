use std::io::Write;

use quark_core::scanner::prelude::Scanner;

const PROMPT: &str = ">> ";

pub fn start() -> std::io::Result<()> {
	ctrlc::set_handler(|| std::process::exit(0))
		.expect("install Ctrl-C handler");

	let stdin = std::io::stdin();

	loop {
		let mut input = String::from("");

		print!("{}", PROMPT);
		std::io::stdout().flush()?;
		stdin.read_line(&mut input)?;

		if let Some('\n') = input.chars().next_back() {
			input.pop();
		}
		if let Some('\r') = input.chars().next_back() {
			input.pop();
		}

		match input.as_str() {
			"" => {},
			".exit" => return Ok(()),
			_ => {
				let mut scanner = Scanner::new(&input, true);

				for res in scanner.by_ref() {
					match res {
						Ok(token) => {
							println!("{:?} {:?} at {:?}", token.kind, token.lexeme, token.position);
						},
						Err(err) => {
							let details = err.details();
							let (column, line) = err.position;
							println!("[at {line}:{column}] Lexical Error: {}", details.0);
							if !details.1.is_empty() {
								println!("{}", details.1.join("\n"));
							}
							break;
						}
					}
				}
			}
		}
	}
}
