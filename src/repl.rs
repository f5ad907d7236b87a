use crate::runner;
use std::io::{self, Write};
use tracing::debug;

/// Interactive loop. Each line is run as a complete, independent program;
/// an error on one line does not affect the next.
pub fn start(show_tokens: bool) {
    println!("Bisaya++ Interpreter v0.1.0");
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                if show_tokens {
                    runner::dump_tokens(line);
                }

                let exit_code = runner::run(line, None);
                debug!(exit_code, "line finished");
                println!();
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}
