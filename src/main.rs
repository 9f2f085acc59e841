//! Tinycat BASIC — an embeddable, line-numbered BASIC interpreter.
//!
//! ## Architecture
//!
//! - **scanner**: recognizes lexical elements on demand; there is no
//!   upfront tokenization pass.
//! - **value**: the single numeric value type and its `-1`/`0` boolean
//!   encoding.
//! - **program**: the stored-line table `RUN`/`LIST`/`DELETE` operate on.
//! - **stack**: the typed control-flow stack backing `GOSUB`/`DO`/`FOR`.
//! - **functions**: the builtin math table and the separate `DEF FN` table.
//! - **interpreter**: statement execution and expression evaluation.
//! - **repl**: the interactive shell built on top of the interpreter.
//! - **error**: the error and error-reporting types shared by all of the above.
//!
//! ## Startup
//!
//! Any command-line arguments are treated as filenames: each is loaded
//! (as `LOAD "<name>"` would be, line by line) before the program runs
//! once. If that run hits a `STOP` statement, the interactive prompt
//! follows; otherwise the process exits once the program finishes. With
//! no arguments, the prompt starts immediately.

mod error;
mod functions;
mod interpreter;
mod program;
mod repl;
mod scanner;
mod stack;
mod value;

use interpreter::Interpreter;
use std::io::{self, BufReader};
use std::process;

// The embedded blank line reproduces the reference implementation's
// `command_loop("Tinycat BASIC v1.1 READY\n")`, where `print()` adds a
// second newline on top of the one already in the banner text.
const BANNER: &str = "Tinycat BASIC v1.1 READY\n";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut interp = Interpreter::new(BufReader::new(stdin.lock()), stdout.lock());

    if !args.is_empty() {
        for filename in &args {
            if let Err(reported) = interp.load_program(filename) {
                eprintln!("{}", reported);
                process::exit(1);
            }
        }
        if let Err(reported) = interp.run() {
            let _ = interp.write_line(&reported.to_string());
        }
        if !interp.stopped() {
            let _ = interp.flush();
            return;
        }
    }

    if let Err(e) = repl::run(&mut interp, BANNER) {
        eprintln!("I/O error: {}", e);
        process::exit(1);
    }
    let _ = interp.flush();
}
