//! Interactive Shell for Tinycat BASIC
//!
//! This mirrors the reference implementation's `command_loop`: read a
//! line, try each immediate-mode command in a fixed order, and if none of
//! them match, fall back to direct-mode dispatch (store a numbered line,
//! or execute an unnumbered one right away). Errors caught here are
//! reported and swallowed so one bad line never kills the session.
//!
//! The prompt is read from and reported to the same input/output the
//! interpreter was constructed with — in the shipped binary that's real
//! stdio, in tests an in-memory buffer doubles as both the REPL's
//! transcript and whatever `INPUT` reads from, exactly as a real
//! terminal session would interleave them.

use crate::error::Reported;
use crate::interpreter::Interpreter;
use std::io::{self, BufRead, Write};

/// Runs the interactive prompt loop until `BYE` or end-of-input.
pub fn run<R: BufRead, W: Write>(interp: &mut Interpreter<R, W>, banner: &str) -> io::Result<()> {
    interp.write_line(banner)?;
    loop {
        interp.write_prompt("> ")?;

        let line = match interp.read_line()? {
            Some(line) => line,
            None => break, // end of input, same as Python's EOFError
        };

        interp.begin_line(line.as_str());

        if interp.match_command("bye") {
            break;
        } else if interp.match_command("list") {
            report_io(interp.list_program(), interp)?;
        } else if interp.match_command("run") {
            report(interp.run(), interp)?;
        } else if interp.match_command("continue") {
            report(interp.cont(), interp)?;
        } else if interp.match_command("clear") {
            interp.clear_variables();
        } else if interp.match_command("new") {
            interp.clear_program();
        } else if interp.match_command("delete") {
            let result = interp.exec_delete();
            report_at_cursor(result, interp)?;
        } else if interp.match_command("save") {
            match interp.match_filename() {
                Ok(filename) => {
                    let result = interp.save_program(&filename);
                    report_io(result, interp)?;
                }
                Err(e) => {
                    let cursor = interp.cursor();
                    interp.write_line(&format!("{} in column {}", e, cursor))?;
                }
            }
        } else if interp.match_command("load") {
            match interp.match_filename() {
                Ok(filename) => {
                    let result = interp.load_program(&filename);
                    report(result, interp)?;
                }
                Err(e) => {
                    let cursor = interp.cursor();
                    interp.write_line(&format!("{} in column {}", e, cursor))?;
                }
            }
        } else {
            let result = interp.dispatch_current_line();
            report(result, interp)?;
        }
    }
    Ok(())
}

fn report<R: BufRead, W: Write>(
    result: std::result::Result<(), Reported>,
    interp: &mut Interpreter<R, W>,
) -> io::Result<()> {
    if let Err(reported) = result {
        interp.write_line(&reported.to_string())?;
    }
    Ok(())
}

fn report_at_cursor<R: BufRead, W: Write>(
    result: crate::error::Result<()>,
    interp: &mut Interpreter<R, W>,
) -> io::Result<()> {
    if let Err(e) = result {
        let cursor = interp.cursor();
        interp.write_line(&format!("{} in column {}", e, cursor))?;
    }
    Ok(())
}

fn report_io<R: BufRead, W: Write>(
    result: crate::error::Result<()>,
    interp: &mut Interpreter<R, W>,
) -> io::Result<()> {
    if let Err(e) = result {
        interp.write_line(&e.to_string())?;
    }
    Ok(())
}
