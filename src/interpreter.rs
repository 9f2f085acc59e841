//! Interpreter for Tinycat BASIC
//!
//! This module is the execution engine: it owns every piece of runtime
//! state (variables, the stored program, the control-flow stack, the
//! function tables) and drives both statement execution and expression
//! evaluation directly against the scanner, with no intermediate token
//! stream or AST. Parsing and evaluating a statement happen in the same
//! pass — a `parse_factor`-equivalent method both recognizes a numeric
//! literal *and* produces its value in one step, rather than building a
//! node another pass would later walk.
//!
//! ## Expression Precedence
//!
//! From loosest to tightest binding:
//!
//! ```text
//! disjunction  (or)
//!   conjunction  (and)
//!     negation     (not)
//!       comparison   (= <> < <= > >=)
//!         expression   (+ -)
//!           term         (* / \)
//!             power        (^, right-associative)
//!               factor       (unary -, literals, vars, calls, parens)
//! ```
//!
//! Unary minus binds tighter than `^`: `-2^2` parses as `(-2)^2`, matching
//! the reference implementation's placement of the sign check inside
//! `parse_factor` rather than around the whole power expression.
//!
//! ## I/O
//!
//! [`Interpreter`] is generic over an input source and an output sink so
//! it can be driven by real stdio in the shipped binary and by in-memory
//! buffers in tests, without `PRINT`/`INPUT` needing to know which.

use crate::error::{BasicError, Reported, Result};
use crate::functions::{Builtins, UserFunction, UserFunctions};
use crate::program::ProgramStore;
use crate::scanner::Scanner;
use crate::stack::{Frame, RuntimeStack};
use crate::value::{encode_bool, format_number, is_truthy, Number};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// The running state of a Tinycat BASIC session: variables, the stored
/// program, the control-flow stack, both function tables, and the
/// position of execution within the program's address vector.
pub struct Interpreter<R: BufRead, W: Write> {
    variables: HashMap<String, Number>,
    scanner: Scanner,
    program: ProgramStore,
    stack: RuntimeStack,
    builtins: Builtins,
    user_functions: UserFunctions,
    /// Sorted line numbers snapshotted at the start of `RUN`, so edits
    /// made to the program mid-run don't retroactively change the
    /// address space the current run is executing against.
    address_vector: Vec<i64>,
    /// Index into `address_vector` of the next line to execute.
    pc: usize,
    /// Set by the `STOP` statement; checked between lines so the main
    /// loop can hand control back to the REPL without exhausting the
    /// whole program.
    stop: bool,
    rng: StdRng,
    input: R,
    output: W,
}

/// Elapsed process CPU time in seconds, the same quantity the original
/// gets from `time.process_time()` — unlike a wall-clock `Instant`, this
/// does not advance while the process is blocked on `INPUT`'s read.
#[cfg(unix)]
fn process_cpu_time_secs() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts);
    }
    ts.tv_sec as f64 + ts.tv_nsec as f64 / 1_000_000_000.0
}

#[cfg(not(unix))]
fn process_cpu_time_secs() -> f64 {
    0.0
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            variables: HashMap::new(),
            scanner: Scanner::new(),
            program: ProgramStore::new(),
            stack: RuntimeStack::new(),
            builtins: Builtins::new(),
            user_functions: UserFunctions::new(),
            address_vector: Vec::new(),
            pc: 0,
            stop: false,
            rng: StdRng::from_entropy(),
            input,
            output,
        }
    }

    /// `true` once a `STOP` statement has fired during the most recent
    /// `RUN`/`CONTINUE`, i.e. whether the caller should drop into an
    /// interactive prompt instead of exiting.
    pub fn stopped(&self) -> bool {
        self.stop
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    /// The output sink, for callers (tests, embedders) that need to
    /// inspect or reclaim what was written.
    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.output.flush()
    }

    // ---- REPL-facing plumbing -------------------------------------------
    //
    // The REPL drives the same scanner the statement/expression methods
    // below use, so that command recognition (`BYE`, `LIST`, ...) and
    // direct-mode statement execution share one cursor, exactly as the
    // reference implementation's `command_loop` and `parse_statement`
    // share one set of globals.

    /// Installs a new line of input without otherwise touching state.
    pub fn begin_line(&mut self, raw: impl Into<String>) {
        self.scanner.set_line(raw);
    }

    /// Case-insensitive keyword match against the current line, restoring
    /// the cursor on a miss so later checks see the line from the start.
    pub fn match_command(&mut self, keyword: &str) -> bool {
        self.scanner.match_nocase(keyword)
    }

    pub fn cursor(&self) -> usize {
        self.scanner.cursor()
    }

    /// Reads one line from the same input source `INPUT` reads from.
    /// Returns `Ok(None)` at end-of-input, matching Python's `EOFError`.
    pub fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.input.read_line(&mut line)?;
        if bytes_read == 0 {
            Ok(None)
        } else {
            Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
        }
    }

    /// Writes `text` followed by a newline to the output sink, for REPL
    /// banners and error reports.
    pub fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Writes `text` with no trailing newline and flushes immediately, for
    /// the `"> "` prompt.
    pub fn write_prompt(&mut self, text: &str) -> std::io::Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn clear_program(&mut self) {
        self.program.clear();
    }

    /// Writes the stored program to the output sink in ascending line
    /// order, for the `LIST` command.
    pub fn list_program(&mut self) -> Result<()> {
        let lines: Vec<(i64, String)> = self
            .program
            .list()
            .map(|(n, body)| (n, body.to_string()))
            .collect();
        for (n, body) in lines {
            writeln!(self.output, "{}\t{}", n, body)?;
        }
        Ok(())
    }

    /// Parses the `DELETE` command's argument(s) against the current
    /// line, after the `DELETE` keyword itself has been consumed by
    /// [`Interpreter::match_command`].
    pub fn exec_delete(&mut self) -> Result<()> {
        let first = self.parse_expression()? as i64;
        if self.scanner.match_literal(",") {
            let second = self.parse_expression()? as i64;
            self.program.delete_range(first, second);
            Ok(())
        } else if self.program.delete_one(first) {
            Ok(())
        } else {
            Err(BasicError::Value(format!("Line not found: {}", first)))
        }
    }

    /// Reads the quoted filename argument of `SAVE`/`LOAD`.
    pub fn match_filename(&mut self) -> Result<String> {
        if self.scanner.match_string()? {
            Ok(self.scanner.token().to_string())
        } else {
            Err(BasicError::Syntax("Filename expected".to_string()))
        }
    }

    /// Writes every stored line to `filename`, tab-separated, in ascending
    /// order.
    pub fn save_program(&mut self, filename: &str) -> Result<()> {
        let mut file = std::fs::File::create(filename)?;
        for (n, body) in self.program.list() {
            writeln!(file, "{}\t{}", n, body)?;
        }
        Ok(())
    }

    /// Reads `filename` line by line, feeding each one through the same
    /// store-or-execute dispatch a typed line goes through.
    pub fn load_program(&mut self, filename: &str) -> std::result::Result<(), Reported> {
        let content = std::fs::read_to_string(filename)
            .map_err(|e| Reported::new(BasicError::from(e), 0))?;
        for raw in content.lines() {
            self.execute_line(raw)?;
        }
        Ok(())
    }

    /// Feeds one line of source through the "store if it starts with a
    /// line number, else execute immediately" dispatch used by both file
    /// loading and the REPL's non-command fallback.
    pub fn execute_line(&mut self, raw: &str) -> std::result::Result<(), Reported> {
        self.scanner.set_line(raw);
        self.dispatch_current_line()
    }

    /// Same dispatch as [`Interpreter::execute_line`], but operates on
    /// whatever is already loaded into the scanner — used by the REPL
    /// after a run of failed `match_command` checks has already
    /// positioned (and restored) the cursor at the start of the line.
    pub fn dispatch_current_line(&mut self) -> std::result::Result<(), Reported> {
        match self.scanner.match_line_number() {
            Some(line_num) => {
                self.scanner.skip_whitespace();
                let body = self.scanner.rest_of_line().to_string();
                self.program.set_line(line_num, body);
                Ok(())
            }
            None => {
                let cursor_before = self.scanner.cursor();
                self.execute_statement()
                    .map_err(|e| Reported::new(e, cursor_before.max(self.scanner.cursor())))
            }
        }
    }

    // ---- RUN / CONTINUE ---------------------------------------------------

    /// Snapshots the program's address vector, resets the stack and
    /// user-defined functions, and begins execution from the first line.
    pub fn run(&mut self) -> std::result::Result<(), Reported> {
        self.address_vector = self.program.address_vector();
        self.pc = 0;
        self.stack.clear();
        self.user_functions.clear();
        self.continue_execution()
    }

    /// Resumes execution from wherever it left off — after a `STOP`, or
    /// after an error was caught by the REPL.
    pub fn cont(&mut self) -> std::result::Result<(), Reported> {
        self.continue_execution()
    }

    fn continue_execution(&mut self) -> std::result::Result<(), Reported> {
        self.stop = false;
        while self.pc < self.address_vector.len() && !self.stop {
            let line_num = self.address_vector[self.pc];
            let body = self.program.get(line_num).unwrap_or("").to_string();
            self.pc += 1;
            self.scanner.set_line(body);
            self.execute_statement()
                .map_err(|e| Reported::with_line(e, self.scanner.cursor(), line_num))?;
        }
        Ok(())
    }

    // ---- Statement dispatch ------------------------------------------------

    fn execute_statement(&mut self) -> Result<()> {
        if !self.scanner.match_keyword() {
            return Err(BasicError::Syntax("Statement expected".to_string()));
        }
        let stmt = self.scanner.token().to_lowercase();
        match stmt.as_str() {
            "let" => self.stmt_let(),
            "print" => self.stmt_print(),
            "input" => self.stmt_input(),
            "if" => self.stmt_if(),
            "goto" => self.stmt_goto(),
            "gosub" => self.stmt_gosub(),
            "return" => self.stmt_return(),
            "end" => self.stmt_end(),
            "stop" => self.stmt_stop(),
            "do" => self.stmt_do(),
            "loop" => self.stmt_loop(),
            "for" => self.stmt_for(),
            "next" => self.stmt_next(),
            "def" => self.stmt_def(),
            "rem" => {
                self.scanner.consume_to_eol();
                Ok(())
            }
            "randomize" => self.stmt_randomize(),
            other => Err(BasicError::Syntax(format!("Unknown statement: {}", other))),
        }
    }

    fn stmt_let(&mut self) -> Result<()> {
        if !self.scanner.match_varname() {
            return Err(BasicError::Syntax("Variable expected".to_string()));
        }
        let name = self.scanner.token().to_lowercase();
        if !self.scanner.match_literal("=") {
            return Err(BasicError::Syntax("'=' expected".to_string()));
        }
        let value = self.parse_disjunction()?;
        self.variables.insert(name, value);
        Ok(())
    }

    fn stmt_print(&mut self) -> Result<()> {
        if self.scanner.match_eol() {
            writeln!(self.output)?;
            return Ok(());
        }
        let mut text = self.parse_print_value()?;
        while self.scanner.match_literal(",") {
            text.push_str(&self.parse_print_value()?);
        }
        if self.scanner.match_literal(";") {
            write!(self.output, "{}", text)?;
            self.output.flush()?;
        } else {
            writeln!(self.output, "{}", text)?;
        }
        Ok(())
    }

    fn parse_print_value(&mut self) -> Result<String> {
        if self.scanner.match_string()? {
            Ok(self.scanner.token().to_string())
        } else {
            Ok(format_number(self.parse_disjunction()?))
        }
    }

    fn stmt_input(&mut self) -> Result<()> {
        let prompt = if self.scanner.match_string()? {
            let p = self.scanner.token().to_string();
            if !self.scanner.match_literal(",") {
                return Err(BasicError::Syntax("Comma expected".to_string()));
            }
            p
        } else {
            String::new()
        };
        let names = self.parse_varlist()?;
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = trimmed.split(',').collect();
        for (i, name) in names.into_iter().enumerate() {
            let value = match fields.get(i) {
                Some(field) => field.trim().parse::<Number>().map_err(|_| {
                    BasicError::Value(format!("Invalid number: {}", field.trim()))
                })?,
                None => 0.0,
            };
            self.variables.insert(name, value);
        }
        Ok(())
    }

    fn stmt_if(&mut self) -> Result<()> {
        let condition = self.parse_disjunction()?;
        if self.scanner.match_nocase("then") {
            if is_truthy(condition) {
                self.scanner.skip_whitespace();
                self.execute_statement()
            } else {
                self.scanner.consume_to_eol();
                Ok(())
            }
        } else {
            Err(BasicError::Syntax("IF without THEN".to_string()))
        }
    }

    fn resolve_line_number(&self, n: Number) -> Result<usize> {
        let target = n as i64;
        self.address_vector
            .iter()
            .position(|&addr| addr == target)
            .ok_or_else(|| BasicError::Value(format!("Line not found: {}", target)))
    }

    fn stmt_goto(&mut self) -> Result<()> {
        let target = self.parse_expression()?;
        self.pc = self.resolve_line_number(target)?;
        Ok(())
    }

    fn stmt_gosub(&mut self) -> Result<()> {
        let target = self.parse_expression()?;
        let idx = self.resolve_line_number(target)?;
        self.stack.push(Frame::GoSub(self.pc));
        self.pc = idx;
        Ok(())
    }

    fn stmt_return(&mut self) -> Result<()> {
        self.pc = self.stack.pop_gosub()?;
        Ok(())
    }

    fn stmt_end(&mut self) -> Result<()> {
        self.pc = self.address_vector.len();
        Ok(())
    }

    fn stmt_stop(&mut self) -> Result<()> {
        self.stop = true;
        Ok(())
    }

    fn stmt_do(&mut self) -> Result<()> {
        self.stack.push(Frame::Do(self.pc));
        Ok(())
    }

    fn stmt_loop(&mut self) -> Result<()> {
        if self.scanner.match_nocase("while") {
            let condition = self.parse_disjunction()?;
            if is_truthy(condition) {
                self.pc = self.stack.peek_do()?;
            } else {
                self.stack.pop_do()?;
            }
            Ok(())
        } else if self.scanner.match_nocase("until") {
            let condition = self.parse_disjunction()?;
            if is_truthy(condition) {
                self.stack.pop_do()?;
            } else {
                self.pc = self.stack.peek_do()?;
            }
            Ok(())
        } else {
            Err(BasicError::Syntax("Condition expected".to_string()))
        }
    }

    fn stmt_for(&mut self) -> Result<()> {
        if !self.scanner.match_varname() {
            return Err(BasicError::Syntax("Variable expected".to_string()));
        }
        let name = self.scanner.token().to_lowercase();
        if !self.scanner.match_literal("=") {
            return Err(BasicError::Syntax("'=' expected".to_string()));
        }
        let start = self.parse_expression()?;
        self.variables.insert(name, start);
        if !self.scanner.match_nocase("to") {
            return Err(BasicError::Syntax("'to' expected".to_string()));
        }
        let limit = self.parse_expression()?;
        let step = if self.scanner.match_nocase("step") {
            let step = self.parse_expression()?;
            if step == 0.0 {
                return Err(BasicError::Value("Infinite loop".to_string()));
            }
            step
        } else {
            1.0
        };
        self.stack.push(Frame::For {
            return_to: self.pc,
            limit,
            step,
        });
        Ok(())
    }

    fn stmt_next(&mut self) -> Result<()> {
        if !self.scanner.match_varname() {
            return Err(BasicError::Syntax("Variable expected".to_string()));
        }
        let name = self.scanner.token().to_lowercase();
        let (return_to, limit, step) = self.stack.peek_for()?;
        let current = *self
            .variables
            .get(&name)
            .ok_or_else(|| BasicError::Name(format!("Var not found: {}", name)))?;
        let updated = current + step;
        self.variables.insert(name, updated);
        let done = if step > 0.0 {
            updated > limit
        } else {
            updated < limit
        };
        if done {
            self.stack.pop_for()?;
        } else {
            self.pc = return_to;
        }
        Ok(())
    }

    fn stmt_def(&mut self) -> Result<()> {
        if !self.scanner.match_nocase("fn") {
            return Err(BasicError::Syntax("Missing 'fn'".to_string()));
        }
        if !self.scanner.match_varname() {
            return Err(BasicError::Syntax("Name expected".to_string()));
        }
        let name = self.scanner.token().to_lowercase();
        if self.is_function_name(&name) {
            return Err(BasicError::Runtime(format!("Duplicate function: {}", name)));
        }
        if !self.scanner.match_literal("(") {
            return Err(BasicError::Syntax("Missing '('".to_string()));
        }
        let params = if self.scanner.match_literal(")") {
            Vec::new()
        } else {
            let params = self.parse_varlist()?;
            if !self.scanner.match_literal(")") {
                return Err(BasicError::Syntax("Missing ')'".to_string()));
            }
            params
        };
        if !self.scanner.match_literal("=") {
            return Err(BasicError::Syntax("Missing '='".to_string()));
        }
        let body = self.scanner.rest_of_line().to_string();
        self.scanner.consume_to_eol();
        self.user_functions.define(name, params, body);
        Ok(())
    }

    fn stmt_randomize(&mut self) -> Result<()> {
        if self.scanner.match_eol() {
            self.rng = StdRng::from_entropy();
        } else {
            let seed = self.parse_expression()? as i64 as u64;
            self.rng = StdRng::seed_from_u64(seed);
        }
        Ok(())
    }

    // ---- Expression evaluation ---------------------------------------------

    fn parse_disjunction(&mut self) -> Result<Number> {
        let mut lhs = self.parse_conjunction()?;
        while self.scanner.match_nocase("or") {
            let rhs = self.parse_conjunction()?;
            lhs = encode_bool(is_truthy(lhs) || is_truthy(rhs));
        }
        Ok(lhs)
    }

    fn parse_conjunction(&mut self) -> Result<Number> {
        let mut lhs = self.parse_negation()?;
        while self.scanner.match_nocase("and") {
            let rhs = self.parse_negation()?;
            lhs = encode_bool(is_truthy(lhs) && is_truthy(rhs));
        }
        Ok(lhs)
    }

    fn parse_negation(&mut self) -> Result<Number> {
        if self.scanner.match_nocase("not") {
            let value = self.parse_comparison()?;
            Ok(encode_bool(!is_truthy(value)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Number> {
        let lhs = self.parse_expression()?;
        match self.scanner.match_relation() {
            None => Ok(lhs),
            Some(rel) => {
                use crate::scanner::Relation;
                let rhs = self.parse_expression()?;
                let result = match rel {
                    Relation::Eq => lhs == rhs,
                    Relation::Ne => lhs != rhs,
                    Relation::Lt => lhs < rhs,
                    Relation::Le => lhs <= rhs,
                    Relation::Gt => lhs > rhs,
                    Relation::Ge => lhs >= rhs,
                };
                Ok(encode_bool(result))
            }
        }
    }

    fn parse_expression(&mut self) -> Result<Number> {
        let mut t1 = self.parse_term()?;
        loop {
            if self.scanner.match_literal("+") {
                t1 += self.parse_term()?;
            } else if self.scanner.match_literal("-") {
                t1 -= self.parse_term()?;
            } else {
                break;
            }
        }
        Ok(t1)
    }

    fn parse_term(&mut self) -> Result<Number> {
        let mut t1 = self.parse_power()?;
        loop {
            if self.scanner.match_literal("*") {
                t1 *= self.parse_power()?;
            } else if self.scanner.match_literal("/") {
                t1 /= self.parse_power()?;
            } else if self.scanner.match_literal("\\") {
                let t2 = self.parse_power()?;
                t1 = (t1 / t2).floor();
            } else {
                break;
            }
        }
        Ok(t1)
    }

    /// Right-associative: `2^3^2` is `2^(3^2)`, not `(2^3)^2`.
    fn parse_power(&mut self) -> Result<Number> {
        let t1 = self.parse_factor()?;
        if self.scanner.match_literal("^") {
            let t2 = self.parse_power()?;
            Ok(t1.powf(t2))
        } else {
            Ok(t1)
        }
    }

    fn parse_factor(&mut self) -> Result<Number> {
        let signum = if self.scanner.match_literal("-") {
            -1.0
        } else {
            1.0
        };
        if self.scanner.match_number() {
            let n: Number = self
                .scanner
                .token()
                .parse()
                .map_err(|_| BasicError::Syntax("Invalid number".to_string()))?;
            Ok(n * signum)
        } else if self.scanner.match_varname() {
            let name = self.scanner.token().to_lowercase();
            if self.is_function_name(&name) {
                let args = self.parse_args()?;
                Ok(self.call_function(&name, args)? * signum)
            } else if let Some(&value) = self.variables.get(&name) {
                Ok(value * signum)
            } else {
                Err(BasicError::Name(format!("Var not found: {}", name)))
            }
        } else if self.scanner.match_literal("(") {
            let value = self.parse_disjunction()?;
            if self.scanner.match_literal(")") {
                Ok(value * signum)
            } else {
                Err(BasicError::Syntax("Missing ')'".to_string()))
            }
        } else {
            Err(BasicError::Syntax("Expression expected".to_string()))
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Number>> {
        if !self.scanner.match_literal("(") {
            return Ok(Vec::new());
        }
        if self.scanner.match_literal(")") {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_disjunction()?];
        while self.scanner.match_literal(",") {
            args.push(self.parse_disjunction()?);
        }
        if self.scanner.match_literal(")") {
            Ok(args)
        } else {
            Err(BasicError::Syntax("Missing ')'".to_string()))
        }
    }

    fn parse_varlist(&mut self) -> Result<Vec<String>> {
        if !self.scanner.match_varname() {
            return Err(BasicError::Syntax("Var expected".to_string()));
        }
        let mut names = vec![self.scanner.token().to_lowercase()];
        while self.scanner.match_literal(",") {
            if !self.scanner.match_varname() {
                return Err(BasicError::Syntax("Var expected".to_string()));
            }
            names.push(self.scanner.token().to_lowercase());
        }
        Ok(names)
    }

    fn is_function_name(&self, name: &str) -> bool {
        self.builtins.contains(name) || self.user_functions.contains(name)
    }

    fn call_function(&mut self, name: &str, args: Vec<Number>) -> Result<Number> {
        if self.user_functions.contains(name) {
            let def = self.user_functions.get(name).unwrap().clone();
            if def.params.len() != args.len() {
                return Err(BasicError::Runtime("Bad argument count".to_string()));
            }
            self.call_user_function(&def, &args)
        } else {
            let arity = self
                .builtins
                .arity(name)
                .ok_or_else(|| BasicError::Name(format!("Unknown function: {}", name)))?;
            if arity != args.len() {
                return Err(BasicError::Runtime("Bad argument count".to_string()));
            }
            match name {
                "timer" => Ok(process_cpu_time_secs()),
                "rnd" => Ok(self.rng.gen::<f64>()),
                "pi" => Ok(std::f64::consts::PI),
                _ => self.builtins.call(name, &args),
            }
        }
    }

    /// Evaluates a user-defined function body against its own fresh
    /// variable scope, by swapping out the scanner and variable table for
    /// the duration of the call and restoring both afterward — whether or
    /// not evaluation succeeded.
    fn call_user_function(&mut self, def: &UserFunction, args: &[Number]) -> Result<Number> {
        let saved_scanner = std::mem::replace(&mut self.scanner, Scanner::new());
        let saved_variables = std::mem::take(&mut self.variables);

        self.scanner.set_line(def.body.clone());
        for (param, value) in def.params.iter().zip(args.iter()) {
            self.variables.insert(param.clone(), *value);
        }

        let result = self.parse_disjunction();

        self.scanner = saved_scanner;
        self.variables = saved_variables;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn new_interp() -> Interpreter<Cursor<Vec<u8>>, Vec<u8>> {
        Interpreter::new(Cursor::new(Vec::new()), Vec::new())
    }

    fn run_program(lines: &[(i64, &str)]) -> Interpreter<Cursor<Vec<u8>>, Vec<u8>> {
        let mut interp = new_interp();
        for (n, body) in lines {
            interp.program.set_line(*n, *body);
        }
        interp.run().expect("program should run cleanly");
        interp
    }

    fn output_of(interp: &Interpreter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(interp.output.clone()).unwrap()
    }

    #[test]
    fn let_and_print_roundtrip() {
        let interp = run_program(&[(10, "LET X = 2 + 3 * 4"), (20, "PRINT X")]);
        assert_eq!(output_of(&interp), "14\n");
    }

    #[test]
    fn comparison_prints_basic_boolean_encoding() {
        let interp = run_program(&[(10, "PRINT 1 = 1"), (20, "PRINT 1 = 2")]);
        assert_eq!(output_of(&interp), "-1\n0\n");
    }

    #[test]
    fn operator_precedence_and_right_assoc_power() {
        let interp = run_program(&[(10, "PRINT 2 + 3 * 2 ^ 2"), (20, "PRINT 2 ^ 3 ^ 2")]);
        // 2 + 3*4 = 14 ; 2^(3^2) = 2^9 = 512, not (2^3)^2 = 64
        assert_eq!(output_of(&interp), "14\n512\n");
    }

    #[test]
    fn unary_minus_binds_tighter_than_power() {
        let interp = run_program(&[(10, "PRINT -2 ^ 2")]);
        // (-2)^2 = 4, matching parse_factor applying the sign before the call site
        assert_eq!(output_of(&interp), "4\n");
    }

    #[test]
    fn if_then_runs_single_statement_on_true_branch_only() {
        let interp = run_program(&[
            (10, "LET X = 1"),
            (20, "IF X = 1 THEN PRINT 100"),
            (30, "IF X = 2 THEN PRINT 200"),
        ]);
        assert_eq!(output_of(&interp), "100\n");
    }

    #[test]
    fn for_next_counts_up_by_step() {
        let interp = run_program(&[
            (10, "FOR I = 1 TO 3"),
            (20, "PRINT I"),
            (30, "NEXT I"),
        ]);
        assert_eq!(output_of(&interp), "1\n2\n3\n");
    }

    #[test]
    fn for_next_with_negative_step_counts_down() {
        let interp = run_program(&[
            (10, "FOR I = 3 TO 1 STEP -1"),
            (20, "PRINT I"),
            (30, "NEXT I"),
        ]);
        assert_eq!(output_of(&interp), "3\n2\n1\n");
    }

    #[test]
    fn zero_step_for_is_rejected() {
        let mut interp = new_interp();
        interp.program.set_line(10, "FOR I = 1 TO 3 STEP 0");
        let err = interp.run().unwrap_err();
        assert!(matches!(err.error, BasicError::Value(_)));
    }

    #[test]
    fn gosub_return_round_trip() {
        let interp = run_program(&[
            (10, "GOSUB 100"),
            (20, "PRINT 2"),
            (30, "END"),
            (100, "PRINT 1"),
            (110, "RETURN"),
        ]);
        assert_eq!(output_of(&interp), "1\n2\n");
    }

    #[test]
    fn nested_gosub_unwinds_in_call_order() {
        let interp = run_program(&[
            (10, "PRINT \"main\""),
            (20, "GOSUB 100"),
            (25, "PRINT \"back\""),
            (30, "END"),
            (100, "PRINT \"s1\""),
            (110, "GOSUB 200"),
            (120, "RETURN"),
            (200, "PRINT \"s2\""),
            (210, "RETURN"),
        ]);
        assert_eq!(output_of(&interp), "main\ns1\ns2\nback\n");
    }

    #[test]
    fn do_loop_until_runs_body_at_least_once() {
        let interp = run_program(&[
            (10, "LET X = 0"),
            (20, "DO"),
            (30, "LET X = X + 1"),
            (40, "PRINT X"),
            (50, "LOOP UNTIL X = 3"),
        ]);
        assert_eq!(output_of(&interp), "1\n2\n3\n");
    }

    #[test]
    fn def_fn_evaluates_with_its_own_scope() {
        let interp = run_program(&[
            (10, "DEF FN sq(x) = x * x"),
            (20, "LET X = 100"),
            (30, "PRINT sq(4)"),
            (40, "PRINT X"),
        ]);
        // the function body's `x` is its own parameter, not the outer `X`
        assert_eq!(output_of(&interp), "16\n100\n");
    }

    #[test]
    fn run_clears_user_functions_but_not_builtins() {
        let mut interp = new_interp();
        interp.program.set_line(10, "DEF FN sq(x) = x * x");
        interp.run().unwrap();
        assert!(interp.user_functions.contains("sq"));
        interp.program.clear();
        interp.program.set_line(10, "PRINT abs(-3)");
        interp.run().unwrap();
        assert!(!interp.user_functions.contains("sq"));
        assert_eq!(output_of(&interp), "3\n");
    }

    #[test]
    fn undefined_variable_reports_with_line_and_column() {
        let mut interp = new_interp();
        interp.program.set_line(10, "PRINT nope");
        let err = interp.run().unwrap_err();
        assert_eq!(err.line, Some(10));
        assert!(matches!(err.error, BasicError::Name(_)));
    }

    #[test]
    fn return_without_gosub_is_runtime_error() {
        let mut interp = new_interp();
        interp.program.set_line(10, "RETURN");
        let err = interp.run().unwrap_err();
        assert!(matches!(err.error, BasicError::Runtime(_)));
    }

    #[test]
    fn goto_to_missing_line_is_value_error() {
        let mut interp = new_interp();
        interp.program.set_line(10, "GOTO 999");
        let err = interp.run().unwrap_err();
        assert!(matches!(err.error, BasicError::Value(_)));
    }

    #[test]
    fn stop_suspends_and_continue_resumes() {
        let mut interp = new_interp();
        interp.program.set_line(10, "PRINT 1");
        interp.program.set_line(20, "STOP");
        interp.program.set_line(30, "PRINT 2");
        interp.run().unwrap();
        assert!(interp.stopped());
        assert_eq!(output_of(&interp), "1\n");
        interp.cont().unwrap();
        assert_eq!(output_of(&interp), "1\n2\n");
    }

    #[test]
    fn input_missing_fields_zero_fill() {
        let input = Cursor::new(b"7\n".to_vec());
        let mut interp = Interpreter::new(input, Vec::new());
        interp.program.set_line(10, "INPUT A, B");
        interp.program.set_line(20, "PRINT A");
        interp.program.set_line(30, "PRINT B");
        interp.run().unwrap();
        assert_eq!(output_of(&interp), "7\n0\n");
    }

    #[test]
    fn integer_division_floors_toward_negative_infinity() {
        let interp = run_program(&[(10, "PRINT -7 \\ 2")]);
        assert_eq!(output_of(&interp), "-4\n");
    }

    #[test]
    fn direct_mode_line_without_number_executes_immediately() {
        let mut interp = new_interp();
        interp.execute_line("PRINT 1 + 1").unwrap();
        assert_eq!(output_of(&interp), "2\n");
    }

    #[test]
    fn direct_mode_line_with_number_stores_into_program() {
        let mut interp = new_interp();
        interp.execute_line("10 PRINT 5").unwrap();
        assert_eq!(interp.program().get(10), Some("PRINT 5"));
    }

    #[test]
    fn save_new_load_round_trip_reproduces_listing() {
        let mut interp = new_interp();
        interp.program.set_line(10, "LET A = 1");
        interp.program.set_line(20, "PRINT A");
        let path = std::env::temp_dir().join("tinycat_basic_roundtrip_test.bas");
        interp.save_program(path.to_str().unwrap()).unwrap();

        let before: Vec<(i64, String)> = interp
            .program
            .list()
            .map(|(n, b)| (n, b.to_string()))
            .collect();

        interp.program.clear();
        interp.load_program(path.to_str().unwrap()).unwrap();

        let after: Vec<(i64, String)> = interp
            .program
            .list()
            .map(|(n, b)| (n, b.to_string()))
            .collect();
        assert_eq!(before, after);
        let _ = std::fs::remove_file(path);
    }
}
