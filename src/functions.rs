//! Built-in and User-Defined Functions
//!
//! Tinycat BASIC keeps two separate function tables rather than the single
//! shared namespace the reference implementation uses. There, `DEF FN`
//! writes into the very same dict that holds the stock math functions,
//! which means a stray `RUN` that clears user definitions has to be
//! careful not to also wipe `sin`/`abs`/etc, and a program is one `DEF FN
//! sin(x) = x` away from shadowing a builtin for the rest of the session.
//! Splitting them means `RUN` can unconditionally clear [`UserFunctions`]
//! and builtins are simply never in that map to begin with.
//!
//! `timer` and `rnd` are the two builtins that need interpreter-owned
//! state (the process clock and a seedable generator) rather than being
//! pure functions of their arguments, so they are dispatched specially by
//! the interpreter instead of living in [`Builtins`]'s function table —
//! the same carve-out the reference implementation makes for them by
//! calling `time.process_time()`/`random.random()` directly rather than
//! through `call_fn`.

use crate::error::{BasicError, Result};
use crate::value::{encode_bool, is_truthy, Number};
use std::collections::HashMap;

type BuiltinFn = fn(&[Number]) -> Result<Number>;

/// Registry of stock math functions available to every program, keyed by
/// lowercase name. Argument count is validated against the arity embedded
/// in each function's own array length check, so there is no separate
/// arity table to keep in sync.
pub struct Builtins {
    functions: HashMap<&'static str, BuiltinFn>,
}

impl Builtins {
    pub fn new() -> Self {
        let mut functions: HashMap<&'static str, BuiltinFn> = HashMap::new();
        functions.insert("int", |a| Ok(a[0].trunc()));
        functions.insert("abs", |a| Ok(a[0].abs()));
        functions.insert("sqr", |a| Ok(a[0].sqrt()));
        functions.insert("sin", |a| Ok(a[0].sin()));
        functions.insert("cos", |a| Ok(a[0].cos()));
        functions.insert("rad", |a| Ok(a[0].to_radians()));
        functions.insert("deg", |a| Ok(a[0].to_degrees()));
        functions.insert("min", |a| Ok(a[0].min(a[1])));
        functions.insert("max", |a| Ok(a[0].max(a[1])));
        // Rust's `%` takes the sign of the dividend (fmod semantics); this
        // builtin needs the sign of the divisor, matching Python's `%`.
        functions.insert("mod", |a| Ok(a[0] - a[1] * (a[0] / a[1]).floor()));
        functions.insert("hypot2", |a| Ok(a[0].hypot(a[1])));
        functions.insert("hypot3", |a| Ok((a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()));
        functions.insert("iif", |a| {
            Ok(if is_truthy(a[0]) { a[1] } else { a[2] })
        });
        Self { functions }
    }

    /// `true` if `name` names a builtin (including `timer`/`rnd`/`pi`, which
    /// are dispatched outside the table above but still occupy the name).
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name) || matches!(name, "timer" | "rnd" | "pi")
    }

    /// Number of arguments `name` expects, for the "Bad argument count"
    /// check that happens before a call is dispatched.
    pub fn arity(&self, name: &str) -> Option<usize> {
        match name {
            "timer" | "rnd" | "pi" => Some(0),
            "int" | "abs" | "sqr" | "sin" | "cos" | "rad" | "deg" => Some(1),
            "min" | "max" | "mod" | "hypot2" => Some(2),
            "hypot3" | "iif" => Some(3),
            _ => None,
        }
    }

    /// Calls a non-stateful builtin. `timer`, `rnd`, and `pi` are handled by
    /// the interpreter directly and must never reach this method.
    pub fn call(&self, name: &str, args: &[Number]) -> Result<Number> {
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| BasicError::Runtime(format!("Unknown function: {}", name)))?;
        f(args)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

/// A user-defined function installed by `DEF FN`: its parameter names, in
/// declaration order, and the unparsed expression text that computes its
/// result when scanned as a fresh line.
#[derive(Debug, Clone)]
pub struct UserFunction {
    pub params: Vec<String>,
    pub body: String,
}

/// The set of functions installed by `DEF FN` so far this session. Cleared
/// wholesale by `RUN`, `CLEAR`, and `NEW`, same as the variable table, since
/// a fresh run should not see definitions left over from a previous one.
#[derive(Debug, Default)]
pub struct UserFunctions {
    defs: HashMap<String, UserFunction>,
}

impl UserFunctions {
    pub fn new() -> Self {
        Self {
            defs: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&UserFunction> {
        self.defs.get(name)
    }

    pub fn define(&mut self, name: impl Into<String>, params: Vec<String>, body: impl Into<String>) {
        self.defs.insert(
            name.into(),
            UserFunction {
                params,
                body: body.into(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.defs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matches_reference_table() {
        let b = Builtins::new();
        assert_eq!(b.arity("pi"), Some(0));
        assert_eq!(b.arity("abs"), Some(1));
        assert_eq!(b.arity("min"), Some(2));
        assert_eq!(b.arity("hypot3"), Some(3));
        assert_eq!(b.arity("nonexistent"), None);
    }

    #[test]
    fn int_truncates_toward_zero() {
        let b = Builtins::new();
        assert_eq!(b.call("int", &[3.9]).unwrap(), 3.0);
        assert_eq!(b.call("int", &[-3.9]).unwrap(), -3.0);
    }

    #[test]
    fn mod_takes_the_sign_of_the_divisor_not_the_dividend() {
        let b = Builtins::new();
        assert_eq!(b.call("mod", &[7.0, 3.0]).unwrap(), 1.0);
        // Rust's `%` would give -1 here (sign of the dividend); Python's
        // `%`, which this builtin matches, gives 2 (sign of the divisor).
        assert_eq!(b.call("mod", &[-7.0, 3.0]).unwrap(), 2.0);
    }

    #[test]
    fn iif_picks_branch_by_truthiness_not_value() {
        let b = Builtins::new();
        // iif's "then" branch can itself be zero/false without the whole
        // call falling through to "else" -- a Python a-and-b-or-c
        // implementation of the same builtin would get this wrong.
        assert_eq!(b.call("iif", &[encode_bool(true), 0.0, 9.0]).unwrap(), 0.0);
        assert_eq!(b.call("iif", &[0.0, 1.0, 9.0]).unwrap(), 9.0);
    }

    #[test]
    fn hypot3_matches_pythagorean_sum() {
        let b = Builtins::new();
        assert_eq!(b.call("hypot3", &[3.0, 4.0, 0.0]).unwrap(), 5.0);
    }

    #[test]
    fn user_functions_are_a_separate_table_from_builtins() {
        let mut funcs = UserFunctions::new();
        funcs.define("sq", vec!["x".to_string()], "x * x");
        assert!(funcs.contains("sq"));
        let b = Builtins::new();
        assert!(!b.contains("sq"));
        funcs.clear();
        assert!(!funcs.contains("sq"));
        // clearing user functions never touches the builtin table
        assert!(b.contains("abs"));
    }
}
