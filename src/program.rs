//! Program Store for Tinycat BASIC
//!
//! The program store is a mapping from positive line numbers to the
//! textual body of that line (everything after the leading line number,
//! leading whitespace trimmed). It is kept as a `BTreeMap` rather than a
//! `HashMap` precisely because the language depends on ascending numeric
//! order in two places: `LIST`, and the address vector `RUN` builds before
//! starting the execution loop — a `BTreeMap`'s iteration order already
//! gives us that for free instead of re-sorting a key list by hand.

use std::collections::BTreeMap;

/// The stored program: line number -> line body (without the leading number).
#[derive(Debug, Default)]
pub struct ProgramStore {
    lines: BTreeMap<i64, String>,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }

    /// Stores `body` under `line_number`, replacing any prior body.
    pub fn set_line(&mut self, line_number: i64, body: impl Into<String>) {
        self.lines.insert(line_number, body.into());
    }

    /// Looks up a stored line's body.
    pub fn get(&self, line_number: i64) -> Option<&str> {
        self.lines.get(&line_number).map(|s| s.as_str())
    }

    /// The sorted vector of line numbers, snapshotted at `RUN` time so edits
    /// made mid-run don't retroactively change the address space being
    /// executed.
    pub fn address_vector(&self) -> Vec<i64> {
        self.lines.keys().copied().collect()
    }

    /// Enumerates `(line_number, body)` pairs in ascending order, for `LIST`.
    pub fn list(&self) -> impl Iterator<Item = (i64, &str)> {
        self.lines.iter().map(|(n, b)| (*n, b.as_str()))
    }

    /// Removes a single line number. Returns `false` if it wasn't present —
    /// callers that need the original's strict "KeyError on missing line"
    /// behavior for `DELETE n` (the single-argument form) should check this.
    pub fn delete_one(&mut self, line_number: i64) -> bool {
        self.lines.remove(&line_number).is_some()
    }

    /// Removes every line number `n` with `low <= n <= high`, for the
    /// `DELETE n, m` range form.
    pub fn delete_range(&mut self, low: i64, high: i64) {
        self.lines.retain(|n, _| !(low <= *n && *n <= high));
    }

    /// Empties the store (`NEW`).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_ascending_even_when_inserted_out_of_order() {
        let mut p = ProgramStore::new();
        p.set_line(30, "END");
        p.set_line(10, "PRINT 1");
        p.set_line(20, "PRINT 2");
        let listed: Vec<i64> = p.list().map(|(n, _)| n).collect();
        assert_eq!(listed, vec![10, 20, 30]);
    }

    #[test]
    fn replacing_a_line_number_overwrites_body() {
        let mut p = ProgramStore::new();
        p.set_line(10, "PRINT 1");
        p.set_line(10, "PRINT 2");
        assert_eq!(p.get(10), Some("PRINT 2"));
    }

    #[test]
    fn delete_single_and_range() {
        let mut p = ProgramStore::new();
        for n in [10, 20, 30, 40] {
            p.set_line(n, "REM");
        }
        assert!(p.delete_one(10));
        assert!(!p.delete_one(10));
        p.delete_range(20, 30);
        let remaining: Vec<i64> = p.list().map(|(n, _)| n).collect();
        assert_eq!(remaining, vec![40]);
    }

    #[test]
    fn address_vector_matches_list_order() {
        let mut p = ProgramStore::new();
        p.set_line(200, "RETURN");
        p.set_line(100, "GOSUB 200");
        assert_eq!(p.address_vector(), vec![100, 200]);
    }
}
