//! Value Representation for Tinycat BASIC
//!
//! Every user-visible value is a double-precision float; there are no
//! string variables and no typed variables. Boolean results from
//! comparisons and logical operators are numbers: `-1` for true, `0` for
//! false, with any non-zero number counting as truthy on input. This
//! encoding is observable by user programs (`PRINT 1=1` prints `-1`) and is
//! therefore part of the external contract, not an implementation detail to
//! be hidden behind a native `bool`.

/// All BASIC values are `f64`; there is no separate integer representation
/// except where line numbers are truncated at a boundary (GOTO argument,
/// FOR loop comparisons).
pub type Number = f64;

/// The boolean "true" encoding used by comparisons and logical operators.
pub const TRUE: Number = -1.0;
/// The boolean "false" encoding used by comparisons and logical operators.
pub const FALSE: Number = 0.0;

/// Coerces a number to a boolean following BASIC's "non-zero is true" rule.
pub fn is_truthy(n: Number) -> bool {
    n != 0.0
}

/// Encodes a Rust `bool` as a BASIC boolean number.
pub fn encode_bool(b: bool) -> Number {
    if b {
        TRUE
    } else {
        FALSE
    }
}

/// Formats a number the way `PRINT` does: Python's `"{:1g}".format(x)`,
/// general format at 6 significant digits. Fixed-point is used when the
/// post-rounding decimal exponent falls in `-4..6`; outside that range
/// `PRINT` switches to scientific notation (`1000000` prints `1e+06`,
/// `0.00001` prints `1e-05`). Either way, trailing zeros (and a bare
/// trailing decimal point) are stripped. `f64`'s own `Display` gives the
/// shortest round-tripping decimal instead, which is a different format —
/// it never rounds to 6 digits and never switches to scientific notation
/// at these thresholds, so `1/3` would print `0.3333333333333333` instead
/// of `0.333333` — hence the hand-rolled formatter below.
pub fn format_number(n: Number) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    const PRECISION: i32 = 6;

    // Round to PRECISION significant digits via scientific notation first;
    // the exponent of *that* rounded value decides fixed vs. scientific.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exp_str) = sci.split_once('e').expect("LowerExp always emits 'e'");
    let exp: i32 = exp_str.parse().expect("LowerExp exponent is always an integer");

    if exp < -4 || exp >= PRECISION {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        let fixed = format!("{:.*}", decimals, n);
        strip_trailing_zeros(&fixed)
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
