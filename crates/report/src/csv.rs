//! Comma-separated rows of a sampled trajectory.
//!
//! The header is `t` followed by the state labels. Each row is the sample
//! time followed by every state component. Numbers use scientific notation
//! with six fractional digits and a signed exponent of at least two digits
//! (`-1.234500e+03`), matching C's `%.6e`. Formatting is a pure function of
//! the value, so the same sample always yields the same bytes.

use std::fmt::Write;

/// Writes `value` as C's `%.6e` would.
///
/// Non-finite values are written as `nan`, `inf`, or `-inf`.
pub fn push_value(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        return;
    }

    let start = out.len();
    // Writing into a String cannot fail.
    let _ = write!(out, "{value:.6e}");

    // Rust writes the exponent bare (`e3`, `e-7`); pad it to `e+03`, `e-07`.
    let Some(e) = out[start..].rfind('e').map(|i| start + i) else {
        return;
    };
    let exponent = out.split_off(e + 1);
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent.as_str()),
    };
    out.push(sign);
    if digits.len() < 2 {
        out.push('0');
    }
    out.push_str(digits);
}

/// Formats a single value as C's `%.6e` would.
#[must_use]
pub fn format_value(value: f64) -> String {
    let mut out = String::with_capacity(16);
    push_value(&mut out, value);
    out
}

/// The header line: `t` then each label, comma-separated, without a newline.
#[must_use]
pub fn header<S: AsRef<str>>(labels: &[S]) -> String {
    let mut out = String::from("t");
    for label in labels {
        out.push(',');
        out.push_str(label.as_ref());
    }
    out
}

/// Writes one row, without a newline, into `out` after clearing it.
pub fn write_row(out: &mut String, t: f64, x: &[f64]) {
    out.clear();
    push_value(out, t);
    for &value in x {
        out.push(',');
        push_value(out, value);
    }
}

/// Formats one row: the time then each component, comma-separated.
#[must_use]
pub fn row(t: f64, x: &[f64]) -> String {
    let mut out = String::with_capacity(14 * (x.len() + 1));
    write_row(&mut out, t, x);
    out
}
