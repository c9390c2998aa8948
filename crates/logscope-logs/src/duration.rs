use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:([0-9]+)(?:\.([0-9]*))?|\.([0-9]+))(ns|us|µs|μs|ms|s|m|h)")
        .expect("valid duration regex")
});

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are below a nanosecond for every unit
const MAX_FRACTION_DIGITS: usize = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration '{0}'")]
    Negative(String),

    #[error("invalid duration '{0}' (expected e.g. 30s, 5m, 1h30m)")]
    Invalid(String),

    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse a relative duration such as `5s`, `2m`, `3h` or `1h30m`.
///
/// Units are `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`; fractions are allowed
/// (`1.5h`). A bare `0` is accepted and yields a zero duration.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s.starts_with('-') {
        return Err(DurationError::Negative(s.to_string()));
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut nanos: u128 = 0;
    let mut pos = 0;
    for caps in COMPONENT.captures_iter(s) {
        let whole = caps.get(0).expect("group 0 always matches");
        if whole.start() != pos {
            return Err(DurationError::Invalid(input.to_string()));
        }
        pos = whole.end();

        let integer = caps.get(1).map_or("", |m| m.as_str());
        let fraction = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        let component = component_nanos(integer, fraction, unit_nanos(&caps[4]))
            .ok_or_else(|| DurationError::OutOfRange(input.to_string()))?;
        nanos = nanos
            .checked_add(component)
            .ok_or_else(|| DurationError::OutOfRange(input.to_string()))?;
    }

    if pos == 0 || pos != s.len() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let secs = u64::try_from(nanos / NANOS_PER_SEC)
        .map_err(|_| DurationError::OutOfRange(input.to_string()))?;
    Ok(Duration::new(secs, (nanos % NANOS_PER_SEC) as u32))
}

/// `integer.fraction` units in nanoseconds, rounded down; None on overflow
fn component_nanos(integer: &str, fraction: &str, unit: u128) -> Option<u128> {
    let whole = if integer.is_empty() {
        0
    } else {
        integer.parse::<u128>().ok()?.checked_mul(unit)?
    };

    let mut numerator: u128 = 0;
    let mut scale: u128 = 1;
    for digit in fraction.bytes().take(MAX_FRACTION_DIGITS) {
        numerator = numerator * 10 + u128::from(digit - b'0');
        scale *= 10;
    }

    whole.checked_add(numerator * unit / scale)
}

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        _ => 3600 * NANOS_PER_SEC,
    }
}
