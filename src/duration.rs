//! Duration strings such as `10s`, `2m`, `1h30m` or `1.5s`.
//!
//! Grammar: an optional sign followed by one or more `<number><unit>` terms,
//! where a number may carry a decimal fraction and the unit is one of `ns`,
//! `us` (also `µs`/`μs`), `ms`, `s`, `m`, `h`. The bare string `0` is also
//! accepted. A negative total cannot be represented by [`Duration`] and is
//! rejected, as is anything that overflows `u64` nanoseconds.

use std::time::Duration;

const NANOS_PER: [(&str, u128); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

/// Parses a duration string, returning `None` when it is malformed.
pub(crate) fn parse(s: &str) -> Option<Duration> {
    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (frac, after_frac) = match after_whole.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", after_whole),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }

        let unit_len = after_frac
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_frac.len());
        let unit = unit_nanos(&after_frac[..unit_len])?;
        rest = &after_frac[unit_len..];

        total = total.checked_add(term_nanos(whole, frac, unit)?)?;
    }

    if negative && total != 0 {
        return None;
    }
    u64::try_from(total).ok().map(Duration::from_nanos)
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    NANOS_PER
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, nanos)| *nanos)
}

/// `whole.frac` × `unit`, truncating sub-nanosecond remainders.
fn term_nanos(whole: &str, frac: &str, unit: u128) -> Option<u128> {
    let mut nanos = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().ok()?.checked_mul(unit)?
    };

    let mut scale = unit;
    for digit in frac.bytes() {
        scale /= 10;
        if scale == 0 {
            break;
        }
        nanos = nanos.checked_add(u128::from(digit - b'0') * scale)?;
    }
    Some(nanos)
}
