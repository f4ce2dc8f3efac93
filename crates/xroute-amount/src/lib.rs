//! Human amount ↔ base-unit conversion.
//!
//! Amounts typed by users are decimal strings, possibly with thousands
//! separators ("1,234.5"). The routing API wants integer base units
//! ("1234500000" for 6 decimals). All arithmetic is arbitrary precision.

use num_bigint::BigUint;

/// Decimal places assumed when the asset does not report any.
pub const DEFAULT_DECIMALS: u32 = 6;

/// Largest accepted scientific-notation exponent (in either direction).
const MAX_EXPONENT: u64 = 1_000;

/// Largest accepted asset decimal exponent.
const MAX_DECIMALS: u32 = 255;

/// Remove thousands separators.
pub fn strip_commas(input: &str) -> String {
    input.replace(',', "")
}

/// Group the integer part of a decimal string by thousands.
///
/// "1234567.891" → "1,234,567.891". The fractional part is left alone.
pub fn format_with_commas(input: &str) -> String {
    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (input, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Parsed non-negative decimal: `mantissa * 10^exponent`.
struct Decimal {
    mantissa: BigUint,
    exponent: i64,
}

fn parse_decimal(input: &str) -> Option<Decimal> {
    let cleaned = strip_commas(input);
    let s = cleaned.trim();
    let s = s.strip_prefix('+').unwrap_or(s);

    let (number, exp) = match s.find(['e', 'E']) {
        Some(pos) => {
            let exp: i64 = s[pos + 1..].parse().ok()?;
            if exp.unsigned_abs() > MAX_EXPONENT {
                return None;
            }
            (&s[..pos], exp)
        }
        None => (s, 0),
    };

    let (int_digits, frac_digits) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_digits) || !all_digits(frac_digits) {
        return None;
    }
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let digits = format!("{}{}", int_digits, frac_digits);
    let mantissa = BigUint::parse_bytes(digits.as_bytes(), 10)?;

    Some(Decimal {
        mantissa,
        exponent: exp - frac_digits.len() as i64,
    })
}

/// Convert a human decimal amount to base units.
///
/// Returns `None` for empty, negative, or malformed input. The scaled value
/// is truncated toward zero.
pub fn parse_base_units(input: Option<&str>, decimals: Option<u32>) -> Option<String> {
    let input = input?;
    if input.trim().is_empty() {
        return None;
    }
    let decimals = decimals.unwrap_or(DEFAULT_DECIMALS);
    if decimals > MAX_DECIMALS {
        return None;
    }

    let value = parse_decimal(input)?;
    let shift = value.exponent + i64::from(decimals);
    let ten = BigUint::from(10u32);

    let scaled = if shift >= 0 {
        value.mantissa * ten.pow(shift as u32)
    } else {
        value.mantissa / ten.pow((-shift) as u32)
    };

    Some(scaled.to_string())
}

/// Convert a human decimal amount to base units, yielding "0" on any
/// invalid input.
pub fn to_base_units(input: Option<&str>, decimals: Option<u32>) -> String {
    parse_base_units(input, decimals).unwrap_or_else(|| "0".to_string())
}

/// Render a base-unit integer string as a human decimal.
///
/// "1234500000" with 6 decimals → "1234.5". Returns `None` if `base` is not
/// a plain digit string or `decimals` is out of range.
pub fn from_base_units(base: &str, decimals: Option<u32>) -> Option<String> {
    let base = base.trim();
    if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let decimals = decimals.unwrap_or(DEFAULT_DECIMALS);
    if decimals > MAX_DECIMALS {
        return None;
    }
    let decimals = decimals as usize;

    let digits = base.trim_start_matches('0');
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        Some(int_part.to_string())
    } else {
        Some(format!("{}.{}", int_part, frac_part))
    }
}
