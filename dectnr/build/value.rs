//! Parsing of `DECTNR_*` configuration values, shared by `build.rs`.

/// Digits only, decimal or `0x` hex, `_` separators allowed.
pub fn parse(value: &str) -> Option<u64> {
    let (digits, radix) = match value.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (value, 10),
    };

    let mut parsed: u64 = 0;
    let mut seen_digit = false;
    for c in digits.chars().filter(|&c| c != '_') {
        let digit = c.to_digit(radix)?;
        parsed = parsed.checked_mul(radix as u64)?.checked_add(digit as u64)?;
        seen_digit = true;
    }
    seen_digit.then_some(parsed)
}

/// Largest value of `ty` on a target with the given pointer width.
pub fn max_of(ty: &str, pointer_width: Option<&str>) -> Option<u64> {
    match ty {
        "u32" => Some(u32::MAX as u64),
        "usize" => match pointer_width {
            Some("16") => Some(u16::MAX as u64),
            Some("32") => Some(u32::MAX as u64),
            _ => Some(u64::MAX),
        },
        _ => None,
    }
}
