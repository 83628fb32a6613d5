//! Utility functions
//!
//! Various helper functions used throughout the engine.

pub mod dtoa;

use crate::runtime::MAX_ARRAY_LENGTH;

/// Parse a canonical array index property name ("0", "17", never "01" or "-1")
pub fn parse_array_index(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    name.parse::<u32>().ok().filter(|&idx| idx < MAX_ARRAY_LENGTH)
}

/// Convert a number to an integer the way index arguments are truncated
#[inline]
pub fn to_integer(val: f64) -> f64 {
    if val.is_nan() { 0.0 } else { val.trunc() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_index() {
        assert_eq!(parse_array_index("0"), Some(0));
        assert_eq!(parse_array_index("42"), Some(42));
        assert_eq!(parse_array_index("01"), None);
        assert_eq!(parse_array_index("-1"), None);
        assert_eq!(parse_array_index("1.5"), None);
        assert_eq!(parse_array_index("length"), None);
        assert_eq!(parse_array_index(""), None);
        assert_eq!(parse_array_index("99999999999"), None);
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(f64::NAN), 0.0);
        assert_eq!(to_integer(-1.7), -1.0);
        assert_eq!(to_integer(2.9), 2.0);
    }
}
