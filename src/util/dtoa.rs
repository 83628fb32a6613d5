//! Number to ASCII conversion
//!
//! Formats numbers the way the source language prints them: integral values
//! without a fraction, `NaN`, `Infinity`, and exponent notation outside the
//! `[1e-7, 1e21)` range.

/// Largest magnitude printed without exponent notation
const MAX_PLAIN: f64 = 1e21;

/// Smallest magnitude printed without exponent notation
const MIN_PLAIN: f64 = 1e-7;

/// Convert a 64-bit signed integer to decimal string
///
/// Returns the number of characters written.
pub fn i64_to_str(buf: &mut [u8], val: i64) -> usize {
    if buf.is_empty() {
        return 0;
    }

    let mut i = 0;
    if val < 0 {
        buf[i] = b'-';
        i += 1;
    }
    let mut mag = val.unsigned_abs();

    let start = i;
    loop {
        if i >= buf.len() {
            break;
        }
        buf[i] = b'0' + (mag % 10) as u8;
        i += 1;
        mag /= 10;
        if mag == 0 {
            break;
        }
    }

    // Reverse the digits
    let end = i;
    let mut left = start;
    let mut right = end.saturating_sub(1);
    while left < right {
        buf.swap(left, right);
        left += 1;
        right -= 1;
    }

    end
}

/// Format a number as a display string
pub fn number_to_string(val: f64) -> String {
    if val.is_nan() {
        return "NaN".to_string();
    }
    if val.is_infinite() {
        return if val > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if val == 0.0 {
        // -0 prints as 0
        return "0".to_string();
    }

    let mag = val.abs();
    if val.fract() == 0.0 && mag < 9.007_199_254_740_992e15 {
        let mut buf = [0u8; 24];
        let n = i64_to_str(&mut buf, val as i64);
        return String::from_utf8_lossy(&buf[..n]).into_owned();
    }

    if (MIN_PLAIN..MAX_PLAIN).contains(&mag) {
        // Shortest round-trip representation
        return format!("{}", val);
    }

    let s = format!("{:e}", val);
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i64_to_str() {
        let mut buf = [0u8; 32];

        let n = i64_to_str(&mut buf, 0);
        assert_eq!(&buf[..n], b"0");

        let n = i64_to_str(&mut buf, 42);
        assert_eq!(&buf[..n], b"42");

        let n = i64_to_str(&mut buf, -123);
        assert_eq!(&buf[..n], b"-123");

        let n = i64_to_str(&mut buf, i64::MIN);
        assert_eq!(&buf[..n], b"-9223372036854775808");
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(-2.5), "-2.5");
        assert_eq!(number_to_string(4294967296.0), "4294967296");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e-8), "1e-8");
    }
}
