//! Numeric formatting shared by filenames and command arguments.
//!
//! Upstream tools write p-value and shrinkage thresholds into filenames
//! using C-style `%.{n}e` notation: explicit exponent sign, at least two
//! exponent digits (`1e-03`, `3.1076e-11`). Rust's `{:e}` drops both, so
//! every threshold that ends up in a path or argument goes through here.

/// Format `value` in scientific notation with `digits` after the point.
pub fn sci(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let raw = format!("{:.*e}", digits, value);
    let (mantissa, exponent) = match raw.split_once('e') {
        Some(parts) => parts,
        None => return raw,
    };
    let (sign, magnitude) = match exponent.strip_prefix('-') {
        Some(m) => ('-', m),
        None => ('+', exponent),
    };
    format!("{}e{}{:0>2}", mantissa, sign, magnitude)
}

/// P-value thresholds passed to the fine-mapping stage.
pub fn pvalue(value: f64) -> String {
    sci(value, 4)
}

/// Clumping thresholds and PRS-CS shrinkage as they appear in filenames.
pub fn threshold(value: f64) -> String {
    sci(value, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_digit_pvalue() {
        assert_eq!(pvalue(3.1076e-11), "3.1076e-11");
        assert_eq!(pvalue(5e-8), "5.0000e-08");
    }

    #[test]
    fn test_zero_digit_thresholds() {
        assert_eq!(threshold(1e-3), "1e-03");
        assert_eq!(threshold(0.01), "1e-02");
        assert_eq!(threshold(1.0), "1e+00");
    }

    #[test]
    fn test_large_exponent() {
        assert_eq!(sci(1.5e120, 1), "1.5e+120");
        assert_eq!(sci(2.0e-300, 0), "2e-300");
    }

    #[test]
    fn test_negative_value() {
        assert_eq!(sci(-0.00025, 1), "-2.5e-04");
    }
}
