//! Plain PDF syntax encoder.
//!
//! Every PDF value type gets an [`Encoder`](crate::writer::Encoder)
//! implementation on [`SimpleEncoder`]. No compression, no object streams,
//! no decisions about document structure: only syntax.

pub(crate) mod name;
pub(crate) mod object;
mod section;

pub struct SimpleEncoder;

/// Render a real number the way PDF expects it: no exponent, at most four
/// decimal places, no trailing zeros.
pub(crate) fn format_real(value: f64) -> String {
    if !value.is_finite() {
        log::warn!("non-finite real {} written as 0", value);
        return "0".to_owned();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return (value as i64).to_string();
    }
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reals() {
        assert_eq!(format_real(600.0), "600");
        assert_eq!(format_real(-12.0), "-12");
        assert_eq!(format_real(0.5), "0.5");
        assert_eq!(format_real(566.929133858), "566.9291");
        assert_eq!(format_real(-0.00001), "0");
        assert_eq!(format_real(f64::NAN), "0");
    }
}
