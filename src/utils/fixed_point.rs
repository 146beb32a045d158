// src/utils/fixed_point.rs

/// Quantize a scaled index value to `i16`, truncating toward zero.
///
/// Returns `None` for non-finite values and for values outside the `i16`
/// range; callers write nodata in that case.
#[inline]
pub fn to_fixed_point(value: f32) -> Option<i16> {
    if !value.is_finite() || value > i16::MAX as f32 || value < i16::MIN as f32 {
        None
    } else {
        Some(value as i16)
    }
}

/// Double precision variant used by the unmixing solver.
#[inline]
pub fn to_fixed_point_f64(value: f64) -> Option<i16> {
    if !value.is_finite() || value > i16::MAX as f64 || value < i16::MIN as f64 {
        None
    } else {
        Some(value as i16)
    }
}

/// Quantize with a scale factor, falling back to `nodata`.
#[inline]
pub fn quantize_or(value: f64, scale: f64, nodata: i16) -> i16 {
    to_fixed_point_f64(value * scale).unwrap_or(nodata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_toward_zero() {
        assert_eq!(to_fixed_point(2500.9), Some(2500));
        assert_eq!(to_fixed_point(-2500.9), Some(-2500));
        assert_eq!(to_fixed_point_f64(0.99), Some(0));
    }

    #[test]
    fn rejects_values_outside_i16() {
        assert_eq!(to_fixed_point(32767.0), Some(32767));
        assert_eq!(to_fixed_point(32767.5), None);
        assert_eq!(to_fixed_point(32768.0), None);
        assert_eq!(to_fixed_point(-32769.0), None);
        assert_eq!(to_fixed_point(f32::NAN), None);
        assert_eq!(to_fixed_point_f64(f64::INFINITY), None);
        assert_eq!(quantize_or(4.0, 10000.0, -9999), -9999);
        assert_eq!(quantize_or(0.25, 10000.0, -9999), 2500);
    }
}
