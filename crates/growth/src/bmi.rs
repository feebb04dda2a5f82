//! Body mass index.

/// Body mass index in kg/m²: `weight / (height / 100)²`.
///
/// Returns `None` when either input is not a positive finite number.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(weight_kg.is_finite() && height_cm.is_finite()) || weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Rounds `value` to `decimals` decimal places (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_kilos_at_one_metre() {
        assert_eq!(bmi(20.0, 100.0), Some(20.0));
    }

    #[test]
    fn typical_toddler() {
        let value = bmi(12.2, 87.1).expect("valid inputs");
        assert_eq!(round_to(value, 2), 16.08);
    }

    #[test]
    fn rejects_non_positive_or_non_finite() {
        assert_eq!(bmi(20.0, 0.0), None);
        assert_eq!(bmi(-1.0, 100.0), None);
        assert_eq!(bmi(f64::NAN, 100.0), None);
        assert_eq!(bmi(20.0, f64::INFINITY), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(16.0815, 1), 16.1);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
