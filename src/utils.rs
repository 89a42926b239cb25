use crate::schema::CellValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Display text for any ratio that has no numeric value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Outcome of a single ratio computation. Never an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub enum RatioValue {
    /// A finite computed or passed-through number.
    Value(f64),
    /// The ratio could not be computed: zero or missing denominator, or an unmet precondition.
    NotApplicable,
    /// A passthrough line item was absent from the statements.
    Missing,
}

impl RatioValue {
    /// Wraps a passthrough lookup: absent becomes `Missing`.
    pub fn from_lookup(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => RatioValue::Value(v),
            Some(_) => RatioValue::NotApplicable,
            None => RatioValue::Missing,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            RatioValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, RatioValue::Value(_))
    }

    /// Formats with thousands separators and four decimals, or "N/A".
    pub fn display(&self) -> String {
        match self {
            RatioValue::Value(v) => format_with_separators(*v, 4),
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

impl std::fmt::Display for RatioValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Divides without ever failing.
///
/// An absent numerator counts as zero. An absent, zero or non-finite denominator
/// yields `NotApplicable`, as does a quotient that overflows.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> RatioValue {
    let n = numerator.filter(|n| !n.is_nan()).unwrap_or(0.0);
    let d = match denominator {
        Some(d) if d.is_finite() && d != 0.0 => d,
        _ => return RatioValue::NotApplicable,
    };

    let quotient = n / d;
    if quotient.is_finite() {
        RatioValue::Value(quotient)
    } else {
        RatioValue::NotApplicable
    }
}

/// Normalizes a year cell into an integer-like label: `2023.0` and `"2023.0"` both become `"2023"`.
pub fn normalize_year_label(cell: &CellValue) -> Option<String> {
    let label = match cell {
        CellValue::Number(n) if n.is_finite() => {
            if n.fract() == 0.0 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        CellValue::Text(text) => text.trim().to_string(),
        _ => return None,
    };

    let label = label.strip_suffix(".0").map(str::to_string).unwrap_or(label);
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// A year column header counts as a fiscal year when it is made only of ASCII digits.
pub fn is_fiscal_year(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_digit())
}

/// Rounds half away from zero. Values too large to carry `decimals` fractional
/// digits are already exact at that precision and come back unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() || value.abs() >= 2_f64.powi(52) / factor {
        return value;
    }
    scaled.round() / factor
}

/// Formats a number as `1,234,567.8900`.
pub fn format_with_separators(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_safe_divide_basic() {
        assert_eq!(safe_divide(Some(10.0), Some(4.0)), RatioValue::Value(2.5));
        assert_eq!(safe_divide(None, Some(4.0)), RatioValue::Value(0.0));
        assert_eq!(safe_divide(Some(10.0), Some(0.0)), RatioValue::NotApplicable);
        assert_eq!(safe_divide(Some(10.0), None), RatioValue::NotApplicable);
        assert_eq!(safe_divide(None, None), RatioValue::NotApplicable);
        assert_eq!(
            safe_divide(Some(10.0), Some(f64::NAN)),
            RatioValue::NotApplicable
        );
    }

    #[test]
    fn test_safe_divide_chains_through_value() {
        let revenue_per_day = safe_divide(Some(365_000.0), Some(365.0));
        let dso = safe_divide(Some(50_000.0), revenue_per_day.value());
        assert_relative_eq!(dso.value().unwrap(), 50.0);

        let no_revenue = safe_divide(None, Some(365.0));
        assert_eq!(no_revenue, RatioValue::Value(0.0));
        assert_eq!(
            safe_divide(Some(50_000.0), no_revenue.value()),
            RatioValue::NotApplicable
        );
    }

    #[test]
    fn test_ratio_value_from_lookup() {
        assert_eq!(RatioValue::from_lookup(Some(1.5)), RatioValue::Value(1.5));
        assert_eq!(RatioValue::from_lookup(None), RatioValue::Missing);
        assert!(!RatioValue::Missing.is_value());
        assert_eq!(RatioValue::Missing.display(), "N/A");
        assert_eq!(RatioValue::NotApplicable.display(), "N/A");
    }

    #[test]
    fn test_normalize_year_label() {
        assert_eq!(
            normalize_year_label(&CellValue::Number(2023.0)),
            Some("2023".to_string())
        );
        assert_eq!(
            normalize_year_label(&CellValue::Text("2022.0".to_string())),
            Some("2022".to_string())
        );
        assert_eq!(
            normalize_year_label(&CellValue::Text(" 2021 ".to_string())),
            Some("2021".to_string())
        );
        assert_eq!(
            normalize_year_label(&CellValue::Text("FY2021".to_string())),
            Some("FY2021".to_string())
        );
        assert_eq!(
            normalize_year_label(&CellValue::Number(2023.5)),
            Some("2023.5".to_string())
        );
        assert_eq!(normalize_year_label(&CellValue::Empty), None);
    }

    #[test]
    fn test_is_fiscal_year() {
        assert!(is_fiscal_year("2023"));
        assert!(!is_fiscal_year("2023.5"));
        assert!(!is_fiscal_year("FY2023"));
        assert!(!is_fiscal_year(""));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10_000.0 * 0.85 * 0.90, 2), 7650.0);
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1e307, 2), 1e307);
        assert_eq!(round_to(-1e300, 2), -1e300);
        assert_eq!(round_to(f64::MAX, 2), f64::MAX);
    }

    #[test]
    fn test_format_with_separators() {
        assert_eq!(format_with_separators(1_234_567.891, 4), "1,234,567.8910");
        assert_eq!(format_with_separators(999.0, 2), "999.00");
        assert_eq!(format_with_separators(-1_000.5, 1), "-1,000.5");
        assert_eq!(format_with_separators(0.375, 4), "0.3750");
        assert_eq!(format_with_separators(-0.00001, 4), "0.0000");
        assert_eq!(format_with_separators(12_345.0, 0), "12,345");
    }

    proptest! {
        #[test]
        fn test_zero_or_absent_denominator_is_not_applicable(
            numerator in proptest::option::of(-1e12f64..1e12f64)
        ) {
            prop_assert_eq!(safe_divide(numerator, Some(0.0)), RatioValue::NotApplicable);
            prop_assert_eq!(safe_divide(numerator, Some(-0.0)), RatioValue::NotApplicable);
            prop_assert_eq!(safe_divide(numerator, None), RatioValue::NotApplicable);
        }

        #[test]
        fn test_non_zero_denominator_divides(
            numerator in -1e12f64..1e12f64,
            denominator in prop_oneof![-1e9f64..-1e-6f64, 1e-6f64..1e9f64]
        ) {
            let result = safe_divide(Some(numerator), Some(denominator));
            prop_assert_eq!(result, RatioValue::Value(numerator / denominator));
        }
    }
}
