//! SI unit formatting
//!
//! Engineering-notation rendering of sizes and rates: pick the base-1000
//! order of magnitude, scale the value into it and attach the matching SI
//! prefix. Magnitudes beyond the named prefixes fall back to an exponential
//! suffix. The prefix tables are fixed, process-wide constants.

/// SI prefixes for orders of magnitude -8..=8, indexed by `m + 8`.
const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// ASCII-only variant (`u` stands in for micro).
const SI_PREFIXES_ASCII: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "u", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Values smaller than this in absolute terms scale as if they were zero.
pub const DEFAULT_MIN_VAL: f64 = 1e-25;

/// How `si_format` renders the scaled number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatFormat {
    /// A fixed number of significant digits (`1500` at precision 3 -> `1.50 k`).
    #[default]
    General,
    /// A fixed number of decimal places.
    Fixed,
}

/// Options for [`si_format`].
#[derive(Debug, Clone)]
pub struct SiOptions {
    /// Significant digits (`General`) or decimal places (`Fixed`).
    pub precision: usize,
    pub float_format: FloatFormat,
    /// Separate the number from the prefix+suffix with a space.
    /// Exponential prefixes are never space-separated.
    pub space: bool,
    /// Optional error value, appended as ` ± <formatted>` (ASCII: ` +/- `).
    pub error: Option<f64>,
    /// Threshold below which a value scales as zero.
    pub min_val: f64,
    /// Use the Unicode micro prefix; when false, `u` is substituted.
    pub allow_unicode: bool,
}

impl Default for SiOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            float_format: FloatFormat::General,
            space: true,
            error: None,
            min_val: DEFAULT_MIN_VAL,
            allow_unicode: true,
        }
    }
}

/// Return the scale factor and SI prefix recommended for `x`.
///
/// The multiplier is `0.001^m` where `m` is the base-1000 order of
/// magnitude, so `x * multiplier` is the value expressed in the chosen
/// prefix's units: `si_scale(0.0001, ..)` returns `(1e6, "µ")` because
/// `0.0001` is best shown as `100 µUnits`.
///
/// `m` is clamped to `[-9, 9]`; orders outside the named prefix range
/// `[-8, 8]` come back as an exponential prefix such as `"e27"`.
/// Non-finite values and values below `min_val` scale by 1 with no prefix.
pub fn si_scale(x: f64, min_val: f64, allow_unicode: bool) -> (f64, String) {
    if !x.is_finite() {
        return (1.0, String::new());
    }
    if x.abs() < min_val {
        return (1.0, String::new());
    }

    let m = (x.abs().ln() / 1000f64.ln()).floor().clamp(-9.0, 9.0) as i32;
    if m == 0 {
        return (1.0, String::new());
    }

    let multiplier = 0.001f64.powi(m);
    if !(-8..=8).contains(&m) {
        return (multiplier, format!("e{}", m * 3));
    }

    let table = if allow_unicode {
        &SI_PREFIXES
    } else {
        &SI_PREFIXES_ASCII
    };
    (multiplier, table[(m + 8) as usize].to_string())
}

/// Format `x` in engineering notation with an SI prefix and unit suffix.
///
/// `si_format(0.0001, "V", &SiOptions::default())` returns `"100 µV"`.
pub fn si_format(x: f64, suffix: &str, opts: &SiOptions) -> String {
    let (multiplier, prefix) = si_scale(x, opts.min_val, opts.allow_unicode);
    let space = if opts.space { " " } else { "" };

    // Exponential prefixes attach directly to the number.
    let prefix = if prefix.starts_with('e') {
        prefix
    } else {
        format!("{space}{prefix}")
    };

    let number = match opts.float_format {
        FloatFormat::General => format_significant(x * multiplier, opts.precision),
        FloatFormat::Fixed => format!("{:.*}", opts.precision, x * multiplier),
    };

    match opts.error {
        None => format!("{number}{prefix}{suffix}"),
        Some(error) => {
            let plus_minus = if opts.allow_unicode {
                format!("{space}±{space}")
            } else {
                " +/- ".to_string()
            };
            let mut inner = opts.clone();
            inner.error = None;
            format!(
                "{number}{prefix}{suffix}{plus_minus}{}",
                si_format(error, suffix, &inner)
            )
        }
    }
}

/// Render `v` with `precision` significant digits.
///
/// Values whose decimal exponent falls outside `[-4, precision)` switch to
/// exponential notation, mirroring printf `%g` bucket selection, but
/// trailing zeros are kept so the digit count stays constant.
fn format_significant(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return format!("{}", v);
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let exponent = v.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= precision as i32 {
        format!("{:.*e}", precision - 1, v)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_zero_has_unit_multiplier_and_no_prefix() {
        assert_eq!(si_scale(0.0, DEFAULT_MIN_VAL, true), (1.0, String::new()));
    }

    #[test]
    fn scale_subthreshold_values_as_zero() {
        assert_eq!(si_scale(1e-30, DEFAULT_MIN_VAL, true), (1.0, String::new()));
    }

    #[test]
    fn scale_picks_named_prefixes() {
        let (p, pref) = si_scale(0.0001, DEFAULT_MIN_VAL, true);
        assert_eq!(pref, "µ");
        assert!((p - 1e6).abs() / 1e6 < 1e-12);

        let (p, pref) = si_scale(1500.0, DEFAULT_MIN_VAL, true);
        assert_eq!(pref, "k");
        assert!((p - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn scale_ascii_substitutes_micro() {
        let (_, pref) = si_scale(0.0001, DEFAULT_MIN_VAL, false);
        assert_eq!(pref, "u");
    }

    #[test]
    fn scale_non_finite_is_inert() {
        assert_eq!(si_scale(f64::NAN, DEFAULT_MIN_VAL, true), (1.0, String::new()));
        assert_eq!(
            si_scale(f64::INFINITY, DEFAULT_MIN_VAL, true),
            (1.0, String::new())
        );
    }

    #[test]
    fn scale_falls_back_to_exponential_beyond_named_range() {
        // m = 9 is within the clamp but past the named prefixes.
        let (_, pref) = si_scale(1e28, DEFAULT_MIN_VAL, true);
        assert_eq!(pref, "e27");

        let (_, pref) = si_scale(1e-28, DEFAULT_MIN_VAL, true);
        assert_eq!(pref, "e-27");
    }

    #[test]
    fn scale_clamps_extreme_magnitudes() {
        // m computed as 10+ clamps to 9, m below -9 clamps to -9.
        let (p, pref) = si_scale(1e301, DEFAULT_MIN_VAL, true);
        assert_eq!(pref, "e27");
        assert!((p - 1e-27).abs() / 1e-27 < 1e-9);
    }

    #[test]
    fn format_default_is_three_significant_digits() {
        assert_eq!(si_format(1500.0, "B", &SiOptions::default()), "1.50 kB");
        assert_eq!(si_format(0.0001, "V", &SiOptions::default()), "100 µV");
    }

    #[test]
    fn format_ascii_mode() {
        let opts = SiOptions {
            allow_unicode: false,
            ..SiOptions::default()
        };
        assert_eq!(si_format(0.0001, "V", &opts), "100 uV");
    }

    #[test]
    fn format_nan_does_not_panic() {
        let s = si_format(f64::NAN, "B", &SiOptions::default());
        assert_eq!(s, "NaN B");
    }

    #[test]
    fn format_exponential_prefix_is_not_space_separated() {
        let s = si_format(1e28, "B", &SiOptions::default());
        assert_eq!(s, "10.0e27B");
    }

    #[test]
    fn format_fixed() {
        let opts = SiOptions {
            float_format: FloatFormat::Fixed,
            precision: 2,
            ..SiOptions::default()
        };
        assert_eq!(si_format(1500.0, "B", &opts), "1.50 kB");
        assert_eq!(si_format(0.0, "B", &opts), "0.00 B");
    }

    #[test]
    fn format_without_space() {
        let opts = SiOptions {
            space: false,
            ..SiOptions::default()
        };
        assert_eq!(si_format(1500.0, "B", &opts), "1.50kB");
    }

    #[test]
    fn format_with_error_value() {
        let opts = SiOptions {
            error: Some(100.0),
            ..SiOptions::default()
        };
        assert_eq!(si_format(1500.0, "B", &opts), "1.50 kB ± 100 B");

        let ascii = SiOptions {
            error: Some(100.0),
            allow_unicode: false,
            ..SiOptions::default()
        };
        assert_eq!(si_format(1500.0, "B", &ascii), "1.50 kB +/- 100 B");
    }

    #[test]
    fn format_is_idempotent() {
        let opts = SiOptions::default();
        assert_eq!(
            si_format(1234.5, "B", &opts),
            si_format(1234.5, "B", &opts)
        );
    }

    #[test]
    fn significant_digit_rendering() {
        assert_eq!(format_significant(1.5, 3), "1.50");
        assert_eq!(format_significant(100.0, 3), "100");
        assert_eq!(format_significant(-1.5, 3), "-1.50");
        assert_eq!(format_significant(0.0, 3), "0");
        assert_eq!(format_significant(1000.0, 3), "1.00e3");
    }
}
