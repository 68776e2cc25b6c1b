//! Length conversions between OOXML units and CSS pixels.
//!
//! Pixels are CSS pixels at 96 DPI. A point is 1/72 inch, a twip 1/20 point,
//! an EMU 1/914400 inch.

/// CSS pixels per point.
pub const PX_PER_PT: f64 = 96.0 / 72.0;

/// Twips per CSS pixel.
pub const TWIPS_PER_PX: f64 = 15.0;

/// EMUs per CSS pixel.
pub const EMU_PER_PX: f64 = 9525.0;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Points to pixels.
pub fn px_from_pt(pt: f64) -> f64 {
    round2(pt * PX_PER_PT)
}

/// Pixels to points.
pub fn pt_from_px(px: f64) -> f64 {
    round2(px / PX_PER_PT)
}

/// Twips to pixels.
pub fn px_from_twip(twip: i64) -> f64 {
    round2(twip as f64 / TWIPS_PER_PX)
}

/// Pixels to twips.
pub fn twip_from_px(px: f64) -> i64 {
    (px * TWIPS_PER_PX).round() as i64
}

/// Half-points (the unit of `w:sz`) to pixels.
pub fn px_from_half_points(half_points: u32) -> f64 {
    px_from_pt(half_points as f64 / 2.0)
}

/// Pixels to half-points.
pub fn half_points_from_px(px: f64) -> u32 {
    (px / PX_PER_PT * 2.0).round().max(1.0) as u32
}

/// EMUs to pixels.
pub fn px_from_emu(emu: i64) -> f64 {
    round2(emu as f64 / EMU_PER_PX)
}

/// Pixels to EMUs.
pub fn emu_from_px(px: f64) -> i64 {
    (px * EMU_PER_PX).round() as i64
}

/// Parse a CSS length into pixels.
///
/// Accepts `px`, `pt`, `em`/`rem` (16px base), `in`, `cm`, `mm` and bare
/// numbers (taken as pixels). Percentages and keywords yield `None`.
pub fn parse_css_length(value: &str) -> Option<f64> {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;
    if !number.is_finite() {
        return None;
    }

    let px = match unit.trim() {
        "" | "px" => number,
        "pt" => number * PX_PER_PT,
        "em" | "rem" => number * 16.0,
        "in" => number * 96.0,
        "cm" => number * 96.0 / 2.54,
        "mm" => number * 96.0 / 25.4,
        "pc" => number * 16.0,
        _ => return None,
    };
    Some(round2(px))
}

/// Format a pixel value as a CSS length, trimming insignificant zeros.
pub fn format_px(px: f64) -> String {
    format!("{}px", format_number(px))
}

/// Format a number with at most two decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{:.2}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_east_asian_point_sizes() {
        assert_eq!(px_from_pt(10.5), 14.0);
        assert_eq!(px_from_pt(12.0), 16.0);
        assert_eq!(px_from_pt(16.0), 21.33);
        assert_eq!(px_from_pt(22.0), 29.33);
        assert_eq!(px_from_half_points(21), 14.0);
    }

    #[test]
    fn test_pt_px_roundtrip() {
        for n in [1.0, 7.0, 13.0, 14.0, 16.0, 21.33, 29.33, 42.67, 100.0] {
            let back = px_from_pt(pt_from_px(n));
            assert!((back - n).abs() <= 0.01, "{} -> {}", n, back);
        }
    }

    #[test]
    fn test_twips_and_emu() {
        assert_eq!(px_from_twip(1440), 96.0);
        assert_eq!(px_from_twip(420), 28.0);
        assert_eq!(twip_from_px(28.0), 420);
        assert_eq!(px_from_emu(914400), 96.0);
        assert_eq!(emu_from_px(96.0), 914400);
        assert_eq!(half_points_from_px(14.0), 21);
        assert_eq!(half_points_from_px(16.0), 24);
    }

    #[test]
    fn test_parse_css_length() {
        assert_eq!(parse_css_length("12pt"), Some(16.0));
        assert_eq!(parse_css_length(" 14px "), Some(14.0));
        assert_eq!(parse_css_length("2em"), Some(32.0));
        assert_eq!(parse_css_length("1in"), Some(96.0));
        assert_eq!(parse_css_length("14"), Some(14.0));
        assert_eq!(parse_css_length("50%"), None);
        assert_eq!(parse_css_length("auto"), None);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(14.0), "14px");
        assert_eq!(format_px(21.333), "21.33px");
        assert_eq!(format_px(2.5), "2.5px");
    }
}
