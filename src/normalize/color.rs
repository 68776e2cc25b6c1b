//! Color literal normalization to canonical `#RRGGBB`.

/// Named colors: the CSS basic palette plus the OOXML highlight names.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#FF0000"),
    ("green", "#008000"),
    ("lime", "#00FF00"),
    ("blue", "#0000FF"),
    ("yellow", "#FFFF00"),
    ("cyan", "#00FFFF"),
    ("aqua", "#00FFFF"),
    ("magenta", "#FF00FF"),
    ("fuchsia", "#FF00FF"),
    ("silver", "#C0C0C0"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("purple", "#800080"),
    ("teal", "#008080"),
    ("navy", "#000080"),
    ("orange", "#FFA500"),
    ("pink", "#FFC0CB"),
    ("brown", "#A52A2A"),
    ("gold", "#FFD700"),
    ("crimson", "#DC143C"),
    ("darkred", "#8B0000"),
    ("darkblue", "#00008B"),
    ("darkcyan", "#008B8B"),
    ("darkgreen", "#006400"),
    ("darkmagenta", "#8B008B"),
    ("darkyellow", "#808000"),
    ("darkgray", "#A9A9A9"),
    ("darkgrey", "#A9A9A9"),
    ("lightgray", "#D3D3D3"),
    ("lightgrey", "#D3D3D3"),
];

/// Normalize a color literal to `#RRGGBB` (uppercase).
///
/// Accepts `#RGB`, `#RRGGBB`, bare `RRGGBB` (as written in OOXML
/// attributes), `rgb(r, g, b)`, `rgba(r, g, b, a)` and named colors.
/// `auto`, `transparent`, `none`, `inherit` and anything unparseable yield
/// `None`.
pub fn normalize_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let lower = value.to_ascii_lowercase();

    match lower.as_str() {
        "auto" | "transparent" | "none" | "inherit" | "initial" | "currentcolor" => {
            return None
        }
        _ => {}
    }

    if let Some(hex) = lower.strip_prefix('#') {
        return normalize_hex(hex);
    }

    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
    {
        let args = args.strip_suffix(')')?;
        return parse_rgb_args(args);
    }

    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return Some((*hex).to_string());
    }

    if lower.len() == 6 && lower.chars().all(|c| c.is_ascii_hexdigit()) {
        return normalize_hex(&lower);
    }

    None
}

fn normalize_hex(hex: &str) -> Option<String> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let expanded: String = hex.chars().take(3).flat_map(|c| [c, c]).collect();
            Some(format!("#{}", expanded.to_ascii_uppercase()))
        }
        6 | 8 => Some(format!("#{}", hex[..6].to_ascii_uppercase())),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<String> {
    let parts: Vec<&str> = args
        .split(|c| c == ',' || c == ' ' || c == '/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(parts.iter()) {
        let value = if let Some(pct) = part.strip_suffix('%') {
            pct.parse::<f64>().ok()? * 2.55
        } else {
            part.parse::<f64>().ok()?
        };
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }

    Some(format!(
        "#{:02X}{:02X}{:02X}",
        channels[0], channels[1], channels[2]
    ))
}

/// Split a normalized `#RRGGBB` color into channels.
pub fn rgb_components(color: &str) -> Option<(u8, u8, u8)> {
    let normalized = normalize_color(color)?;
    let hex = &normalized[1..];
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Whether a color reads as red: a strong red channel with weak green and
/// blue channels.
pub fn is_reddish(color: &str, min_red: u8, max_green_blue: u8) -> bool {
    match rgb_components(color) {
        Some((r, g, b)) => r >= min_red && g <= max_green_blue && b <= max_green_blue,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(normalize_color("#f00"), Some("#FF0000".to_string()));
        assert_eq!(normalize_color("#ff0000"), Some("#FF0000".to_string()));
        assert_eq!(normalize_color("FF0000"), Some("#FF0000".to_string()));
        assert_eq!(normalize_color("#12345678"), Some("#123456".to_string()));
        assert_eq!(normalize_color("#12"), None);
    }

    #[test]
    fn test_rgb_and_named() {
        assert_eq!(
            normalize_color("rgb(255, 0, 0)"),
            Some("#FF0000".to_string())
        );
        assert_eq!(
            normalize_color("rgba(0,128,255,0.5)"),
            Some("#0080FF".to_string())
        );
        assert_eq!(normalize_color("Red"), Some("#FF0000".to_string()));
        assert_eq!(normalize_color("darkBlue"), Some("#00008B".to_string()));
        assert_eq!(normalize_color("auto"), None);
        assert_eq!(normalize_color("transparent"), None);
    }

    #[test]
    fn test_idempotent() {
        for input in ["#abc", "#A0B1C2", "rgb(12, 34, 56)", "navy", "c00000"] {
            let once = normalize_color(input).unwrap();
            assert_eq!(normalize_color(&once), Some(once.clone()), "{}", input);
        }
    }

    #[test]
    fn test_is_reddish() {
        assert!(is_reddish("#FF0000", 0xC0, 0x60));
        assert!(is_reddish("C00000", 0xC0, 0x60));
        assert!(is_reddish("red", 0xC0, 0x60));
        assert!(!is_reddish("#800000", 0xC0, 0x60));
        assert!(!is_reddish("#FF8080", 0xC0, 0x60));
        assert!(!is_reddish("auto", 0xC0, 0x60));
    }
}
