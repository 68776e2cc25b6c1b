//! Font name canonicalization and fallback chains.

/// A known face: canonical name, aliases (localized names, platform
/// equivalents) and the generic family closing its chain.
struct FontFace {
    canonical: &'static str,
    aliases: &'static [&'static str],
    fallbacks: &'static [&'static str],
    generic: &'static str,
}

const FONT_FACES: &[FontFace] = &[
    FontFace {
        canonical: "SimSun",
        aliases: &["宋体", "新宋体", "NSimSun", "Songti SC", "STSong"],
        fallbacks: &["Songti SC"],
        generic: "serif",
    },
    FontFace {
        canonical: "FangSong",
        aliases: &["仿宋", "仿宋_GB2312", "FangSong_GB2312", "STFangsong"],
        fallbacks: &["STFangsong"],
        generic: "serif",
    },
    FontFace {
        canonical: "KaiTi",
        aliases: &["楷体", "楷体_GB2312", "KaiTi_GB2312", "STKaiti"],
        fallbacks: &["STKaiti"],
        generic: "serif",
    },
    FontFace {
        canonical: "SimHei",
        aliases: &["黑体", "STHeiti", "Heiti SC"],
        fallbacks: &["Heiti SC"],
        generic: "sans-serif",
    },
    FontFace {
        canonical: "Microsoft YaHei",
        aliases: &["微软雅黑", "PingFang SC"],
        fallbacks: &["PingFang SC"],
        generic: "sans-serif",
    },
    FontFace {
        canonical: "Times New Roman",
        aliases: &["Times", "TimesNewRoman"],
        fallbacks: &["Times"],
        generic: "serif",
    },
    FontFace {
        canonical: "Georgia",
        aliases: &[],
        fallbacks: &[],
        generic: "serif",
    },
    FontFace {
        canonical: "Cambria",
        aliases: &[],
        fallbacks: &["Georgia"],
        generic: "serif",
    },
    FontFace {
        canonical: "Arial",
        aliases: &["Helvetica", "Arial MT"],
        fallbacks: &["Helvetica"],
        generic: "sans-serif",
    },
    FontFace {
        canonical: "Calibri",
        aliases: &["Carlito"],
        fallbacks: &["Arial"],
        generic: "sans-serif",
    },
    FontFace {
        canonical: "Verdana",
        aliases: &[],
        fallbacks: &[],
        generic: "sans-serif",
    },
    FontFace {
        canonical: "Courier New",
        aliases: &["Courier"],
        fallbacks: &["Courier"],
        generic: "monospace",
    },
    FontFace {
        canonical: "Consolas",
        aliases: &["Menlo", "Monaco"],
        fallbacks: &["Courier New"],
        generic: "monospace",
    },
];

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

fn find_face(name: &str) -> Option<&'static FontFace> {
    let needle = name.trim();
    FONT_FACES.iter().find(|face| {
        face.canonical.eq_ignore_ascii_case(needle)
            || face.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
    })
}

fn quote_family(name: &str) -> String {
    if GENERIC_FAMILIES.contains(&name) || !name.contains(|c: char| c.is_whitespace()) {
        name.to_string()
    } else {
        format!("\"{}\"", name)
    }
}

fn split_families(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand a font name (or an existing CSS family list) into a CSS fallback
/// chain.
///
/// The first family is canonicalized (`宋体` becomes `SimSun`), known faces
/// get their platform fallbacks and a generic family appended. Applying the
/// function to its own output returns the same string.
pub fn font_fallback_chain(name: &str) -> String {
    let families = split_families(name);
    let first = match families.first() {
        Some(first) => first.clone(),
        None => return String::new(),
    };

    fn push(family: &str, chain: &mut Vec<String>) {
        if !chain.iter().any(|f| f.eq_ignore_ascii_case(family)) {
            chain.push(family.to_string());
        }
    }

    let mut chain: Vec<String> = Vec::new();

    match find_face(&first) {
        Some(face) => {
            push(face.canonical, &mut chain);
            for fallback in face.fallbacks {
                push(fallback, &mut chain);
            }
            for rest in families.iter().skip(1) {
                push(rest, &mut chain);
            }
            push(face.generic, &mut chain);
        }
        None => {
            for family in &families {
                push(family, &mut chain);
            }
        }
    }

    chain
        .iter()
        .map(|family| quote_family(family))
        .collect::<Vec<_>>()
        .join(", ")
}

/// First family of a CSS font-family list, unquoted and canonicalized.
pub fn primary_family(chain: &str) -> Option<String> {
    let first = split_families(chain).into_iter().next()?;
    if GENERIC_FAMILIES.contains(&first.as_str()) {
        return None;
    }
    Some(
        find_face(&first)
            .map(|face| face.canonical.to_string())
            .unwrap_or(first),
    )
}

/// Whether a face is an East Asian face, in which case the writer also
/// records it as `w:eastAsia`.
pub fn east_asian_name(name: &str) -> Option<&'static str> {
    let face = find_face(name)?;
    matches!(
        face.canonical,
        "SimSun" | "FangSong" | "KaiTi" | "SimHei" | "Microsoft YaHei"
    )
    .then_some(face.canonical)
}

/// Whether the text contains CJK ideographs or CJK punctuation.
pub fn is_cjk_text(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c as u32,
            0x3000..=0x303F
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFFEF
            | 0x20000..=0x2A6DF)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_alias_canonicalized() {
        assert_eq!(
            font_fallback_chain("宋体"),
            "SimSun, \"Songti SC\", serif"
        );
        assert_eq!(
            font_fallback_chain("仿宋_GB2312"),
            "FangSong, STFangsong, serif"
        );
    }

    #[test]
    fn test_chain_idempotent() {
        for name in ["宋体", "Times New Roman", "Calibri", "Unknown Face", "Consolas"] {
            let once = font_fallback_chain(name);
            assert_eq!(font_fallback_chain(&once), once, "{}", name);
        }
    }

    #[test]
    fn test_unknown_font_kept() {
        assert_eq!(font_fallback_chain("My Font"), "\"My Font\"");
        assert_eq!(font_fallback_chain(""), "");
    }

    #[test]
    fn test_primary_family() {
        assert_eq!(
            primary_family("\"Times New Roman\", Times, serif"),
            Some("Times New Roman".to_string())
        );
        assert_eq!(primary_family("黑体"), Some("SimHei".to_string()));
        assert_eq!(primary_family("serif"), None);
    }

    #[test]
    fn test_east_asian() {
        assert_eq!(east_asian_name("宋体"), Some("SimSun"));
        assert_eq!(east_asian_name("Arial"), None);
        assert!(is_cjk_text("关于印发"));
        assert!(!is_cjk_text("Hello"));
    }
}
