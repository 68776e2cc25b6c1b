//! DOCX numbering (list) definitions.

use crate::error::Result;
use crate::model::ListKind;
use crate::xml::{self, XmlElement};
use std::collections::HashMap;

/// Abstract numbering definition.
#[derive(Debug, Clone, Default)]
pub struct AbstractNum {
    pub id: String,
    /// Levels (0-8)
    pub levels: Vec<NumLevel>,
}

/// A numbering level definition.
#[derive(Debug, Clone)]
pub struct NumLevel {
    /// Level index (0-8)
    pub level: u8,
    pub start: u32,
    /// Number format (decimal, bullet, lowerLetter, etc.)
    pub num_fmt: String,
    /// Level text (e.g., "%1.", "•")
    pub level_text: String,
}

impl NumLevel {
    /// The list kind this level renders as.
    pub fn list_kind(&self) -> ListKind {
        match self.num_fmt.as_str() {
            "bullet" | "none" => ListKind::Bullet,
            _ => ListKind::Ordered,
        }
    }
}

/// Concrete numbering instance.
#[derive(Debug, Clone, Default)]
pub struct NumInstance {
    pub num_id: String,
    pub abstract_num_id: String,
    /// `w:lvlOverride/w:startOverride` per level
    pub start_overrides: HashMap<u8, u32>,
}

/// Collection of numbering definitions.
#[derive(Debug, Clone, Default)]
pub struct NumberingMap {
    pub abstract_nums: HashMap<String, AbstractNum>,
    pub instances: HashMap<String, NumInstance>,
}

impl NumberingMap {
    /// Parse numbering from XML content.
    pub fn parse(xml_text: &str) -> Result<Self> {
        if xml_text.trim().is_empty() {
            return Ok(Self::default());
        }
        let root = xml::parse(xml_text)?;
        Ok(Self::from_element(&root))
    }

    /// Build from a parsed `w:numbering` element.
    pub fn from_element(root: &XmlElement) -> Self {
        let mut map = NumberingMap::default();

        for element in root.elements() {
            match element.name.as_str() {
                "w:abstractNum" => {
                    let id = element.attr("w:abstractNumId").unwrap_or_default().to_string();
                    let levels = element
                        .elements()
                        .filter(|e| e.name == "w:lvl")
                        .map(parse_level)
                        .collect();
                    map.abstract_nums
                        .insert(id.clone(), AbstractNum { id, levels });
                }
                "w:num" => {
                    let num_id = element.attr("w:numId").unwrap_or_default().to_string();
                    let abstract_num_id = element
                        .child_named("w:abstractNumId")
                        .and_then(|e| e.val())
                        .unwrap_or_default()
                        .to_string();
                    let mut start_overrides = HashMap::new();
                    for ovr in element.elements().filter(|e| e.name == "w:lvlOverride") {
                        let ilvl = ovr.attr("w:ilvl").and_then(|v| v.parse::<u8>().ok());
                        let start = ovr
                            .child_named("w:startOverride")
                            .and_then(|e| e.val())
                            .and_then(|v| v.parse::<u32>().ok());
                        if let (Some(ilvl), Some(start)) = (ilvl, start) {
                            start_overrides.insert(ilvl, start);
                        }
                    }
                    map.instances.insert(
                        num_id.clone(),
                        NumInstance {
                            num_id,
                            abstract_num_id,
                            start_overrides,
                        },
                    );
                }
                _ => {}
            }
        }

        map
    }

    /// Level definition for a numId and level index.
    pub fn level(&self, num_id: &str, ilvl: u8) -> Option<&NumLevel> {
        let instance = self.instances.get(num_id)?;
        let abstract_num = self.abstract_nums.get(&instance.abstract_num_id)?;
        abstract_num.levels.iter().find(|l| l.level == ilvl)
    }

    /// List kind for a numId and level; unknown definitions render as bullets.
    pub fn list_kind(&self, num_id: &str, ilvl: u8) -> ListKind {
        self.level(num_id, ilvl)
            .map(NumLevel::list_kind)
            .unwrap_or(ListKind::Bullet)
    }

    /// Effective start value, honouring instance overrides.
    pub fn start(&self, num_id: &str, ilvl: u8) -> u32 {
        if let Some(start) = self
            .instances
            .get(num_id)
            .and_then(|i| i.start_overrides.get(&ilvl))
        {
            return *start;
        }
        self.level(num_id, ilvl).map(|l| l.start).unwrap_or(1)
    }

    /// Whether a numId disables numbering (`numId` 0 or unknown).
    pub fn is_numbered(&self, num_id: &str) -> bool {
        num_id != "0" && self.instances.contains_key(num_id)
    }

    /// numIds whose first level is a bullet or an ordered format, sorted
    /// numerically.
    pub fn num_ids_of_kind(&self, kind: ListKind) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances
            .keys()
            .filter(|id| self.level(id, 0).map(NumLevel::list_kind) == Some(kind))
            .cloned()
            .collect();
        ids.sort_by_key(|id| id.parse::<u32>().unwrap_or(u32::MAX));
        ids
    }
}

fn parse_level(lvl: &XmlElement) -> NumLevel {
    NumLevel {
        level: lvl.attr("w:ilvl").and_then(|v| v.parse().ok()).unwrap_or(0),
        start: lvl
            .child_named("w:start")
            .and_then(|e| e.val())
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
        num_fmt: lvl
            .child_named("w:numFmt")
            .and_then(|e| e.val())
            .unwrap_or("bullet")
            .to_string(),
        level_text: lvl
            .child_named("w:lvlText")
            .and_then(|e| e.val())
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="◦"/></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="1">
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
    <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="lowerLetter"/><w:lvlText w:val="%2."/></w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
  <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
  <w:num w:numId="3">
    <w:abstractNumId w:val="1"/>
    <w:lvlOverride w:ilvl="0"><w:startOverride w:val="5"/></w:lvlOverride>
  </w:num>
</w:numbering>"#;

    #[test]
    fn test_parse_numbering() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.abstract_nums.len(), 2);
        assert_eq!(map.instances.len(), 3);
        assert_eq!(map.level("1", 1).unwrap().level_text, "◦");
    }

    #[test]
    fn test_list_kinds() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.list_kind("1", 0), ListKind::Bullet);
        assert_eq!(map.list_kind("2", 1), ListKind::Ordered);
        assert_eq!(map.list_kind("99", 0), ListKind::Bullet);
        assert!(!map.is_numbered("0"));
        assert!(map.is_numbered("2"));
    }

    #[test]
    fn test_start_override() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.start("2", 0), 1);
        assert_eq!(map.start("3", 0), 5);
    }

    #[test]
    fn test_num_ids_of_kind() {
        let map = NumberingMap::parse(NUMBERING).unwrap();
        assert_eq!(map.num_ids_of_kind(ListKind::Bullet), vec!["1"]);
        assert_eq!(map.num_ids_of_kind(ListKind::Ordered), vec!["2", "3"]);
    }
}
