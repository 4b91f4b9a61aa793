//! Administrative level tags and their display categories.

use serde::{Deserialize, Serialize};

/// Levels the local dataset provider knows about (ADM1 provinces, ADM2 districts).
pub const SUPPORTED_LEVELS: [u8; 2] = [1, 2];

/// Coarse category of an administrative area, shown next to its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminCategory {
    Province,
    District,
    /// OSM admin_level <= 4
    RegionProvince,
    /// OSM admin_level 7-8
    CityTown,
    /// OSM admin_level >= 9
    VillageSubdistrict,
    Administrative,
}

impl AdminCategory {
    /// Category for a local dataset level (ADM1, ADM2, ...).
    pub fn from_adm_level(level: u8) -> Self {
        match level {
            1 => AdminCategory::Province,
            2 => AdminCategory::District,
            _ => AdminCategory::Administrative,
        }
    }

    /// Category for an OSM `admin_level` tag value.
    ///
    /// Only the leading integer is read, so `"6;8"` counts as 6.
    pub fn from_osm_tag(tag: &str) -> Self {
        match parse_leading_int(tag) {
            Some(l) if l <= 4 => AdminCategory::RegionProvince,
            Some(5 | 6) => AdminCategory::District,
            Some(7 | 8) => AdminCategory::CityTown,
            Some(_) => AdminCategory::VillageSubdistrict,
            None => AdminCategory::Administrative,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminCategory::Province => "Province",
            AdminCategory::District => "District",
            AdminCategory::RegionProvince => "Region/Province",
            AdminCategory::CityTown => "City/Town",
            AdminCategory::VillageSubdistrict => "Village/Subdistrict",
            AdminCategory::Administrative => "Administrative",
        }
    }
}

/// `ADM1`, `ADM2`, ...
pub fn adm_label(level: u8) -> String {
    format!("ADM{}", level)
}

fn parse_leading_int(tag: &str) -> Option<i64> {
    let tag = tag.trim_start();
    let (sign, digits) = match tag.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, tag.strip_prefix('+').unwrap_or(tag)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
