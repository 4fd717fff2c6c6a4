//! Unit identities and rounding policy
//!
//! The closed set of units of measure known to the catalog, plus the rounding
//! mode applied when a conversion lands on pieces.

use serde::{Deserialize, Serialize};

/// Kilograms per ton
pub const KG_PER_TON: i64 = 1000;

/// Enumerated unit of measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitName {
    #[serde(rename = "piece")]
    Piece,
    #[serde(rename = "kilogram")]
    Kilogram,
    #[serde(rename = "ton")]
    Ton,
    #[serde(rename = "pallet")]
    Pallet,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "millimeter")]
    Millimeter,
    #[serde(rename = "megapascal")]
    Megapascal,
    #[serde(rename = "litre")]
    Litre,
    #[serde(rename = "kg/m3")]
    KgPerM3,
}

impl UnitName {
    pub const ALL: [UnitName; 9] = [
        UnitName::Piece,
        UnitName::Kilogram,
        UnitName::Ton,
        UnitName::Pallet,
        UnitName::Percent,
        UnitName::Millimeter,
        UnitName::Megapascal,
        UnitName::Litre,
        UnitName::KgPerM3,
    ];

    /// Database / wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitName::Piece => "piece",
            UnitName::Kilogram => "kilogram",
            UnitName::Ton => "ton",
            UnitName::Pallet => "pallet",
            UnitName::Percent => "%",
            UnitName::Millimeter => "millimeter",
            UnitName::Megapascal => "megapascal",
            UnitName::Litre => "litre",
            UnitName::KgPerM3 => "kg/m3",
        }
    }

    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            UnitName::Piece => "шт",
            UnitName::Kilogram => "кг",
            UnitName::Ton => "т",
            UnitName::Pallet => "пал",
            UnitName::Percent => "%",
            UnitName::Millimeter => "мм",
            UnitName::Megapascal => "МПа",
            UnitName::Litre => "л",
            UnitName::KgPerM3 => "кг/м3",
        }
    }

    /// Parse from string, accepting the stored form and common spellings
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "piece" | "pieces" | "pcs" | "bag" | "bags" => Some(UnitName::Piece),
            "kilogram" | "kilograms" | "kg" => Some(UnitName::Kilogram),
            "ton" | "tons" | "tonne" | "tonnes" | "t" => Some(UnitName::Ton),
            "pallet" | "pallets" => Some(UnitName::Pallet),
            "%" | "percent" => Some(UnitName::Percent),
            "millimeter" | "millimetre" | "mm" => Some(UnitName::Millimeter),
            "megapascal" | "mpa" => Some(UnitName::Megapascal),
            "litre" | "liter" | "l" => Some(UnitName::Litre),
            "kg/m3" | "kg-per-m3" => Some(UnitName::KgPerM3),
            _ => None,
        }
    }

    /// The `(is_weight_based, to_kg_factor)` pair every unit of this name must carry
    pub fn required_weight_basis(&self) -> (bool, i64) {
        match self {
            UnitName::Kilogram => (true, 1),
            UnitName::Ton => (true, KG_PER_TON),
            _ => (false, 1),
        }
    }
}

impl std::fmt::Display for UnitName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a conversion to pieces does not come out whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PieceRounding {
    /// Round up to the next whole piece
    #[default]
    Ceil,
    /// Reject non-integral piece counts
    Strict,
}

impl PieceRounding {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceRounding::Ceil => "ceil",
            PieceRounding::Strict => "strict",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ceil" => Some(PieceRounding::Ceil),
            "strict" => Some(PieceRounding::Strict),
            _ => None,
        }
    }
}
