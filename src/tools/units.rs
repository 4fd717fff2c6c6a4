//! Unit MCP Tools

use serde::Serialize;

use crate::conversion::UnitName;
use crate::db::Database;
use crate::models::{Unit, UnitUpdate};

/// A unit as shown to tool callers
#[derive(Debug, Serialize)]
pub struct UnitSummary {
    pub id: i64,
    pub name: UnitName,
    pub label: &'static str,
    pub is_weight_based: bool,
    pub to_kg_factor: i64,
    /// Whether the unit can take part in a conversion
    pub convertible: bool,
}

impl From<&Unit> for UnitSummary {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name,
            label: unit.name.label(),
            is_weight_based: unit.is_weight_based,
            to_kg_factor: unit.to_kg_factor,
            convertible: unit.is_weight_based
                || matches!(unit.name, UnitName::Piece | UnitName::Pallet),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListUnitsResponse {
    pub items: Vec<UnitSummary>,
    pub total: usize,
}

/// Parse a unit name, listing the valid names on failure
pub fn parse_unit_name(name: &str) -> Result<UnitName, String> {
    UnitName::from_str(name).ok_or_else(|| {
        let valid: Vec<&str> = UnitName::ALL.iter().map(|u| u.as_str()).collect();
        format!("Unknown unit '{}'. Valid units: {}", name, valid.join(", "))
    })
}

/// List all units
pub fn list_units(db: &Database) -> Result<ListUnitsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let units = Unit::list(&conn).map_err(|e| format!("Failed to list units: {}", e))?;

    let items: Vec<UnitSummary> = units.iter().map(UnitSummary::from).collect();
    let total = items.len();
    Ok(ListUnitsResponse { items, total })
}

/// Get a unit by name
pub fn get_unit(db: &Database, name: &str) -> Result<Option<UnitSummary>, String> {
    let name = parse_unit_name(name)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let unit = Unit::get_by_name(&conn, name).map_err(|e| format!("Failed to get unit: {}", e))?;
    Ok(unit.as_ref().map(UnitSummary::from))
}

/// Update a unit's weight basis (validated against the unit's name)
pub fn update_unit(db: &Database, name: &str, data: UnitUpdate) -> Result<UnitSummary, String> {
    let name = parse_unit_name(name)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let unit = Unit::get_by_name(&conn, name)
        .map_err(|e| format!("Failed to get unit: {}", e))?
        .ok_or_else(|| format!("Unit not found: {}", name))?;

    let updated = Unit::update(&conn, unit.id, &data)
        .map_err(|e| format!("Failed to update unit: {}", e))?
        .ok_or_else(|| format!("Unit not found: {}", name))?;

    Ok(UnitSummary::from(&updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_name_error_lists_units() {
        let err = parse_unit_name("furlong").unwrap_err();
        assert!(err.contains("furlong"));
        assert!(err.contains("kilogram"));
        assert!(err.contains("kg/m3"));
    }

    #[test]
    fn test_convertible_flag() {
        assert!(UnitSummary::from(&Unit::canonical(UnitName::Ton)).convertible);
        assert!(UnitSummary::from(&Unit::canonical(UnitName::Pallet)).convertible);
        assert!(!UnitSummary::from(&Unit::canonical(UnitName::Millimeter)).convertible);
    }
}
