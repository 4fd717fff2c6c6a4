//! Unit model
//!
//! Units of measure. The set of names is closed and seeded by migration; only
//! the weight basis can be edited, and it is validated against the name.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::conversion::UnitName;
use crate::db::DbResult;
use super::validation::{ModelResult, ValidationError};

/// A unit of measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub name: UnitName,
    pub is_weight_based: bool,
    pub to_kg_factor: i64,
}

/// Data for updating a unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitUpdate {
    pub is_weight_based: Option<bool>,
    pub to_kg_factor: Option<i64>,
}

impl Unit {
    /// Build the canonical unit for a name (id 0, not persisted)
    pub fn canonical(name: UnitName) -> Self {
        let (is_weight_based, to_kg_factor) = name.required_weight_basis();
        Self {
            id: 0,
            name,
            is_weight_based,
            to_kg_factor,
        }
    }

    /// Check the weight basis against the rules for this unit's name
    pub fn validate(
        name: UnitName,
        is_weight_based: bool,
        to_kg_factor: i64,
    ) -> Result<(), ValidationError> {
        let (required_weight_based, required_factor) = name.required_weight_basis();

        if is_weight_based != required_weight_based {
            let message = if required_weight_based {
                format!("{} must be weight-based", name)
            } else {
                format!("{} must NOT be weight-based", name)
            };
            return Err(ValidationError::new("is_weight_based", message));
        }

        if to_kg_factor != required_factor {
            let message = if required_weight_based {
                format!("{} must have to_kg_factor={}", name, required_factor)
            } else {
                format!("{} must keep to_kg_factor=1", name)
            };
            return Err(ValidationError::new("to_kg_factor", message));
        }

        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw: String = row.get("name")?;
        let name = UnitName::from_str(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown unit name '{}'", raw).into(),
            )
        })?;

        Ok(Self {
            id: row.get("id")?,
            name,
            is_weight_based: row.get("is_weight_based")?,
            to_kg_factor: row.get("to_kg_factor")?,
        })
    }

    /// Get a unit by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM units WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a unit by its name
    pub fn get_by_name(conn: &Connection, name: UnitName) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM units WHERE name = ?1")?;

        match stmt.query_row([name.as_str()], Self::from_row) {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all units
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM units ORDER BY id ASC")?;

        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }

    /// Update a unit's weight basis, validating the merged result
    pub fn update(conn: &Connection, id: i64, data: &UnitUpdate) -> ModelResult<Option<Self>> {
        let Some(current) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };

        let is_weight_based = data.is_weight_based.unwrap_or(current.is_weight_based);
        let to_kg_factor = data.to_kg_factor.unwrap_or(current.to_kg_factor);
        Self::validate(current.name, is_weight_based, to_kg_factor)?;

        conn.execute(
            "UPDATE units SET is_weight_based = ?1, to_kg_factor = ?2 WHERE id = ?3",
            params![is_weight_based, to_kg_factor, id],
        )?;

        Ok(Self::get_by_id(conn, id)?)
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.name.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::models::ModelError;

    #[test]
    fn test_validate_kilogram() {
        assert!(Unit::validate(UnitName::Kilogram, true, 1).is_ok());

        let err = Unit::validate(UnitName::Kilogram, false, 1).unwrap_err();
        assert_eq!(err.field, "is_weight_based");

        let err = Unit::validate(UnitName::Kilogram, true, 10).unwrap_err();
        assert_eq!(err.field, "to_kg_factor");
    }

    #[test]
    fn test_validate_ton() {
        assert!(Unit::validate(UnitName::Ton, true, 1000).is_ok());
        assert_eq!(Unit::validate(UnitName::Ton, false, 1000).unwrap_err().field, "is_weight_based");
        assert_eq!(Unit::validate(UnitName::Ton, true, 10).unwrap_err().field, "to_kg_factor");
    }

    #[test]
    fn test_validate_non_weight_units() {
        for name in [UnitName::Piece, UnitName::Pallet, UnitName::Percent, UnitName::Litre] {
            assert!(Unit::validate(name, false, 1).is_ok());
            assert_eq!(Unit::validate(name, true, 1).unwrap_err().field, "is_weight_based");
            assert_eq!(Unit::validate(name, false, 5).unwrap_err().field, "to_kg_factor");
        }
    }

    #[test]
    fn test_seeded_units_satisfy_invariant() {
        let conn = test_conn();
        let units = Unit::list(&conn).unwrap();
        assert_eq!(units.len(), UnitName::ALL.len());
        for unit in units {
            assert!(Unit::validate(unit.name, unit.is_weight_based, unit.to_kg_factor).is_ok());
            assert_eq!(unit, Unit { id: unit.id, ..Unit::canonical(unit.name) });
        }
    }

    #[test]
    fn test_get_by_name() {
        let conn = test_conn();
        let ton = Unit::get_by_name(&conn, UnitName::Ton).unwrap().unwrap();
        assert!(ton.is_weight_based);
        assert_eq!(ton.to_kg_factor, 1000);
        assert_eq!(ton.to_string(), "ton (т)");
    }

    #[test]
    fn test_update_rejects_invalid_factor() {
        let conn = test_conn();
        let kg = Unit::get_by_name(&conn, UnitName::Kilogram).unwrap().unwrap();

        let result = Unit::update(&conn, kg.id, &UnitUpdate { to_kg_factor: Some(10), ..Default::default() });
        match result {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "to_kg_factor"),
            other => panic!("expected validation error, got {:?}", other),
        }

        let unchanged = Unit::get_by_id(&conn, kg.id).unwrap().unwrap();
        assert_eq!(unchanged.to_kg_factor, 1);
    }

    #[test]
    fn test_update_missing_unit() {
        let conn = test_conn();
        let result = Unit::update(&conn, 9999, &UnitUpdate::default()).unwrap();
        assert!(result.is_none());
    }
}
