//! Warehouse model

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::validation::{ModelResult, ValidationError};

/// A warehouse holding stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub organization: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseCreate {
    pub name: String,
    pub organization: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// Data for updating a warehouse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseUpdate {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

const MAX_PHONE_LEN: usize = 20;

fn check_phone(phone: Option<&str>) -> Result<(), ValidationError> {
    match phone {
        Some(p) if p.chars().count() > MAX_PHONE_LEN => Err(ValidationError::new(
            "phone_number",
            format!("phone_number cannot exceed {} characters", MAX_PHONE_LEN),
        )),
        _ => Ok(()),
    }
}

impl Warehouse {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            organization: row.get("organization")?,
            address: row.get("address")?,
            phone_number: row.get("phone_number")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn check_name_free(conn: &Connection, name: &str, except_id: Option<i64>) -> ModelResult<()> {
        if let Some(existing) = Self::get_by_name(conn, name)? {
            if Some(existing.id) != except_id {
                return Err(ValidationError::new(
                    "name",
                    format!("Warehouse with name '{}' already exists", name),
                )
                .into());
            }
        }
        Ok(())
    }

    /// Insert a new warehouse
    pub fn create(conn: &Connection, data: &WarehouseCreate) -> ModelResult<Self> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Warehouse name cannot be empty").into());
        }
        check_phone(data.phone_number.as_deref())?;
        Self::check_name_free(conn, name, None)?;

        conn.execute(
            r#"
            INSERT INTO warehouses (name, organization, address, phone_number)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![name, data.organization, data.address, data.phone_number],
        )?;

        let id = conn.last_insert_rowid();
        let warehouse = Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;
        tracing::info!(warehouse_id = warehouse.id, name = %warehouse.name, "Created warehouse");
        Ok(warehouse)
    }

    /// Get a warehouse by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM warehouses WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(w) => Ok(Some(w)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a warehouse by its unique name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM warehouses WHERE name = ?1")?;

        match stmt.query_row([name.trim()], Self::from_row) {
            Ok(w) => Ok(Some(w)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all warehouses by name
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM warehouses ORDER BY name ASC")?;

        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Update a warehouse
    pub fn update(conn: &Connection, id: i64, data: &WarehouseUpdate) -> ModelResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::new("name", "Warehouse name cannot be empty").into());
            }
            Self::check_name_free(conn, name, Some(id))?;
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.to_string()));
        }
        check_phone(data.phone_number.as_deref())?;

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(organization, "organization");
        add_update!(address, "address");
        add_update!(phone_number, "phone_number");

        if updates.is_empty() {
            return Ok(Self::get_by_id(conn, id)?);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE warehouses SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Ok(Self::get_by_id(conn, id)?)
    }

    /// Delete a warehouse (its pallet configurations go with it)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM warehouses WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl std::fmt::Display for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            Some(ref address) => write!(f, "{} - {}", self.name, address),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::models::ModelError;

    fn north() -> WarehouseCreate {
        WarehouseCreate {
            name: "North".to_string(),
            organization: Some("Stroy LLC".to_string()),
            address: Some("1 Depot Rd".to_string()),
            phone_number: Some("+7 900 000 00 00".to_string()),
        }
    }

    #[test]
    fn test_create_and_display() {
        let conn = test_conn();
        let w = Warehouse::create(&conn, &north()).unwrap();
        assert_eq!(w.to_string(), "North - 1 Depot Rd");

        let no_address = Warehouse::create(
            &conn,
            &WarehouseCreate { name: "South".into(), organization: None, address: None, phone_number: None },
        )
        .unwrap();
        assert_eq!(no_address.to_string(), "South");
    }

    #[test]
    fn test_name_is_unique() {
        let conn = test_conn();
        Warehouse::create(&conn, &north()).unwrap();
        match Warehouse::create(&conn, &north()) {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "name"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_phone_length() {
        let conn = test_conn();
        let mut data = north();
        data.phone_number = Some("1".repeat(21));
        match Warehouse::create(&conn, &data) {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "phone_number"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_keeps_own_name() {
        let conn = test_conn();
        let w = Warehouse::create(&conn, &north()).unwrap();
        let updated = Warehouse::update(
            &conn,
            w.id,
            &WarehouseUpdate {
                name: Some("North".into()),
                address: Some("2 Depot Rd".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.address.as_deref(), Some("2 Depot Rd"));
    }

    #[test]
    fn test_update_rejects_taken_name() {
        let conn = test_conn();
        Warehouse::create(&conn, &north()).unwrap();
        let south = Warehouse::create(
            &conn,
            &WarehouseCreate { name: "South".into(), organization: None, address: None, phone_number: None },
        )
        .unwrap();

        let result = Warehouse::update(&conn, south.id, &WarehouseUpdate { name: Some("North".into()), ..Default::default() });
        assert!(matches!(result, Err(ModelError::Validation(_))));
    }

    #[test]
    fn test_list_and_delete() {
        let conn = test_conn();
        let w = Warehouse::create(&conn, &north()).unwrap();
        assert_eq!(Warehouse::list(&conn).unwrap().len(), 1);
        assert!(Warehouse::delete(&conn, w.id).unwrap());
        assert!(Warehouse::list(&conn).unwrap().is_empty());
    }
}
