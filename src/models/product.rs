//! Product model
//!
//! Represents a catalog product. Piece-based products are sold in bags and
//! can be converted through piece and pallet units; weight-only products
//! are limited to weight units.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::validation::{ModelResult, ValidationError};

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub for_web: bool,
    pub is_piece_based: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub for_web: bool,
    #[serde(default = "default_piece_based")]
    pub is_piece_based: bool,
}

fn default_piece_based() -> bool {
    true
}

/// Data for updating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub for_web: Option<bool>,
    pub is_piece_based: Option<bool>,
}

impl Product {
    /// How the product is named in error messages
    pub fn identity(&self) -> String {
        format!("'{}' (#{})", self.name, self.id)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            for_web: row.get("for_web")?,
            is_piece_based: row.get("is_piece_based")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new product
    pub fn create(conn: &Connection, data: &ProductCreate) -> ModelResult<Self> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Product name cannot be empty").into());
        }

        conn.execute(
            r#"
            INSERT INTO products (name, title, for_web, is_piece_based)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![name, data.title.trim(), data.for_web, data.is_piece_based],
        )?;

        let id = conn.last_insert_rowid();
        let product = Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;
        tracing::info!(product_id = product.id, name = %product.name, "Created product");
        Ok(product)
    }

    /// Get a product by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List products, optionally filtered by a name/title search
    pub fn list(conn: &Connection, query: Option<&str>, limit: i64) -> DbResult<Vec<Self>> {
        let items = match query {
            Some(q) => {
                let pattern = format!("%{}%", q.trim());
                let mut stmt = conn.prepare(
                    r#"
                    SELECT * FROM products
                    WHERE name LIKE ?1 OR title LIKE ?1
                    ORDER BY name ASC
                    LIMIT ?2
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![pattern, limit], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare("SELECT * FROM products ORDER BY name ASC LIMIT ?1")?;
                let rows = stmt
                    .query_map(params![limit], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(items)
    }

    /// Count all products
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update a product
    pub fn update(conn: &Connection, id: i64, data: &ProductUpdate) -> ModelResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::new("name", "Product name cannot be empty").into());
            }
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.to_string()));
        }

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        if data.is_piece_based == Some(false) {
            let packaging: i64 = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM product_pieces WHERE product_id = ?1)
                      + (SELECT COUNT(*) FROM product_pallets WHERE product_id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            if packaging > 0 {
                return Err(ValidationError::new(
                    "is_piece_based",
                    "Clear the piece weight and pallet configuration before making the product weight-only",
                )
                .into());
            }
        }

        add_update!(title, "title");
        add_update!(for_web, "for_web");
        add_update!(is_piece_based, "is_piece_based");

        if updates.is_empty() {
            return Ok(Self::get_by_id(conn, id)?);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE products SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Ok(Self::get_by_id(conn, id)?)
    }

    /// Delete a product along with its piece and pallet configuration
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_conn;
    use crate::models::ModelError;

    fn bag(name: &str) -> ProductCreate {
        ProductCreate {
            name: name.to_string(),
            title: format!("{} 25kg", name),
            for_web: false,
            is_piece_based: true,
        }
    }

    #[test]
    fn test_create_and_get() {
        let conn = test_conn();
        let product = Product::create(&conn, &bag("  Cement M500 ")).unwrap();
        assert_eq!(product.name, "Cement M500");
        assert!(product.is_piece_based);

        let fetched = Product::get_by_id(&conn, product.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Cement M500");
        assert_eq!(fetched.to_string(), "Cement M500");
        assert_eq!(fetched.identity(), format!("'Cement M500' (#{})", product.id));
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let conn = test_conn();
        match Product::create(&conn, &bag("   ")) {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "name"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_defaults_from_json() {
        let data: ProductCreate = serde_json::from_str(r#"{"name": "Sand"}"#).unwrap();
        assert!(data.is_piece_based);
        assert!(!data.for_web);
        assert_eq!(data.title, "");
    }

    #[test]
    fn test_list_and_search() {
        let conn = test_conn();
        Product::create(&conn, &bag("Cement")).unwrap();
        Product::create(&conn, &bag("Plaster")).unwrap();
        Product::create(&conn, &bag("Tile adhesive")).unwrap();

        assert_eq!(Product::list(&conn, None, 10).unwrap().len(), 3);
        assert_eq!(Product::list(&conn, None, 2).unwrap().len(), 2);
        assert_eq!(Product::count(&conn).unwrap(), 3);

        let found = Product::list(&conn, Some("plas"), 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Plaster");
    }

    #[test]
    fn test_update() {
        let conn = test_conn();
        let product = Product::create(&conn, &bag("Cement")).unwrap();

        let updated = Product::update(
            &conn,
            product.id,
            &ProductUpdate {
                is_piece_based: Some(false),
                for_web: Some(true),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert!(!updated.is_piece_based);
        assert!(updated.for_web);
        assert_eq!(updated.name, "Cement");
    }

    #[test]
    fn test_weight_only_switch_requires_no_packaging() {
        use crate::config::PieceWeightPolicy;
        use crate::models::ProductPiece;
        use rust_decimal::Decimal;

        let conn = test_conn();
        let product = Product::create(&conn, &bag("Cement")).unwrap();
        ProductPiece::set(&conn, product.id, Decimal::from(25), &PieceWeightPolicy::default()).unwrap();

        let to_loose = ProductUpdate { is_piece_based: Some(false), ..Default::default() };
        match Product::update(&conn, product.id, &to_loose) {
            Err(ModelError::Validation(e)) => assert_eq!(e.field, "is_piece_based"),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(Product::get_by_id(&conn, product.id).unwrap().unwrap().is_piece_based);

        ProductPiece::clear(&conn, product.id).unwrap();
        let updated = Product::update(&conn, product.id, &to_loose).unwrap().unwrap();
        assert!(!updated.is_piece_based);
    }

    #[test]
    fn test_update_missing_product() {
        let conn = test_conn();
        let result = Product::update(&conn, 42, &ProductUpdate { title: Some("x".into()), ..Default::default() });
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let conn = test_conn();
        let product = Product::create(&conn, &bag("Cement")).unwrap();
        assert!(Product::delete(&conn, product.id).unwrap());
        assert!(!Product::delete(&conn, product.id).unwrap());
        assert!(Product::get_by_id(&conn, product.id).unwrap().is_none());
    }
}
