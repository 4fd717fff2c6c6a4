//! Product pallet configuration
//!
//! How many pieces of a product fit on one pallet at a given warehouse.
//! Keyed by (product, warehouse).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::validation::{ModelResult, ValidationError};
use super::{Product, Warehouse};

/// Items per pallet for a product at a warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPallet {
    pub id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub items_per_pallet: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for setting a pallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPalletSet {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub items_per_pallet: i64,
}

/// Pallet configuration joined with its warehouse name
#[derive(Debug, Clone, Serialize)]
pub struct ProductPalletDetail {
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub items_per_pallet: u32,
}

impl ProductPallet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            warehouse_id: row.get("warehouse_id")?,
            items_per_pallet: row.get("items_per_pallet")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get the configuration for a (product, warehouse) pair
    pub fn get(conn: &Connection, product_id: i64, warehouse_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM product_pallets WHERE product_id = ?1 AND warehouse_id = ?2",
        )?;

        match stmt.query_row(params![product_id, warehouse_id], Self::from_row) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or update the configuration for a (product, warehouse) pair
    pub fn set(conn: &Connection, data: &ProductPalletSet) -> ModelResult<Self> {
        if data.items_per_pallet <= 0 || data.items_per_pallet > u32::MAX as i64 {
            return Err(ValidationError::new(
                "items_per_pallet",
                "items_per_pallet must be a positive integer",
            )
            .into());
        }

        let product = Product::get_by_id(conn, data.product_id)?.ok_or_else(|| {
            ValidationError::new("product_id", format!("Product not found with id: {}", data.product_id))
        })?;
        if !product.is_piece_based {
            return Err(ValidationError::new(
                "product_id",
                format!("Product {} is not piece-based", product.identity()),
            )
            .into());
        }

        if Warehouse::get_by_id(conn, data.warehouse_id)?.is_none() {
            return Err(ValidationError::new(
                "warehouse_id",
                format!("Warehouse not found with id: {}", data.warehouse_id),
            )
            .into());
        }

        conn.execute(
            r#"
            INSERT INTO product_pallets (product_id, warehouse_id, items_per_pallet)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id, warehouse_id) DO UPDATE SET
                items_per_pallet = excluded.items_per_pallet,
                updated_at = datetime('now')
            "#,
            params![data.product_id, data.warehouse_id, data.items_per_pallet],
        )?;

        tracing::info!(
            product_id = data.product_id,
            warehouse_id = data.warehouse_id,
            items_per_pallet = data.items_per_pallet,
            "Set pallet configuration"
        );

        Ok(Self::get(conn, data.product_id, data.warehouse_id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?)
    }

    /// Remove the configuration. Returns Ok(false) if none existed
    pub fn remove(conn: &Connection, product_id: i64, warehouse_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM product_pallets WHERE product_id = ?1 AND warehouse_id = ?2",
            params![product_id, warehouse_id],
        )?;
        Ok(rows > 0)
    }

    /// List configurations of a product with warehouse names
    pub fn list_for_product(conn: &Connection, product_id: i64) -> DbResult<Vec<ProductPalletDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT pp.warehouse_id, w.name AS warehouse_name, pp.items_per_pallet
            FROM product_pallets pp
            INNER JOIN warehouses w ON w.id = pp.warehouse_id
            WHERE pp.product_id = ?1
            ORDER BY w.name ASC
            "#,
        )?;

        let items = stmt
            .query_map([product_id], |row| {
                Ok(ProductPalletDetail {
                    warehouse_id: row.get("warehouse_id")?,
                    warehouse_name: row.get("warehouse_name")?,
                    items_per_pallet: row.get("items_per_pallet")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }
}
