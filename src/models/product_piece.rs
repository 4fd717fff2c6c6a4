//! Piece configuration
//!
//! One-to-one with a product: the weight of a single piece (bag) in kilograms.

use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PieceWeightPolicy;
use crate::db::{DbError, DbResult};
use super::validation::{ModelResult, ValidationError};
use super::Product;

/// Weight of one piece of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPiece {
    pub product_id: i64,
    pub piece_weight_kg: Decimal,
    pub updated_at: String,
}

impl ProductPiece {
    fn from_row(row: &Row) -> rusqlite::Result<(i64, String, String)> {
        Ok((
            row.get("product_id")?,
            row.get("piece_weight_kg")?,
            row.get("updated_at")?,
        ))
    }

    fn parse(raw: (i64, String, String)) -> DbResult<Self> {
        let (product_id, weight, updated_at) = raw;
        let piece_weight_kg = Decimal::from_str(&weight).map_err(|_| DbError::CorruptValue {
            column: "product_pieces.piece_weight_kg",
            value: weight.clone(),
        })?;
        Ok(Self {
            product_id,
            piece_weight_kg,
            updated_at,
        })
    }

    /// Get the piece configuration of a product
    pub fn get(conn: &Connection, product_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM product_pieces WHERE product_id = ?1")?;

        match stmt.query_row([product_id], Self::from_row) {
            Ok(raw) => Ok(Some(Self::parse(raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set (insert or replace) the piece weight of a product
    pub fn set(
        conn: &Connection,
        product_id: i64,
        piece_weight_kg: Decimal,
        policy: &PieceWeightPolicy,
    ) -> ModelResult<Self> {
        let product = Product::get_by_id(conn, product_id)?.ok_or_else(|| {
            ValidationError::new("product_id", format!("Product not found with id: {}", product_id))
        })?;
        if !product.is_piece_based {
            return Err(ValidationError::new(
                "product_id",
                format!("Product {} is not piece-based", product.identity()),
            )
            .into());
        }

        policy
            .check(piece_weight_kg)
            .map_err(|message| ValidationError::new("piece_weight_kg", message))?;

        conn.execute(
            r#"
            INSERT INTO product_pieces (product_id, piece_weight_kg)
            VALUES (?1, ?2)
            ON CONFLICT(product_id) DO UPDATE SET
                piece_weight_kg = excluded.piece_weight_kg,
                updated_at = datetime('now')
            "#,
            params![product_id, piece_weight_kg.normalize().to_string()],
        )?;

        tracing::info!(product_id, piece_weight_kg = %piece_weight_kg, "Set piece weight");

        Ok(Self::get(conn, product_id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?)
    }

    /// Remove the piece configuration. Returns Ok(false) if none was set
    pub fn clear(conn: &Connection, product_id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM product_pieces WHERE product_id = ?1", [product_id])?;
        Ok(rows > 0)
    }
}
