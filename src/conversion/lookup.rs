//! Packaging lookups
//!
//! The two read-only queries the converter makes against catalog storage:
//! the weight of one piece of a product, and how many pieces fit on a pallet
//! at a warehouse.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::DbResult;
use crate::models::{ProductPallet, ProductPiece};

/// Source of per-product packaging configuration
pub trait PackagingLookup {
    /// Weight in kilograms of one piece, if configured
    fn piece_weight_kg(&self, product_id: i64) -> DbResult<Option<Decimal>>;

    /// Pieces per pallet for the product at the warehouse, if configured
    fn items_per_pallet(&self, product_id: i64, warehouse_id: i64) -> DbResult<Option<u32>>;
}

impl PackagingLookup for Connection {
    fn piece_weight_kg(&self, product_id: i64) -> DbResult<Option<Decimal>> {
        Ok(ProductPiece::get(self, product_id)?.map(|p| p.piece_weight_kg))
    }

    fn items_per_pallet(&self, product_id: i64, warehouse_id: i64) -> DbResult<Option<u32>> {
        Ok(ProductPallet::get(self, product_id, warehouse_id)?.map(|p| p.items_per_pallet))
    }
}

/// Packaging configuration held in memory, e.g. a snapshot loaded once for a batch
#[derive(Debug, Clone, Default)]
pub struct StaticPackaging {
    piece_weights: HashMap<i64, Decimal>,
    pallets: HashMap<(i64, i64), u32>,
}

impl StaticPackaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_piece_weight(mut self, product_id: i64, kg: Decimal) -> Self {
        self.piece_weights.insert(product_id, kg);
        self
    }

    pub fn with_pallet(mut self, product_id: i64, warehouse_id: i64, items: u32) -> Self {
        self.pallets.insert((product_id, warehouse_id), items);
        self
    }
}

impl PackagingLookup for StaticPackaging {
    fn piece_weight_kg(&self, product_id: i64) -> DbResult<Option<Decimal>> {
        Ok(self.piece_weights.get(&product_id).copied())
    }

    fn items_per_pallet(&self, product_id: i64, warehouse_id: i64) -> DbResult<Option<u32>> {
        Ok(self.pallets.get(&(product_id, warehouse_id)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PieceWeightPolicy;
    use crate::db::test_conn;
    use crate::models::{Product, ProductCreate, ProductPalletSet, Warehouse, WarehouseCreate};

    #[test]
    fn test_static_lookup() {
        let lookup = StaticPackaging::new()
            .with_piece_weight(1, Decimal::from(25))
            .with_pallet(1, 7, 40);

        assert_eq!(lookup.piece_weight_kg(1).unwrap(), Some(Decimal::from(25)));
        assert_eq!(lookup.piece_weight_kg(2).unwrap(), None);
        assert_eq!(lookup.items_per_pallet(1, 7).unwrap(), Some(40));
        assert_eq!(lookup.items_per_pallet(1, 8).unwrap(), None);
    }

    #[test]
    fn test_connection_lookup() {
        let conn = test_conn();
        let product = Product::create(
            &conn,
            &ProductCreate { name: "Cement".into(), title: String::new(), for_web: false, is_piece_based: true },
        )
        .unwrap();
        let warehouse = Warehouse::create(
            &conn,
            &WarehouseCreate { name: "North".into(), organization: None, address: None, phone_number: None },
        )
        .unwrap();

        assert_eq!(conn.piece_weight_kg(product.id).unwrap(), None);
        assert_eq!(conn.items_per_pallet(product.id, warehouse.id).unwrap(), None);

        ProductPiece::set(&conn, product.id, Decimal::from(25), &PieceWeightPolicy::default()).unwrap();
        ProductPallet::set(
            &conn,
            &ProductPalletSet { product_id: product.id, warehouse_id: warehouse.id, items_per_pallet: 40 },
        )
        .unwrap();

        assert_eq!(conn.piece_weight_kg(product.id).unwrap(), Some(Decimal::from(25)));
        assert_eq!(conn.items_per_pallet(product.id, warehouse.id).unwrap(), Some(40));
    }
}
