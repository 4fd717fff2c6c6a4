//! Data models
//!
//! Rust structs representing catalog entities.

mod product;
mod product_pallet;
mod product_piece;
mod unit;
mod validation;
mod warehouse;

pub use product::{Product, ProductCreate, ProductUpdate};
pub use product_pallet::{ProductPallet, ProductPalletDetail, ProductPalletSet};
pub use product_piece::ProductPiece;
pub use unit::{Unit, UnitUpdate};
pub use validation::{ModelError, ModelResult, ValidationError};
pub use warehouse::{Warehouse, WarehouseCreate, WarehouseUpdate};
