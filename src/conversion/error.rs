//! Conversion error taxonomy

use thiserror::Error;

use crate::db::DbError;

use super::units::UnitName;

/// Why a conversion could not be carried out
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unit '{unit}' is not supported for product {product}")]
    UnsupportedUnitForProduct { unit: UnitName, product: String },

    #[error("Piece weight is not configured for product {product}")]
    MissingPieceConfiguration { product: String },

    #[error("Items per pallet is not configured for product {product} at warehouse {warehouse_id}")]
    MissingPalletConfiguration { product: String, warehouse_id: i64 },

    #[error("A warehouse is required for '{unit}' conversion")]
    WarehouseRequired { unit: UnitName },

    #[error("Unsupported unit for conversion: '{unit}'")]
    UnsupportedUnitKind { unit: UnitName },

    #[error("Conversion to '{unit}' gives a non-integer result: {value}")]
    NonIntegerPieceResult { unit: UnitName, value: String },

    #[error("Packaging configuration of product {product} is invalid: {reason}")]
    InvalidPackagingConfiguration { product: String, reason: String },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Arithmetic overflow converting to '{unit}'")]
    ArithmeticOverflow { unit: UnitName },

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl ConversionError {
    /// Stable key callers can match on
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::UnsupportedUnitForProduct { .. } => "unsupported_unit_for_product",
            ConversionError::MissingPieceConfiguration { .. } => "missing_piece_configuration",
            ConversionError::MissingPalletConfiguration { .. } => "missing_pallet_configuration",
            ConversionError::WarehouseRequired { .. } => "warehouse_required",
            ConversionError::UnsupportedUnitKind { .. } => "unsupported_unit_kind",
            ConversionError::NonIntegerPieceResult { .. } => "non_integer_piece_result",
            ConversionError::InvalidPackagingConfiguration { .. } => "invalid_packaging_configuration",
            ConversionError::InvalidQuantity(_) => "invalid_quantity",
            ConversionError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            ConversionError::Storage(_) => "storage",
        }
    }

    /// The unit the failure concerns, when there is one
    pub fn unit(&self) -> Option<UnitName> {
        match self {
            ConversionError::UnsupportedUnitForProduct { unit, .. }
            | ConversionError::WarehouseRequired { unit }
            | ConversionError::UnsupportedUnitKind { unit }
            | ConversionError::NonIntegerPieceResult { unit, .. }
            | ConversionError::ArithmeticOverflow { unit } => Some(*unit),
            _ => None,
        }
    }
}

/// Result type for conversions
pub type ConversionResult<T> = Result<T, ConversionError>;
