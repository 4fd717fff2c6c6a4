//! Conversion MCP Tool
//!
//! Resolves product and units from the catalog and runs the unit converter.
//! Domain failures come back as a structured response, not a tool error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::conversion::{
    decimal_from_f64, ConversionError, ConvertOptions, PieceRounding, UnitConverter, UnitName,
};
use crate::db::Database;
use crate::models::{Product, Unit};

use super::units::parse_unit_name;

/// Input for convert_quantity
#[derive(Debug, Clone)]
pub struct ConvertQuantityRequest {
    pub product_id: i64,
    pub quantity: f64,
    pub from_unit: String,
    pub to_unit: String,
    pub warehouse_id: Option<i64>,
    pub piece_rounding: Option<String>,
}

/// Successful conversion
#[derive(Debug, Serialize)]
pub struct ConvertQuantityResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: f64,
    pub from_unit: UnitName,
    pub to_unit: UnitName,
    pub result: f64,
    /// Exact decimal result, as a string
    pub exact_result: Decimal,
    pub warehouse_id: Option<i64>,
    pub piece_rounding: PieceRounding,
}

/// Conversion the catalog could not carry out
#[derive(Debug, Serialize)]
pub struct ConvertFailedResponse {
    pub error_kind: &'static str,
    pub error: String,
    pub product_id: i64,
    pub product_name: String,
    pub unit: Option<UnitName>,
}

fn parse_rounding(s: Option<&str>) -> Result<PieceRounding, String> {
    match s {
        None => Ok(PieceRounding::default()),
        Some(s) => PieceRounding::from_str(s)
            .ok_or_else(|| format!("Unknown piece_rounding '{}'. Use 'ceil' or 'strict'", s)),
    }
}

/// Convert a quantity of a product between two units
pub fn convert_quantity(
    db: &Database,
    req: ConvertQuantityRequest,
) -> Result<Result<ConvertQuantityResponse, ConvertFailedResponse>, String> {
    let from_name = parse_unit_name(&req.from_unit)?;
    let to_name = parse_unit_name(&req.to_unit)?;
    let piece_rounding = parse_rounding(req.piece_rounding.as_deref())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = Product::get_by_id(&conn, req.product_id)
        .map_err(|e| format!("Failed to get product: {}", e))?
        .ok_or_else(|| format!("Product not found with id: {}", req.product_id))?;

    let load_unit = |name: UnitName| -> Result<Unit, String> {
        Unit::get_by_name(&conn, name)
            .map_err(|e| format!("Failed to get unit: {}", e))?
            .ok_or_else(|| format!("Unit not found: {}", name))
    };
    let from = load_unit(from_name)?;
    let to = load_unit(to_name)?;

    let options = ConvertOptions {
        warehouse_id: req.warehouse_id,
        piece_rounding,
    };

    let converter = UnitConverter::new(&*conn);
    let outcome = decimal_from_f64(req.quantity)
        .and_then(|q| converter.convert_decimal(&product, q, &from, &to, options));

    match outcome {
        Ok(exact) => {
            let result = exact
                .to_f64()
                .ok_or_else(|| format!("Result {} does not fit a float", exact))?;
            Ok(Ok(ConvertQuantityResponse {
                product_id: product.id,
                product_name: product.name,
                quantity: req.quantity,
                from_unit: from_name,
                to_unit: to_name,
                result,
                exact_result: exact,
                warehouse_id: req.warehouse_id,
                piece_rounding,
            }))
        }
        Err(ConversionError::Storage(e)) => Err(format!("Database error: {}", e)),
        Err(e) => {
            tracing::warn!(
                product_id = product.id,
                from = %from_name,
                to = %to_name,
                kind = e.kind(),
                "Conversion rejected: {}",
                e
            );
            Ok(Err(ConvertFailedResponse {
                error_kind: e.kind(),
                error: e.to_string(),
                product_id: product.id,
                unit: e.unit(),
                product_name: product.name,
            }))
        }
    }
}
