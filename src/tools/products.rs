//! Product MCP Tools
//!
//! Catalog management for products and their piece configuration.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::PieceWeightPolicy;
use crate::conversion::decimal_from_f64;
use crate::db::Database;
use crate::models::{
    Product, ProductCreate, ProductPallet, ProductPalletDetail, ProductPiece, ProductUpdate,
};

/// Response for add_product
#[derive(Debug, Serialize)]
pub struct AddProductResponse {
    pub id: i64,
    pub name: String,
    pub is_piece_based: bool,
    pub piece_weight_kg: Option<Decimal>,
    pub created_at: String,
}

/// Summary of a product for list results
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub for_web: bool,
    pub is_piece_based: bool,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            title: p.title.clone(),
            for_web: p.for_web,
            is_piece_based: p.is_piece_based,
        }
    }
}

/// Full product detail with packaging configuration
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub for_web: bool,
    pub is_piece_based: bool,
    pub piece_weight_kg: Option<Decimal>,
    pub pallets: Vec<ProductPalletDetail>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub items: Vec<ProductSummary>,
    pub count: usize,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdateProductResponse {
    pub success: bool,
    pub is_piece_based: bool,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteProductResponse {
    pub success: bool,
    pub deleted_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PieceWeightResponse {
    pub product_id: i64,
    pub piece_weight_kg: Option<Decimal>,
    pub changed: bool,
}

fn parse_piece_weight(kg: f64) -> Result<Decimal, String> {
    decimal_from_f64(kg).map_err(|e| format!("Invalid piece weight: {}", e))
}

/// Add a new product, optionally with its piece weight
pub fn add_product(
    db: &Database,
    data: ProductCreate,
    piece_weight_kg: Option<f64>,
    policy: &PieceWeightPolicy,
) -> Result<AddProductResponse, String> {
    let weight = piece_weight_kg.map(parse_piece_weight).transpose()?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| format!("Database error: {}", e))?;

    let product = Product::create(&tx, &data).map_err(|e| format!("Failed to create product: {}", e))?;

    let piece = match weight {
        Some(w) => Some(
            ProductPiece::set(&tx, product.id, w, policy)
                .map_err(|e| format!("Failed to set piece weight: {}", e))?,
        ),
        None => None,
    };

    tx.commit().map_err(|e| format!("Database error: {}", e))?;

    Ok(AddProductResponse {
        id: product.id,
        name: product.name,
        is_piece_based: product.is_piece_based,
        piece_weight_kg: piece.map(|p| p.piece_weight_kg),
        created_at: product.created_at,
    })
}

/// Get a product with its packaging configuration
pub fn get_product(db: &Database, id: i64) -> Result<Option<ProductDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let Some(product) = Product::get_by_id(&conn, id).map_err(|e| format!("Failed to get product: {}", e))? else {
        return Ok(None);
    };

    let piece = ProductPiece::get(&conn, id).map_err(|e| format!("Failed to get piece weight: {}", e))?;
    let pallets = ProductPallet::list_for_product(&conn, id)
        .map_err(|e| format!("Failed to get pallet configuration: {}", e))?;

    Ok(Some(ProductDetail {
        id: product.id,
        name: product.name,
        title: product.title,
        for_web: product.for_web,
        is_piece_based: product.is_piece_based,
        piece_weight_kg: piece.map(|p| p.piece_weight_kg),
        pallets,
        created_at: product.created_at,
        updated_at: product.updated_at,
    }))
}

/// List products with an optional name search
pub fn list_products(db: &Database, query: Option<&str>, limit: i64) -> Result<ListProductsResponse, String> {
    let limit = limit.clamp(1, 200);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let products = Product::list(&conn, query, limit).map_err(|e| format!("Failed to list products: {}", e))?;
    let total = Product::count(&conn).map_err(|e| format!("Failed to count products: {}", e))?;

    let items: Vec<ProductSummary> = products.iter().map(ProductSummary::from).collect();
    let count = items.len();
    Ok(ListProductsResponse { items, count, total })
}

/// Update a product
pub fn update_product(db: &Database, id: i64, data: ProductUpdate) -> Result<UpdateProductResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Product::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update product: {}", e))?
        .ok_or_else(|| format!("Product not found with id: {}", id))?;

    Ok(UpdateProductResponse {
        success: true,
        is_piece_based: updated.is_piece_based,
        updated_at: updated.updated_at,
    })
}

/// Delete a product and its packaging configuration
pub fn delete_product(db: &Database, id: i64) -> Result<DeleteProductResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Product::delete(&conn, id).map_err(|e| format!("Failed to delete product: {}", e))?;
    if !deleted {
        return Err(format!("Product not found with id: {}", id));
    }
    tracing::info!(product_id = id, "Deleted product");

    Ok(DeleteProductResponse {
        success: true,
        deleted_id: id,
    })
}

/// Set the weight of one piece of a product
pub fn set_piece_weight(
    db: &Database,
    product_id: i64,
    piece_weight_kg: f64,
    policy: &PieceWeightPolicy,
) -> Result<PieceWeightResponse, String> {
    let weight = parse_piece_weight(piece_weight_kg)?;
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let piece = ProductPiece::set(&conn, product_id, weight, policy)
        .map_err(|e| format!("Failed to set piece weight: {}", e))?;

    Ok(PieceWeightResponse {
        product_id,
        piece_weight_kg: Some(piece.piece_weight_kg),
        changed: true,
    })
}

/// Remove the piece weight of a product
pub fn clear_piece_weight(db: &Database, product_id: i64) -> Result<PieceWeightResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let changed = ProductPiece::clear(&conn, product_id)
        .map_err(|e| format!("Failed to clear piece weight: {}", e))?;

    Ok(PieceWeightResponse {
        product_id,
        piece_weight_kg: None,
        changed,
    })
}
