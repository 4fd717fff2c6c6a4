//! Warehouse MCP Tools
//!
//! Warehouses and the per-warehouse pallet configuration of products.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    Product, ProductPallet, ProductPalletDetail, ProductPalletSet, Warehouse, WarehouseCreate, WarehouseUpdate,
};

#[derive(Debug, Serialize)]
pub struct AddWarehouseResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListWarehousesResponse {
    pub items: Vec<Warehouse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UpdateWarehouseResponse {
    pub success: bool,
    pub display_name: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteWarehouseResponse {
    pub success: bool,
    pub deleted_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductPalletResponse {
    pub product_id: i64,
    pub warehouse_id: i64,
    pub items_per_pallet: Option<u32>,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ListProductPalletsResponse {
    pub product_id: i64,
    pub product_name: String,
    pub pallets: Vec<ProductPalletDetail>,
}

/// Add a warehouse
pub fn add_warehouse(db: &Database, data: WarehouseCreate) -> Result<AddWarehouseResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let warehouse = Warehouse::create(&conn, &data).map_err(|e| format!("Failed to create warehouse: {}", e))?;

    Ok(AddWarehouseResponse {
        id: warehouse.id,
        name: warehouse.name,
        created_at: warehouse.created_at,
    })
}

/// Get a warehouse by ID
pub fn get_warehouse(db: &Database, id: i64) -> Result<Option<Warehouse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Warehouse::get_by_id(&conn, id).map_err(|e| format!("Failed to get warehouse: {}", e))
}

/// List all warehouses
pub fn list_warehouses(db: &Database) -> Result<ListWarehousesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let items = Warehouse::list(&conn).map_err(|e| format!("Failed to list warehouses: {}", e))?;
    let total = items.len();
    Ok(ListWarehousesResponse { items, total })
}

/// Update a warehouse
pub fn update_warehouse(db: &Database, id: i64, data: WarehouseUpdate) -> Result<UpdateWarehouseResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Warehouse::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update warehouse: {}", e))?
        .ok_or_else(|| format!("Warehouse not found with id: {}", id))?;

    Ok(UpdateWarehouseResponse {
        success: true,
        display_name: updated.to_string(),
        updated_at: updated.updated_at,
    })
}

/// Delete a warehouse and the pallet configurations tied to it
pub fn delete_warehouse(db: &Database, id: i64) -> Result<DeleteWarehouseResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Warehouse::delete(&conn, id).map_err(|e| format!("Failed to delete warehouse: {}", e))?;
    if !deleted {
        return Err(format!("Warehouse not found with id: {}", id));
    }
    tracing::info!(warehouse_id = id, "Deleted warehouse");

    Ok(DeleteWarehouseResponse {
        success: true,
        deleted_id: id,
    })
}

/// Set how many pieces of a product fit on a pallet at a warehouse
pub fn set_product_pallet(db: &Database, data: ProductPalletSet) -> Result<ProductPalletResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let pallet = ProductPallet::set(&conn, &data).map_err(|e| format!("Failed to set pallet configuration: {}", e))?;

    Ok(ProductPalletResponse {
        product_id: pallet.product_id,
        warehouse_id: pallet.warehouse_id,
        items_per_pallet: Some(pallet.items_per_pallet),
        changed: true,
    })
}

/// Remove the pallet configuration of a product at a warehouse
pub fn remove_product_pallet(db: &Database, product_id: i64, warehouse_id: i64) -> Result<ProductPalletResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let changed = ProductPallet::remove(&conn, product_id, warehouse_id)
        .map_err(|e| format!("Failed to remove pallet configuration: {}", e))?;

    Ok(ProductPalletResponse {
        product_id,
        warehouse_id,
        items_per_pallet: None,
        changed,
    })
}

/// List the pallet configuration of a product across warehouses
pub fn list_product_pallets(db: &Database, product_id: i64) -> Result<ListProductPalletsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let product = Product::get_by_id(&conn, product_id)
        .map_err(|e| format!("Failed to get product: {}", e))?
        .ok_or_else(|| format!("Product not found with id: {}", product_id))?;
    let pallets = ProductPallet::list_for_product(&conn, product_id)
        .map_err(|e| format!("Failed to list pallet configuration: {}", e))?;

    Ok(ListProductPalletsResponse {
        product_id,
        product_name: product.name,
        pallets,
    })
}
