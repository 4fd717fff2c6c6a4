//! Catalog MCP Server Implementation
//!
//! Implements the MCP server with all catalog tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::PieceWeightPolicy;
use crate::db::Database;
use crate::models::{ProductCreate, ProductPalletSet, ProductUpdate, UnitUpdate, WarehouseCreate, WarehouseUpdate};
use crate::tools::convert::{self, ConvertQuantityRequest};
use crate::tools::products;
use crate::tools::status::StatusTracker;
use crate::tools::units;
use crate::tools::warehouses;

/// Catalog MCP Service
#[derive(Clone)]
pub struct CatalogService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    piece_weights: Arc<PieceWeightPolicy>,
    tool_router: ToolRouter<CatalogService>,
}

impl CatalogService {
    pub fn new(database_path: PathBuf, database: Database, piece_weights: PieceWeightPolicy) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            piece_weights: Arc::new(piece_weights),
            tool_router: Self::tool_router(),
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(entity: &str, id: impl std::fmt::Display) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": "{}"}}"#,
        entity, id
    ))]))
}

// ============================================================================
// Unit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUnitParams {
    /// Unit name: piece, kilogram, ton, pallet, %, millimeter, megapascal, litre, kg/m3
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUnitParams {
    /// Unit name
    pub name: String,
    /// Whether the unit is weight-based (only kilogram and ton may be)
    pub is_weight_based: Option<bool>,
    /// Multiplier to kilograms (kilogram=1, ton=1000, others=1)
    pub to_kg_factor: Option<i64>,
}

// ============================================================================
// Product Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddProductParams {
    /// Product name
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Show on the website (default false)
    #[serde(default)]
    pub for_web: bool,
    /// Sold in pieces/bags (default true). Weight-only products convert between kg and tons only
    #[serde(default = "default_true")]
    pub is_piece_based: bool,
    /// Weight of one piece in kg (e.g. 25)
    pub piece_weight_kg: Option<f64>,
}

fn default_true() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProductIdParams {
    /// Product ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListProductsParams {
    /// Search in name and title (optional)
    pub query: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProductParams {
    /// Product ID
    pub id: i64,
    pub name: Option<String>,
    pub title: Option<String>,
    pub for_web: Option<bool>,
    pub is_piece_based: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPieceWeightParams {
    /// Product ID
    pub product_id: i64,
    /// Weight of one piece in kg
    pub piece_weight_kg: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ClearPieceWeightParams {
    /// Product ID
    pub product_id: i64,
}

// ============================================================================
// Warehouse Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddWarehouseParams {
    /// Unique warehouse name
    pub name: String,
    pub organization: Option<String>,
    pub address: Option<String>,
    /// Phone number (max 20 characters)
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WarehouseIdParams {
    /// Warehouse ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateWarehouseParams {
    /// Warehouse ID
    pub id: i64,
    pub name: Option<String>,
    pub organization: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetProductPalletParams {
    pub product_id: i64,
    pub warehouse_id: i64,
    /// Pieces on one pallet at this warehouse
    pub items_per_pallet: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveProductPalletParams {
    pub product_id: i64,
    pub warehouse_id: i64,
}

// ============================================================================
// Conversion Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertQuantityParams {
    /// Product ID
    pub product_id: i64,
    /// Quantity in from_unit
    pub quantity: f64,
    /// Source unit: piece, pallet, kilogram (kg), ton (t)
    pub from_unit: String,
    /// Target unit: piece, pallet, kilogram (kg), ton (t)
    pub to_unit: String,
    /// Required when either unit is pallet
    pub warehouse_id: Option<i64>,
    /// "ceil" (default) or "strict"; pallets are always rounded up
    pub piece_rounding: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CatalogService {
    // --- Status ---

    #[tool(description = "Get the current status of the catalog service including build info, database status, and process information")]
    async fn catalog_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get instructions for unit conversion: units, product setup, rounding rules and error kinds. Call this before converting quantities.")]
    fn conversion_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CONVERSION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CONVERSION_INSTRUCTIONS)]))
    }

    // --- Units ---

    #[tool(description = "List all units of measure with their weight basis")]
    fn list_units(&self) -> Result<CallToolResult, McpError> {
        let result = units::list_units(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a unit of measure by name")]
    fn get_unit(&self, Parameters(p): Parameters<GetUnitParams>) -> Result<CallToolResult, McpError> {
        let result = units::get_unit(&self.database, &p.name).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(unit) => json_result(&unit),
            None => not_found("Unit", &p.name),
        }
    }

    #[tool(description = "Update a unit's weight basis. kilogram must be weight-based with factor 1, ton weight-based with factor 1000, all others not weight-based with factor 1")]
    fn update_unit(&self, Parameters(p): Parameters<UpdateUnitParams>) -> Result<CallToolResult, McpError> {
        let data = UnitUpdate { is_weight_based: p.is_weight_based, to_kg_factor: p.to_kg_factor };
        let result = units::update_unit(&self.database, &p.name, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Products ---

    #[tool(description = "Create a product, optionally with the weight of one piece (bag) in kg")]
    fn add_product(&self, Parameters(p): Parameters<AddProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductCreate { name: p.name, title: p.title, for_web: p.for_web, is_piece_based: p.is_piece_based };
        let result = products::add_product(&self.database, data, p.piece_weight_kg, &self.piece_weights)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a product with its piece weight and pallet configuration per warehouse")]
    fn get_product(&self, Parameters(p): Parameters<ProductIdParams>) -> Result<CallToolResult, McpError> {
        let result = products::get_product(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(product) => json_result(&product),
            None => not_found("Product", p.id),
        }
    }

    #[tool(description = "List products with optional search")]
    fn list_products(&self, Parameters(p): Parameters<ListProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::list_products(&self.database, p.query.as_deref(), p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a product")]
    fn update_product(&self, Parameters(p): Parameters<UpdateProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductUpdate { name: p.name, title: p.title, for_web: p.for_web, is_piece_based: p.is_piece_based };
        let result = products::update_product(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a product together with its piece and pallet configuration")]
    fn delete_product(&self, Parameters(p): Parameters<ProductIdParams>) -> Result<CallToolResult, McpError> {
        let result = products::delete_product(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set the weight of one piece (bag) of a piece-based product in kg")]
    fn set_piece_weight(&self, Parameters(p): Parameters<SetPieceWeightParams>) -> Result<CallToolResult, McpError> {
        let result = products::set_piece_weight(&self.database, p.product_id, p.piece_weight_kg, &self.piece_weights)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove the piece weight of a product")]
    fn clear_piece_weight(&self, Parameters(p): Parameters<ClearPieceWeightParams>) -> Result<CallToolResult, McpError> {
        let result = products::clear_piece_weight(&self.database, p.product_id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Warehouses ---

    #[tool(description = "Create a warehouse")]
    fn add_warehouse(&self, Parameters(p): Parameters<AddWarehouseParams>) -> Result<CallToolResult, McpError> {
        let data = WarehouseCreate { name: p.name, organization: p.organization, address: p.address, phone_number: p.phone_number };
        let result = warehouses::add_warehouse(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a warehouse by ID")]
    fn get_warehouse(&self, Parameters(p): Parameters<WarehouseIdParams>) -> Result<CallToolResult, McpError> {
        let result = warehouses::get_warehouse(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(w) => json_result(&w),
            None => not_found("Warehouse", p.id),
        }
    }

    #[tool(description = "List all warehouses")]
    fn list_warehouses(&self) -> Result<CallToolResult, McpError> {
        let result = warehouses::list_warehouses(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a warehouse")]
    fn update_warehouse(&self, Parameters(p): Parameters<UpdateWarehouseParams>) -> Result<CallToolResult, McpError> {
        let data = WarehouseUpdate { name: p.name, organization: p.organization, address: p.address, phone_number: p.phone_number };
        let result = warehouses::update_warehouse(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a warehouse and the pallet configurations tied to it")]
    fn delete_warehouse(&self, Parameters(p): Parameters<WarehouseIdParams>) -> Result<CallToolResult, McpError> {
        let result = warehouses::delete_warehouse(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Set how many pieces of a product fit on one pallet at a warehouse (insert or replace)")]
    fn set_product_pallet(&self, Parameters(p): Parameters<SetProductPalletParams>) -> Result<CallToolResult, McpError> {
        let data = ProductPalletSet { product_id: p.product_id, warehouse_id: p.warehouse_id, items_per_pallet: p.items_per_pallet };
        let result = warehouses::set_product_pallet(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List how many pieces of a product fit on a pallet at each warehouse")]
    fn list_product_pallets(&self, Parameters(p): Parameters<ProductIdParams>) -> Result<CallToolResult, McpError> {
        let result = warehouses::list_product_pallets(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove the pallet configuration of a product at a warehouse")]
    fn remove_product_pallet(&self, Parameters(p): Parameters<RemoveProductPalletParams>) -> Result<CallToolResult, McpError> {
        let result = warehouses::remove_product_pallet(&self.database, p.product_id, p.warehouse_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Conversion ---

    #[tool(description = "Convert a quantity of a product between units (piece, pallet, kilogram, ton). Pallet conversions need warehouse_id. Rejected conversions return error_kind instead of a result.")]
    fn convert_quantity(&self, Parameters(p): Parameters<ConvertQuantityParams>) -> Result<CallToolResult, McpError> {
        let req = ConvertQuantityRequest {
            product_id: p.product_id,
            quantity: p.quantity,
            from_unit: p.from_unit,
            to_unit: p.to_unit,
            warehouse_id: p.warehouse_id,
            piece_rounding: p.piece_rounding,
        };
        let result = convert::convert_quantity(&self.database, req).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(converted) => json_result(&converted),
            Err(failed) => json_result(&failed),
        }
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CatalogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "catalog".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Catalog Unit Conversion".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Catalog unit conversion service. \
                 IMPORTANT: Call conversion_instructions before converting. \
                 Units: list_units/get_unit/update_unit. \
                 Products: add/get/list/update/delete_product, set/clear_piece_weight. \
                 Warehouses: add/get/list/update/delete_warehouse, set/remove/list_product_pallet(s). \
                 Conversion: convert_quantity (piece, pallet, kilogram, ton; pallet needs warehouse_id)."
                    .into(),
            ),
        }
    }
}
