//! Catalog Status Tool
//!
//! Runtime status of the service, plus usage instructions for assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{Product, Warehouse};

/// Conversion instructions for AI assistants
pub const CONVERSION_INSTRUCTIONS: &str = r#"
# Catalog Conversion Instructions

## Units

| name | label | kind |
|------|-------|------|
| piece | шт | one bag of the product, weight set per product |
| pallet | пал | items_per_pallet pieces, set per product AND warehouse |
| kilogram | кг | weight, factor 1 |
| ton | т | weight, factor 1000 |
| %, millimeter, megapascal, litre, kg/m3 | | descriptive only, NOT convertible |

## Setting Up a Product

1. `add_product(name, is_piece_based: true, piece_weight_kg: 25)`
   - Bag weights are limited to the configured set (default 15, 20, 25, 30 kg)
   - Weight-only products (`is_piece_based: false`) convert between kilogram and ton only
   - A product can only become weight-only once its piece weight and pallets are cleared
2. `add_warehouse(name, address)`
3. `set_product_pallet(product_id, warehouse_id, items_per_pallet: 40)`

## Converting

`convert_quantity(product_id, quantity, from_unit, to_unit, warehouse_id?, piece_rounding?)`

- `warehouse_id` is REQUIRED whenever either unit is `pallet`
- `piece_rounding: "ceil"` (default) rounds piece counts up
- `piece_rounding: "strict"` fails when the piece count is fractional
- Pallet counts are ALWAYS rounded up; a half pallet is a whole pallet
- Weight results (kilogram, ton) are exact

## Failures

A rejected conversion returns `error_kind`:

| error_kind | meaning | what to do |
|------------|---------|------------|
| unsupported_unit_for_product | piece/pallet on a weight-only product | use kilogram or ton |
| missing_piece_configuration | no piece weight on file | `set_piece_weight` |
| missing_pallet_configuration | no items_per_pallet at that warehouse | `set_product_pallet` |
| warehouse_required | pallet conversion without warehouse_id | pass warehouse_id |
| unsupported_unit_kind | unit has no path to kilograms | pick a weight, piece or pallet unit |
| non_integer_piece_result | strict mode, fractional pieces | retry with ceil or adjust quantity |
| invalid_packaging_configuration | stored piece weight or items_per_pallet is not positive | fix the product setup |
| invalid_quantity | quantity is not a finite number | fix the input |
"#;

/// Runtime status of the catalog service
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub product_count: Option<i64>,
    pub warehouse_count: Option<usize>,

    pub started_at: String,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: String,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> CatalogStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let product_count = db.with_conn(Product::count).ok();
        let warehouse_count = db.with_conn(Warehouse::list).ok().map(|w| w.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        CatalogStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            product_count,
            warehouse_count,
            started_at: self.started_at.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
