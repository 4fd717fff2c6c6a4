//! Catalog tools module
//!
//! MCP tool implementations for the catalog service.

pub mod convert;
pub mod products;
pub mod status;
pub mod units;
pub mod warehouses;
