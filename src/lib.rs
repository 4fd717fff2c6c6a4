//! Catalog Unit Conversion Library
//!
//! Product catalog with packaging configuration and quantity conversion
//! between pieces, pallets, kilograms and tons.

pub mod build_info;
pub mod config;
pub mod conversion;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
