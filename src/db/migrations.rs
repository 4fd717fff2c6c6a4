//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: catalog schema and seeded units
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- UNITS
        -- Closed set of units of measure
        -- ============================================
        CREATE TABLE units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK(name IN (
                'piece', 'kilogram', 'ton', 'pallet', '%',
                'millimeter', 'megapascal', 'litre', 'kg/m3'
            )),
            is_weight_based INTEGER NOT NULL DEFAULT 0,
            to_kg_factor INTEGER NOT NULL DEFAULT 1 CHECK(to_kg_factor > 0)
        );

        INSERT INTO units (name, is_weight_based, to_kg_factor) VALUES
            ('piece', 0, 1),
            ('kilogram', 1, 1),
            ('ton', 1, 1000),
            ('pallet', 0, 1),
            ('%', 0, 1),
            ('millimeter', 0, 1),
            ('megapascal', 0, 1),
            ('litre', 0, 1),
            ('kg/m3', 0, 1);

        -- ============================================
        -- PRODUCTS
        -- ============================================
        CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            for_web INTEGER NOT NULL DEFAULT 0,
            is_piece_based INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_products_name ON products(name);

        -- ============================================
        -- PRODUCT PIECES
        -- One-to-one: weight of one piece (bag) in kg, stored as decimal text
        -- ============================================
        CREATE TABLE product_pieces (
            product_id INTEGER PRIMARY KEY REFERENCES products(id) ON DELETE CASCADE,
            piece_weight_kg TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- WAREHOUSES
        -- ============================================
        CREATE TABLE warehouses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            organization TEXT,
            address TEXT,
            phone_number TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- PRODUCT PALLETS
        -- Items per pallet for a product at a warehouse
        -- ============================================
        CREATE TABLE product_pallets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            warehouse_id INTEGER NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
            items_per_pallet INTEGER NOT NULL CHECK(items_per_pallet > 0),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(product_id, warehouse_id)
        );

        CREATE INDEX idx_product_pallets_product ON product_pallets(product_id);
        CREATE INDEX idx_product_pallets_warehouse ON product_pallets(warehouse_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration(&conn).unwrap());

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_units_are_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 9);

        let ton_factor: i64 = conn
            .query_row("SELECT to_kg_factor FROM units WHERE name = 'ton'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(ton_factor, 1000);
    }
}
