//! Utility to seed a demo catalog: bagged and loose products, warehouses and pallet sizes

use rust_decimal::Decimal;

use catalog::config::Config;
use catalog::db::{migrations, Database};
use catalog::models::{
    Product, ProductCreate, ProductPallet, ProductPalletSet, ProductPiece, Warehouse, WarehouseCreate,
};

struct SeedProduct {
    name: &'static str,
    title: &'static str,
    piece_weight_kg: Option<u32>,
    /// (warehouse name, items per pallet)
    pallets: &'static [(&'static str, i64)],
}

const WAREHOUSES: &[(&str, &str)] = &[
    ("North Depot", "12 Industrial Ave"),
    ("River Terminal", "3 Quay Street"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Cement M500",
        title: "Portland cement M500, 25 kg bag",
        piece_weight_kg: Some(25),
        pallets: &[("North Depot", 40), ("River Terminal", 48)],
    },
    SeedProduct {
        name: "Tile Adhesive",
        title: "Tile adhesive, 20 kg bag",
        piece_weight_kg: Some(20),
        pallets: &[("North Depot", 60)],
    },
];

const LOOSE_PRODUCTS: &[(&str, &str)] = &[("Washed Sand", "Washed river sand, bulk")];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    println!("Database path: {}", config.database_path.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::with_pool_size(&config.database_path, 1)?;
    database.with_conn(|conn| {
        migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let conn = database.get_conn()?;

    if Product::count(&conn)? > 0 {
        println!("Catalog already has products, nothing to seed");
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;

    let mut warehouses = Vec::new();
    for (name, address) in WAREHOUSES {
        let warehouse = match Warehouse::get_by_name(&tx, name)? {
            Some(existing) => existing,
            None => Warehouse::create(
                &tx,
                &WarehouseCreate {
                    name: name.to_string(),
                    organization: None,
                    address: Some(address.to_string()),
                    phone_number: None,
                },
            )?,
        };
        println!("Warehouse: {} (#{})", warehouse, warehouse.id);
        warehouses.push(warehouse);
    }

    for seed in PRODUCTS {
        let product = Product::create(
            &tx,
            &ProductCreate {
                name: seed.name.to_string(),
                title: seed.title.to_string(),
                for_web: true,
                is_piece_based: true,
            },
        )?;
        println!("Product: {}", product.identity());

        if let Some(kg) = seed.piece_weight_kg {
            ProductPiece::set(&tx, product.id, Decimal::from(kg), &config.piece_weights)?;
            println!("  Piece weight: {} kg", kg);
        }

        for (warehouse_name, items) in seed.pallets {
            let Some(warehouse) = warehouses.iter().find(|w| w.name == *warehouse_name) else {
                continue;
            };
            ProductPallet::set(
                &tx,
                &ProductPalletSet {
                    product_id: product.id,
                    warehouse_id: warehouse.id,
                    items_per_pallet: *items,
                },
            )?;
            println!("  Pallet at {}: {} pieces", warehouse.name, items);
        }
    }

    for (name, title) in LOOSE_PRODUCTS {
        let product = Product::create(
            &tx,
            &ProductCreate {
                name: name.to_string(),
                title: title.to_string(),
                for_web: false,
                is_piece_based: false,
            },
        )?;
        println!("Product: {} (weight only)", product.identity());
    }

    tx.commit()?;
    println!("Seed complete");

    Ok(())
}
