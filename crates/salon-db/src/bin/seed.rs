//! # Seed Data
//!
//! Fills an empty database with the default service menu and one barber.
//!
//! ## Usage
//! ```bash
//! cargo run -p salon-db --bin seed
//! cargo run -p salon-db --bin seed -- --db ./data/salon.db
//! ```
//!
//! A database that already has services or staff is left alone.

use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use salon_core::{Service, ServiceStatus, Staff, StaffStatus};
use salon_db::{Database, DbConfig};

/// (name, category, description, minutes, price, cost, commission %)
const MENU: &[(&str, &str, &str, i64, i64, i64, u32)] = &[
    ("Regular Haircut", "Haircut", "Simple classic cut", 30, 40, 5, 30),
    ("Haircut + Styling", "Haircut", "Cut with styling", 40, 50, 6, 30),
    ("Kids Haircut", "Haircut", "For children under 12", 25, 30, 4, 30),
    ("Classic Cut", "Haircut", "Traditional scissor cut", 35, 45, 5, 30),
    ("Skin Fade", "Haircut", "Modern cut with fade", 45, 60, 8, 35),
    ("Beard Shave", "Beard", "Standard beard shave", 20, 30, 3, 30),
    ("Shave + Trim", "Beard", "Shave and shape", 30, 40, 5, 30),
    ("Beard Trim", "Beard", "Trim and tidy only", 15, 25, 3, 30),
    ("Royal Shave", "Beard", "Hot towel luxury shave", 40, 70, 10, 35),
    ("Full Hair Color", "Color", "Whole-head color", 90, 150, 40, 30),
    ("Partial Hair Color", "Color", "Highlights or sections", 60, 100, 25, 30),
    ("Beard Color", "Color", "Beard tint", 45, 80, 20, 30),
    ("Grey Blending", "Color", "Cover grey hair", 75, 120, 30, 30),
    ("VIP Package", "Packages", "Cut + shave + massage", 90, 120, 20, 35),
    ("Groom Package", "Packages", "Full groom preparation", 120, 200, 40, 35),
    ("Full Refresh Package", "Packages", "Cut + shave + color", 100, 180, 35, 35),
    ("Hair Wash", "Extras", "Wash and rinse", 10, 15, 2, 30),
    ("Scalp Massage", "Extras", "Head and scalp massage", 15, 25, 3, 30),
    ("Hair Mask", "Extras", "Conditioning treatment", 20, 40, 8, 30),
    ("Facial Cleanse", "Extras", "Deep skin cleanse", 30, 60, 10, 30),
    ("Eyebrow Tint", "Extras", "Tint and tidy brows", 20, 35, 5, 30),
    ("Moroccan Bath", "Extras", "Steam and scrub session", 60, 100, 20, 30),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./salon_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Salon Desk seed data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./salon_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    let now = Utc::now();

    if db.services().count().await? > 0 {
        warn!("Services already present, menu not seeded");
    } else {
        for &(name, category, description, minutes, price, cost, percent) in MENU {
            let service = Service {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                category: category.to_string(),
                description: Some(description.to_string()),
                duration_minutes: minutes,
                price_cents: price * 100,
                cost_cents: cost * 100,
                commission_rate_bps: Some(percent * 100),
                status: ServiceStatus::Active,
                popularity: 0,
                created_at: now,
                updated_at: now,
            };
            db.services().insert(&service).await?;
        }
        info!(count = MENU.len(), "Seeded service menu");
    }

    if db.staff().count().await? > 0 {
        warn!("Staff already present, barber not seeded");
    } else {
        let barber = Staff {
            id: Uuid::new_v4().to_string(),
            name: "Khalid Mohammed".to_string(),
            phone: Some("0501234567".to_string()),
            specialization: Some("Modern cuts".to_string()),
            commission_rate_bps: 3500,
            status: StaffStatus::Active,
            total_services: 0,
            total_revenue_cents: 0,
            created_at: now,
            updated_at: now,
        };
        db.staff().insert(&barber).await?;
        info!(name = %barber.name, "Seeded barber");
    }

    db.close().await;
    Ok(())
}
