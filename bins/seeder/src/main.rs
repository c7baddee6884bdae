//! Database seeder for Tally development and testing.
//!
//! Provisions the default practice document sequences. Existing sequences
//! are left untouched, so the seeder can be re-run safely.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use tally_core::numbering::{
    DocumentSequence, DocumentType, ResetFrequency, SequenceConfig, SequenceStore,
};
use tally_db::SequenceRepository;

/// Default sequences: key, prefix, pad width, reset cadence.
const DEFAULT_SEQUENCES: &[(&str, &str, u32, ResetFrequency)] = &[
    ("invoice", "INV-", 6, ResetFrequency::Yearly),
    ("receipt", "RCPT-", 6, ResetFrequency::Yearly),
    ("claim_batch", "CB-", 5, ResetFrequency::Monthly),
    ("prescription", "RX-", 8, ResetFrequency::Never),
    ("lab_order", "LAB-", 4, ResetFrequency::Daily),
    ("referral", "REF-", 6, ResetFrequency::Never),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("TALLY__DATABASE__URL"))
        .expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = tally_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    let sequences = SequenceRepository::new(db);

    println!("Seeding document sequences...");
    for &(key, prefix, number_length, reset_frequency) in DEFAULT_SEQUENCES {
        seed_sequence(&sequences, key, prefix, number_length, reset_frequency).await;
    }

    println!("Seeding complete!");
}

/// Provisions one sequence unless it already exists.
async fn seed_sequence(
    sequences: &SequenceRepository,
    key: &str,
    prefix: &str,
    number_length: u32,
    reset_frequency: ResetFrequency,
) {
    let document_type = DocumentType::parse(key).expect("default document types are valid");

    if sequences.get(&document_type).await.is_ok() {
        println!("  {key} already exists, skipping...");
        return;
    }

    let config = SequenceConfig {
        prefix: prefix.to_string(),
        suffix: String::new(),
        number_length,
        format_template: None,
        reset_frequency,
        is_active: true,
        start_number: None,
        current_number: None,
    };
    config.validate().expect("default sequence configs are valid");

    let sequence = DocumentSequence::from_config(document_type, &config, Utc::now());
    match sequences.provision(sequence).await {
        Ok(stored) => println!("  {key}: next number {}", stored.current_number + 1),
        Err(e) => println!("  Failed to seed {key}: {e}"),
    }
}
