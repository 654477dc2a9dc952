//! The `ciphertest init` command.

use std::path::Path;

use anyhow::Result;

use ciphertest_core::cipher;
use ciphertest_core::model::KeyGrid;

pub fn execute() -> Result<()> {
    if Path::new("ciphertest.toml").exists() {
        println!("ciphertest.toml already exists, skipping.");
    } else {
        std::fs::write("ciphertest.toml", SAMPLE_CONFIG)?;
        println!("Created ciphertest.toml");
    }

    let payload_path = Path::new("payload.json");
    if payload_path.exists() {
        println!("payload.json already exists, skipping.");
    } else {
        let payload = cipher::encode(&sample_key(), &SAMPLE_MASK)?;
        payload.save_json(payload_path)?;
        println!("Created payload.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: ciphertest validate --payload payload.json");
    println!("  2. Run: ciphertest run --payload payload.json");

    Ok(())
}

const SAMPLE_MASK: [u8; 10] = [5, 3, 9, 0, 6, 2, 8, 1, 7, 4];

/// Twelve rows of ten symbols, drawn from 1..=9.
fn sample_key() -> KeyGrid {
    KeyGrid::new(
        (0..12u32)
            .map(|row| {
                (0..10u32)
                    .map(|col| ((row * 10 + col) * 7 % 9 + 1) as u8)
                    .collect()
            })
            .collect(),
    )
}

const SAMPLE_CONFIG: &str = r#"# ciphertest configuration

# Cells before this one are practice; the one right before it starts the clock.
first_scored_cell = 11
# Last cell of the answer form. Payloads must carry exactly this many cells.
last_cell = 120
duration_secs = 90
timer_label = "Seconds left: {seconds}"
"#;
