//! The `ciphertest encode` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ciphertest_core::cipher;
use ciphertest_core::model::KeyGrid;

pub fn execute(key_path: PathBuf, mask_str: String, output: Option<PathBuf>) -> Result<()> {
    let content = std::fs::read_to_string(&key_path)
        .with_context(|| format!("failed to read key grid: {}", key_path.display()))?;
    let key: KeyGrid = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse key grid JSON: {}", key_path.display()))?;

    let mask = parse_mask(&mask_str)?;
    let payload = cipher::encode(&key, &mask)?;

    match output {
        Some(path) => {
            payload.save_json(&path)?;
            eprintln!("Payload written to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string(&payload)?),
    }
    Ok(())
}

fn parse_mask(mask_str: &str) -> Result<Vec<u8>> {
    let mask: Vec<u8> = mask_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .map_err(|_| anyhow::anyhow!("invalid mask value: '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!mask.is_empty(), "mask must have at least one value");
    Ok(mask)
}
