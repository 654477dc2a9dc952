//! The `ciphertest decrypt` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ciphertest_core::cipher;
use ciphertest_core::model::EncryptedPayload;

use crate::render;

pub fn execute(payload_path: PathBuf) -> Result<()> {
    let payload = EncryptedPayload::load_json(&payload_path)?;
    let key = cipher::decrypt(&payload)
        .with_context(|| format!("cannot decrypt {}", payload_path.display()))?;

    println!("{}", render::key_table(&key));
    println!("{} cells, mask length {}", key.cell_count(), payload.mask.len());
    Ok(())
}
