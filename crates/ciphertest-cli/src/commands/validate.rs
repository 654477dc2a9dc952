//! The `ciphertest validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use ciphertest_core::model::EncryptedPayload;
use ciphertest_core::{load_config_from, NoopHost, TestController};

pub fn execute(payload_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let payload = EncryptedPayload::load_json(&payload_path)?;

    let controller = TestController::initialize(config, payload, NoopHost)
        .with_context(|| format!("{} cannot drive a test", payload_path.display()))?;

    let config = controller.config();
    println!(
        "Payload: {} cells in {} rows",
        controller.cells().len(),
        controller.key_grid().rows.len()
    );
    println!(
        "Practice cells 1-{}, scored cells {}-{}, {}s on the clock",
        config.warm_up_cell(),
        config.first_scored_cell,
        config.last_cell,
        config.duration_secs
    );
    println!("Payload valid.");
    Ok(())
}
