//! The `ciphertest run` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;

use ciphertest_core::model::{CompletionRecord, Digit, EncryptedPayload, ScoreResult};
use ciphertest_core::progress::TestProgress;
use ciphertest_core::{load_config_from, KeyPress, TestController, TestHost};

use crate::render;

/// Console host: prompts for cells and shows the countdown.
struct ConsoleHost;

impl TestHost for ConsoleHost {
    fn on_cell_activated(&mut self, cell_index: u32) {
        eprintln!("  -> cell {cell_index}");
    }

    fn on_timer_tick(&mut self, remaining: u32, label: &str) {
        if remaining % 10 == 0 || remaining <= 5 {
            eprintln!("  [{label}]");
        }
    }

    fn finish(&mut self, result: ScoreResult) {
        eprintln!("\nTest finished with {} correct answers.", result.score);
    }
}

pub async fn execute(
    payload_path: Option<PathBuf>,
    progress_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let progress = match &progress_path {
        Some(path) if path.exists() => TestProgress::load_json(path)?,
        _ => TestProgress::default(),
    };

    let fetch = || match &payload_path {
        Some(path) => EncryptedPayload::load_json(path),
        None => anyhow::bail!("no payload: pass --payload or a progress file holding serverData"),
    };
    let mut controller =
        TestController::initialize_with_progress(config, &progress, fetch, ConsoleHost)?;
    tracing::info!(run_id = %controller.run_id(), "test ready");

    let legend = controller.config().key_legend();
    eprintln!("Key:\n{}", render::legend_table(&legend));
    eprintln!(
        "\n{}",
        render::form_table(controller.key_grid(), controller.cells())
    );
    eprintln!(
        "\nCells 1-{} are practice. Filling cell {} starts the clock ({}).",
        controller.config().warm_up_cell(),
        controller.config().warm_up_cell(),
        controller.timer_label()
    );
    eprintln!("Type digits and press enter.\n  -> cell 1");

    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    if feed_line(&mut controller, &line) {
                        break;
                    }
                }
                None => {
                    let timer = controller.timer_state();
                    controller.teardown();
                    if timer.running {
                        eprintln!(
                            "Input closed with {}s left; run abandoned.",
                            timer.remaining_seconds
                        );
                    } else {
                        eprintln!("Input closed before the test completed; run abandoned.");
                    }
                    return Ok(());
                }
            },
            Some(event) = controller.next_timer_event() => {
                if controller.on_timer_event(event).is_some() {
                    break;
                }
            }
        }
    }
    controller.teardown();

    let Some(record) = controller.completion().cloned() else {
        anyhow::bail!("test ended without a completion record");
    };
    println!("Score: {}", record.score);
    print_summary(&record);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let record_path = output.join(format!("record-{timestamp}.json"));
    record.save_json(&record_path)?;
    eprintln!("Completion record: {}", record_path.display());

    let progress_path = progress_path.unwrap_or_else(|| output.join("progress.json"));
    save_progress(&controller.current_progress(progress), &progress_path)?;

    Ok(())
}

/// Forward stdin lines from a plain thread. A blocking read cannot be
/// cancelled, and on a runtime blocking thread it would hold up shutdown
/// after the timer ends the run.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Press every digit on the line. Returns `true` once the test has finished.
fn feed_line<H: TestHost>(controller: &mut TestController<H>, line: &str) -> bool {
    for ch in line.chars().filter(|c| !c.is_whitespace()) {
        let digit = match ch.to_string().parse::<Digit>() {
            Ok(digit) => digit,
            Err(e) => {
                eprintln!("  ignoring '{ch}': {e}");
                continue;
            }
        };
        match controller.on_key_press(digit) {
            Ok(KeyPress::Completed { .. }) => return true,
            Ok(_) => {}
            Err(e) => tracing::warn!("key press rejected: {e}"),
        }
    }
    false
}

fn save_progress(progress: &TestProgress, path: &Path) -> Result<()> {
    progress.save_json(path)?;
    eprintln!("Progress saved to: {}", path.display());
    Ok(())
}

fn print_summary(record: &CompletionRecord) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Run", "Score", "Last answered", "Ended by"]);
    table.add_row(vec![
        Cell::new(record.run_id),
        Cell::new(record.score),
        Cell::new(record.last_answered_cell),
        Cell::new(record.reason),
    ]);

    eprintln!("\n{table}");
}
