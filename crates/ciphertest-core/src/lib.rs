//! ciphertest-core: engine of the timed encryption test.
//!
//! The subject sees a symbol-to-digit key and transcribes rows of symbols
//! into digits on a keypad under a countdown. This crate reconstructs the
//! answer key from the server payload, tracks the active answer cell, runs
//! the countdown and scores the result, independent of any rendering layer.

pub mod cipher;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod model;
pub mod progress;
pub mod scoring;
pub mod timer;

pub use config::{load_config_from, TestConfig};
pub use controller::{KeyPress, NoopHost, TestController, TestHost};
pub use error::TestError;
