//! Configuration loaded from `.sitevault.toml`.

pub mod settings;

pub use settings::{Settings, MIN_ITERATIONS};
