//! SBM viewer application: configuration, input state and the main loop.

pub mod config;
pub mod state;
pub mod viewer;

pub use config::ViewerConfig;
pub use state::{Action, ViewerState};
pub use viewer::{RunSummary, run, run_with};
