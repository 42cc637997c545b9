//! Headless runner for the prediction core.
//!
//! Drives [`rts_predict::simulation::PredictionSim`] from a scenario file
//! at a fixed or jittered frame rate, the way a client render loop would,
//! and prints everything the core stages for the authority. Useful for CI,
//! for eyeballing steering in a log, and for checking that a tuning file
//! still validates.
//!
//! # Protocol
//!
//! Output uses JSON lines (one JSON object per line):
//!
//! - **stdout**: `ready`, one `tick` line per frame, `rejected`, `finished`
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the line format.
//!
//! # Example
//!
//! ```bash
//! # Built-in scenario
//! cargo run -p rts_headless -- run --scenario detour_demo
//!
//! # Scenario file with custom tuning and jittered frames
//! cargo run -p rts_headless -- run --scenario crates/rts_headless/scenarios/skirmish.ron \
//!     --config crates/rts_headless/scenarios/tuning.ron --jitter-ms 4
//!
//! # Validate a tuning file
//! cargo run -p rts_headless -- check-config crates/rts_headless/scenarios/tuning.ron
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;

pub use protocol::OutputLine;
pub use runner::{FrameClock, HeadlessRunner, RunConfig, RunSummary};
pub use scenario::{Scenario, ScenarioError};
