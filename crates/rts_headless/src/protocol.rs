//! JSON lines written by the headless runner.
//!
//! Every line on stdout is one [`OutputLine`]. Logs go to stderr.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","scenario":"detour_demo","units":1,"ticks":240}
//! <- {"type":"tick","tick":1,"dt_scale":1.0,"sync":[...],"intents":[{"type":"spawn_unit",...}],"removed":[]}
//! <- {"type":"tick","tick":2,...}
//! <- {"type":"finished","ticks":240,"state_hash":1234567890,"units":[...]}
//! ```

use serde::{Deserialize, Serialize};

use rts_predict::intents::{TickOutput, UnitSync};
use rts_predict::world::UnitId;

/// One line of runner output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine {
    /// Scenario loaded, about to tick.
    Ready {
        /// Scenario name.
        scenario: String,
        /// Staged local units.
        units: usize,
        /// Ticks that will run.
        ticks: u64,
    },
    /// Everything a tick produced.
    Tick(TickOutput),
    /// A scheduled order was refused.
    Rejected {
        /// Tick the order was due.
        tick: u64,
        /// Offending unit, if one was named.
        unit: Option<UnitId>,
        /// Error text.
        error: String,
    },
    /// Run complete.
    Finished {
        /// Ticks run.
        ticks: u64,
        /// Final state hash.
        state_hash: u64,
        /// Final state of every live local unit.
        units: Vec<UnitSync>,
    },
}

impl OutputLine {
    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
