//! Headless frame loop.
//!
//! The runner plays the part of the client's render loop: it owns the
//! schedule, feeds [`PredictionSim::tick`] an elapsed time per frame and
//! writes every [`TickOutput`](rts_predict::intents::TickOutput) as a JSON
//! line.

use std::io::{self, Write};

use rts_predict::config::SimConfig;
use rts_predict::error::SimError;
use rts_predict::intents::UnitSync;
use rts_predict::simulation::PredictionSim;

use crate::protocol::OutputLine;
use crate::scenario::{Scenario, ScenarioCommand, ScenarioError, ScheduledOrder};

/// Frame timing for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// Ticks to run; `None` uses the scenario's suggestion.
    pub ticks: Option<u64>,
    /// Nominal wall time per frame.
    pub frame_ms: f32,
    /// Maximum deviation from `frame_ms`, uniformly distributed.
    pub jitter_ms: f32,
    /// Seed for the jitter sequence.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: None,
            frame_ms: 16.666,
            jitter_ms: 0.0,
            seed: 0,
        }
    }
}

/// Deterministic frame-time generator.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_ms: f32,
    jitter_ms: f32,
    state: u64,
}

impl FrameClock {
    /// Create a clock; the same seed always yields the same frames.
    #[must_use]
    pub fn new(frame_ms: f32, jitter_ms: f32, seed: u64) -> Self {
        Self {
            frame_ms,
            jitter_ms: jitter_ms.abs(),
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(0x5DEE_CE66D).wrapping_add(11);
        ((self.state >> 16) % 10_000) as f32 / 10_000.0
    }

    /// Wall time of the next frame, never negative.
    pub fn next_frame(&mut self) -> f32 {
        if self.jitter_ms == 0.0 {
            return self.frame_ms;
        }
        let offset = (self.next_unit() * 2.0 - 1.0) * self.jitter_ms;
        (self.frame_ms + offset).max(0.0)
    }
}

/// Totals from a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks run.
    pub ticks: u64,
    /// Final state hash.
    pub state_hash: u64,
    /// Intents emitted across the run.
    pub intents: usize,
    /// Orders the simulation refused.
    pub rejected: usize,
    /// Final unit states.
    pub units: Vec<UnitSync>,
}

/// Drives one scenario to completion.
pub struct HeadlessRunner {
    scenario: Scenario,
    sim: PredictionSim,
    run: RunConfig,
}

impl HeadlessRunner {
    /// Stage the scenario's units in a fresh simulation.
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Sim`] if the config is invalid or unit ids repeat.
    pub fn new(
        scenario: Scenario,
        config: SimConfig,
        run: RunConfig,
    ) -> Result<Self, ScenarioError> {
        let mut sim = PredictionSim::new(scenario.local_player, config)?;
        for spawn in &scenario.units {
            sim.spawn_unit(spawn.clone())?;
        }
        Ok(Self { scenario, sim, run })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn sim(&self) -> &PredictionSim {
        &self.sim
    }

    /// Run every tick, writing JSON lines to `out`.
    ///
    /// # Errors
    ///
    /// Only write failures; refused orders are reported as
    /// [`OutputLine::Rejected`] lines.
    pub fn run<W: Write>(&mut self, out: &mut W) -> io::Result<RunSummary> {
        let ticks = self.run.ticks.unwrap_or(self.scenario.ticks);
        let mut clock = FrameClock::new(self.run.frame_ms, self.run.jitter_ms, self.run.seed);
        let mut orders = self.scenario.orders.clone();
        orders.sort_by_key(|o| o.tick);
        let mut next_order = 0;
        let mut intents = 0;
        let mut rejected = 0;

        tracing::info!(
            scenario = %self.scenario.name,
            units = self.scenario.units.len(),
            ticks,
            "Starting run"
        );
        write_line(
            out,
            &OutputLine::Ready {
                scenario: self.scenario.name.clone(),
                units: self.scenario.units.len(),
                ticks,
            },
        )?;

        for tick in 0..ticks {
            while let Some(order) = orders.get(next_order).filter(|o| o.tick <= tick) {
                if let Err(err) = self.apply(order) {
                    rejected += 1;
                    let unit = match &err {
                        SimError::UnitNotFound(id) => Some(*id),
                        _ => None,
                    };
                    write_line(
                        out,
                        &OutputLine::Rejected {
                            tick,
                            unit,
                            error: err.to_string(),
                        },
                    )?;
                }
                next_order += 1;
            }

            let output = self.sim.tick(clock.next_frame(), &self.scenario.world);
            intents += output.intents.len();
            write_line(out, &OutputLine::Tick(output))?;
        }

        let summary = RunSummary {
            ticks,
            state_hash: self.sim.state_hash(),
            intents,
            rejected,
            units: self.sim.units().map(UnitSync::from).collect(),
        };
        write_line(
            out,
            &OutputLine::Finished {
                ticks,
                state_hash: summary.state_hash,
                units: summary.units.clone(),
            },
        )?;
        tracing::info!(
            ticks,
            intents,
            rejected,
            state_hash = summary.state_hash,
            "Run finished"
        );
        Ok(summary)
    }

    fn apply(&mut self, order: &ScheduledOrder) -> Result<(), SimError> {
        match order.command {
            ScenarioCommand::Move(target) => self.sim.command_move(&order.units, target),
            ScenarioCommand::Attack(target) => {
                self.sim
                    .command_attack(&order.units, target, &self.scenario.world)
            }
            ScenarioCommand::Harvest(resource) => {
                self.sim.command_harvest(&order.units, resource)
            }
            ScenarioCommand::Stop => self.sim.command_stop(&order.units),
        }
    }
}

fn write_line<W: Write>(out: &mut W, line: &OutputLine) -> io::Result<()> {
    let json = line.to_json().map_err(io::Error::other)?;
    writeln!(out, "{json}")
}
