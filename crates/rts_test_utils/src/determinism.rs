//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the prediction core produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Two clients replaying the same orders against the same snapshots must
//! predict the same positions, or reconciliation turns into constant
//! snapping. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always processed in ascending id order and obstacles in
//!   snapshot order.
//!
//! - **Wall-clock reads**: the core never reads a clock; elapsed time is an
//!   input.
//!
//! - **System randomness**: none in the core. Frame jitter in tests comes
//!   from fixed sequences or proptest seeds.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: per-module behavior inside `rts_predict`
//! 2. **Property tests**: random worlds and frame timings keep invariants
//! 3. **Integration tests**: full scenarios are reproducible
//! 4. **Parallel tests**: running N simulations on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use rts_predict::simulation::PredictionSim;
use rts_predict::world::WorldSnapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Prediction is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// A simulation together with the snapshot it runs against.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    /// The simulation under test.
    pub sim: PredictionSim,
    /// Static world for every tick.
    pub world: WorldSnapshot,
}

impl PredictionRun {
    /// Pair a simulation with a world.
    #[must_use]
    pub fn new(sim: PredictionSim, world: WorldSnapshot) -> Self {
        Self { sim, world }
    }

    /// Advance one frame.
    pub fn step(&mut self, elapsed_ms: f32) {
        self.sim.tick(elapsed_ms, &self.world);
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use rts_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, |n| *n);
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a prediction setup twice over the same frame timings and compare the
/// final state hashes.
pub fn verify_prediction_determinism<F>(setup_fn: F, frames: &[f32]) -> DeterminismResult
where
    F: Fn() -> PredictionRun,
{
    let ticks = frames.len() as u64;
    let frame_at = |run: &PredictionRun| frames[run.sim.get_tick() as usize];
    verify_determinism(
        2,
        ticks,
        &setup_fn,
        |run| {
            let elapsed = frame_at(run);
            run.step(elapsed);
        },
        |run| run.sim.state_hash(),
    )
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    frames: &[f32],
) -> DeterminismResult
where
    F: Fn() -> PredictionRun + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut run = setup_fn();
                    for &elapsed in frames {
                        run.step(elapsed);
                    }
                    run.sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: frames.len() as u64,
    }
}

/// Compare two simulation runs frame by frame, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs match throughout, `Some(tick)` for the first tick
/// after which the state hashes differ (0 for the initial state).
pub fn find_first_divergence<F>(setup_fn: F, frames: &[f32]) -> Option<u64>
where
    F: Fn() -> PredictionRun,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.sim.state_hash() != b.sim.state_hash() {
        return Some(0);
    }

    for &elapsed in frames {
        a.step(elapsed);
        b.step(elapsed);

        if a.sim.state_hash() != b.sim.state_hash() {
            return Some(a.sim.get_tick());
        }
    }

    None
}

/// A fixed, uneven frame timing sequence around 60 Hz with occasional
/// long frames.
#[must_use]
pub fn uneven_frames(count: usize) -> Vec<f32> {
    const PATTERN: [f32; 8] = [16.6, 17.1, 15.9, 16.7, 33.3, 16.2, 16.9, 60.0];
    PATTERN.iter().copied().cycle().take(count).collect()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for prediction testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use rts_predict::behavior::{FormationSlot, Order};
    use rts_predict::collision::Rect;
    use rts_predict::math::Vec2;
    use rts_predict::world::{
        CollisionBox, EntityId, EntityKind, MapEntity, Tree, TreeId, WorldSnapshot,
    };

    /// Walls never come closer than this to the origin, so a unit spawned
    /// there starts clear.
    pub const SPAWN_CLEARANCE: f32 = 16.0;

    /// A point inside a square of half-width `extent` around the origin.
    pub fn arb_position(extent: f32) -> impl Strategy<Value = Vec2> {
        (-extent..extent, -extent..extent).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Wall time of one frame, from a fast 144 Hz frame to a hitch.
    pub fn arb_elapsed_ms() -> impl Strategy<Value = f32> {
        prop_oneof![
            8 => 6.9f32..20.0f32,
            1 => 20.0f32..120.0f32,
        ]
    }

    /// A run of frame timings.
    pub fn arb_frame_sequence(max_len: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(arb_elapsed_ms(), 1..max_len)
    }

    /// A world with up to `max_trees` trees scattered in `extent`.
    pub fn arb_tree_world(max_trees: usize, extent: f32) -> impl Strategy<Value = WorldSnapshot> {
        proptest::collection::vec(arb_position(extent), 0..max_trees).prop_map(|positions| {
            WorldSnapshot {
                trees: (1_u32..)
                    .zip(positions)
                    .map(|(id, position)| Tree {
                        id: TreeId(id),
                        position,
                    })
                    .collect(),
                ..WorldSnapshot::default()
            }
        })
    }

    /// A wall of `thickness x length`, horizontal or vertical, centered in
    /// `extent`. Long thin walls are common.
    pub fn arb_wall(extent: f32) -> impl Strategy<Value = (Vec2, f32, f32)> {
        (arb_position(extent), 10.0f32..40.0, 40.0f32..400.0, any::<bool>()).prop_map(
            |(center, thickness, length, vertical)| {
                if vertical {
                    (center, thickness, length)
                } else {
                    (center, length, thickness)
                }
            },
        )
    }

    /// A world with up to `max_walls` tile walls in `extent`, none within
    /// [`SPAWN_CLEARANCE`] of the origin.
    pub fn arb_wall_world(max_walls: usize, extent: f32) -> impl Strategy<Value = WorldSnapshot> {
        proptest::collection::vec(arb_wall(extent), 0..max_walls).prop_map(|walls| {
            WorldSnapshot {
                entities: (1_u64..)
                    .zip(walls)
                    .filter(|(_, (center, w, h))| {
                        let rect = Rect::from_center_size(*center, *w, *h);
                        rect.closest_point(Vec2::ZERO).length() >= SPAWN_CLEARANCE
                    })
                    .map(|(id, (position, w, h))| MapEntity {
                        id: EntityId(id),
                        kind: EntityKind::Tile,
                        owner: None,
                        position,
                        size: Some(Vec2::new(w, h)),
                        collision: Some(CollisionBox {
                            w,
                            h,
                            offset: Vec2::ZERO,
                        }),
                        collides: true,
                        hp: None,
                    })
                    .collect(),
                ..WorldSnapshot::default()
            }
        })
    }

    /// A solo move order to a point in `extent`.
    pub fn arb_move_order(extent: f32) -> impl Strategy<Value = Order> {
        arb_position(extent).prop_map(|target| Order::Move {
            target,
            formation: FormationSlot::SOLO,
        })
    }

    /// Any order that needs no world references.
    pub fn arb_free_order(extent: f32) -> impl Strategy<Value = Order> {
        prop_oneof![4 => arb_move_order(extent), 1 => Just(Order::Stop)]
    }
}
