//! Steering and detour controller.
//!
//! Turns a desired displacement into one that does not end inside a known
//! obstacle. The controller works in three layers:
//!
//! 1. **Direct step** - taken as-is when the destination is clear.
//! 2. **Fan probe** - rotated and shortened variants of the step, preferred
//!    side first.
//! 3. **Fallback** - the direct step corrected by the first contact only, or
//!    no movement at all.
//!
//! On top of that a unit that hits something plans a [`Detour`]: a waypoint
//! beside the obstacle that it walks toward until the waypoint is reached,
//! the detour expires, or a lookahead probe toward the real goal is clear.
//! Which side to pass on is memoised per obstacle so the unit never flips
//! sides between ticks. Rectangles are passed at the corner that ends the
//! blocking face, so long walls are cleared end to end.
//!
//! Progress is measured as net displacement over a window of
//! `stuck_ticks` moving ticks. A unit that covers too little ground in a
//! window is nudged away from the last thing it hit, even if it twitched
//! back and forth in between.

use std::collections::HashMap;

use crate::collision::Rect;
use crate::config::SimConfig;
use crate::math::{Vec2, LENGTH_EPSILON};
use crate::obstacles::{ObstacleId, ObstacleMap, Shape};

/// Step-length scales tried by the fan probe.
pub const FAN_SCALES: [f32; 3] = [1.0, 0.65, 0.4];

/// Angular offsets (degrees) tried by the fan probe, each in both directions.
pub const FAN_ANGLES_DEG: [f32; 5] = [0.0, 20.0, 35.0, 55.0, 75.0];

/// Maximum number of remembered detour sides per unit.
pub const SIDE_MEMO_CAPACITY: usize = 64;

/// Rotation sense used to pass an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Waypoint on the +90° side of the approach direction.
    Left,
    /// Waypoint on the -90° side of the approach direction.
    Right,
}

impl Side {
    /// +1 for left, -1 for right.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// A temporary waypoint used to walk around an obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detour {
    /// Where to walk instead of the goal.
    pub waypoint: Vec2,
    /// Simulation time after which the detour is dropped.
    pub expires_at_ms: f64,
    /// Side the obstacle is passed on.
    pub side: Side,
    /// The obstacle being avoided.
    pub obstacle: ObstacleId,
}

/// Per-unit steering memory. Lives inside the unit record and dies with it.
#[derive(Debug, Clone, Default)]
pub struct SteeringState {
    /// Active detour, if any.
    pub detour: Option<Detour>,
    /// Moving ticks counted in the current progress window.
    pub stuck_ticks: u32,
    /// Emergency nudges performed since the last order.
    pub recoveries: u32,
    /// Center of the last obstacle the unit ran into.
    pub last_obstacle_center: Option<Vec2>,
    window_start: Option<Vec2>,
    window_requested: f32,
    side_memo: HashMap<(i32, i32), Side>,
}

impl SteeringState {
    /// Forget the detour and progress counters (the side memo survives).
    pub fn reset(&mut self) {
        self.detour = None;
        self.recoveries = 0;
        self.restart_window();
    }

    fn restart_window(&mut self) {
        self.window_start = None;
        self.window_requested = 0.0;
        self.stuck_ticks = 0;
    }

    /// Drop the active detour.
    pub fn clear_detour(&mut self) {
        self.detour = None;
    }

    /// Side previously chosen for the obstacle centered at `center`.
    #[must_use]
    pub fn remembered_side(&self, center: Vec2) -> Option<Side> {
        self.side_memo.get(&center.rounded_key()).copied()
    }

    fn remember_side(&mut self, center: Vec2, side: Side) {
        let key = center.rounded_key();
        if self.side_memo.len() >= SIDE_MEMO_CAPACITY && !self.side_memo.contains_key(&key) {
            self.side_memo.clear();
        }
        self.side_memo.insert(key, side);
    }
}

/// Outcome of one steering step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteerResult {
    /// Displacement to apply this tick.
    pub displacement: Vec2,
    /// The direct step was blocked.
    pub blocked: bool,
    /// The emergency nudge fired this tick.
    pub nudged: bool,
}

/// Realize `desired` for a unit at `position` heading for `goal`.
///
/// The returned displacement never moves the unit into an obstacle of
/// `obstacles`. A zero `desired` means the unit is holding still; it is only
/// pushed out if the world moved into it. Non-finite input yields no
/// movement.
pub fn steer(
    state: &mut SteeringState,
    position: Vec2,
    desired: Vec2,
    goal: Vec2,
    obstacles: &ObstacleMap,
    now_ms: f64,
    config: &SimConfig,
) -> SteerResult {
    if !position.is_finite() || !desired.is_finite() || !goal.is_finite() {
        return SteerResult::default();
    }

    let radius = config.unit_radius;
    let step = desired.length();
    if step <= LENGTH_EPSILON {
        state.restart_window();
        return SteerResult {
            displacement: settle(position, radius, obstacles),
            ..SteerResult::default()
        };
    }

    update_detour(state, position, goal, obstacles, now_ms, config);

    let desired = match state.detour {
        Some(detour) => {
            let toward = position.step_toward(detour.waypoint, step);
            if toward.length() > LENGTH_EPSILON {
                toward
            } else {
                desired
            }
        }
        None => desired,
    };

    let (mut displacement, blocked) =
        choose_step(state, position, desired, goal, obstacles, now_ms, config);

    let window_start = *state.window_start.get_or_insert(position);
    state.stuck_ticks += 1;
    state.window_requested += step;

    let mut nudged = false;
    if state.stuck_ticks >= config.stuck_ticks {
        let net = window_start.distance(position + displacement);
        // Tiny frames request little movement and must not read as stuck.
        let required = (config.stuck_epsilon * state.stuck_ticks as f32)
            .min(state.window_requested * 0.5);
        state.restart_window();
        nudged = net < required;
    }

    if nudged {
        let escape = nudge(state, position, desired, obstacles, config);
        state.detour = None;
        state.recoveries += 1;
        tracing::debug!(
            x = position.x,
            y = position.y,
            recoveries = state.recoveries,
            escaped = escape.is_some(),
            "Stuck unit nudged"
        );
        if let Some(escape) = escape {
            displacement = escape;
        }
    }

    SteerResult {
        displacement,
        blocked,
        nudged,
    }
}

/// Expire, complete or release the active detour.
fn update_detour(
    state: &mut SteeringState,
    position: Vec2,
    goal: Vec2,
    obstacles: &ObstacleMap,
    now_ms: f64,
    config: &SimConfig,
) {
    let Some(detour) = state.detour else {
        return;
    };

    let reason = if now_ms >= detour.expires_at_ms {
        "expired"
    } else if position.distance(detour.waypoint) <= config.detour_arrival_radius {
        "reached"
    } else {
        let ahead = position + (goal - position).clamp_length(config.detour_release_lookahead);
        if obstacles.is_path_clear(position, ahead, config.unit_radius) {
            "path clear"
        } else {
            return;
        }
    };

    tracing::debug!(obstacle = ?detour.obstacle, reason, "Detour released");
    state.detour = None;
}

/// Direct step, then the fan, then the single-contact fallback.
fn choose_step(
    state: &mut SteeringState,
    position: Vec2,
    desired: Vec2,
    goal: Vec2,
    obstacles: &ObstacleMap,
    now_ms: f64,
    config: &SimConfig,
) -> (Vec2, bool) {
    let radius = config.unit_radius;
    let direct = position + desired;
    if !obstacles.is_blocked(direct, radius) {
        return (desired, false);
    }

    let hit = obstacles.first_contact(direct, radius);
    if let Some((obstacle, contact)) = hit {
        state.last_obstacle_center = Some(contact.obstacle_center);
        let needs_detour = state.detour.map_or(true, |d| d.obstacle != obstacle.id);
        if needs_detour {
            start_detour(
                state,
                position,
                goal,
                obstacle.id,
                &obstacle.shape,
                contact.obstacle_center,
                contact.obstacle_radius,
                now_ms,
                config,
            );
        }
    }

    let preferred = state.detour.map_or(Side::Left, |d| d.side);
    for scale in FAN_SCALES {
        for angle in FAN_ANGLES_DEG {
            if angle == 0.0 {
                // The full-length direct step was already rejected.
                if scale < 1.0 {
                    let candidate = desired * scale;
                    if !obstacles.is_blocked(position + candidate, radius) {
                        return (candidate, true);
                    }
                }
                continue;
            }
            for sign in [preferred.sign(), -preferred.sign()] {
                let candidate = desired.rotate((sign * angle).to_radians()) * scale;
                if !obstacles.is_blocked(position + candidate, radius) {
                    return (candidate, true);
                }
            }
        }
    }

    if let Some((_, contact)) = hit {
        if !obstacles.is_blocked(contact.corrected, radius) {
            return (contact.corrected - position, true);
        }
    }

    (settle(position, radius, obstacles), true)
}

/// Plan a waypoint beside the obstacle, reusing a remembered side.
fn start_detour(
    state: &mut SteeringState,
    position: Vec2,
    goal: Vec2,
    obstacle: ObstacleId,
    shape: &Shape,
    center: Vec2,
    obstacle_radius: f32,
    now_ms: f64,
    config: &SimConfig,
) {
    let approach = (center - position).normalize_or((goal - position).normalize_or(Vec2::X));
    let offset = obstacle_radius + config.unit_radius + config.detour_clearance;
    let waypoint_for = |side: Side| {
        let tangent = approach.perp() * side.sign();
        let beside = center + tangent * offset;
        match shape {
            Shape::Rect(rect) => rect_waypoint(rect, position, tangent, config).unwrap_or(beside),
            Shape::Circle { .. } => beside,
        }
    };

    let side = state.remembered_side(center).unwrap_or_else(|| {
        let cost = |w: Vec2| position.distance(w) + w.distance(goal);
        if cost(waypoint_for(Side::Left)) <= cost(waypoint_for(Side::Right)) {
            Side::Left
        } else {
            Side::Right
        }
    });
    state.remember_side(center, side);

    let waypoint = waypoint_for(side);
    state.detour = Some(Detour {
        waypoint,
        expires_at_ms: now_ms + f64::from(config.detour_expiry_ms),
        side,
        obstacle,
    });

    tracing::debug!(
        obstacle = ?obstacle,
        ?side,
        waypoint_x = waypoint.x,
        waypoint_y = waypoint.y,
        "Detour created"
    );
}

/// Waypoint past the corner that ends the face the unit is blocked by,
/// toward `tangent`.
///
/// A unit beside a face keeps its distance from that face (at least one
/// unit radius) and targets the far end of it, `unit_radius +
/// detour_clearance` beyond the corner. A unit diagonal to the rectangle
/// picks whichever of the two adjacent corners lies further along
/// `tangent`. Returns `None` when the unit's center is inside the
/// rectangle.
fn rect_waypoint(rect: &Rect, position: Vec2, tangent: Vec2, config: &SimConfig) -> Option<Vec2> {
    let d = position - rect.center;
    let half = rect.half_extents;
    let beyond = config.unit_radius + config.detour_clearance;
    let reach = Vec2::new(half.x + beyond, half.y + beyond);
    let hug = |along: f32, half: f32| along.abs().max(half + config.unit_radius);
    let dir = |value: f32| if value < 0.0 { -1.0 } else { 1.0 };

    let local = match (d.x.abs() > half.x, d.y.abs() > half.y) {
        (true, false) => Vec2::new(dir(d.x) * hug(d.x, half.x), dir(tangent.y) * reach.y),
        (false, true) => Vec2::new(dir(tangent.x) * reach.x, dir(d.y) * hug(d.y, half.y)),
        (true, true) => {
            let along_x = Vec2::new(dir(d.x) * hug(d.x, half.x), -dir(d.y) * reach.y);
            let along_y = Vec2::new(-dir(d.x) * reach.x, dir(d.y) * hug(d.y, half.y));
            if (along_x - d).dot(tangent) >= (along_y - d).dot(tangent) {
                along_x
            } else {
                along_y
            }
        }
        (false, false) => return None,
    };
    Some(rect.center + local)
}

/// Push a stationary unit out of whatever moved into it.
///
/// Returns zero when the unit is clear or cannot be improved.
fn settle(position: Vec2, radius: f32, obstacles: &ObstacleMap) -> Vec2 {
    let mut point = position;
    for _ in 0..4 {
        match obstacles.first_contact(point, radius) {
            Some((_, contact)) => point = contact.corrected,
            None => return point - position,
        }
    }
    if obstacles.penetration(point, radius) < obstacles.penetration(position, radius) {
        point - position
    } else {
        Vec2::ZERO
    }
}

/// Emergency displacement away from the last obstacle center.
fn nudge(
    state: &SteeringState,
    position: Vec2,
    desired: Vec2,
    obstacles: &ObstacleMap,
    config: &SimConfig,
) -> Option<Vec2> {
    let away = state
        .last_obstacle_center
        .and_then(|center| (position - center).try_normalize())
        .unwrap_or_else(|| (-desired).normalize_or(Vec2::X));

    [away, away.perp(), -away.perp()]
        .into_iter()
        .map(|dir| dir * config.stuck_nudge_distance)
        .find(|offset| !obstacles.is_blocked(position + *offset, config.unit_radius))
}
