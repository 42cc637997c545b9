//! End-to-end tests for the prediction core.
//!
//! Every scenario drives [`PredictionSim`] the way a client frame loop does:
//! orders in, `tick(elapsed, &world)`, read the outbound messages.

use rts_predict::behavior::Behavior;
use rts_predict::config::SimConfig;
use rts_predict::harvest::HiddenResources;
use rts_predict::intents::Intent;
use rts_predict::math::Vec2;
use rts_predict::obstacles::ObstacleMap;
use rts_predict::simulation::PredictionSim;
use rts_predict::world::{UnitId, WorldSnapshot};
use rts_test_utils::fixtures::{
    rect_detour_world, sim_with_config, sim_with_units, v, WorldBuilder, FRAME_MS, LOCAL_PLAYER,
};

fn obstacle_map(world: &WorldSnapshot, config: &SimConfig) -> ObstacleMap {
    ObstacleMap::from_snapshot(world, LOCAL_PLAYER, config, &HiddenResources::default())
}

fn position(sim: &PredictionSim, id: u64) -> Vec2 {
    sim.unit(UnitId(id)).expect("unit is live").position
}

fn behavior(sim: &PredictionSim, id: u64) -> Behavior {
    sim.unit(UnitId(id)).expect("unit is live").behavior
}

/// Tick until `done` holds, returning the tick count; panics past `budget`.
fn run_until(
    sim: &mut PredictionSim,
    world: &WorldSnapshot,
    elapsed_ms: f32,
    budget: u32,
    mut done: impl FnMut(&PredictionSim) -> bool,
) -> u32 {
    for tick in 1..=budget {
        sim.tick(elapsed_ms, world);
        if done(sim) {
            return tick;
        }
    }
    panic!("condition not reached within {budget} ticks");
}

// =============================================================================
// Movement
// =============================================================================

mod movement {
    use super::*;

    #[test]
    fn test_open_ground_arrival_is_exact() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        let world = WorldSnapshot::default();
        sim.command_move(&[UnitId(1)], v(90.0, 120.0)).unwrap();

        // 150 units at 4.5 per frame
        let ticks = run_until(&mut sim, &world, FRAME_MS, 100, |s| {
            behavior(s, 1) == Behavior::Idle
        });
        assert!(ticks <= 35, "took {ticks} ticks");
        assert_eq!(position(&sim, 1), v(90.0, 120.0));

        let sync = sim.tick(FRAME_MS, &world).sync;
        assert_eq!(sync[0].move_target, Some(v(90.0, 120.0)));
        assert_eq!(sync[0].anim, rts_predict::animation::AnimMode::Idle);
    }

    #[test]
    fn test_rect_detour_reaches_goal_without_penetration() {
        let config = SimConfig::default();
        let world = rect_detour_world();
        let map = obstacle_map(&world, &config);
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(100.0, 0.0)).unwrap();

        let mut max_depth = 0.0_f32;
        let mut went_around = false;
        run_until(&mut sim, &world, FRAME_MS, 400, |s| {
            let p = position(s, 1);
            max_depth = max_depth.max(map.penetration(p, config.unit_radius));
            went_around |= p.y.abs() > 20.0 + config.unit_radius;
            behavior(s, 1) == Behavior::Idle
        });

        assert!(max_depth <= config.penetration_epsilon, "depth {max_depth}");
        assert!(went_around, "never cleared the wall");
        assert!(position(&sim, 1).distance(v(100.0, 0.0)) <= config.arrival_threshold);
    }

    #[test]
    fn test_unreachable_goal_gives_up() {
        let config = SimConfig {
            stuck_ticks: 5,
            ..SimConfig::default()
        };
        // Corridor just wide enough for the unit, plugged by a tree.
        let world = WorldBuilder::new()
            .tree(v(80.0, 0.0))
            .wall(v(100.0, 37.25), 200.0, 45.5)
            .wall(v(100.0, -37.25), 200.0, 45.5)
            .build();
        let map = obstacle_map(&world, &config);
        let mut sim = sim_with_config(config.clone(), &[(1, v(35.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(190.0, 0.0)).unwrap();

        run_until(&mut sim, &world, FRAME_MS, 300, |s| {
            let p = position(s, 1);
            assert!(map.penetration(p, config.unit_radius) <= config.penetration_epsilon);
            behavior(s, 1) == Behavior::Idle
        });
        assert!(position(&sim, 1).x < 80.0);
    }

    #[test]
    fn test_long_wall_is_passed_at_its_end() {
        let config = SimConfig::default();
        let world = WorldBuilder::new().wall(v(60.0, 0.0), 20.0, 400.0).build();
        let map = obstacle_map(&world, &config);
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(150.0, 0.0)).unwrap();

        let mut cleared_end = false;
        run_until(&mut sim, &world, FRAME_MS, 1500, |s| {
            let p = position(s, 1);
            assert!(map.penetration(p, config.unit_radius) <= config.penetration_epsilon);
            cleared_end |= p.y.abs() > 200.0;
            behavior(s, 1) == Behavior::Idle
        });

        assert!(cleared_end, "never reached the end of the wall");
        assert!(position(&sim, 1).distance(v(150.0, 0.0)) <= config.arrival_threshold);
        let unit = sim.unit(UnitId(1)).expect("unit is live");
        assert_eq!(unit.steering.recoveries, 0);
    }

    #[test]
    fn test_boxed_in_unit_gives_up() {
        let config = SimConfig::default();
        // A 2x2 pocket of free space: the unit twitches but never gets out.
        let world = WorldBuilder::new()
            .wall(v(25.0, 0.0), 20.0, 72.0)
            .wall(v(-25.0, 0.0), 20.0, 72.0)
            .wall(v(0.0, 25.0), 72.0, 20.0)
            .wall(v(0.0, -25.0), 72.0, 20.0)
            .build();
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(200.0, 0.0)).unwrap();

        let budget = config.stuck_ticks * (config.give_up_after_recoveries + 1);
        let ticks = run_until(&mut sim, &world, FRAME_MS, budget, |s| {
            behavior(s, 1) == Behavior::Idle
        });
        // One nudge per full window, giving up on the last one.
        assert!(ticks >= config.stuck_ticks * config.give_up_after_recoveries, "{ticks}");
        assert!(position(&sim, 1).length() <= 1.5);
    }

    #[test]
    fn test_local_units_pass_through_each_other() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0)), (2, v(100.0, 0.0))]);
        let world = WorldSnapshot::default();
        sim.issue(
            UnitId(1),
            rts_predict::behavior::Order::Move {
                target: v(100.0, 0.0),
                formation: rts_predict::behavior::FormationSlot::SOLO,
            },
        )
        .unwrap();
        run_until(&mut sim, &world, FRAME_MS, 60, |s| behavior(s, 1) == Behavior::Idle);
        assert_eq!(position(&sim, 1), position(&sim, 2));
    }
}

// =============================================================================
// Timing
// =============================================================================

mod timing {
    use super::*;

    fn arrival_time(elapsed_ms: f32) -> f64 {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        let world = WorldSnapshot::default();
        sim.command_move(&[UnitId(1)], v(200.0, 0.0)).unwrap();
        run_until(&mut sim, &world, elapsed_ms, 200, |s| {
            behavior(s, 1) == Behavior::Idle
        });
        sim.now_ms()
    }

    #[test]
    fn test_time_scale_invariance() {
        let at_60 = arrival_time(16.666);
        let at_30 = arrival_time(33.332);
        let at_20 = arrival_time(49.998);
        // Same distance covered in about the same simulated time, give or
        // take the last (longer) frame.
        assert!((at_60 - at_30).abs() <= 2.0 * 33.332, "{at_60} vs {at_30}");
        assert!((at_60 - at_20).abs() <= 2.0 * 49.998, "{at_60} vs {at_20}");
    }

    #[test]
    fn test_hitch_is_clamped() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(500.0, 0.0)).unwrap();
        let out = sim.tick(1000.0, &WorldSnapshot::default());
        assert!((out.dt_scale - 3.0).abs() < 1e-6);
        assert!((position(&sim, 1).x - 13.5).abs() < 1e-4);
    }

    #[test]
    fn test_bad_elapsed_means_no_movement() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.command_move(&[UnitId(1)], v(500.0, 0.0)).unwrap();
        for elapsed in [f32::NAN, -5.0, f32::INFINITY, 0.0] {
            let out = sim.tick(elapsed, &WorldSnapshot::default());
            assert_eq!(out.dt_scale, 0.0);
        }
        assert_eq!(position(&sim, 1), v(0.0, 0.0));
    }
}

// =============================================================================
// Combat
// =============================================================================

mod combat {
    use super::*;

    /// A world where the enemy sits `gap` units to the right of `anchor`.
    fn enemy_world(anchor: Vec2, gap: f32) -> WorldSnapshot {
        WorldBuilder::new()
            .enemy(9, anchor + v(gap, 0.0), 60.0)
            .build()
    }

    #[test]
    fn test_aggro_hysteresis() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);

        // Outside acquire radius: stays idle.
        sim.tick(FRAME_MS, &enemy_world(position(&sim, 1), 230.0));
        assert_eq!(behavior(&sim, 1), Behavior::Idle);

        // Inside: acquired.
        sim.tick(FRAME_MS, &enemy_world(position(&sim, 1), 190.0));
        assert!(matches!(behavior(&sim, 1), Behavior::Combat(_)));

        // Between acquire and lose radius: kept, even as the enemy flees.
        for _ in 0..20 {
            sim.tick(FRAME_MS, &enemy_world(position(&sim, 1), 250.0));
            assert!(matches!(behavior(&sim, 1), Behavior::Combat(_)));
        }

        // Past the lose radius: dropped.
        sim.tick(FRAME_MS, &enemy_world(position(&sim, 1), 270.0));
        assert_eq!(behavior(&sim, 1), Behavior::Idle);
    }

    #[test]
    fn test_user_attack_is_not_dropped_by_distance() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        let world = enemy_world(v(0.0, 0.0), 600.0);
        let target = rts_predict::combat::TargetRef::Unit {
            owner: rts_test_utils::fixtures::ENEMY_PLAYER,
            unit: UnitId(9),
        };
        sim.command_attack(&[UnitId(1)], target, &world).unwrap();
        for _ in 0..30 {
            sim.tick(FRAME_MS, &world);
        }
        assert!(matches!(behavior(&sim, 1), Behavior::Combat(t) if t.user_issued));
        assert!((position(&sim, 1).x - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_attack_intents_carry_scaled_damage() {
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        let world = enemy_world(v(0.0, 0.0), 30.0);
        let mut damages = Vec::new();
        for _ in 0..200 {
            for intent in sim.tick(FRAME_MS, &world).intents {
                if let Intent::AttackUnit {
                    damage, attacker, ..
                } = intent
                {
                    assert_eq!(attacker, UnitId(1));
                    damages.push(damage);
                }
            }
        }
        // One proposal per 500 ms cooldown, 30 dps per nominal frame.
        assert!(damages.len() >= 5 && damages.len() <= 7, "{damages:?}");
        for damage in damages {
            assert!((damage - 30.0 * 0.016_666).abs() < 1e-4);
        }
    }

    #[test]
    fn test_entity_targets_use_edge_distance() {
        let world = WorldBuilder::new()
            .target_entity(
                rts_predict::world::EntityKind::TownCenter,
                Some(rts_test_utils::fixtures::ENEMY_PLAYER),
                v(150.0, 0.0),
                500.0,
            )
            .build();
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        run_until(&mut sim, &world, FRAME_MS, 200, |s| {
            s.unit(UnitId(1))
                .is_some_and(|u| u.anim.mode == rts_predict::animation::AnimMode::Attack)
        });
        // Half of the 96-wide default footprint plus attack range.
        let x = position(&sim, 1).x;
        assert!(x >= 150.0 - 48.0 - 40.0 - 1e-3, "attacking from {x}");
        assert!(x < 150.0 - 48.0, "attacking from {x}");
    }
}

// =============================================================================
// Harvesting
// =============================================================================

mod harvest {
    use super::*;
    use rts_predict::behavior::Order;
    use rts_predict::world::{ResourceId, ResourceKind};

    #[test]
    fn test_one_collect_per_node() {
        let world = WorldBuilder::new()
            .resource(ResourceKind::Green, v(0.0, 0.0))
            .build();
        let mut sim = sim_with_units(&[(1, v(-45.0, 0.0)), (2, v(45.0, 0.0)), (3, v(0.0, 45.0))]);
        for id in 1..=3 {
            sim.issue(UnitId(id), Order::Harvest(ResourceId(1))).unwrap();
        }

        let mut collected = Vec::new();
        for _ in 0..400 {
            for intent in sim.tick(FRAME_MS, &world).intents {
                if let Intent::CollectResource { unit, kind, amount, .. } = intent {
                    assert_eq!(kind, ResourceKind::Green);
                    assert_eq!(amount, 1);
                    collected.push(unit);
                }
            }
        }
        assert_eq!(collected, vec![UnitId(1)]);
        for id in 1..=3 {
            assert_eq!(behavior(&sim, id), Behavior::Idle);
        }
    }

    #[test]
    fn test_hidden_node_stops_blocking() {
        let world = WorldBuilder::new()
            .resource(ResourceKind::Red, v(0.0, 0.0))
            .build();
        let mut sim = sim_with_units(&[(1, v(-40.0, 0.0))]);
        sim.issue(UnitId(1), Order::Harvest(ResourceId(1))).unwrap();
        run_until(&mut sim, &world, FRAME_MS, 200, |s| {
            s.hidden_resources().contains(ResourceId(1))
        });

        // With the node hidden the unit can walk straight over it.
        sim.command_move(&[UnitId(1)], v(40.0, 0.0)).unwrap();
        run_until(&mut sim, &world, FRAME_MS, 40, |s| behavior(s, 1) == Behavior::Idle);
        assert_eq!(position(&sim, 1), v(40.0, 0.0));
    }

    #[test]
    fn test_removed_node_abandons_harvest() {
        let world = WorldBuilder::new()
            .resource(ResourceKind::Blue, v(300.0, 0.0))
            .build();
        let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
        sim.issue(UnitId(1), Order::Harvest(ResourceId(1))).unwrap();
        for _ in 0..10 {
            sim.tick(FRAME_MS, &world);
        }
        assert!(matches!(behavior(&sim, 1), Behavior::Harvesting { .. }));

        let out = sim.tick(FRAME_MS, &WorldSnapshot::default());
        assert!(out.intents.is_empty());
        assert_eq!(behavior(&sim, 1), Behavior::Idle);
    }
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;
    use rts_test_utils::determinism::strategies;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_units_never_enter_obstacles(
            world in strategies::arb_tree_world(10, 250.0),
            order in strategies::arb_move_order(250.0),
            frames in strategies::arb_frame_sequence(150),
        ) {
            let config = SimConfig::default();
            // Keep the spawn point clear.
            let world = WorldSnapshot {
                trees: world
                    .trees
                    .into_iter()
                    .filter(|t| t.position.length() > config.tree_radius + config.unit_radius + 1.0)
                    .collect(),
                ..world
            };
            let map = obstacle_map(&world, &config);
            let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
            sim.issue(UnitId(1), order).unwrap();

            for elapsed in frames {
                sim.tick(elapsed, &world);
                let p = position(&sim, 1);
                prop_assert!(p.is_finite());
                prop_assert!(map.penetration(p, config.unit_radius) <= config.penetration_epsilon);
            }
        }

        #[test]
        fn prop_units_never_enter_walls(
            world in strategies::arb_wall_world(8, 250.0),
            order in strategies::arb_move_order(300.0),
            frames in strategies::arb_frame_sequence(200),
        ) {
            let config = SimConfig::default();
            let map = obstacle_map(&world, &config);
            let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
            sim.issue(UnitId(1), order).unwrap();

            for elapsed in frames {
                sim.tick(elapsed, &world);
                let p = position(&sim, 1);
                prop_assert!(p.is_finite());
                prop_assert!(map.penetration(p, config.unit_radius) <= config.penetration_epsilon);
            }
        }

        #[test]
        fn prop_walled_moves_progress_or_recover(
            world in strategies::arb_wall_world(8, 250.0),
            target in strategies::arb_position(300.0),
        ) {
            let config = SimConfig::default();
            let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
            sim.command_move(&[UnitId(1)], target).unwrap();

            // Any span this long holds a full progress window.
            let span = (config.stuck_ticks * 2 + 1) as usize;
            let mut history = vec![(Vec2::ZERO, 0_u32)];
            for _ in 0..600 {
                sim.tick(FRAME_MS, &world);
                let unit = sim.unit(UnitId(1)).expect("unit is live");
                if !matches!(unit.behavior, Behavior::ManualMove { .. }) {
                    break;
                }
                history.push((unit.position, unit.steering.recoveries));

                if history.len() > span {
                    let recent = &history[history.len() - 1 - span..];
                    let (start, start_recoveries) = recent[0];
                    let recovered = unit.steering.recoveries > start_recoveries;
                    let moved = recent.iter().any(|(p, _)| p.distance(start) >= 2.0);
                    prop_assert!(recovered || moved, "stalled near {:?}", start);
                }
            }
        }

        #[test]
        fn prop_open_ground_moves_converge(
            target in strategies::arb_position(400.0),
        ) {
            let mut sim = sim_with_units(&[(1, v(0.0, 0.0))]);
            sim.command_move(&[UnitId(1)], target).unwrap();
            let world = WorldSnapshot::default();
            let budget = (target.length() / 4.5).ceil() as u32 + 2;
            for _ in 0..budget {
                sim.tick(FRAME_MS, &world);
            }
            prop_assert_eq!(behavior(&sim, 1), Behavior::Idle);
            prop_assert!(position(&sim, 1).distance(target) < 1e-3);
        }
    }
}
