//! Alliance siege lifecycle scenarios.

use slg_core::error::{ErrorKind, GameError};
use slg_core::game::GameConfig;
use slg_core::model::{SiegeResult, SiegeState};
use slg_core::repository::Repository;
use slg_core::siege::SiegePhase;
use slg_core::tables::{Balance, SiegeBalance};
use slg_test_utils::fixtures::{TestWorld, MINUTE, START};

/// Leader `u1` and member `u2` in alliance 蜀. `u2` sits in 邺城 (one hop from
/// 洛阳) with a team 1 level sum of 20.
fn alliance_world(world: TestWorld) -> TestWorld {
    for user in ["u1", "u2"] {
        world.register(user);
    }
    world.game.create_alliance("u1", "蜀").unwrap();
    world.game.join_alliance("u2", "蜀").unwrap();

    world.place_base("u2", "邺城");
    world.give_characters("u2", &["关羽", "张飞", "赵云"]);
    for (name, level) in [("关羽", 7), ("张飞", 7), ("赵云", 6)] {
        world.set_level("u2", name, level);
        world.game.assign("u2", name, 1, None).unwrap();
    }
    world
}

const START_IN: i64 = 10 * MINUTE;

// =============================================================================
// Scheduling
// =============================================================================

mod scheduling {
    use super::*;

    #[test]
    fn test_only_leader_schedules() {
        let world = alliance_world(TestWorld::new());
        assert!(matches!(
            world.game.schedule_siege("u2", "洛阳", START + START_IN),
            Err(GameError::NotLeader)
        ));
        world.register("loner");
        assert!(matches!(
            world.game.schedule_siege("loner", "洛阳", START + START_IN),
            Err(GameError::NotInAlliance)
        ));
    }

    #[test]
    fn test_unknown_city() {
        let world = alliance_world(TestWorld::new());
        assert!(matches!(
            world.game.schedule_siege("u1", "许昌", START + START_IN),
            Err(GameError::UnknownCity(_))
        ));
    }

    #[test]
    fn test_one_active_siege_per_alliance() {
        let world = alliance_world(TestWorld::new());
        let first = world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        assert_eq!(first.state, SiegeState::Scheduled);
        assert_eq!(first.city_level, 2);

        let err = world
            .game
            .schedule_siege("u1", "襄阳", START + START_IN)
            .unwrap_err();
        assert!(matches!(err, GameError::SiegeAlreadyActive(id) if id == first.id.0));
    }

    #[test]
    fn test_start_time_near_overflow_is_rejected() {
        let world = alliance_world(TestWorld::new());
        let err = world
            .game
            .schedule_siege("u1", "洛阳", i64::MAX - 10)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidStartTime(t) if t == i64::MAX - 10));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            world.game.siege_status("u1"),
            Err(GameError::NoActiveSiege)
        ));

        // The latest start that still fits a whole window is accepted.
        let window = Balance::default().siege.window_secs();
        let siege = world.game.schedule_siege("u1", "洛阳", i64::MAX - window).unwrap();
        world.game.join_rally("u2").unwrap();
        let report = world.game.siege_status("u1").unwrap();
        assert_eq!(report.phase, SiegePhase::Queue);
        assert_eq!(report.end_at, i64::MAX);
        assert_eq!(report.siege.id, siege.id);
    }

    #[test]
    fn test_city_level_is_clamped() {
        let world = alliance_world(TestWorld::new());
        let siege = world.game.schedule_siege("u1", "长安", START).unwrap();
        assert_eq!(siege.city_level, 4);
    }
}

// =============================================================================
// Rallying
// =============================================================================

mod rallying {
    use super::*;

    #[test]
    fn test_rally_needs_active_siege_and_base() {
        let world = alliance_world(TestWorld::new());
        assert!(matches!(
            world.game.join_rally("u2"),
            Err(GameError::NoActiveSiege)
        ));
        world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        assert!(matches!(
            world.game.join_rally("u1"),
            Err(GameError::NoBaseCity)
        ));
    }

    #[test]
    fn test_rally_records_path_and_eta() {
        let world = alliance_world(TestWorld::new());
        world.place_base("u1", "成都");
        world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();

        let rally = world.game.join_rally("u1").unwrap();
        assert_eq!(rally.participant.path, ["成都", "汉中", "长安", "洛阳"]);
        assert_eq!(rally.participant.hops, 3);
        assert_eq!(rally.participant.eta, START + 3 * 5 * MINUTE);
    }

    #[test]
    fn test_disconnected_base_is_explicit_failure() {
        let world = alliance_world(TestWorld::new());
        world.place_base("u1", "夷州");
        world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        assert!(matches!(
            world.game.join_rally("u1"),
            Err(GameError::NoPath { .. })
        ));
    }

    #[test]
    fn test_rejoining_replaces_the_march() {
        let world = alliance_world(TestWorld::new());
        let siege = world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        world.game.join_rally("u2").unwrap();

        world.place_base("u2", "建业");
        world.clock.advance_minutes(1);
        let again = world.game.join_rally("u2").unwrap();
        assert_eq!(again.participant.hops, 3);

        let participants = world.repo.list_participants(siege.id).unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].from_city, "建业");
    }
}

// =============================================================================
// Status and finalization
// =============================================================================

mod finalization {
    use super::*;

    #[test]
    fn test_level_two_siege_fails_below_threshold() {
        let world = alliance_world(TestWorld::new());
        let siege = world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        world.game.join_rally("u2").unwrap();

        let queue = world.game.siege_status("u1").unwrap();
        assert_eq!(queue.phase, SiegePhase::Queue);
        assert!(queue.to_string().contains("u2 from 邺城, 1 hop(s)"));

        // Re-join at the start time: 邺城 is one hop away, so arrival is
        // start + 5 minutes.
        world.clock.set(START + START_IN);
        world.game.join_rally("u2").unwrap();

        world.clock.advance_minutes(12);
        let ongoing = world.game.siege_status("u2").unwrap();
        assert_eq!(ongoing.phase, SiegePhase::Ongoing);
        assert_eq!(ongoing.total_points, 7 * 20);
        assert_eq!(
            world.repo.siege(siege.id).unwrap().unwrap().state,
            SiegeState::Ongoing
        );

        world.clock.set(START + START_IN + 30 * MINUTE);
        let done = world.game.siege_status("u1").unwrap();
        assert_eq!(done.participants[0].minutes, 25);
        assert_eq!(done.total_points, 500);
        assert_eq!(done.threshold, 4000);
        assert_eq!(done.phase, SiegePhase::Finished(SiegeResult::Fail));

        let stored = world.repo.siege(siege.id).unwrap().unwrap();
        assert_eq!(stored.state, SiegeState::Done);
        assert_eq!(stored.result, Some(SiegeResult::Fail));
    }

    #[test]
    fn test_finalization_happens_once() {
        let world = alliance_world(TestWorld::new());
        let siege = world.game.schedule_siege("u1", "洛阳", START).unwrap();
        world.game.join_rally("u2").unwrap();

        world.clock.set(START + 31 * MINUTE);
        let first = world.game.siege_status("u1").unwrap();
        assert!(!world
            .repo
            .transition_siege(
                siege.id,
                SiegeState::Done,
                Some(SiegeResult::Success),
                Some(u64::MAX)
            )
            .unwrap());

        world.clock.advance_minutes(90);
        let later = world.game.siege_status("u2").unwrap();
        assert_eq!(later.phase, first.phase);
        assert_eq!(later.siege.result, first.siege.result);
        assert_eq!(later.total_points, first.total_points);
    }

    #[test]
    fn test_points_are_frozen_after_finalization() {
        let world = alliance_world(TestWorld::new());
        let siege = world.game.schedule_siege("u1", "洛阳", START).unwrap();
        world.game.join_rally("u2").unwrap();

        world.clock.set(START + 30 * MINUTE);
        let done = world.game.siege_status("u1").unwrap();
        assert_eq!(done.total_points, 25 * 20);
        assert_eq!(
            world.repo.siege(siege.id).unwrap().unwrap().final_points,
            Some(500)
        );

        world.set_level("u2", "赵云", 7);
        world.clock.advance_minutes(60);
        let later = world.game.siege_status("u2").unwrap();
        assert_eq!(later.phase, SiegePhase::Finished(SiegeResult::Fail));
        assert_eq!(later.total_points, 500);
        assert!(later.to_string().contains("progress 500/4000"), "{later}");
    }

    #[test]
    fn test_threshold_reached_is_success() {
        let balance = Balance {
            siege: SiegeBalance {
                city_thresholds: vec![100, 500, 1000, 2000],
                ..SiegeBalance::default()
            },
            ..Balance::default()
        };
        let world = alliance_world(TestWorld::with_config(GameConfig {
            balance,
            seed: Some(1),
        }));
        world.game.schedule_siege("u1", "洛阳", START + START_IN).unwrap();
        world.clock.set(START + START_IN);
        world.game.join_rally("u2").unwrap();

        world.clock.set(START + START_IN + 30 * MINUTE);
        let report = world.game.siege_status("u1").unwrap();
        assert_eq!(report.total_points, 500);
        assert_eq!(report.phase, SiegePhase::Finished(SiegeResult::Success));
        assert!(report.to_string().contains("Result: success"));
    }

    #[test]
    fn test_new_siege_allowed_after_done() {
        let world = alliance_world(TestWorld::new());
        world.game.schedule_siege("u1", "洛阳", START).unwrap();
        world.clock.set(START + 30 * MINUTE);
        world.game.siege_status("u1").unwrap();

        let next = world
            .game
            .schedule_siege("u1", "襄阳", START + 60 * MINUTE)
            .unwrap();
        assert_eq!(next.city_level, 3);
        let status = world.game.siege_status("u1").unwrap();
        assert_eq!(status.siege.id, next.id);
        assert_eq!(status.phase, SiegePhase::Queue);
    }

    #[test]
    fn test_status_without_any_siege() {
        let world = alliance_world(TestWorld::new());
        assert!(matches!(
            world.game.siege_status("u1"),
            Err(GameError::NoActiveSiege)
        ));
    }
}
