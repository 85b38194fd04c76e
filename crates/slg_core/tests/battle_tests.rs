//! Battle preparation and verdict handling.

use std::sync::Arc;

use slg_core::battle::{BattleJudge, Odds, Side, Verdict};
use slg_core::error::{ErrorKind, GameError};
use slg_test_utils::fixtures::{uniform, ScriptedJudge, TestWorld};

fn verdict(winner: Side, a: f64, b: f64) -> Verdict {
    Verdict {
        winner,
        odds: Odds { a, b },
        confidence: "medium".into(),
    }
}

/// `u1` fields 关羽 with a full team, `u2` fields 孙尚香 with no troops.
fn armed(world: TestWorld) -> TestWorld {
    world.register("u1");
    world.register("u2");
    world.give_characters("u1", &["关羽"]);
    world.give_characters("u2", &["孙尚香"]);
    world.game.assign("u1", "关羽", 1, None).unwrap();
    world.game.assign("u2", "孙尚香", 1, None).unwrap();
    world.fund("u1", uniform(1_000));
    world.game.reinforce("u1", 1).unwrap();
    world
}

#[test]
fn test_judge_sees_members_troops_and_profiles() {
    let judge = Arc::new(ScriptedJudge::answering(verdict(Side::B, 0.4, 0.6)));
    let world = armed(TestWorld::with_judge(Arc::clone(&judge) as Arc<dyn BattleJudge>));

    let report = world.game.battle("u1", "u2").unwrap();
    assert_eq!(report.verdict.winner, Side::B);

    let requests = judge.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.attacker.members, ["关羽"]);
    assert_eq!(request.attacker.troops, 600);
    assert!(request.attacker.profile.combat > 0.0);
    assert!(request.attacker.profile.morale > 0.5);
    assert_eq!(request.defender.members, ["孙尚香"]);
    assert_eq!(request.defender.troops, 0);
    assert!(request.defender.profile.sustain > 0.0);
}

#[test]
fn test_unavailable_judge() {
    let world = armed(TestWorld::with_judge(Arc::new(ScriptedJudge::unavailable())));
    let err = world.game.battle("u1", "u2").unwrap_err();
    assert!(matches!(err, GameError::JudgeUnavailable(_)));
    assert_eq!(err.kind(), ErrorKind::External);
}

#[test]
fn test_invalid_verdict_is_rejected() {
    let judge = ScriptedJudge::answering(verdict(Side::A, 0.7, 0.7));
    let world = armed(TestWorld::with_judge(Arc::new(judge)));
    assert!(matches!(
        world.game.battle("u1", "u2"),
        Err(GameError::InvalidVerdict(_))
    ));
}

#[test]
fn test_empty_team_cannot_fight() {
    let world = armed(TestWorld::new());
    world.register("u3");
    assert!(matches!(
        world.game.battle("u1", "u3"),
        Err(GameError::EmptyBattleTeam(user)) if user == "u3"
    ));
    assert!(matches!(
        world.game.battle("u1", "ghost"),
        Err(GameError::NotRegistered(_))
    ));
}

#[test]
fn test_offline_judge_favors_the_stronger_garrison() {
    let world = armed(TestWorld::new());
    let report = world.game.battle("u1", "u2").unwrap();

    assert_eq!(report.verdict.winner, Side::A);
    assert!((report.verdict.odds.a - 0.55).abs() < 1e-9);
    assert!((report.verdict.odds.b - 0.45).abs() < 1e-9);
    assert_eq!(report.verdict.confidence, "low");

    let text = report.to_string();
    assert!(text.contains("A: u1 [关羽] 600 troops"), "{text}");
    assert!(text.contains("Winner A (A 55% / B 45%"), "{text}");
}

#[test]
fn test_battles_write_nothing() {
    let world = armed(TestWorld::new());
    let before = (world.player("u1"), world.player("u2"));
    world.game.battle("u1", "u2").unwrap();
    assert_eq!((world.player("u1"), world.player("u2")), before);
    assert_eq!(world.game.show_team("u1", 1).unwrap().troops, 600);
}
