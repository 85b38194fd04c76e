//! Team roster and troop capacity scenarios.

use slg_core::error::GameError;
use slg_core::repository::Repository;
use slg_test_utils::fixtures::{uniform, TestWorld};

fn world_with_roster() -> TestWorld {
    let world = TestWorld::new();
    world.register("u1");
    world.give_characters("u1", &["关羽", "张飞", "赵云", "诸葛亮"]);
    world
}

#[test]
fn test_unknown_character_rejected_before_ownership() {
    let world = world_with_roster();
    assert!(matches!(
        world.game.assign("u1", "貂蝉", 1, None),
        Err(GameError::UnknownCharacter(_))
    ));
    assert!(matches!(
        world.game.assign("u1", "吕布", 1, None),
        Err(GameError::CharacterNotOwned(_))
    ));
}

#[test]
fn test_assign_fills_first_empty_slot() {
    let world = world_with_roster();
    world.game.assign("u1", "关羽", 1, Some(2)).unwrap();
    let placed = world.game.assign("u1", "张飞", 1, None).unwrap();
    assert_eq!(placed.slot, 1);
    let placed = world.game.assign("u1", "赵云", 1, None).unwrap();
    assert_eq!(placed.slot, 3);
}

#[test]
fn test_character_occupies_one_slot() {
    let world = world_with_roster();
    world.game.assign("u1", "关羽", 1, None).unwrap();
    world.game.assign("u1", "关羽", 3, Some(2)).unwrap();

    let occupied: usize = world
        .game
        .list_teams("u1")
        .unwrap()
        .iter()
        .flat_map(|team| team.slots.iter())
        .filter(|slot| slot.member.as_ref().is_some_and(|(name, _)| name == "关羽"))
        .count();
    assert_eq!(occupied, 1);
    assert_eq!(world.repo.find_character_slot("u1", "关羽").unwrap(), Some((3, 2)));
}

#[test]
fn test_reinforce_then_level_up_keeps_troops() {
    let world = world_with_roster();
    world.game.assign("u1", "关羽", 1, None).unwrap();
    world.fund("u1", uniform(1_000));

    let filled = world.game.reinforce("u1", 1).unwrap();
    assert_eq!(filled.capacity, 600);
    assert_eq!(filled.troops, 600);

    world.game.upgrade_character("u1", "关羽").unwrap();
    let team = world.game.show_team("u1", 1).unwrap();
    assert_eq!(team.capacity, 800);
    assert_eq!(team.troops, 600, "leveling never refills");
}

#[test]
fn test_swapping_out_a_leveled_character_clamps_troops() {
    let world = world_with_roster();
    world.set_level("u1", "关羽", 5);
    world.game.assign("u1", "关羽", 1, None).unwrap();
    world.fund("u1", uniform(3_000));
    world.game.reinforce("u1", 1).unwrap();
    assert_eq!(world.game.show_team("u1", 1).unwrap().troops, 1_400);

    // 张飞 (level 1) evicts 关羽 (level 5) from the only occupied slot.
    world.game.assign("u1", "张飞", 1, Some(1)).unwrap();
    let team = world.game.show_team("u1", 1).unwrap();
    assert_eq!(team.capacity, 600);
    assert_eq!(team.troops, 600);
}

#[test]
fn test_full_team_error_leaves_roster_alone() {
    let world = world_with_roster();
    for name in ["关羽", "张飞", "赵云"] {
        world.game.assign("u1", name, 2, None).unwrap();
    }
    world.game.assign("u1", "诸葛亮", 1, None).unwrap();
    let before = world.game.list_teams("u1").unwrap();

    assert!(matches!(
        world.game.assign("u1", "诸葛亮", 2, None),
        Err(GameError::TeamFull(2))
    ));
    assert_eq!(world.game.list_teams("u1").unwrap(), before);
}

#[test]
fn test_team_out_of_range() {
    let world = world_with_roster();
    assert!(matches!(
        world.game.show_team("u1", 0),
        Err(GameError::InvalidTeam { team: 0, max: 3 })
    ));
    assert!(matches!(
        world.game.reinforce("u1", 9),
        Err(GameError::InvalidTeam { team: 9, .. })
    ));
}
