//! Proptest strategies.
//!
//! These generate random but reproducible players, balances and maps for
//! property-based tests of the engines.

use std::collections::BTreeMap;

use proptest::prelude::*;
use slg_core::map::{CityData, MapData, NodeType};
use slg_core::model::Player;
use slg_core::resources::{BuildingLevels, Resources};

/// Any balance up to `max` per resource.
pub fn arb_resources(max: u64) -> impl Strategy<Value = Resources> {
    (0..=max, 0..=max, 0..=max, 0..=max).prop_map(|(grain, gold, stone, troops)| Resources {
        grain,
        gold,
        stone,
        troops,
    })
}

/// Building levels in `1..=max_level`.
pub fn arb_building_levels(max_level: u8) -> impl Strategy<Value = BuildingLevels> {
    let level = 1..=max_level;
    (level.clone(), level.clone(), level.clone(), level).prop_map(
        |(farm, bank, quarry, barracks)| BuildingLevels {
            farm,
            bank,
            quarry,
            barracks,
        },
    )
}

/// Seconds between two actions: mostly short, sometimes days.
pub fn arb_elapsed() -> impl Strategy<Value = i64> {
    prop_oneof![
        3 => 0i64..600,
        2 => 600i64..86_400,
        1 => 86_400i64..(30 * 86_400),
    ]
}

/// A player with arbitrary buildings and balances, last settled at `last_tick`.
pub fn arb_player(last_tick: i64) -> impl Strategy<Value = Player> {
    (arb_building_levels(10), arb_resources(5_000), 0u32..40).prop_map(
        move |(buildings, resources, draw_count)| {
            let mut player = Player::new("prop", "prop", last_tick);
            player.buildings = buildings;
            player.resources = resources;
            player.draw_count = draw_count;
            player
        },
    )
}

/// Lifetime draw indices around the ramp.
pub fn arb_draw_index() -> impl Strategy<Value = u32> {
    1u32..40
}

/// Character levels.
pub fn arb_char_level() -> impl Strategy<Value = u8> {
    1u8..=7
}

/// Name of the `i`-th generated city.
#[must_use]
pub fn city_name(i: usize) -> String {
    format!("c{i:02}")
}

/// A random map of `2..max_cities` cities with random one-way gates.
///
/// Gates may duplicate, point both ways or be missing entirely, so the
/// graph is often disconnected.
pub fn arb_map_data(max_cities: usize) -> impl Strategy<Value = MapData> {
    (2..max_cities.max(3)).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 0..(n * 2)).prop_map(move |edges| {
            let mut cities: BTreeMap<String, CityData> = (0..n)
                .map(|i| {
                    (
                        city_name(i),
                        CityData {
                            province: "p".into(),
                            node_type: NodeType::City,
                            capital: false,
                            pos: (i32::try_from(i).unwrap_or(0), 0),
                            lines: BTreeMap::new(),
                            level: None,
                        },
                    )
                })
                .collect();
            for (gate, (from, to)) in edges.into_iter().enumerate() {
                if let Some(city) = cities.get_mut(&city_name(from)) {
                    city.lines.insert(format!("g{gate}"), city_name(to));
                }
            }
            MapData { cities }
        })
    })
}
