//! Balancing tables.
//!
//! All tunable numbers live in [`Balance`]. The defaults are the shipped
//! balance; a RON file can override any of it. Tables indexed by level keep a
//! dummy entry at index 0 so that `table[level]` reads naturally.
//!
//! # Example RON
//!
//! ```ron
//! Balance(
//!     max_building_level: 10,
//!     alliance_max_members: 20,
//!     siege: SiegeBalance(
//!         window_minutes: 30,
//!         edge_minutes: 5,
//!         city_thresholds: [1200, 4000, 12000, 25600],
//!     ),
//!     ..
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::resources::{Building, PerBuilding, PerResource, ResourceKind, Resources};

/// Seconds in one settlement minute.
pub const MINUTE: i64 = 60;

/// Inclusive interpolation endpoints for a cost curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostRange {
    /// Cost at the first priced step.
    pub start: u64,
    /// Cost at the last priced step and beyond.
    pub end: u64,
}

impl CostRange {
    /// Create a cost range.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// Interpolate `start..=end` at `step / steps`, rounding half away from zero.
///
/// Integer-only so the result is identical on every platform.
#[must_use]
pub fn lerp_rounded(start: u64, end: u64, step: u64, steps: u64) -> u64 {
    if steps == 0 || step >= steps {
        return end;
    }
    if end >= start {
        start + ((end - start) * step * 2 + steps) / (2 * steps)
    } else {
        start - ((start - end) * step * 2 + steps) / (2 * steps)
    }
}

/// Team and character tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamBalance {
    /// Teams per player.
    pub team_count: u8,
    /// Slots per team.
    pub team_slots: u8,
    /// Troop capacity of an empty team.
    pub base_troops: u64,
    /// Extra capacity per level of each assigned character.
    pub troops_per_level: u64,
    /// Character level cap.
    pub char_level_max: u8,
    /// Level-up cost from target level 2 (`start`) to the cap (`end`).
    pub char_level_up_cost: PerResource<CostRange>,
}

impl Default for TeamBalance {
    fn default() -> Self {
        Self {
            team_count: 3,
            team_slots: 3,
            base_troops: 400,
            troops_per_level: 200,
            char_level_max: 7,
            char_level_up_cost: PerResource {
                grain: CostRange::new(10, 700),
                gold: CostRange::new(10, 1400),
                stone: CostRange::new(0, 0),
                troops: CostRange::new(10, 700),
            },
        }
    }
}

/// Gacha price curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GachaBalance {
    /// Draws `1..=free_draws` cost nothing.
    pub free_draws: u32,
    /// Draw index at which the price stops rising.
    pub ramp_end: u32,
    /// Price of draw `free_draws + 1` (`start`) and of `ramp_end` onward (`end`).
    pub cost: PerResource<CostRange>,
}

impl Default for GachaBalance {
    fn default() -> Self {
        Self {
            free_draws: 5,
            ramp_end: 15,
            cost: PerResource {
                grain: CostRange::new(10, 800),
                gold: CostRange::new(10, 1000),
                stone: CostRange::new(10, 500),
                troops: CostRange::new(10, 1000),
            },
        }
    }
}

/// Siege timing and thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeBalance {
    /// Length of the contribution window.
    pub window_minutes: i64,
    /// March time per hop.
    pub edge_minutes: i64,
    /// Points needed to take a city, indexed by city level minus one.
    pub city_thresholds: Vec<u64>,
}

impl Default for SiegeBalance {
    fn default() -> Self {
        Self {
            window_minutes: 30,
            edge_minutes: 5,
            city_thresholds: vec![1200, 4000, 12000, 25600],
        }
    }
}

impl SiegeBalance {
    /// Highest city level that has a threshold.
    #[must_use]
    pub fn max_city_level(&self) -> u8 {
        u8::try_from(self.city_thresholds.len()).unwrap_or(u8::MAX).max(1)
    }

    /// Clamp a raw city level to the supported range.
    #[must_use]
    pub fn clamp_city_level(&self, level: u8) -> u8 {
        level.clamp(1, self.max_city_level())
    }

    /// Points needed for a city of this level.
    #[must_use]
    pub fn threshold(&self, city_level: u8) -> u64 {
        let idx = usize::from(self.clamp_city_level(city_level)) - 1;
        self.city_thresholds.get(idx).copied().unwrap_or(0)
    }

    /// Window length in seconds.
    #[must_use]
    pub const fn window_secs(&self) -> i64 {
        self.window_minutes * MINUTE
    }
}

/// Every tunable number in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Building level cap.
    pub max_building_level: u8,
    /// Production per minute, indexed by building level.
    pub production_per_minute: PerResource<Vec<u64>>,
    /// Storage cap, indexed by building level.
    pub capacity: PerResource<Vec<u64>>,
    /// Stone paid to reach a level, indexed by target level.
    pub upgrade_stone_cost: PerBuilding<Vec<u64>>,
    /// Own-resource cost to reach a level, indexed by target level.
    pub upgrade_own_cost: PerResource<Vec<u64>>,
    /// Teams and characters.
    pub team: TeamBalance,
    /// Gacha prices.
    pub gacha: GachaBalance,
    /// Alliance member cap.
    pub alliance_max_members: usize,
    /// Siege tuning.
    pub siege: SiegeBalance,
    /// Provinces whose cities can host a player base.
    pub base_provinces: Vec<String>,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            max_building_level: 10,
            production_per_minute: PerResource {
                grain: vec![0, 8, 12, 18, 26, 35, 45, 57, 71, 86, 102],
                gold: vec![0, 5, 8, 11, 15, 20, 26, 33, 42, 53, 65],
                stone: vec![0, 3, 6, 9, 14, 18, 24, 32, 41, 51, 63],
                troops: vec![0, 2, 2, 3, 5, 6, 9, 12, 17, 23, 30],
            },
            capacity: PerResource {
                grain: vec![0, 972, 1602, 2412, 3384, 4518, 5796, 7254, 8856, 10890, 12924],
                gold: vec![0, 810, 1386, 2106, 2916, 3870, 5004, 6300, 7740, 9360, 10980],
                stone: vec![0, 1134, 2016, 3078, 4266, 5652, 7182, 8892, 10728, 12744, 14760],
                troops: vec![0, 360, 540, 720, 972, 1386, 1854, 2412, 3060, 3798, 4536],
            },
            upgrade_stone_cost: PerBuilding {
                farm: vec![0, 0, 170, 340, 510, 730, 980, 1280, 1620, 2050, 2560],
                bank: vec![0, 0, 210, 380, 600, 850, 1150, 1490, 1880, 2300, 2820],
                quarry: vec![0, 0, 260, 470, 730, 1020, 1370, 1750, 2180, 2650, 3160],
                barracks: vec![0, 0, 300, 510, 770, 1070, 1410, 1790, 2220, 2690, 3200],
            },
            upgrade_own_cost: PerResource {
                grain: vec![0, 0, 510, 850, 1280, 1790, 2390, 3070, 3840, 4690, 5760],
                gold: vec![0, 0, 430, 730, 1110, 1540, 2050, 2650, 3330, 4100, 4950],
                stone: vec![0, 0, 340, 600, 900, 1240, 1620, 2050, 2520, 3030, 3580],
                troops: vec![0, 0, 130, 210, 340, 510, 730, 980, 1280, 1620, 2010],
            },
            team: TeamBalance::default(),
            gacha: GachaBalance::default(),
            alliance_max_members: 20,
            siege: SiegeBalance::default(),
            base_provinces: ["益", "扬", "冀", "兖"].map(String::from).to_vec(),
        }
    }
}

fn at_level(table: &[u64], level: u8) -> u64 {
    table.get(usize::from(level)).copied().unwrap_or(0)
}

impl Balance {
    /// Parse a balance from RON and validate it.
    ///
    /// Missing fields fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or the tables are inconsistent.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let balance: Self = ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<balance>".into(),
            message: e.to_string(),
        })?;
        balance.validate()?;
        Ok(balance)
    }

    /// Clamp a stored building level into `1..=max_building_level`.
    #[must_use]
    pub fn clamp_level(&self, level: u8) -> u8 {
        level.clamp(1, self.max_building_level)
    }

    /// Production per minute of `kind` at a building level.
    #[must_use]
    pub fn production(&self, kind: ResourceKind, level: u8) -> u64 {
        at_level(self.production_per_minute.get(kind), self.clamp_level(level))
    }

    /// Storage cap of `kind` at a building level.
    #[must_use]
    pub fn capacity(&self, kind: ResourceKind, level: u8) -> u64 {
        at_level(self.capacity.get(kind), self.clamp_level(level))
    }

    /// Cost to bring `building` up to `target_level`.
    ///
    /// The fixed stone part and the own-resource part are merged, so the
    /// quarry pays a single combined stone amount.
    #[must_use]
    pub fn upgrade_cost(&self, building: Building, target_level: u8) -> Resources {
        let stone = at_level(self.upgrade_stone_cost.get(building), target_level);
        let own = at_level(self.upgrade_own_cost.get(building.resource()), target_level);
        Resources::only(ResourceKind::Stone, stone) + Resources::only(building.resource(), own)
    }

    /// Cost to bring a character up to `target_level`.
    #[must_use]
    pub fn char_level_up_cost(&self, target_level: u8) -> Resources {
        let max = self.team.char_level_max;
        Resources::from_fn(|kind| {
            let range = self.team.char_level_up_cost.get(kind);
            if target_level <= 2 {
                range.start
            } else {
                lerp_rounded(
                    range.start,
                    range.end,
                    u64::from(target_level - 2),
                    u64::from(max.saturating_sub(2)),
                )
            }
        })
    }

    /// Price of the `n`-th lifetime draw (1-based).
    #[must_use]
    pub fn draw_cost(&self, n: u32) -> Resources {
        let free = self.gacha.free_draws;
        if n <= free {
            return Resources::ZERO;
        }
        let first_paid = free + 1;
        let steps = u64::from(self.gacha.ramp_end.saturating_sub(first_paid));
        let step = u64::from(n - first_paid);
        Resources::from_fn(|kind| {
            let range = self.gacha.cost.get(kind);
            lerp_rounded(range.start, range.end, step, steps)
        })
    }

    /// Check table shapes and ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let need = usize::from(self.max_building_level) + 1;
        if self.max_building_level < 1 {
            return Err(GameError::InvalidData("max_building_level must be >= 1".into()));
        }
        for kind in ResourceKind::ALL {
            for (name, table) in [
                ("production_per_minute", self.production_per_minute.get(kind)),
                ("capacity", self.capacity.get(kind)),
                ("upgrade_own_cost", self.upgrade_own_cost.get(kind)),
            ] {
                if table.len() != need {
                    return Err(GameError::InvalidData(format!(
                        "{name}.{kind} has {} entries, expected {need}",
                        table.len()
                    )));
                }
            }
        }
        for building in Building::ALL {
            let table = self.upgrade_stone_cost.get(building);
            if table.len() != need {
                return Err(GameError::InvalidData(format!(
                    "upgrade_stone_cost.{building} has {} entries, expected {need}",
                    table.len()
                )));
            }
        }
        if self.team.team_count == 0 || self.team.team_slots == 0 {
            return Err(GameError::InvalidData("teams need at least one slot".into()));
        }
        if self.team.char_level_max < 2 {
            return Err(GameError::InvalidData("char_level_max must be >= 2".into()));
        }
        if self.gacha.ramp_end <= self.gacha.free_draws {
            return Err(GameError::InvalidData(
                "gacha.ramp_end must be after the free draws".into(),
            ));
        }
        if self.siege.city_thresholds.is_empty() {
            return Err(GameError::InvalidData("siege.city_thresholds is empty".into()));
        }
        if self.siege.window_minutes <= 0 || self.siege.edge_minutes < 0 {
            return Err(GameError::InvalidData("siege timings must be positive".into()));
        }
        if self.siege.window_minutes.checked_mul(MINUTE).is_none() {
            return Err(GameError::InvalidData("siege.window_minutes is too large".into()));
        }
        if self.alliance_max_members == 0 {
            return Err(GameError::InvalidData("alliance_max_members must be >= 1".into()));
        }
        Ok(())
    }
}
