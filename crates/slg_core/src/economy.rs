//! Resource economy: lazy production settlement and building upgrades.
//!
//! There is no background tick. Production owed since `last_tick` is credited
//! whenever a player is read for an action. Only whole minutes are credited,
//! and `last_tick` moves forward by exactly the minutes consumed, so a partial
//! minute carries over to the next settlement.
//!
//! All calculations use integer math.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{GameError, Result};
use crate::model::Player;
use crate::repository::Repository;
use crate::resources::{Building, BuildingLevels, PerResource, ResourceKind, Resources};
use crate::tables::{Balance, MINUTE};

/// Production credited by one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settlement {
    /// Whole minutes consumed.
    pub minutes: u64,
    /// Amount actually added to each balance after capping.
    pub gained: Resources,
}

/// Credit production owed up to `now`.
///
/// Pure: touches only `player`. Returns a zero settlement when less than a
/// full minute has passed.
pub fn settle_at(balance: &Balance, player: &mut Player, now: i64) -> Settlement {
    let elapsed = now.saturating_sub(player.last_tick).max(0);
    let minutes = elapsed / MINUTE;
    if minutes == 0 {
        return Settlement::default();
    }

    let minutes_u = u64::try_from(minutes).unwrap_or(0);
    let mut gained = Resources::ZERO;
    for kind in ResourceKind::ALL {
        let level = player.buildings.for_resource(kind);
        let production = balance.production(kind, level).saturating_mul(minutes_u);
        let cap = balance.capacity(kind, level);
        let old = *player.resources.get(kind);
        let new = old.saturating_add(production).min(cap);
        *gained.get_mut(kind) = new.saturating_sub(old);
        *player.resources.get_mut(kind) = new;
    }
    player.last_tick += minutes * MINUTE;

    Settlement {
        minutes: minutes_u,
        gained,
    }
}

/// One resource row of a status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLine {
    /// Current balance.
    pub current: u64,
    /// Storage cap at the current level.
    pub capacity: u64,
    /// Production per minute at the current level.
    pub per_minute: u64,
    /// Level of the producing building.
    pub level: u8,
}

/// Read-only economy snapshot of a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyStatus {
    /// Per-resource view.
    pub resources: PerResource<ResourceLine>,
    /// Per-building view of the same levels.
    pub buildings: BuildingLevels,
}

impl std::fmt::Display for EconomyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (kind, line) in self.resources.iter() {
            writeln!(
                f,
                "{kind}: {}/{} (+{}/min, {} Lv{})",
                line.current,
                line.capacity,
                line.per_minute,
                kind.building(),
                line.level
            )?;
        }
        Ok(())
    }
}

/// Result of a successful building upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReceipt {
    /// Upgraded building.
    pub building: Building,
    /// Level reached.
    pub new_level: u8,
    /// Resources paid.
    pub cost: Resources,
}

impl std::fmt::Display for UpgradeReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} upgraded to level {}, paid {}",
            self.building, self.new_level, self.cost
        )
    }
}

/// Registration, settlement, status and building upgrades.
pub struct ResourceEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    clock: Arc<dyn Clock>,
}

impl<R: Repository> ResourceEngine<R> {
    /// Create an engine.
    pub fn new(repo: Arc<R>, balance: Arc<Balance>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            balance,
            clock,
        }
    }

    /// Fetch a registered player.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotRegistered`] if the user has no record.
    pub fn player(&self, user_id: &str) -> Result<Player> {
        self.repo
            .player(user_id)?
            .ok_or_else(|| GameError::NotRegistered(user_id.to_string()))
    }

    /// Register a user, or return the existing record unchanged.
    pub fn register(&self, user_id: &str, nickname: &str) -> Result<Player> {
        if let Some(existing) = self.repo.player(user_id)? {
            return Ok(existing);
        }
        let player = Player::new(user_id, nickname, self.clock.now());
        self.repo.upsert_player(&player)?;
        tracing::info!(user = user_id, "Player registered");
        Ok(player)
    }

    /// Credit production owed and persist if at least one minute passed.
    pub fn settle(&self, player: &mut Player) -> Result<Settlement> {
        let settlement = settle_at(&self.balance, player, self.clock.now());
        if settlement.minutes > 0 {
            self.repo.upsert_player(player)?;
            tracing::debug!(
                user = %player.user_id,
                minutes = settlement.minutes,
                "Resources settled"
            );
        }
        Ok(settlement)
    }

    /// Current balances, caps and rates. Does not settle.
    #[must_use]
    pub fn status(&self, player: &Player) -> EconomyStatus {
        let resources = PerResource::from_fn(|kind| {
            let level = player.buildings.for_resource(kind);
            ResourceLine {
                current: *player.resources.get(kind),
                capacity: self.balance.capacity(kind, level),
                per_minute: self.balance.production(kind, level),
                level,
            }
        });
        EconomyStatus {
            resources,
            buildings: player.buildings,
        }
    }

    /// Upgrade one building by exactly one level.
    ///
    /// Settles first. Either the full cost is debited and the level rises, or
    /// nothing beyond the settlement changes.
    ///
    /// # Errors
    ///
    /// Unknown building, building at max level, or an itemized shortfall.
    pub fn upgrade(&self, player: &mut Player, building: &str) -> Result<UpgradeReceipt> {
        let building = Building::resolve(building)?;
        self.settle(player)?;

        let current = *player.buildings.get(building);
        if current >= self.balance.max_building_level {
            return Err(GameError::BuildingMaxLevel {
                building: building.id().to_string(),
                max: self.balance.max_building_level,
            });
        }
        let target = current + 1;
        let cost = self.balance.upgrade_cost(building, target);

        player.resources.spend(&cost)?;
        *player.buildings.get_mut(building) = target;
        self.repo.upsert_player(player)?;

        tracing::info!(
            user = %player.user_id,
            building = building.id(),
            level = target,
            "Building upgraded"
        );
        Ok(UpgradeReceipt {
            building,
            new_level: target,
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_at(last_tick: i64) -> Player {
        Player::new("u1", "Cao Cao", last_tick)
    }

    #[test]
    fn test_settle_credits_whole_minutes_only() {
        let balance = Balance::default();
        let mut player = player_at(1_000);

        let settlement = settle_at(&balance, &mut player, 1_130);
        assert_eq!(settlement.minutes, 2);
        assert_eq!(player.resources.grain, 16);
        assert_eq!(player.resources.gold, 10);
        assert_eq!(player.resources.stone, 6);
        assert_eq!(player.resources.troops, 4);
        assert_eq!(player.last_tick, 1_120);

        // The leftover 10 seconds are not lost.
        let settlement = settle_at(&balance, &mut player, 1_180);
        assert_eq!(settlement.minutes, 1);
        assert_eq!(player.last_tick, 1_180);
    }

    #[test]
    fn test_settle_under_a_minute_is_noop() {
        let balance = Balance::default();
        let mut player = player_at(1_000);
        let before = player.clone();
        let settlement = settle_at(&balance, &mut player, 1_059);
        assert_eq!(settlement.minutes, 0);
        assert_eq!(player, before);
    }

    #[test]
    fn test_settle_caps_at_capacity() {
        let balance = Balance::default();
        let mut player = player_at(0);
        settle_at(&balance, &mut player, 60 * 10_000);
        assert_eq!(player.resources.grain, 972);
        assert_eq!(player.resources.troops, 360);
    }

    #[test]
    fn test_settle_ignores_clock_going_backwards() {
        let balance = Balance::default();
        let mut player = player_at(5_000);
        assert_eq!(settle_at(&balance, &mut player, 4_000).minutes, 0);
        assert_eq!(player.last_tick, 5_000);
    }

    #[test]
    fn test_upgrade_receipt_display() {
        let receipt = UpgradeReceipt {
            building: Building::Farm,
            new_level: 2,
            cost: Resources {
                grain: 510,
                gold: 0,
                stone: 170,
                troops: 0,
            },
        };
        assert_eq!(
            receipt.to_string(),
            "farm upgraded to level 2, paid grain 510, stone 170"
        );
    }
}
