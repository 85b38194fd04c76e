//! Base cities: initial placement and daily migration.
//!
//! Bases may only sit in the configured base provinces. A player's base is
//! the origin of every siege march.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::clock::{same_utc_day, Clock};
use crate::error::{GameError, Result};
use crate::map::{City, MapGraph};
use crate::model::{BaseCity, Player};
use crate::repository::Repository;
use crate::tables::Balance;

/// Result of [`BaseEngine::ensure_base`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAssignment {
    /// The player's base.
    pub base: BaseCity,
    /// Whether it was assigned by this call.
    pub newly_assigned: bool,
}

impl std::fmt::Display for BaseAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.newly_assigned {
            "Assigned base"
        } else {
            "Current base"
        };
        write!(f, "{verb}: {} ({},{})", self.base.city, self.base.x, self.base.y)
    }
}

/// Base placement and migration.
pub struct BaseEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    clock: Arc<dyn Clock>,
    map: Arc<MapGraph>,
}

impl<R: Repository> BaseEngine<R> {
    /// Create an engine.
    pub fn new(
        repo: Arc<R>,
        balance: Arc<Balance>,
        clock: Arc<dyn Clock>,
        map: Arc<MapGraph>,
    ) -> Self {
        Self {
            repo,
            balance,
            clock,
            map,
        }
    }

    fn eligible(&self, city: &City) -> bool {
        self.balance.base_provinces.iter().any(|p| *p == city.province)
    }

    /// Cities a base may be placed in, sorted by name.
    #[must_use]
    pub fn candidates(&self) -> Vec<&City> {
        self.map.cities().filter(|c| self.eligible(c)).collect()
    }

    fn base_at(&self, city: &City) -> BaseCity {
        let (x, y) = self.map.position(&city.name).unwrap_or((0, 0));
        BaseCity {
            city: city.name.clone(),
            x,
            y,
        }
    }

    /// Return the player's base, assigning a random eligible city if needed.
    pub fn ensure_base(&self, player: &mut Player, rng: &mut impl Rng) -> Result<BaseAssignment> {
        if let Some(base) = &player.base {
            return Ok(BaseAssignment {
                base: base.clone(),
                newly_assigned: false,
            });
        }
        let candidates = self.candidates();
        let city = candidates.choose(rng).ok_or(GameError::NoBaseCandidates)?;
        let base = self.base_at(city);

        player.base = Some(base.clone());
        self.repo.upsert_player(player)?;
        tracing::info!(user = %player.user_id, city = %base.city, "Base assigned");
        Ok(BaseAssignment {
            base,
            newly_assigned: true,
        })
    }

    /// Move the base to `city`. Allowed once per UTC day.
    ///
    /// # Errors
    ///
    /// Already migrated today, unknown city, or a city outside the base
    /// provinces.
    pub fn migrate(&self, player: &mut Player, city: &str) -> Result<BaseCity> {
        let now = self.clock.now();
        if let Some(last) = player.last_migrated_at {
            if same_utc_day(last, now) {
                return Err(GameError::MigrationCooldown);
            }
        }
        let target = self
            .map
            .city(city)
            .ok_or_else(|| GameError::UnknownCity(city.to_string()))?;
        if !self.eligible(target) {
            return Err(GameError::CityNotEligible(city.to_string()));
        }

        let base = self.base_at(target);
        player.base = Some(base.clone());
        player.last_migrated_at = Some(now);
        self.repo.upsert_player(player)?;
        tracing::info!(user = %player.user_id, city, "Base migrated");
        Ok(base)
    }
}
