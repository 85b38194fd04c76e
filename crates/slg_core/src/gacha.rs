//! Character draws.
//!
//! Each lifetime draw has a fixed price set by its index: the first few are
//! free, then the price ramps linearly and plateaus. A batch of draws runs
//! sequentially and stops as soon as one draw cannot be paid for or nothing is
//! left to draw. Completed draws are kept.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{Character, CharacterCatalog};
use crate::clock::Clock;
use crate::economy::ResourceEngine;
use crate::error::Result;
use crate::model::Player;
use crate::repository::Repository;
use crate::resources::Resources;
use crate::tables::Balance;

/// How a draw batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStatus {
    /// At least one draw completed.
    Success,
    /// The very first draw was unaffordable.
    NotEnoughResources,
    /// The player already owned every character.
    AllCharactersCollected,
}

/// Result of [`GachaEngine::draw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Characters obtained, in draw order.
    pub obtained: Vec<Character>,
    /// Total resources spent.
    pub spent: Resources,
    /// Completed draws.
    pub successes: u32,
    /// Overall status.
    pub status: DrawStatus,
}

impl DrawOutcome {
    fn empty(status: DrawStatus) -> Self {
        Self {
            obtained: Vec::new(),
            spent: Resources::ZERO,
            successes: 0,
            status,
        }
    }
}

impl std::fmt::Display for DrawOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            DrawStatus::AllCharactersCollected => {
                write!(f, "You already own every character")
            }
            DrawStatus::NotEnoughResources => write!(f, "Not enough resources to draw"),
            DrawStatus::Success => {
                let names: Vec<&str> = self.obtained.iter().map(|c| c.name.as_str()).collect();
                write!(
                    f,
                    "Drew {} character(s): {} (spent {})",
                    self.successes,
                    names.join(", "),
                    self.spent
                )
            }
        }
    }
}

/// Price of one upcoming draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPrice {
    /// Lifetime draw index.
    pub index: u32,
    /// Price.
    pub cost: Resources,
}

/// Draw engine.
pub struct GachaEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    clock: Arc<dyn Clock>,
    catalog: Arc<CharacterCatalog>,
    economy: Arc<ResourceEngine<R>>,
}

impl<R: Repository> GachaEngine<R> {
    /// Create an engine.
    pub fn new(
        repo: Arc<R>,
        balance: Arc<Balance>,
        clock: Arc<dyn Clock>,
        catalog: Arc<CharacterCatalog>,
        economy: Arc<ResourceEngine<R>>,
    ) -> Self {
        Self {
            repo,
            balance,
            clock,
            catalog,
            economy,
        }
    }

    /// Catalog characters the user does not own yet, in catalog order.
    pub fn unowned(&self, user_id: &str) -> Result<Vec<&Character>> {
        let owned = self.repo.owned_character_names(user_id)?;
        Ok(self
            .catalog
            .iter()
            .filter(|c| !owned.contains(&c.name))
            .collect())
    }

    /// Prices of the next `count` draws. Changes nothing.
    #[must_use]
    pub fn next_costs(&self, player: &Player, count: u32) -> Vec<DrawPrice> {
        (0..count)
            .map(|offset| {
                let index = player.next_draw_index() + offset;
                DrawPrice {
                    index,
                    cost: self.balance.draw_cost(index),
                }
            })
            .collect()
    }

    /// Run up to `count` draws.
    ///
    /// Settles first. The unowned pool and the price are recomputed before
    /// every draw, and the batch stops at the first draw that cannot be paid
    /// for. Each completed draw is persisted before the next one starts.
    /// A count of zero is a successful no-op.
    pub fn draw(
        &self,
        player: &mut Player,
        count: u32,
        rng: &mut impl Rng,
    ) -> Result<DrawOutcome> {
        if count == 0 {
            return Ok(DrawOutcome::empty(DrawStatus::Success));
        }
        self.economy.settle(player)?;

        if self.unowned(&player.user_id)?.is_empty() {
            return Ok(DrawOutcome::empty(DrawStatus::AllCharactersCollected));
        }

        let mut outcome = DrawOutcome::empty(DrawStatus::NotEnoughResources);
        for _ in 0..count {
            let pool = self.unowned(&player.user_id)?;
            let cost = self.balance.draw_cost(player.next_draw_index());
            if !player.resources.can_afford(&cost) {
                break;
            }
            let Some(&picked) = pool.choose(rng) else {
                break;
            };
            let picked = picked.clone();

            player.resources.spend(&cost)?;
            self.repo
                .add_character(&player.user_id, &picked.name, 1, self.clock.now())?;
            player.draw_count += 1;
            self.repo.upsert_player(player)?;

            tracing::info!(
                user = %player.user_id,
                character = %picked.name,
                draw = player.draw_count,
                "Character drawn"
            );
            outcome.spent += cost;
            outcome.successes += 1;
            outcome.obtained.push(picked);
        }

        if outcome.successes > 0 {
            outcome.status = DrawStatus::Success;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::repository::MemoryRepository;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn catalog(names: &[&str]) -> Arc<CharacterCatalog> {
        let characters = names
            .iter()
            .map(|name| Character {
                name: (*name).to_string(),
                title: String::new(),
                background: String::new(),
                skills: Vec::new(),
            })
            .collect();
        Arc::new(CharacterCatalog::new(characters).unwrap())
    }

    fn engine(names: &[&str]) -> (Arc<MemoryRepository>, GachaEngine<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let balance = Arc::new(Balance::default());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(1_000));
        let economy = Arc::new(ResourceEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            Arc::clone(&clock),
        ));
        let gacha = GachaEngine::new(Arc::clone(&repo), balance, clock, catalog(names), economy);
        (repo, gacha)
    }

    #[test]
    fn test_free_draws_cost_nothing() {
        let (repo, gacha) = engine(&["A", "B", "C", "D", "E", "F", "G"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = gacha.draw(&mut player, 5, &mut rng).unwrap();
        assert_eq!(outcome.status, DrawStatus::Success);
        assert_eq!(outcome.successes, 5);
        assert!(outcome.spent.is_zero());
        assert_eq!(player.draw_count, 5);
        assert_eq!(repo.owned_character_names("u1").unwrap().len(), 5);
    }

    #[test]
    fn test_zero_draws_is_a_successful_no_op() {
        let (repo, gacha) = engine(&["A", "B"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        let before = player.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = gacha.draw(&mut player, 0, &mut rng).unwrap();
        assert_eq!(outcome.status, DrawStatus::Success);
        assert_eq!(outcome.successes, 0);
        assert!(outcome.obtained.is_empty());
        assert!(outcome.spent.is_zero());
        assert_eq!(player, before);
        assert!(repo.owned_character_names("u1").unwrap().is_empty());
    }

    #[test]
    fn test_batch_stops_at_first_unaffordable_draw() {
        let (_, gacha) = engine(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let outcome = gacha.draw(&mut player, 8, &mut rng).unwrap();
        assert_eq!(outcome.successes, 5);
        assert_eq!(outcome.status, DrawStatus::Success);

        let outcome = gacha.draw(&mut player, 1, &mut rng).unwrap();
        assert_eq!(outcome.status, DrawStatus::NotEnoughResources);
        assert_eq!(player.draw_count, 5);
    }

    #[test]
    fn test_sixth_draw_costs_ten_each() {
        let (_, gacha) = engine(&["A", "B", "C", "D", "E", "F", "G"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        player.draw_count = 5;
        player.resources = Resources {
            grain: 10,
            gold: 10,
            stone: 10,
            troops: 10,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = gacha.draw(&mut player, 3, &mut rng).unwrap();
        assert_eq!(outcome.successes, 1);
        assert!(player.resources.is_zero());
        assert_eq!(player.draw_count, 6);
    }

    #[test]
    fn test_pool_exhaustion_stops_batch() {
        let (repo, gacha) = engine(&["A", "B"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = gacha.draw(&mut player, 5, &mut rng).unwrap();
        assert_eq!(outcome.successes, 2);
        assert_eq!(repo.owned_character_names("u1").unwrap().len(), 2);

        let outcome = gacha.draw(&mut player, 1, &mut rng).unwrap();
        assert_eq!(outcome.status, DrawStatus::AllCharactersCollected);
    }

    #[test]
    fn test_next_costs_preview() {
        let (_, gacha) = engine(&["A"]);
        let mut player = Player::new("u1", "Sun Quan", 1_000);
        player.draw_count = 4;
        let prices = gacha.next_costs(&player, 3);
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].index, 5);
        assert!(prices[0].cost.is_zero());
        assert_eq!(prices[1].cost.gold, 10);
        assert_eq!(prices[2].cost.gold, 120);
        assert_eq!(player.draw_count, 4);
    }
}
