//! The game facade.
//!
//! [`Game`] owns one instance of every engine, all sharing the same
//! repository, balance, clock, map and catalog. A chat command layer holds a
//! `Game` and calls one method per user action; each method looks the player
//! up, runs the action and returns a value with a user-facing `Display`.

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::alliance::{AllianceEngine, Departure, Roster};
use crate::base::{BaseAssignment, BaseEngine};
use crate::battle::{BattleEngine, BattleJudge, BattleReport, HeuristicJudge};
use crate::catalog::CharacterCatalog;
use crate::clock::{Clock, SystemClock};
use crate::economy::{EconomyStatus, ResourceEngine, UpgradeReceipt};
use crate::error::{GameError, Result};
use crate::gacha::{DrawOutcome, DrawPrice, GachaEngine};
use crate::map::MapGraph;
use crate::model::{Alliance, AllianceSummary, BaseCity, Player, Siege};
use crate::repository::Repository;
use crate::siege::{Rally, SiegeEngine, SiegeReport};
use crate::tables::Balance;
use crate::team::{Assignment, CharacterLevelUp, Reinforcement, TeamEngine, TeamView};

/// Construction-time settings.
#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    /// Balance tables.
    pub balance: Balance,
    /// RNG seed for draws and base placement. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Every engine behind one handle.
pub struct Game<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    map: Arc<MapGraph>,
    catalog: Arc<CharacterCatalog>,
    rng: Mutex<ChaCha8Rng>,
    economy: Arc<ResourceEngine<R>>,
    teams: Arc<TeamEngine<R>>,
    gacha: GachaEngine<R>,
    sieges: SiegeEngine<R>,
    alliances: AllianceEngine<R>,
    bases: BaseEngine<R>,
    battles: BattleEngine<R>,
}

impl<R: Repository> Game<R> {
    /// Build a game on the system clock with the offline battle judge.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] if the balance tables are invalid.
    pub fn new(
        repo: Arc<R>,
        map: MapGraph,
        catalog: CharacterCatalog,
        config: GameConfig,
    ) -> Result<Self> {
        Self::with_parts(
            repo,
            Arc::new(map),
            Arc::new(catalog),
            config,
            Arc::new(SystemClock),
            Arc::new(HeuristicJudge),
        )
    }

    /// Build a game from explicit collaborators.
    pub fn with_parts(
        repo: Arc<R>,
        map: Arc<MapGraph>,
        catalog: Arc<CharacterCatalog>,
        config: GameConfig,
        clock: Arc<dyn Clock>,
        judge: Arc<dyn BattleJudge>,
    ) -> Result<Self> {
        config.balance.validate()?;
        let balance = Arc::new(config.balance);
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);

        let economy = Arc::new(ResourceEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            Arc::clone(&clock),
        ));
        let teams = Arc::new(TeamEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            Arc::clone(&economy),
        ));
        let gacha = GachaEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            Arc::clone(&clock),
            Arc::clone(&catalog),
            Arc::clone(&economy),
        );
        let sieges = SiegeEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            Arc::clone(&clock),
            Arc::clone(&map),
            Arc::clone(&teams),
        );
        let alliances =
            AllianceEngine::new(Arc::clone(&repo), Arc::clone(&balance), Arc::clone(&clock));
        let bases = BaseEngine::new(
            Arc::clone(&repo),
            Arc::clone(&balance),
            clock,
            Arc::clone(&map),
        );
        let battles = BattleEngine::new(Arc::clone(&repo), Arc::clone(&catalog), judge);

        tracing::info!(
            cities = map.len(),
            characters = catalog.len(),
            "Game initialized"
        );
        Ok(Self {
            repo,
            balance,
            map,
            catalog,
            rng: Mutex::new(rng),
            economy,
            teams,
            gacha,
            sieges,
            alliances,
            bases,
            battles,
        })
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut ChaCha8Rng) -> Result<T>) -> Result<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| GameError::Storage(format!("rng lock poisoned: {e}")))?;
        f(&mut *rng)
    }

    /// Shared repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Balance tables in use.
    #[must_use]
    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    /// World map.
    #[must_use]
    pub fn map(&self) -> &MapGraph {
        &self.map
    }

    /// Character catalog.
    #[must_use]
    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    /// Team engine, for read-only queries such as capacity.
    #[must_use]
    pub fn teams(&self) -> &TeamEngine<R> {
        &self.teams
    }

    fn player(&self, user_id: &str) -> Result<Player> {
        self.economy.player(user_id)
    }

    // ------------------------------------------------------------------
    // Economy
    // ------------------------------------------------------------------

    /// Register a user; returns the existing record if already registered.
    pub fn register(&self, user_id: &str, nickname: &str) -> Result<Player> {
        let player = self.economy.register(user_id, nickname)?;
        self.teams.ensure_teams(user_id)?;
        Ok(player)
    }

    /// Settle and report the economy.
    pub fn status(&self, user_id: &str) -> Result<EconomyStatus> {
        let mut player = self.player(user_id)?;
        self.economy.settle(&mut player)?;
        Ok(self.economy.status(&player))
    }

    /// Upgrade a building by id or alias.
    pub fn upgrade_building(&self, user_id: &str, building: &str) -> Result<UpgradeReceipt> {
        let mut player = self.player(user_id)?;
        self.economy.upgrade(&mut player, building)
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Every team of a registered user.
    pub fn list_teams(&self, user_id: &str) -> Result<Vec<TeamView>> {
        self.player(user_id)?;
        self.teams.list_teams(user_id)
    }

    /// One team of a registered user.
    pub fn show_team(&self, user_id: &str, team: u8) -> Result<TeamView> {
        self.player(user_id)?;
        self.teams.show_team(user_id, team)
    }

    /// Place a character in a team.
    pub fn assign(
        &self,
        user_id: &str,
        character: &str,
        team: u8,
        slot: Option<u8>,
    ) -> Result<Assignment> {
        self.player(user_id)?;
        if !self.catalog.contains(character) {
            return Err(GameError::UnknownCharacter(character.to_string()));
        }
        self.teams.assign(user_id, character, team, slot)
    }

    /// Fill a team from free troops.
    pub fn reinforce(&self, user_id: &str, team: u8) -> Result<Reinforcement> {
        let mut player = self.player(user_id)?;
        self.teams.reinforce(&mut player, team)
    }

    /// Level up an owned character.
    pub fn upgrade_character(&self, user_id: &str, character: &str) -> Result<CharacterLevelUp> {
        let mut player = self.player(user_id)?;
        self.teams.upgrade_character(&mut player, character)
    }

    // ------------------------------------------------------------------
    // Gacha
    // ------------------------------------------------------------------

    /// Draw up to `count` characters.
    pub fn draw(&self, user_id: &str, count: u32) -> Result<DrawOutcome> {
        let mut player = self.player(user_id)?;
        self.with_rng(|rng| self.gacha.draw(&mut player, count, rng))
    }

    /// Prices of the user's next `count` draws.
    pub fn draw_prices(&self, user_id: &str, count: u32) -> Result<Vec<DrawPrice>> {
        let player = self.player(user_id)?;
        Ok(self.gacha.next_costs(&player, count))
    }

    // ------------------------------------------------------------------
    // Bases
    // ------------------------------------------------------------------

    /// Current base, assigned on first use.
    pub fn ensure_base(&self, user_id: &str) -> Result<BaseAssignment> {
        let mut player = self.player(user_id)?;
        self.with_rng(|rng| self.bases.ensure_base(&mut player, rng))
    }

    /// Move the base.
    pub fn migrate(&self, user_id: &str, city: &str) -> Result<BaseCity> {
        let mut player = self.player(user_id)?;
        self.bases.migrate(&mut player, city)
    }

    // ------------------------------------------------------------------
    // Alliances
    // ------------------------------------------------------------------

    /// Found an alliance.
    pub fn create_alliance(&self, user_id: &str, name: &str) -> Result<Alliance> {
        self.player(user_id)?;
        self.alliances.create(user_id, name)
    }

    /// Join an alliance.
    pub fn join_alliance(&self, user_id: &str, name: &str) -> Result<Alliance> {
        self.player(user_id)?;
        self.alliances.join(user_id, name)
    }

    /// Leave the current alliance.
    pub fn leave_alliance(&self, user_id: &str) -> Result<Departure> {
        self.alliances.leave(user_id)
    }

    /// Members of a named alliance.
    pub fn alliance_members(&self, name: &str) -> Result<Roster> {
        self.alliances.members(name)
    }

    /// Members of the user's alliance.
    pub fn my_alliance(&self, user_id: &str) -> Result<Roster> {
        self.alliances.my_members(user_id)
    }

    /// Every alliance.
    pub fn alliances(&self) -> Result<Vec<AllianceSummary>> {
        self.alliances.list_all()
    }

    // ------------------------------------------------------------------
    // Sieges
    // ------------------------------------------------------------------

    /// Schedule a siege as alliance leader.
    pub fn schedule_siege(&self, leader_id: &str, city: &str, start_at: i64) -> Result<Siege> {
        self.sieges.schedule_siege(leader_id, city, start_at)
    }

    /// Join the alliance's active siege.
    pub fn join_rally(&self, user_id: &str) -> Result<Rally> {
        self.sieges.join_rally(user_id)
    }

    /// Siege status; finalizes once the window has closed.
    pub fn siege_status(&self, user_id: &str) -> Result<SiegeReport> {
        self.sieges.status_and_maybe_finalize(user_id)
    }

    // ------------------------------------------------------------------
    // Battles
    // ------------------------------------------------------------------

    /// Judge a battle between two players' first teams.
    pub fn battle(&self, attacker: &str, defender: &str) -> Result<BattleReport> {
        self.player(attacker)?;
        self.player(defender)?;
        self.battles.simulate(attacker, defender)
    }
}
