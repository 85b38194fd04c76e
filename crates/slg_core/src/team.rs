//! Teams, troop capacity and character levels.
//!
//! A team's troop capacity is derived, never stored:
//! `base_troops + Σ level × troops_per_level` over its occupied slots. The
//! stored troop count is clamped down whenever a roster change lowers the
//! capacity, and only [`TeamEngine::reinforce`] ever raises it.

use std::sync::Arc;

use crate::economy::ResourceEngine;
use crate::error::{GameError, Result};
use crate::model::Player;
use crate::repository::Repository;
use crate::resources::Resources;
use crate::tables::Balance;

/// A slot as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    /// 1-based slot index.
    pub slot: u8,
    /// Assigned character and its level.
    pub member: Option<(String, u8)>,
}

/// A team as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamView {
    /// Team number.
    pub team: u8,
    /// Stationed troops.
    pub troops: u64,
    /// Current capacity.
    pub capacity: u64,
    /// Slots in order.
    pub slots: Vec<SlotView>,
}

impl std::fmt::Display for TeamView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Team {} troops {}/{}", self.team, self.troops, self.capacity)?;
        for slot in &self.slots {
            match &slot.member {
                Some((name, level)) => writeln!(f, "  [{}] {name} Lv{level}", slot.slot)?,
                None => writeln!(f, "  [{}] empty", slot.slot)?,
            }
        }
        Ok(())
    }
}

/// Where a character ended up after [`TeamEngine::assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Character placed.
    pub character: String,
    /// Team number.
    pub team: u8,
    /// Slot index.
    pub slot: u8,
    /// Character that was pushed out of the slot, if any.
    pub evicted: Option<String>,
    /// Whether the character was already there.
    pub unchanged: bool,
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unchanged {
            return write!(
                f,
                "{} is already in team {} slot {}",
                self.character, self.team, self.slot
            );
        }
        write!(f, "{} joined team {} slot {}", self.character, self.team, self.slot)?;
        if let Some(evicted) = &self.evicted {
            write!(f, " (replacing {evicted})")?;
        }
        Ok(())
    }
}

/// Troops moved by [`TeamEngine::reinforce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reinforcement {
    /// Team number.
    pub team: u8,
    /// Troops moved from the free pool.
    pub added: u64,
    /// Troops now stationed.
    pub troops: u64,
    /// Team capacity.
    pub capacity: u64,
}

impl std::fmt::Display for Reinforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.added == 0 {
            write!(f, "Team {} is at full strength ({}/{})", self.team, self.troops, self.capacity)
        } else {
            write!(
                f,
                "Team {} reinforced +{} ({}/{})",
                self.team, self.added, self.troops, self.capacity
            )
        }
    }
}

/// Result of a character level-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterLevelUp {
    /// Character name.
    pub character: String,
    /// Level reached.
    pub new_level: u8,
    /// Resources paid.
    pub cost: Resources,
}

impl std::fmt::Display for CharacterLevelUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} reached level {}, paid {}",
            self.character, self.new_level, self.cost
        )
    }
}

/// Roster assignment, reinforcement and character upgrades.
pub struct TeamEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    economy: Arc<ResourceEngine<R>>,
}

impl<R: Repository> TeamEngine<R> {
    /// Create an engine.
    pub fn new(repo: Arc<R>, balance: Arc<Balance>, economy: Arc<ResourceEngine<R>>) -> Self {
        Self {
            repo,
            balance,
            economy,
        }
    }

    fn check_team(&self, team: u8) -> Result<()> {
        let max = self.balance.team.team_count;
        if team < 1 || team > max {
            return Err(GameError::InvalidTeam { team, max });
        }
        Ok(())
    }

    fn check_slot(&self, slot: u8) -> Result<()> {
        let max = self.balance.team.team_slots;
        if slot < 1 || slot > max {
            return Err(GameError::InvalidSlot { slot, max });
        }
        Ok(())
    }

    /// Create the user's teams if they do not exist yet.
    pub fn ensure_teams(&self, user_id: &str) -> Result<()> {
        let team = &self.balance.team;
        self.repo.ensure_teams(user_id, team.team_count, team.team_slots)
    }

    fn level_of(&self, user_id: &str, name: &str) -> Result<u8> {
        Ok(self.repo.character_level(user_id, name)?.unwrap_or(1))
    }

    /// Sum of the levels of every character in a team.
    pub fn level_sum(&self, user_id: &str, team: u8) -> Result<u64> {
        let mut sum = 0;
        for slot in self.repo.team_slots(user_id, team)? {
            if let Some(name) = slot.character {
                sum += u64::from(self.level_of(user_id, &name)?);
            }
        }
        Ok(sum)
    }

    /// Troop capacity of a team.
    pub fn capacity(&self, user_id: &str, team: u8) -> Result<u64> {
        let levels = self.level_sum(user_id, team)?;
        Ok(self.balance.team.base_troops + levels * self.balance.team.troops_per_level)
    }

    /// Clamp stationed troops down to capacity.
    fn clamp_troops(&self, user_id: &str, team: u8) -> Result<()> {
        let capacity = self.capacity(user_id, team)?;
        let troops = self.repo.team_troops(user_id, team)?;
        if troops > capacity {
            self.repo.set_team_troops(user_id, team, capacity)?;
            tracing::debug!(user = user_id, team, troops, capacity, "Team troops clamped");
        }
        Ok(())
    }

    /// One team with members, troops and capacity.
    pub fn show_team(&self, user_id: &str, team: u8) -> Result<TeamView> {
        self.check_team(team)?;
        self.ensure_teams(user_id)?;
        let mut slots = Vec::new();
        for slot in self.repo.team_slots(user_id, team)? {
            let member = match slot.character {
                Some(name) => {
                    let level = self.level_of(user_id, &name)?;
                    Some((name, level))
                }
                None => None,
            };
            slots.push(SlotView {
                slot: slot.slot,
                member,
            });
        }
        Ok(TeamView {
            team,
            troops: self.repo.team_troops(user_id, team)?,
            capacity: self.capacity(user_id, team)?,
            slots,
        })
    }

    /// Every team of the user.
    pub fn list_teams(&self, user_id: &str) -> Result<Vec<TeamView>> {
        (1..=self.balance.team.team_count)
            .map(|team| self.show_team(user_id, team))
            .collect()
    }

    /// Put an owned character into a team.
    ///
    /// The target slot is resolved before anything changes, so a full team
    /// leaves the roster untouched. The character leaves its previous slot
    /// and an explicit slot's occupant is evicted. Troops of every team whose
    /// capacity may have dropped are clamped; troops are never added.
    pub fn assign(
        &self,
        user_id: &str,
        character: &str,
        team: u8,
        slot: Option<u8>,
    ) -> Result<Assignment> {
        self.check_team(team)?;
        if let Some(slot) = slot {
            self.check_slot(slot)?;
        }
        if !self.repo.has_character(user_id, character)? {
            return Err(GameError::CharacterNotOwned(character.to_string()));
        }
        self.ensure_teams(user_id)?;

        let current = self.repo.find_character_slot(user_id, character)?;
        if let Some((old_team, old_slot)) = current {
            if old_team == team && slot.map_or(true, |s| s == old_slot) {
                return Ok(Assignment {
                    character: character.to_string(),
                    team,
                    slot: old_slot,
                    evicted: None,
                    unchanged: true,
                });
            }
        }

        let slots = self.repo.team_slots(user_id, team)?;
        let (target, evicted) = match slot {
            Some(wanted) => {
                let occupant = slots
                    .iter()
                    .find(|s| s.slot == wanted)
                    .and_then(|s| s.character.clone())
                    .filter(|name| name != character);
                (wanted, occupant)
            }
            None => {
                let empty = slots
                    .iter()
                    .find(|s| s.character.is_none())
                    .map(|s| s.slot)
                    .ok_or(GameError::TeamFull(team))?;
                (empty, None)
            }
        };

        if let Some((old_team, old_slot)) = current {
            self.repo.set_team_slot(user_id, old_team, old_slot, None)?;
        }
        self.repo
            .set_team_slot(user_id, team, target, Some(character))?;

        self.clamp_troops(user_id, team)?;
        if let Some((old_team, _)) = current {
            if old_team != team {
                self.clamp_troops(user_id, old_team)?;
            }
        }

        tracing::info!(user = user_id, character, team, slot = target, "Character assigned");
        Ok(Assignment {
            character: character.to_string(),
            team,
            slot: target,
            evicted,
            unchanged: false,
        })
    }

    /// Fill a team from the player's free troops.
    ///
    /// Settles first so freshly produced troops are available.
    ///
    /// # Errors
    ///
    /// [`GameError::NoFreeTroops`] when the team is short and the pool is empty.
    pub fn reinforce(&self, player: &mut Player, team: u8) -> Result<Reinforcement> {
        self.check_team(team)?;
        self.economy.settle(player)?;
        self.ensure_teams(&player.user_id)?;

        let capacity = self.capacity(&player.user_id, team)?;
        let troops = self.repo.team_troops(&player.user_id, team)?;
        let needed = capacity.saturating_sub(troops);
        if needed == 0 {
            return Ok(Reinforcement {
                team,
                added: 0,
                troops,
                capacity,
            });
        }
        let free = player.resources.troops;
        if free == 0 {
            return Err(GameError::NoFreeTroops {
                needed,
                available: free,
            });
        }

        let added = needed.min(free);
        player.resources.troops -= added;
        self.repo
            .set_team_troops(&player.user_id, team, troops + added)?;
        self.repo.upsert_player(player)?;

        tracing::info!(user = %player.user_id, team, added, "Team reinforced");
        Ok(Reinforcement {
            team,
            added,
            troops: troops + added,
            capacity,
        })
    }

    /// Raise an owned character by one level.
    ///
    /// Settles first. Teams holding the character gain capacity but are not
    /// refilled.
    pub fn upgrade_character(
        &self,
        player: &mut Player,
        character: &str,
    ) -> Result<CharacterLevelUp> {
        if !self.repo.has_character(&player.user_id, character)? {
            return Err(GameError::CharacterNotOwned(character.to_string()));
        }
        let level = self.level_of(&player.user_id, character)?;
        let max = self.balance.team.char_level_max;
        if level >= max {
            return Err(GameError::CharacterMaxLevel {
                name: character.to_string(),
                max,
            });
        }
        self.economy.settle(player)?;

        let target = level + 1;
        let cost = self.balance.char_level_up_cost(target);
        player.resources.spend(&cost)?;
        self.repo
            .set_character_level(&player.user_id, character, target)?;
        self.repo.upsert_player(player)?;

        tracing::info!(user = %player.user_id, character, level = target, "Character leveled up");
        Ok(CharacterLevelUp {
            character: character.to_string(),
            new_level: target,
            cost,
        })
    }
}
