//! Persistence contract consumed by the engines.
//!
//! Every call is synchronous and durable on return. Implementations must make
//! each single call atomic; there are no cross-call transactions, so callers
//! serialize mutations per player and per alliance.

mod memory;

pub use memory::MemoryRepository;

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{
    Alliance, AllianceId, AllianceMember, AllianceRole, AllianceSummary, NewSiege, OwnedCharacter,
    Player, Siege, SiegeId, SiegeParticipant, SiegeResult, SiegeState, TeamSlot,
};

/// Storage used by every engine.
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Fetch a player.
    fn player(&self, user_id: &str) -> Result<Option<Player>>;

    /// Insert or replace a player.
    fn upsert_player(&self, player: &Player) -> Result<()>;

    // ------------------------------------------------------------------
    // Owned characters
    // ------------------------------------------------------------------

    /// Names of every character the user owns.
    fn owned_character_names(&self, user_id: &str) -> Result<BTreeSet<String>>;

    /// Every character the user owns.
    fn owned_characters(&self, user_id: &str) -> Result<Vec<OwnedCharacter>>;

    /// Whether the user owns a character.
    fn has_character(&self, user_id: &str, name: &str) -> Result<bool>;

    /// Record ownership. Ignored if already owned.
    fn add_character(&self, user_id: &str, name: &str, level: u8, obtained_at: i64)
        -> Result<()>;

    /// Level of an owned character.
    fn character_level(&self, user_id: &str, name: &str) -> Result<Option<u8>>;

    /// Set the level of an owned character.
    fn set_character_level(&self, user_id: &str, name: &str, level: u8) -> Result<()>;

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Create any missing teams and slots. Existing ones are untouched.
    fn ensure_teams(&self, user_id: &str, teams: u8, slots: u8) -> Result<()>;

    /// Slots of one team, in slot order.
    fn team_slots(&self, user_id: &str, team: u8) -> Result<Vec<TeamSlot>>;

    /// Put a character in a slot, or clear it with `None`.
    fn set_team_slot(&self, user_id: &str, team: u8, slot: u8, character: Option<&str>)
        -> Result<()>;

    /// `(team, slot)` currently holding a character.
    fn find_character_slot(&self, user_id: &str, name: &str) -> Result<Option<(u8, u8)>>;

    /// Troops stationed in a team.
    fn team_troops(&self, user_id: &str, team: u8) -> Result<u64>;

    /// Set the troops stationed in a team.
    fn set_team_troops(&self, user_id: &str, team: u8, troops: u64) -> Result<()>;

    // ------------------------------------------------------------------
    // Alliances
    // ------------------------------------------------------------------

    /// Create an alliance without members.
    fn create_alliance(&self, name: &str, leader_id: &str, created_at: i64) -> Result<AllianceId>;

    /// Delete an alliance and its memberships.
    fn delete_alliance(&self, id: AllianceId) -> Result<()>;

    /// Look up by exact name.
    fn alliance_by_name(&self, name: &str) -> Result<Option<Alliance>>;

    /// Alliance the user belongs to.
    fn alliance_of(&self, user_id: &str) -> Result<Option<Alliance>>;

    /// Add a member.
    fn add_member(
        &self,
        id: AllianceId,
        user_id: &str,
        role: AllianceRole,
        joined_at: i64,
    ) -> Result<()>;

    /// Remove a member.
    fn remove_member(&self, id: AllianceId, user_id: &str) -> Result<()>;

    /// Number of members.
    fn count_members(&self, id: AllianceId) -> Result<usize>;

    /// Members in join order.
    fn list_members(&self, id: AllianceId) -> Result<Vec<AllianceMember>>;

    /// Every alliance with its member count, by id.
    fn list_alliances(&self) -> Result<Vec<AllianceSummary>>;

    // ------------------------------------------------------------------
    // Sieges
    // ------------------------------------------------------------------

    /// Create a scheduled siege.
    fn create_siege(&self, siege: NewSiege) -> Result<SiegeId>;

    /// The alliance's scheduled or ongoing siege.
    fn active_siege(&self, alliance: AllianceId) -> Result<Option<Siege>>;

    /// The alliance's most recently created siege in any state.
    fn latest_siege(&self, alliance: AllianceId) -> Result<Option<Siege>>;

    /// Fetch by id.
    fn siege(&self, id: SiegeId) -> Result<Option<Siege>>;

    /// Move a siege to `to` unless it is already `Done`.
    ///
    /// `result` and `final_points` are stored together with the new state.
    /// Returns `true` if the stored state changed. A `Done` siege is never
    /// rewritten, which makes repeated finalization a no-op.
    fn transition_siege(
        &self,
        id: SiegeId,
        to: SiegeState,
        result: Option<SiegeResult>,
        final_points: Option<u64>,
    ) -> Result<bool>;

    /// Insert or replace a participant (one per user per siege).
    fn upsert_participant(&self, participant: &SiegeParticipant) -> Result<()>;

    /// Participants in join order.
    fn list_participants(&self, siege: SiegeId) -> Result<Vec<SiegeParticipant>>;
}
