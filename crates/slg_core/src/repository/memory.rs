//! In-memory repository with bincode snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::Repository;
use crate::error::{GameError, Result};
use crate::model::{
    Alliance, AllianceId, AllianceMember, AllianceRole, AllianceSummary, NewSiege, OwnedCharacter,
    Player, Siege, SiegeId, SiegeParticipant, SiegeResult, SiegeState, TeamSlot,
};

/// Snapshot format version for compatibility.
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TeamRecord {
    troops: u64,
    slots: BTreeMap<u8, Option<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    players: BTreeMap<String, Player>,
    characters: BTreeMap<String, BTreeMap<String, OwnedCharacter>>,
    teams: BTreeMap<String, BTreeMap<u8, TeamRecord>>,
    alliances: BTreeMap<AllianceId, Alliance>,
    members: BTreeMap<AllianceId, Vec<AllianceMember>>,
    sieges: BTreeMap<SiegeId, Siege>,
    participants: BTreeMap<SiegeId, Vec<SiegeParticipant>>,
    next_alliance_id: u64,
    next_siege_id: u64,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    tables: Tables,
}

/// Reference [`Repository`] keeping every table in memory.
///
/// A single lock guards all tables, so each call is atomic. The whole state
/// can be written to and restored from a bincode snapshot file.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| GameError::Storage("repository lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| GameError::Storage("repository lock poisoned".into()))
    }

    /// Serialize every table.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            tables: self.read()?.clone(),
        };
        bincode::serialize(&snapshot)
            .map_err(|e| GameError::Storage(format!("Failed to serialize snapshot: {e}")))
    }

    /// Restore from bytes produced by [`Self::to_bytes`].
    ///
    /// # Errors
    /// Returns an error on malformed input or a version mismatch.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(data)
            .map_err(|e| GameError::Storage(format!("Failed to deserialize snapshot: {e}")))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::Storage(format!(
                "Snapshot version mismatch: expected {}, got {}",
                SNAPSHOT_VERSION, snapshot.version
            )));
        }
        Ok(Self {
            tables: RwLock::new(snapshot.tables),
        })
    }

    /// Save a snapshot to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::Storage(format!("Failed to write snapshot file: {e}")))?;
        tracing::debug!(path = %path.as_ref().display(), "Snapshot saved");
        Ok(())
    }

    /// Load a snapshot from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::Storage(format!("Failed to read snapshot file: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

fn team_mut<'a>(tables: &'a mut Tables, user_id: &str, team: u8) -> Result<&'a mut TeamRecord> {
    tables
        .teams
        .get_mut(user_id)
        .and_then(|teams| teams.get_mut(&team))
        .ok_or_else(|| GameError::Storage(format!("team {team} of {user_id} does not exist")))
}

impl Repository for MemoryRepository {
    fn player(&self, user_id: &str) -> Result<Option<Player>> {
        Ok(self.read()?.players.get(user_id).cloned())
    }

    fn upsert_player(&self, player: &Player) -> Result<()> {
        self.write()?
            .players
            .insert(player.user_id.clone(), player.clone());
        Ok(())
    }

    fn owned_character_names(&self, user_id: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .read()?
            .characters
            .get(user_id)
            .map(|owned| owned.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn owned_characters(&self, user_id: &str) -> Result<Vec<OwnedCharacter>> {
        Ok(self
            .read()?
            .characters
            .get(user_id)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default())
    }

    fn has_character(&self, user_id: &str, name: &str) -> Result<bool> {
        Ok(self
            .read()?
            .characters
            .get(user_id)
            .is_some_and(|owned| owned.contains_key(name)))
    }

    fn add_character(
        &self,
        user_id: &str,
        name: &str,
        level: u8,
        obtained_at: i64,
    ) -> Result<()> {
        self.write()?
            .characters
            .entry(user_id.to_string())
            .or_default()
            .entry(name.to_string())
            .or_insert_with(|| OwnedCharacter {
                name: name.to_string(),
                level,
                obtained_at,
            });
        Ok(())
    }

    fn character_level(&self, user_id: &str, name: &str) -> Result<Option<u8>> {
        Ok(self
            .read()?
            .characters
            .get(user_id)
            .and_then(|owned| owned.get(name))
            .map(|c| c.level))
    }

    fn set_character_level(&self, user_id: &str, name: &str, level: u8) -> Result<()> {
        let mut tables = self.write()?;
        let owned = tables
            .characters
            .get_mut(user_id)
            .and_then(|owned| owned.get_mut(name))
            .ok_or_else(|| GameError::Storage(format!("{user_id} does not own {name}")))?;
        owned.level = level;
        Ok(())
    }

    fn ensure_teams(&self, user_id: &str, teams: u8, slots: u8) -> Result<()> {
        let mut tables = self.write()?;
        let user_teams = tables.teams.entry(user_id.to_string()).or_default();
        for team in 1..=teams {
            let record = user_teams.entry(team).or_default();
            for slot in 1..=slots {
                record.slots.entry(slot).or_insert(None);
            }
        }
        Ok(())
    }

    fn team_slots(&self, user_id: &str, team: u8) -> Result<Vec<TeamSlot>> {
        Ok(self
            .read()?
            .teams
            .get(user_id)
            .and_then(|teams| teams.get(&team))
            .map(|record| {
                record
                    .slots
                    .iter()
                    .map(|(&slot, character)| TeamSlot {
                        slot,
                        character: character.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set_team_slot(
        &self,
        user_id: &str,
        team: u8,
        slot: u8,
        character: Option<&str>,
    ) -> Result<()> {
        let mut tables = self.write()?;
        let record = team_mut(&mut tables, user_id, team)?;
        let entry = record
            .slots
            .get_mut(&slot)
            .ok_or_else(|| GameError::Storage(format!("slot {slot} of team {team} missing")))?;
        *entry = character.map(str::to_string);
        Ok(())
    }

    fn find_character_slot(&self, user_id: &str, name: &str) -> Result<Option<(u8, u8)>> {
        let tables = self.read()?;
        let Some(teams) = tables.teams.get(user_id) else {
            return Ok(None);
        };
        for (&team, record) in teams {
            for (&slot, character) in &record.slots {
                if character.as_deref() == Some(name) {
                    return Ok(Some((team, slot)));
                }
            }
        }
        Ok(None)
    }

    fn team_troops(&self, user_id: &str, team: u8) -> Result<u64> {
        Ok(self
            .read()?
            .teams
            .get(user_id)
            .and_then(|teams| teams.get(&team))
            .map_or(0, |record| record.troops))
    }

    fn set_team_troops(&self, user_id: &str, team: u8, troops: u64) -> Result<()> {
        let mut tables = self.write()?;
        team_mut(&mut tables, user_id, team)?.troops = troops;
        Ok(())
    }

    fn create_alliance(&self, name: &str, leader_id: &str, created_at: i64) -> Result<AllianceId> {
        let mut tables = self.write()?;
        if tables.alliances.values().any(|a| a.name == name) {
            return Err(GameError::AllianceExists(name.to_string()));
        }
        tables.next_alliance_id += 1;
        let id = AllianceId(tables.next_alliance_id);
        tables.alliances.insert(
            id,
            Alliance {
                id,
                name: name.to_string(),
                leader_id: leader_id.to_string(),
                created_at,
            },
        );
        tables.members.insert(id, Vec::new());
        Ok(id)
    }

    fn delete_alliance(&self, id: AllianceId) -> Result<()> {
        let mut tables = self.write()?;
        tables.alliances.remove(&id);
        tables.members.remove(&id);
        Ok(())
    }

    fn alliance_by_name(&self, name: &str) -> Result<Option<Alliance>> {
        Ok(self
            .read()?
            .alliances
            .values()
            .find(|a| a.name == name)
            .cloned())
    }

    fn alliance_of(&self, user_id: &str) -> Result<Option<Alliance>> {
        let tables = self.read()?;
        Ok(tables
            .members
            .iter()
            .find(|(_, members)| members.iter().any(|m| m.user_id == user_id))
            .and_then(|(id, _)| tables.alliances.get(id))
            .cloned())
    }

    fn add_member(
        &self,
        id: AllianceId,
        user_id: &str,
        role: AllianceRole,
        joined_at: i64,
    ) -> Result<()> {
        let mut tables = self.write()?;
        let members = tables
            .members
            .get_mut(&id)
            .ok_or_else(|| GameError::Storage(format!("alliance {} does not exist", id.0)))?;
        members.retain(|m| m.user_id != user_id);
        members.push(AllianceMember {
            user_id: user_id.to_string(),
            role,
            joined_at,
        });
        Ok(())
    }

    fn remove_member(&self, id: AllianceId, user_id: &str) -> Result<()> {
        if let Some(members) = self.write()?.members.get_mut(&id) {
            members.retain(|m| m.user_id != user_id);
        }
        Ok(())
    }

    fn count_members(&self, id: AllianceId) -> Result<usize> {
        Ok(self.read()?.members.get(&id).map_or(0, Vec::len))
    }

    fn list_members(&self, id: AllianceId) -> Result<Vec<AllianceMember>> {
        Ok(self.read()?.members.get(&id).cloned().unwrap_or_default())
    }

    fn list_alliances(&self) -> Result<Vec<AllianceSummary>> {
        let tables = self.read()?;
        Ok(tables
            .alliances
            .values()
            .map(|alliance| AllianceSummary {
                alliance: alliance.clone(),
                member_count: tables.members.get(&alliance.id).map_or(0, Vec::len),
            })
            .collect())
    }

    fn create_siege(&self, siege: NewSiege) -> Result<SiegeId> {
        let mut tables = self.write()?;
        tables.next_siege_id += 1;
        let id = SiegeId(tables.next_siege_id);
        tables.sieges.insert(
            id,
            Siege {
                id,
                alliance_id: siege.alliance_id,
                city: siege.city,
                city_level: siege.city_level,
                start_at: siege.start_at,
                state: SiegeState::Scheduled,
                result: None,
                final_points: None,
                created_by: siege.created_by,
                created_at: siege.created_at,
            },
        );
        Ok(id)
    }

    fn active_siege(&self, alliance: AllianceId) -> Result<Option<Siege>> {
        Ok(self
            .read()?
            .sieges
            .values()
            .rev()
            .find(|s| s.alliance_id == alliance && s.state.is_active())
            .cloned())
    }

    fn latest_siege(&self, alliance: AllianceId) -> Result<Option<Siege>> {
        Ok(self
            .read()?
            .sieges
            .values()
            .rev()
            .find(|s| s.alliance_id == alliance)
            .cloned())
    }

    fn siege(&self, id: SiegeId) -> Result<Option<Siege>> {
        Ok(self.read()?.sieges.get(&id).cloned())
    }

    fn transition_siege(
        &self,
        id: SiegeId,
        to: SiegeState,
        result: Option<SiegeResult>,
        final_points: Option<u64>,
    ) -> Result<bool> {
        let mut tables = self.write()?;
        let siege = tables
            .sieges
            .get_mut(&id)
            .ok_or_else(|| GameError::Storage(format!("siege {id} does not exist")))?;
        if siege.state == SiegeState::Done || siege.state == to {
            return Ok(false);
        }
        siege.state = to;
        siege.result = result;
        siege.final_points = final_points;
        Ok(true)
    }

    fn upsert_participant(&self, participant: &SiegeParticipant) -> Result<()> {
        let mut tables = self.write()?;
        let list = tables.participants.entry(participant.siege_id).or_default();
        list.retain(|p| p.user_id != participant.user_id);
        list.push(participant.clone());
        Ok(())
    }

    fn list_participants(&self, siege: SiegeId) -> Result<Vec<SiegeParticipant>> {
        Ok(self
            .read()?
            .participants
            .get(&siege)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siege_for(alliance: AllianceId) -> NewSiege {
        NewSiege {
            alliance_id: alliance,
            city: "Luoyang".into(),
            city_level: 2,
            start_at: 1_000,
            created_by: "lead".into(),
            created_at: 0,
        }
    }

    #[test]
    fn test_ensure_teams_is_idempotent() {
        let repo = MemoryRepository::new();
        repo.ensure_teams("u1", 3, 3).unwrap();
        repo.set_team_slot("u1", 2, 3, Some("Zhao Yun")).unwrap();
        repo.set_team_troops("u1", 2, 150).unwrap();
        repo.ensure_teams("u1", 3, 3).unwrap();

        assert_eq!(repo.find_character_slot("u1", "Zhao Yun").unwrap(), Some((2, 3)));
        assert_eq!(repo.team_troops("u1", 2).unwrap(), 150);
        assert_eq!(repo.team_slots("u1", 1).unwrap().len(), 3);
    }

    #[test]
    fn test_add_character_ignores_duplicates() {
        let repo = MemoryRepository::new();
        repo.add_character("u1", "Zhao Yun", 1, 10).unwrap();
        repo.set_character_level("u1", "Zhao Yun", 4).unwrap();
        repo.add_character("u1", "Zhao Yun", 1, 20).unwrap();
        assert_eq!(repo.character_level("u1", "Zhao Yun").unwrap(), Some(4));
        assert!(repo.has_character("u1", "Zhao Yun").unwrap());
        assert!(!repo.has_character("u2", "Zhao Yun").unwrap());
    }

    #[test]
    fn test_transition_never_rewrites_done() {
        let repo = MemoryRepository::new();
        let alliance = repo.create_alliance("Shu", "lead", 0).unwrap();
        let id = repo.create_siege(siege_for(alliance)).unwrap();

        assert!(repo
            .transition_siege(id, SiegeState::Ongoing, None, None)
            .unwrap());
        assert!(!repo
            .transition_siege(id, SiegeState::Ongoing, None, None)
            .unwrap());
        assert!(repo
            .transition_siege(id, SiegeState::Done, Some(SiegeResult::Fail), Some(40))
            .unwrap());
        assert!(!repo
            .transition_siege(id, SiegeState::Done, Some(SiegeResult::Success), Some(9_000))
            .unwrap());

        let stored = repo.siege(id).unwrap().unwrap();
        assert_eq!(stored.result, Some(SiegeResult::Fail));
        assert_eq!(stored.final_points, Some(40));
        assert!(repo.active_siege(alliance).unwrap().is_none());
        assert_eq!(repo.latest_siege(alliance).unwrap().map(|s| s.id), Some(id));
    }

    #[test]
    fn test_participant_rejoin_replaces() {
        let repo = MemoryRepository::new();
        let alliance = repo.create_alliance("Wei", "lead", 0).unwrap();
        let id = repo.create_siege(siege_for(alliance)).unwrap();
        let mut p = SiegeParticipant {
            siege_id: id,
            user_id: "u1".into(),
            from_city: "A".into(),
            path: vec!["A".into(), "B".into()],
            hops: 1,
            eta: 300,
            joined_at: 0,
        };
        repo.upsert_participant(&p).unwrap();
        p.eta = 600;
        repo.upsert_participant(&p).unwrap();

        let list = repo.list_participants(id).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].eta, 600);
    }

    #[test]
    fn test_duplicate_alliance_name_rejected() {
        let repo = MemoryRepository::new();
        repo.create_alliance("Wu", "a", 0).unwrap();
        assert!(matches!(
            repo.create_alliance("Wu", "b", 0),
            Err(GameError::AllianceExists(_))
        ));
    }

    #[test]
    fn test_snapshot_save_load() {
        let repo = MemoryRepository::new();
        repo.upsert_player(&Player::new("u1", "Liu Bei", 100)).unwrap();
        repo.add_character("u1", "Guan Yu", 3, 100).unwrap();
        let alliance = repo.create_alliance("Shu", "u1", 100).unwrap();
        repo.add_member(alliance, "u1", AllianceRole::Leader, 100).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.bin");
        repo.save(&path).unwrap();

        let restored = MemoryRepository::load(&path).unwrap();
        assert_eq!(restored.player("u1").unwrap().unwrap().nickname, "Liu Bei");
        assert_eq!(restored.character_level("u1", "Guan Yu").unwrap(), Some(3));
        assert_eq!(restored.alliance_of("u1").unwrap().map(|a| a.id), Some(alliance));

        // Ids keep counting after a restore.
        let next = restored.create_alliance("Wei", "u2", 200).unwrap();
        assert_ne!(next, alliance);
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(matches!(
            MemoryRepository::from_bytes(&[1, 2, 3]),
            Err(GameError::Storage(_))
        ));
    }
}
