//! Snapshot inspector: one player's state in a saved repository.

use std::fmt;
use std::path::Path;

use slg_core::clock::format_timestamp;
use slg_core::model::{Alliance, OwnedCharacter, Player};
use slg_core::repository::{MemoryRepository, Repository};
use slg_core::tables::Balance;

use crate::{Result, ToolError};

/// One team as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLine {
    /// Team number.
    pub team: u8,
    /// Stationed troops.
    pub troops: u64,
    /// Members by slot; `None` for empty slots.
    pub members: Vec<Option<String>>,
}

/// Everything stored about a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDump {
    /// Player record.
    pub player: Player,
    /// Owned characters.
    pub characters: Vec<OwnedCharacter>,
    /// Teams in order.
    pub teams: Vec<TeamLine>,
    /// Alliance, if any.
    pub alliance: Option<Alliance>,
}

impl fmt::Display for PlayerDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.player;
        writeln!(f, "{} ({})", p.nickname, p.user_id)?;
        writeln!(f, "  registered {}", format_timestamp(p.created_at))?;
        writeln!(f, "  settled to {}", format_timestamp(p.last_tick))?;
        writeln!(f, "  resources: {}", p.resources)?;
        let levels: Vec<String> = p
            .buildings
            .iter()
            .map(|(building, level)| format!("{building} {level}"))
            .collect();
        writeln!(f, "  buildings: {}", levels.join(", "))?;
        writeln!(f, "  draws: {}", p.draw_count)?;
        match &p.base {
            Some(base) => writeln!(f, "  base: {} ({},{})", base.city, base.x, base.y)?,
            None => writeln!(f, "  base: none")?,
        }
        match &self.alliance {
            Some(alliance) => writeln!(f, "  alliance: {}", alliance.name)?,
            None => writeln!(f, "  alliance: none")?,
        }
        let owned: Vec<String> = self
            .characters
            .iter()
            .map(|c| format!("{} Lv{}", c.name, c.level))
            .collect();
        writeln!(f, "  characters: {}", owned.join(", "))?;
        for team in &self.teams {
            let members: Vec<&str> = team
                .members
                .iter()
                .map(|m| m.as_deref().unwrap_or("-"))
                .collect();
            writeln!(
                f,
                "  team {}: {} troops [{}]",
                team.team,
                team.troops,
                members.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Gather a player's stored state from any repository.
///
/// # Errors
///
/// Unknown player or a repository failure.
pub fn dump_player<R: Repository>(repo: &R, balance: &Balance, user_id: &str) -> Result<PlayerDump> {
    let player = repo
        .player(user_id)?
        .ok_or_else(|| ToolError::UnknownPlayer(user_id.to_string()))?;

    let mut teams = Vec::new();
    for team in 1..=balance.team.team_count {
        let slots = repo.team_slots(user_id, team)?;
        if slots.is_empty() {
            continue;
        }
        teams.push(TeamLine {
            team,
            troops: repo.team_troops(user_id, team)?,
            members: slots.into_iter().map(|s| s.character).collect(),
        });
    }

    Ok(PlayerDump {
        characters: repo.owned_characters(user_id)?,
        alliance: repo.alliance_of(user_id)?,
        teams,
        player,
    })
}

/// Load a snapshot file and dump one player.
///
/// # Errors
///
/// Unreadable snapshot, version mismatch or unknown player.
pub fn inspect_snapshot(path: &Path, balance: &Balance, user_id: &str) -> Result<PlayerDump> {
    let repo = MemoryRepository::load(path)?;
    tracing::debug!(path = %path.display(), "Snapshot loaded");
    dump_player(&repo, balance, user_id)
}
