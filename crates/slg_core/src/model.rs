//! Persistent records owned by the engines.
//!
//! These are plain data. The engines decide when they change; the
//! [`Repository`](crate::repository::Repository) decides how they are stored.

use serde::{Deserialize, Serialize};

use crate::resources::{BuildingLevels, Resources};

/// A player's base city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCity {
    /// City name on the map.
    pub city: String,
    /// Map x coordinate.
    pub x: i32,
    /// Map y coordinate.
    pub y: i32,
}

/// One registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Chat user id.
    pub user_id: String,
    /// Display name.
    pub nickname: String,
    /// Current balances.
    pub resources: Resources,
    /// Building levels.
    pub buildings: BuildingLevels,
    /// Lifetime draws. The next draw has index `draw_count + 1`.
    pub draw_count: u32,
    /// Unix seconds up to which production has been credited.
    pub last_tick: i64,
    /// Unix seconds of registration.
    pub created_at: i64,
    /// Assigned base city.
    pub base: Option<BaseCity>,
    /// Unix seconds of the last base migration.
    pub last_migrated_at: Option<i64>,
}

impl Player {
    /// A fresh player: no resources, every building at level 1.
    #[must_use]
    pub fn new(user_id: impl Into<String>, nickname: impl Into<String>, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: nickname.into(),
            resources: Resources::ZERO,
            buildings: BuildingLevels::STARTING,
            draw_count: 0,
            last_tick: now,
            created_at: now,
            base: None,
            last_migrated_at: None,
        }
    }

    /// Index of the next gacha draw (1-based).
    #[must_use]
    pub const fn next_draw_index(&self) -> u32 {
        self.draw_count + 1
    }
}

/// A character owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCharacter {
    /// Catalog name.
    pub name: String,
    /// Current level.
    pub level: u8,
    /// Unix seconds when it was drawn.
    pub obtained_at: i64,
}

/// One slot of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSlot {
    /// 1-based slot index.
    pub slot: u8,
    /// Assigned character, if any.
    pub character: Option<String>,
}

/// Unique identifier for alliances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllianceId(pub u64);

/// Unique identifier for sieges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiegeId(pub u64);

impl std::fmt::Display for SiegeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An alliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alliance {
    /// Identifier.
    pub id: AllianceId,
    /// Unique name.
    pub name: String,
    /// Leader's user id.
    pub leader_id: String,
    /// Unix seconds of creation.
    pub created_at: i64,
}

/// Role inside an alliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllianceRole {
    /// The founder; schedules sieges.
    Leader,
    /// Everyone else.
    Member,
}

impl std::fmt::Display for AllianceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Leader => "leader",
            Self::Member => "member",
        })
    }
}

/// Membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceMember {
    /// Member's user id.
    pub user_id: String,
    /// Role.
    pub role: AllianceRole,
    /// Unix seconds of joining.
    pub joined_at: i64,
}

/// Alliance with its member count, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllianceSummary {
    /// The alliance.
    pub alliance: Alliance,
    /// Number of members.
    pub member_count: usize,
}

/// Siege lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiegeState {
    /// Waiting for the start time.
    Scheduled,
    /// Inside the contribution window.
    Ongoing,
    /// Finalized with a result.
    Done,
}

impl SiegeState {
    /// Scheduled and ongoing sieges block a new one.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Ongoing)
    }
}

impl std::fmt::Display for SiegeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Done => "done",
        })
    }
}

/// Outcome of a finalized siege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiegeResult {
    /// Threshold reached.
    Success,
    /// Threshold missed.
    Fail,
}

impl std::fmt::Display for SiegeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Fail => "fail",
        })
    }
}

/// Fields needed to create a siege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSiege {
    /// Attacking alliance.
    pub alliance_id: AllianceId,
    /// Target city.
    pub city: String,
    /// Target city level, already clamped.
    pub city_level: u8,
    /// Unix seconds when the window opens.
    pub start_at: i64,
    /// Leader who scheduled it.
    pub created_by: String,
    /// Unix seconds of scheduling.
    pub created_at: i64,
}

/// A stored siege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Siege {
    /// Identifier.
    pub id: SiegeId,
    /// Attacking alliance.
    pub alliance_id: AllianceId,
    /// Target city.
    pub city: String,
    /// Target city level.
    pub city_level: u8,
    /// Unix seconds when the window opens.
    pub start_at: i64,
    /// Lifecycle state.
    pub state: SiegeState,
    /// Set once the siege is done.
    pub result: Option<SiegeResult>,
    /// Points total frozen at finalization.
    pub final_points: Option<u64>,
    /// Leader who scheduled it.
    pub created_by: String,
    /// Unix seconds of scheduling.
    pub created_at: i64,
}

impl std::fmt::Display for Siege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Siege {}: {} Lv{} at {} ({})",
            self.id,
            self.city,
            self.city_level,
            crate::clock::format_timestamp(self.start_at),
            self.state
        )?;
        if let Some(result) = self.result {
            write!(f, " {result}")?;
        }
        Ok(())
    }
}

/// One alliance member marching to a siege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiegeParticipant {
    /// Siege joined.
    pub siege_id: SiegeId,
    /// Participant.
    pub user_id: String,
    /// Base city the march started from.
    pub from_city: String,
    /// Cities visited, origin and target included.
    pub path: Vec<String>,
    /// Number of edges on the path.
    pub hops: u32,
    /// Unix seconds of arrival at the target.
    pub eta: i64,
    /// Unix seconds of joining.
    pub joined_at: i64,
}
