//! Error types for the game simulation.
//!
//! Every failure a command can hit is a [`GameError`]. The `Display` output is
//! the user-facing message; [`GameError::kind`] tells callers which class of
//! failure it was without matching on every variant.

use thiserror::Error;

use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Coarse classification of a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown names, malformed numbers, out-of-range indices.
    Validation,
    /// The caller is not in a state that allows the action.
    Precondition,
    /// Not enough resources. Nothing was debited.
    Shortfall,
    /// The external judge failed or answered with something unusable.
    External,
    /// Repository or data-file failure.
    Storage,
}

/// One missing resource in a shortfall report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deficit {
    /// Resource that is short.
    pub resource: ResourceKind,
    /// Amount required.
    pub required: u64,
    /// Amount available.
    pub available: u64,
}

impl std::fmt::Display for Deficit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} need {}, have {}",
            self.resource, self.required, self.available
        )
    }
}

fn join_deficits(deficits: &[Deficit]) -> String {
    deficits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// No player record for this user.
    #[error("Player {0} is not registered")]
    NotRegistered(String),

    /// Building name or alias did not resolve.
    #[error("Unknown building: {0}")]
    UnknownBuilding(String),

    /// Building is already at the level cap.
    #[error("{building} is already at max level {max}")]
    BuildingMaxLevel {
        /// Building id.
        building: String,
        /// Level cap.
        max: u8,
    },

    /// Character name is not in the catalog.
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    /// The player does not own this character.
    #[error("You do not own {0}")]
    CharacterNotOwned(String),

    /// Character is already at the level cap.
    #[error("{name} is already at max level {max}")]
    CharacterMaxLevel {
        /// Character name.
        name: String,
        /// Level cap.
        max: u8,
    },

    /// Team number outside `1..=max`.
    #[error("Team must be between 1 and {max}, got {team}")]
    InvalidTeam {
        /// Requested team.
        team: u8,
        /// Number of teams.
        max: u8,
    },

    /// Slot index outside `1..=max`.
    #[error("Slot must be between 1 and {max}, got {slot}")]
    InvalidSlot {
        /// Requested slot.
        slot: u8,
        /// Slots per team.
        max: u8,
    },

    /// No empty slot in the team.
    #[error("Team {0} is full")]
    TeamFull(u8),

    /// Not enough free troops to reinforce.
    #[error("No free troops: need {needed}, have {available}")]
    NoFreeTroops {
        /// Shortfall of the team.
        needed: u64,
        /// Free troops in the pool.
        available: u64,
    },

    /// Not enough resources for an upgrade, level-up or draw.
    #[error("Insufficient resources: {}", join_deficits(.0))]
    InsufficientResources(Vec<Deficit>),

    /// Alliance name was blank.
    #[error("Alliance name cannot be empty")]
    EmptyAllianceName,

    /// Alliance name already taken.
    #[error("Alliance {0} already exists")]
    AllianceExists(String),

    /// No alliance with this name.
    #[error("No alliance named {0}")]
    UnknownAlliance(String),

    /// User is already a member of some alliance.
    #[error("You are already in alliance {0}")]
    AlreadyInAlliance(String),

    /// User is not in any alliance.
    #[error("You are not in an alliance")]
    NotInAlliance,

    /// Alliance is at its member cap.
    #[error("Alliance is full ({count}/{max})")]
    AllianceFull {
        /// Current members.
        count: usize,
        /// Member cap.
        max: usize,
    },

    /// Action reserved to the alliance leader.
    #[error("Only the alliance leader can do that")]
    NotLeader,

    /// Leader tried to leave while other members remain.
    #[error("The leader cannot leave while {0} other member(s) remain")]
    LeaderCannotLeave(usize),

    /// City name is not on the map.
    #[error("Unknown city: {0}")]
    UnknownCity(String),

    /// City exists but is not eligible as a base.
    #[error("{0} is not in an eligible base province")]
    CityNotEligible(String),

    /// Map has no eligible base cities at all.
    #[error("No eligible base cities on the map")]
    NoBaseCandidates,

    /// Base migration already used today.
    #[error("You already migrated today")]
    MigrationCooldown,

    /// User has no base city yet.
    #[error("You have no base city yet")]
    NoBaseCity,

    /// Alliance already has a scheduled or ongoing siege.
    #[error("Alliance already has siege #{0} scheduled or in progress")]
    SiegeAlreadyActive(u64),

    /// Siege start time leaves no room for the window before `i64::MAX`.
    #[error("Siege start time {0} is out of range")]
    InvalidStartTime(i64),

    /// Alliance has no siege to report on or join.
    #[error("Alliance has no siege")]
    NoActiveSiege,

    /// The two cities are not connected.
    #[error("No path from {from} to {to}")]
    NoPath {
        /// Origin city.
        from: String,
        /// Destination city.
        to: String,
    },

    /// A team needed for battle has no members.
    #[error("Team 1 of {0} is empty")]
    EmptyBattleTeam(String),

    /// The battle judge could not be reached.
    #[error("Battle judge unavailable: {0}")]
    JudgeUnavailable(String),

    /// The battle judge answered with an unusable verdict.
    #[error("Invalid verdict from battle judge: {0}")]
    InvalidVerdict(String),

    /// Repository failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Data loaded but failed consistency checks.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl GameError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownBuilding(_)
            | Self::UnknownCharacter(_)
            | Self::InvalidTeam { .. }
            | Self::InvalidSlot { .. }
            | Self::EmptyAllianceName
            | Self::UnknownAlliance(_)
            | Self::UnknownCity(_)
            | Self::CityNotEligible(_)
            | Self::InvalidStartTime(_) => ErrorKind::Validation,
            Self::InsufficientResources(_) | Self::NoFreeTroops { .. } => ErrorKind::Shortfall,
            Self::JudgeUnavailable(_) | Self::InvalidVerdict(_) => ErrorKind::External,
            Self::Storage(_) | Self::DataParseError { .. } | Self::InvalidData(_) => {
                ErrorKind::Storage
            }
            _ => ErrorKind::Precondition,
        }
    }
}
