//! # SLG Core
//!
//! Simulation core of a chat-driven alliance strategy game.
//!
//! This crate contains the game rules and nothing else:
//! - No chat parsing or rendering
//! - No background ticking (production is settled lazily on read)
//! - No direct system time (every engine reads a [`clock::Clock`])
//! - Storage behind the [`repository::Repository`] trait
//!
//! ## Crate Structure
//!
//! - [`tables`] - Balance tables and cost interpolation
//! - [`economy`] - Production settlement and building upgrades
//! - [`team`] - Teams, troop capacity and character levels
//! - [`gacha`] - Character draws
//! - [`alliance`] - Alliance membership
//! - [`base`] - Base cities and migration
//! - [`siege`] - Alliance sieges
//! - [`battle`] - Judged battles
//! - [`map`] - World graph and pathfinding
//! - [`game`] - Facade over every engine

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod alliance;
pub mod base;
pub mod battle;
pub mod catalog;
pub mod clock;
pub mod economy;
pub mod error;
pub mod gacha;
pub mod game;
pub mod loader;
pub mod map;
pub mod model;
pub mod repository;
pub mod resources;
pub mod siege;
pub mod tables;
pub mod team;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::alliance::{AllianceEngine, Departure, Roster};
    pub use crate::base::{BaseAssignment, BaseEngine};
    pub use crate::battle::{
        parse_verdict, BattleEngine, BattleJudge, BattleReport, BattleRequest, HeuristicJudge,
        Side, Verdict,
    };
    pub use crate::catalog::{Character, CharacterCatalog, Skill};
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::economy::{settle_at, EconomyStatus, ResourceEngine, UpgradeReceipt};
    pub use crate::error::{ErrorKind, GameError, Result};
    pub use crate::gacha::{DrawOutcome, DrawStatus, GachaEngine};
    pub use crate::game::{Game, GameConfig};
    pub use crate::map::{MapData, MapGraph};
    pub use crate::model::*;
    pub use crate::repository::{MemoryRepository, Repository};
    pub use crate::resources::{Building, BuildingLevels, ResourceKind, Resources};
    pub use crate::siege::{SiegeEngine, SiegePhase, SiegeReport};
    pub use crate::tables::Balance;
    pub use crate::team::{TeamEngine, TeamView};
}
