//! Alliances: creation, membership and listings.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{GameError, Result};
use crate::model::{Alliance, AllianceMember, AllianceRole, AllianceSummary};
use crate::repository::Repository;
use crate::tables::Balance;

/// An alliance with its members, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    /// The alliance.
    pub alliance: Alliance,
    /// Members in join order.
    pub members: Vec<AllianceMember>,
}

impl std::fmt::Display for Roster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({} members)", self.alliance.name, self.members.len())?;
        for member in &self.members {
            writeln!(f, "- {} [{}]", member.user_id, member.role)?;
        }
        Ok(())
    }
}

/// What [`AllianceEngine::leave`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The user left; the alliance remains.
    Left(String),
    /// The last member (the leader) left and the alliance is gone.
    Dissolved(String),
}

impl std::fmt::Display for Departure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left(name) => write!(f, "You left {name}"),
            Self::Dissolved(name) => write!(f, "{name} has been dissolved"),
        }
    }
}

/// Alliance membership rules.
pub struct AllianceEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    clock: Arc<dyn Clock>,
}

impl<R: Repository> AllianceEngine<R> {
    /// Create an engine.
    pub fn new(repo: Arc<R>, balance: Arc<Balance>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            balance,
            clock,
        }
    }

    fn ensure_unaffiliated(&self, user_id: &str) -> Result<()> {
        match self.repo.alliance_of(user_id)? {
            Some(current) => Err(GameError::AlreadyInAlliance(current.name)),
            None => Ok(()),
        }
    }

    fn by_name(&self, name: &str) -> Result<Alliance> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyAllianceName);
        }
        self.repo
            .alliance_by_name(name)?
            .ok_or_else(|| GameError::UnknownAlliance(name.to_string()))
    }

    /// Found an alliance. The creator becomes its leader.
    pub fn create(&self, user_id: &str, name: &str) -> Result<Alliance> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyAllianceName);
        }
        self.ensure_unaffiliated(user_id)?;
        if self.repo.alliance_by_name(name)?.is_some() {
            return Err(GameError::AllianceExists(name.to_string()));
        }

        let now = self.clock.now();
        let id = self.repo.create_alliance(name, user_id, now)?;
        self.repo
            .add_member(id, user_id, AllianceRole::Leader, now)?;
        tracing::info!(alliance = name, leader = user_id, "Alliance created");

        Ok(Alliance {
            id,
            name: name.to_string(),
            leader_id: user_id.to_string(),
            created_at: now,
        })
    }

    /// Join an existing alliance as a member.
    ///
    /// # Errors
    ///
    /// Already in an alliance, unknown name, or the alliance is full.
    pub fn join(&self, user_id: &str, name: &str) -> Result<Alliance> {
        let alliance = self.by_name(name)?;
        self.ensure_unaffiliated(user_id)?;

        let count = self.repo.count_members(alliance.id)?;
        let max = self.balance.alliance_max_members;
        if count >= max {
            return Err(GameError::AllianceFull { count, max });
        }
        self.repo
            .add_member(alliance.id, user_id, AllianceRole::Member, self.clock.now())?;
        tracing::info!(alliance = %alliance.name, user = user_id, "Joined alliance");
        Ok(alliance)
    }

    /// Leave the current alliance.
    ///
    /// The leader can only leave as the last member, which dissolves it.
    pub fn leave(&self, user_id: &str) -> Result<Departure> {
        let alliance = self
            .repo
            .alliance_of(user_id)?
            .ok_or(GameError::NotInAlliance)?;

        if alliance.leader_id == user_id {
            let others = self.repo.count_members(alliance.id)?.saturating_sub(1);
            if others > 0 {
                return Err(GameError::LeaderCannotLeave(others));
            }
            self.repo.delete_alliance(alliance.id)?;
            tracing::info!(alliance = %alliance.name, "Alliance dissolved");
            return Ok(Departure::Dissolved(alliance.name));
        }

        self.repo.remove_member(alliance.id, user_id)?;
        tracing::info!(alliance = %alliance.name, user = user_id, "Left alliance");
        Ok(Departure::Left(alliance.name))
    }

    /// Members of a named alliance.
    pub fn members(&self, name: &str) -> Result<Roster> {
        let alliance = self.by_name(name)?;
        let members = self.repo.list_members(alliance.id)?;
        Ok(Roster { alliance, members })
    }

    /// Members of the user's own alliance.
    pub fn my_members(&self, user_id: &str) -> Result<Roster> {
        let alliance = self
            .repo
            .alliance_of(user_id)?
            .ok_or(GameError::NotInAlliance)?;
        let members = self.repo.list_members(alliance.id)?;
        Ok(Roster { alliance, members })
    }

    /// Every alliance with its member count.
    pub fn list_all(&self) -> Result<Vec<AllianceSummary>> {
        self.repo.list_alliances()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn engine(max_members: usize) -> AllianceEngine<MemoryRepository> {
        let balance = Balance {
            alliance_max_members: max_members,
            ..Balance::default()
        };
        AllianceEngine::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(balance),
            Arc::new(FixedClock(500)),
        )
    }

    #[test]
    fn test_create_trims_and_makes_leader() {
        let alliances = engine(20);
        let created = alliances.create("u1", "  Shu  ").unwrap();
        assert_eq!(created.name, "Shu");
        let roster = alliances.my_members("u1").unwrap();
        assert_eq!(roster.members.len(), 1);
        assert_eq!(roster.members[0].role, AllianceRole::Leader);
    }

    #[test]
    fn test_create_rejects_blank_and_duplicate() {
        let alliances = engine(20);
        assert!(matches!(
            alliances.create("u1", "   "),
            Err(GameError::EmptyAllianceName)
        ));
        alliances.create("u1", "Shu").unwrap();
        assert!(matches!(
            alliances.create("u2", "Shu"),
            Err(GameError::AllianceExists(_))
        ));
        assert!(matches!(
            alliances.create("u1", "Wei"),
            Err(GameError::AlreadyInAlliance(_))
        ));
    }

    #[test]
    fn test_join_respects_capacity() {
        let alliances = engine(2);
        alliances.create("u1", "Shu").unwrap();
        alliances.join("u2", "Shu").unwrap();
        assert!(matches!(
            alliances.join("u3", "Shu"),
            Err(GameError::AllianceFull { count: 2, max: 2 })
        ));
        assert!(matches!(
            alliances.join("u3", "Wu"),
            Err(GameError::UnknownAlliance(_))
        ));
    }

    #[test]
    fn test_leader_leaves_last() {
        let alliances = engine(20);
        alliances.create("u1", "Shu").unwrap();
        alliances.join("u2", "Shu").unwrap();

        assert!(matches!(
            alliances.leave("u1"),
            Err(GameError::LeaderCannotLeave(1))
        ));
        assert_eq!(alliances.leave("u2").unwrap(), Departure::Left("Shu".into()));
        assert_eq!(
            alliances.leave("u1").unwrap(),
            Departure::Dissolved("Shu".into())
        );
        assert!(alliances.list_all().unwrap().is_empty());
        assert!(matches!(alliances.leave("u1"), Err(GameError::NotInAlliance)));
    }

    #[test]
    fn test_list_all_counts_members() {
        let alliances = engine(20);
        alliances.create("u1", "Shu").unwrap();
        alliances.join("u2", "Shu").unwrap();
        alliances.create("u3", "Wu").unwrap();
        let all = alliances.list_all().unwrap();
        let counts: Vec<(&str, usize)> = all
            .iter()
            .map(|s| (s.alliance.name.as_str(), s.member_count))
            .collect();
        assert_eq!(counts, [("Shu", 2), ("Wu", 1)]);
    }
}
