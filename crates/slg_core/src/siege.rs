//! Alliance sieges.
//!
//! A siege moves `scheduled` → `ongoing` → `done`. Nothing runs in the
//! background: the state is advanced as a side effect of
//! [`SiegeEngine::status_and_maybe_finalize`], and finalization goes through
//! the repository's compare-and-set so it happens at most once.
//!
//! Contribution is measured in whole minutes spent inside the window after a
//! participant's arrival, multiplied by the level sum of their team 1.

use std::sync::Arc;

use crate::clock::{format_time_of_day, format_timestamp, Clock};
use crate::error::{GameError, Result};
use crate::map::MapGraph;
use crate::model::{Alliance, NewSiege, Siege, SiegeParticipant, SiegeResult, SiegeState};
use crate::repository::Repository;
use crate::tables::{Balance, MINUTE};
use crate::team::TeamEngine;

/// Team whose level sum drives siege output.
pub const SIEGE_TEAM: u8 = 1;

/// Whole minutes a participant contributes at `now`.
///
/// Contribution starts at the later of arrival and window start and stops at
/// the earlier of `now` and window end.
#[must_use]
pub fn contribution_minutes(eta: i64, start_at: i64, end_at: i64, now: i64) -> u64 {
    let from = eta.max(start_at);
    let until = now.min(end_at);
    u64::try_from(until.saturating_sub(from).max(0) / MINUTE).unwrap_or(0)
}

/// One participant's line in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantProgress {
    /// Participant.
    pub user_id: String,
    /// Origin city.
    pub from_city: String,
    /// Hops marched.
    pub hops: u32,
    /// Arrival time.
    pub eta: i64,
    /// Team 1 level sum.
    pub level_sum: u64,
    /// Minutes counted.
    pub minutes: u64,
    /// `level_sum × minutes`.
    pub points: u64,
}

/// Where a siege stands at the time of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiegePhase {
    /// Before the window: the rally queue.
    Queue,
    /// Inside the window.
    Ongoing,
    /// Finalized.
    Finished(SiegeResult),
}

/// Result of [`SiegeEngine::status_and_maybe_finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiegeReport {
    /// The siege as stored after this query.
    pub siege: Siege,
    /// Phase.
    pub phase: SiegePhase,
    /// Query time.
    pub now: i64,
    /// Window end.
    pub end_at: i64,
    /// Participants in join order.
    pub participants: Vec<ParticipantProgress>,
    /// Sum of all points; frozen once the siege is done.
    pub total_points: u64,
    /// Points needed.
    pub threshold: u64,
}

impl std::fmt::Display for SiegeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let siege = &self.siege;
        if self.phase == SiegePhase::Queue {
            writeln!(
                f,
                "Siege {} target {} Lv{} starts {}",
                siege.id,
                siege.city,
                siege.city_level,
                format_timestamp(siege.start_at)
            )?;
            for p in &self.participants {
                writeln!(
                    f,
                    "- {} from {}, {} hop(s), arrives {}",
                    p.user_id,
                    p.from_city,
                    p.hops,
                    format_time_of_day(p.eta)
                )?;
            }
            return Ok(());
        }

        writeln!(
            f,
            "Siege {} target {} Lv{} progress {}/{}",
            siege.id, siege.city, siege.city_level, self.total_points, self.threshold
        )?;
        writeln!(
            f,
            "Window {} - {}, now {}",
            format_time_of_day(siege.start_at),
            format_time_of_day(self.end_at),
            format_time_of_day(self.now)
        )?;
        if let SiegePhase::Finished(result) = self.phase {
            writeln!(f, "Result: {result}")?;
        }
        for p in &self.participants {
            writeln!(
                f,
                "- {} level sum {}, {} min -> {} pts",
                p.user_id, p.level_sum, p.minutes, p.points
            )?;
        }
        Ok(())
    }
}

/// Result of [`SiegeEngine::join_rally`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rally {
    /// Siege joined.
    pub siege: Siege,
    /// Stored participant record.
    pub participant: SiegeParticipant,
}

impl std::fmt::Display for Rally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rallied to siege {}: {} -> {}, {} hop(s), arrives {}",
            self.siege.id,
            self.participant.from_city,
            self.siege.city,
            self.participant.hops,
            format_time_of_day(self.participant.eta)
        )
    }
}

/// Siege scheduling, rallying and settlement.
pub struct SiegeEngine<R> {
    repo: Arc<R>,
    balance: Arc<Balance>,
    clock: Arc<dyn Clock>,
    map: Arc<MapGraph>,
    teams: Arc<TeamEngine<R>>,
}

impl<R: Repository> SiegeEngine<R> {
    /// Create an engine.
    pub fn new(
        repo: Arc<R>,
        balance: Arc<Balance>,
        clock: Arc<dyn Clock>,
        map: Arc<MapGraph>,
        teams: Arc<TeamEngine<R>>,
    ) -> Self {
        Self {
            repo,
            balance,
            clock,
            map,
            teams,
        }
    }

    fn alliance_of(&self, user_id: &str) -> Result<Alliance> {
        self.repo
            .alliance_of(user_id)?
            .ok_or(GameError::NotInAlliance)
    }

    /// Schedule a siege of `city` starting at `start_at`.
    ///
    /// # Errors
    ///
    /// Caller not a leader, unknown city, a start time whose window would
    /// overflow, or a siege already active.
    pub fn schedule_siege(&self, leader_id: &str, city: &str, start_at: i64) -> Result<Siege> {
        let alliance = self.alliance_of(leader_id)?;
        if alliance.leader_id != leader_id {
            return Err(GameError::NotLeader);
        }
        if start_at
            .checked_add(self.balance.siege.window_secs())
            .is_none()
        {
            return Err(GameError::InvalidStartTime(start_at));
        }
        let target = self
            .map
            .city(city)
            .ok_or_else(|| GameError::UnknownCity(city.to_string()))?;
        if let Some(active) = self.repo.active_siege(alliance.id)? {
            return Err(GameError::SiegeAlreadyActive(active.id.0));
        }

        let city_level = self.balance.siege.clamp_city_level(target.level);
        let id = self.repo.create_siege(NewSiege {
            alliance_id: alliance.id,
            city: city.to_string(),
            city_level,
            start_at,
            created_by: leader_id.to_string(),
            created_at: self.clock.now(),
        })?;
        tracing::info!(siege = id.0, alliance = %alliance.name, city, city_level, "Siege scheduled");

        self.repo
            .siege(id)?
            .ok_or_else(|| GameError::Storage(format!("siege {id} vanished after insert")))
    }

    /// March from the user's base to the active siege target.
    ///
    /// Re-joining replaces the previous march.
    pub fn join_rally(&self, user_id: &str) -> Result<Rally> {
        let alliance = self.alliance_of(user_id)?;
        let siege = self
            .repo
            .active_siege(alliance.id)?
            .ok_or(GameError::NoActiveSiege)?;
        let player = self
            .repo
            .player(user_id)?
            .ok_or_else(|| GameError::NotRegistered(user_id.to_string()))?;
        let base = player.base.ok_or(GameError::NoBaseCity)?;

        let path = self
            .map
            .shortest_path(&base.city, &siege.city)
            .ok_or_else(|| GameError::NoPath {
                from: base.city.clone(),
                to: siege.city.clone(),
            })?;
        let hops = u32::try_from(path.len().saturating_sub(1)).unwrap_or(u32::MAX);
        let now = self.clock.now();
        let march = i64::from(hops)
            .saturating_mul(self.balance.siege.edge_minutes)
            .saturating_mul(MINUTE);
        let eta = now.saturating_add(march);

        let participant = SiegeParticipant {
            siege_id: siege.id,
            user_id: user_id.to_string(),
            from_city: base.city,
            path,
            hops,
            eta,
            joined_at: now,
        };
        self.repo.upsert_participant(&participant)?;
        tracing::info!(siege = siege.id.0, user = user_id, hops, "Joined rally");

        Ok(Rally { siege, participant })
    }

    /// Report on the alliance's siege, advancing its state as time requires.
    ///
    /// Once the window has closed the siege is finalized and the result is
    /// stored before this returns, together with the points total. Later
    /// queries report the stored result and total.
    pub fn status_and_maybe_finalize(&self, user_id: &str) -> Result<SiegeReport> {
        let alliance = self.alliance_of(user_id)?;
        let mut siege = match self.repo.active_siege(alliance.id)? {
            Some(siege) => siege,
            None => self
                .repo
                .latest_siege(alliance.id)?
                .ok_or(GameError::NoActiveSiege)?,
        };

        let now = self.clock.now();
        let end_at = siege.start_at.saturating_add(self.balance.siege.window_secs());

        if siege.state == SiegeState::Scheduled && now >= siege.start_at {
            self.repo
                .transition_siege(siege.id, SiegeState::Ongoing, None, None)?;
            siege.state = SiegeState::Ongoing;
            tracing::info!(siege = siege.id.0, "Siege started");
        }

        let participants = self.progress(&siege, end_at, now)?;
        let mut total_points: u64 = participants.iter().map(|p| p.points).sum();
        let threshold = self.balance.siege.threshold(siege.city_level);

        let phase = if siege.state == SiegeState::Done {
            SiegePhase::Finished(siege.result.unwrap_or(SiegeResult::Fail))
        } else if now < siege.start_at {
            SiegePhase::Queue
        } else if now >= end_at {
            let result = if total_points >= threshold {
                SiegeResult::Success
            } else {
                SiegeResult::Fail
            };
            if self
                .repo
                .transition_siege(siege.id, SiegeState::Done, Some(result), Some(total_points))?
            {
                tracing::info!(siege = siege.id.0, %result, total_points, threshold, "Siege finalized");
            }
            siege = self
                .repo
                .siege(siege.id)?
                .ok_or_else(|| GameError::Storage(format!("siege {} missing", siege.id)))?;
            SiegePhase::Finished(siege.result.unwrap_or(result))
        } else {
            SiegePhase::Ongoing
        };
        if let Some(frozen) = siege.final_points {
            total_points = frozen;
        }

        Ok(SiegeReport {
            siege,
            phase,
            now,
            end_at,
            participants,
            total_points,
            threshold,
        })
    }

    fn progress(&self, siege: &Siege, end_at: i64, now: i64) -> Result<Vec<ParticipantProgress>> {
        self.repo
            .list_participants(siege.id)?
            .into_iter()
            .map(|p| {
                let level_sum = self.teams.level_sum(&p.user_id, SIEGE_TEAM)?;
                let minutes = contribution_minutes(p.eta, siege.start_at, end_at, now);
                Ok(ParticipantProgress {
                    level_sum,
                    minutes,
                    points: level_sum.saturating_mul(minutes),
                    user_id: p.user_id,
                    from_city: p.from_city,
                    hops: p.hops,
                    eta: p.eta,
                })
            })
            .collect()
    }
}
