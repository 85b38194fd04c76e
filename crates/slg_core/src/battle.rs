//! Battles between two players' first teams.
//!
//! The outcome is decided by an external [`BattleJudge`]. This module gathers
//! what the judge needs (members, stationed troops and a keyword-derived
//! profile of each side's skills) and validates what comes back. Nothing is
//! written to the repository.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::CharacterCatalog;
use crate::error::{GameError, Result};
use crate::repository::Repository;

/// Team that fights.
pub const BATTLE_TEAM: u8 = 1;

/// Allowed drift of the two probabilities from summing to one.
const PROBABILITY_TOLERANCE: f64 = 1e-3;

/// A side of the battle. The attacker is always `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Attacker.
    A,
    /// Defender.
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
        })
    }
}

/// Normalized skill profile of a team, each axis in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillProfile {
    /// Damage output.
    pub combat: f64,
    /// Crowd control.
    pub control: f64,
    /// Morale; 0.5 is neutral.
    pub morale: f64,
    /// Healing and mitigation.
    pub sustain: f64,
    /// Movement.
    pub mobility: f64,
    /// Supply.
    pub logistics: f64,
}

const COMBAT: &[&str] = &[
    "伤害", "爆发", "斩", "破甲", "范围", "AOE", "火焰", "雷", "穿刺", "暴击", "连击", "重击",
    "追击", "射击",
];
const CONTROL: &[&str] = &[
    "控制", "眩晕", "击退", "缴械", "减速", "禁疗", "恐慌", "沉默", "扰乱", "定身", "嘲讽",
];
const MORALE_UP: &[&str] = &["鼓舞", "士气", "军心", "威慑", "震慑", "号令", "指挥"];
const MORALE_DOWN: &[&str] = &["自残", "流血", "衰减", "恐惧", "怯战", "崩溃", "退却"];
const SUSTAIN: &[&str] = &[
    "治疗", "回复", "再生", "护盾", "格挡", "减伤", "护主", "庇护", "防御姿态", "恢复",
];
const MOBILITY: &[&str] = &["机动", "突击", "冲锋", "闪避", "位移", "穿行", "游走", "突进", "骑射"];
const LOGISTICS: &[&str] = &["补给", "后勤", "粮草", "运输", "续航", "弹药", "工程"];

fn hits(text: &str, keywords: &[&str]) -> u32 {
    let count = keywords
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl SkillProfile {
    /// Build a profile from skill texts (name and description of each skill).
    #[must_use]
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = [0u32; 7];
        let mut total = 0u32;
        for text in texts {
            let text = text.to_lowercase();
            if text.trim().is_empty() {
                continue;
            }
            total += 1;
            for (slot, keywords) in [
                COMBAT,
                CONTROL,
                MORALE_UP,
                MORALE_DOWN,
                SUSTAIN,
                MOBILITY,
                LOGISTICS,
            ]
            .iter()
            .enumerate()
            {
                counts[slot] += hits(&text, keywords);
            }
        }
        let denom = f64::from(total.max(3));
        let norm = |v: u32| round3((f64::from(v) / denom).min(1.0));
        let morale =
            (f64::from(counts[2]) - 0.7 * f64::from(counts[3])) / denom + 0.5;

        Self {
            combat: norm(counts[0]),
            control: norm(counts[1]),
            morale: round3(morale.clamp(0.0, 1.0)),
            sustain: norm(counts[4]),
            mobility: norm(counts[5]),
            logistics: norm(counts[6]),
        }
    }

    fn axes(&self) -> [f64; 6] {
        [
            self.combat,
            self.control,
            self.morale,
            self.sustain,
            self.mobility,
            self.logistics,
        ]
    }
}

/// One side of a battle request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Player.
    pub user_id: String,
    /// Team 1 member names in slot order.
    pub members: Vec<String>,
    /// Troops currently stationed, not capacity.
    pub troops: u64,
    /// Skill profile of the members.
    pub profile: SkillProfile,
}

/// Everything a judge sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRequest {
    /// Side `A`.
    pub attacker: Combatant,
    /// Side `B`.
    pub defender: Combatant,
}

/// Win probability of each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    /// Attacker.
    #[serde(rename = "A")]
    pub a: f64,
    /// Defender.
    #[serde(rename = "B")]
    pub b: f64,
}

/// A judge's decision.
///
/// # Example JSON
///
/// ```json
/// { "winner": "A", "prob": { "A": 0.6, "B": 0.4 }, "confidence": "medium" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Winning side.
    pub winner: Side,
    /// Win probabilities.
    #[serde(rename = "prob")]
    pub odds: Odds,
    /// Free-form confidence label.
    #[serde(default)]
    pub confidence: String,
}

impl Verdict {
    /// Check probability ranges and that the winner is not the underdog.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidVerdict`] describing the problem.
    pub fn validate(&self) -> Result<()> {
        let Odds { a, b } = self.odds;
        for (side, p) in [(Side::A, a), (Side::B, b)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GameError::InvalidVerdict(format!(
                    "probability of {side} is {p}, outside [0, 1]"
                )));
            }
        }
        if (a + b - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(GameError::InvalidVerdict(format!(
                "probabilities sum to {}",
                a + b
            )));
        }
        let underdog = match self.winner {
            Side::A => a < b,
            Side::B => b < a,
        };
        if underdog {
            return Err(GameError::InvalidVerdict(format!(
                "winner {} has the lower probability",
                self.winner
            )));
        }
        Ok(())
    }
}

/// Parse and validate a verdict received as JSON text.
pub fn parse_verdict(json: &str) -> Result<Verdict> {
    let verdict: Verdict =
        serde_json::from_str(json).map_err(|e| GameError::InvalidVerdict(e.to_string()))?;
    verdict.validate()?;
    Ok(verdict)
}

/// Decides battles.
pub trait BattleJudge: Send + Sync {
    /// Judge one battle.
    ///
    /// # Errors
    ///
    /// [`GameError::JudgeUnavailable`] if the judge cannot answer.
    fn judge(&self, request: &BattleRequest) -> Result<Verdict>;
}

/// Offline judge scoring skill profiles and troop advantage.
///
/// Used when no external judge is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicJudge;

impl HeuristicJudge {
    /// Signed score; positive favors the attacker.
    #[must_use]
    pub fn score(request: &BattleRequest) -> i32 {
        let a = request.attacker.profile.axes();
        let b = request.defender.profile.axes();
        let skill: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * 3.0).sum();
        #[allow(clippy::cast_possible_truncation)]
        let mut score = skill.round() as i32;

        let (ta, tb) = (request.attacker.troops, request.defender.troops);
        #[allow(clippy::cast_precision_loss)]
        let diff = (ta as f64 - tb as f64) / (ta + tb).max(1) as f64;
        score += match diff {
            d if d > 0.25 => 2,
            d if d > 0.10 => 1,
            d if d < -0.25 => -2,
            d if d < -0.10 => -1,
            _ => 0,
        };
        score
    }

    /// Attacker win probability for a score.
    #[must_use]
    pub fn probability(score: i32) -> f64 {
        match score {
            s if s >= 9 => 0.8,
            s if s >= 6 => 0.7,
            s if s >= 3 => 0.6,
            s if s >= 1 => 0.55,
            s if s <= -9 => 0.2,
            s if s <= -6 => 0.3,
            s if s <= -3 => 0.4,
            s if s <= -1 => 0.45,
            _ => 0.5,
        }
    }
}

impl BattleJudge for HeuristicJudge {
    fn judge(&self, request: &BattleRequest) -> Result<Verdict> {
        let score = Self::score(request);
        let a = Self::probability(score);
        let b = round3(1.0 - a);
        let confidence = match score.unsigned_abs() {
            0..=2 => "low",
            3..=5 => "medium",
            _ => "high",
        };
        Ok(Verdict {
            winner: if a >= b { Side::A } else { Side::B },
            odds: Odds { a, b },
            confidence: confidence.to_string(),
        })
    }
}

/// A judged battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleReport {
    /// What the judge saw.
    pub request: BattleRequest,
    /// What it decided.
    pub verdict: Verdict,
}

impl std::fmt::Display for BattleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |c: &Combatant| format!("{} [{}] {} troops", c.user_id, c.members.join(", "), c.troops);
        writeln!(f, "A: {}", side(&self.request.attacker))?;
        writeln!(f, "B: {}", side(&self.request.defender))?;
        write!(
            f,
            "Winner {} (A {:.0}% / B {:.0}%, confidence {})",
            self.verdict.winner,
            self.verdict.odds.a * 100.0,
            self.verdict.odds.b * 100.0,
            self.verdict.confidence
        )
    }
}

/// Prepares battles and consults the judge.
pub struct BattleEngine<R> {
    repo: Arc<R>,
    catalog: Arc<CharacterCatalog>,
    judge: Arc<dyn BattleJudge>,
}

impl<R: Repository> BattleEngine<R> {
    /// Create an engine.
    pub fn new(repo: Arc<R>, catalog: Arc<CharacterCatalog>, judge: Arc<dyn BattleJudge>) -> Self {
        Self {
            repo,
            catalog,
            judge,
        }
    }

    fn combatant(&self, user_id: &str) -> Result<Combatant> {
        let members: Vec<String> = self
            .repo
            .team_slots(user_id, BATTLE_TEAM)?
            .into_iter()
            .filter_map(|slot| slot.character)
            .collect();
        if members.is_empty() {
            return Err(GameError::EmptyBattleTeam(user_id.to_string()));
        }
        let texts: Vec<String> = members
            .iter()
            .filter_map(|name| self.catalog.get(name))
            .flat_map(|c| c.skills.iter())
            .map(|s| format!("{} {}", s.name, s.description))
            .collect();
        Ok(Combatant {
            user_id: user_id.to_string(),
            troops: self.repo.team_troops(user_id, BATTLE_TEAM)?,
            profile: SkillProfile::from_texts(texts.iter().map(String::as_str)),
            members,
        })
    }

    /// Pit the attacker's team 1 against the defender's.
    ///
    /// # Errors
    ///
    /// Either team empty, the judge unavailable, or an invalid verdict.
    pub fn simulate(&self, attacker: &str, defender: &str) -> Result<BattleReport> {
        let request = BattleRequest {
            attacker: self.combatant(attacker)?,
            defender: self.combatant(defender)?,
        };
        let verdict = self.judge.judge(&request)?;
        verdict.validate()?;
        tracing::info!(attacker, defender, winner = %verdict.winner, "Battle judged");
        Ok(BattleReport { request, verdict })
    }
}
