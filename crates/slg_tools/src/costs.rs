//! Cost ladders for balancing work.

use std::fmt;

use slg_core::resources::{Building, Resources};
use slg_core::tables::Balance;

/// One rung of a ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rung {
    /// Draw index or target level.
    pub step: u32,
    /// Price of that step.
    pub cost: Resources,
}

/// A titled list of prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    /// Heading line.
    pub title: String,
    /// Rungs in order.
    pub rungs: Vec<Rung>,
}

impl Ladder {
    /// Sum of every rung.
    #[must_use]
    pub fn total(&self) -> Resources {
        self.rungs
            .iter()
            .fold(Resources::ZERO, |acc, rung| acc + rung.cost)
    }
}

impl fmt::Display for Ladder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for rung in &self.rungs {
            writeln!(f, "  {:>3}: {}", rung.step, rung.cost)?;
        }
        write!(f, "  total: {}", self.total())
    }
}

/// Prices of draws `first..first + count`.
#[must_use]
pub fn draw_ladder(balance: &Balance, first: u32, count: u32) -> Ladder {
    let first = first.max(1);
    Ladder {
        title: format!("Draws {first}..{}", first.saturating_add(count)),
        rungs: (first..first.saturating_add(count))
            .map(|step| Rung {
                step,
                cost: balance.draw_cost(step),
            })
            .collect(),
    }
}

/// Cost of every upgrade of one building, levels 2 to the cap.
#[must_use]
pub fn building_ladder(balance: &Balance, building: Building) -> Ladder {
    Ladder {
        title: format!("{building} upgrades"),
        rungs: (2..=balance.max_building_level)
            .map(|level| Rung {
                step: u32::from(level),
                cost: balance.upgrade_cost(building, level),
            })
            .collect(),
    }
}

/// Cost of every character level-up, levels 2 to the cap.
#[must_use]
pub fn character_ladder(balance: &Balance) -> Ladder {
    Ladder {
        title: "Character level-ups".to_string(),
        rungs: (2..=balance.team.char_level_max)
            .map(|level| Rung {
                step: u32::from(level),
                cost: balance.char_level_up_cost(level),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_ladder_crosses_the_free_draws() {
        let ladder = draw_ladder(&Balance::default(), 5, 3);
        let steps: Vec<u32> = ladder.rungs.iter().map(|r| r.step).collect();
        assert_eq!(steps, [5, 6, 7]);
        assert!(ladder.rungs[0].cost.is_zero());
        assert_eq!(ladder.rungs[2].cost.grain, 98);

        let text = ladder.to_string();
        assert!(text.starts_with("Draws 5..8\n"), "{text}");
        assert!(text.contains("    5: nothing"), "{text}");
    }

    #[test]
    fn test_building_ladder_starts_at_level_two() {
        let balance = Balance::default();
        let ladder = building_ladder(&balance, Building::Farm);
        assert_eq!(ladder.rungs.len(), 9);
        assert_eq!(ladder.rungs[0].step, 2);
        assert_eq!(ladder.rungs[0].cost.to_string(), "grain 510, stone 170");
    }

    #[test]
    fn test_character_ladder_totals() {
        let ladder = character_ladder(&Balance::default());
        assert_eq!(ladder.rungs.len(), 6);
        assert_eq!(ladder.rungs[0].cost.to_string(), "grain 10, gold 10, troops 10");
        assert_eq!(ladder.rungs[5].cost.gold, 1400);
        assert!(ladder.total().gold > 1400);
    }
}
