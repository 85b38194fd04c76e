//! Resource and building kinds.
//!
//! The four resources and the four buildings that produce them are closed
//! enumerations. Anything keyed by them goes through [`PerResource`] or
//! [`PerBuilding`], so a typo is a compile error and a bad user string is a
//! typed validation error rather than a silent lookup miss.

use serde::{Deserialize, Serialize};

use crate::error::{Deficit, GameError, Result};

/// A stockpiled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Produced by the farm.
    Grain,
    /// Produced by the bank.
    Gold,
    /// Produced by the quarry. Every building upgrade costs stone.
    Stone,
    /// Produced by the barracks. Free troops fill teams.
    Troops,
}

impl ResourceKind {
    /// All resources in display order.
    pub const ALL: [Self; 4] = [Self::Grain, Self::Gold, Self::Stone, Self::Troops];

    /// Stable identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Grain => "grain",
            Self::Gold => "gold",
            Self::Stone => "stone",
            Self::Troops => "troops",
        }
    }

    /// The building that produces this resource.
    #[must_use]
    pub const fn building(self) -> Building {
        match self {
            Self::Grain => Building::Farm,
            Self::Gold => Building::Bank,
            Self::Stone => Building::Quarry,
            Self::Troops => Building::Barracks,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A production building. Each one produces exactly one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Building {
    /// Produces grain.
    Farm,
    /// Produces gold.
    Bank,
    /// Produces stone.
    Quarry,
    /// Produces troops.
    Barracks,
}

/// Accepted names for each building, including the localized command names.
const BUILDING_ALIASES: &[(&str, Building)] = &[
    ("farm", Building::Farm),
    ("bank", Building::Bank),
    ("quarry", Building::Quarry),
    ("barracks", Building::Barracks),
    ("农田", Building::Farm),
    ("钱庄", Building::Bank),
    ("采石场", Building::Quarry),
    ("军营", Building::Barracks),
];

impl Building {
    /// All buildings in display order.
    pub const ALL: [Self; 4] = [Self::Farm, Self::Bank, Self::Quarry, Self::Barracks];

    /// Stable identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Farm => "farm",
            Self::Bank => "bank",
            Self::Quarry => "quarry",
            Self::Barracks => "barracks",
        }
    }

    /// The resource this building produces.
    #[must_use]
    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::Farm => ResourceKind::Grain,
            Self::Bank => ResourceKind::Gold,
            Self::Quarry => ResourceKind::Stone,
            Self::Barracks => ResourceKind::Troops,
        }
    }

    /// Resolve a building id or alias.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownBuilding`] if nothing matches.
    pub fn resolve(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        BUILDING_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
            .map(|(_, building)| *building)
            .ok_or_else(|| GameError::UnknownBuilding(name.to_string()))
    }
}

impl std::fmt::Display for Building {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One value per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct PerResource<T> {
    /// Grain value.
    pub grain: T,
    /// Gold value.
    pub gold: T,
    /// Stone value.
    pub stone: T,
    /// Troops value.
    pub troops: T,
}

impl<T> PerResource<T> {
    /// Build from a function of the resource kind.
    pub fn from_fn(mut f: impl FnMut(ResourceKind) -> T) -> Self {
        Self {
            grain: f(ResourceKind::Grain),
            gold: f(ResourceKind::Gold),
            stone: f(ResourceKind::Stone),
            troops: f(ResourceKind::Troops),
        }
    }

    /// Value for one resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> &T {
        match kind {
            ResourceKind::Grain => &self.grain,
            ResourceKind::Gold => &self.gold,
            ResourceKind::Stone => &self.stone,
            ResourceKind::Troops => &self.troops,
        }
    }

    /// Mutable value for one resource.
    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut T {
        match kind {
            ResourceKind::Grain => &mut self.grain,
            ResourceKind::Gold => &mut self.gold,
            ResourceKind::Stone => &mut self.stone,
            ResourceKind::Troops => &mut self.troops,
        }
    }

    /// Iterate `(kind, value)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &T)> {
        ResourceKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

/// Resource balances or a resource cost.
pub type Resources = PerResource<u64>;

impl Resources {
    /// No resources.
    pub const ZERO: Self = Self {
        grain: 0,
        gold: 0,
        stone: 0,
        troops: 0,
    };

    /// A bundle holding only one resource.
    #[must_use]
    pub fn only(kind: ResourceKind, amount: u64) -> Self {
        let mut out = Self::ZERO;
        *out.get_mut(kind) = amount;
        out
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| *v == 0)
    }

    /// Per-resource deficits against `cost`, in display order.
    #[must_use]
    pub fn deficits(&self, cost: &Self) -> Vec<Deficit> {
        ResourceKind::ALL
            .into_iter()
            .filter(|&k| self.get(k) < cost.get(k))
            .map(|k| Deficit {
                resource: k,
                required: *cost.get(k),
                available: *self.get(k),
            })
            .collect()
    }

    /// Check if these balances cover a cost.
    #[must_use]
    pub fn can_afford(&self, cost: &Self) -> bool {
        ResourceKind::ALL
            .into_iter()
            .all(|k| self.get(k) >= cost.get(k))
    }

    /// Debit a cost, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] listing every short
    /// resource; balances are left untouched.
    pub fn spend(&mut self, cost: &Self) -> Result<()> {
        let deficits = self.deficits(cost);
        if !deficits.is_empty() {
            return Err(GameError::InsufficientResources(deficits));
        }
        for kind in ResourceKind::ALL {
            *self.get_mut(kind) -= *cost.get(kind);
        }
        Ok(())
    }
}

impl std::ops::Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_fn(|k| self.get(k).saturating_add(*rhs.get(k)))
    }
}

impl std::ops::AddAssign for Resources {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|(k, v)| format!("{k} {v}"))
            .collect();
        if parts.is_empty() {
            f.write_str("nothing")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// One value per building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct PerBuilding<T> {
    /// Farm value.
    pub farm: T,
    /// Bank value.
    pub bank: T,
    /// Quarry value.
    pub quarry: T,
    /// Barracks value.
    pub barracks: T,
}

impl<T> PerBuilding<T> {
    /// Value for one building.
    #[must_use]
    pub const fn get(&self, building: Building) -> &T {
        match building {
            Building::Farm => &self.farm,
            Building::Bank => &self.bank,
            Building::Quarry => &self.quarry,
            Building::Barracks => &self.barracks,
        }
    }

    /// Mutable value for one building.
    pub fn get_mut(&mut self, building: Building) -> &mut T {
        match building {
            Building::Farm => &mut self.farm,
            Building::Bank => &mut self.bank,
            Building::Quarry => &mut self.quarry,
            Building::Barracks => &mut self.barracks,
        }
    }

    /// Iterate `(building, value)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Building, &T)> {
        Building::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}

/// Building levels of one player.
pub type BuildingLevels = PerBuilding<u8>;

impl BuildingLevels {
    /// Every building at level 1.
    pub const STARTING: Self = Self {
        farm: 1,
        bank: 1,
        quarry: 1,
        barracks: 1,
    };

    /// Level of the building that produces `kind`.
    #[must_use]
    pub const fn for_resource(&self, kind: ResourceKind) -> u8 {
        *self.get(kind.building())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_aliases_resolve() {
        assert_eq!(Building::resolve("farm").ok(), Some(Building::Farm));
        assert_eq!(Building::resolve(" Quarry ").ok(), Some(Building::Quarry));
        assert_eq!(Building::resolve("钱庄").ok(), Some(Building::Bank));
        assert_eq!(Building::resolve("军营").ok(), Some(Building::Barracks));
        assert!(matches!(
            Building::resolve("mine"),
            Err(GameError::UnknownBuilding(name)) if name == "mine"
        ));
    }

    #[test]
    fn test_building_resource_mapping_is_bijective() {
        for building in Building::ALL {
            assert_eq!(building.resource().building(), building);
        }
    }

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut wallet = Resources {
            grain: 100,
            gold: 50,
            stone: 10,
            troops: 0,
        };
        let cost = Resources {
            grain: 60,
            gold: 60,
            stone: 5,
            troops: 0,
        };

        let err = wallet.spend(&cost).unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources(ref d) if d.len() == 1));
        assert_eq!(wallet.grain, 100);
        assert_eq!(wallet.stone, 10);

        let cheap = Resources {
            grain: 60,
            gold: 50,
            stone: 5,
            troops: 0,
        };
        wallet.spend(&cheap).unwrap();
        assert_eq!(wallet, Resources::only(ResourceKind::Grain, 40) + Resources::only(ResourceKind::Stone, 5));
    }

    #[test]
    fn test_resources_display_skips_zero() {
        let cost = Resources {
            grain: 0,
            gold: 10,
            stone: 170,
            troops: 0,
        };
        assert_eq!(cost.to_string(), "gold 10, stone 170");
        assert_eq!(Resources::ZERO.to_string(), "nothing");
    }
}
