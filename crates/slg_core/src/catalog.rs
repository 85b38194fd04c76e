//! Immutable character catalog.
//!
//! Built once from static data and shared by reference with every engine
//! that needs it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// A character skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill name.
    pub name: String,
    /// Free-text description, read by the battle judge.
    #[serde(default)]
    pub description: String,
}

/// A drawable character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Unique name.
    pub name: String,
    /// Honorific title.
    #[serde(default)]
    pub title: String,
    /// Flavor text.
    #[serde(default)]
    pub background: String,
    /// Skills.
    #[serde(default)]
    pub skills: Vec<Skill>,
}

/// All characters, in data-file order.
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    characters: Vec<Character>,
    by_name: HashMap<String, usize>,
}

impl CharacterCatalog {
    /// Build a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] on an empty or duplicate name.
    pub fn new(characters: Vec<Character>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(characters.len());
        for (idx, character) in characters.iter().enumerate() {
            if character.name.trim().is_empty() {
                return Err(GameError::InvalidData(format!(
                    "character #{idx} has an empty name"
                )));
            }
            if by_name.insert(character.name.clone(), idx).is_some() {
                return Err(GameError::InvalidData(format!(
                    "duplicate character: {}",
                    character.name
                )));
            }
        }
        Ok(Self {
            characters,
            by_name,
        })
    }

    /// Look up a character by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Character> {
        self.by_name.get(name).map(|&idx| &self.characters[idx])
    }

    /// Whether the catalog knows this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All characters in data-file order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(name: &str) -> Character {
        Character {
            name: name.into(),
            title: String::new(),
            background: String::new(),
            skills: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_keeps_order() {
        let catalog =
            CharacterCatalog::new(vec![character("Guan Yu"), character("Zhang Fei")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("Zhang Fei"));
        assert!(catalog.get("Lu Bu").is_none());
        let names: Vec<_> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Guan Yu", "Zhang Fei"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = CharacterCatalog::new(vec![character("A"), character("A")]).unwrap_err();
        assert!(matches!(err, GameError::InvalidData(_)));
    }
}
