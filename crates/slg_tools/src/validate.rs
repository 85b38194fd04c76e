//! Data validation utilities.
//!
//! A data directory holds `balance.ron` (optional, defaults apply when
//! absent), `map.ron` or `map.json`, and `characters.ron` or
//! `characters.json`. Each file is validated on load; the cross-file checks
//! here catch combinations that load fine but break the game.

use std::fmt;
use std::path::{Path, PathBuf};

use slg_core::catalog::CharacterCatalog;
use slg_core::loader;
use slg_core::map::MapGraph;
use slg_core::tables::Balance;

use crate::{Result, ToolError};

/// Locate `<stem>.ron` or `<stem>.json` in `dir`.
#[must_use]
pub fn find_data_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["ron", "json"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

fn require(dir: &Path, stem: &str) -> Result<PathBuf> {
    find_data_file(dir, stem).ok_or_else(|| ToolError::MissingFile {
        dir: dir.to_path_buf(),
        stem: stem.to_string(),
    })
}

/// Everything loaded from a valid data directory.
#[derive(Debug)]
pub struct DataSet {
    /// Balance tables.
    pub balance: Balance,
    /// World graph.
    pub map: MapGraph,
    /// Drawable characters.
    pub catalog: CharacterCatalog,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} cities in {} provinces, {} characters",
            self.map.len(),
            self.map.provinces().len(),
            self.catalog.len()
        )?;
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

/// Cross-check a loaded balance, map and catalog.
///
/// Returns `(problems, warnings)`.
#[must_use]
pub fn cross_check(
    balance: &Balance,
    map: &MapGraph,
    catalog: &CharacterCatalog,
) -> (Vec<String>, Vec<String>) {
    let mut problems = Vec::new();
    let mut warnings = Vec::new();

    if map.is_empty() {
        problems.push("map has no cities".to_string());
    }
    if catalog.is_empty() {
        problems.push("character list is empty".to_string());
    }

    let provinces = map.provinces();
    for province in &balance.base_provinces {
        if !provinces.contains(&province.as_str()) {
            problems.push(format!("base province {province} has no cities on the map"));
        }
    }

    for city in map.cities() {
        if map.neighbors(&city.name).is_empty() {
            warnings.push(format!("{} has no links and can never be reached", city.name));
        }
        let clamped = balance.siege.clamp_city_level(city.level);
        if clamped != city.level {
            warnings.push(format!(
                "{} siege level {} is clamped to {clamped}",
                city.name, city.level
            ));
        }
    }

    for character in catalog.iter() {
        if character.skills.is_empty() {
            warnings.push(format!("{} has no skills", character.name));
        }
    }

    (problems, warnings)
}

/// Load and validate every data file in a directory.
///
/// # Errors
///
/// Returns an error if a required file is missing, any file fails to load,
/// or the cross-file checks find problems.
pub fn validate_data_directory(dir: &Path) -> Result<DataSet> {
    let balance = match find_data_file(dir, "balance") {
        Some(path) => loader::load_balance(&path)?,
        None => {
            tracing::debug!("No balance file, using defaults");
            Balance::default()
        }
    };
    let map = loader::load_map(&require(dir, "map")?)?;
    let catalog = loader::load_characters(&require(dir, "characters")?)?;

    let (problems, warnings) = cross_check(&balance, &map, &catalog);
    if !problems.is_empty() {
        return Err(ToolError::Inconsistent(problems));
    }
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    Ok(DataSet {
        balance,
        map,
        catalog,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const MAP: &str = r#"{"cities": {
        "成都": {"province": "益", "type": "CITY", "pos": [0, 0], "lines": {"north": "汉中"}},
        "汉中": {"province": "益", "type": "PASS", "pos": [0, 1], "lines": {}, "level": 6},
        "夷州": {"province": "扬", "type": "CITY", "pos": [9, 9], "lines": {}}
    }}"#;

    const CHARACTERS: &str = r#"[
        {"name": "关羽", "skills": [{"name": "威震华夏", "description": "重击"}]},
        {"name": "张飞"}
    ]"#;

    fn data_dir(balance: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("map.json"), MAP).unwrap();
        fs::write(dir.path().join("characters.json"), CHARACTERS).unwrap();
        if let Some(balance) = balance {
            fs::write(dir.path().join("balance.ron"), balance).unwrap();
        }
        dir
    }

    #[test]
    fn test_valid_directory_with_warnings() {
        let dir = data_dir(Some(r#"(base_provinces: ["益", "扬"])"#));
        let data = validate_data_directory(dir.path()).unwrap();
        assert_eq!(data.map.len(), 3);
        assert_eq!(data.catalog.len(), 2);

        let text = data.to_string();
        assert!(text.contains("夷州 has no links"), "{text}");
        assert!(text.contains("汉中 siege level 6 is clamped to 4"), "{text}");
        assert!(text.contains("张飞 has no skills"), "{text}");
    }

    #[test]
    fn test_missing_base_province_is_a_problem() {
        let dir = data_dir(None);
        let err = validate_data_directory(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ToolError::Inconsistent(_)));
        assert!(message.contains("base province 冀"), "{message}");
    }

    #[test]
    fn test_missing_map_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ToolError::MissingFile { stem, .. }) if stem == "map"
        ));
    }

    #[test]
    fn test_broken_balance_is_reported() {
        let dir = data_dir(Some("(max_building_level: 12)"));
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ToolError::Game(_))
        ));
    }
}
