//! Static data files.
//!
//! Balance tables are RON. Map and character files may be RON or JSON; the
//! format is chosen by file extension. Every loader validates what it reads.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::catalog::{Character, CharacterCatalog};
use crate::error::{GameError, Result};
use crate::map::{MapData, MapGraph};
use crate::tables::Balance;

/// Supported data formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// Rusty Object Notation.
    Ron,
    /// JSON.
    Json,
}

impl DataFormat {
    /// Pick a format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(Self::Ron),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(GameError::DataParseError {
                path: path.display().to_string(),
                message: "expected a .ron or .json file".into(),
            }),
        }
    }
}

/// Parse text in the given format.
pub fn parse_str<T: DeserializeOwned>(text: &str, format: DataFormat, origin: &str) -> Result<T> {
    let parsed = match format {
        DataFormat::Ron => ron::from_str(text).map_err(|e| e.to_string()),
        DataFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| GameError::DataParseError {
        path: origin.to_string(),
        message,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| GameError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DataFormat::from_path(path)?;
    let text = read(path)?;
    parse_str(&text, format, &path.display().to_string())
}

/// Load and validate a balance file (RON).
pub fn load_balance(path: &Path) -> Result<Balance> {
    let balance: Balance = parse_str(&read(path)?, DataFormat::Ron, &path.display().to_string())?;
    balance.validate()?;
    tracing::debug!(path = %path.display(), "Balance loaded");
    Ok(balance)
}

/// Load a map file and build its graph.
pub fn load_map(path: &Path) -> Result<MapGraph> {
    let data: MapData = load(path)?;
    let map = MapGraph::from_data(data)?;
    tracing::debug!(path = %path.display(), cities = map.len(), "Map loaded");
    Ok(map)
}

/// Load a character list and build the catalog.
pub fn load_characters(path: &Path) -> Result<CharacterCatalog> {
    let characters: Vec<Character> = load(path)?;
    let catalog = CharacterCatalog::new(characters)?;
    tracing::debug!(path = %path.display(), characters = catalog.len(), "Characters loaded");
    Ok(catalog)
}
