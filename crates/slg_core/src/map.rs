//! World map graph and breadth-first pathfinding.
//!
//! Cities are linked by named directional gates ("north gate" → neighbor).
//! For marching purposes every gate is a two-way road, so the graph exposes a
//! single undirected [`MapGraph::neighbors`] view built once at load time.
//!
//! All containers are ordered, which makes neighbor order and therefore BFS
//! tie-breaking identical on every run.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Kind of map node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    /// Walled city.
    #[default]
    City,
    /// Mountain pass or fort.
    Pass,
    /// Resource site.
    Resource,
}

/// Static description of one city, as stored in map files.
///
/// # Example JSON
///
/// ```json
/// "洛阳": {
///     "province": "司",
///     "type": "CITY",
///     "capital": true,
///     "pos": [520, 310],
///     "level": 4,
///     "lines": { "东门": "许昌", "北门": "河内" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityData {
    /// Province the city belongs to.
    pub province: String,
    /// Node kind.
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Whether this is a provincial capital.
    #[serde(default)]
    pub capital: bool,
    /// Display coordinates.
    pub pos: (i32, i32),
    /// Gate name → neighboring city.
    #[serde(default)]
    pub lines: BTreeMap<String, String>,
    /// Siege level; treated as 1 when absent.
    #[serde(default)]
    pub level: Option<u8>,
}

/// Whole map file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapData {
    /// City name → description.
    pub cities: BTreeMap<String, CityData>,
}

/// Loaded city metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    /// Unique name.
    pub name: String,
    /// Province.
    pub province: String,
    /// Node kind.
    pub node_type: NodeType,
    /// Provincial capital flag.
    pub capital: bool,
    /// Raw siege level from the data file.
    pub level: u8,
}

/// Read-only world graph.
#[derive(Debug, Clone, Default)]
pub struct MapGraph {
    cities: BTreeMap<String, City>,
    gates: BTreeMap<String, BTreeMap<String, String>>,
    positions: BTreeMap<String, (i32, i32)>,
    adjacency: BTreeMap<String, Vec<String>>,
}

impl MapGraph {
    /// Build the graph from map data.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidData`] if a gate points at an unknown city.
    pub fn from_data(data: MapData) -> Result<Self> {
        let mut cities = BTreeMap::new();
        let mut gates = BTreeMap::new();
        let mut positions = BTreeMap::new();

        for (name, cfg) in &data.cities {
            for (gate, target) in &cfg.lines {
                if !data.cities.contains_key(target) {
                    return Err(GameError::InvalidData(format!(
                        "{name} gate {gate} points at unknown city {target}"
                    )));
                }
            }
            cities.insert(
                name.clone(),
                City {
                    name: name.clone(),
                    province: cfg.province.clone(),
                    node_type: cfg.node_type,
                    capital: cfg.capital,
                    level: cfg.level.unwrap_or(1),
                },
            );
            positions.insert(name.clone(), cfg.pos);
            gates.insert(name.clone(), cfg.lines.clone());
        }

        let mut adjacency: BTreeMap<String, Vec<String>> =
            cities.keys().map(|name| (name.clone(), Vec::new())).collect();
        for (src, lines) in &gates {
            for dst in lines.values() {
                if dst == src {
                    continue;
                }
                link(&mut adjacency, src, dst);
                link(&mut adjacency, dst, src);
            }
        }

        tracing::debug!(cities = cities.len(), "Map graph built");
        Ok(Self {
            cities,
            gates,
            positions,
            adjacency,
        })
    }

    /// Look up a city.
    #[must_use]
    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    /// Whether the city exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cities.contains_key(name)
    }

    /// All cities, sorted by name.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Number of cities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether the map has no cities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Distinct provinces, sorted.
    #[must_use]
    pub fn provinces(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cities.values().map(|c| c.province.as_str()).collect();
        set.into_iter().collect()
    }

    /// Cities of one province, sorted by name.
    #[must_use]
    pub fn cities_in_province(&self, province: &str) -> Vec<&City> {
        self.cities
            .values()
            .filter(|c| c.province == province)
            .collect()
    }

    /// Display position of a city.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<(i32, i32)> {
        self.positions.get(name).copied()
    }

    /// Gate names of a city.
    #[must_use]
    pub fn gates(&self, city: &str) -> Vec<&str> {
        self.gates
            .get(city)
            .map(|lines| lines.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// City reached through one gate.
    #[must_use]
    pub fn neighbor(&self, city: &str, gate: &str) -> Option<&str> {
        self.gates.get(city)?.get(gate).map(String::as_str)
    }

    /// Undirected neighbors of a city, in deterministic order.
    #[must_use]
    pub fn neighbors(&self, city: &str) -> &[String] {
        self.adjacency.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Shortest path by hop count, endpoints included.
    ///
    /// Returns `None` if either city is unknown or they are not connected.
    /// Equal-length paths resolve to the first one discovered.
    #[must_use]
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut prev: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        prev.insert(from, from);

        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                let next = next.as_str();
                if prev.contains_key(next) {
                    continue;
                }
                prev.insert(next, current);
                if next == to {
                    return Some(reconstruct_path(&prev, from, to));
                }
                queue.push_back(next);
            }
        }
        None
    }
}

fn link(adjacency: &mut BTreeMap<String, Vec<String>>, from: &str, to: &str) {
    if let Some(list) = adjacency.get_mut(from) {
        if !list.iter().any(|n| n == to) {
            list.push(to.to_string());
        }
    }
}

/// Walk predecessor links back from the goal.
fn reconstruct_path(prev: &HashMap<&str, &str>, from: &str, to: &str) -> Vec<String> {
    let mut path = vec![to.to_string()];
    let mut current = to;
    while current != from {
        current = prev[current];
        path.push(current.to_string());
    }
    path.reverse();
    path
}
