//! Path probe: the march a siege participant would take.

use std::fmt;

use slg_core::error::GameError;
use slg_core::map::MapGraph;
use slg_core::tables::SiegeBalance;

use crate::Result;

/// A route between two cities with its march time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Cities from origin to destination, both included.
    pub path: Vec<String>,
    /// Minutes on the road.
    pub minutes: i64,
}

impl Route {
    /// Number of edges walked.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} hop(s), {} min)",
            self.path.join(" -> "),
            self.hops(),
            self.minutes
        )
    }
}

/// Shortest route from `from` to `to`.
///
/// # Errors
///
/// Unknown city on either end, or no connection between them.
pub fn route(map: &MapGraph, siege: &SiegeBalance, from: &str, to: &str) -> Result<Route> {
    for city in [from, to] {
        if !map.contains(city) {
            return Err(GameError::UnknownCity(city.to_string()).into());
        }
    }
    let path = map.shortest_path(from, to).ok_or_else(|| GameError::NoPath {
        from: from.to_string(),
        to: to.to_string(),
    })?;
    let hops = i64::try_from(path.len().saturating_sub(1)).unwrap_or(i64::MAX);
    Ok(Route {
        path,
        minutes: hops.saturating_mul(siege.edge_minutes),
    })
}

#[cfg(test)]
mod tests {
    use slg_test_utils::fixtures::sample_map;

    use super::*;
    use crate::ToolError;

    #[test]
    fn test_route_across_the_map() {
        let route = route(&sample_map(), &SiegeBalance::default(), "成都", "洛阳").unwrap();
        assert_eq!(route.hops(), 3);
        assert_eq!(route.minutes, 15);
        assert_eq!(route.to_string(), "成都 -> 汉中 -> 长安 -> 洛阳 (3 hop(s), 15 min)");
    }

    #[test]
    fn test_same_city_is_zero_hops() {
        let route = route(&sample_map(), &SiegeBalance::default(), "洛阳", "洛阳").unwrap();
        assert_eq!(route.hops(), 0);
        assert_eq!(route.minutes, 0);
    }

    #[test]
    fn test_unreachable_and_unknown() {
        let map = sample_map();
        let siege = SiegeBalance::default();
        assert!(matches!(
            route(&map, &siege, "成都", "夷州"),
            Err(ToolError::Game(GameError::NoPath { .. }))
        ));
        assert!(matches!(
            route(&map, &siege, "许昌", "成都"),
            Err(ToolError::Game(GameError::UnknownCity(_)))
        ));
    }
}
