//! Depth-first traversal of routing maps.
//!
//! A walk succeeds when the flown city sequence can be matched node by node
//! through the map, honoring alternate chains, airline carrier constraints
//! and entry/exit tagging. The walker collects the matched city strings;
//! deciding what a failed walk means is the caller's business.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::graph::{LocTag, MapNode, RouteGraph};
use crate::traits::RoutingRepository;
use crate::travel::TravelPath;
use crate::types::{generic_city_matches, LocKind, INDUSTRY_CARRIER, SURFACE_CARRIER};

/// Default cap on collected route strings per walk.
pub const DEFAULT_ROUTE_STRING_CAP: usize = 20;

pub struct MapWalker<'a> {
    repo: &'a dyn RoutingRepository,
    route_string_cap: usize,
}

impl<'a> MapWalker<'a> {
    pub fn new(repo: &'a dyn RoutingRepository) -> Self {
        Self {
            repo,
            route_string_cap: DEFAULT_ROUTE_STRING_CAP,
        }
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.route_string_cap = cap;
        self
    }

    /// Walk the flown path through the map. Returns the matched city
    /// strings, empty when no traversal covers the whole path.
    pub fn walk_map(&self, graph: &RouteGraph, path: &TravelPath) -> Vec<String> {
        if !graph.has_map() || path.legs.is_empty() {
            return Vec::new();
        }
        let points = path.points();
        let mut routes = Vec::new();

        for start in self.start_nodes(graph, path, &points[0]) {
            let mut visited = FxHashSet::default();
            let mut trail = vec![points[0].to_string()];
            self.advance(
                graph,
                path,
                &points,
                start,
                0,
                &mut visited,
                &mut trail,
                &mut routes,
            );
            if routes.len() >= self.route_string_cap {
                break;
            }
        }
        routes.dedup();
        trace!(
            routing = %graph.routing_number,
            matches = routes.len(),
            "map walk finished"
        );
        routes
    }

    /// Nodes a traversal may begin on: every node matching the path origin,
    /// narrowed to Entry-tagged nodes when the map is entry/exit restricted.
    fn start_nodes<'g>(
        &self,
        graph: &'g RouteGraph,
        path: &TravelPath,
        origin: &str,
    ) -> Vec<&'g MapNode> {
        graph
            .nodes
            .iter()
            .filter(|n| n.kind != LocKind::Airline)
            .filter(|n| !graph.entry_exit_only || n.tag == LocTag::Entry)
            .filter(|n| self.loc_matches(graph, n, origin, path.nation_of(origin)))
            .collect()
    }

    /// Try to consume point `idx + 1` from map node `node` (matched to
    /// point `idx`). Records a route when the whole path is consumed.
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &self,
        graph: &RouteGraph,
        path: &TravelPath,
        points: &[&str],
        node: &MapNode,
        idx: usize,
        visited: &mut FxHashSet<(u16, usize)>,
        trail: &mut Vec<String>,
        routes: &mut Vec<String>,
    ) {
        if idx + 1 == points.len() {
            if !graph.entry_exit_only || node.tag == LocTag::Exit {
                routes.push(trail.join("-"));
            }
            return;
        }
        if routes.len() >= self.route_string_cap || !visited.insert((node.id, idx)) {
            return;
        }

        // The next point may match the next chain or continue sideways
        // into the current node's alternate chain.
        let mut candidates = self.alternates(graph, node.next);
        candidates.extend(self.alternates(graph, node.alternate));

        let leg = &path.legs[idx];
        for candidate in candidates {
            if candidate.kind == LocKind::Airline {
                // Airline nodes constrain the leg carrier without
                // consuming a city; the chain continues behind them.
                if !carrier_ok(&leg.carrier, &candidate.loc) {
                    continue;
                }
                for behind in self.alternates(graph, candidate.next) {
                    self.step_city(graph, path, points, behind, idx, visited, trail, routes);
                }
            } else {
                self.step_city(graph, path, points, candidate, idx, visited, trail, routes);
            }
        }
        visited.remove(&(node.id, idx));
    }

    #[allow(clippy::too_many_arguments)]
    fn step_city(
        &self,
        graph: &RouteGraph,
        path: &TravelPath,
        points: &[&str],
        candidate: &MapNode,
        idx: usize,
        visited: &mut FxHashSet<(u16, usize)>,
        trail: &mut Vec<String>,
        routes: &mut Vec<String>,
    ) {
        if candidate.kind == LocKind::Airline {
            return;
        }
        let next_point = points[idx + 1];
        if !self.loc_matches(graph, candidate, next_point, path.nation_of(next_point)) {
            return;
        }
        trail.push(next_point.to_string());
        self.advance(graph, path, points, candidate, idx + 1, visited, trail, routes);
        trail.pop();
    }

    /// A node plus its alternate-chain siblings. A zero id ends the chain.
    fn alternates<'g>(&self, graph: &'g RouteGraph, first: u16) -> Vec<&'g MapNode> {
        let mut out = Vec::new();
        let mut id = first;
        let mut seen = FxHashSet::default();
        while let Some(node) = graph.node(id) {
            if !seen.insert(node.id) {
                break;
            }
            out.push(node);
            id = node.alternate;
        }
        out
    }

    fn loc_matches(
        &self,
        graph: &RouteGraph,
        node: &MapNode,
        city: &str,
        nation: Option<&str>,
    ) -> bool {
        match node.kind {
            LocKind::City | LocKind::Blank => node.loc == city,
            LocKind::Nation | LocKind::StateProvince => nation == Some(node.loc.as_str()),
            LocKind::Zone => nation
                .map(|n| {
                    self.repo
                        .zone_nations(&graph.vendor, &node.loc)
                        .iter()
                        .any(|z| z == n)
                })
                .unwrap_or(false),
            LocKind::GenericCity => nation
                .map(|n| generic_city_matches(&node.loc, n))
                .unwrap_or(false),
            LocKind::Airline => false,
        }
    }
}

/// Carrier acceptance at an airline node: exact match, the industry
/// placeholder, or a surface sector.
fn carrier_ok(leg_carrier: &str, node_carrier: &str) -> bool {
    leg_carrier == node_carrier
        || leg_carrier == INDUSTRY_CARRIER
        || leg_carrier == SURFACE_CARRIER
        || node_carrier == INDUSTRY_CARRIER
}

/// Reverse a hyphen-joined route string, used for fares filed opposite to
/// the travel direction.
pub fn reverse_route_string(route: &str) -> String {
    route.rsplit('-').collect::<Vec<_>>().join("-")
}
