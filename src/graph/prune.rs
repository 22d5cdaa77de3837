//! Source-to-sink pruning.
//!
//! Keeps the union of all shortest target–sink paths (in the undirected
//! view of the network) that avoid every excluded structure, and removes
//! everything else.
//!
//! Paths are not enumerated one by one. A single BFS from the target gives
//! each node its distance; shortest paths are exactly the walks whose
//! distance drops by one at every step. A node lies on an accepted path of
//! a sink iff it is reachable from that sink along such steps through
//! non-excluded nodes and can itself reach the target the same way.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::NodeIndex;

use super::network::RetroGraph;

/// Undirected adjacency of a [`RetroGraph`], built once per pruning run.
#[derive(Debug, Clone)]
pub struct UndirectedView {
    position: HashMap<NodeIndex, usize>,
    ids: Vec<String>,
    adjacency: Vec<Vec<usize>>,
}

impl UndirectedView {
    pub fn new(graph: &RetroGraph) -> Self {
        let inner = graph.inner();
        let indices: Vec<NodeIndex> = inner.node_indices().collect();
        let position: HashMap<NodeIndex, usize> =
            indices.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();
        let adjacency = indices
            .iter()
            .map(|&idx| {
                let mut neighbors: Vec<usize> = inner
                    .neighbors_undirected(idx)
                    .filter_map(|n| position.get(&n).copied())
                    .collect();
                neighbors.sort_unstable();
                neighbors.dedup();
                neighbors
            })
            .collect();
        let ids = indices.iter().map(|&idx| inner[idx].id().to_string()).collect();
        Self {
            position,
            ids,
            adjacency,
        }
    }

    fn position_of(&self, graph: &RetroGraph, id: &str) -> Option<usize> {
        self.position.get(&graph.index(id)?).copied()
    }

    /// Hop distances from `source`; `None` for unreachable nodes.
    /// Also returns the nodes in visiting order (non-decreasing distance).
    fn bfs(&self, source: usize) -> (Vec<Option<usize>>, Vec<usize>) {
        let mut dist = vec![None; self.adjacency.len()];
        let mut order = Vec::with_capacity(self.adjacency.len());
        let mut queue = VecDeque::new();
        dist[source] = Some(0);
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            let next = dist[node].map_or(0, |d| d + 1);
            for &n in &self.adjacency[node] {
                if dist[n].is_none() {
                    dist[n] = Some(next);
                    queue.push_back(n);
                }
            }
        }
        (dist, order)
    }
}

/// Per-sink outcome of pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkPaths {
    pub sink: String,
    /// Length (in hops) of the shortest paths; `None` when disconnected.
    pub distance: Option<usize>,
    /// Number of shortest paths (saturating).
    pub paths: u64,
    /// Number of shortest paths avoiding excluded structures (saturating).
    pub accepted: u64,
}

/// Summary of a pruning run.
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub nodes_before: usize,
    pub nodes_kept: usize,
    pub sinks: Vec<SinkPaths>,
}

impl PruneReport {
    /// Sinks with at least one accepted path.
    pub fn connected_sinks(&self) -> usize {
        self.sinks.iter().filter(|s| s.accepted > 0).count()
    }
}

/// Prune `graph` down to the accepted target–sink paths.
///
/// `excluded` holds structural descriptors (InChI, InChIKey or SMILES);
/// any chemical carrying one of them is a forbidden intermediate. A missing
/// target, an excluded target, or the absence of sinks all yield an empty
/// graph.
pub fn prune(graph: &mut RetroGraph, target_id: &str, excluded: &[String]) -> PruneReport {
    let excluded: HashSet<String> = excluded.iter().cloned().collect();
    let nodes_before = graph.node_count();
    let view = UndirectedView::new(graph);

    let blocked: Vec<bool> = view
        .ids
        .iter()
        .map(|id| graph.node(id).is_some_and(|n| n.matches_any(&excluded)))
        .collect();
    let sinks = graph.sinks();

    tracing::info!(
        target_id,
        sinks = sinks.len(),
        excluded = blocked.iter().filter(|b| **b).count(),
        "pruning network"
    );

    let mut keep: HashSet<String> = HashSet::new();
    let mut report_sinks = Vec::with_capacity(sinks.len());

    match view.position_of(graph, target_id) {
        None => {
            tracing::warn!(target_id, "target not in network, result is empty");
            report_sinks.extend(sinks.into_iter().map(|sink| SinkPaths {
                sink,
                distance: None,
                paths: 0,
                accepted: 0,
            }));
        }
        Some(target) => {
            let (dist, order) = view.bfs(target);

            // Count shortest paths from each node down to the target, in total
            // and through non-excluded nodes only. `order` is non-decreasing
            // in distance, so predecessors are settled first.
            let mut total = vec![0u64; dist.len()];
            let mut clean = vec![0u64; dist.len()];
            for &node in &order {
                if node == target {
                    total[node] = 1;
                    clean[node] = u64::from(!blocked[node]);
                    continue;
                }
                let Some(d) = dist[node] else { continue };
                for &n in &view.adjacency[node] {
                    if dist[n] == Some(d - 1) {
                        total[node] = total[node].saturating_add(total[n]);
                        if !blocked[node] {
                            clean[node] = clean[node].saturating_add(clean[n]);
                        }
                    }
                }
            }

            for sink in sinks {
                let Some(start) = view.position_of(graph, &sink) else {
                    continue;
                };
                let outcome = SinkPaths {
                    sink: sink.clone(),
                    distance: dist[start],
                    paths: total[start],
                    accepted: clean[start],
                };
                match outcome.distance {
                    None => tracing::debug!(sink = %sink, "no path to target"),
                    Some(distance) => tracing::debug!(
                        sink = %sink,
                        distance,
                        paths = outcome.paths,
                        accepted = outcome.accepted,
                        "shortest paths to target"
                    ),
                }
                if outcome.accepted > 0 {
                    collect_accepted(&view, &dist, &clean, start, &mut keep);
                }
                report_sinks.push(outcome);
            }
        }
    }

    graph.retain_nodes(&keep);
    let report = PruneReport {
        nodes_before,
        nodes_kept: graph.node_count(),
        sinks: report_sinks,
    };
    tracing::info!(
        nodes_before = report.nodes_before,
        nodes_kept = report.nodes_kept,
        connected_sinks = report.connected_sinks(),
        "pruned network"
    );
    report
}

/// Walk from `start` towards the target along distance-decreasing steps,
/// visiting only nodes with at least one clean path, and keep them all.
fn collect_accepted(
    view: &UndirectedView,
    dist: &[Option<usize>],
    clean: &[u64],
    start: usize,
    keep: &mut HashSet<String>,
) {
    let mut seen = vec![false; dist.len()];
    let mut stack = vec![start];
    seen[start] = true;
    while let Some(node) = stack.pop() {
        keep.insert(view.ids[node].clone());
        let Some(d) = dist[node] else { continue };
        if d == 0 {
            continue;
        }
        for &n in &view.adjacency[node] {
            if !seen[n] && dist[n] == Some(d - 1) && clean[n] > 0 {
                seen[n] = true;
                stack.push(n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EDGE_SEPARATOR, NodeData};
    use crate::reaction::{RawReaction, Transformation};
    use crate::registry::StructureRegistry;

    /// Build a network from forward reactions; `targets` are promoted,
    /// `sinks` flagged.
    fn network(
        reactions: &[(&str, &str)],
        targets: &[&str],
        sinks: &[&str],
    ) -> (StructureRegistry, RetroGraph) {
        let mut reg = StructureRegistry::new();
        for (_, smiles) in reactions {
            let (l, r) = smiles.split_once(">>").unwrap();
            for s in l.split('.').chain(r.split('.')) {
                reg.get_or_create(s);
            }
        }
        for t in targets {
            reg.promote_to_target(t);
        }
        for s in sinks {
            let uid = reg.lookup(s).unwrap().to_string();
            reg.mark_sink(&uid);
        }
        let ts: Vec<Transformation> = reactions
            .iter()
            .map(|(id, smiles)| {
                let raw = RawReaction {
                    id: id.to_string(),
                    smiles: smiles.to_string(),
                    ..Default::default()
                };
                Transformation::new(raw, &reg, false).unwrap()
            })
            .collect();
        let g = RetroGraph::build(&reg, &ts, EDGE_SEPARATOR).unwrap();
        (reg, g)
    }

    fn kept(g: &RetroGraph) -> Vec<String> {
        let mut ids: Vec<String> = g.nodes().map(|n| n.id().to_string()).collect();
        ids.sort();
        ids
    }

    fn uid(reg: &StructureRegistry, smiles: &str) -> String {
        reg.lookup(smiles).unwrap().to_string()
    }

    #[test]
    fn excluded_node_blocks_its_sink_only() {
        // S1 -> R1 -> X -> R2 -> T, and S2 -> R3 -> T
        let (reg, mut g) = network(
            &[("R1", "S1>>X"), ("R2", "X>>T"), ("R3", "S2>>T")],
            &["T"],
            &["S1", "S2"],
        );
        let report = prune(&mut g, "TARGET_0000000001", &["X".to_string()]);
        assert_eq!(
            kept(&g),
            vec![
                uid(&reg, "S2"),
                "R3".to_string(),
                "TARGET_0000000001".to_string(),
            ]
        );
        assert_eq!(report.connected_sinks(), 1);
        assert_eq!(report.nodes_before, 7);
    }

    #[test]
    fn unreachable_sink_is_skipped() {
        let (reg, mut g) = network(&[("R1", "S1>>T"), ("R2", "S2>>Q")], &["T"], &["S1", "S2"]);
        let report = prune(&mut g, "TARGET_0000000001", &[]);
        assert_eq!(
            kept(&g),
            vec![
                uid(&reg, "S1"),
                "R1".to_string(),
                "TARGET_0000000001".to_string(),
            ]
        );
        let s2 = report.sinks.iter().find(|s| s.sink == uid(&reg, "S2")).unwrap();
        assert_eq!(s2.distance, None);
    }

    #[test]
    fn all_tied_shortest_paths_are_considered() {
        // Two equally short routes from S to T; only the one via X is excluded.
        let (reg, mut g) = network(
            &[("R1", "S>>X"), ("R2", "X>>T"), ("R3", "S>>Y"), ("R4", "Y>>T")],
            &["T"],
            &["S"],
        );
        let report = prune(&mut g, "TARGET_0000000001", &["X".to_string()]);
        let mut expected = vec![
            uid(&reg, "S"),
            uid(&reg, "Y"),
            "R3".to_string(),
            "R4".to_string(),
            "TARGET_0000000001".to_string(),
        ];
        expected.sort();
        assert_eq!(kept(&g), expected);
        assert_eq!(report.sinks[0].paths, 2);
        assert_eq!(report.sinks[0].accepted, 1);
    }

    #[test]
    fn longer_detours_are_not_kept() {
        // Direct route S -> R1 -> T, plus a longer route via M.
        let (reg, mut g) = network(
            &[("R1", "S>>T"), ("R2", "S>>M"), ("R3", "M>>N"), ("R4", "N>>T")],
            &["T"],
            &["S"],
        );
        prune(&mut g, "TARGET_0000000001", &[]);
        assert_eq!(
            kept(&g),
            vec![
                uid(&reg, "S"),
                "R1".to_string(),
                "TARGET_0000000001".to_string(),
            ]
        );
    }

    #[test]
    fn excluded_shortest_path_is_not_replaced_by_longer_one() {
        // Shortest route goes through X; the longer clean detour is not used.
        let (_, mut g) = network(
            &[
                ("R1", "S>>X"),
                ("R2", "X>>T"),
                ("R3", "S>>M"),
                ("R4", "M>>N"),
                ("R5", "N>>T"),
            ],
            &["T"],
            &["S"],
        );
        prune(&mut g, "TARGET_0000000001", &["X".to_string()]);
        assert!(g.is_empty());
    }

    #[test]
    fn excluded_target_empties_the_graph() {
        let (_, mut g) = network(&[("R1", "S>>T")], &["T"], &["S"]);
        prune(&mut g, "TARGET_0000000001", &["T".to_string()]);
        assert!(g.is_empty());
    }

    #[test]
    fn missing_target_empties_the_graph() {
        let (_, mut g) = network(&[("R1", "S>>T")], &[], &["S"]);
        let report = prune(&mut g, "TARGET_0000000001", &[]);
        assert!(g.is_empty());
        assert_eq!(report.connected_sinks(), 0);
    }

    #[test]
    fn edges_survive_between_kept_nodes() {
        let (_, mut g) = network(&[("R1", "S.W>>T")], &["T"], &["S"]);
        prune(&mut g, "TARGET_0000000001", &[]);
        // W is not on the S–T path and goes away with its edge.
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert!(g.nodes().all(|n| !matches!(n, NodeData::Chemical(c) if c.smiles == "W")));
    }
}
