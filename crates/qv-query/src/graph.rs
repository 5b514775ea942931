//! Join dependency graph
//!
//! Nodes are binding indices (root included). An edge runs from a join to
//! every other binding its ON-expression references, so everything a live
//! join needs is reachable from it.

use crate::ir::expr::BindingIndex;
use crate::ir::query::QueryIR;
use crate::walk::walk_binding_refs;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Dependency graph between the bindings of one query
#[derive(Debug)]
pub struct JoinDependencyGraph {
    graph: DiGraph<BindingIndex, ()>,
    node_map: HashMap<BindingIndex, NodeIndex>,
}

impl JoinDependencyGraph {
    /// Build the graph for `query`.
    ///
    /// References to bindings that are not part of the query (left behind
    /// by a permissive removal) add no edge.
    pub fn build(query: &QueryIR) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for binding in query.bindings() {
            let idx = graph.add_node(binding.index);
            node_map.insert(binding.index, idx);
        }

        for join in query.joins() {
            let Some(&from) = node_map.get(&join.index) else {
                continue;
            };
            walk_binding_refs(&join.on, &mut |target| {
                if target == join.index {
                    return;
                }
                if let Some(&to) = node_map.get(&target) {
                    graph.update_edge(from, to, ());
                }
            });
        }

        Self { graph, node_map }
    }

    /// Whether `index` is a binding of the query
    pub fn contains(&self, index: BindingIndex) -> bool {
        self.node_map.contains_key(&index)
    }

    /// Bindings referenced by the ON-expression of `index`
    pub fn dependencies(&self, index: BindingIndex) -> Vec<BindingIndex> {
        self.neighbors(index, Direction::Outgoing)
    }

    /// Joins whose ON-expression references `index`
    pub fn dependents(&self, index: BindingIndex) -> Vec<BindingIndex> {
        self.neighbors(index, Direction::Incoming)
    }

    fn neighbors(&self, index: BindingIndex, direction: Direction) -> Vec<BindingIndex> {
        let Some(&idx) = self.node_map.get(&index) else {
            return Vec::new();
        };
        let mut out: Vec<BindingIndex> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }

    /// Every binding reachable from `seeds`, seeds included.
    ///
    /// Work-list traversal: each binding is dequeued once and each edge
    /// followed once. Seeds that are not bindings of the query are ignored.
    pub fn reachable_from(
        &self,
        seeds: impl IntoIterator<Item = BindingIndex>,
    ) -> BTreeSet<BindingIndex> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        for seed in seeds {
            if let Some(&idx) = self.node_map.get(&seed) {
                if visited.insert(idx) {
                    queue.push_back(idx);
                }
            }
        }

        while let Some(idx) = queue.pop_front() {
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited.into_iter().map(|idx| self.graph[idx]).collect()
    }
}
