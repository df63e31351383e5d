//! Dependency graph analysis.

use crate::registry::{DependencyRegistry, NodeRegistry};
use rats_core::error::{RatsError, Result};
use rats_core::types::{Node, PipelineNode};
use std::collections::{HashMap, HashSet, VecDeque};

/// Read-only view of a pipeline's nodes and prerequisites.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N: PipelineNode = Node> {
    /// Nodes in registration order.
    nodes: Vec<N>,
    /// Prerequisites per node.
    dependencies: HashMap<N, HashSet<N>>,
}

impl<N: PipelineNode> DependencyGraph<N> {
    /// Capture the current contents of the registries.
    pub fn from_registries(nodes: &NodeRegistry<N>, dependencies: &DependencyRegistry<N>) -> Self {
        let nodes = nodes.get_nodes();
        let dependencies = nodes
            .iter()
            .map(|node| (node.clone(), dependencies.get_dependencies(node)))
            .collect();
        Self {
            nodes,
            dependencies,
        }
    }

    /// Nodes in registration order.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Prerequisites of `node`.
    pub fn dependencies(&self, node: &N) -> Option<&HashSet<N>> {
        self.dependencies.get(node)
    }

    /// Check that every prerequisite is registered and that there are no cycles.
    pub fn validate(&self) -> Result<()> {
        let known: HashSet<&N> = self.nodes.iter().collect();
        for node in &self.nodes {
            let mut missing: Vec<&N> = self.dependencies[node]
                .iter()
                .filter(|dep| !known.contains(dep))
                .collect();
            missing.sort_by(|a, b| a.key().cmp(b.key()));
            if let Some(dependency) = missing.first() {
                return Err(RatsError::UnknownDependency {
                    key: node.key().to_string(),
                    dependency: dependency.key().to_string(),
                });
            }
        }

        self.topological_order()?;
        Ok(())
    }

    /// Order nodes so that every node follows its prerequisites (Kahn's algorithm).
    ///
    /// Ties are broken by registration order. Prerequisites that are not
    /// registered are ignored here; [`DependencyGraph::validate`] reports them.
    pub fn topological_order(&self) -> Result<Vec<N>> {
        let mut in_degree: HashMap<&N, usize> = HashMap::new();
        let mut dependents: HashMap<&N, Vec<&N>> = HashMap::new();
        for node in &self.nodes {
            let deps = &self.dependencies[node];
            let registered = deps.iter().filter(|d| self.dependencies.contains_key(*d));
            in_degree.insert(node, registered.clone().count());
            for dep in registered {
                dependents.entry(dep).or_default().push(node);
            }
        }

        let mut queue: VecDeque<&N> = self
            .nodes
            .iter()
            .filter(|node| in_degree[node] == 0)
            .collect();
        let mut sorted = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            sorted.push(node.clone());

            let Some(downstream) = dependents.get(node) else {
                continue;
            };
            let mut ready: Vec<&N> = Vec::new();
            for &dependent in downstream {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(dependent);
                    }
                }
            }
            ready.sort_by_key(|n| self.position(n));
            queue.extend(ready);
        }

        if sorted.len() != self.nodes.len() {
            let done: HashSet<&N> = sorted.iter().collect();
            let cyclic = self
                .nodes
                .iter()
                .filter(|node| !done.contains(node))
                .map(|node| node.key().to_string())
                .collect();
            return Err(RatsError::UncontrolledCycle { nodes: cyclic });
        }

        Ok(sorted)
    }

    /// Length of the longest prerequisite chain, counted in nodes.
    pub fn depth(&self) -> Result<usize> {
        let order = self.topological_order()?;
        let mut level: HashMap<&N, usize> = HashMap::new();
        for node in &order {
            let own = self.dependencies[node]
                .iter()
                .filter_map(|dep| level.get(dep))
                .max()
                .map_or(1, |deepest| deepest + 1);
            level.insert(node, own);
        }
        Ok(level.values().copied().max().unwrap_or(0))
    }

    fn position(&self, node: &N) -> usize {
        self.nodes
            .iter()
            .position(|n| n == node)
            .unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let nodes = NodeRegistry::new();
        let dependencies = DependencyRegistry::new();
        for (key, deps) in edges {
            nodes.register(Node::new(*key)).unwrap();
            if !deps.is_empty() {
                dependencies
                    .register_dependencies(&Node::new(*key), deps.iter().map(|d| Node::new(*d)))
                    .unwrap();
            }
        }
        DependencyGraph::from_registries(&nodes, &dependencies)
    }

    fn keys(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.key()).collect()
    }

    #[test]
    fn linear_graph_topo_sort() {
        let graph = graph(&[("c", &["b"]), ("b", &["a"]), ("a", &[])]);
        assert_eq!(keys(&graph.topological_order().unwrap()), vec!["a", "b", "c"]);
        assert_eq!(graph.depth().unwrap(), 3);
    }

    #[test]
    fn diamond_graph_topo_sort() {
        let graph = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        let sorted = graph.topological_order().unwrap();
        assert_eq!(keys(&sorted), vec!["a", "b", "c", "d"]);
        assert_eq!(graph.depth().unwrap(), 3);
        graph.validate().unwrap();
    }

    #[test]
    fn cycle_detected() {
        let graph = graph(&[("a", &[]), ("b", &["a", "c"]), ("c", &["b"])]);
        let err = graph.validate().unwrap_err();
        match err {
            RatsError::UncontrolledCycle { nodes } => assert_eq!(nodes, vec!["b", "c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_dependency_detected() {
        let graph = graph(&[("a", &[]), ("b", &["ghost"])]);
        let err = graph.validate().unwrap_err();
        assert!(matches!(
            err,
            RatsError::UnknownDependency { ref key, ref dependency } if key == "b" && dependency == "ghost"
        ));
    }

    #[test]
    fn empty_graph() {
        let graph = graph(&[]);
        assert!(graph.topological_order().unwrap().is_empty());
        assert_eq!(graph.depth().unwrap(), 0);
    }
}
