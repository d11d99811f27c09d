use autocore::{NodeId, StoreError, WorkflowConnection, WorkflowId, WorkflowNode, WorkflowStore};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet};

/// In-memory adjacency view of a workflow, materialized once per execution.
///
/// Edges are kept in ascending priority order, ties in insertion order.
/// Edges touching a soft-deleted node are dropped.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: HashMap<NodeId, WorkflowNode>,
    start: Vec<WorkflowConnection>,
    outgoing: HashMap<NodeId, Vec<WorkflowConnection>>,
}

impl WorkflowGraph {
    pub async fn load(
        store: &dyn WorkflowStore,
        workflow_id: WorkflowId,
    ) -> Result<Self, StoreError> {
        let nodes = store.list_nodes(workflow_id, true).await?;
        let connections = store.list_connections(workflow_id).await?;
        Ok(Self::from_parts(nodes, connections))
    }

    pub fn from_parts(nodes: Vec<WorkflowNode>, connections: Vec<WorkflowConnection>) -> Self {
        let tombstoned: HashSet<NodeId> =
            nodes.iter().filter(|n| n.deleted).map(|n| n.id).collect();
        let nodes: HashMap<NodeId, WorkflowNode> = nodes
            .into_iter()
            .filter(|n| !n.deleted)
            .map(|n| (n.id, n))
            .collect();

        let mut connections: Vec<WorkflowConnection> = connections
            .into_iter()
            .filter(|c| {
                let dead = tombstoned.contains(&c.to_node)
                    || c.from_node.is_some_and(|from| tombstoned.contains(&from));
                if dead {
                    tracing::debug!("Dropping connection {} to deleted node", c.id);
                }
                !dead
            })
            .collect();
        connections.sort_by_key(|c| c.priority);

        let mut start = Vec::new();
        let mut outgoing: HashMap<NodeId, Vec<WorkflowConnection>> = HashMap::new();
        for conn in connections {
            match conn.from_node {
                None => start.push(conn),
                Some(from) => outgoing.entry(from).or_default().push(conn),
            }
        }

        Self {
            nodes,
            start,
            outgoing,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&WorkflowNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values()
    }

    pub fn start_edges(&self) -> &[WorkflowConnection] {
        &self.start
    }

    pub fn outgoing(&self, id: NodeId) -> &[WorkflowConnection] {
        self.outgoing.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A node that sits on a cycle, if the graph has one.
    pub fn find_cycle(&self) -> Option<NodeId> {
        let (graph, _, _) = self.to_petgraph();
        tarjan_scc(&graph).into_iter().find_map(|component| {
            let first = *component.first()?;
            let cyclic = component.len() > 1 || graph.contains_edge(first, first);
            if cyclic {
                graph[first]
            } else {
                None
            }
        })
    }

    /// Non-trigger nodes no start edge can reach.
    pub fn unreachable_nodes(&self) -> Vec<NodeId> {
        let (graph, root, index) = self.to_petgraph();
        let mut reached = HashSet::new();
        let mut bfs = Bfs::new(&graph, root);
        while let Some(idx) = bfs.next(&graph) {
            if let Some(id) = graph[idx] {
                reached.insert(id);
            }
        }
        let mut unreachable: Vec<NodeId> = index
            .keys()
            .filter(|id| !reached.contains(*id))
            .filter(|id| {
                self.nodes
                    .get(*id)
                    .is_some_and(|n| n.node_type != autocore::NodeType::Trigger)
            })
            .copied()
            .collect();
        unreachable.sort();
        unreachable
    }

    /// Petgraph view with a synthetic root (weight `None`) for the implicit
    /// trigger.
    fn to_petgraph(&self) -> (DiGraph<Option<NodeId>, ()>, NodeIndex, HashMap<NodeId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let root = graph.add_node(None);
        let mut index = HashMap::new();
        for id in self.nodes.keys() {
            index.insert(*id, graph.add_node(Some(*id)));
        }
        for conn in &self.start {
            if let Some(&to) = index.get(&conn.to_node) {
                graph.add_edge(root, to, ());
            }
        }
        for (from, conns) in &self.outgoing {
            let Some(&from_idx) = index.get(from) else {
                continue;
            };
            for conn in conns {
                if let Some(&to) = index.get(&conn.to_node) {
                    graph.add_edge(from_idx, to, ());
                }
            }
        }
        (graph, root, index)
    }
}
