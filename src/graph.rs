//! Flow graph construction and traversal.
//!
//! A [`FlowGraph`] is built from a stored [`FlowModel`] and validated
//! once: unknown edge endpoints, duplicate node ids, and malformed
//! branch sets are rejected at build time so traversal never has to
//! re-check them. The graph is rebuilt from the store on every hop,
//! which makes editor changes visible to in-flight runs.

use std::collections::HashMap;

use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::warn;

use crate::{
    DripflowError, Result,
    model::{Action, ActionId, BooleanBranch, EdgeKind, EdgeModel, FlowModel},
    store::StoreSession,
};

/// Node payload: the synthetic entry node or one action step.
#[derive(Debug, Clone)]
enum GraphNode {
    Entry,
    Step(Action),
}

/// Classified outgoing edge set of one node, computed at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// No outgoing edges; the run completes after this node.
    Terminal,
    /// Exactly one simple edge.
    Simple(ActionId),
    /// Exactly two boolean edges with complementary branches.
    Boolean {
        on_true: ActionId,
        on_false: ActionId,
    },
}

/// Validated, indexed form of one flow definition.
#[derive(Debug)]
pub struct FlowGraph {
    graph: DiGraph<GraphNode, EdgeModel>,
    index: HashMap<String, NodeIndex>,
    outgoing: HashMap<String, Outgoing>,
    entry_id: String,
}

impl FlowGraph {
    /// Build and validate the graph for a flow definition.
    pub fn build(model: &FlowModel) -> Result<Self> {
        if model.trigger_node_id.is_empty() {
            return Err(DripflowError::Validation(format!("flow {} has no trigger node", model.id)));
        }

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        let entry = graph.add_node(GraphNode::Entry);
        index.insert(model.trigger_node_id.clone(), entry);

        for action in model.actions.iter() {
            if index.contains_key(&action.id) {
                return Err(DripflowError::Validation(format!("duplicate node id {} in flow {}", action.id, model.id)));
            }
            let node = graph.add_node(GraphNode::Step(action.clone()));
            index.insert(action.id.clone(), node);
        }

        for edge in model.edges.iter() {
            let source = *index
                .get(&edge.source)
                .ok_or_else(|| DripflowError::Validation(format!("edge {} references unknown source {}", edge.id, edge.source)))?;
            let target = *index
                .get(&edge.target)
                .ok_or_else(|| DripflowError::Validation(format!("edge {} references unknown target {}", edge.id, edge.target)))?;
            graph.add_edge(source, target, edge.clone());
        }

        let mut outgoing = HashMap::new();
        for (id, node) in index.iter() {
            outgoing.insert(id.clone(), Self::classify(&graph, id, *node)?);
        }

        Ok(Self {
            graph,
            index,
            outgoing,
            entry_id: model.trigger_node_id.clone(),
        })
    }

    /// Classify one node's outgoing edge set, enforcing the edge-shape
    /// invariant.
    fn classify(
        graph: &DiGraph<GraphNode, EdgeModel>,
        id: &str,
        node: NodeIndex,
    ) -> Result<Outgoing> {
        let edges: Vec<&EdgeModel> = graph.edges(node).map(|e| e.weight()).collect();

        match edges.as_slice() {
            [] => Ok(Outgoing::Terminal),
            [edge] => {
                if edge.kind != EdgeKind::Simple {
                    return Err(DripflowError::Validation(format!("node {} has a single {} edge; expected simple", id, edge.kind.as_ref())));
                }
                Ok(Outgoing::Simple(edge.target.clone()))
            }
            [first, second] => {
                if first.kind != EdgeKind::Boolean || second.kind != EdgeKind::Boolean {
                    return Err(DripflowError::Validation(format!("node {} has two outgoing edges but not a boolean pair", id)));
                }
                match (first.branch, second.branch) {
                    (Some(BooleanBranch::True), Some(BooleanBranch::False)) => Ok(Outgoing::Boolean {
                        on_true: first.target.clone(),
                        on_false: second.target.clone(),
                    }),
                    (Some(BooleanBranch::False), Some(BooleanBranch::True)) => Ok(Outgoing::Boolean {
                        on_true: second.target.clone(),
                        on_false: first.target.clone(),
                    }),
                    _ => Err(DripflowError::Validation(format!("node {} boolean edges do not form a true/false pair", id))),
                }
            }
            edges => Err(DripflowError::Validation(format!("node {} has {} outgoing edges; at most 2 are supported", id, edges.len()))),
        }
    }

    /// Id of the synthetic trigger node.
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Look up an action node by id.
    pub fn action(
        &self,
        id: &str,
    ) -> Option<&Action> {
        let node = self.index.get(id)?;
        match &self.graph[*node] {
            GraphNode::Step(action) => Some(action),
            GraphNode::Entry => None,
        }
    }

    /// First action of the flow: the target of the entry node's simple
    /// edge. `None` when the flow has no steps attached yet.
    pub fn first_action(&self) -> Result<Option<&Action>> {
        match self.outgoing(&self.entry_id)? {
            Outgoing::Terminal => Ok(None),
            Outgoing::Simple(target) => Ok(self.action(target)),
            Outgoing::Boolean {
                ..
            } => Err(DripflowError::Validation(format!("trigger node {} cannot branch", self.entry_id))),
        }
    }

    fn outgoing(
        &self,
        id: &str,
    ) -> Result<&Outgoing> {
        self.outgoing.get(id).ok_or_else(|| DripflowError::Validation(format!("unknown node id {}", id)))
    }

    /// Resolve the node to execute after `current`.
    ///
    /// `branch` is `Some` only when the current node produced a boolean
    /// verdict; mismatches between the verdict and the node's outgoing
    /// edge shape are validation errors.
    pub fn next(
        &self,
        current: &str,
        branch: Option<bool>,
    ) -> Result<Option<&Action>> {
        match (self.outgoing(current)?, branch) {
            (Outgoing::Terminal, _) => Ok(None),
            (Outgoing::Simple(target), None) => Ok(self.action(target)),
            (Outgoing::Simple(_), Some(_)) => {
                Err(DripflowError::Validation(format!("node {} produced a branch verdict but has a simple edge", current)))
            }
            (
                Outgoing::Boolean {
                    on_true,
                    on_false,
                },
                Some(verdict),
            ) => {
                let target = if verdict { on_true } else { on_false };
                Ok(self.action(target))
            }
            (
                Outgoing::Boolean {
                    ..
                },
                None,
            ) => Err(DripflowError::Validation(format!("node {} has boolean edges but produced no verdict", current))),
        }
    }
}

/// Load a flow's current definition and build its graph.
///
/// Called once per hop; a run resumed after a long wait picks up the
/// latest saved version of the flow.
pub fn load_graph(
    session: &StoreSession,
    flow_id: &str,
) -> Result<FlowGraph> {
    let row = session.flows().find(flow_id)?;
    let model = FlowModel::from_json(&row.data)?;
    FlowGraph::build(&model)
}

/// Resolve the action after `current` against the stored flow.
pub fn resolve_next(
    session: &StoreSession,
    flow_id: &str,
    current: &str,
    branch: Option<bool>,
) -> Result<Option<Action>> {
    let graph = load_graph(session, flow_id)?;
    match graph.next(current, branch) {
        Ok(next) => Ok(next.cloned()),
        Err(err) => {
            warn!("flow {} resolve from {} failed: {}", flow_id, current, err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::ActionKind;

    fn action(
        id: &str,
        kind: ActionKind,
    ) -> Action {
        Action {
            id: id.to_string(),
            flow_id: "f1".to_string(),
            enabled: true,
            kind,
        }
    }

    fn edge(
        id: &str,
        source: &str,
        target: &str,
    ) -> EdgeModel {
        EdgeModel {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::Simple,
            branch: None,
        }
    }

    fn boolean_edge(
        id: &str,
        source: &str,
        target: &str,
        branch: BooleanBranch,
    ) -> EdgeModel {
        EdgeModel {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            kind: EdgeKind::Boolean,
            branch: Some(branch),
        }
    }

    fn flow(
        actions: Vec<Action>,
        edges: Vec<EdgeModel>,
    ) -> FlowModel {
        FlowModel {
            id: "f1".to_string(),
            workspace_id: "w1".to_string(),
            name: "test".to_string(),
            enabled: true,
            paused: false,
            trigger_node_id: "t1".to_string(),
            actions,
            edges,
        }
    }

    #[test]
    fn test_linear_flow_traversal() {
        let model = flow(
            vec![
                action("a1", ActionKind::Wait {
                    duration: 1,
                    unit: Default::default(),
                }),
                action("a2", ActionKind::Empty),
            ],
            vec![edge("e1", "t1", "a1"), edge("e2", "a1", "a2")],
        );
        let graph = FlowGraph::build(&model).unwrap();

        assert_eq!(graph.first_action().unwrap().unwrap().id, "a1");
        assert_eq!(graph.next("a1", None).unwrap().unwrap().id, "a2");
        assert!(graph.next("a2", None).unwrap().is_none());
    }

    #[test]
    fn test_boolean_pair_resolution() {
        let model = flow(
            vec![
                action("a1", ActionKind::BooleanTest {
                    condition: None,
                }),
                action("a2", ActionKind::Empty),
                action("a3", ActionKind::Empty),
            ],
            vec![
                edge("e1", "t1", "a1"),
                boolean_edge("e2", "a1", "a2", BooleanBranch::False),
                boolean_edge("e3", "a1", "a3", BooleanBranch::True),
            ],
        );
        let graph = FlowGraph::build(&model).unwrap();

        assert_eq!(graph.next("a1", Some(true)).unwrap().unwrap().id, "a3");
        assert_eq!(graph.next("a1", Some(false)).unwrap().unwrap().id, "a2");
        // a verdict is required when the node branches
        assert!(graph.next("a1", None).is_err());
    }

    #[test]
    fn test_unknown_edge_endpoint_rejected() {
        let model = flow(vec![action("a1", ActionKind::Empty)], vec![edge("e1", "t1", "missing")]);
        let err = FlowGraph::build(&model).unwrap_err();
        assert!(matches!(err, DripflowError::Validation(_)));
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let model = flow(vec![action("a1", ActionKind::Empty), action("a1", ActionKind::Empty)], vec![]);
        assert!(FlowGraph::build(&model).is_err());
    }

    #[test]
    fn test_incomplete_boolean_pair_rejected() {
        let model = flow(
            vec![action("a1", ActionKind::BooleanTest {
                condition: None,
            }), action("a2", ActionKind::Empty), action("a3", ActionKind::Empty)],
            vec![
                edge("e1", "t1", "a1"),
                boolean_edge("e2", "a1", "a2", BooleanBranch::True),
                boolean_edge("e3", "a1", "a3", BooleanBranch::True),
            ],
        );
        assert!(FlowGraph::build(&model).is_err());
    }

    #[test]
    fn test_cycles_are_allowed_at_build_time() {
        // re-engagement loops are legal; the interpreter bounds hops
        let model = flow(
            vec![
                action("a1", ActionKind::Wait {
                    duration: 7,
                    unit: Default::default(),
                }),
                action("a2", ActionKind::SendEmail {
                    template_id: "tpl1".to_string(),
                }),
            ],
            vec![edge("e1", "t1", "a1"), edge("e2", "a1", "a2"), edge("e3", "a2", "a1")],
        );
        let graph = FlowGraph::build(&model).unwrap();
        assert_eq!(graph.next("a2", None).unwrap().unwrap().id, "a1");
    }
}
