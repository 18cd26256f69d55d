//! Pipeline graph: an arena of raw-source and step nodes.
//!
//! Node ids are arena indices, handed out monotonically and never reused.
//! A step's inputs (its in-edges) are stored on the step in the order the
//! caller supplied them; successor sets are kept in a parallel vector so
//! the topological walk never has to scan the whole arena.
//!
//! Every mutation either succeeds with the graph still acyclic and every
//! step carrying exactly `required_arity` inputs, or fails and leaves the
//! graph untouched.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::id::NodeId;
use crate::kind::TransformKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    RawSource {
        locator: String,
        columns: Vec<String>,
    },
    Step {
        transform: TransformKind,
        inputs: Vec<NodeId>,
        reference_columns: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    /// Direct producers, in caller-supplied order. Empty for raw sources.
    pub fn inputs(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::RawSource { .. } => &[],
            NodeKind::Step { inputs, .. } => inputs,
        }
    }

    pub fn transform(&self) -> Option<TransformKind> {
        match &self.kind {
            NodeKind::RawSource { .. } => None,
            NodeKind::Step { transform, .. } => Some(*transform),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, NodeKind::RawSource { .. })
    }
}

/// Directed dependency: `from`'s dataset is input number `slot` of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub slot: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    #[serde(skip)]
    successors: Vec<BTreeSet<NodeId>>,
    #[serde(skip)]
    raw_count: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a raw source. Locators are unique across the graph and
    /// every source declares at least one column.
    pub fn add_raw_node(
        &mut self,
        locator: impl Into<String>,
        columns: Vec<String>,
    ) -> Result<NodeId> {
        let locator = locator.into();
        if self.find_source(&locator).is_some() {
            return Err(Error::DuplicateSource(locator));
        }
        if columns.is_empty() {
            return Err(Error::Schema(format!("source '{}' declares no columns", locator)));
        }
        self.raw_count += 1;
        let label = format!("Raw data file {}", self.raw_count);
        Ok(self.push(label, NodeKind::RawSource { locator, columns }))
    }

    /// Add a step fed by `inputs` (in this order). `reference_columns` is
    /// either empty or holds one list per input.
    pub fn add_step_node(
        &mut self,
        transform: TransformKind,
        inputs: Vec<NodeId>,
        reference_columns: Vec<Vec<String>>,
    ) -> Result<NodeId> {
        let arity = transform.required_arity();
        if inputs.len() != arity {
            return Err(Error::ArityMismatch {
                kind: transform.display_name(),
                expected: arity,
                got: inputs.len(),
            });
        }
        let reference_columns = match reference_columns.len() {
            0 => vec![Vec::new(); arity],
            n if n == arity => reference_columns,
            n => {
                return Err(Error::ReferenceArity {
                    kind: transform.display_name(),
                    expected: arity,
                    got: n,
                })
            }
        };
        for &input in &inputs {
            self.node(input)?;
        }
        let next = NodeId::new(self.nodes.len() as u64);
        for (i, &input) in inputs.iter().enumerate() {
            if inputs[..i].contains(&input) {
                return Err(Error::DuplicateEdge {
                    from: input,
                    to: next,
                });
            }
        }

        let id = self.push(
            transform.display_name().to_string(),
            NodeKind::Step {
                transform,
                inputs: inputs.clone(),
                reference_columns,
            },
        );
        for input in inputs {
            self.successors[input.index()].insert(id);
        }
        Ok(id)
    }

    /// Re-point input `slot` of `step` to `producer`. Rejected if the new
    /// edge would close a cycle or duplicate an existing edge.
    pub fn repoint_input(&mut self, step: NodeId, slot: usize, producer: NodeId) -> Result<()> {
        self.node(producer)?;
        let current = match self.node(step)?.inputs().get(slot) {
            Some(&c) => c,
            None => return Err(Error::InvalidSlot { node: step, slot }),
        };
        if current == producer {
            return Ok(());
        }
        if producer == step || self.reaches(step, producer) {
            return Err(Error::Cycle(format!(
                "{} is reachable from {}",
                producer, step
            )));
        }
        if self.node(step)?.inputs().contains(&producer) {
            return Err(Error::DuplicateEdge {
                from: producer,
                to: step,
            });
        }

        if let NodeKind::Step { inputs, .. } = &mut self.nodes[step.index()].kind {
            inputs[slot] = producer;
        }
        self.successors[current.index()].remove(&step);
        self.successors[producer.index()].insert(step);
        Ok(())
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        self.node(id)?;
        self.nodes[id.index()].label = label.into();
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(Error::NodeNotFound(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges, ordered by consumer then slot.
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .flat_map(|n| {
                n.inputs().iter().enumerate().map(move |(slot, &from)| Edge {
                    from,
                    to: n.id,
                    slot,
                })
            })
            .collect()
    }

    pub fn find_source(&self, locator: &str) -> Option<NodeId> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::RawSource { locator: l, .. } if l == locator => Some(n.id),
            _ => None,
        })
    }

    /// Producers connected directly to `id`, in input-slot order.
    /// Indirect ancestors are never included.
    pub fn immediate_predecessors(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.inputs())
    }

    pub fn successors(&self, id: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        self.node(id)?;
        Ok(self.successors[id.index()].iter().copied())
    }

    /// Lazily yield generations; within each, ids ascend.
    pub fn topological_order(&self) -> Generations<'_> {
        Generations::new(self)
    }

    /// Eager form of [`Graph::topological_order`].
    pub fn generations(&self) -> Result<Vec<Vec<NodeId>>> {
        self.topological_order().collect()
    }

    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(cur) = stack.pop() {
            if cur == to {
                return true;
            }
            if std::mem::replace(&mut seen[cur.index()], true) {
                continue;
            }
            stack.extend(self.successors[cur.index()].iter().copied());
        }
        false
    }

    fn push(&mut self, label: String, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(Node { id, label, kind });
        self.successors.push(BTreeSet::new());
        id
    }
}

/// Kahn-style layered walk over a [`Graph`].
pub struct Generations<'g> {
    graph: &'g Graph,
    pending_inputs: Vec<usize>,
    frontier: Vec<NodeId>,
    emitted: usize,
    done: bool,
}

impl<'g> Generations<'g> {
    fn new(graph: &'g Graph) -> Self {
        let pending_inputs: Vec<usize> = graph.nodes.iter().map(|n| n.inputs().len()).collect();
        let frontier = graph
            .nodes
            .iter()
            .filter(|n| n.inputs().is_empty())
            .map(|n| n.id)
            .collect();
        Self {
            graph,
            pending_inputs,
            frontier,
            emitted: 0,
            done: false,
        }
    }
}

impl Iterator for Generations<'_> {
    type Item = Result<Vec<NodeId>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.frontier.is_empty() {
            self.done = true;
            let left = self.graph.nodes.len() - self.emitted;
            return (left > 0).then(|| {
                Err(Error::Cycle(format!(
                    "{} node(s) never became ready",
                    left
                )))
            });
        }

        let mut current = std::mem::take(&mut self.frontier);
        current.sort_unstable();
        self.emitted += current.len();
        for &id in &current {
            for &succ in &self.graph.successors[id.index()] {
                let pending = &mut self.pending_inputs[succ.index()];
                *pending -= 1;
                if *pending == 0 {
                    self.frontier.push(succ);
                }
            }
        }
        Some(Ok(current))
    }
}
