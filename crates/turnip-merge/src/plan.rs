//! Batch planning
//!
//! Walks a batch of proposed operations in input order against a working copy
//! of one snapshot and produces the net mutation set, the diff and one outcome
//! per operation. Planning never touches the store; the engine commits the
//! result.

use std::collections::{BTreeMap, HashMap};

use turnip_core::{
    mention_key, normalize_mention, Attributes, Diff, Edge, EdgeId, EdgeKey, GraphSnapshot,
    Mutation, MutationSet, NoOpReason, Node, NodeId, OperationOutcome, ProposedOperation,
    Result, Version,
};
use turnip_resolve::{Resolution, Resolve};

/// The planned result of one batch, ready to commit
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBatch {
    pub mutations: MutationSet,
    pub diff: Diff,
    /// One entry per input operation, in input order
    pub outcomes: Vec<OperationOutcome>,
}

/// Plan `operations` against `snapshot`.
///
/// Fails on the first invalid operation; the error is wrapped as
/// `MergeFailed` carrying that operation's index.
pub fn plan_batch(
    operations: &[ProposedOperation],
    snapshot: &GraphSnapshot,
    resolver: &dyn Resolve,
) -> Result<PlannedBatch> {
    let mut planner = Planner::new(snapshot, resolver);
    for (index, operation) in operations.iter().enumerate() {
        let outcome = planner
            .apply(operation)
            .map_err(|e| e.into_merge_failed(Some(index)))?;
        tracing::debug!("Operation {} ({}): {:?}", index, operation, outcome);
        planner.outcomes.push(outcome);
    }
    Ok(planner.finish())
}

struct Planner<'a> {
    base: &'a GraphSnapshot,
    resolver: &'a dyn Resolve,
    version: Version,
    ids: MutationSet,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    edge_index: HashMap<EdgeKey, EdgeId>,
    /// Mention key to node id for everything this batch has already resolved
    local: HashMap<String, NodeId>,
    /// Set once the working nodes differ from the base snapshot
    diverged: bool,
    /// Working nodes as a snapshot for the resolver, rebuilt after node changes
    view: Option<GraphSnapshot>,
    outcomes: Vec<OperationOutcome>,
}

impl<'a> Planner<'a> {
    fn new(base: &'a GraphSnapshot, resolver: &'a dyn Resolve) -> Self {
        let ids = MutationSet::against(base);
        Self {
            base,
            resolver,
            version: ids.target_version(),
            ids,
            nodes: base.node_map().clone(),
            edges: base.edge_map().clone(),
            edge_index: base.edges().map(|e| (e.key(), e.id)).collect(),
            local: HashMap::new(),
            diverged: false,
            view: None,
            outcomes: Vec::new(),
        }
    }

    fn apply(&mut self, operation: &ProposedOperation) -> Result<OperationOutcome> {
        operation.validate()?;

        match operation {
            ProposedOperation::AddOrUpdateEntity {
                mention,
                entity_type,
                attributes,
                override_type,
            } => self.upsert_entity(mention, entity_type.as_deref(), attributes, *override_type),
            ProposedOperation::AddOrUpdateRelation {
                source,
                relation,
                target,
                attributes,
            } => self.upsert_relation(source, relation, target, attributes),
            ProposedOperation::DeleteEntity { mention } => self.delete_entity(mention),
            ProposedOperation::DeleteRelation {
                source,
                relation,
                target,
            } => self.delete_relation(source, relation, target),
        }
    }

    /// Local map first, then the resolver against the working nodes.
    ///
    /// Nodes created earlier in the batch are candidates; removed ones are not.
    fn lookup(&mut self, mention: &str, type_hint: Option<&str>) -> Result<Option<NodeId>> {
        let key = mention_key(mention);
        if let Some(id) = self.local.get(&key) {
            return Ok(Some(*id));
        }

        let resolver = self.resolver;
        let snapshot: &GraphSnapshot = if self.diverged {
            let (base, nodes) = (self.base, &self.nodes);
            self.view.get_or_insert_with(|| {
                GraphSnapshot::from_parts(
                    base.version(),
                    base.next_node_id(),
                    base.next_edge_id(),
                    nodes.clone(),
                    BTreeMap::new(),
                )
            })
        } else {
            self.base
        };

        match resolver.resolve(mention, type_hint, snapshot)? {
            Resolution::Resolved(id) if self.nodes.contains_key(&id) => {
                self.local.insert(key, id);
                Ok(Some(id))
            }
            _ => Ok(None),
        }
    }

    /// Mark the working nodes as changed so the next lookup sees them
    fn touch(&mut self) {
        self.diverged = true;
        self.view = None;
    }

    /// Resolve `mention`, creating a node for it if nothing matches.
    ///
    /// Returns the id and whether the node changed (created or aliased).
    fn ensure_node(&mut self, mention: &str, type_hint: Option<&str>) -> Result<(NodeId, bool)> {
        if let Some(id) = self.lookup(mention, type_hint)? {
            let version = self.version;
            let grew = match self.nodes.get_mut(&id) {
                Some(node) => {
                    let grew = node.add_alias(mention);
                    if grew {
                        node.updated_at = version;
                    }
                    grew
                }
                None => false,
            };
            if grew {
                self.touch();
            }
            return Ok((id, grew));
        }

        let id = self.ids.allocate_node_id();
        let mut node = Node::new(id, normalize_mention(mention), self.version);
        if let Some(hint) = type_hint.filter(|t| !t.trim().is_empty()) {
            node = node.with_type(hint.trim());
        }
        self.local.insert(mention_key(mention), id);
        self.nodes.insert(id, node);
        self.touch();
        Ok((id, true))
    }

    fn upsert_entity(
        &mut self,
        mention: &str,
        entity_type: Option<&str>,
        attributes: &Attributes,
        override_type: bool,
    ) -> Result<OperationOutcome> {
        let (id, mut changed) = self.ensure_node(mention, entity_type)?;
        let version = self.version;

        if let Some(node) = self.nodes.get_mut(&id) {
            if let Some(hint) = entity_type.map(str::trim).filter(|t| !t.is_empty()) {
                let replace = match &node.node_type {
                    None => true,
                    Some(current) => override_type && current.as_str() != hint,
                };
                if replace {
                    node.node_type = Some(hint.into());
                    changed = true;
                }
            }
            changed |= node.merge_attributes(attributes);
            if changed {
                node.updated_at = version;
            }
        }
        if changed {
            self.touch();
        }

        Ok(if changed {
            OperationOutcome::Applied {
                nodes: vec![id],
                edges: Vec::new(),
            }
        } else {
            OperationOutcome::no_op(NoOpReason::Unchanged)
        })
    }

    fn upsert_relation(
        &mut self,
        source: &str,
        relation: &str,
        target: &str,
        attributes: &Attributes,
    ) -> Result<OperationOutcome> {
        let (source_id, source_changed) = self.ensure_node(source, None)?;
        let (target_id, target_changed) = self.ensure_node(target, None)?;

        let mut nodes = Vec::new();
        if source_changed {
            nodes.push(source_id);
        }
        if target_changed && target_id != source_id {
            nodes.push(target_id);
        }

        let key = EdgeKey::new(source_id, relation, target_id);
        let mut edges = Vec::new();
        match self.edge_index.get(&key) {
            Some(edge_id) => {
                if let Some(edge) = self.edges.get_mut(edge_id) {
                    if edge.merge_attributes(attributes) {
                        edge.updated_at = self.version;
                        edges.push(edge.id);
                    }
                }
            }
            None => {
                let id = self.ids.allocate_edge_id();
                let mut edge = Edge::new(id, source_id, relation, target_id, self.version);
                edge.merge_attributes(attributes);
                self.edge_index.insert(key, id);
                self.edges.insert(id, edge);
                edges.push(id);
            }
        }

        Ok(if nodes.is_empty() && edges.is_empty() {
            OperationOutcome::no_op(NoOpReason::Unchanged)
        } else {
            OperationOutcome::Applied { nodes, edges }
        })
    }

    fn delete_entity(&mut self, mention: &str) -> Result<OperationOutcome> {
        let Some(id) = self.lookup(mention, None)? else {
            return Ok(OperationOutcome::no_op(NoOpReason::UnknownEntity));
        };

        let incident: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.is_incident_to(id))
            .map(|e| e.id)
            .collect();
        for edge_id in &incident {
            if let Some(edge) = self.edges.remove(edge_id) {
                self.edge_index.remove(&edge.key());
            }
        }

        self.nodes.remove(&id);
        self.local.retain(|_, v| *v != id);
        self.touch();

        Ok(OperationOutcome::Applied {
            nodes: vec![id],
            edges: incident,
        })
    }

    fn delete_relation(
        &mut self,
        source: &str,
        relation: &str,
        target: &str,
    ) -> Result<OperationOutcome> {
        let (Some(source_id), Some(target_id)) =
            (self.lookup(source, None)?, self.lookup(target, None)?)
        else {
            return Ok(OperationOutcome::no_op(NoOpReason::UnknownEndpoint));
        };

        let key = EdgeKey::new(source_id, relation, target_id);
        match self.edge_index.remove(&key) {
            Some(edge_id) => {
                self.edges.remove(&edge_id);
                Ok(OperationOutcome::Applied {
                    nodes: Vec::new(),
                    edges: vec![edge_id],
                })
            }
            None => Ok(OperationOutcome::no_op(NoOpReason::UnknownRelation)),
        }
    }

    /// Net changes of the working copy relative to the base snapshot
    fn finish(self) -> PlannedBatch {
        let mut diff = Diff::default();
        let mut mutations = self.ids;
        let base_nodes = self.base.node_map();
        let base_edges = self.base.edge_map();

        for id in base_edges.keys().filter(|id| !self.edges.contains_key(id)) {
            diff.edges_removed.push(*id);
            mutations.push(Mutation::RemoveEdge(*id));
        }
        for id in base_nodes.keys().filter(|id| !self.nodes.contains_key(id)) {
            diff.nodes_removed.push(*id);
            mutations.push(Mutation::RemoveNode(*id));
        }
        for (id, node) in self.nodes {
            match base_nodes.get(&id) {
                None => {
                    diff.nodes_added.push(id);
                    mutations.push(Mutation::InsertNode(node));
                }
                Some(previous) if !same_node(previous, &node) => {
                    diff.nodes_updated.push(id);
                    mutations.push(Mutation::UpdateNode(node));
                }
                Some(_) => {}
            }
        }
        for (id, edge) in self.edges {
            match base_edges.get(&id) {
                None => {
                    diff.edges_added.push(id);
                    mutations.push(Mutation::InsertEdge(edge));
                }
                Some(previous) if !same_edge(previous, &edge) => {
                    diff.edges_updated.push(id);
                    mutations.push(Mutation::UpdateEdge(edge));
                }
                Some(_) => {}
            }
        }

        PlannedBatch {
            mutations,
            diff,
            outcomes: self.outcomes,
        }
    }
}

/// Equal apart from `updated_at`: a record changed and changed back within
/// one batch is not an update.
fn same_node(previous: &Node, node: &Node) -> bool {
    *previous
        == Node {
            updated_at: previous.updated_at,
            ..node.clone()
        }
}

fn same_edge(previous: &Edge, edge: &Edge) -> bool {
    *previous
        == Edge {
            updated_at: previous.updated_at,
            ..edge.clone()
        }
}
