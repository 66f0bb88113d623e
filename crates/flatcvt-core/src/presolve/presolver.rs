use super::export::LinkExporter;
use super::link::{Aggregation, Link};
use super::node::{NodeId, NodeRange, ValueKind, ValueNode};
use crate::error::ConvertError;
use serde::Serialize;

/// Values for the variables, constraints and objectives of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelValues {
    pub vars: Vec<f64>,
    pub cons: Vec<f64>,
    pub objs: Vec<f64>,
}

/// Var, constraint and objective nodes of one model level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelNodes {
    pub vars: NodeId,
    pub cons: NodeId,
    pub objs: NodeId,
}

#[derive(Debug)]
struct AutoLinkScope {
    src: NodeRange,
    targets: Vec<NodeRange>,
}

/// Provenance graph between the original model, intermediate items and the
/// model pushed to the backend.
///
/// Links are recorded in creation order, which is also a topological order:
/// presolve replays them forward, postsolve in reverse.
#[derive(Debug)]
pub struct ValuePresolver {
    nodes: Vec<ValueNode>,
    links: Vec<Link>,
    scopes: Vec<AutoLinkScope>,
    exporter: Option<LinkExporter>,
    exported: usize,
    source: ModelNodes,
    target: ModelNodes,
}

impl ValuePresolver {
    pub fn new() -> Self {
        let mut presolver = Self {
            nodes: Vec::new(),
            links: Vec::new(),
            scopes: Vec::new(),
            exporter: None,
            exported: 0,
            source: ModelNodes {
                vars: NodeId::new(0),
                cons: NodeId::new(0),
                objs: NodeId::new(0),
            },
            target: ModelNodes {
                vars: NodeId::new(0),
                cons: NodeId::new(0),
                objs: NodeId::new(0),
            },
        };
        presolver.source = presolver.add_model_nodes("src");
        presolver.target = presolver.add_model_nodes("dst");
        presolver
    }

    fn add_model_nodes(&mut self, prefix: &str) -> ModelNodes {
        ModelNodes {
            vars: self.add_node(format!("{prefix}_vars"), ValueKind::Var),
            cons: self.add_node(format!("{prefix}_cons"), ValueKind::Con),
            objs: self.add_node(format!("{prefix}_objs"), ValueKind::Obj),
        }
    }

    // ── Nodes ───────────────────────────────────────────────

    pub fn add_node(&mut self, name: impl Into<String>, kind: ValueKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(ValueNode::new(name.into(), kind));
        id
    }

    pub fn node(&self, id: NodeId) -> &ValueNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[ValueNode] {
        &self.nodes
    }

    /// Nodes of the original model.
    pub fn source_nodes(&self) -> ModelNodes {
        self.source
    }

    /// Nodes of the model as pushed to the backend.
    pub fn target_nodes(&self) -> ModelNodes {
        self.target
    }

    /// Append `count` slots to `node`.
    pub fn add_slots(&mut self, node: NodeId, count: usize) -> NodeRange {
        let (begin, end) = self.nodes[node.index()].grow(count);
        NodeRange::new(node, begin, end)
    }

    // ── Links ───────────────────────────────────────────────

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn add_link(&mut self, link: Link) -> Result<(), ConvertError> {
        if let Some(last) = self.links.last_mut() {
            if last.try_extend_by(&link) {
                return Ok(());
            }
        }
        self.links.push(link);
        // Everything but the newest entry is final now.
        self.export_up_to(self.links.len() - 1)
    }

    pub fn add_copy_link(&mut self, src: NodeRange, dst: NodeRange) -> Result<(), ConvertError> {
        if src.len() != dst.len() {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "copy link between ranges of length {} and {}",
                    src.len(),
                    dst.len()
                ),
            });
        }
        self.add_link(Link::Copy { src, dst })
    }

    // ── Auto-linking ────────────────────────────────────────

    /// Open a scope: items reported through [`Self::auto_link`] until the
    /// matching [`Self::end_auto_link`] become targets of `src`.
    pub fn begin_auto_link(&mut self, src: NodeRange) {
        self.scopes.push(AutoLinkScope {
            src,
            targets: Vec::new(),
        });
    }

    /// Record a newly created item in the innermost open scope, if any.
    pub fn auto_link(&mut self, target: NodeRange) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if let Some(last) = scope.targets.last_mut() {
            if last.try_extend_by(&target) {
                return;
            }
        }
        scope.targets.push(target);
    }

    /// Close the innermost scope. With `keep == false` the collected targets
    /// are dropped without creating a link.
    pub fn end_auto_link(&mut self, keep: bool) -> Result<(), ConvertError> {
        let Some(scope) = self.scopes.pop() else {
            return Err(ConvertError::Invariant {
                reason: "end_auto_link without an open scope".to_string(),
            });
        };
        if !keep || scope.targets.is_empty() {
            return Ok(());
        }
        match scope.targets.as_slice() {
            [dst]
                if dst.len() == scope.src.len()
                    && self.node(dst.node).kind() == self.node(scope.src.node).kind() =>
            {
                self.add_link(Link::Copy {
                    src: scope.src,
                    dst: *dst,
                })
            }
            _ if scope.src.len() == 1 => {
                let aggregation = match self.node(scope.src.node).kind() {
                    ValueKind::Con => Aggregation::Sum,
                    ValueKind::Var | ValueKind::Obj => Aggregation::First,
                };
                self.add_link(Link::OneToMany {
                    src: scope.src,
                    dsts: scope.targets,
                    aggregation,
                })
            }
            _ => Err(ConvertError::Invariant {
                reason: format!(
                    "auto-link source of {} slots got {} target ranges",
                    scope.src.len(),
                    scope.targets.len()
                ),
            }),
        }
    }

    pub fn auto_link_depth(&self) -> usize {
        self.scopes.len()
    }

    // ── Export ──────────────────────────────────────────────

    pub fn set_exporter(&mut self, exporter: LinkExporter) {
        self.exporter = Some(exporter);
    }

    pub fn is_exporting(&self) -> bool {
        self.exporter.is_some()
    }

    fn export_up_to(&mut self, end: usize) -> Result<(), ConvertError> {
        let Some(exporter) = self.exporter.as_mut() else {
            return Ok(());
        };
        while self.exported < end {
            exporter.write_link(self.exported, &self.links[self.exported], &self.nodes)?;
            self.exported += 1;
        }
        Ok(())
    }

    /// Write the remaining entries and close the sink.
    ///
    /// Fails if the sink did not receive every link.
    pub fn finish_export(&mut self) -> Result<(), ConvertError> {
        let result = self.export_up_to(self.links.len());
        let Some(exporter) = self.exporter.take() else {
            return result;
        };
        let written = exporter.close()?;
        result?;
        if written != self.links.len() {
            return Err(ConvertError::Invariant {
                reason: format!(
                    "exported {} link entries, created {}",
                    written,
                    self.links.len()
                ),
            });
        }
        Ok(())
    }

    /// Write what exists and close the sink without the completeness check
    /// (abort path).
    pub fn abort_export(&mut self) {
        let written = self.export_up_to(self.links.len());
        let Some(exporter) = self.exporter.take() else {
            return;
        };
        if let Err(err) = written.and(exporter.close().map(|_| ())) {
            tracing::warn!(
                component = "presolve",
                operation = "close_export",
                status = "failure",
                error = %err,
                "Failed to close link graph export"
            );
        }
    }

    // ── Value propagation ───────────────────────────────────

    fn init_values(&self) -> Vec<Vec<f64>> {
        self.nodes.iter().map(|n| vec![0.0; n.size()]).collect()
    }

    fn load(
        &self,
        store: &mut [Vec<f64>],
        nodes: ModelNodes,
        values: &ModelValues,
    ) -> Result<(), ConvertError> {
        for (node, input) in [
            (nodes.vars, &values.vars),
            (nodes.cons, &values.cons),
            (nodes.objs, &values.objs),
        ] {
            let slot = &mut store[node.index()];
            if input.is_empty() {
                continue;
            }
            if input.len() != slot.len() {
                return Err(ConvertError::Invariant {
                    reason: format!(
                        "node '{}' has {} slots, got {} values",
                        self.node(node).name(),
                        slot.len(),
                        input.len()
                    ),
                });
            }
            slot.copy_from_slice(input);
        }
        Ok(())
    }

    fn extract(store: &[Vec<f64>], nodes: ModelNodes) -> ModelValues {
        ModelValues {
            vars: store[nodes.vars.index()].clone(),
            cons: store[nodes.cons.index()].clone(),
            objs: store[nodes.objs.index()].clone(),
        }
    }

    /// Map original-model values onto the backend model.
    ///
    /// One-to-many links only write targets of the source's value kind:
    /// `Sum` puts the value in the first such slot and zero in the others,
    /// `First` and `Average` copy it to all of them.
    pub fn presolve(&self, values: &ModelValues) -> Result<ModelValues, ConvertError> {
        let mut store = self.init_values();
        self.load(&mut store, self.source, values)?;
        for link in &self.links {
            match link {
                Link::Copy { src, dst } => {
                    for k in 0..src.len() {
                        let value = store[src.node.index()][src.begin + k];
                        store[dst.node.index()][dst.begin + k] = value;
                    }
                }
                Link::OneToMany {
                    src,
                    dsts,
                    aggregation,
                } => {
                    let src_kind = self.node(src.node).kind();
                    let value = store[src.node.index()][src.begin];
                    let mut first = true;
                    for dst in dsts {
                        if self.node(dst.node).kind() != src_kind {
                            continue;
                        }
                        for k in dst.begin..dst.end {
                            store[dst.node.index()][k] = match aggregation {
                                Aggregation::Sum if !first => 0.0,
                                _ => value,
                            };
                            first = false;
                        }
                    }
                }
            }
        }
        Ok(Self::extract(&store, self.target))
    }

    /// Map backend-model values back onto the original model.
    pub fn postsolve(&self, values: &ModelValues) -> Result<ModelValues, ConvertError> {
        let mut store = self.init_values();
        self.load(&mut store, self.target, values)?;
        for link in self.links.iter().rev() {
            match link {
                Link::Copy { src, dst } => {
                    for k in 0..src.len() {
                        let value = store[dst.node.index()][dst.begin + k];
                        store[src.node.index()][src.begin + k] = value;
                    }
                }
                Link::OneToMany {
                    src,
                    dsts,
                    aggregation,
                } => {
                    let src_kind = self.node(src.node).kind();
                    let collected: Vec<f64> = dsts
                        .iter()
                        .filter(|dst| self.node(dst.node).kind() == src_kind)
                        .flat_map(|dst| {
                            store[dst.node.index()][dst.begin..dst.end].iter().copied()
                        })
                        .collect();
                    if let Some(value) = aggregation.apply(&collected) {
                        store[src.node.index()][src.begin] = value;
                    }
                }
            }
        }
        Ok(Self::extract(&store, self.source))
    }
}

impl Default for ValuePresolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn scope_without_targets_is_a_no_op() {
        let mut pre = ValuePresolver::new();
        let src = pre.add_slots(pre.source_nodes().cons, 1);
        pre.begin_auto_link(src);
        pre.end_auto_link(true).unwrap();
        assert!(pre.links().is_empty());
    }

    #[test]
    fn single_matching_target_becomes_copy() {
        let mut pre = ValuePresolver::new();
        let node = pre.add_node("cons", ValueKind::Con);
        let src = pre.add_slots(pre.source_nodes().cons, 1);
        pre.begin_auto_link(src);
        let dst = pre.add_slots(node, 1);
        pre.auto_link(dst);
        pre.end_auto_link(true).unwrap();
        assert_eq!(pre.links(), &[Link::Copy { src, dst }]);
    }

    #[test]
    fn dropped_scope_creates_no_link() {
        let mut pre = ValuePresolver::new();
        let node = pre.add_node("cons", ValueKind::Con);
        let src = pre.add_slots(pre.source_nodes().cons, 1);
        pre.begin_auto_link(src);
        let dst = pre.add_slots(node, 2);
        pre.auto_link(dst);
        pre.end_auto_link(false).unwrap();
        assert!(pre.links().is_empty());
        assert!(pre.end_auto_link(true).is_err());
    }

    #[test]
    fn consecutive_copy_links_are_merged() {
        let mut pre = ValuePresolver::new();
        let src_node = pre.source_nodes().vars;
        let dst_node = pre.target_nodes().vars;
        for _ in 0..3 {
            let src = pre.add_slots(src_node, 1);
            let dst = pre.add_slots(dst_node, 1);
            pre.add_copy_link(src, dst).unwrap();
        }
        assert_eq!(pre.links().len(), 1);
        let values = ModelValues {
            vars: vec![1.0, 2.0, 3.0],
            ..Default::default()
        };
        assert_eq!(pre.presolve(&values).unwrap().vars, vec![1.0, 2.0, 3.0]);
        assert_eq!(pre.postsolve(&values).unwrap().vars, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn wrong_value_count_is_rejected() {
        let mut pre = ValuePresolver::new();
        pre.add_slots(pre.source_nodes().vars, 2);
        let values = ModelValues {
            vars: vec![1.0],
            ..Default::default()
        };
        assert!(pre.presolve(&values).is_err());
    }
}
