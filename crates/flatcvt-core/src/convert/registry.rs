//! Rewrite rules by constraint kind.

use super::Converter;
use super::rules;
use crate::backend::ModelApi;
use crate::constraints::{ConKind, Constraint};
use crate::error::ConvertError;
use crate::model::ConInfo;

/// Lowers one stored constraint into simpler ones.
///
/// The constraint is passed by value-copy together with its address; the
/// engine marks it bridged once the rule returns `Ok`.
pub type RewriteFn<B> = fn(&mut Converter<B>, &Constraint, ConInfo) -> Result<(), ConvertError>;

/// At most one rewrite rule per [`ConKind`].
pub struct RewriteRegistry<B: ModelApi> {
    rules: Vec<Option<RewriteFn<B>>>,
}

impl<B: ModelApi> RewriteRegistry<B> {
    /// No rules: every kind must be accepted natively.
    pub fn empty() -> Self {
        Self {
            rules: vec![None; ConKind::COUNT],
        }
    }

    /// The default rule set for linear MIP backends.
    pub fn mip() -> Self {
        let mut registry = Self::empty();
        rules::register_mip(&mut registry);
        registry
    }

    /// Register `rule` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: ConKind, rule: RewriteFn<B>) {
        self.rules[kind.index()] = Some(rule);
    }

    pub fn unregister(&mut self, kind: ConKind) {
        self.rules[kind.index()] = None;
    }

    pub fn get(&self, kind: ConKind) -> Option<RewriteFn<B>> {
        self.rules[kind.index()]
    }

    pub fn has_rule(&self, kind: ConKind) -> bool {
        self.rules[kind.index()].is_some()
    }

    /// Kinds with a registered rule, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = ConKind> + '_ {
        ConKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.has_rule(*kind))
    }
}

impl<B: ModelApi> Default for RewriteRegistry<B> {
    fn default() -> Self {
        Self::mip()
    }
}
