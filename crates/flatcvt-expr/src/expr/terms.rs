//! Term lists by degree.
//!
//! Terms are kept in insertion order until [`LinTerms::normalize`] /
//! [`QuadTerms::normalize`] is called. Normalized lists are sorted by
//! variable, have duplicates merged and contain no zero coefficients, which
//! is the form structural equality expects.

use super::canonical_bits;
use crate::ids::VarId;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Linear terms `sum(coef * var)`.
#[derive(Debug, Clone, Default)]
pub struct LinTerms {
    terms: Vec<(VarId, f64)>,
}

impl LinTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw terms without normalizing them.
    pub fn from_vec(terms: Vec<(VarId, f64)>) -> Self {
        Self { terms }
    }

    pub fn push(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_slice(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms.iter().copied()
    }

    pub fn vars(&self) -> Vec<VarId> {
        self.terms.iter().map(|(v, _)| *v).collect()
    }

    pub fn coefs(&self) -> Vec<f64> {
        self.terms.iter().map(|(_, c)| *c).collect()
    }

    pub fn into_vec(self) -> Vec<(VarId, f64)> {
        self.terms
    }

    /// Sort by variable, merge duplicates, drop zeros.
    pub fn normalize(&mut self) {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for (var, coef) in self.terms.drain(..) {
            if coef == 0.0 {
                continue;
            }
            *merged.entry(var).or_insert(0.0) += coef;
        }
        self.terms = merged.into_iter().filter(|(_, c)| *c != 0.0).collect();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn scale(&self, by: f64) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(v, c)| (*v, *c * by))
                .filter(|(_, c)| *c != 0.0)
                .collect(),
        }
    }

    /// Concatenate, leaving duplicates for `normalize` to merge.
    pub fn add(&self, other: &LinTerms) -> Self {
        let mut terms = Vec::with_capacity(self.terms.len() + other.terms.len());
        terms.extend_from_slice(&self.terms);
        terms.extend_from_slice(&other.terms);
        Self { terms }
    }
}

impl PartialEq for LinTerms {
    fn eq(&self, other: &Self) -> bool {
        self.terms.len() == other.terms.len()
            && self
                .terms
                .iter()
                .zip(&other.terms)
                .all(|(a, b)| a.0 == b.0 && canonical_bits(a.1) == canonical_bits(b.1))
    }
}

impl Eq for LinTerms {}

impl Hash for LinTerms {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.len().hash(state);
        for (var, coef) in &self.terms {
            var.hash(state);
            canonical_bits(*coef).hash(state);
        }
    }
}

impl FromIterator<(VarId, f64)> for LinTerms {
    fn from_iter<T: IntoIterator<Item = (VarId, f64)>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Quadratic terms `sum(coef * var1 * var2)`.
#[derive(Debug, Clone, Default)]
pub struct QuadTerms {
    terms: Vec<(VarId, VarId, f64)>,
}

impl QuadTerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(terms: Vec<(VarId, VarId, f64)>) -> Self {
        Self { terms }
    }

    pub fn push(&mut self, var1: VarId, var2: VarId, coef: f64) {
        self.terms.push((var1, var2, coef));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn as_slice(&self) -> &[(VarId, VarId, f64)] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, VarId, f64)> + '_ {
        self.terms.iter().copied()
    }

    /// Order each pair as `(min, max)`, sort, merge duplicates, drop zeros.
    pub fn normalize(&mut self) {
        let mut merged: BTreeMap<(VarId, VarId), f64> = BTreeMap::new();
        for (a, b, coef) in self.terms.drain(..) {
            if coef == 0.0 {
                continue;
            }
            let key = if a <= b { (a, b) } else { (b, a) };
            *merged.entry(key).or_insert(0.0) += coef;
        }
        self.terms = merged
            .into_iter()
            .filter(|(_, c)| *c != 0.0)
            .map(|((a, b), c)| (a, b, c))
            .collect();
    }

    pub fn scale(&self, by: f64) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(a, b, c)| (*a, *b, *c * by))
                .filter(|(_, _, c)| *c != 0.0)
                .collect(),
        }
    }

    pub fn add(&self, other: &QuadTerms) -> Self {
        let mut terms = Vec::with_capacity(self.terms.len() + other.terms.len());
        terms.extend_from_slice(&self.terms);
        terms.extend_from_slice(&other.terms);
        Self { terms }
    }
}

impl PartialEq for QuadTerms {
    fn eq(&self, other: &Self) -> bool {
        self.terms.len() == other.terms.len()
            && self.terms.iter().zip(&other.terms).all(|(a, b)| {
                a.0 == b.0 && a.1 == b.1 && canonical_bits(a.2) == canonical_bits(b.2)
            })
    }
}

impl Eq for QuadTerms {}

impl Hash for QuadTerms {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.terms.len().hash(state);
        for (a, b, coef) in &self.terms {
            a.hash(state);
            b.hash(state);
            canonical_bits(*coef).hash(state);
        }
    }
}
