//! Checked constructors from parallel arrays.

use crate::expr::affine::AffineExpr;
use crate::expr::error::ExprError;
use crate::expr::terms::{LinTerms, QuadTerms};
use crate::ids::VarId;

fn check_finite(coefs: &[f64]) -> Result<(), ExprError> {
    match coefs.iter().find(|c| !c.is_finite()) {
        Some(value) => Err(ExprError::NonFiniteCoefficient { value: *value }),
        None => Ok(()),
    }
}

/// Zip `vars` and `coefs` into linear terms, dropping zero coefficients.
pub fn linear_terms(vars: &[VarId], coefs: &[f64]) -> Result<LinTerms, ExprError> {
    if vars.len() != coefs.len() {
        return Err(ExprError::MismatchedLengths {
            vars: vars.len(),
            coefs: coefs.len(),
        });
    }
    check_finite(coefs)?;
    Ok(vars
        .iter()
        .copied()
        .zip(coefs.iter().copied())
        .filter(|(_, c)| *c != 0.0)
        .collect())
}

/// Zip two variable arrays and coefficients into quadratic terms.
pub fn quad_terms(vars1: &[VarId], vars2: &[VarId], coefs: &[f64]) -> Result<QuadTerms, ExprError> {
    if vars1.len() != coefs.len() || vars2.len() != coefs.len() {
        return Err(ExprError::MismatchedLengths {
            vars: vars1.len().max(vars2.len()),
            coefs: coefs.len(),
        });
    }
    check_finite(coefs)?;
    let mut terms = QuadTerms::new();
    for ((a, b), c) in vars1.iter().zip(vars2).zip(coefs) {
        if *c != 0.0 {
            terms.push(*a, *b, *c);
        }
    }
    Ok(terms)
}

/// Sum of affine expressions. Duplicate variables are NOT merged; call
/// `normalize()` on the result when a canonical form is needed.
pub fn affine_sum(exprs: impl IntoIterator<Item = AffineExpr>) -> AffineExpr {
    exprs
        .into_iter()
        .fold(AffineExpr::default(), |acc, e| acc.add(&e))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn linear_terms_rejects_mismatched_lengths() {
        let result = linear_terms(&[VarId::new(1), VarId::new(2)], &[1.0]);
        assert_eq!(
            result.unwrap_err(),
            ExprError::MismatchedLengths { vars: 2, coefs: 1 }
        );
    }

    #[test]
    fn linear_terms_rejects_nan() {
        let result = linear_terms(&[VarId::new(1)], &[f64::NAN]);
        assert!(matches!(
            result,
            Err(ExprError::NonFiniteCoefficient { .. })
        ));
    }

    #[test]
    fn linear_terms_filters_zero_coefficients() {
        let terms = linear_terms(&[VarId::new(1), VarId::new(2)], &[0.0, 3.5])
            .expect("linear_terms should succeed");
        assert_eq!(terms.as_slice(), &[(VarId::new(2), 3.5)]);
    }

    #[test]
    fn affine_sum_concatenates_terms() {
        let summed = affine_sum(vec![
            AffineExpr::term(VarId::new(1), 1.0),
            AffineExpr::term(VarId::new(2), 2.0).add_constant(1.0),
        ]);
        assert_eq!(
            summed.terms().as_slice(),
            &[(VarId::new(1), 1.0), (VarId::new(2), 2.0)]
        );
        assert_eq!(summed.constant(), 1.0);
    }

    #[test]
    fn quad_terms_zip() {
        let terms = quad_terms(&[VarId::new(0)], &[VarId::new(1)], &[2.0]).unwrap();
        assert_eq!(terms.as_slice(), &[(VarId::new(0), VarId::new(1), 2.0)]);
    }
}
