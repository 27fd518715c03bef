use serde::Deserialize;
use tracing::trace;

use crate::datatype::element_type::ElementType;
use crate::error::{Error, Result};

/// How a literal holding both a FLOAT and a BIGINT element is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    /// Order decides: FLOAT then BIGINT gives BIGINT, BIGINT then FLOAT gives DOUBLE.
    #[default]
    Legacy,
    /// Both orders give DOUBLE.
    Symmetric,
}

/// Computes the element type of an array literal, one element at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeResolver {
    mode: CoercionMode,
}

/// Position on the BOOLEAN..DOUBLE chain. FLOAT and BIGINT share a rank.
fn rank(element_type: ElementType) -> Option<u8> {
    match element_type {
        ElementType::Boolean => Some(0),
        ElementType::TinyInt => Some(1),
        ElementType::SmallInt => Some(2),
        ElementType::Int => Some(3),
        ElementType::Float | ElementType::BigInt => Some(4),
        ElementType::Double => Some(5),
        _ => None,
    }
}

impl TypeResolver {
    pub fn new(mode: CoercionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> CoercionMode {
        self.mode
    }

    /// Widens the type resolved so far (`old`) to also cover an element of type `new`.
    pub fn resolve(&self, old: ElementType, new: ElementType) -> Result<ElementType> {
        let resolved = self.join(old, new)?;
        trace!(%old, %new, %resolved, "resolved element type");
        Ok(resolved)
    }

    fn join(&self, old: ElementType, new: ElementType) -> Result<ElementType> {
        let conflict = || Error::TypeConflict { old, new };

        if old == ElementType::Unresolved {
            return Ok(new);
        }
        if new == ElementType::Unresolved || old == new {
            return Ok(old);
        }
        // a string element turns the whole literal into strings, whatever came before
        if new == ElementType::Utf8 {
            return Ok(ElementType::Utf8);
        }
        if old == ElementType::Binary || new == ElementType::Binary {
            return Err(conflict());
        }
        if old == ElementType::Utf8 {
            return Ok(ElementType::Utf8);
        }

        match (old, new) {
            (ElementType::Float, ElementType::BigInt) => Ok(match self.mode {
                CoercionMode::Legacy => ElementType::BigInt,
                CoercionMode::Symmetric => ElementType::Double,
            }),
            (ElementType::BigInt, ElementType::Float) => Ok(ElementType::Double),
            _ => match (rank(old), rank(new)) {
                (Some(old_rank), Some(new_rank)) if new_rank > old_rank => Ok(new),
                (Some(_), Some(_)) => Ok(old),
                _ => Err(conflict()),
            },
        }
    }

    /// Resolves a whole sequence left to right, starting from UNRESOLVED.
    pub fn fold<I>(&self, types: I) -> Result<ElementType>
    where
        I: IntoIterator<Item = ElementType>,
    {
        types
            .into_iter()
            .try_fold(ElementType::Unresolved, |old, new| self.resolve(old, new))
    }
}

/// [`TypeResolver::resolve`] with the legacy coercion mode.
pub fn resolve(old: ElementType, new: ElementType) -> Result<ElementType> {
    TypeResolver::default().resolve(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use ElementType::*;

    fn any_type() -> impl Strategy<Value = ElementType> {
        prop::sample::select(ElementType::ALL.to_vec())
    }

    fn numeric_type() -> impl Strategy<Value = ElementType> {
        prop::sample::select(vec![Boolean, TinyInt, SmallInt, Int, BigInt, Float, Double])
    }

    #[test]
    fn test_numeric_chain() -> Result<()> {
        assert_eq!(resolve(Unresolved, Int)?, Int);
        assert_eq!(resolve(Boolean, TinyInt)?, TinyInt);
        assert_eq!(resolve(SmallInt, Int)?, Int);
        assert_eq!(resolve(Int, TinyInt)?, Int);
        assert_eq!(resolve(Int, Float)?, Float);
        assert_eq!(resolve(Int, BigInt)?, BigInt);
        assert_eq!(resolve(Double, Float)?, Double);
        assert_eq!(resolve(Double, BigInt)?, Double);
        assert_eq!(resolve(BigInt, Double)?, Double);
        assert_eq!(resolve(Int, Unresolved)?, Int);
        Ok(())
    }

    #[test]
    fn test_float_bigint_order_legacy() -> Result<()> {
        let resolver = TypeResolver::new(CoercionMode::Legacy);
        assert_eq!(resolver.fold([Float, BigInt])?, BigInt);
        assert_eq!(resolver.fold([BigInt, Float])?, Double);
        Ok(())
    }

    #[test]
    fn test_float_bigint_order_symmetric() -> Result<()> {
        let resolver = TypeResolver::new(CoercionMode::Symmetric);
        assert_eq!(resolver.fold([Float, BigInt])?, Double);
        assert_eq!(resolver.fold([BigInt, Float])?, Double);
        Ok(())
    }

    #[test]
    fn test_sealed_families_conflict() {
        for (old, new) in [
            (Decimal9, Decimal18),
            (Decimal9, Int),
            (Int, IntervalDay),
            (IntervalYear, IntervalDay),
            (Utf8, Binary),
            (Boolean, Binary),
        ] {
            match resolve(old, new) {
                Err(Error::TypeConflict { old: o, new: n }) => {
                    assert_eq!((o, n), (old, new));
                }
                other => panic!("expected a conflict for {old} and {new}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_string_dominates() -> Result<()> {
        assert_eq!(resolve(Int, Utf8)?, Utf8);
        assert_eq!(resolve(Utf8, Double)?, Utf8);
        assert_eq!(resolve(Decimal38, Utf8)?, Utf8);
        assert_eq!(resolve(Utf8, IntervalYear)?, Utf8);
        assert_eq!(resolve(Binary, Utf8)?, Utf8);
        assert_eq!(TypeResolver::default().fold([Binary, Utf8, Int])?, Utf8);
        assert_eq!(TypeResolver::default().fold([Utf8, Int, Int])?, Utf8);
        Ok(())
    }

    #[test]
    fn test_literal_types_step_by_step() -> Result<()> {
        let mut resolved = Unresolved;
        let mut steps = vec![];
        for element in [Int, Int, BigInt, Double] {
            resolved = resolve(resolved, element)?;
            steps.push(resolved);
        }
        assert_eq!(steps, vec![Int, Int, BigInt, Double]);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_idempotent(t in any_type()) {
            prop_assert_eq!(resolve(t, t).ok(), Some(t));
        }

        #[test]
        fn prop_string_absorbs_everything(t in any_type()) {
            prop_assert_eq!(resolve(t, Utf8).ok(), Some(Utf8));
        }

        #[test]
        fn prop_symmetric_mode_commutes(a in any_type(), b in any_type()) {
            // STRING after BINARY widens, BINARY after STRING does not
            prop_assume!(!matches!((a, b), (Utf8, Binary) | (Binary, Utf8)));
            let resolver = TypeResolver::new(CoercionMode::Symmetric);
            prop_assert_eq!(resolver.resolve(a, b).ok(), resolver.resolve(b, a).ok());
        }

        #[test]
        fn prop_fold_absorbs_its_elements(types in prop::collection::vec(any_type(), 0..8)) {
            let resolver = TypeResolver::new(CoercionMode::Symmetric);
            if let Ok(resolved) = resolver.fold(types.iter().copied()) {
                for t in types {
                    if (resolved, t) == (Utf8, Binary) {
                        continue;
                    }
                    prop_assert_eq!(resolver.resolve(resolved, t).ok(), Some(resolved));
                }
            }
        }

        #[test]
        fn prop_numeric_result_never_narrows(a in numeric_type(), b in numeric_type()) {
            let resolved = resolve(a, b).unwrap();
            prop_assert!(rank(resolved) >= rank(a));
            prop_assert!(rank(resolved) >= rank(b));
        }
    }
}
