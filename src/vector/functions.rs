//! Array functions over finalized vectors: bounds, positions, dot products, scaling and
//! integer series.

use tracing::debug;

use crate::datatype::element_type::ElementType;
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::vector::builder::{builder_for, number_of, Number};
use crate::vector::column_vector::{ColumnVector, VectorOptions, VectorState};

/// An element together with its 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedValue {
    pub pos: i32,
    pub value: Scalar,
}

fn check_finalized(vector: &ColumnVector, operation: &'static str) -> Result<()> {
    if vector.state() != VectorState::Finalized {
        return Err(Error::InvalidVectorState {
            state: vector.state(),
            operation,
        });
    }
    Ok(())
}

fn check_numeric(vector: &ColumnVector, operation: &'static str) -> Result<()> {
    check_finalized(vector, operation)?;
    if !vector.element_type().is_numeric() {
        return Err(Error::UnsupportedElementType(vector.element_type()));
    }
    Ok(())
}

fn position(index: usize) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| Error::InvalidArgument(format!("position {index} does not fit an INT")))
}

fn value_f64(vector: &ColumnVector, index: usize) -> Result<f64> {
    let scalar = vector.get(index)?;
    match number_of(&scalar) {
        Some(Number::Int(v)) => Ok(v as f64),
        Some(Number::Float(v)) => Ok(v),
        None => Err(Error::invalid_value(vector.element_type(), scalar)),
    }
}

/// Index of the last element, -1 for an empty vector.
pub fn array_upper(vector: &ColumnVector) -> Result<i32> {
    check_numeric(vector, "array_upper")?;
    Ok(position(vector.len())? - 1)
}

/// Every element with its 1-based position. Works on numeric and STRING vectors.
pub fn array_position(vector: &ColumnVector) -> Result<Vec<PositionedValue>> {
    if vector.element_type() == ElementType::Utf8 {
        check_finalized(vector, "array_position")?;
    } else {
        check_numeric(vector, "array_position")?;
    }
    (0..vector.len())
        .map(|index| {
            Ok(PositionedValue {
                pos: position(index + 1)?,
                value: vector.get(index)?,
            })
        })
        .collect()
}

/// Sum of the pairwise products of two equally long numeric vectors, as DOUBLE.
pub fn array_dot(left: &ColumnVector, right: &ColumnVector) -> Result<f64> {
    check_numeric(left, "array_dot")?;
    check_numeric(right, "array_dot")?;
    if left.len() != right.len() {
        return Err(Error::InvalidArgument(format!(
            "array_dot of vectors with {} and {} elements",
            left.len(),
            right.len()
        )));
    }
    (0..left.len()).try_fold(0.0, |sum, index| -> Result<f64> {
        Ok(sum + value_f64(left, index)? * value_f64(right, index)?)
    })
}

/// A new DOUBLE vector holding every element multiplied by `factor`.
pub fn array_scalar_mult(
    vector: &ColumnVector,
    factor: f64,
    options: &VectorOptions,
) -> Result<ColumnVector> {
    check_numeric(vector, "array_scalar_mult")?;
    let builder = builder_for(ElementType::Double);
    let mut output = builder.allocate(vector.len(), options)?;
    for index in 0..vector.len() {
        let value = value_f64(vector, index)
            .map(|v| ElementValue::Scalar(Scalar::Float64(Some(v * factor))))
            .and_then(|value| builder.write_at(&mut output, index, &value));
        if let Err(e) = value {
            output.release();
            return Err(e);
        }
    }
    builder.finalize(&mut output, vector.len())?;
    debug!(len = vector.len(), factor, "scaled column vector");
    Ok(output)
}

/// A BIGINT vector counting from `start` towards `stop` (inclusive) in steps of `step`.
///
/// A step pointing away from `stop` gives an empty vector. A zero step is rejected.
pub fn generate_series(
    start: i64,
    stop: i64,
    step: i64,
    options: &VectorOptions,
) -> Result<ColumnVector> {
    if step == 0 {
        return Err(Error::InvalidArgument(
            "generate_series step must not be zero".to_string(),
        ));
    }
    let span = i128::from(stop) - i128::from(start);
    let step = i128::from(step);
    let count = if span != 0 && (span < 0) != (step < 0) {
        0
    } else {
        span / step + 1
    };
    let count = usize::try_from(count).unwrap_or(usize::MAX);

    let builder = builder_for(ElementType::BigInt);
    let mut output = builder.allocate(count, options)?;
    for index in 0..count {
        // every value lies between start and stop
        let value = (i128::from(start) + index as i128 * step) as i64;
        if let Err(e) = builder.write_at(&mut output, index, &Scalar::Int64(Some(value)).into()) {
            output.release();
            return Err(e);
        }
    }
    builder.finalize(&mut output, count)?;
    debug!(start, stop, %step, count, "generated series");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::buffer::TrackingBufferManager;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn finalized(element_type: ElementType, values: Vec<Scalar>) -> Result<ColumnVector> {
        let mut vector = builder_for(element_type).allocate(values.len(), &VectorOptions::default())?;
        for (index, value) in values.iter().enumerate() {
            vector.write_at(index, &value.clone().into())?;
        }
        vector.finalize(values.len())?;
        Ok(vector)
    }

    fn doubles(values: &[f64]) -> Result<ColumnVector> {
        finalized(
            ElementType::Double,
            values.iter().map(|v| Scalar::Float64(Some(*v))).collect(),
        )
    }

    fn bigints(vector: &ColumnVector) -> Result<Vec<i64>> {
        vector
            .values()?
            .into_iter()
            .map(|v| match v {
                Scalar::Int64(Some(v)) => Ok(v),
                other => Err(Error::invalid_value(ElementType::BigInt, other)),
            })
            .collect()
    }

    #[test]
    fn test_array_upper() -> Result<()> {
        let ints = finalized(
            ElementType::TinyInt,
            vec![Scalar::Int8(Some(1)), Scalar::Int8(Some(2)), Scalar::Int8(Some(3))],
        )?;
        assert_eq!(array_upper(&ints)?, 2);
        assert_eq!(array_upper(&doubles(&[])?)?, -1);

        let strings = finalized(ElementType::Utf8, vec![Scalar::Utf8(Some("a".to_string()))])?;
        assert!(matches!(
            array_upper(&strings),
            Err(Error::UnsupportedElementType(ElementType::Utf8))
        ));
        Ok(())
    }

    #[test]
    fn test_array_position() -> Result<()> {
        let values = array_position(&doubles(&[1.5, 2.5])?)?;
        assert_eq!(
            values,
            vec![
                PositionedValue {
                    pos: 1,
                    value: Scalar::Float64(Some(1.5))
                },
                PositionedValue {
                    pos: 2,
                    value: Scalar::Float64(Some(2.5))
                },
            ]
        );

        let strings = finalized(
            ElementType::Utf8,
            vec![Scalar::Utf8(Some("x".to_string())), Scalar::Utf8(Some("y".to_string()))],
        )?;
        let positions: Vec<i32> = array_position(&strings)?.iter().map(|p| p.pos).collect();
        assert_eq!(positions, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_array_dot() -> Result<()> {
        let ints = finalized(
            ElementType::Int,
            vec![Scalar::Int32(Some(1)), Scalar::Int32(Some(2)), Scalar::Int32(Some(3))],
        )?;
        let weights = doubles(&[0.5, 1.0, 2.0])?;
        assert_eq!(array_dot(&ints, &weights)?, 8.5);
        assert_eq!(array_dot(&doubles(&[])?, &doubles(&[])?)?, 0.0);

        assert!(matches!(
            array_dot(&ints, &doubles(&[1.0])?),
            Err(Error::InvalidArgument(_))
        ));
        Ok(())
    }

    #[test]
    fn test_functions_need_finalized_vectors() -> Result<()> {
        let mut open = builder_for(ElementType::Double).allocate(1, &VectorOptions::default())?;
        open.write_at(0, &Scalar::Float64(Some(1.0)).into())?;
        assert!(matches!(
            array_upper(&open),
            Err(Error::InvalidVectorState {
                state: VectorState::Writing,
                ..
            })
        ));
        assert!(array_scalar_mult(&open, 2.0, &VectorOptions::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_array_scalar_mult() -> Result<()> {
        let manager = Arc::new(TrackingBufferManager::unlimited());
        let options = VectorOptions::default().with_manager(manager.clone());
        let ints = finalized(
            ElementType::BigInt,
            vec![Scalar::Int64(Some(2)), Scalar::Int64(Some(-4))],
        )?;

        let scaled = array_scalar_mult(&ints, 1.5, &options)?;
        assert_eq!(scaled.element_type(), ElementType::Double);
        assert_eq!(
            scaled.values()?,
            vec![Scalar::Float64(Some(3.0)), Scalar::Float64(Some(-6.0))]
        );
        scaled.release();
        assert_eq!(manager.allocated_bytes(), 0);
        Ok(())
    }

    #[test]
    fn test_generate_series() -> Result<()> {
        let options = VectorOptions::default();
        assert_eq!(bigints(&generate_series(1, 5, 1, &options)?)?, vec![1, 2, 3, 4, 5]);
        assert_eq!(bigints(&generate_series(0, 10, 4, &options)?)?, vec![0, 4, 8]);
        assert_eq!(bigints(&generate_series(3, -3, -3, &options)?)?, vec![3, 0, -3]);
        assert_eq!(bigints(&generate_series(7, 7, 2, &options)?)?, vec![7]);

        let empty = generate_series(5, 1, 1, &options)?;
        assert!(empty.is_empty());
        assert_eq!(empty.state(), VectorState::Finalized);

        assert!(matches!(
            generate_series(1, 5, 0, &options),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            bigints(&generate_series(i64::MAX - 1, i64::MAX, 1, &options)?)?,
            vec![i64::MAX - 1, i64::MAX]
        );
        Ok(())
    }

    #[test]
    fn test_oversized_series_fails_to_allocate() {
        let err = generate_series(i64::MIN, i64::MAX, 1, &VectorOptions::default()).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { .. }));
    }
}
