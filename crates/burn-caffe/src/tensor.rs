//! Learned parameter storage for graph nodes.

use burn_tensor::{DType, Element, TensorData};

/// The number of values does not match the product of the declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("shape {shape:?} holds {expected} values but {actual} were provided")]
pub struct ShapeError {
    /// Declared dimensions.
    pub shape: Vec<usize>,
    /// Product of the declared dimensions.
    pub expected: usize,
    /// Length of the flat buffer.
    pub actual: usize,
}

/// A dense, row-major parameter tensor (weight, bias, running statistics).
///
/// The buffer is kept in the precision it was created with; narrowing to the wire precision
/// only happens in the blob transcoder.
#[derive(Debug, Clone)]
pub struct ParamTensor {
    inner: TensorData,
}

impl ParamTensor {
    /// Create a tensor, checking that `shape` accounts for every value in `data`.
    pub fn new<E: Element>(data: Vec<E>, shape: Vec<usize>) -> Result<Self, ShapeError> {
        check_len(&shape, data.len())?;

        Ok(Self {
            inner: TensorData::new(data, shape),
        })
    }

    /// Single precision tensor.
    pub fn from_f32(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, ShapeError> {
        Self::new(data, shape)
    }

    /// Flat single precision vector, its shape being its length.
    pub fn vector(data: Vec<f32>) -> Self {
        let len = data.len();
        Self {
            inner: TensorData::new(data, vec![len]),
        }
    }

    /// The dimensions, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.inner.shape
    }

    /// Total number of values.
    pub fn num_elements(&self) -> usize {
        self.inner.num_elements()
    }

    /// In-memory element type.
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Copy of the values, narrowed or widened to `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.inner.iter::<f32>().collect()
    }

    /// Copy of the values, widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.inner.iter::<f64>().collect()
    }

    /// Same values under a different shape.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Self, ShapeError> {
        check_len(&shape, self.num_elements())?;

        let inner = match self.inner.dtype {
            DType::F64 => TensorData::new(self.to_f64_vec(), shape),
            _ => TensorData::new(self.to_f32_vec(), shape),
        };
        Ok(Self { inner })
    }

    /// Same values flattened to one dimension.
    pub fn flatten(&self) -> Self {
        let len = self.num_elements();
        let inner = match self.inner.dtype {
            DType::F64 => TensorData::new(self.to_f64_vec(), vec![len]),
            _ => TensorData::new(self.to_f32_vec(), vec![len]),
        };
        Self { inner }
    }

    /// Every value multiplied by `factor`, keeping the shape.
    pub fn scaled(&self, factor: f64) -> Self {
        let shape = self.shape().to_vec();
        let inner = match self.inner.dtype {
            DType::F64 => TensorData::new(
                self.to_f64_vec()
                    .into_iter()
                    .map(|v| v * factor)
                    .collect::<Vec<_>>(),
                shape,
            ),
            _ => TensorData::new(
                self.to_f32_vec()
                    .into_iter()
                    .map(|v| (v as f64 * factor) as f32)
                    .collect::<Vec<_>>(),
                shape,
            ),
        };
        Self { inner }
    }

    /// Compare shapes exactly and values within `tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self
                .to_f64_vec()
                .iter()
                .zip(other.to_f64_vec())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl PartialEq for ParamTensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.to_f64_vec() == other.to_f64_vec()
    }
}

fn check_len(shape: &[usize], actual: usize) -> Result<(), ShapeError> {
    let expected = shape.iter().product::<usize>();
    if expected != actual {
        return Err(ShapeError {
            shape: shape.to_vec(),
            expected,
            actual,
        });
    }
    Ok(())
}
