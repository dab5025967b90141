use ndarray::{Array, ArrayD, IxDyn};

use crate::array::{Element, TypedArray};
use crate::error::{Error, Result};

impl TypedArray {
    /// Copy into an `ndarray` array of element type `T`, in row-major order.
    ///
    /// Returns `Ok(None)` when the array does not hold `T`.
    pub fn to_ndarray<T: Element>(&self) -> Result<Option<ArrayD<T>>> {
        let Some(values) = self.as_slice::<T>() else {
            return Ok(None);
        };
        let arr = Array::from_shape_vec(IxDyn(self.shape()), values.to_vec()).map_err(|_| {
            Error::ShapeMismatch {
                shape: self.shape().to_vec(),
                len: values.len(),
            }
        })?;
        Ok(Some(arr))
    }
}

impl<T: Element> From<ArrayD<T>> for TypedArray {
    fn from(arr: ArrayD<T>) -> Self {
        let shape = arr.shape().to_vec();
        let values: Vec<T> = arr.iter().cloned().collect();
        TypedArray {
            shape,
            data: T::wrap(values),
        }
    }
}
