//! Typed N-dimensional arrays shared by column, image and dataset payloads.

use crate::error::{Error, Result};

/// Element type of an [`ArrayData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
}

impl DataType {
    /// Bytes per element in the container encoding; `None` for variable-width text.
    pub fn element_size(self) -> Option<usize> {
        match self {
            DataType::Bool | DataType::U8 => Some(1),
            DataType::I16 => Some(2),
            DataType::I32 | DataType::F32 => Some(4),
            DataType::I64 | DataType::F64 => Some(8),
            DataType::Text => None,
        }
    }

    /// Short lowercase name, e.g. `"f64"`.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::U8 => "u8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Text => "text",
        }
    }
}

/// Flat element storage, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Text(Vec<String>),
}

impl ArrayData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::U8(v) => v.len(),
            ArrayData::I16(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
            ArrayData::Text(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type.
    pub fn dtype(&self) -> DataType {
        match self {
            ArrayData::Bool(_) => DataType::Bool,
            ArrayData::U8(_) => DataType::U8,
            ArrayData::I16(_) => DataType::I16,
            ArrayData::I32(_) => DataType::I32,
            ArrayData::I64(_) => DataType::I64,
            ArrayData::F32(_) => DataType::F32,
            ArrayData::F64(_) => DataType::F64,
            ArrayData::Text(_) => DataType::Text,
        }
    }

    /// Returns `true` for string arrays.
    pub fn is_text(&self) -> bool {
        matches!(self, ArrayData::Text(_))
    }
}

/// Rust element types that map onto an [`ArrayData`] variant.
pub trait Element: Clone + Sized {
    /// Wrap a vector of elements.
    fn wrap(values: Vec<Self>) -> ArrayData;
    /// Borrow the elements if `data` holds this type.
    fn slice(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            fn wrap(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn slice(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(u8, U8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);
impl_element!(String, Text);

/// An N-dimensional typed array. The first axis is the row axis for columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray {
    pub(crate) shape: Vec<usize>,
    pub(crate) data: ArrayData,
}

impl TypedArray {
    /// Build an array, checking that `shape` covers exactly the elements of `data`.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(TypedArray { shape, data })
    }

    /// Build a one-dimensional array.
    pub fn from_data(data: ArrayData) -> Self {
        TypedArray {
            shape: vec![data.len()],
            data,
        }
    }

    /// Build an array from a flat vector and a shape.
    pub fn from_shape_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        TypedArray::new(shape, T::wrap(values))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    /// Length of the leading axis (1 for a zero-dimensional array).
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Borrow the flat elements as `T`, or `None` if the element type differs.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }
}

impl<T: Element> From<Vec<T>> for TypedArray {
    fn from(values: Vec<T>) -> Self {
        TypedArray::from_data(T::wrap(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_dimensional_from_vec() {
        let arr = TypedArray::from(vec![1.0f64, 2.0, 3.0]);
        assert_eq!(arr.shape(), &[3]);
        assert_eq!(arr.dtype(), DataType::F64);
        assert_eq!(arr.rows(), 3);
        assert_eq!(arr.as_slice::<f64>(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(arr.as_slice::<i32>(), None);
    }

    #[test]
    fn shape_must_match_len() {
        let err = TypedArray::from_shape_vec(vec![2, 3], vec![0i16; 5]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { len: 5, .. }));

        let arr = TypedArray::from_shape_vec(vec![2, 3], vec![0i16; 6]).unwrap();
        assert_eq!(arr.ndim(), 2);
        assert_eq!(arr.rows(), 2);
    }

    #[test]
    fn zero_dimensional_holds_one_element() {
        let arr = TypedArray::from_shape_vec(vec![], vec![42i64]).unwrap();
        assert_eq!(arr.ndim(), 0);
        assert_eq!(arr.rows(), 1);
    }

    #[test]
    fn text_arrays() {
        let arr = TypedArray::from(vec![String::from("a"), String::from("bc")]);
        assert!(arr.data().is_text());
        assert_eq!(arr.dtype().element_size(), None);
        assert_eq!(DataType::I16.element_size(), Some(2));
        assert_eq!(DataType::F32.name(), "f32");
    }
}
