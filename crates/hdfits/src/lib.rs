//! Store lists of FITS-style header/data units in a hierarchical container.
//!
//! A [`UnitList`] (primary units, tables and images, each with a header and
//! optional comment/history text) is written with [`export_hdf`] and read back
//! with [`read_hdf`]. Unit and column order survive through explicit integer
//! attributes, since the container lists children by name.

pub mod array;
pub mod container;
pub mod error;
pub mod idi;
pub mod keywords;
pub mod layout;
pub mod options;
pub mod reader;
pub mod value;
pub mod writer;

#[cfg(feature = "array")]
mod ndarray_compat;

pub use array::{ArrayData, DataType, Element, TypedArray};
pub use container::{Compression, File};
pub use error::{Error, Result};
pub use idi::{Column, Header, Table, Unit, UnitData, UnitList};
pub use keywords::{classify, KeywordClass};
pub use layout::TableLayout;
pub use options::{ReadOptions, WriteOptions};
pub use reader::{read_container, read_hdf, ReadOutcome, ReadWarning};
pub use value::Value;
pub use writer::{export_hdf, write_container};
