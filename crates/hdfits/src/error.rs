use thiserror::Error;

/// All errors that can occur while writing or reading an HDFITS container.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The HDF5 structures decoded but do not fit together.
    #[error("corrupt container: {0}")]
    Corrupt(&'static str),
    /// The HDF5 parser or writer rejected the file.
    #[error("HDF5 format error: {0}")]
    Format(#[from] rustyhdf5_format::error::FormatError),
    /// A dataset uses an HDF5 datatype with no array mapping.
    #[error("{node}: unsupported HDF5 datatype ({datatype})")]
    UnsupportedType { node: String, datatype: &'static str },
    /// A group already holds a child with this name.
    #[error("node already exists: {0}")]
    NodeExists(String),
    /// Two units in one list share a name.
    #[error("duplicate unit name: {0}")]
    DuplicateUnit(String),
    /// Two columns in one table share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    /// An array's element count disagrees with its declared shape.
    #[error("shape {shape:?} does not match {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },
    /// Columns of a composite table have different row counts.
    #[error("column {column} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    /// Image payloads must be numeric.
    #[error("invalid image data: {0}")]
    InvalidImage(&'static str),
    /// A layout attribute needed to rebuild column identity is absent.
    #[error("{node}: missing required attribute {attribute}")]
    MissingAttribute { node: String, attribute: String },
    /// A composite table names a field its dataset does not have.
    #[error("{unit}: composite table has no field named {field}")]
    MissingField { unit: String, field: String },
    /// The root class tag is absent or not HDFITS (strict reads only).
    #[error("not an HDFITS container (CLASS = {found:?})")]
    FormatMismatch { found: Option<String> },
    /// Emitting a unit failed; names the unit and, if relevant, the column.
    #[error("failed to write {}: {source}", location(.unit, .column.as_deref()))]
    Write {
        unit: String,
        column: Option<String>,
        #[source]
        source: Box<Error>,
    },
}

fn location(unit: &str, column: Option<&str>) -> String {
    match column {
        Some(col) => format!("{unit} > {col}"),
        None => unit.to_string(),
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_corrupt() {
        let e = Error::Corrupt("bad node tag");
        assert_eq!(e.to_string(), "corrupt container: bad node tag");
    }

    #[test]
    fn display_unsupported_type() {
        let e = Error::UnsupportedType {
            node: "REFS".into(),
            datatype: "reference",
        };
        assert_eq!(e.to_string(), "REFS: unsupported HDF5 datatype (reference)");
    }

    #[test]
    fn display_missing_attribute() {
        let e = Error::MissingAttribute {
            node: "SRC1/DATA/FLUX".into(),
            attribute: "COLUMN_ID".into(),
        };
        assert_eq!(
            e.to_string(),
            "SRC1/DATA/FLUX: missing required attribute COLUMN_ID"
        );
    }

    #[test]
    fn display_write_names_unit_and_column() {
        let e = Error::Write {
            unit: "SRC1".into(),
            column: Some("FLUX".into()),
            source: Box::new(Error::NodeExists("FLUX".into())),
        };
        assert_eq!(
            e.to_string(),
            "failed to write SRC1 > FLUX: node already exists: FLUX"
        );

        let e = Error::Write {
            unit: "IMG".into(),
            column: None,
            source: Box::new(Error::InvalidImage("text")),
        };
        assert!(e.to_string().starts_with("failed to write IMG:"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::other("oops");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn std_error_source() {
        use std::error::Error as StdError;

        assert!(Error::Corrupt("x").source().is_none());

        let e = Error::Write {
            unit: "A".into(),
            column: None,
            source: Box::new(Error::Corrupt("x")),
        };
        assert!(e.source().is_some());
    }
}
