//! Caller-supplied configuration for writing and reading.

pub use crate::container::Compression;
pub use crate::layout::TableLayout;

/// Options for [`crate::writer::export_hdf`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Table layout; column-group unless the legacy composite layout is requested.
    pub table_layout: TableLayout,
    /// Passed unchanged to every column, table and image dataset.
    pub compression: Compression,
}

impl WriteOptions {
    pub fn with_layout(mut self, layout: TableLayout) -> Self {
        self.table_layout = layout;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Options for [`crate::reader::read_hdf`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fail instead of warning when the root class tag is missing or foreign.
    pub require_format: bool,
}

impl ReadOptions {
    pub fn strict() -> Self {
        ReadOptions {
            require_format: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let w = WriteOptions::default();
        assert_eq!(w.table_layout, TableLayout::ColumnGroup);
        assert_eq!(w.compression, Compression::none());
        assert!(!ReadOptions::default().require_format);
        assert!(ReadOptions::strict().require_format);
    }

    #[test]
    fn builders() {
        let w = WriteOptions::default()
            .with_layout(TableLayout::Composite)
            .with_compression(Compression::deflate(4).with_shuffle());
        assert_eq!(w.table_layout, TableLayout::Composite);
        assert_eq!(w.compression.level, Some(4));
        assert!(w.compression.shuffle);
    }
}
