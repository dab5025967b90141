//! Names and tags of the persisted container layout.
//!
//! ```text
//! /                      CLASS = ["HDFITS"]
//! /<unit>                CLASS = ["HDU"], POSITION = [n], <KEY> = [v], <KEY>_COMMENT = [c]
//! /<unit>/DATA           CLASS = ["DATA_GROUP"] | ["TABLE"] | ["IMAGE"]
//! /<unit>/DATA/<column>  CLASS = ["COLUMN"], COLUMN_ID = [i], UNITS = [u]
//! /<unit>/COMMENT        text lines
//! /<unit>/HISTORY        text lines
//! ```

pub use crate::container::CLASS_ATTR;

/// Root class tag identifying the format.
pub const FORMAT_CLASS: &str = "HDFITS";
/// Class tag of a unit group.
pub const HDU_CLASS: &str = "HDU";
/// Attribute carrying a unit's 1-based write position.
pub const POSITION_ATTR: &str = "POSITION";

/// Name of the data node inside a unit group.
pub const DATA_NODE: &str = "DATA";
/// Name of the comment text dataset.
pub const COMMENT_NODE: &str = "COMMENT";
/// Name of the history text dataset.
pub const HISTORY_NODE: &str = "HISTORY";

/// Class tag of a composite table: one compound dataset.
pub const TABLE_CLASS: &str = "TABLE";
/// Class tag of a column-group table: one dataset per column.
pub const DATA_GROUP_CLASS: &str = "DATA_GROUP";
/// Class tag of an image dataset.
pub const IMAGE_CLASS: &str = "IMAGE";
/// Class tag of one column dataset inside a `DATA_GROUP`.
pub const COLUMN_CLASS: &str = "COLUMN";

/// Attribute carrying a column's 0-based index in its table.
pub const COLUMN_ID_ATTR: &str = "COLUMN_ID";
/// Attribute carrying a column's physical unit.
pub const UNITS_ATTR: &str = "UNITS";

/// `FIELD_<i>_NAME`: column name of compound field `i`.
pub const FIELD_NAME: &str = "NAME";
/// `FIELD_<i>_UNITS`: unit of field `i`, empty when the column has none.
pub const FIELD_UNITS: &str = "UNITS";
/// `FIELD_<i>_FILL`: fill value of field `i`.
pub const FIELD_FILL: &str = "FILL";
/// Row count of a composite table.
pub const NROWS_ATTR: &str = "NROWS";
/// Table layout version attribute.
pub const VERSION_ATTR: &str = "VERSION";
/// Table title attribute, set to the unit name.
pub const TITLE_ATTR: &str = "TITLE";
/// Value of `VERSION` on composite tables.
pub const TABLE_VERSION: f64 = 2.6;

/// Image version attribute and the value written to it.
pub const IMAGE_VERSION_ATTR: &str = "IMAGE_VERSION";
pub const IMAGE_VERSION: &str = "1.2";
/// Image subclass attribute; images are always written as grayscale.
pub const IMAGE_SUBCLASS_ATTR: &str = "IMAGE_SUBCLASS";
pub const IMAGE_GRAYSCALE: &str = "IMAGE_GRAYSCALE";
/// `[min, max]` of an image's pixel values. Any NaN pixel makes both ends NaN.
pub const IMAGE_MINMAXRANGE_ATTR: &str = "IMAGE_MINMAXRANGE";

/// `FIELD_<index>_<suffix>`, e.g. `FIELD_0_NAME`.
pub fn field_attr(index: usize, suffix: &str) -> String {
    format!("FIELD_{index}_{suffix}")
}

/// How a table's columns are laid out under its `DATA` node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableLayout {
    /// A `DATA` group holding one dataset per column (`DATA_GROUP`).
    #[default]
    ColumnGroup,
    /// A single compound `DATA` dataset with one field per column (`TABLE`).
    Composite,
}

/// The payload shape announced by a `DATA` node's class tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataClass {
    Table(TableLayout),
    Image,
}

impl DataClass {
    /// Parse a class tag; `None` for tags this crate does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TABLE_CLASS => Some(DataClass::Table(TableLayout::Composite)),
            DATA_GROUP_CLASS => Some(DataClass::Table(TableLayout::ColumnGroup)),
            IMAGE_CLASS => Some(DataClass::Image),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            DataClass::Table(TableLayout::Composite) => TABLE_CLASS,
            DataClass::Table(TableLayout::ColumnGroup) => DATA_GROUP_CLASS,
            DataClass::Image => IMAGE_CLASS,
        }
    }
}
