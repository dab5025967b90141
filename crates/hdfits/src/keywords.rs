//! Header keyword classification.
//!
//! Only [`KeywordClass::User`] keys are persisted as group attributes. Table
//! layout keys are regenerated from the column data, basic FITS keys describe
//! the on-disk FITS structure that the container replaces, and container keys
//! are the writer's own bookkeeping.

/// Five-character prefixes of per-column table layout keywords (`TTYPEn`, ...).
pub const TABLE_KEYWORD_PREFIXES: [&str; 8] = [
    "TTYPE", "TFORM", "TUNIT", "TNULL", "TSCAL", "TZERO", "TDISP", "TBCOL",
];

/// Four-character prefix of the `TDIMn` keywords.
pub const TABLE_DIM_PREFIX: &str = "TDIM";

/// Literal table field-count keyword.
pub const TABLE_FIELD_COUNT: &str = "TFIELDS";

/// Suffix marking a key as the paired comment of another key.
pub const COMMENT_SUFFIX: &str = "_COMMENT";

/// Mandatory FITS structure keywords.
pub const BASIC_KEYWORDS: [&str; 13] = [
    "SIMPLE", "BITPIX", "NAXIS", "EXTEND", "XTENSION", "PCOUNT", "GCOUNT", "GROUPS", "END",
    "COMMENT", "HISTORY", "CHECKSUM", "DATASUM",
];

/// Container bookkeeping attributes.
pub const CONTAINER_KEYWORDS: [&str; 3] = ["CLASS", "SUBCLASS", "POSITION"];

/// The class a header key falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    /// Table layout key or a paired `_COMMENT` key.
    TableStructural,
    /// Mandatory FITS structure key.
    BasicStandard,
    /// Container class/subclass/position tag.
    ContainerReserved,
    /// Anything else; persisted as user metadata.
    User,
}

impl KeywordClass {
    /// Returns `true` for the only class written as a header attribute.
    pub fn is_user(self) -> bool {
        self == KeywordClass::User
    }
}

/// Classify a header key. Unknown keys are [`KeywordClass::User`].
pub fn classify(key: &str) -> KeywordClass {
    if is_table_keyword(key) {
        KeywordClass::TableStructural
    } else if is_basic_keyword(key) {
        KeywordClass::BasicStandard
    } else if is_container_keyword(key) {
        KeywordClass::ContainerReserved
    } else {
        KeywordClass::User
    }
}

/// Returns `true` if `key` is a container bookkeeping attribute.
pub fn is_container_keyword(key: &str) -> bool {
    CONTAINER_KEYWORDS.contains(&key)
}

fn is_table_keyword(key: &str) -> bool {
    if key.ends_with(COMMENT_SUFFIX) || key == TABLE_FIELD_COUNT {
        return true;
    }
    let prefix5 = key.get(..5).unwrap_or(key);
    let prefix4 = key.get(..4).unwrap_or(key);
    TABLE_KEYWORD_PREFIXES.contains(&prefix5) || prefix4 == TABLE_DIM_PREFIX
}

fn is_basic_keyword(key: &str) -> bool {
    BASIC_KEYWORDS.contains(&key) || is_naxis_n(key)
}

/// `NAXIS1`, `NAXIS2`, ... (bare `NAXIS` is in the literal set).
fn is_naxis_n(key: &str) -> bool {
    match key.strip_prefix("NAXIS") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
