//! In-memory data units: an ordered list of named header/data units.

use std::collections::BTreeMap;

use crate::array::TypedArray;
use crate::error::{Error, Result};
use crate::keywords::COMMENT_SUFFIX;
use crate::value::Value;

/// Header key/value pairs of one unit.
///
/// A key's comment is stored as an ordinary string entry under
/// `<KEY>_COMMENT`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    entries: BTreeMap<String, Value>,
}

impl Header {
    pub fn new() -> Self {
        Header::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.to_string(), value.into())
    }

    /// Set `key` together with its paired comment.
    pub fn insert_with_comment(&mut self, key: &str, value: impl Into<Value>, comment: &str) {
        self.insert(key, value);
        self.insert(&comment_key(key), comment);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The paired comment of `key`, if one is stored as a string.
    pub fn comment_for(&self, key: &str) -> Option<&str> {
        self.entries.get(&comment_key(key)).and_then(Value::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Header {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Header {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The key under which `key`'s comment is stored.
pub fn comment_key(key: &str) -> String {
    format!("{key}{COMMENT_SUFFIX}")
}

/// One named table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: TypedArray,
    /// Physical unit, e.g. `"Jy"`.
    pub unit: Option<String>,
}

impl Column {
    pub fn new(name: &str, data: impl Into<TypedArray>) -> Self {
        Column {
            name: name.to_string(),
            data: data.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// The unit, treating an empty string as absent.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref().filter(|u| !u.is_empty())
    }

    /// Length of the row axis.
    pub fn num_rows(&self) -> usize {
        self.data.rows()
    }
}

/// Ordered, name-unique columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Append a column. Fails if the name is already taken.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(Error::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Rows of the first column (0 for a table without columns).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::num_rows).unwrap_or(0)
    }
}

/// The payload of a unit.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitData {
    /// No data; header only.
    Primary,
    Table(Table),
    Image(TypedArray),
}

/// One named header/data unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: String,
    pub header: Header,
    pub comment: Option<Vec<String>>,
    pub history: Option<Vec<String>>,
    pub data: UnitData,
}

impl Unit {
    fn with_data(name: &str, data: UnitData) -> Self {
        Unit {
            name: name.to_string(),
            header: Header::new(),
            comment: None,
            history: None,
            data,
        }
    }

    pub fn primary(name: &str) -> Self {
        Unit::with_data(name, UnitData::Primary)
    }

    pub fn table(name: &str, table: Table) -> Self {
        Unit::with_data(name, UnitData::Table(table))
    }

    pub fn image(name: &str, data: TypedArray) -> Self {
        Unit::with_data(name, UnitData::Image(data))
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn with_comment(mut self, lines: Vec<String>) -> Self {
        self.comment = Some(lines);
        self
    }

    pub fn with_history(mut self, lines: Vec<String>) -> Self {
        self.history = Some(lines);
        self
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.data {
            UnitData::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&TypedArray> {
        match &self.data {
            UnitData::Image(arr) => Some(arr),
            _ => None,
        }
    }

    /// `"Primary"`, `"Table"` or `"Image"`.
    pub fn kind(&self) -> &'static str {
        match self.data {
            UnitData::Primary => "Primary",
            UnitData::Table(_) => "Table",
            UnitData::Image(_) => "Image",
        }
    }
}

/// An ordered list of units with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitList {
    units: Vec<Unit>,
}

impl UnitList {
    pub fn new() -> Self {
        UnitList::default()
    }

    /// Append a unit. Fails if the name is already taken.
    pub fn push(&mut self, unit: Unit) -> Result<()> {
        if self.get(&unit.name).is_some() {
            return Err(Error::DuplicateUnit(unit.name));
        }
        self.units.push(unit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.name == name)
    }

    /// Units in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<'a> IntoIterator for &'a UnitList {
    type Item = &'a Unit;
    type IntoIter = std::slice::Iter<'a, Unit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_comment_pairing() {
        let mut h = Header::new();
        h.insert_with_comment("OBSERVER", "Smith", "who observed");
        h.insert("TELESCOP", "VLA");
        assert_eq!(h.comment_for("OBSERVER"), Some("who observed"));
        assert_eq!(h.comment_for("TELESCOP"), None);
        assert_eq!(h.get("OBSERVER_COMMENT"), Some(&Value::from("who observed")));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn header_keys_are_unique() {
        let mut h = Header::new();
        assert_eq!(h.insert("A", 1i64), None);
        assert_eq!(h.insert("A", 2i64), Some(Value::Integer(1)));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn header_from_iter() {
        let h: Header = [("B", 2i64), ("A", 1i64)].into_iter().collect();
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_column_rejected() {
        let mut t = Table::new();
        t.add_column(Column::new("FLUX", vec![1.0f64])).unwrap();
        let err = t.add_column(Column::new("FLUX", vec![2.0f64])).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(ref n) if n == "FLUX"));
        assert_eq!(t.num_columns(), 1);
    }

    #[test]
    fn column_order_is_insertion_order() {
        let mut t = Table::new();
        t.add_column(Column::new("Z", vec![1i32, 2])).unwrap();
        t.add_column(Column::new("A", vec![3i32, 4])).unwrap();
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["Z", "A"]);
        assert_eq!(t.num_rows(), 2);
    }

    #[test]
    fn empty_unit_string_is_absent() {
        let c = Column::new("X", vec![1u8]).with_unit("");
        assert_eq!(c.unit(), None);
        let c = Column::new("X", vec![1u8]).with_unit("m");
        assert_eq!(c.unit(), Some("m"));
    }

    #[test]
    fn duplicate_unit_rejected() {
        let mut list = UnitList::new();
        list.push(Unit::primary("PRIMARY")).unwrap();
        assert!(matches!(
            list.push(Unit::primary("PRIMARY")),
            Err(Error::DuplicateUnit(_))
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unit_accessors() {
        let img = Unit::image("IMG", vec![1.0f32, 2.0].into());
        assert_eq!(img.kind(), "Image");
        assert!(img.as_image().is_some());
        assert!(img.as_table().is_none());
        assert_eq!(Unit::primary("P").kind(), "Primary");
    }
}
