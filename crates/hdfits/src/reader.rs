//! Rebuild a [`UnitList`] from a container.
//!
//! Reading is best effort: a foreign root tag, missing or duplicate position
//! tags and unknown data classes are reported as [`ReadWarning`]s and the
//! read continues. Only a missing attribute that identifies a column aborts
//! the read, since the column could not be named otherwise.

use std::fmt;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::container::{AttrValue, Dataset, File, Group, Node};
use crate::error::{Error, Result};
use crate::idi::{Column, Header, Table, Unit, UnitData, UnitList};
use crate::keywords::is_container_keyword;
use crate::layout::{
    field_attr, DataClass, TableLayout, CLASS_ATTR, COLUMN_ID_ATTR, COMMENT_NODE, DATA_NODE,
    FIELD_NAME, FIELD_UNITS, FORMAT_CLASS, HISTORY_NODE, POSITION_ATTR, UNITS_ATTR,
};
use crate::options::ReadOptions;
use crate::value::Value;

/// A recoverable irregularity found while reading.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadWarning {
    /// The root class tag is absent or is not `HDFITS`.
    FormatMismatch { found: Option<String> },
    /// A unit group carries no usable `POSITION`.
    MissingPosition { group: String },
    /// Several unit groups share one position. All are kept.
    DuplicatePosition { position: i64, groups: Vec<String> },
    /// A top-level node that is not a group.
    UnexpectedNode { name: String },
    /// A `DATA` node whose class tag is unknown or absent.
    UnrecognizedDataClass { unit: String, class: Option<String> },
    /// Several columns of one table share a `COLUMN_ID`.
    DuplicateColumnId { unit: String, id: i64 },
}

impl fmt::Display for ReadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadWarning::FormatMismatch { found: Some(class) } => {
                write!(f, "root class is {class:?}, expected {FORMAT_CLASS:?}")
            }
            ReadWarning::FormatMismatch { found: None } => {
                write!(f, "root has no class tag, expected {FORMAT_CLASS:?}")
            }
            ReadWarning::MissingPosition { group } => {
                write!(f, "{group}: no position tag, appended after ordered units")
            }
            ReadWarning::DuplicatePosition { position, groups } => {
                write!(f, "position {position} is shared by {}", groups.join(", "))
            }
            ReadWarning::UnexpectedNode { name } => {
                write!(f, "{name}: top-level node is not a group, skipped")
            }
            ReadWarning::UnrecognizedDataClass { unit, class } => match class {
                Some(class) => write!(f, "{unit}: unknown data class {class:?}, data skipped"),
                None => write!(f, "{unit}: data node has no class tag, data skipped"),
            },
            ReadWarning::DuplicateColumnId { unit, id } => {
                write!(f, "{unit}: column id {id} is used more than once")
            }
        }
    }
}

/// Units rebuilt from a container, with the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOutcome {
    /// Units in write order.
    pub units: UnitList,
    /// Irregularities in the order they were found. Each was also logged.
    pub warnings: Vec<ReadWarning>,
}

impl ReadOutcome {
    fn warn(&mut self, warning: ReadWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Read the container at `path` into a unit list.
///
/// Warnings are logged through `tracing`; use [`read_container`] to
/// inspect them.
pub fn read_hdf<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<UnitList> {
    let file = File::open(path)?;
    let outcome = read_container(&file, options);
    file.close()?;
    Ok(outcome?.units)
}

/// Rebuild the units stored in an open container.
pub fn read_container(file: &File, options: &ReadOptions) -> Result<ReadOutcome> {
    let root = file.root();
    let mut outcome = ReadOutcome::default();

    check_format(root, options, &mut outcome)?;

    for (name, group) in unit_order(root, &mut outcome) {
        debug!(unit = name, "reading unit");
        let unit = read_unit(name, group, &mut outcome)?;
        outcome.units.push(unit)?;
    }
    Ok(outcome)
}

fn check_format(root: &Group, options: &ReadOptions, outcome: &mut ReadOutcome) -> Result<()> {
    let matches = match root.attr(CLASS_ATTR) {
        Some(AttrValue::Text(tags)) => tags.iter().any(|t| t == FORMAT_CLASS),
        _ => false,
    };
    if matches {
        return Ok(());
    }
    let found = root.attr(CLASS_ATTR).map(|class| match class {
        AttrValue::Text(tags) => tags.first().cloned().unwrap_or_default(),
        other => format!("{other:?}"),
    });
    if options.require_format {
        return Err(Error::FormatMismatch { found });
    }
    outcome.warn(ReadWarning::FormatMismatch { found });
    Ok(())
}

/// Unit groups in write order: ascending `(position, name)`, then groups
/// without a position in listing order.
fn unit_order<'a>(root: &'a Group, outcome: &mut ReadOutcome) -> Vec<(&'a str, &'a Group)> {
    let mut positioned = Vec::new();
    let mut unpositioned = Vec::new();

    for (name, node) in root.children() {
        let group = match node {
            Node::Group(g) => g,
            Node::Dataset(_) => {
                outcome.warn(ReadWarning::UnexpectedNode {
                    name: name.to_string(),
                });
                continue;
            }
        };
        match group.attr(POSITION_ATTR).and_then(|a| a.first_int()) {
            Some(position) => positioned.push((position, name, group)),
            None => {
                outcome.warn(ReadWarning::MissingPosition {
                    group: name.to_string(),
                });
                unpositioned.push((name, group));
            }
        }
    }

    positioned.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    for run in positioned.chunk_by(|a, b| a.0 == b.0) {
        if run.len() > 1 {
            outcome.warn(ReadWarning::DuplicatePosition {
                position: run[0].0,
                groups: run.iter().map(|(_, n, _)| n.to_string()).collect(),
            });
        }
    }

    positioned
        .into_iter()
        .map(|(_, name, group)| (name, group))
        .chain(unpositioned)
        .collect()
}

fn read_unit(name: &str, group: &Group, outcome: &mut ReadOutcome) -> Result<Unit> {
    let data = match group.get(DATA_NODE) {
        None => UnitData::Primary,
        Some(node) => read_data(name, node, outcome)?,
    };
    Ok(Unit {
        name: name.to_string(),
        header: read_header(group),
        comment: read_text(group, COMMENT_NODE),
        history: read_text(group, HISTORY_NODE),
        data,
    })
}

/// Every attribute that is not container bookkeeping, as a header entry.
pub fn read_header(group: &Group) -> Header {
    group
        .attrs()
        .iter()
        .filter(|(key, _)| !is_container_keyword(key))
        .filter_map(|(key, attr)| {
            let value = Value::from_attr(attr);
            if value.is_none() {
                trace!(key = key.as_str(), "skipping empty attribute");
            }
            value.map(|v| (key.as_str(), v))
        })
        .collect()
}

fn read_text(group: &Group, name: &str) -> Option<Vec<String>> {
    group
        .dataset(name)
        .and_then(Dataset::array)
        .and_then(|arr| arr.as_slice::<String>())
        .map(<[String]>::to_vec)
}

fn read_data(unit: &str, node: &Node, outcome: &mut ReadOutcome) -> Result<UnitData> {
    let class = node.class();
    let data = match (class.and_then(DataClass::from_tag), node) {
        (Some(DataClass::Table(TableLayout::ColumnGroup)), Node::Group(g)) => {
            UnitData::Table(read_column_group(unit, g, outcome)?)
        }
        (Some(DataClass::Table(TableLayout::Composite)), Node::Dataset(d)) => {
            UnitData::Table(read_composite(unit, d)?)
        }
        (Some(DataClass::Image), Node::Dataset(d)) => match d.array() {
            Some(arr) => UnitData::Image(arr.clone()),
            None => return Err(Error::InvalidImage("image dataset is compound")),
        },
        _ => {
            outcome.warn(ReadWarning::UnrecognizedDataClass {
                unit: unit.to_string(),
                class: class.map(str::to_string),
            });
            UnitData::Primary
        }
    };
    Ok(data)
}

fn missing(node: String, attribute: String) -> Error {
    Error::MissingAttribute { node, attribute }
}

fn units_of(attr: Option<&AttrValue>) -> Option<String> {
    attr.and_then(|a| a.first_text())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// A compound `TABLE` dataset; columns follow field index order.
fn read_composite(unit: &str, dset: &Dataset) -> Result<Table> {
    let mut table = Table::new();
    for i in 0..dset.payload().num_fields() {
        let name_attr = field_attr(i, FIELD_NAME);
        let name = dset
            .attr(&name_attr)
            .and_then(|a| a.first_text())
            .ok_or_else(|| missing(format!("{unit}/{DATA_NODE}"), name_attr.clone()))?;
        let field = dset.payload().field(name).ok_or_else(|| Error::MissingField {
            unit: unit.to_string(),
            field: name.to_string(),
        })?;
        debug!(unit, column = name, "reading field");
        let column = Column {
            name: name.to_string(),
            data: field.data.clone(),
            unit: units_of(dset.attr(&field_attr(i, FIELD_UNITS))),
        };
        table.add_column(column)?;
    }
    Ok(table)
}

/// A `DATA_GROUP`; columns follow ascending `(COLUMN_ID, name)`.
fn read_column_group(unit: &str, data: &Group, outcome: &mut ReadOutcome) -> Result<Table> {
    let mut columns: Vec<(i64, &str, &Dataset)> = Vec::new();
    for (name, node) in data.children() {
        let Node::Dataset(dset) = node else {
            trace!(unit, name, "skipping non-dataset child of data group");
            continue;
        };
        let id = dset
            .attr(COLUMN_ID_ATTR)
            .and_then(|a| a.first_int())
            .ok_or_else(|| {
                missing(
                    format!("{unit}/{DATA_NODE}/{name}"),
                    COLUMN_ID_ATTR.to_string(),
                )
            })?;
        columns.push((id, name, dset));
    }

    columns.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    for run in columns.chunk_by(|a, b| a.0 == b.0) {
        if run.len() > 1 {
            outcome.warn(ReadWarning::DuplicateColumnId {
                unit: unit.to_string(),
                id: run[0].0,
            });
        }
    }

    let mut table = Table::new();
    for (_, name, dset) in columns {
        let Some(array) = dset.array() else {
            return Err(Error::MissingField {
                unit: unit.to_string(),
                field: name.to_string(),
            });
        };
        debug!(unit, column = name, "reading column");
        table.add_column(Column {
            name: name.to_string(),
            data: array.clone(),
            unit: units_of(dset.attr(UNITS_ATTR)),
        })?;
    }
    Ok(table)
}
