//! Export a [`UnitList`] into a container.
//!
//! Each unit becomes a group tagged with its 1-based position, because the
//! container lists children by name. Tables are laid out per
//! [`TableLayout`], images as a single dataset, and user header keys as
//! one-element group attributes with a paired `_COMMENT` attribute.

use std::path::Path;

use tracing::{debug, error, trace};

use crate::array::{ArrayData, TypedArray};
use crate::container::{AttrValue, Compression, Field, File, Group, Payload};
use crate::error::{Error, Result};
use crate::idi::{comment_key, Column, Header, Table, Unit, UnitData, UnitList};
use crate::keywords::classify;
use crate::layout::{
    field_attr, TableLayout, CLASS_ATTR, COLUMN_CLASS, COLUMN_ID_ATTR, COMMENT_NODE,
    DATA_GROUP_CLASS, DATA_NODE, FIELD_FILL, FIELD_NAME, FIELD_UNITS, FORMAT_CLASS, HDU_CLASS,
    HISTORY_NODE, IMAGE_CLASS, IMAGE_GRAYSCALE, IMAGE_MINMAXRANGE_ATTR, IMAGE_SUBCLASS_ATTR,
    IMAGE_VERSION, IMAGE_VERSION_ATTR, NROWS_ATTR, POSITION_ATTR, TABLE_CLASS, TABLE_VERSION,
    TITLE_ATTR, UNITS_ATTR, VERSION_ATTR,
};
use crate::options::WriteOptions;

/// Write `units` to a new container file at `path`, replacing any existing file.
///
/// The file is closed on both success and failure. A failed export leaves
/// the partially written file in place.
pub fn export_hdf<P: AsRef<Path>>(units: &UnitList, path: P, options: &WriteOptions) -> Result<()> {
    let mut file = File::create(path).overwrite().open()?;
    let written = write_container(units, &mut file, options);
    let closed = file.close();
    written?;
    closed
}

/// Write `units` into the root of an open container.
///
/// Any failure is reported as [`Error::Write`] naming the unit, and the
/// column when a column caused it.
pub fn write_container(units: &UnitList, file: &mut File, options: &WriteOptions) -> Result<()> {
    let root = file.root_mut();
    root.set_attr(CLASS_ATTR, AttrValue::text(FORMAT_CLASS));

    for (index, unit) in units.iter().enumerate() {
        let position = index as i64 + 1;
        debug!(unit = %unit.name, position, kind = unit.kind(), "creating unit group");
        write_unit(root, unit, position, options).map_err(|e| {
            let e = match e {
                Error::Write { .. } => e,
                other => Error::Write {
                    unit: unit.name.clone(),
                    column: None,
                    source: Box::new(other),
                },
            };
            error!("{e}");
            e
        })?;
    }
    Ok(())
}

fn write_unit(root: &mut Group, unit: &Unit, position: i64, options: &WriteOptions) -> Result<()> {
    let group = root.create_group(&unit.name)?;
    group.set_attr(CLASS_ATTR, AttrValue::text(HDU_CLASS));
    group.set_attr(POSITION_ATTR, AttrValue::int(position));

    match &unit.data {
        UnitData::Table(table) => match options.table_layout {
            TableLayout::ColumnGroup => {
                write_column_group(group, &unit.name, table, &options.compression)?
            }
            TableLayout::Composite => {
                write_composite(group, &unit.name, table, &options.compression)?
            }
        },
        UnitData::Image(data) => write_image(group, data, &options.compression)?,
        UnitData::Primary => {}
    }

    write_headers(group, &unit.header);

    if let Some(lines) = unit.comment.as_ref().filter(|l| !l.is_empty()) {
        write_text(group, COMMENT_NODE, lines)?;
    }
    if let Some(lines) = unit.history.as_ref().filter(|l| !l.is_empty()) {
        write_text(group, HISTORY_NODE, lines)?;
    }
    Ok(())
}

/// Copy user header keys onto `group`. Structural, basic and container keys
/// are never persisted.
pub fn write_headers(group: &mut Group, header: &Header) {
    for (key, value) in header.iter() {
        let class = classify(key);
        if !class.is_user() {
            trace!(key, ?class, "skipping reserved header key");
            continue;
        }
        let comment = header.comment_for(key).unwrap_or("");
        trace!(key, %value, "adding header");
        group.set_attr(key, value.to_attr());
        group.set_attr(&comment_key(key), AttrValue::text(comment));
    }
}

fn write_text(group: &mut Group, name: &str, lines: &[String]) -> Result<()> {
    group.create_dataset(
        name,
        Payload::Array(lines.to_vec().into()),
        &Compression::none(),
    )?;
    Ok(())
}

fn column_failure(unit: &str, column: &Column, source: Error) -> Error {
    Error::Write {
        unit: unit.to_string(),
        column: Some(column.name.clone()),
        source: Box::new(source),
    }
}

fn write_column_group(
    group: &mut Group,
    unit: &str,
    table: &Table,
    compression: &Compression,
) -> Result<()> {
    let data = group.create_group(DATA_NODE)?;
    data.set_attr(CLASS_ATTR, AttrValue::text(DATA_GROUP_CLASS));

    for (id, column) in table.columns().iter().enumerate() {
        debug!(unit, column = %column.name, "adding column");
        write_column(data, id, column, compression)
            .map_err(|e| column_failure(unit, column, e))?;
    }
    Ok(())
}

fn write_column(
    data: &mut Group,
    id: usize,
    column: &Column,
    compression: &Compression,
) -> Result<()> {
    let dset = data.create_dataset(
        &column.name,
        Payload::Array(column.data.clone()),
        compression,
    )?;
    dset.set_attr(CLASS_ATTR, AttrValue::text(COLUMN_CLASS));
    dset.set_attr(COLUMN_ID_ATTR, AttrValue::int(id as i64));
    if let Some(unit) = column.unit() {
        dset.set_attr(UNITS_ATTR, AttrValue::text(unit));
    }
    Ok(())
}

fn write_composite(
    group: &mut Group,
    unit: &str,
    table: &Table,
    compression: &Compression,
) -> Result<()> {
    let rows = table.num_rows();
    let mut fields = Vec::with_capacity(table.num_columns());
    for column in table.columns() {
        if column.num_rows() != rows {
            let mismatch = Error::RowCountMismatch {
                column: column.name.clone(),
                expected: rows,
                actual: column.num_rows(),
            };
            return Err(column_failure(unit, column, mismatch));
        }
        fields.push(Field {
            name: column.name.clone(),
            data: column.data.clone(),
        });
    }

    let dset = group.create_dataset(DATA_NODE, Payload::Compound(fields), compression)?;
    dset.set_attr(CLASS_ATTR, AttrValue::text(TABLE_CLASS));
    for (i, column) in table.columns().iter().enumerate() {
        let fill = if column.data.data().is_text() {
            AttrValue::text("")
        } else {
            AttrValue::int(0)
        };
        dset.set_attr(&field_attr(i, FIELD_FILL), fill);
        dset.set_attr(&field_attr(i, FIELD_NAME), AttrValue::text(&column.name));
        dset.set_attr(
            &field_attr(i, FIELD_UNITS),
            AttrValue::text(column.unit().unwrap_or("")),
        );
    }
    dset.set_attr(NROWS_ATTR, AttrValue::int(rows as i64));
    dset.set_attr(VERSION_ATTR, AttrValue::float(TABLE_VERSION));
    dset.set_attr(TITLE_ATTR, AttrValue::text(unit));
    Ok(())
}

fn write_image(group: &mut Group, data: &TypedArray, compression: &Compression) -> Result<()> {
    if data.data().is_text() {
        return Err(Error::InvalidImage("image data must be numeric"));
    }
    let dset = group.create_dataset(DATA_NODE, Payload::Array(data.clone()), compression)?;
    dset.set_attr(CLASS_ATTR, AttrValue::text(IMAGE_CLASS));
    dset.set_attr(IMAGE_VERSION_ATTR, AttrValue::text(IMAGE_VERSION));
    if data.ndim() == 2 {
        dset.set_attr(IMAGE_SUBCLASS_ATTR, AttrValue::text(IMAGE_GRAYSCALE));
        match min_max(data.data()) {
            Some(range) => dset.set_attr(IMAGE_MINMAXRANGE_ATTR, range),
            None => debug!("image has no finite values; omitting range"),
        }
    }
    Ok(())
}

/// `[min, max]` over all elements, typed like the array (integers stay
/// integers). NaNs are ignored; `None` when nothing remains.
pub fn min_max(data: &ArrayData) -> Option<AttrValue> {
    match data {
        ArrayData::Bool(v) => int_range(v),
        ArrayData::U8(v) => int_range(v),
        ArrayData::I16(v) => int_range(v),
        ArrayData::I32(v) => int_range(v),
        ArrayData::I64(v) => int_range(v),
        ArrayData::F32(v) => float_range(v),
        ArrayData::F64(v) => float_range(v),
        ArrayData::Text(_) => None,
    }
}

fn int_range<T: Copy + Ord + Into<i64>>(values: &[T]) -> Option<AttrValue> {
    let min = values.iter().copied().min()?;
    let max = values.iter().copied().max()?;
    Some(AttrValue::Int(vec![min.into(), max.into()]))
}

/// NaN propagates: one NaN pixel makes both ends NaN.
fn float_range<T: Copy + Into<f64>>(values: &[T]) -> Option<AttrValue> {
    let mut iter = values.iter().map(|&x| x.into());
    let first: f64 = iter.next()?;
    let (min, max) = iter.fold((first, first), |(lo, hi), x: f64| {
        if lo.is_nan() || x.is_nan() {
            (f64::NAN, f64::NAN)
        } else {
            (lo.min(x), hi.max(x))
        }
    });
    Some(AttrValue::Float(vec![min, max]))
}
