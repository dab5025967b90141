//! HDF5 encoding of a container tree.
//!
//! Files are written with a version 3 superblock, version 2 object headers
//! and compact link and attribute storage. Datasets are contiguous unless
//! their [`Compression`] asks for filters or chunking, in which case they are
//! chunked and run through the standard shuffle and deflate filters.
//!
//! Reading accepts what the `rustyhdf5-format` parser understands, which
//! includes symbol-table groups, dense attribute storage and
//! variable-length strings written by other HDF5 libraries.
//!
//! ```text
//! Bool            <-> enum u8 { FALSE = 0, TRUE = 1 }
//! U8 I16 I32 I64  <-> little-endian fixed point
//! F32 F64         <-> little-endian IEEE floating point
//! Text            <-> fixed-length null-padded UTF-8 (variable-length on read)
//! Compound        <-> compound, one member per field; multi-dimensional
//!                     fields become array members
//! ```

use rustyhdf5_format::attribute::{extract_attributes_full, AttributeMessage};
use rustyhdf5_format::chunked_write::{build_chunked_data_at_ext, ChunkOptions};
use rustyhdf5_format::data_layout::DataLayout;
use rustyhdf5_format::data_read::{self, read_compound_fields};
use rustyhdf5_format::dataspace::{Dataspace, DataspaceType};
use rustyhdf5_format::datatype::{
    CharacterSet, Datatype, DatatypeByteOrder, EnumMember, StringPadding,
};
use rustyhdf5_format::filter_pipeline::{FilterPipeline, FILTER_DEFLATE, FILTER_SHUFFLE};
use rustyhdf5_format::group_v1::{self, GroupEntry};
use rustyhdf5_format::group_v2;
use rustyhdf5_format::link_message::{LinkMessage, LinkTarget};
use rustyhdf5_format::message_type::MessageType;
use rustyhdf5_format::object_header::{HeaderMessage, ObjectHeader};
use rustyhdf5_format::object_header_writer::ObjectHeaderWriter;
use rustyhdf5_format::signature;
use rustyhdf5_format::superblock::Superblock;
use rustyhdf5_format::symbol_table::SymbolTableMessage;
use rustyhdf5_format::type_builders::{
    make_f32_type, make_f64_type, make_i32_type, make_i64_type, make_u8_type,
    CompoundTypeBuilder, EnumTypeBuilder,
};
use rustyhdf5_format::vl_data;
use tracing::debug;

use crate::array::{ArrayData, TypedArray};
use crate::container::{
    AttrValue, Attributes, Compression, Dataset, Field, Group, Node, Payload,
};
use crate::error::{Error, Result};

const OFFSET_SIZE: u8 = 8;
const LENGTH_SIZE: u8 = 8;
const SUPERBLOCK_SIZE: u64 = 48;

/// Groups nested deeper than this are rejected on decode.
const MAX_DEPTH: usize = 32;

/// Member names of the enum type used for booleans (the h5py convention).
const BOOL_NAMES: [&str; 2] = ["FALSE", "TRUE"];

// ── Encoding ──

/// One object header to lay out, in pre-order. Index 0 is the root group.
enum Object {
    Group {
        attrs: Vec<AttributeMessage>,
        links: Vec<(String, usize)>,
    },
    Dataset {
        datatype: Datatype,
        space: Dataspace,
        raw: Vec<u8>,
        chunking: Option<ChunkOptions>,
        attrs: Vec<AttributeMessage>,
    },
}

/// A serialized object header and the data block stored after all headers.
struct Encoded {
    header: Vec<u8>,
    data: Vec<u8>,
}

/// Encode a root group as an HDF5 file.
pub fn encode(root: &Group) -> Result<Vec<u8>> {
    let mut objects = Vec::new();
    flatten(root, &mut objects)?;

    // Header sizes do not depend on the addresses written into them.
    let placeholder = vec![0u64; objects.len()];
    let sized = objects
        .iter()
        .map(|object| object.encode(&placeholder, 0))
        .collect::<Result<Vec<_>>>()?;

    let mut cursor = SUPERBLOCK_SIZE;
    let mut header_addrs = Vec::with_capacity(objects.len());
    for encoded in &sized {
        header_addrs.push(cursor);
        cursor += encoded.header.len() as u64;
    }
    let mut data_addrs = Vec::with_capacity(objects.len());
    for encoded in &sized {
        data_addrs.push(cursor);
        cursor += encoded.data.len() as u64;
    }

    let superblock = Superblock {
        version: 3,
        offset_size: OFFSET_SIZE,
        length_size: LENGTH_SIZE,
        base_address: 0,
        eof_address: cursor,
        root_group_address: SUPERBLOCK_SIZE,
        group_leaf_node_k: None,
        group_internal_node_k: None,
        indexed_storage_internal_node_k: None,
        free_space_address: None,
        driver_info_address: None,
        consistency_flags: 0,
        superblock_extension_address: Some(u64::MAX),
        checksum: None,
    };

    let mut out = superblock.serialize();
    let mut blocks = Vec::with_capacity(objects.len());
    for (object, &data_addr) in objects.iter().zip(&data_addrs) {
        let encoded = object.encode(&header_addrs, data_addr)?;
        out.extend_from_slice(&encoded.header);
        blocks.push(encoded.data);
    }
    for block in &blocks {
        out.extend_from_slice(block);
    }
    if out.len() as u64 != cursor {
        return Err(Error::Corrupt("object layout changed between passes"));
    }
    Ok(out)
}

fn flatten(group: &Group, objects: &mut Vec<Object>) -> Result<usize> {
    let index = objects.len();
    objects.push(Object::Group {
        attrs: attribute_messages(group.attrs()),
        links: Vec::new(),
    });

    let mut children = Vec::with_capacity(group.len());
    for (name, node) in group.children() {
        let child = match node {
            Node::Group(g) => flatten(g, objects)?,
            Node::Dataset(d) => {
                objects.push(dataset_object(d)?);
                objects.len() - 1
            }
        };
        children.push((name.to_string(), child));
    }

    if let Some(Object::Group { links, .. }) = objects.get_mut(index) {
        *links = children;
    }
    Ok(index)
}

fn dataset_object(dataset: &Dataset) -> Result<Object> {
    let (datatype, shape, raw) = match dataset.payload() {
        Payload::Array(arr) => {
            let (datatype, raw) = encode_elements(arr.data());
            (datatype, arr.shape().to_vec(), raw)
        }
        Payload::Compound(fields) => encode_compound(fields)?,
    };
    let dims: Vec<u64> = shape.iter().map(|&d| d as u64).collect();
    Ok(Object::Dataset {
        chunking: chunk_options(dataset.compression(), &dims),
        space: dataspace(dims),
        datatype,
        raw,
        attrs: attribute_messages(dataset.attrs()),
    })
}

impl Object {
    fn encode(&self, header_addrs: &[u64], data_addr: u64) -> Result<Encoded> {
        let mut w = ObjectHeaderWriter::new();
        let (attrs, data) = match self {
            Object::Group { attrs, links } => {
                w.add_message(MessageType::LinkInfo, link_info());
                for (name, child) in links {
                    let link = LinkMessage {
                        name: name.clone(),
                        link_target: LinkTarget::Hard {
                            object_header_address: header_addrs[*child],
                        },
                        creation_order: None,
                        charset: charset_of(name),
                    };
                    w.add_message(MessageType::Link, link.serialize(OFFSET_SIZE));
                }
                (attrs, Vec::new())
            }
            Object::Dataset {
                datatype,
                space,
                raw,
                chunking,
                attrs,
            } => {
                w.add_message_with_flags(MessageType::Datatype, datatype.serialize(), 0x01);
                w.add_message(MessageType::Dataspace, space.serialize(LENGTH_SIZE));
                w.add_message_with_flags(MessageType::FillValue, vec![3, 0x0a], 0x01);
                let data = match chunking {
                    Some(options) => {
                        let chunk_dims = options.resolve_chunk_dims(&space.dimensions);
                        let chunked = build_chunked_data_at_ext(
                            raw,
                            &space.dimensions,
                            &chunk_dims,
                            datatype.type_size() as usize,
                            options,
                            data_addr,
                            None,
                        )?;
                        w.add_message(MessageType::DataLayout, chunked.layout_message);
                        if let Some(pipeline) = chunked.pipeline_message {
                            w.add_message(MessageType::FilterPipeline, pipeline);
                        }
                        chunked.data_bytes
                    }
                    None => {
                        w.add_message(
                            MessageType::DataLayout,
                            contiguous_layout(data_addr, raw.len() as u64),
                        );
                        raw.clone()
                    }
                };
                (attrs, data)
            }
        };
        for attr in attrs {
            w.add_message(MessageType::Attribute, attr.serialize(LENGTH_SIZE));
        }
        Ok(Encoded {
            header: w.serialize(),
            data,
        })
    }
}

/// Link info for a group whose links all live in its object header.
fn link_info() -> Vec<u8> {
    let mut li = vec![0, 0];
    li.extend_from_slice(&u64::MAX.to_le_bytes());
    li.extend_from_slice(&u64::MAX.to_le_bytes());
    li
}

fn contiguous_layout(address: u64, size: u64) -> Vec<u8> {
    let mut dl = vec![4, 1];
    dl.extend_from_slice(&address.to_le_bytes());
    dl.extend_from_slice(&size.to_le_bytes());
    dl
}

fn charset_of(name: &str) -> CharacterSet {
    if name.is_ascii() {
        CharacterSet::Ascii
    } else {
        CharacterSet::Utf8
    }
}

fn dataspace(dims: Vec<u64>) -> Dataspace {
    Dataspace {
        space_type: if dims.is_empty() {
            DataspaceType::Scalar
        } else {
            DataspaceType::Simple
        },
        rank: dims.len() as u8,
        dimensions: dims,
        max_dimensions: None,
    }
}

/// Chunked storage options, or `None` for a contiguous dataset. Empty and
/// scalar datasets are always contiguous. Requested chunks of the wrong rank
/// fall back to a single chunk; oversized chunks are clipped to the shape.
fn chunk_options(compression: &Compression, dims: &[u64]) -> Option<ChunkOptions> {
    if *compression == Compression::none() || dims.is_empty() || dims.contains(&0) {
        return None;
    }
    let chunk_dims = match &compression.chunks {
        Some(chunks) if chunks.len() == dims.len() && !chunks.contains(&0) => chunks
            .iter()
            .zip(dims)
            .map(|(&c, &d)| (c as u64).min(d))
            .collect(),
        _ => dims.to_vec(),
    };
    Some(ChunkOptions {
        chunk_dims: Some(chunk_dims),
        deflate_level: compression.level.map(u32::from),
        shuffle: compression.shuffle,
        fletcher32: false,
    })
}

fn attribute_messages(attrs: &Attributes) -> Vec<AttributeMessage> {
    attrs
        .iter()
        .map(|(name, value)| {
            let (datatype, raw_data) = match value {
                AttrValue::Bool(v) => encode_bools(v),
                AttrValue::Int(v) => (make_i64_type(), le_bytes(v, |x| x.to_le_bytes())),
                AttrValue::Float(v) => (make_f64_type(), le_bytes(v, |x| x.to_le_bytes())),
                AttrValue::Text(v) => encode_text(v),
            };
            AttributeMessage {
                name: name.clone(),
                datatype,
                dataspace: dataspace(vec![value.len() as u64]),
                raw_data,
            }
        })
        .collect()
}

fn encode_elements(data: &ArrayData) -> (Datatype, Vec<u8>) {
    match data {
        ArrayData::Bool(v) => encode_bools(v),
        ArrayData::U8(v) => (make_u8_type(), v.clone()),
        ArrayData::I16(v) => (i16_type(), le_bytes(v, |x| x.to_le_bytes())),
        ArrayData::I32(v) => (make_i32_type(), le_bytes(v, |x| x.to_le_bytes())),
        ArrayData::I64(v) => (make_i64_type(), le_bytes(v, |x| x.to_le_bytes())),
        ArrayData::F32(v) => (make_f32_type(), le_bytes(v, |x| x.to_le_bytes())),
        ArrayData::F64(v) => (make_f64_type(), le_bytes(v, |x| x.to_le_bytes())),
        ArrayData::Text(v) => encode_text(v),
    }
}

fn le_bytes<T: Copy, const N: usize>(values: &[T], to_le: impl Fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|&v| to_le(v)).collect()
}

fn i16_type() -> Datatype {
    Datatype::FixedPoint {
        size: 2,
        byte_order: DatatypeByteOrder::LittleEndian,
        signed: true,
        bit_offset: 0,
        bit_precision: 16,
    }
}

fn bool_type() -> Datatype {
    EnumTypeBuilder::u8_based()
        .u8_value(BOOL_NAMES[0], 0)
        .u8_value(BOOL_NAMES[1], 1)
        .build()
}

fn encode_bools(values: &[bool]) -> (Datatype, Vec<u8>) {
    (bool_type(), values.iter().map(|&b| u8::from(b)).collect())
}

/// Fixed-length strings padded to the longest element (at least one byte).
fn encode_text(values: &[String]) -> (Datatype, Vec<u8>) {
    let width = values.iter().map(String::len).max().unwrap_or(0).max(1);
    let mut raw = Vec::with_capacity(width * values.len());
    for s in values {
        raw.extend_from_slice(s.as_bytes());
        raw.resize(raw.len() + width - s.len(), 0);
    }
    let datatype = Datatype::String {
        size: width as u32,
        padding: StringPadding::NullPad,
        charset: CharacterSet::Utf8,
    };
    (datatype, raw)
}

fn encode_compound(fields: &[Field]) -> Result<(Datatype, Vec<usize>, Vec<u8>)> {
    let rows = fields.first().map_or(0, |f| f.data.rows());
    let mut builder = CompoundTypeBuilder::new();
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        if field.data.rows() != rows {
            return Err(Error::RowCountMismatch {
                column: field.name.clone(),
                expected: rows,
                actual: field.data.rows(),
            });
        }
        let (base, raw) = encode_elements(field.data.data());
        let cell = field.data.shape().get(1..).unwrap_or_default();
        let datatype = if cell.is_empty() {
            base
        } else {
            Datatype::Array {
                base_type: Box::new(base),
                dimensions: cell.iter().map(|&d| d as u32).collect(),
            }
        };
        columns.push((datatype.type_size() as usize, raw));
        builder = builder.field(&field.name, datatype);
    }

    let datatype = builder.build();
    let mut raw = Vec::with_capacity(rows * datatype.type_size() as usize);
    for row in 0..rows {
        for (width, bytes) in &columns {
            raw.extend_from_slice(&bytes[row * width..(row + 1) * width]);
        }
    }
    Ok((datatype, vec![rows], raw))
}

// ── Decoding ──

/// Decode an HDF5 file into its root group.
pub fn decode(bytes: &[u8]) -> Result<Group> {
    let offset = signature::find_signature(bytes)?;
    let superblock = Superblock::parse(bytes, offset)?;
    let reader = Reader {
        bytes,
        offset_size: superblock.offset_size,
        length_size: superblock.length_size,
    };
    let root = reader.header(superblock.root_group_address)?;
    reader.group(&root, 0)
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset_size: u8,
    length_size: u8,
}

impl Reader<'_> {
    fn header(&self, address: u64) -> Result<ObjectHeader> {
        Ok(ObjectHeader::parse(
            self.bytes,
            address as usize,
            self.offset_size,
            self.length_size,
        )?)
    }

    fn group(&self, header: &ObjectHeader, depth: usize) -> Result<Group> {
        if depth > MAX_DEPTH {
            return Err(Error::Corrupt("groups nested too deeply"));
        }
        let mut group = Group::new();
        *group.attrs_mut() = self.attributes(header)?;
        for entry in self.entries(header)? {
            let child = self.header(entry.object_header_address)?;
            let node = if has_message(&child, MessageType::DataLayout) {
                Node::Dataset(self.dataset(&entry.name, &child)?)
            } else if is_group(&child) {
                Node::Group(self.group(&child, depth + 1)?)
            } else {
                debug!(name = %entry.name, "skipping object that is neither group nor dataset");
                continue;
            };
            group.insert(&entry.name, node)?;
        }
        Ok(group)
    }

    fn entries(&self, header: &ObjectHeader) -> Result<Vec<GroupEntry>> {
        if let Some(msg) = find_message(header, MessageType::SymbolTable) {
            let table = SymbolTableMessage::parse(&msg.data, self.offset_size)?;
            Ok(group_v1::resolve_v1_group_entries(
                self.bytes,
                &table,
                self.offset_size,
                self.length_size,
            )?)
        } else if is_group(header) {
            Ok(group_v2::resolve_v2_group_entries(
                self.bytes,
                header,
                self.offset_size,
                self.length_size,
            )?)
        } else {
            Ok(Vec::new())
        }
    }

    fn attributes(&self, header: &ObjectHeader) -> Result<Attributes> {
        let messages =
            extract_attributes_full(self.bytes, header, self.offset_size, self.length_size)?;
        let mut attrs = Attributes::new();
        for attr in messages {
            let count = attr.dataspace.num_elements() as usize;
            let value = match self.elements(&attr.datatype, &attr.raw_data, count)? {
                Some(ArrayData::Bool(v)) => AttrValue::Bool(v),
                Some(ArrayData::U8(v)) => AttrValue::Int(v.into_iter().map(i64::from).collect()),
                Some(ArrayData::I16(v)) => AttrValue::Int(v.into_iter().map(i64::from).collect()),
                Some(ArrayData::I32(v)) => AttrValue::Int(v.into_iter().map(i64::from).collect()),
                Some(ArrayData::I64(v)) => AttrValue::Int(v),
                Some(ArrayData::F32(v)) => {
                    AttrValue::Float(v.into_iter().map(f64::from).collect())
                }
                Some(ArrayData::F64(v)) => AttrValue::Float(v),
                Some(ArrayData::Text(v)) => AttrValue::Text(v),
                None => {
                    debug!(name = %attr.name, "skipping attribute with unsupported datatype");
                    continue;
                }
            };
            attrs.insert(attr.name, value);
        }
        Ok(attrs)
    }

    fn dataset(&self, name: &str, header: &ObjectHeader) -> Result<Dataset> {
        let (datatype, _) = Datatype::parse(&required(header, MessageType::Datatype)?.data)?;
        let space = Dataspace::parse(
            &required(header, MessageType::Dataspace)?.data,
            self.length_size,
        )?;
        let layout = DataLayout::parse(
            &required(header, MessageType::DataLayout)?.data,
            self.offset_size,
            self.length_size,
        )?;
        let pipeline = find_message(header, MessageType::FilterPipeline)
            .map(|msg| FilterPipeline::parse(&msg.data))
            .transpose()?;
        let raw = data_read::read_raw_data_full(
            self.bytes,
            &layout,
            &space,
            &datatype,
            pipeline.as_ref(),
            self.offset_size,
            self.length_size,
        )?;

        let shape: Vec<usize> = space.dimensions.iter().map(|&d| d as usize).collect();
        let count = space.num_elements() as usize;
        let payload = match &datatype {
            Datatype::Compound { .. } => {
                Payload::Compound(self.fields(name, &datatype, &raw, count)?)
            }
            _ => {
                let data = self
                    .elements(&datatype, &raw, count)?
                    .ok_or_else(|| unsupported(name, &datatype))?;
                Payload::Array(TypedArray::new(shape.clone(), data)?)
            }
        };

        let compression = stored_compression(&layout, pipeline.as_ref(), &shape);
        let mut dataset = Dataset::new(payload, compression);
        *dataset.attrs_mut() = self.attributes(header)?;
        Ok(dataset)
    }

    fn fields(&self, node: &str, datatype: &Datatype, raw: &[u8], rows: usize) -> Result<Vec<Field>> {
        read_compound_fields(raw, datatype)?
            .into_iter()
            .map(|field| -> Result<Field> {
                let (base, cell) = match &field.datatype {
                    Datatype::Array {
                        base_type,
                        dimensions,
                    } => (
                        &**base_type,
                        dimensions.iter().map(|&d| d as usize).collect::<Vec<_>>(),
                    ),
                    other => (other, Vec::new()),
                };
                let count = rows * cell.iter().product::<usize>();
                let data = self
                    .elements(base, &field.raw_data, count)?
                    .ok_or_else(|| unsupported(node, base))?;
                let mut shape = vec![rows];
                shape.extend(cell);
                Ok(Field {
                    name: field.name,
                    data: TypedArray::new(shape, data)?,
                })
            })
            .collect()
    }

    /// Decode `count` elements, or `None` when the datatype has no array
    /// mapping.
    fn elements(&self, datatype: &Datatype, raw: &[u8], count: usize) -> Result<Option<ArrayData>> {
        let data = match datatype {
            Datatype::FloatingPoint { size: 4, .. } => {
                ArrayData::F32(data_read::read_as_f32(raw, datatype)?)
            }
            Datatype::FloatingPoint { .. } => ArrayData::F64(data_read::read_as_f64(raw, datatype)?),
            Datatype::FixedPoint {
                signed: true,
                size: 1 | 2,
                ..
            } => ArrayData::I16(
                data_read::read_as_i64(raw, datatype)?
                    .into_iter()
                    .map(|v| v as i16)
                    .collect(),
            ),
            Datatype::FixedPoint {
                signed: true,
                size: 4,
                ..
            } => ArrayData::I32(data_read::read_as_i32(raw, datatype)?),
            Datatype::FixedPoint { signed: true, .. } => {
                ArrayData::I64(data_read::read_as_i64(raw, datatype)?)
            }
            Datatype::FixedPoint { size: 1, .. } => ArrayData::U8(
                data_read::read_as_u64(raw, datatype)?
                    .into_iter()
                    .map(|v| v as u8)
                    .collect(),
            ),
            Datatype::FixedPoint { size: 2, .. } => ArrayData::I32(
                data_read::read_as_u64(raw, datatype)?
                    .into_iter()
                    .map(|v| v as i32)
                    .collect(),
            ),
            Datatype::FixedPoint { .. } => ArrayData::I64(
                data_read::read_as_u64(raw, datatype)?
                    .into_iter()
                    .map(|v| i64::try_from(v).unwrap_or(i64::MAX))
                    .collect(),
            ),
            Datatype::String { size: 0, .. } => ArrayData::Text(vec![String::new(); count]),
            Datatype::String { .. } => ArrayData::Text(data_read::read_as_strings(raw, datatype)?),
            Datatype::VariableLength {
                is_string: true, ..
            } => ArrayData::Text(vl_data::read_vl_strings(
                self.bytes,
                raw,
                count as u64,
                self.offset_size,
                self.length_size,
            )?),
            Datatype::Enumeration {
                base_type, members, ..
            } if is_bool_enum(members) => ArrayData::Bool(
                data_read::read_as_i64(raw, base_type)?
                    .into_iter()
                    .map(|v| v != 0)
                    .collect(),
            ),
            _ => return Ok(None),
        };
        if data.len() != count {
            return Err(Error::Corrupt("element count does not match dataspace"));
        }
        Ok(Some(data))
    }
}

/// Compression settings recovered from a dataset's layout and filters. A
/// single chunk spanning the whole dataset reads as no explicit chunking.
fn stored_compression(
    layout: &DataLayout,
    pipeline: Option<&FilterPipeline>,
    shape: &[usize],
) -> Compression {
    let mut compression = Compression::none();
    if let DataLayout::Chunked {
        chunk_dimensions, ..
    } = layout
    {
        let chunks: Vec<usize> = chunk_dimensions
            .iter()
            .take(shape.len())
            .map(|&d| d as usize)
            .collect();
        if chunks != shape {
            compression.chunks = Some(chunks);
        }
    }
    for filter in pipeline.map_or(&[][..], |p| p.filters.as_slice()) {
        match filter.filter_id {
            FILTER_DEFLATE => {
                let level = filter.client_data.first().copied().unwrap_or(0).min(9);
                compression.level = Some(level as u8);
            }
            FILTER_SHUFFLE => compression.shuffle = true,
            _ => {}
        }
    }
    compression
}

fn is_bool_enum(members: &[EnumMember]) -> bool {
    members.len() == 2
        && members
            .iter()
            .all(|m| BOOL_NAMES.contains(&m.name.as_str()))
}

fn find_message(header: &ObjectHeader, kind: MessageType) -> Option<&HeaderMessage> {
    header.messages.iter().find(|m| m.msg_type == kind)
}

fn required(header: &ObjectHeader, kind: MessageType) -> Result<&HeaderMessage> {
    find_message(header, kind).ok_or(Error::Corrupt("dataset header lacks a required message"))
}

fn has_message(header: &ObjectHeader, kind: MessageType) -> bool {
    find_message(header, kind).is_some()
}

fn is_group(header: &ObjectHeader) -> bool {
    header.messages.iter().any(|m| {
        matches!(
            m.msg_type,
            MessageType::LinkInfo | MessageType::Link | MessageType::SymbolTable
        )
    })
}

fn unsupported(node: &str, datatype: &Datatype) -> Error {
    let name = match datatype {
        Datatype::FixedPoint { .. } => "fixed-point",
        Datatype::FloatingPoint { .. } => "floating-point",
        Datatype::Time { .. } => "time",
        Datatype::String { .. } => "string",
        Datatype::BitField { .. } => "bitfield",
        Datatype::Opaque { .. } => "opaque",
        Datatype::Compound { .. } => "compound",
        Datatype::Reference { .. } => "reference",
        Datatype::Enumeration { .. } => "enum",
        Datatype::VariableLength { .. } => "variable-length",
        Datatype::Array { .. } => "array",
    };
    Error::UnsupportedType {
        node: node.to_string(),
        datatype: name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::CLASS_ATTR;

    const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

    fn sample_tree(flux_compression: &Compression) -> Group {
        let mut root = Group::new();
        root.set_attr(CLASS_ATTR, AttrValue::text("HDFITS"));
        let g = root.create_group("SRC1").unwrap();
        g.set_attr("POSITION", AttrValue::int(1));
        g.set_attr("FLAGS", AttrValue::Bool(vec![true, false]));
        g.set_attr("RANGE", AttrValue::Float(vec![-1.5, 2.0]));
        g.set_attr("EMPTY_COMMENT", AttrValue::text(""));
        let data = g.create_group("DATA").unwrap();
        data.create_dataset(
            "FLUX",
            Payload::Array(vec![1.0f64, 2.0, 3.0].into()),
            flux_compression,
        )
        .unwrap()
        .set_attr("UNITS", AttrValue::text("Jy"));
        data.create_dataset(
            "NAME",
            Payload::Array(vec![String::from("a"), String::from("")].into()),
            &Compression::none(),
        )
        .unwrap();
        g.create_dataset(
            "IMG",
            Payload::Array(TypedArray::from_shape_vec(vec![2, 2], vec![1i16, -2, 3, 4]).unwrap()),
            &Compression::none(),
        )
        .unwrap();
        g.create_dataset(
            "TBL",
            Payload::Compound(vec![
                Field {
                    name: "X".into(),
                    data: vec![1i32, 2].into(),
                },
                Field {
                    name: "OK".into(),
                    data: vec![true, false].into(),
                },
                Field {
                    name: "LABEL".into(),
                    data: vec![String::from("north"), String::from("s")].into(),
                },
                Field {
                    name: "VEC".into(),
                    data: TypedArray::from_shape_vec(vec![2, 3], vec![0.5f32; 6]).unwrap(),
                },
            ]),
            &Compression::none(),
        )
        .unwrap();
        root
    }

    #[test]
    fn round_trip_uncompressed() {
        let tree = sample_tree(&Compression::none());
        let bytes = encode(&tree).unwrap();
        assert_eq!(&bytes[..8], &HDF5_SIGNATURE);
        assert_eq!(decode(&bytes).unwrap(), tree);
    }

    #[test]
    fn round_trip_deflate_shuffle_chunks() {
        let options = Compression::deflate(6).with_shuffle().with_chunks(vec![2]);
        let tree = sample_tree(&options);
        let decoded = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(decoded, tree);
        let data = decoded.group("SRC1").unwrap().group("DATA").unwrap();
        assert_eq!(data.dataset("FLUX").unwrap().compression(), &options);
    }

    #[test]
    fn whole_dataset_chunk_reads_as_unchunked() {
        let mut root = Group::new();
        root.create_dataset(
            "Z",
            Payload::Array(vec![7i64; 10].into()),
            &Compression::deflate(3).with_chunks(vec![64]),
        )
        .unwrap();
        let decoded = decode(&encode(&root).unwrap()).unwrap();
        assert_eq!(
            decoded.dataset("Z").unwrap().compression(),
            &Compression::deflate(3)
        );
    }

    #[test]
    fn deflate_shrinks_repetitive_data() {
        let mut plain = Group::new();
        plain
            .create_dataset("Z", Payload::Array(vec![0f64; 4096].into()), &Compression::none())
            .unwrap();
        let mut packed = Group::new();
        packed
            .create_dataset(
                "Z",
                Payload::Array(vec![0f64; 4096].into()),
                &Compression::deflate(9).with_shuffle(),
            )
            .unwrap();
        let packed_len = encode(&packed).unwrap().len();
        let plain_len = encode(&plain).unwrap().len();
        assert!(packed_len < plain_len / 10, "{packed_len} vs {plain_len}");
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = encode(&Group::new()).unwrap();
        bytes[1] = b'X';
        assert!(matches!(decode(&bytes), Err(Error::Format(_))));
    }

    #[test]
    fn truncation_is_an_error_not_a_panic() {
        let bytes = encode(&sample_tree(&Compression::none())).unwrap();
        for cut in [0, 5, 30, bytes.len() - 1] {
            assert!(decode(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn empty_arrays_round_trip() {
        let mut root = Group::new();
        root.create_dataset(
            "E",
            Payload::Array(Vec::<f32>::new().into()),
            &Compression::none(),
        )
        .unwrap();
        root.create_dataset(
            "T",
            Payload::Array(Vec::<String>::new().into()),
            &Compression::none(),
        )
        .unwrap();
        assert_eq!(decode(&encode(&root).unwrap()).unwrap(), root);
    }

    #[test]
    fn empty_dataset_ignores_compression() {
        let mut root = Group::new();
        root.create_dataset(
            "E",
            Payload::Array(Vec::<i32>::new().into()),
            &Compression::deflate(4),
        )
        .unwrap();
        let decoded = decode(&encode(&root).unwrap()).unwrap();
        let e = decoded.dataset("E").unwrap();
        assert_eq!(e.array().unwrap().len(), 0);
        assert_eq!(e.compression(), &Compression::none());
    }

    #[test]
    fn readable_by_rustyhdf5() {
        let tree = sample_tree(&Compression::deflate(4).with_shuffle());
        let file = rustyhdf5::File::from_bytes(encode(&tree).unwrap()).unwrap();

        let root_attrs = file.root().attrs().unwrap();
        assert!(matches!(
            root_attrs.get(CLASS_ATTR),
            Some(rustyhdf5::AttrValue::String(s)) if s == "HDFITS"
        ));
        let unit_attrs = file.group("SRC1").unwrap().attrs().unwrap();
        assert!(matches!(unit_attrs.get("POSITION"), Some(rustyhdf5::AttrValue::I64(1))));

        let flux = file.dataset("SRC1/DATA/FLUX").unwrap();
        assert_eq!(flux.read_f64().unwrap(), vec![1.0, 2.0, 3.0]);
        let names = file.dataset("SRC1/DATA/NAME").unwrap();
        assert_eq!(names.read_string().unwrap(), vec!["a", ""]);
        let img = file.dataset("SRC1/IMG").unwrap();
        assert_eq!(img.shape().unwrap(), vec![2, 2]);
        assert_eq!(img.read_i32().unwrap(), vec![1, -2, 3, 4]);

        let mut groups = file.group("SRC1").unwrap().groups().unwrap();
        groups.sort();
        assert_eq!(groups, vec!["DATA"]);
    }

    #[test]
    fn reads_rustyhdf5_builder_output() {
        let mut builder = rustyhdf5::FileBuilder::new();
        builder.set_attr("TAGS", rustyhdf5::AttrValue::StringArray(vec!["a".into(), "b".into()]));
        builder.set_attr("SCALE", rustyhdf5::AttrValue::F64(0.5));
        let counts: Vec<i32> = (0..100).collect();
        let mut g = builder.create_group("SRC1");
        g.create_dataset("COUNTS")
            .with_i32_data(&counts)
            .with_chunks(&[25])
            .with_deflate(6);
        g.set_attr("POSITION", rustyhdf5::AttrValue::I64Array(vec![3]));
        builder.add_group(g.finish());
        let rows = rustyhdf5::CompoundTypeBuilder::new()
            .f64_field("RA")
            .i32_field("ID")
            .build();
        let mut raw = Vec::new();
        for (ra, id) in [(10.5f64, 1i32), (11.0, 2)] {
            raw.extend_from_slice(&ra.to_le_bytes());
            raw.extend_from_slice(&id.to_le_bytes());
        }
        builder.create_dataset("ROWS").with_compound_data(rows, raw, 2);

        let root = decode(&builder.finish().unwrap()).unwrap();
        assert_eq!(
            root.attr("TAGS"),
            Some(&AttrValue::Text(vec!["a".into(), "b".into()]))
        );
        assert_eq!(root.attr("SCALE"), Some(&AttrValue::float(0.5)));

        let g = root.group("SRC1").unwrap();
        assert_eq!(g.attr("POSITION"), Some(&AttrValue::int(3)));
        let stored = g.dataset("COUNTS").unwrap();
        assert_eq!(stored.array().unwrap().as_slice::<i32>(), Some(counts.as_slice()));
        assert_eq!(
            stored.compression(),
            &Compression::deflate(6).with_chunks(vec![25])
        );

        let rows = root.dataset("ROWS").unwrap().payload();
        assert_eq!(rows.num_fields(), 2);
        assert_eq!(
            rows.field("RA").unwrap().data.as_slice::<f64>().unwrap(),
            &[10.5, 11.0]
        );
        assert_eq!(rows.field("ID").unwrap().data.as_slice::<i32>().unwrap(), &[1, 2]);
    }
}
