//! A hierarchical container of groups, typed attributes and datasets,
//! stored on disk as HDF5.
//!
//! Children of a group are listed in name order, never in creation order.
//! Anything that needs a stable order (units, columns) must carry it in an
//! attribute.

pub mod hdf5;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::array::TypedArray;
use crate::error::{Error, Result};

/// Name of the class attribute carried by groups and data nodes.
pub const CLASS_ATTR: &str = "CLASS";

/// An attribute value: always an array, possibly of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl AttrValue {
    /// A one-element text attribute.
    pub fn text(s: &str) -> Self {
        AttrValue::Text(vec![s.to_string()])
    }

    /// A one-element integer attribute.
    pub fn int(n: i64) -> Self {
        AttrValue::Int(vec![n])
    }

    /// A one-element float attribute.
    pub fn float(f: f64) -> Self {
        AttrValue::Float(vec![f])
    }

    pub fn len(&self) -> usize {
        match self {
            AttrValue::Bool(v) => v.len(),
            AttrValue::Int(v) => v.len(),
            AttrValue::Float(v) => v.len(),
            AttrValue::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first element, if this is a non-empty text attribute.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => v.first().map(String::as_str),
            _ => None,
        }
    }

    /// The first element as an integer. Integral floats are accepted.
    pub fn first_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => v.first().copied(),
            AttrValue::Float(v) => v
                .first()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| *f as i64),
            _ => None,
        }
    }
}

/// Attributes of a node, keyed by name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Dataset creation options, stored with the dataset and applied when the
/// container is encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compression {
    /// Deflate level (0..=9); `None` stores data uncompressed.
    pub level: Option<u8>,
    /// Apply the HDF5 shuffle filter before deflating.
    pub shuffle: bool,
    /// Chunk shape. Clipped to the dataset shape; a rank mismatch falls back
    /// to one chunk covering the whole dataset.
    pub chunks: Option<Vec<usize>>,
}

impl Compression {
    /// No compression.
    pub fn none() -> Self {
        Compression::default()
    }

    /// Deflate at the given level.
    pub fn deflate(level: u8) -> Self {
        Compression {
            level: Some(level.min(9)),
            ..Compression::default()
        }
    }

    pub fn with_shuffle(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<usize>) -> Self {
        self.chunks = Some(chunks);
        self
    }
}

/// One named field of a compound dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data: TypedArray,
}

/// What a dataset stores.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single typed array.
    Array(TypedArray),
    /// A compound (record) dataset: parallel named fields sharing a row count.
    Compound(Vec<Field>),
}

impl Payload {
    /// Find a compound field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Payload::Compound(fields) => fields.iter().find(|f| f.name == name),
            Payload::Array(_) => None,
        }
    }

    /// Number of compound fields (0 for a plain array).
    pub fn num_fields(&self) -> usize {
        match self {
            Payload::Compound(fields) => fields.len(),
            Payload::Array(_) => 0,
        }
    }
}

/// A typed data node.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    payload: Payload,
    attrs: Attributes,
    compression: Compression,
}

impl Dataset {
    pub fn new(payload: Payload, compression: Compression) -> Self {
        Dataset {
            payload,
            attrs: Attributes::new(),
            compression,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The stored array, if this is not a compound dataset.
    pub fn array(&self) -> Option<&TypedArray> {
        match &self.payload {
            Payload::Array(arr) => Some(arr),
            Payload::Compound(_) => None,
        }
    }

    pub fn compression(&self) -> &Compression {
        &self.compression
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: &str, value: AttrValue) {
        self.attrs.insert(name.to_string(), value);
    }
}

/// A group: attributes plus named children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    attrs: Attributes,
    children: BTreeMap<String, Node>,
}

/// A child of a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    pub fn attrs(&self) -> &Attributes {
        match self {
            Node::Group(g) => g.attrs(),
            Node::Dataset(d) => d.attrs(),
        }
    }

    /// The first element of the node's `CLASS` attribute.
    pub fn class(&self) -> Option<&str> {
        self.attrs().get(CLASS_ATTR).and_then(AttrValue::first_text)
    }
}

impl Group {
    pub fn new() -> Self {
        Group::default()
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: &str, value: AttrValue) {
        self.attrs.insert(name.to_string(), value);
    }

    /// The first element of this group's `CLASS` attribute.
    pub fn class(&self) -> Option<&str> {
        self.attr(CLASS_ATTR).and_then(AttrValue::first_text)
    }

    /// Create an empty child group.
    pub fn create_group(&mut self, name: &str) -> Result<&mut Group> {
        match self.insert(name, Node::Group(Group::new()))? {
            Node::Group(g) => Ok(g),
            Node::Dataset(_) => Err(Error::NodeExists(name.to_string())),
        }
    }

    /// Create a child dataset.
    pub fn create_dataset(
        &mut self,
        name: &str,
        payload: Payload,
        compression: &Compression,
    ) -> Result<&mut Dataset> {
        let dataset = Dataset::new(payload, compression.clone());
        match self.insert(name, Node::Dataset(dataset))? {
            Node::Dataset(d) => Ok(d),
            Node::Group(_) => Err(Error::NodeExists(name.to_string())),
        }
    }

    /// Insert an already-built node.
    pub fn insert(&mut self, name: &str, node: Node) -> Result<&mut Node> {
        if self.children.contains_key(name) {
            return Err(Error::NodeExists(name.to_string()));
        }
        Ok(self.children.entry(name.to_string()).or_insert(node))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        match self.children.get(name) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        match self.children.get_mut(name) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        match self.children.get(name) {
            Some(Node::Dataset(d)) => Some(d),
            _ => None,
        }
    }

    pub fn dataset_mut(&mut self, name: &str) -> Option<&mut Dataset> {
        match self.children.get_mut(name) {
            Some(Node::Dataset(d)) => Some(d),
            _ => None,
        }
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Whether a file is opened for reading or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOpenMode {
    ReadOnly,
    ReadWrite,
}

/// An open container. The whole tree is held in memory; [`File::flush`] and
/// [`File::close`] encode it back to disk.
#[derive(Debug)]
pub struct File {
    root: Group,
    filename: Option<PathBuf>,
    mode: FileOpenMode,
    closed: bool,
}

/// Builder for creating a new container file.
pub struct NewFile {
    path: PathBuf,
    overwrite: bool,
}

impl File {
    /// Open an existing container read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(File {
            root: hdf5::decode(&bytes)?,
            filename: Some(path.to_path_buf()),
            mode: FileOpenMode::ReadOnly,
            closed: false,
        })
    }

    /// Return a builder for creating a new container file.
    pub fn create<P: AsRef<Path>>(path: P) -> NewFile {
        NewFile {
            path: path.as_ref().to_path_buf(),
            overwrite: false,
        }
    }

    /// An empty, writable container with no backing file.
    pub fn in_memory() -> Self {
        File {
            root: Group::new(),
            filename: None,
            mode: FileOpenMode::ReadWrite,
            closed: false,
        }
    }

    /// Decode a container from bytes. The result has no backing file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(File {
            root: hdf5::decode(bytes)?,
            filename: None,
            mode: FileOpenMode::ReadWrite,
            closed: false,
        })
    }

    /// Encode the whole tree as an HDF5 file image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        hdf5::encode(&self.root)
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn mode(&self) -> FileOpenMode {
        self.mode
    }

    /// Write the tree to disk if the file is writable and file-backed.
    pub fn flush(&self) -> Result<()> {
        if self.mode == FileOpenMode::ReadWrite {
            if let Some(path) = &self.filename {
                std::fs::write(path, self.to_bytes()?)?;
            }
        }
        Ok(())
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush()
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if !self.closed && self.mode == FileOpenMode::ReadWrite {
            let _ = self.flush();
        }
    }
}

impl NewFile {
    /// Replace an existing file instead of failing.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Create the file on disk with an empty root group and return it open.
    pub fn open(self) -> Result<File> {
        if !self.overwrite && self.path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("file already exists: {}", self.path.display()),
            )));
        }
        let file = File {
            root: Group::new(),
            filename: Some(self.path),
            mode: FileOpenMode::ReadWrite,
            closed: false,
        };
        file.flush()?;
        Ok(file)
    }
}
