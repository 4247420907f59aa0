//! Hierarchical Store
//!
//! In-memory model of a hierarchical data file: a tree of named groups and typed
//! datasets rooted at `/`, with attributes on every node. Backends load and save
//! whole stores; the merge engine only mutates the in-memory tree.

pub mod json;
pub mod memory;
pub mod path;
pub mod persistence;
pub mod value;

pub use memory::MemoryStoreBackend;
pub use persistence::FsStoreBackend;
pub use value::{ArrayData, AttrValue, DType};

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Named attributes of a node, iterated in name order.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Semantic dataset kind, derived from shape rather than stored as a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Rank 1, length 1, fixed: one summary statistic per contributing file
    ScalarAggregate,
    /// Rank 1, growable along its only axis
    Vector,
    /// Rank 2, growable along axis 0
    Matrix,
}

/// Typed multi-dimensional array node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    shape: Vec<usize>,
    growable: bool,
    data: ArrayData,
    pub attrs: Attributes,
}

impl Dataset {
    /// Create a fixed-size dataset, checking that `shape` matches the payload.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, StorageError> {
        let dataset = Self {
            shape,
            growable: false,
            data,
            attrs: Attributes::new(),
        };
        dataset.validate("<new>")?;
        Ok(dataset)
    }

    /// Single-value summary dataset.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: vec![1],
            growable: false,
            data: ArrayData::F64(vec![value]),
            attrs: Attributes::new(),
        }
    }

    /// Rank-1 dataset over `data`.
    pub fn vector(data: ArrayData) -> Self {
        Self {
            shape: vec![data.len()],
            growable: false,
            data,
            attrs: Attributes::new(),
        }
    }

    /// Rank-2 dataset with `cols` columns over row-major `data`.
    pub fn matrix(cols: usize, data: ArrayData) -> Result<Self, StorageError> {
        if cols == 0 || data.len() % cols != 0 {
            return Err(StorageError::InvalidShape(format!(
                "{} elements do not fill rows of {} columns",
                data.len(),
                cols
            )));
        }
        let rows = data.len() / cols;
        Self::new(vec![rows, cols], data)
    }

    /// Empty growable dataset with the same dtype and trailing dimensions as `self`.
    pub fn empty_growable_like(&self) -> Self {
        let mut shape = self.shape.clone();
        if let Some(first) = shape.first_mut() {
            *first = 0;
        }
        Self {
            shape,
            growable: true,
            data: ArrayData::empty(self.data.dtype()),
            attrs: Attributes::new(),
        }
    }

    /// Builder: attach an attribute.
    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    /// Builder: mark axis 0 as unbounded.
    pub fn into_growable(mut self) -> Self {
        self.growable = true;
        self
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Axis-0 length.
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Elements per axis-0 row.
    pub fn row_width(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn is_growable(&self) -> bool {
        self.growable
    }

    /// Kind of this dataset, or `None` for ranks the merge engine does not handle.
    ///
    /// A growable rank-1 dataset is always a vector, even at length 1.
    pub fn kind(&self) -> Option<DatasetKind> {
        match (self.rank(), self.rows(), self.growable) {
            (1, 1, false) => Some(DatasetKind::ScalarAggregate),
            (1, _, _) => Some(DatasetKind::Vector),
            (2, _, _) => Some(DatasetKind::Matrix),
            _ => None,
        }
    }

    /// Set element 0 of a summary dataset.
    pub fn set_scalar(&mut self, value: f64) -> bool {
        self.data.set_f64(0, value)
    }

    /// Element 0 widened to `f64`.
    pub fn scalar_value(&self) -> Option<f64> {
        self.data.get_f64(0)
    }

    /// Resize along axis 0. Fails unless the dataset is growable.
    pub fn resize_rows(&mut self, rows: usize) -> Result<(), StorageError> {
        if !self.growable {
            return Err(StorageError::NotGrowable(format!("{:?}", self.shape)));
        }
        let width = self.row_width();
        self.data.resize(rows * width);
        if let Some(first) = self.shape.first_mut() {
            *first = rows;
        }
        Ok(())
    }

    /// Write whole rows of `src` starting at axis-0 offset `row`.
    pub fn write_rows(&mut self, row: usize, src: &ArrayData) -> Result<(), StorageError> {
        let width = self.row_width();
        if width == 0 || src.len() % width != 0 {
            return Err(StorageError::InvalidShape(format!(
                "{} elements are not whole rows of width {}",
                src.len(),
                width
            )));
        }
        if !self.data.write_at(row * width, src) {
            return Err(StorageError::InvalidShape(format!(
                "cannot write {} {} elements at row {} of {:?} {}",
                src.len(),
                src.dtype(),
                row,
                self.shape,
                self.dtype()
            )));
        }
        Ok(())
    }

    /// Check rank and that the shape matches the payload length.
    pub fn validate(&self, path: &str) -> Result<(), StorageError> {
        if self.shape.is_empty() {
            return Err(StorageError::InvalidShape(format!("{}: rank 0", path)));
        }
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Err(StorageError::InvalidShape(format!(
                "{}: shape {:?} needs {} elements, found {}",
                path,
                self.shape,
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Group node: named children plus attributes, no payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub attrs: Attributes,
    children: BTreeMap<String, Node>,
}

/// Tree node: either a group or a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a child group.
    pub fn with_group(mut self, name: &str, group: Group) -> Self {
        self.children.insert(name.to_string(), Node::Group(group));
        self
    }

    /// Builder: add a child dataset.
    pub fn with_dataset(mut self, name: &str, dataset: Dataset) -> Self {
        self.children.insert(name.to_string(), Node::Dataset(dataset));
        self
    }

    /// Builder: attach an attribute.
    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    /// Children in name order.
    pub fn children(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.children.iter()
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn insert(&mut self, name: &str, node: Node) -> Option<Node> {
        self.children.insert(name.to_string(), node)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child group `name`, created if absent. Fails if a dataset holds the name.
    pub fn require_group(&mut self, name: &str) -> Result<&mut Group, StorageError> {
        let node = self
            .children
            .entry(name.to_string())
            .or_insert_with(|| Node::Group(Group::new()));
        match node {
            Node::Group(group) => Ok(group),
            Node::Dataset(_) => Err(StorageError::NotAGroup(name.to_string())),
        }
    }

    fn validate(&self, at: &str) -> Result<(), StorageError> {
        for (name, node) in &self.children {
            let child = path::join(at, name);
            match node {
                Node::Group(group) => group.validate(&child)?,
                Node::Dataset(dataset) => dataset.validate(&child)?,
            }
        }
        Ok(())
    }

    fn collect_datasets<'a>(&'a self, at: &str, out: &mut Vec<(String, &'a Dataset)>) {
        for (name, node) in &self.children {
            let child = path::join(at, name);
            match node {
                Node::Group(group) => group.collect_datasets(&child, out),
                Node::Dataset(dataset) => out.push((child, dataset)),
            }
        }
    }
}

/// A whole hierarchical file held in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    root: Group,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_root(root: Group) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Look up a node by path. `/` is not a node; use [`Store::root`].
    pub fn get(&self, node_path: &str) -> Option<&Node> {
        let segments = path::split_path(node_path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut group = &self.root;
        for segment in parents {
            match group.child(segment)? {
                Node::Group(next) => group = next,
                Node::Dataset(_) => return None,
            }
        }
        group.child(last)
    }

    pub fn dataset(&self, node_path: &str) -> Option<&Dataset> {
        match self.get(node_path)? {
            Node::Dataset(dataset) => Some(dataset),
            Node::Group(_) => None,
        }
    }

    /// Group at `node_path`, creating missing groups along the way.
    pub fn require_group(&mut self, node_path: &str) -> Result<&mut Group, StorageError> {
        let mut group = &mut self.root;
        for segment in path::split_path(node_path)? {
            group = group.require_group(segment)?;
        }
        Ok(group)
    }

    /// Insert `node` at `node_path`, creating parent groups.
    pub fn insert(&mut self, node_path: &str, node: Node) -> Result<(), StorageError> {
        let segments = path::split_path(node_path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| StorageError::InvalidPath(node_path.to_string()))?;
        let mut group = &mut self.root;
        for segment in parents {
            group = group.require_group(segment)?;
        }
        group.insert(last, node);
        Ok(())
    }

    /// Root-group attribute.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.root.attrs.get(name)
    }

    pub fn set_attr(&mut self, name: &str, value: AttrValue) {
        self.root.attrs.insert(name.to_string(), value);
    }

    /// Every dataset with its full path, in pre-order.
    pub fn datasets(&self) -> Vec<(String, &Dataset)> {
        let mut out = Vec::new();
        self.root.collect_datasets("/", &mut out);
        out
    }

    /// Check every dataset's shape against its payload.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.root.validate("/")
    }
}

/// Storage backend interface: the file-level primitives the merge engine uses.
pub trait StoreBackend {
    /// Open a store for reading.
    fn load(&self, path: &Path) -> Result<Store, StorageError>;

    /// Create or overwrite a store.
    fn save(&self, path: &Path, store: &Store) -> Result<(), StorageError>;

    /// Delete a store's backing storage.
    fn remove(&self, path: &Path) -> Result<(), StorageError>;

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    fn exists(&self, path: &Path) -> bool;
}
