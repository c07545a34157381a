// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Record arenas for the mesh, the active edge dictionary and the sweep regions.
//
// Every record the tessellator creates lives in a `Pool`: a generational slot
// arena that grows one bucket at a time. Records are stored densely, so
// iteration follows insertion and removal order within a run and never the
// slot reuse left behind by an earlier one. Buckets are granted by an
// `Allocator`, which callers may replace to impose their own budgets. Slots
// freed mid-run are recycled inside the pool; budget only flows back to the
// allocator in bulk, when a pool is cleared or dropped.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::{DenseSlotMap, Key};
use thiserror::Error;

use crate::error::{Result, TessError};

/// The record categories drawn from an allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Vertex,
    Edge,
    Face,
    DictNode,
    Region,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Vertex,
        RecordKind::Edge,
        RecordKind::Face,
        RecordKind::DictNode,
        RecordKind::Region,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Vertex => "vertex",
            RecordKind::Edge => "edge",
            RecordKind::Face => "face",
            RecordKind::DictNode => "dictionary node",
            RecordKind::Region => "region",
        };
        f.write_str(name)
    }
}

/// Bucket sizes per record kind, plus the number of intersection vertices to
/// reserve room for up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocConfig {
    pub vertex_bucket_size: usize,
    pub edge_bucket_size: usize,
    pub face_bucket_size: usize,
    pub dict_node_bucket_size: usize,
    pub region_bucket_size: usize,
    pub extra_vertices: usize,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            vertex_bucket_size: 512,
            edge_bucket_size: 512,
            face_bucket_size: 256,
            dict_node_bucket_size: 512,
            region_bucket_size: 256,
            extra_vertices: 0,
        }
    }
}

impl AllocConfig {
    /// Records per bucket for `kind`. Zero is treated as one.
    pub fn bucket_size(&self, kind: RecordKind) -> usize {
        let size = match kind {
            RecordKind::Vertex => self.vertex_bucket_size,
            RecordKind::Edge => self.edge_bucket_size,
            RecordKind::Face => self.face_bucket_size,
            RecordKind::DictNode => self.dict_node_bucket_size,
            RecordKind::Region => self.region_bucket_size,
        };
        size.max(1)
    }
}

/// Returned by an allocator that refuses to grant another bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} budget exhausted")]
pub struct AllocError {
    pub kind: RecordKind,
}

/// Grants record capacity to the pools of a session.
///
/// Pools call [`grant`](Allocator::grant) once per bucket, before the bucket
/// is used, and [`release`](Allocator::release) once with the total they hold
/// when they are cleared or dropped.
pub trait Allocator {
    fn config(&self) -> &AllocConfig;

    fn bucket_size(&self, kind: RecordKind) -> usize {
        self.config().bucket_size(kind)
    }

    /// Reserves `records` more records of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when the request cannot be satisfied.
    fn grant(&mut self, kind: RecordKind, records: usize) -> std::result::Result<(), AllocError>;

    /// Returns `records` previously granted records of `kind`.
    fn release(&mut self, kind: RecordKind, records: usize);
}

/// Allocator handle shared by every pool of one session.
pub type SharedAllocator = Rc<RefCell<dyn Allocator>>;

/// Default allocator: grants whatever is asked, keeps count.
#[derive(Debug, Clone, Default)]
pub struct HeapAllocator {
    config: AllocConfig,
    outstanding: [usize; 5],
}

impl HeapAllocator {
    pub fn new(config: AllocConfig) -> Self {
        Self {
            config,
            outstanding: [0; 5],
        }
    }

    /// Records of `kind` currently granted and not yet released.
    pub fn outstanding(&self, kind: RecordKind) -> usize {
        self.outstanding[kind.slot()]
    }
}

impl Allocator for HeapAllocator {
    fn config(&self) -> &AllocConfig {
        &self.config
    }

    fn grant(&mut self, kind: RecordKind, records: usize) -> std::result::Result<(), AllocError> {
        self.outstanding[kind.slot()] += records;
        Ok(())
    }

    fn release(&mut self, kind: RecordKind, records: usize) {
        let slot = &mut self.outstanding[kind.slot()];
        *slot = slot.saturating_sub(records);
    }
}

/// Allocator with a hard per-kind record budget.
///
/// A grant that would push a kind past its limit fails, which surfaces as
/// [`TessError::OutOfMemory`] from the run that asked for it.
#[derive(Debug, Clone, Default)]
pub struct BudgetAllocator {
    config: AllocConfig,
    limits: [Option<usize>; 5],
    outstanding: [usize; 5],
}

impl BudgetAllocator {
    pub fn new(config: AllocConfig) -> Self {
        Self {
            config,
            limits: [None; 5],
            outstanding: [0; 5],
        }
    }

    /// Caps the number of `kind` records that may be outstanding at once.
    #[must_use]
    pub fn with_limit(mut self, kind: RecordKind, records: usize) -> Self {
        self.limits[kind.slot()] = Some(records);
        self
    }

    pub fn outstanding(&self, kind: RecordKind) -> usize {
        self.outstanding[kind.slot()]
    }
}

impl Allocator for BudgetAllocator {
    fn config(&self) -> &AllocConfig {
        &self.config
    }

    fn grant(&mut self, kind: RecordKind, records: usize) -> std::result::Result<(), AllocError> {
        let held = self.outstanding[kind.slot()];
        if let Some(limit) = self.limits[kind.slot()] {
            if held.saturating_add(records) > limit {
                return Err(AllocError { kind });
            }
        }
        self.outstanding[kind.slot()] = held + records;
        Ok(())
    }

    fn release(&mut self, kind: RecordKind, records: usize) {
        let slot = &mut self.outstanding[kind.slot()];
        *slot = slot.saturating_sub(records);
    }
}

/// Generational record arena that grows in allocator-granted buckets.
pub struct Pool<K: Key, V> {
    kind: RecordKind,
    items: DenseSlotMap<K, V>,
    granted: usize,
    alloc: SharedAllocator,
}

impl<K: Key, V> Pool<K, V> {
    pub fn new(kind: RecordKind, alloc: SharedAllocator) -> Self {
        Self {
            kind,
            items: DenseSlotMap::with_key(),
            granted: 0,
            alloc,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Stores `value`, asking the allocator for another bucket when full.
    ///
    /// # Errors
    ///
    /// Returns [`TessError::OutOfMemory`] if the allocator refuses the bucket.
    pub fn insert(&mut self, value: V) -> Result<K> {
        if self.items.len() >= self.granted {
            self.grow()?;
        }
        Ok(self.items.insert(value))
    }

    /// Like [`insert`](Pool::insert), for records that refer to their own key.
    pub fn insert_with_key(&mut self, build: impl FnOnce(K) -> V) -> Result<K> {
        if self.items.len() >= self.granted {
            self.grow()?;
        }
        Ok(self.items.insert_with_key(build))
    }

    fn grow(&mut self) -> Result<()> {
        let records = self.alloc.borrow().bucket_size(self.kind).max(1);
        self.alloc
            .borrow_mut()
            .grant(self.kind, records)
            .map_err(|err| TessError::OutOfMemory(err.kind))?;
        self.granted += records;
        self.items.reserve(records);
        Ok(())
    }

    /// Frees one record. Its slot is reused by later inserts; the budget
    /// stays with the pool.
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.items.remove(key)
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records this pool currently holds budget for.
    pub fn granted(&self) -> usize {
        self.granted
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.items.iter()
    }

    /// Drops every record and hands the whole budget back. Keys issued before
    /// the call no longer resolve.
    pub fn clear(&mut self) {
        self.items.clear();
        if self.granted > 0 {
            self.alloc.borrow_mut().release(self.kind, self.granted);
            self.granted = 0;
        }
    }
}

impl<K: Key, V> Index<K> for Pool<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        &self.items[key]
    }
}

impl<K: Key, V> IndexMut<K> for Pool<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.items[key]
    }
}

impl<K: Key, V> Drop for Pool<K, V> {
    fn drop(&mut self) {
        if self.granted > 0 {
            if let Ok(mut alloc) = self.alloc.try_borrow_mut() {
                alloc.release(self.kind, self.granted);
            }
        }
    }
}

impl<K: Key, V> fmt::Debug for Pool<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("kind", &self.kind)
            .field("len", &self.items.len())
            .field("granted", &self.granted)
            .finish()
    }
}
