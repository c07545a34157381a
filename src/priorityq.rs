// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Event queue for the sweep.
//
// Two phases:
//   Before `init`: inserts are only collected. `init` sorts them once, so
//   the input vertices cost one sort instead of n heap inserts.
//   After `init`: inserts (intersection vertices) go into a binary min-heap.
// The minimum is whichever of the sorted tail and the heap top comes first.
//
// Events are ordered by s, then t, then insertion sequence, so equal
// positions always come out in the same order.

use std::cmp::Ordering;

use slotmap::{new_key_type, SlotMap};

use crate::geom::{Point, Real};

new_key_type! {
    /// Handle to a queued event. Stays unique after the event leaves the
    /// queue, so a stale handle is recognised rather than misused.
    pub struct EventHandle;
}

/// Sweep position plus insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventKey {
    pub pos: Point,
    seq: u64,
}

/// Coordinates are finite by the time they are queued; signed zeros compare
/// equal, as they do in `vert_leq`.
fn coord_cmp(a: Real, b: Real) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        coord_cmp(self.pos.s, other.pos.s)
            .then(coord_cmp(self.pos.t, other.pos.t))
            .then(self.seq.cmp(&other.seq))
    }

    #[inline]
    fn leq(&self, other: &Self) -> bool {
        self.cmp(other) != Ordering::Greater
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Sorted,
    Heap(usize),
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    key: EventKey,
    slot: Slot,
}

#[derive(Debug, Clone)]
pub struct EventQueue<V: Copy> {
    entries: SlotMap<EventHandle, Entry<V>>,
    /// Pre-init events, sorted descending once `init` runs so the minimum
    /// sits at the end. Handles removed by `delete` are skipped lazily.
    sorted: Vec<EventHandle>,
    heap: Vec<EventHandle>,
    initialized: bool,
    next_seq: u64,
}

impl<V: Copy> Default for EventQueue<V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<V: Copy> EventQueue<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotMap::with_capacity_and_key(capacity),
            sorted: Vec::with_capacity(capacity),
            heap: Vec::new(),
            initialized: false,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: EventHandle) -> bool {
        self.entries.contains_key(handle)
    }

    pub fn insert(&mut self, value: V, pos: Point) -> EventHandle {
        let key = EventKey {
            pos,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        if !self.initialized {
            let handle = self.entries.insert(Entry {
                value,
                key,
                slot: Slot::Sorted,
            });
            self.sorted.push(handle);
            return handle;
        }
        let at = self.heap.len();
        let handle = self.entries.insert(Entry {
            value,
            key,
            slot: Slot::Heap(at),
        });
        self.heap.push(handle);
        self.float_up(at);
        handle
    }

    /// Sorts the events collected so far. Later inserts go to the heap.
    pub fn init(&mut self) {
        let entries = &self.entries;
        self.sorted
            .sort_by(|a, b| entries[*b].key.cmp(&entries[*a].key));
        self.initialized = true;
    }

    /// The next event without removing it.
    pub fn peek(&mut self) -> Option<(EventHandle, V)> {
        self.drop_stale_sorted();
        let sorted_min = self.sorted.last().copied();
        let heap_min = self.heap.first().copied();
        let handle = match (sorted_min, heap_min) {
            (None, None) => return None,
            (Some(s), None) => s,
            (None, Some(h)) => h,
            (Some(s), Some(h)) => {
                if self.leq(h, s) {
                    h
                } else {
                    s
                }
            }
        };
        Some((handle, self.entries[handle].value))
    }

    pub fn pop_min(&mut self) -> Option<V> {
        let (handle, _) = self.peek()?;
        self.delete(handle)
    }

    /// Removes an event. Returns `None` for a handle that is no longer queued.
    pub fn delete(&mut self, handle: EventHandle) -> Option<V> {
        let entry = self.entries.remove(handle)?;
        match entry.slot {
            Slot::Sorted => self.drop_stale_sorted(),
            Slot::Heap(at) => self.heap_remove(at),
        }
        Some(entry.value)
    }

    /// Moves an event earlier in the order. A position that is not earlier
    /// than the current one is ignored. Returns `false` for a stale handle.
    pub fn decrease_key(&mut self, handle: EventHandle, pos: Point) -> bool {
        let Some(entry) = self.entries.get_mut(handle) else {
            return false;
        };
        let key = EventKey {
            pos,
            seq: entry.key.seq,
        };
        if !key.leq(&entry.key) {
            return true;
        }
        entry.key = key;
        match entry.slot {
            Slot::Heap(at) => self.float_up(at),
            Slot::Sorted => {
                // The sorted array keeps a dead reference; the event itself
                // moves to the heap.
                let at = self.heap.len();
                entry.slot = Slot::Heap(at);
                self.heap.push(handle);
                self.float_up(at);
                self.drop_stale_sorted();
            }
        }
        true
    }

    fn drop_stale_sorted(&mut self) {
        while let Some(&last) = self.sorted.last() {
            if matches!(self.entries.get(last), Some(entry) if matches!(entry.slot, Slot::Sorted)) {
                break;
            }
            self.sorted.pop();
        }
    }

    #[inline]
    fn leq(&self, a: EventHandle, b: EventHandle) -> bool {
        self.entries[a].key.leq(&self.entries[b].key)
    }

    fn place(&mut self, at: usize, handle: EventHandle) {
        self.heap[at] = handle;
        self.entries[handle].slot = Slot::Heap(at);
    }

    fn float_up(&mut self, mut at: usize) {
        let handle = self.heap[at];
        while at > 0 {
            let parent = (at - 1) / 2;
            let parent_handle = self.heap[parent];
            if self.leq(parent_handle, handle) {
                break;
            }
            self.place(at, parent_handle);
            at = parent;
        }
        self.place(at, handle);
    }

    fn float_down(&mut self, mut at: usize) {
        let handle = self.heap[at];
        loop {
            let left = 2 * at + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.heap.len() && self.leq(self.heap[right], self.heap[left]) {
                right
            } else {
                left
            };
            let child_handle = self.heap[child];
            if self.leq(handle, child_handle) {
                break;
            }
            self.place(at, child_handle);
            at = child;
        }
        self.place(at, handle);
    }

    fn heap_remove(&mut self, at: usize) {
        let last = self.heap.len() - 1;
        self.heap.swap(at, last);
        self.heap.pop();
        if at < self.heap.len() {
            let moved = self.heap[at];
            self.entries[moved].slot = Slot::Heap(at);
            if at > 0 && self.leq(moved, self.heap[(at - 1) / 2]) {
                self.float_up(at);
            } else {
                self.float_down(at);
            }
        }
    }
}
