// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Active edge structure: a sorted circular doubly linked list.
//
// The head node carries no key and marks both ends of the list. The order is
// defined by a caller-supplied `leq` closure that may fail (it evaluates
// geometric predicates), so every operation that compares keys returns a
// `Result`. Nodes come from an allocator-backed pool.

use slotmap::new_key_type;

use crate::bucketalloc::{Pool, RecordKind, SharedAllocator};
use crate::error::Result;

new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
pub struct DictNode<K> {
    key: Option<K>,
    next: NodeKey,
    prev: NodeKey,
}

#[derive(Debug)]
pub struct Dict<K: Copy> {
    nodes: Pool<NodeKey, DictNode<K>>,
    head: NodeKey,
}

impl<K: Copy> Dict<K> {
    pub fn new(alloc: SharedAllocator) -> Result<Self> {
        let mut nodes = Pool::new(RecordKind::DictNode, alloc);
        let head = nodes.insert_with_key(|head| DictNode {
            key: None,
            next: head,
            prev: head,
        })?;
        Ok(Self { nodes, head })
    }

    #[inline]
    pub fn head(&self) -> NodeKey {
        self.head
    }

    /// The key stored at `node`; `None` for the head.
    #[inline]
    pub fn key(&self, node: NodeKey) -> Option<K> {
        self.nodes.get(node).and_then(|n| n.key)
    }

    #[inline]
    pub fn succ(&self, node: NodeKey) -> NodeKey {
        self.nodes[node].next
    }

    #[inline]
    pub fn pred(&self, node: NodeKey) -> NodeKey {
        self.nodes[node].prev
    }

    #[inline]
    pub fn min(&self) -> NodeKey {
        self.succ(self.head)
    }

    #[inline]
    pub fn max(&self) -> NodeKey {
        self.pred(self.head)
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from smallest to largest.
    pub fn keys(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len());
        let mut node = self.min();
        while let Some(key) = self.key(node) {
            out.push(key);
            node = self.succ(node);
        }
        out
    }

    /// Inserts `key` in order, searching from the top of the list.
    pub fn insert<F>(&mut self, key: K, leq: F) -> Result<NodeKey>
    where
        F: FnMut(K, K) -> Result<bool>,
    {
        self.insert_before(self.head, key, leq)
    }

    /// Inserts `key` below `node`, walking down past every entry that does
    /// not compare `leq` to it. Cheap when the caller knows a close upper
    /// neighbour.
    pub fn insert_before<F>(&mut self, node: NodeKey, key: K, mut leq: F) -> Result<NodeKey>
    where
        F: FnMut(K, K) -> Result<bool>,
    {
        let mut below = node;
        loop {
            below = self.pred(below);
            match self.key(below) {
                None => break,
                Some(existing) if leq(existing, key)? => break,
                Some(_) => {}
            }
        }
        let above = self.succ(below);
        let new = self.nodes.insert(DictNode {
            key: Some(key),
            next: above,
            prev: below,
        })?;
        self.nodes[above].prev = new;
        self.nodes[below].next = new;
        Ok(new)
    }

    pub fn delete(&mut self, node: NodeKey) {
        if node == self.head {
            return;
        }
        if let Some(removed) = self.nodes.remove(node) {
            self.nodes[removed.next].prev = removed.prev;
            self.nodes[removed.prev].next = removed.next;
        }
    }

    /// The first node, from the bottom, whose key satisfies `reached`, or the
    /// head if none does. `reached` may test against a value that is not a key.
    pub fn search<F>(&self, mut reached: F) -> Result<NodeKey>
    where
        F: FnMut(K) -> Result<bool>,
    {
        let mut node = self.head;
        loop {
            node = self.succ(node);
            match self.key(node) {
                None => return Ok(node),
                Some(existing) if reached(existing)? => return Ok(node),
                Some(_) => {}
            }
        }
    }
}
