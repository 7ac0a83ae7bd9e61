//! X-fast trie: an ordered set of up to `2^width` keys with `O(log width)`
//! predecessor/successor, backed by one hash-indexed level table per bit of
//! the key and a doubly-linked list threading the leaves in ascending
//! order.
//!
//! Nodes live in two arenas (`internals`, `leaves`) addressed by `u32`
//! handles rather than behind `Arc<RwLock<_>>`: thread repair on
//! insert/remove becomes swapping an enum variant in a `Vec` slot instead
//! of juggling strong/weak reference counts.

use dashmap::DashMap;
use log::trace;

use crate::error::{Result, TrieError};

/// A child or a leaf, whichever a populated `Side` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Internal(u32),
    Leaf(u32),
}

/// One side (0 = left, 1 = right) of an internal node: either a real
/// descendant, or a descendant thread — a non-owning shortcut to the
/// extreme leaf of the node's actual subtree, stored on the side that has
/// no real child. By convention the thread on side 0 (missing left) points
/// to the *minimum* leaf of the node's descendants, and on side 1 (missing
/// right) to the *maximum* — the nearest real data to the missing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Child(Slot),
    Thread(u32),
}

#[derive(Debug, Clone, Copy)]
struct InternalNode {
    level: usize,
    parent: Option<u32>,
    left: Option<Side>,
    right: Option<Side>,
}

#[derive(Debug, Clone, Copy)]
struct LeafNode {
    value: u64,
    parent: u32,
    pred: Option<u32>,
    succ: Option<u32>,
}

/// Ordered set of `u64` keys bounded to a `width`-bit universe, with
/// `O(log width)` `insert`/`remove`/`predecessor`/`successor`.
#[derive(Debug)]
pub struct XFastTrie {
    width: usize,
    // levels[0..=width]: prefix (in [0, 2^level)) -> node at that level.
    // levels[width] holds leaves keyed by the full value.
    levels: Vec<DashMap<u64, Slot>>,
    internals: Vec<InternalNode>,
    leaves: Vec<LeafNode>,
    free_internals: Vec<u32>,
    free_leaves: Vec<u32>,
    root: u32,
    head: Option<u32>,
    tail: Option<u32>,
    count: usize,
}

impl XFastTrie {
    pub fn new(width: usize) -> Self {
        assert!((1..=64).contains(&width), "width must be in 1..=64");
        let mut levels = Vec::with_capacity(width + 1);
        for _ in 0..=width {
            levels.push(DashMap::new());
        }
        levels[0].insert(0, Slot::Internal(0));
        let root_node = InternalNode {
            level: 0,
            parent: None,
            left: None,
            right: None,
        };
        Self {
            width,
            levels,
            internals: vec![root_node],
            leaves: Vec::new(),
            free_internals: Vec::new(),
            free_leaves: Vec::new(),
            root: 0,
            head: None,
            tail: None,
            count: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, key: u64) -> bool {
        self.levels[self.width].contains_key(&key)
    }

    pub fn min(&self) -> Option<u64> {
        self.head.map(|id| self.leaves[id as usize].value)
    }

    pub fn max(&self) -> Option<u64> {
        self.tail.map(|id| self.leaves[id as usize].value)
    }

    pub fn clear(&mut self) {
        for level in &self.levels {
            level.clear();
        }
        self.levels[0].insert(0, Slot::Internal(0));
        self.internals.clear();
        self.internals.push(InternalNode {
            level: 0,
            parent: None,
            left: None,
            right: None,
        });
        self.leaves.clear();
        self.free_internals.clear();
        self.free_leaves.clear();
        self.root = 0;
        self.head = None;
        self.tail = None;
        self.count = 0;
    }

    fn prefix(&self, key: u64, level: usize) -> u64 {
        if level == 0 {
            0
        } else if level == self.width {
            key
        } else {
            key >> (self.width - level)
        }
    }

    fn bit_at(&self, key: u64, level: usize) -> usize {
        debug_assert!(level < self.width);
        ((key >> (self.width - 1 - level)) & 1) as usize
    }

    fn side(&self, node: u32, bit: usize) -> Option<Side> {
        if bit == 0 {
            self.internals[node as usize].left
        } else {
            self.internals[node as usize].right
        }
    }

    fn set_side(&mut self, node: u32, bit: usize, side: Side) {
        if bit == 0 {
            self.internals[node as usize].left = Some(side);
        } else {
            self.internals[node as usize].right = Some(side);
        }
    }

    fn alloc_internal(&mut self, level: usize, parent: Option<u32>) -> u32 {
        let node = InternalNode {
            level,
            parent,
            left: None,
            right: None,
        };
        if let Some(id) = self.free_internals.pop() {
            self.internals[id as usize] = node;
            id
        } else {
            let id = self.internals.len() as u32;
            self.internals.push(node);
            id
        }
    }

    fn free_internal(&mut self, id: u32) {
        self.free_internals.push(id);
    }

    fn alloc_leaf(&mut self, value: u64, parent: u32, pred: Option<u32>, succ: Option<u32>) -> u32 {
        let node = LeafNode {
            value,
            parent,
            pred,
            succ,
        };
        if let Some(id) = self.free_leaves.pop() {
            self.leaves[id as usize] = node;
            id
        } else {
            let id = self.leaves.len() as u32;
            self.leaves.push(node);
            id
        }
    }

    /// Binary search over levels for the deepest node whose prefix matches
    /// `key`'s top bits. `level == width` means `key` is present as a leaf.
    fn closest_ancestor(&self, key: u64) -> (Slot, usize) {
        let mut lo: i64 = 0;
        let mut hi: i64 = self.width as i64;
        let mut best_level: i64 = 0;
        let mut best_slot = Slot::Internal(self.root);
        while lo <= hi {
            let mid = (lo + hi) / 2;
            let prefix = self.prefix(key, mid as usize);
            if let Some(slot) = self.levels[mid as usize].get(&prefix).map(|r| *r) {
                best_level = mid;
                best_slot = slot;
                lo = mid + 1;
            } else {
                hi = mid - 1;
            }
        }
        (best_slot, best_level as usize)
    }

    /// The leaf minimizing `|leaf.value - key|`, found via the closest
    /// ancestor's descendant thread and refined against its immediate
    /// neighbors in the leaf list. Callers must check `is_empty()` first.
    fn closest_leaf(&self, key: u64) -> u32 {
        let (slot, level) = self.closest_ancestor(key);
        let candidate = match slot {
            Slot::Leaf(l) => return l,
            Slot::Internal(id) => {
                let bit = self.bit_at(key, level);
                match self.side(id, bit) {
                    Some(Side::Thread(l)) => l,
                    other => unreachable!(
                        "closest ancestor's diverging side must be a descendant thread, found {other:?}"
                    ),
                }
            }
        };
        let mut best = candidate;
        let mut best_dist = self.leaves[candidate as usize].value.abs_diff(key);
        if let Some(p) = self.leaves[candidate as usize].pred {
            let d = self.leaves[p as usize].value.abs_diff(key);
            if d < best_dist {
                best = p;
                best_dist = d;
            }
        }
        if let Some(s) = self.leaves[candidate as usize].succ {
            let d = self.leaves[s as usize].value.abs_diff(key);
            if d < best_dist {
                best = s;
            }
        }
        best
    }

    fn predecessor_id(&self, key: u64) -> Option<u32> {
        if self.count == 0 {
            return None;
        }
        let l = self.closest_leaf(key);
        if self.leaves[l as usize].value < key {
            Some(l)
        } else {
            self.leaves[l as usize].pred
        }
    }

    fn successor_id(&self, key: u64) -> Option<u32> {
        if self.count == 0 {
            return None;
        }
        let l = self.closest_leaf(key);
        if self.leaves[l as usize].value > key {
            Some(l)
        } else {
            self.leaves[l as usize].succ
        }
    }

    pub fn predecessor(&self, key: u64) -> Result<Option<u64>> {
        if self.count == 0 {
            return Err(TrieError::empty());
        }
        Ok(self.predecessor_id(key).map(|id| self.leaves[id as usize].value))
    }

    pub fn successor(&self, key: u64) -> Result<Option<u64>> {
        if self.count == 0 {
            return Err(TrieError::empty());
        }
        Ok(self.successor_id(key).map(|id| self.leaves[id as usize].value))
    }

    /// Repairs stale descendant threads after inserting `leaf_id` (value
    /// `key`), walking from `anchor_id`'s parent to the root. A thread on a
    /// node's missing side tracks the extremal leaf of its one real
    /// subtree; once that extremal value stops changing at some ancestor,
    /// it provably can't change at any ancestor further up either, since
    /// each ancestor's real subtree only grows by strictly containing the
    /// one below it — so we stop at the first ancestor that doesn't need
    /// fixing.
    fn fix_threads_after_insert(&mut self, anchor_id: u32, key: u64, leaf_id: u32) {
        let mut v = self.internals[anchor_id as usize].parent;
        while let Some(vi) = v {
            let level = self.internals[vi as usize].level;
            let sibling_bit = 1 - self.bit_at(key, level);
            if let Some(Side::Thread(t)) = self.side(vi, sibling_bit) {
                let more_extreme = if sibling_bit == 0 {
                    key < self.leaves[t as usize].value
                } else {
                    key > self.leaves[t as usize].value
                };
                if !more_extreme {
                    break;
                }
                self.set_side(vi, sibling_bit, Side::Thread(leaf_id));
            }
            v = self.internals[vi as usize].parent;
        }
    }

    /// Symmetric repair after removing `leaf_id` (value `key`): any thread
    /// that pointed at the removed leaf is replaced by its global neighbor
    /// on the matching side (`succ_id` if it tracked the minimum, `pred_id`
    /// if the maximum) — correct because the removed leaf's subtree is a
    /// contiguous value range, so its global neighbor is also its neighbor
    /// within that subtree. Stops at the first ancestor whose thread
    /// didn't reference the removed leaf, by the same containment
    /// argument as insert.
    fn fix_threads_after_remove(
        &mut self,
        start: u32,
        key: u64,
        leaf_id: u32,
        pred_id: Option<u32>,
        succ_id: Option<u32>,
    ) {
        let mut v = self.internals[start as usize].parent;
        while let Some(vi) = v {
            let level = self.internals[vi as usize].level;
            let sibling_bit = 1 - self.bit_at(key, level);
            if let Some(Side::Thread(t)) = self.side(vi, sibling_bit) {
                if t != leaf_id {
                    break;
                }
                let replacement = if sibling_bit == 0 { succ_id } else { pred_id }
                    .expect("subtree that held the removed leaf still has another member");
                self.set_side(vi, sibling_bit, Side::Thread(replacement));
            }
            v = self.internals[vi as usize].parent;
        }
    }

    /// Inserts `key`. No-op if already present.
    pub fn insert(&mut self, key: u64) {
        if self.contains(key) {
            return;
        }

        let pred_id = self.predecessor_id(key);
        let succ_id = self.successor_id(key);

        let (anchor_id, anchor_level) = match self.closest_ancestor(key) {
            (Slot::Internal(id), level) => (id, level),
            (Slot::Leaf(_), _) => unreachable!("key already confirmed absent"),
        };

        let leaf_id = self.alloc_leaf(key, anchor_id, pred_id, succ_id);
        match pred_id {
            Some(p) => self.leaves[p as usize].succ = Some(leaf_id),
            None => self.head = Some(leaf_id),
        }
        match succ_id {
            Some(s) => self.leaves[s as usize].pred = Some(leaf_id),
            None => self.tail = Some(leaf_id),
        }

        // Only the pre-existing root can have a side left wholly unset
        // (the very first insert into an empty trie); every other
        // pre-existing node already has both sides populated by
        // construction.
        let anchor_bit = self.bit_at(key, anchor_level);
        if self.side(anchor_id, 1 - anchor_bit).is_none() {
            self.set_side(anchor_id, 1 - anchor_bit, Side::Thread(leaf_id));
        }

        let mut parent_id = anchor_id;
        let mut parent_level = anchor_level;
        while parent_level < self.width {
            let bit = self.bit_at(key, parent_level);
            let next_level = parent_level + 1;
            if next_level == self.width {
                self.set_side(parent_id, bit, Side::Child(Slot::Leaf(leaf_id)));
                self.leaves[leaf_id as usize].parent = parent_id;
                self.levels[self.width].insert(key, Slot::Leaf(leaf_id));
                break;
            }
            let new_id = self.alloc_internal(next_level, Some(parent_id));
            self.set_side(parent_id, bit, Side::Child(Slot::Internal(new_id)));
            let next_bit = self.bit_at(key, next_level);
            self.set_side(new_id, 1 - next_bit, Side::Thread(leaf_id));
            self.levels[next_level].insert(self.prefix(key, next_level), Slot::Internal(new_id));
            parent_id = new_id;
            parent_level = next_level;
        }

        self.fix_threads_after_insert(anchor_id, key, leaf_id);

        self.count += 1;
        trace!("xfast insert key={key} anchor_level={anchor_level}");
    }

    /// Removes `key`. Fails with a state error if absent.
    pub fn remove(&mut self, key: u64) -> Result<()> {
        let leaf_id = match self.levels[self.width].get(&key).map(|r| *r) {
            Some(Slot::Leaf(l)) => l,
            _ => return Err(TrieError::absent(key)),
        };

        let (pred_id, succ_id, parent_id) = {
            let leaf = &self.leaves[leaf_id as usize];
            (leaf.pred, leaf.succ, leaf.parent)
        };

        match pred_id {
            Some(p) => self.leaves[p as usize].succ = succ_id,
            None => self.head = succ_id,
        }
        match succ_id {
            Some(s) => self.leaves[s as usize].pred = pred_id,
            None => self.tail = pred_id,
        }
        self.levels[self.width].remove(&key);

        let mut current = parent_id;
        let mut surviving: Option<u32> = None;
        loop {
            let p = current;
            let p_level = self.internals[p as usize].level;
            let bit = self.bit_at(key, p_level);
            let opposite_bit = 1 - bit;
            match self.side(p, opposite_bit) {
                Some(Side::Child(_)) => {
                    let new_thread = if bit == 0 { succ_id } else { pred_id }
                        .expect("sibling subtree is non-empty, an adjacent leaf must exist");
                    self.set_side(p, bit, Side::Thread(new_thread));
                    surviving = Some(p);
                    break;
                }
                Some(Side::Thread(_)) => {
                    if p == self.root {
                        self.internals[p as usize].left = None;
                        self.internals[p as usize].right = None;
                        break;
                    }
                    let p_parent = self.internals[p as usize]
                        .parent
                        .expect("non-root internal node always has a parent");
                    self.levels[p_level].remove(&self.prefix(key, p_level));
                    self.free_internal(p);
                    current = p_parent;
                }
                None => unreachable!("non-root internal node always has both sides populated"),
            }
        }

        if let Some(sv) = surviving {
            self.fix_threads_after_remove(sv, key, leaf_id, pred_id, succ_id);
        }

        self.free_leaves.push(leaf_id);
        self.count -= 1;
        trace!("xfast remove key={key}");
        Ok(())
    }
}
