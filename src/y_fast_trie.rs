//! Y-fast trie: layers balanced sorted buckets of amortized size `Θ(w)` on
//! top of an [`XFastTrie`] of representatives, giving `O(n/w)` space while
//! keeping `O(log w)` queries.

use dashmap::DashMap;
use log::debug;

use crate::bucket::SortedBucket;
use crate::error::{Result, TrieError};
use crate::x_fast_trie::XFastTrie;

fn representative(value: u64, width: usize) -> u64 {
    let w = width as u64;
    let ceiling = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
    ((value / w) * w + (w - 1)).min(ceiling)
}

/// Ordered set of `u64` keys in `[0, 2^width)`, partitioned into buckets of
/// size `[width/2, 2*width]` anchored on representatives stored in an
/// [`XFastTrie`].
#[derive(Debug)]
pub struct YFastTrie {
    width: usize,
    partitions: XFastTrie,
    buckets: DashMap<u64, SortedBucket>,
    min_key: Option<u64>,
    max_key: Option<u64>,
    count: usize,
}

impl YFastTrie {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            partitions: XFastTrie::new(width),
            buckets: DashMap::new(),
            min_key: None,
            max_key: None,
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

    pub fn min(&self) -> Option<u64> {
        self.min_key
    }

    pub fn max(&self) -> Option<u64> {
        self.max_key
    }

    pub fn clear(&mut self) {
        self.partitions.clear();
        self.buckets.clear();
        self.min_key = None;
        self.max_key = None;
        self.count = 0;
    }

    fn min_bucket(&self) -> usize {
        self.width / 2
    }

    fn max_bucket(&self) -> usize {
        self.width * 2
    }

    /// The representative of the bucket that owns `v`, per spec: `successor(v - 1)`
    /// rather than `predecessor`/`successor(v)` directly, so that `v` being itself
    /// a representative still resolves to its own bucket.
    fn owning_representative(&self, v: u64) -> Option<u64> {
        if self.partitions.is_empty() {
            return None;
        }
        match self.min_key {
            // v == 0 is already covered here: min_key is a u64, so v <= min
            // always holds when v == 0.
            Some(min) if v <= min => self.partitions.min(),
            _ => self
                .partitions
                .successor(v - 1)
                .expect("partitions non-empty, checked above"),
        }
    }

    pub fn contains(&self, key: u64) -> bool {
        match self.owning_representative(key) {
            Some(rep) => self
                .buckets
                .get(&rep)
                .map(|b| b.contains(key))
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn insert(&mut self, key: u64) {
        let rep = match self.owning_representative(key) {
            Some(rep) => rep,
            None => {
                let rep = representative(key, self.width);
                self.partitions.insert(rep);
                self.buckets.insert(rep, SortedBucket::new());
                rep
            }
        };

        let inserted = {
            let mut bucket = self.buckets.get_mut(&rep).expect("representative has a bucket");
            bucket.insert(key)
        };
        if !inserted {
            return;
        }

        self.min_key = Some(self.min_key.map_or(key, |m| m.min(key)));
        self.max_key = Some(self.max_key.map_or(key, |m| m.max(key)));

        let needs_split = self
            .buckets
            .get(&rep)
            .map(|b| b.len() > self.max_bucket())
            .unwrap_or(false);
        if needs_split {
            self.split_bucket(rep);
        }

        self.count += 1;
    }

    fn split_bucket(&mut self, rep: u64) {
        self.partitions.remove(rep).expect("representative is present");
        let bucket = self.buckets.remove(&rep).expect("representative has a bucket").1;
        let (left, right) = bucket.split();

        let left_rep = representative(left.max().expect("split halves are non-empty"), self.width);
        let right_rep = representative(right.max().expect("split halves are non-empty"), self.width);
        debug!(
            "y-fast split rep={rep} into left_rep={left_rep} (n={}) right_rep={right_rep} (n={})",
            left.len(),
            right.len()
        );
        self.partitions.insert(left_rep);
        self.partitions.insert(right_rep);
        self.buckets.insert(left_rep, left);
        self.buckets.insert(right_rep, right);
    }

    pub fn remove(&mut self, key: u64) -> Result<()> {
        if self.is_empty() {
            return Err(TrieError::empty());
        }
        let rep = self.owning_representative(key).ok_or_else(|| TrieError::absent(key))?;

        let removed = {
            let mut bucket = self.buckets.get_mut(&rep).expect("representative has a bucket");
            bucket.remove(key)
        };
        if !removed {
            return Err(TrieError::absent(key));
        }

        // Compute both replacements against the pre-mutation min_key/max_key
        // before writing either back: writing the first would make the
        // other's is_empty()/extrema lookup observe a half-updated state
        // (count isn't decremented until below, so is_empty() still says
        // "non-empty" while min_key or max_key is transiently None).
        let new_min = (Some(key) == self.min_key).then(|| self.successor(key).ok().flatten());
        let new_max = (Some(key) == self.max_key).then(|| self.predecessor(key).ok().flatten());
        if let Some(m) = new_min {
            self.min_key = m;
        }
        if let Some(m) = new_max {
            self.max_key = m;
        }

        let remaining = self.buckets.get(&rep).map(|b| b.len()).unwrap_or(0);
        if remaining == 0 {
            self.partitions.remove(rep).expect("representative is present");
            self.buckets.remove(&rep);
        } else if remaining < self.min_bucket() && self.partitions.len() > 1 {
            self.merge_bucket(rep);
        }

        self.count -= 1;
        Ok(())
    }

    /// Merges the bucket at `rep` with a neighbor, preferring the
    /// predecessor representative and falling back to the successor.
    fn merge_bucket(&mut self, rep: u64) {
        let pred_rep = self.partitions.predecessor(rep).expect("partitions non-empty");
        let succ_rep = self.partitions.successor(rep).expect("partitions non-empty");
        let (neighbor_rep, neighbor_is_pred) = match pred_rep {
            Some(p) => (p, true),
            None => (succ_rep.expect("bucket count > 1 implies a neighbor exists"), false),
        };

        self.partitions.remove(rep).expect("representative is present");
        self.partitions.remove(neighbor_rep).expect("neighbor representative is present");
        let this_bucket = self.buckets.remove(&rep).expect("representative has a bucket").1;
        let neighbor_bucket = self
            .buckets
            .remove(&neighbor_rep)
            .expect("neighbor representative has a bucket")
            .1;

        let (mut left, mut right) = if neighbor_is_pred {
            (neighbor_bucket, this_bucket)
        } else {
            (this_bucket, neighbor_bucket)
        };

        let combined_len = left.len() + right.len();
        if combined_len <= self.max_bucket() {
            left.append(right);
            let new_rep = representative(left.max().expect("merge halves are non-empty"), self.width);
            debug!("y-fast merge rep={rep} neighbor={neighbor_rep} into rep={new_rep} (n={combined_len})");
            self.partitions.insert(new_rep);
            self.buckets.insert(new_rep, left);
            return;
        }

        // Rebalance: pop from the larger side's far end until both halves are
        // roughly even, mirroring the source's pop-from-tail-of-left /
        // pop-from-head-of-right rebalancing.
        let target = combined_len / 2;
        while left.len() > target {
            let v = left.pop_back().expect("left bucket non-empty while oversized");
            right.insert(v);
        }
        while right.len() > combined_len - target {
            let v = right.pop_front().expect("right bucket non-empty while oversized");
            left.insert(v);
        }

        let left_rep = representative(left.max().expect("rebalanced halves are non-empty"), self.width);
        let right_rep = representative(right.max().expect("rebalanced halves are non-empty"), self.width);
        debug!(
            "y-fast merge-rebalance rep={rep} neighbor={neighbor_rep} into left_rep={left_rep} (n={}) right_rep={right_rep} (n={})",
            left.len(),
            right.len()
        );
        self.partitions.insert(left_rep);
        self.partitions.insert(right_rep);
        self.buckets.insert(left_rep, left);
        self.buckets.insert(right_rep, right);
    }

    pub fn predecessor(&self, key: u64) -> Result<Option<u64>> {
        if self.is_empty() {
            return Err(TrieError::empty());
        }
        let min = self.min_key.expect("non-empty trie has a minimum");
        let max = self.max_key.expect("non-empty trie has a maximum");
        if key <= min {
            return Ok(None);
        }
        if key > max {
            return Ok(Some(max));
        }

        let rep = self.owning_representative(key).expect("non-empty trie has a bucket");
        let bucket = self.buckets.get(&rep).expect("representative has a bucket");
        if bucket.min().map(|m| m >= key).unwrap_or(true) {
            drop(bucket);
            let prev_rep = self
                .partitions
                .predecessor(rep)
                .expect("partitions non-empty")
                .expect("key > min_key implies a predecessor bucket exists");
            return Ok(self.buckets.get(&prev_rep).and_then(|b| b.max()));
        }
        let idx = bucket.bisect_left(key);
        Ok(if idx == 0 { None } else { bucket.get(idx - 1) })
    }

    pub fn successor(&self, key: u64) -> Result<Option<u64>> {
        if self.is_empty() {
            return Err(TrieError::empty());
        }
        let min = self.min_key.expect("non-empty trie has a minimum");
        let max = self.max_key.expect("non-empty trie has a maximum");
        if key >= max {
            return Ok(None);
        }
        if key < min {
            return Ok(Some(min));
        }

        let rep = self.owning_representative(key).expect("non-empty trie has a bucket");
        let bucket = self.buckets.get(&rep).expect("representative has a bucket");
        if bucket.max().map(|m| m <= key).unwrap_or(true) {
            drop(bucket);
            let next_rep = self
                .partitions
                .successor(rep)
                .expect("partitions non-empty")
                .expect("key < max_key implies a successor bucket exists");
            return Ok(self.buckets.get(&next_rep).and_then(|b| b.min()));
        }
        let idx = bucket.bisect_right(key);
        Ok(bucket.get(idx))
    }
}
