//! Value sequences
//!
//! Backing store of `Array` and the generic `Vector`. Elements live in a
//! dense prefix; a write that would open a wide gap past it goes to a map
//! keyed by index instead. The length is tracked on its own, so declaring
//! a large length or writing at a large index never materializes the gap.
//! Unset positions read as `undefined`.

use crate::value::Value;
use rustc_hash::FxHashMap;

/// Widest gap past the dense prefix that a write still fills in place
pub const DENSE_GAP: usize = 1024;

/// Sequence of values with a possibly sparse tail
#[derive(Debug, Clone, Default)]
pub struct Elements {
    dense: Vec<Value>,
    sparse: FxHashMap<usize, Value>,
    length: usize,
}

impl Elements {
    /// Empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// `length` unset elements; nothing is allocated for them
    pub fn with_len(length: usize) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// Sequence holding a copy of `values`
    pub fn from_values(values: &[Value]) -> Self {
        Self {
            dense: values.to_vec(),
            sparse: FxHashMap::default(),
            length: values.len(),
        }
    }

    /// Number of positions, set or not
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the length is zero
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element at `index`; `undefined` when unset or out of range
    pub fn get(&self, index: usize) -> Value {
        match self.dense.get(index) {
            Some(value) => value.clone(),
            None => self.sparse.get(&index).cloned().unwrap_or_default(),
        }
    }

    /// Store at `index`, extending the length past it if needed
    pub fn set(&mut self, index: usize, value: Value) {
        let dense_len = self.dense.len();
        if index < dense_len {
            self.dense[index] = value;
        } else if index - dense_len <= DENSE_GAP {
            self.fill_dense(index);
            self.dense.push(value);
            self.absorb_sparse();
        } else {
            self.sparse.insert(index, value);
        }
        self.length = self.length.max(index + 1);
    }

    /// Reset `index` to `undefined` without changing the length
    pub fn clear(&mut self, index: usize) {
        match self.dense.get_mut(index) {
            Some(slot) => *slot = Value::Undefined,
            None => {
                self.sparse.remove(&index);
            }
        }
    }

    /// Change the length, dropping elements past it
    pub fn set_len(&mut self, length: usize) {
        if length < self.dense.len() {
            self.dense.truncate(length);
        }
        if length < self.length {
            self.sparse.retain(|&index, _| index < length);
        }
        self.length = length;
    }

    /// Append `values`, returning the new length
    pub fn push(&mut self, values: &[Value]) -> usize {
        for value in values {
            self.set(self.length, value.clone());
        }
        self.length
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Value {
        if self.length == 0 {
            return Value::Undefined;
        }
        self.length -= 1;
        if self.length < self.dense.len() {
            self.dense.pop().unwrap_or_default()
        } else {
            self.sparse.remove(&self.length).unwrap_or_default()
        }
    }

    /// Stored elements in index order. Gaps in the sparse tail are skipped.
    pub fn present(&self) -> Vec<(usize, Value)> {
        let mut items: Vec<(usize, Value)> = self.dense.iter().cloned().enumerate().collect();
        let mut tail: Vec<(usize, Value)> = self
            .sparse
            .iter()
            .map(|(index, value)| (*index, value.clone()))
            .collect();
        tail.sort_unstable_by_key(|(index, _)| *index);
        items.extend(tail);
        items
    }

    /// Every element in order, unset positions as `undefined`
    pub fn to_vec(&self) -> Vec<Value> {
        (0..self.length).map(|index| self.get(index)).collect()
    }

    /// Pad the dense prefix with `undefined` (or sparse entries) up to `end`
    fn fill_dense(&mut self, end: usize) {
        while self.dense.len() < end {
            let next = self.sparse.remove(&self.dense.len()).unwrap_or_default();
            self.dense.push(next);
        }
    }

    /// Move sparse entries that now continue the dense prefix into it
    fn absorb_sparse(&mut self) {
        while let Some(next) = self.sparse.remove(&self.dense.len()) {
            self.dense.push(next);
        }
    }
}
