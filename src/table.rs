//! Append-only node table with hash-consing.
//!
//! Values live in a plain `Vec` indexed by slot. Slot `0` is never handed out,
//! so every valid index is non-zero. Interned values are additionally chained
//! into hash buckets: [`Table::put`] returns the slot of an existing equal
//! value or appends a new one. Buckets are walked comparing values with `==`,
//! so two values are only merged if they are actually equal; the hash merely
//! selects the bucket.
//!
//! Slots are never freed. An index, once returned, denotes the same value for
//! the whole lifetime of the table.
use std::ops::Index;

use log::trace;

use crate::utils::MyHash;

struct Entry<T> {
    value: T,
    /// Next slot in the same bucket (`0` terminates the chain).
    next: usize,
    interned: bool,
}

pub struct Table<T> {
    /// Slot `i` is stored at `data[i - 1]`.
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
    /// Number of interned values.
    interned: usize,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: Vec::with_capacity(size),
            buckets: vec![0; size],
            bitmask: (size - 1) as u64,
            interned: 0,
        }
    }

    /// Number of allocated slots.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of slots reachable through the buckets.
    pub fn num_interned(&self) -> usize {
        self.interned
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index - 1].value
    }

    /// Append a value without interning it and return its index.
    pub fn add(&mut self, value: T) -> usize {
        self.data.push(Entry {
            value,
            next: 0,
            interned: false,
        });
        self.data.len()
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Look up an interned value equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            let entry = &self.data[index - 1];
            if &entry.value == value {
                return Some(index);
            }
            index = entry.next;
        }
        None
    }

    /// Return the index of the interned value equal to `value`, creating it if
    /// needed. The flag tells whether a new slot was allocated.
    pub fn put(&mut self, value: T) -> (bool, usize) {
        if let Some(index) = self.find(&value) {
            return (false, index);
        }

        if self.interned >= 2 * self.buckets.len() {
            self.grow();
        }

        let bucket_index = self.bucket_index(&value);
        self.data.push(Entry {
            value,
            next: self.buckets[bucket_index],
            interned: true,
        });
        let index = self.data.len();
        self.buckets[bucket_index] = index;
        self.interned += 1;
        (true, index)
    }

    /// Double the number of buckets and re-chain all interned slots.
    fn grow(&mut self) {
        let size = self.buckets.len() * 2;
        trace!("table: growing to {} buckets", size);

        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;
        for i in 0..self.data.len() {
            if !self.data[i].interned {
                continue;
            }
            let bucket_index = self.bucket_index(&self.data[i].value);
            self.data[i].next = self.buckets[bucket_index];
            self.buckets[bucket_index] = i + 1;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
