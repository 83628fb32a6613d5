//! Property table and property records
//!
//! Objects store named properties in a hash table with chained buckets.
//! Deleted slots are kept on a free list and reused by later insertions,
//! so iteration order is insertion order until a slot is recycled.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHasher;

use crate::value::Value;

/// Attribute bits of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const WRITABLE: u8 = 1 << 0;
    pub const ENUMERABLE: u8 = 1 << 1;
    pub const CONFIGURABLE: u8 = 1 << 2;

    /// Writable, enumerable and configurable: what a plain assignment creates
    pub const DEFAULT: PropertyFlags =
        PropertyFlags(Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE);

    /// No attribute set
    pub const NONE: PropertyFlags = PropertyFlags(0);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        PropertyFlags(bits & (Self::WRITABLE | Self::ENUMERABLE | Self::CONFIGURABLE))
    }

    #[inline]
    pub fn writable(self) -> bool {
        self.0 & Self::WRITABLE != 0
    }

    #[inline]
    pub fn enumerable(self) -> bool {
        self.0 & Self::ENUMERABLE != 0
    }

    #[inline]
    pub fn configurable(self) -> bool {
        self.0 & Self::CONFIGURABLE != 0
    }

    /// Return a copy with `bit` set or cleared
    #[inline]
    pub fn with(self, bit: u8, on: bool) -> Self {
        if on {
            PropertyFlags(self.0 | bit)
        } else {
            PropertyFlags(self.0 & !bit)
        }
    }
}

/// Storage of a property
#[derive(Debug, Clone)]
pub enum PropertySlot {
    /// Normal property with value
    Data(Value),
    /// Getter/setter pair; either half may be absent
    Accessor {
        getter: Option<Value>,
        setter: Option<Value>,
    },
}

/// A property in an object's property table
#[derive(Debug, Clone)]
pub struct Property {
    /// Property name; `None` marks a deleted slot on the free list
    key: Option<Rc<str>>,
    slot: PropertySlot,
    flags: PropertyFlags,
    /// Next entry in the hash chain or free list (index + 1, 0 = end)
    hash_next: u32,
}

impl Property {
    /// Property name (empty for a deleted slot)
    #[inline]
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    #[inline]
    pub fn slot(&self) -> &PropertySlot {
        &self.slot
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Data value, `None` for accessors
    #[inline]
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            PropertySlot::Data(v) => Some(v),
            PropertySlot::Accessor { .. } => None,
        }
    }

    #[inline]
    fn is_deleted(&self) -> bool {
        self.key.is_none()
    }
}

/// Named properties of one object
///
/// Records live in `properties`; `buckets` holds the head of each hash
/// chain as `index + 1` (0 = empty) and records link onward through
/// `hash_next`. Deleted records are chained from `first_free` instead.
#[derive(Debug)]
pub struct PropertyTable {
    live: u32,
    properties: Vec<Property>,
    buckets: Box<[u32]>,
    first_free: u32,
}

impl PropertyTable {
    const MIN_BUCKETS: usize = 4;

    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PropertyTable {
            live: 0,
            properties: Vec::with_capacity(capacity),
            buckets: vec![0; capacity.next_power_of_two().max(Self::MIN_BUCKETS)].into(),
            first_free: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    fn bucket_of(&self, key: &str) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & (self.buckets.len() - 1)
    }

    /// Record indices along the chain starting at `head`
    fn chain(&self, head: u32) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors((head != 0).then(|| head as usize - 1), move |&i| {
            let next = self.properties[i].hash_next;
            (next != 0).then(|| next as usize - 1)
        })
    }

    /// Index of the record named `key`
    pub fn find(&self, key: &str) -> Option<usize> {
        if self.live == 0 {
            return None;
        }
        self.chain(self.buckets[self.bucket_of(key)])
            .find(|&i| self.properties[i].key.as_deref() == Some(key))
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.find(key).map(|idx| &self.properties[idx])
    }

    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Assign a data value
    ///
    /// An existing property keeps its flags and becomes a data property;
    /// a new one is created with `PropertyFlags::DEFAULT`. Returns true if
    /// the property was created.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        match self.find(key) {
            Some(idx) => {
                self.properties[idx].slot = PropertySlot::Data(value);
                false
            }
            None => {
                self.insert_new(key, PropertySlot::Data(value), PropertyFlags::DEFAULT);
                true
            }
        }
    }

    /// Insert or replace a property with explicit slot and flags
    ///
    /// Returns true if the property was created.
    pub fn define(&mut self, key: &str, slot: PropertySlot, flags: PropertyFlags) -> bool {
        match self.find(key) {
            Some(idx) => {
                let prop = &mut self.properties[idx];
                prop.slot = slot;
                prop.flags = flags;
                false
            }
            None => {
                self.insert_new(key, slot, flags);
                true
            }
        }
    }

    fn insert_new(&mut self, key: &str, slot: PropertySlot, flags: PropertyFlags) {
        // Keep the load factor at or below 3/4
        if (self.live as usize + 1) * 4 > self.buckets.len() * 3 {
            self.rehash(self.buckets.len() * 2);
        }

        let bucket = self.bucket_of(key);
        let prop = Property {
            key: Some(Rc::from(key)),
            slot,
            flags,
            hash_next: self.buckets[bucket],
        };

        let idx = match self.first_free {
            0 => {
                self.properties.push(prop);
                self.properties.len() - 1
            }
            free => {
                let idx = free as usize - 1;
                self.first_free = self.properties[idx].hash_next;
                self.properties[idx] = prop;
                idx
            }
        };
        self.buckets[bucket] = idx as u32 + 1;
        self.live += 1;
    }

    /// Delete a property by name
    ///
    /// Returns true if the property existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(idx) = self.find(key) else {
            return false;
        };
        let bucket = self.bucket_of(key);
        let next = self.properties[idx].hash_next;
        let prev = self
            .chain(self.buckets[bucket])
            .find(|&i| self.properties[i].hash_next == idx as u32 + 1);
        match prev {
            Some(prev) => self.properties[prev].hash_next = next,
            None => self.buckets[bucket] = next,
        }

        // Drop the old value and push the record on the free list
        let prop = &mut self.properties[idx];
        prop.key = None;
        prop.slot = PropertySlot::Data(Value::Undefined);
        prop.hash_next = self.first_free;
        self.first_free = idx as u32 + 1;
        self.live -= 1;
        true
    }

    /// Rebuild the chains over `size` buckets
    fn rehash(&mut self, size: usize) {
        self.buckets = vec![0; size].into();
        for i in 0..self.properties.len() {
            let Some(key) = self.properties[i].key.clone() else {
                continue;
            };
            let bucket = self.bucket_of(&key);
            self.properties[i].hash_next = self.buckets[bucket];
            self.buckets[bucket] = i as u32 + 1;
        }
    }

    /// Live properties in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter(|p| !p.is_deleted())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(Property::key)
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}
