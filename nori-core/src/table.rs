//! Open-addressing string-keyed table.
//!
//! Backing store for JSON objects. All entries live directly in the slot
//! array; collisions resolve by linear probing with wraparound. Deleted
//! slots become tombstones so probe chains that pass through them stay
//! discoverable for keys that hashed earlier.
//!
//! # Invariants
//!
//! - Capacity is always a power of two, so `hash & (capacity - 1)` replaces
//!   the modulo. Every requested or grown capacity rounds up.
//! - Live entries stay at or below 3/4 of capacity after any insert.
//!   Tombstones count against the occupancy trigger too (a rehash reclaims
//!   them), which also guarantees probe loops terminate.
//! - At most one occupied slot per distinct key.

use crate::error::ErrorKind;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Smallest slot array the table will allocate.
const MIN_CAPACITY: usize = 16;

/// 64-bit FNV-1a over the raw bytes of a key.
#[inline]
fn fnv1a(key: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in key.as_bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// One bucket in the slot array.
#[derive(Debug, Clone)]
enum Slot<V> {
    /// Never held an entry since the last rehash; terminates probe chains.
    Empty,
    /// Previously occupied, now deleted. Probes continue through it.
    Tombstone,
    Occupied { key: String, value: V },
}

/// Generic string-keyed open-addressing table.
///
/// Iteration order is bucket order - an implementation artifact, not a
/// guarantee beyond "every live key appears exactly once."
#[derive(Debug, Clone)]
pub struct Table<V> {
    slots: Vec<Slot<V>>,
    /// Occupied slot count.
    live: usize,
    /// Tombstone count; reset to zero by every rehash.
    dead: usize,
}

impl<V> Table<V> {
    /// Create a table with the default minimum capacity.
    pub fn new() -> Result<Self, ErrorKind> {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create a table able to hold `capacity` slots, rounded up to the next
    /// power of two (minimum 16).
    pub fn with_capacity(capacity: usize) -> Result<Self, ErrorKind> {
        Ok(Self {
            slots: alloc_slots(round_capacity(capacity))?,
            live: 0,
            dead: 0,
        })
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Current slot array size. Introspection aid only.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Insert or overwrite. The previous value for an existing key is
    /// dropped; the stored key is reused.
    pub fn set(&mut self, key: String, value: V) -> Result<(), ErrorKind> {
        // Overwrites never change occupancy, so probe before reserving.
        if let Some(idx) = self.find(&key) {
            match &mut self.slots[idx] {
                Slot::Occupied { value: v, .. } => *v = value,
                _ => unreachable!("find returned a non-occupied slot"),
            }
            return Ok(());
        }

        self.reserve_for_insert()?;

        let mask = self.slots.len() - 1;
        let mut idx = (fnv1a(&key) as usize) & mask;
        loop {
            match &mut self.slots[idx] {
                Slot::Empty => {
                    self.slots[idx] = Slot::Occupied { key, value };
                    self.live += 1;
                    return Ok(());
                }
                // Tombstone or another key: keep probing.
                _ => idx = (idx + 1) & mask,
            }
        }
    }

    /// Look up a key. Probing continues through tombstones and stops only
    /// at a match or an empty slot.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.find(key).map(|idx| match &self.slots[idx] {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!("find returned a non-occupied slot"),
        })
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find(key)?;
        match &mut self.slots[idx] {
            Slot::Occupied { value, .. } => Some(value),
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Remove a key, returning its value. The slot becomes a tombstone,
    /// never empty, so later entries along the probe chain stay reachable.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.find(key)?;
        match std::mem::replace(&mut self.slots[idx], Slot::Tombstone) {
            Slot::Occupied { value, .. } => {
                self.live -= 1;
                self.dead += 1;
                Some(value)
            }
            _ => unreachable!("find returned a non-occupied slot"),
        }
    }

    /// Lazy iterator over `(key, value)` pairs in bucket order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    /// Probe to the slot index holding `key`, if present.
    fn find(&self, key: &str) -> Option<usize> {
        let mask = self.slots.len() - 1;
        let mut idx = (fnv1a(key) as usize) & mask;
        loop {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied { key: k, .. } if k == key => return Some(idx),
                _ => idx = (idx + 1) & mask,
            }
        }
    }

    /// Grow (or compact tombstones) before an insert if occupancy would
    /// exceed the 3/4 bound.
    fn reserve_for_insert(&mut self) -> Result<(), ErrorKind> {
        let cap = self.slots.len();
        if (self.live + self.dead + 1) * 4 <= cap * 3 {
            return Ok(());
        }
        // Double only if live entries alone are near the bound; otherwise
        // rehashing at the same capacity just sheds tombstones.
        let target = if (self.live + 1) * 4 > cap * 3 {
            cap * 2
        } else {
            cap
        };
        self.rehash(target)
    }

    /// Reprobe every surviving entry into a fresh power-of-two slot array,
    /// dropping tombstones.
    fn rehash(&mut self, capacity: usize) -> Result<(), ErrorKind> {
        let capacity = round_capacity(capacity);
        let mut slots = alloc_slots(capacity)?;
        let mask = capacity - 1;

        for slot in self.slots.drain(..) {
            if let Slot::Occupied { key, value } = slot {
                let mut idx = (fnv1a(&key) as usize) & mask;
                while !matches!(slots[idx], Slot::Empty) {
                    idx = (idx + 1) & mask;
                }
                slots[idx] = Slot::Occupied { key, value };
            }
        }

        self.slots = slots;
        self.dead = 0;
        Ok(())
    }
}

/// Round a requested capacity up to a power of two, at least `MIN_CAPACITY`.
fn round_capacity(capacity: usize) -> usize {
    capacity.next_power_of_two().max(MIN_CAPACITY)
}

/// Allocate a slot array of all-empty slots, reporting failure instead of
/// aborting.
fn alloc_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, ErrorKind> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| ErrorKind::AllocationFailure)?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

impl<V: PartialEq> PartialEq for Table<V> {
    /// Order-insensitive equality: same length and every key maps to an
    /// equal value.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Iterator over live entries. See [`Table::iter`].
pub struct Iter<'a, V> {
    slots: std::slice::Iter<'a, Slot<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied { key, value } = slot {
                return Some((key.as_str(), value));
            }
        }
        None
    }
}

impl<'a, V> IntoIterator for &'a Table<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_to_power_of_two() {
        assert_eq!(Table::<i32>::with_capacity(0).unwrap().capacity(), 16);
        assert_eq!(Table::<i32>::with_capacity(16).unwrap().capacity(), 16);
        assert_eq!(Table::<i32>::with_capacity(17).unwrap().capacity(), 32);
        assert_eq!(Table::<i32>::with_capacity(100).unwrap().capacity(), 128);
    }

    #[test]
    fn set_then_get() {
        let mut table = Table::new().unwrap();
        table.set("alpha".to_string(), 1).unwrap();
        table.set("beta".to_string(), 2).unwrap();

        assert_eq!(table.get("alpha"), Some(&1));
        assert_eq!(table.get("beta"), Some(&2));
        assert_eq!(table.get("gamma"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn set_overwrites_existing_key() {
        let mut table = Table::new().unwrap();
        table.set("k".to_string(), 1).unwrap();
        table.set("k".to_string(), 2).unwrap();

        assert_eq!(table.get("k"), Some(&2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn overwrite_at_occupancy_bound_does_not_grow() {
        // 12 live entries put a 16-slot table right at the 3/4 bound.
        let mut table = Table::new().unwrap();
        for i in 0..12 {
            table.set(format!("key{i}"), i).unwrap();
        }
        assert_eq!(table.capacity(), 16);

        table.set("key0".to_string(), 99).unwrap();

        assert_eq!(table.capacity(), 16);
        assert_eq!(table.get("key0"), Some(&99));
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn clone_is_independent() {
        let mut table = Table::new().unwrap();
        table.set("a".to_string(), 1).unwrap();
        table.set("b".to_string(), 2).unwrap();

        let mut copy = table.clone();
        copy.set("a".to_string(), 10).unwrap();
        copy.remove("b");

        assert_eq!(table.get("a"), Some(&1));
        assert_eq!(table.get("b"), Some(&2));
        assert_eq!(copy.get("a"), Some(&10));
        assert_eq!(copy.get("b"), None);
    }

    #[test]
    fn remove_leaves_probe_chain_intact() {
        // Enough keys that some probe chains collide and wrap. Removing a
        // key in the middle of a chain must not hide keys past it.
        let mut table = Table::new().unwrap();
        for i in 0..12 {
            table.set(format!("key{i}"), i).unwrap();
        }
        for i in 0..6 {
            assert_eq!(table.remove(&format!("key{i}")), Some(i));
        }
        for i in 6..12 {
            assert_eq!(table.get(&format!("key{i}")), Some(&i), "key{i} lost");
        }
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let mut table = Table::new().unwrap();
        table.set("present".to_string(), 1).unwrap();
        assert_eq!(table.remove("absent"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn reinsert_through_tombstone_loses_nothing() {
        let mut table = Table::new().unwrap();
        table.set("k".to_string(), 1).unwrap();
        assert_eq!(table.remove("k"), Some(1));
        table.set("k".to_string(), 2).unwrap();
        assert_eq!(table.get("k"), Some(&2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn growth_preserves_all_entries() {
        let mut table = Table::new().unwrap();
        for i in 0..500 {
            table.set(format!("entry-{i}"), i * 7).unwrap();
        }
        assert_eq!(table.len(), 500);
        assert!(table.capacity().is_power_of_two());
        // Load bound holds after every insert; check the final state.
        assert!(table.len() * 4 <= table.capacity() * 3);
        for i in 0..500 {
            assert_eq!(table.get(&format!("entry-{i}")), Some(&(i * 7)));
        }
    }

    #[test]
    fn churn_does_not_fill_table_with_tombstones() {
        // Repeated remove/insert of distinct keys must keep probes bounded
        // and lookups correct even though every cycle leaves a tombstone.
        let mut table = Table::new().unwrap();
        for round in 0..200 {
            table.set(format!("churn-{round}"), round).unwrap();
            if round >= 8 {
                assert_eq!(table.remove(&format!("churn-{}", round - 8)), Some(round - 8));
            }
        }
        assert_eq!(table.len(), 8);
        for round in 192..200 {
            assert_eq!(table.get(&format!("churn-{round}")), Some(&round));
        }
    }

    #[test]
    fn iter_yields_every_live_key_once() {
        let mut table = Table::new().unwrap();
        for i in 0..40 {
            table.set(format!("i{i}"), i).unwrap();
        }
        table.remove("i3");
        table.remove("i17");

        let mut seen: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 38);
        assert!(!seen.contains(&"i3"));
    }

    #[test]
    fn equality_ignores_bucket_order() {
        let mut a = Table::new().unwrap();
        let mut b = Table::with_capacity(64).unwrap();
        for i in 0..10 {
            a.set(format!("k{i}"), i).unwrap();
        }
        for i in (0..10).rev() {
            b.set(format!("k{i}"), i).unwrap();
        }
        assert_eq!(a, b);

        b.set("k0".to_string(), 99).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fnv1a_reference_values() {
        // Standard FNV-1a test vectors.
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a("foobar"), 0x85944171f73967e8);
    }
}
