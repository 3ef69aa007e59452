//! The bank: an ordered multiset of item stacks.
//!
//! Counts are kept per item id alongside an insertion-ordered list of
//! distinct ids. Slots used equals the number of distinct ids; removing the
//! last unit of an item frees its slot. Capacity is supplied by the caller
//! (it derives from shop state, which the inventory does not know about).

use std::collections::HashMap;

use crate::error::SimError;
use crate::types::ItemId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    counts: HashMap<ItemId, u32>,
    order: Vec<ItemId>,
}

/// One stack in insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

/// A failed removal: the inventory holds fewer units than requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemShortfall {
    pub item: ItemId,
    pub needed: u32,
    pub have: u32,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_of(&self, item: ItemId) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    /// Number of occupied slots (distinct item ids).
    pub fn slots_used(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has(&self, item: ItemId, count: u32) -> bool {
        self.count_of(item) >= count
    }

    /// Would adding `item` need a new slot?
    pub fn needs_slot(&self, item: ItemId) -> bool {
        !self.counts.contains_key(&item)
    }

    /// Stacks in insertion order. Every yielded count is >= 1.
    pub fn stacks(&self) -> impl Iterator<Item = ItemStack> + '_ {
        self.order.iter().map(|&item| ItemStack {
            item,
            count: self.counts[&item],
        })
    }

    /// Add `count` of `item`, refusing a new item type when all `capacity`
    /// slots are taken. Existing stacks always accept more units.
    pub fn add(&mut self, item: ItemId, count: u32, capacity: usize) -> Result<(), SimError> {
        if count == 0 {
            return Ok(());
        }
        if self.needs_slot(item) {
            if self.slots_used() >= capacity {
                return Err(SimError::InventoryFull { item });
            }
            self.order.push(item);
        }
        *self.counts.entry(item).or_insert(0) += count;
        Ok(())
    }

    /// Remove exactly `count` of `item`; fails without mutating when short.
    pub fn remove(&mut self, item: ItemId, count: u32) -> Result<(), ItemShortfall> {
        if count == 0 {
            return Ok(());
        }
        let have = self.count_of(item);
        if have < count {
            return Err(ItemShortfall {
                item,
                needed: count,
                have,
            });
        }
        if have == count {
            self.counts.remove(&item);
            self.order.retain(|&i| i != item);
        } else {
            *self.counts.get_mut(&item).expect("checked above") -= count;
        }
        Ok(())
    }

    /// Remove an entire stack, returning its count (0 if absent).
    pub fn remove_stack(&mut self, item: ItemId) -> u32 {
        match self.counts.remove(&item) {
            Some(count) => {
                self.order.retain(|&i| i != item);
                count
            }
            None => 0,
        }
    }

    /// Every id in the order list has a positive count.
    pub fn check_invariants(&self) -> bool {
        self.order.len() == self.counts.len()
            && self.order.iter().all(|i| self.count_of(*i) >= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGS: ItemId = ItemId(0);
    const ORE: ItemId = ItemId(1);
    const FISH: ItemId = ItemId(2);

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut inv = Inventory::new();
        inv.add(ORE, 3, 10).unwrap();
        inv.add(LOGS, 1, 10).unwrap();
        inv.add(ORE, 2, 10).unwrap();

        let stacks: Vec<_> = inv.stacks().collect();
        assert_eq!(stacks.len(), 2);
        assert_eq!(stacks[0].item, ORE);
        assert_eq!(stacks[0].count, 5);
        assert_eq!(stacks[1].item, LOGS);
        assert_eq!(inv.slots_used(), 2);
    }

    #[test]
    fn test_capacity_refuses_new_types_only() {
        let mut inv = Inventory::new();
        inv.add(LOGS, 1, 1).unwrap();
        assert!(matches!(
            inv.add(ORE, 1, 1),
            Err(SimError::InventoryFull { item }) if item == ORE
        ));
        // Existing stacks still grow at capacity.
        inv.add(LOGS, 99, 1).unwrap();
        assert_eq!(inv.count_of(LOGS), 100);
    }

    #[test]
    fn test_remove_last_unit_frees_slot() {
        let mut inv = Inventory::new();
        inv.add(LOGS, 2, 10).unwrap();
        inv.remove(LOGS, 1).unwrap();
        assert_eq!(inv.slots_used(), 1);
        inv.remove(LOGS, 1).unwrap();
        assert_eq!(inv.slots_used(), 0);
        assert!(inv.check_invariants());
    }

    #[test]
    fn test_remove_short_leaves_state_unchanged() {
        let mut inv = Inventory::new();
        inv.add(FISH, 2, 10).unwrap();
        let before = inv.clone();
        assert!(inv.remove(FISH, 3).is_err());
        assert_eq!(inv, before);
    }

    #[test]
    fn test_remove_stack() {
        let mut inv = Inventory::new();
        inv.add(FISH, 7, 10).unwrap();
        assert_eq!(inv.remove_stack(FISH), 7);
        assert_eq!(inv.remove_stack(FISH), 0);
        assert!(inv.is_empty());
    }
}
