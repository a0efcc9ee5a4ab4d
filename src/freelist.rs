/// Free-block pool and the on-disk free list.
///
/// Blocks are handed out lowest first. When the image is finished the
/// leftovers are written as a chain of list blocks: each list block is
/// itself taken from the front of the pool, words 1..=9 hold the next nine
/// free block numbers and word 0 links to the following list block.
use std::collections::VecDeque;

use crate::error::Result;
use crate::image::BlockStore;
use crate::layout::*;

#[derive(Debug)]
pub struct FreeList {
    pool: VecDeque<usize>,
}

impl FreeList {
    /// Every allocatable data block, ascending.
    pub fn initialize() -> Self {
        FreeList {
            pool: (FIRST_DATA_BLOCK..BOOT_BLOCK).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn take_one(&mut self) -> Option<usize> {
        self.pool.pop_front()
    }

    /// Drain the pool into chained free-list blocks and return the first
    /// one, or 0 when nothing was left.
    pub fn finalize(&mut self, store: &mut BlockStore) -> Result<usize> {
        let mut holders = Vec::new();

        while let Some(holder) = self.pool.pop_front() {
            let n = FREE_PER_BLOCK.min(self.pool.len());
            let group: Vec<usize> = self.pool.drain(..n).collect();
            store.write(holder, 0, 0)?;
            for slot in 0..FREE_PER_BLOCK {
                let blk = group.get(slot).copied().unwrap_or(0);
                store.write(holder, slot + 1, blk as u32)?;
            }
            holders.push(holder);
        }

        for pair in holders.windows(2) {
            store.write(pair[0], 0, pair[1] as u32)?;
        }

        Ok(holders.first().copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_take_one_ascending() {
        let mut free = FreeList::initialize();
        assert_eq!(free.len(), BOOT_BLOCK - FIRST_DATA_BLOCK);
        assert_eq!(free.take_one(), Some(FIRST_DATA_BLOCK));
        assert_eq!(free.take_one(), Some(FIRST_DATA_BLOCK + 1));
    }

    #[test]
    fn test_exhaustion() {
        let mut free = FreeList::initialize();
        while free.take_one().is_some() {}
        assert_eq!(free.take_one(), None);
        let mut store = BlockStore::new();
        assert_eq!(free.finalize(&mut store).unwrap(), 0);
    }

    #[test]
    fn test_finalize_chain_layout() {
        let mut free = FreeList::initialize();
        let mut store = BlockStore::new();
        let head = free.finalize(&mut store).unwrap();

        assert_eq!(head, FIRST_DATA_BLOCK);
        // First holder lists the nine blocks right after it.
        for slot in 1..=FREE_PER_BLOCK {
            assert_eq!(store.read(head, slot), (FIRST_DATA_BLOCK + slot) as u32);
        }
        assert_eq!(store.read(head, 0), (FIRST_DATA_BLOCK + 10) as u32);
        assert_eq!(free.len(), 0);
    }

    #[test]
    fn test_finalize_partitions_pool() {
        let mut free = FreeList::initialize();
        let mut allocated = BTreeSet::new();
        for _ in 0..123 {
            allocated.insert(free.take_one().unwrap());
        }
        let mut store = BlockStore::new();
        let mut blk = free.finalize(&mut store).unwrap();

        let mut seen = BTreeSet::new();
        while blk != 0 {
            assert!(seen.insert(blk), "holder {blk} listed twice");
            for slot in 1..=FREE_PER_BLOCK {
                let listed = store.read(blk, slot) as usize;
                if listed != 0 {
                    assert!(seen.insert(listed), "block {listed} listed twice");
                }
            }
            blk = store.read(blk, 0) as usize;
        }

        assert!(seen.is_disjoint(&allocated));
        let all: BTreeSet<usize> = seen.union(&allocated).copied().collect();
        let expected: BTreeSet<usize> = (FIRST_DATA_BLOCK..BOOT_BLOCK).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_finalize_short_tail() {
        let mut free = FreeList::initialize();
        // Leave exactly 12 blocks: one full holder plus a holder with 1 entry.
        let keep = 12;
        while free.len() > keep {
            free.take_one();
        }
        let first = BOOT_BLOCK - keep;
        let mut store = BlockStore::new();
        let head = free.finalize(&mut store).unwrap();
        assert_eq!(head, first);
        let second = store.read(head, 0) as usize;
        assert_eq!(second, first + 10);
        assert_eq!(store.read(second, 1), (first + 11) as u32);
        assert_eq!(store.read(second, 2), 0);
        assert_eq!(store.read(second, 0), 0);
    }
}
