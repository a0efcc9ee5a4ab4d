/// In-memory disk image under construction.
///
/// `BlockStore` is the raw 8000 x 64-word surface. `Image` bundles it with
/// the mutable build state every operation needs: the free-block pool, the
/// stack of open directories, and the inode counter. Every builder step
/// takes `&mut Image`; nothing lives in globals.
use log::{debug, info};

use crate::dir::{DirFrame, DirPolicy};
use crate::error::{ImageError, Result};
use crate::freelist::FreeList;
use crate::layout::*;

pub type Block = [u32; WORDS_PER_BLOCK];

#[derive(Debug, Clone)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore {
    pub fn new() -> Self {
        BlockStore {
            blocks: vec![[0; WORDS_PER_BLOCK]; NUM_BLOCKS],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Unwritten words read as 0, including words past the end of the disk.
    pub fn read(&self, block: usize, word: usize) -> u32 {
        self.blocks
            .get(block)
            .and_then(|b| b.get(word))
            .copied()
            .unwrap_or(0)
    }

    pub fn write(&mut self, block: usize, word: usize, value: u32) -> Result<()> {
        let slot = self
            .blocks
            .get_mut(block)
            .and_then(|b| b.get_mut(word))
            .ok_or(ImageError::BlockOutOfRange { block })?;
        *slot = value & WORD_MASK;
        Ok(())
    }

    /// Write `words` starting at `offset` within `block`, running on into
    /// the following blocks as needed.
    pub fn write_words(&mut self, block: usize, offset: usize, words: &[u32]) -> Result<()> {
        let start = block * WORDS_PER_BLOCK + offset;
        let end = start + words.len();
        if end > NUM_BLOCKS * WORDS_PER_BLOCK {
            return Err(ImageError::BlockOutOfRange {
                block: (end - 1) / WORDS_PER_BLOCK,
            });
        }
        for (i, &w) in words.iter().enumerate() {
            let at = start + i;
            self.blocks[at / WORDS_PER_BLOCK][at % WORDS_PER_BLOCK] = w & WORD_MASK;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Image {
    pub(crate) store: BlockStore,
    pub(crate) free: FreeList,
    pub(crate) dirs: Vec<DirFrame>,
    pub(crate) next_inode: u32,
    pub(crate) last_inode: u32,
    pub(crate) policy: DirPolicy,
}

impl Image {
    pub fn new(policy: DirPolicy) -> Self {
        Image {
            store: BlockStore::new(),
            free: FreeList::initialize(),
            dirs: Vec::new(),
            next_inode: 1,
            last_inode: 0,
            policy,
        }
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BlockStore {
        &mut self.store
    }

    pub fn free_blocks(&self) -> usize {
        self.free.len()
    }

    /// Chain the remaining free blocks and record the chain head in sysdata.
    /// The filesystem part of the image is complete after this.
    pub fn finish(&mut self) -> Result<()> {
        if !self.dirs.is_empty() {
            debug!("{} directories still open at end of proto", self.dirs.len());
        }
        let left = self.free_blocks();
        let head = self.free.finalize(&mut self.store)?;
        self.store.write(SYSDATA_BLOCK, 0, head as u32)?;
        info!("{left} blocks left on the free list, head at block {head}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_masks_to_18_bits() {
        let mut store = BlockStore::new();
        store.write(10, 3, 0o1777777).unwrap();
        assert_eq!(store.read(10, 3), 0o777777);
        assert_eq!(store.read(10, 4), 0);
    }

    #[test]
    fn test_write_words_spans_blocks() {
        let mut store = BlockStore::new();
        let words: Vec<u32> = (1..=70).collect();
        store.write_words(100, 60, &words).unwrap();
        assert_eq!(store.read(100, 60), 1);
        assert_eq!(store.read(100, 63), 4);
        assert_eq!(store.read(101, 0), 5);
        assert_eq!(store.read(101, 63), 68);
        assert_eq!(store.read(102, 1), 70);
        assert_eq!(store.read(102, 2), 0);
    }

    #[test]
    fn test_out_of_range_writes_fail() {
        let mut store = BlockStore::new();
        assert_eq!(
            store.write(NUM_BLOCKS, 0, 1),
            Err(ImageError::BlockOutOfRange { block: NUM_BLOCKS })
        );
        assert!(store.write_words(NUM_BLOCKS - 1, 60, &[0; 5]).is_err());
        assert!(store.write_words(NUM_BLOCKS - 1, 60, &[0; 4]).is_ok());
    }

    #[test]
    fn test_default_store_is_full_size() {
        let store = BlockStore::default();
        assert_eq!(store.blocks().len(), NUM_BLOCKS);
        assert!(store.blocks().iter().all(|b| b.iter().all(|&w| w == 0)));
    }

    #[test]
    fn test_finish_records_free_list_head() {
        let mut image = Image::new(DirPolicy::default());
        image.finish().unwrap();
        assert_eq!(image.store().read(SYSDATA_BLOCK, 0), FIRST_DATA_BLOCK as u32);
        assert_eq!(image.free_blocks(), 0);
    }
}
