/// Block allocation and indirect pointer tables.
use log::debug;

use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::layout::*;

impl Image {
    /// Take enough whole blocks for `words` words off the free pool.
    ///
    /// The request is checked against the pool before anything is taken, so
    /// a failed allocation leaves the image untouched.
    pub fn allocate(&mut self, words: usize) -> Result<Vec<usize>> {
        let requested = words.div_ceil(WORDS_PER_BLOCK);
        let available = self.free.len();
        if requested > available {
            return Err(ImageError::OutOfBlocks {
                requested,
                available,
            });
        }

        let mut blocks = Vec::with_capacity(requested);
        for _ in 0..requested {
            let blk = self.free.take_one().ok_or(ImageError::OutOfBlocks {
                requested,
                available,
            })?;
            blocks.push(blk);
        }
        if !blocks.is_empty() {
            debug!("allocated {} block(s) {:?}", blocks.len(), blocks);
        }
        Ok(blocks)
    }

    /// Spread `data` block numbers over freshly allocated indirect blocks,
    /// 64 per block, and return the indirect block numbers.
    pub fn build_indirect(&mut self, data: &[usize]) -> Result<Vec<usize>> {
        let needed = data.len().div_ceil(WORDS_PER_BLOCK);
        if needed > NUM_PTRS {
            return Err(ImageError::IndirectOverflow { blocks: data.len() });
        }

        let indirect = self.allocate(needed * WORDS_PER_BLOCK)?;
        for (&blk, chunk) in indirect.iter().zip(data.chunks(WORDS_PER_BLOCK)) {
            let ptrs: Vec<u32> = chunk.iter().map(|&b| b as u32).collect();
            self.store.write_words(blk, 0, &ptrs)?;
        }
        Ok(indirect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::DirPolicy;

    #[test]
    fn test_allocate_rounds_up() {
        let mut image = Image::new(DirPolicy::default());
        assert_eq!(image.allocate(0).unwrap(), Vec::<usize>::new());
        assert_eq!(image.allocate(1).unwrap(), vec![712]);
        assert_eq!(image.allocate(64).unwrap(), vec![713]);
        assert_eq!(image.allocate(65).unwrap(), vec![714, 715]);
    }

    #[test]
    fn test_allocate_exhaustion_leaves_pool() {
        let mut image = Image::new(DirPolicy::default());
        let total = image.free_blocks();
        image.allocate((total - 2) * WORDS_PER_BLOCK).unwrap();

        let err = image.allocate(3 * WORDS_PER_BLOCK).unwrap_err();
        assert_eq!(
            err,
            ImageError::OutOfBlocks {
                requested: 3,
                available: 2
            }
        );
        assert_eq!(image.free_blocks(), 2);

        image.allocate(2 * WORDS_PER_BLOCK).unwrap();
        assert!(matches!(
            image.allocate(1),
            Err(ImageError::OutOfBlocks { requested: 1, available: 0 })
        ));
    }

    #[test]
    fn test_build_indirect_fills_tables() {
        let mut image = Image::new(DirPolicy::default());
        let data: Vec<usize> = (1000..1100).collect();
        let indirect = image.build_indirect(&data).unwrap();
        assert_eq!(indirect, vec![712, 713]);
        assert_eq!(image.store.read(712, 0), 1000);
        assert_eq!(image.store.read(712, 63), 1063);
        assert_eq!(image.store.read(713, 0), 1064);
        assert_eq!(image.store.read(713, 35), 1099);
        assert_eq!(image.store.read(713, 36), 0);
    }

    #[test]
    fn test_build_indirect_ceiling() {
        let mut image = Image::new(DirPolicy::default());
        let data: Vec<usize> = (0..NUM_PTRS * WORDS_PER_BLOCK + 1).collect();
        assert_eq!(
            image.build_indirect(&data),
            Err(ImageError::IndirectOverflow { blocks: data.len() })
        );
        let before = image.free_blocks();
        assert_eq!(before, BOOT_BLOCK - FIRST_DATA_BLOCK);
    }
}
