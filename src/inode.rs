/// Inode table encoding.
///
/// Inode layout (12 words):
///   0      flags
///   1..=7  block pointers (indirect blocks when LARGE is set)
///   8      uid
///   9      link count, stored negated: every new name decrements it
///   10     size in words
///   11     unused
use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{ImageError, Result};
use crate::image::Image;
use crate::layout::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InodeFlags: u32 {
        const USED = 0o400000;
        const LARGE = 0o200000;
        const SPECIAL = 0o000040;
        const DIR = 0o000020;
        const OWNER_READ = 0o000010;
        const OWNER_WRITE = 0o000004;
        const WORLD_READ = 0o000002;
        const WORLD_WRITE = 0o000001;

        const PERMS = Self::OWNER_READ.bits()
            | Self::OWNER_WRITE.bits()
            | Self::WORLD_READ.bits()
            | Self::WORLD_WRITE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Special,
}

impl FileKind {
    fn flags(self) -> InodeFlags {
        match self {
            FileKind::File => InodeFlags::empty(),
            FileKind::Directory => InodeFlags::DIR,
            FileKind::Special => InodeFlags::SPECIAL,
        }
    }
}

/// Block and word offset of an inode in the table.
pub fn locate(inode: u32) -> (usize, usize) {
    let n = inode as usize;
    (
        FIRST_INODE_BLOCK + n / INODES_PER_BLOCK,
        INODE_SIZE * (n % INODES_PER_BLOCK),
    )
}

pub(crate) fn check_range(inode: u32) -> Result<()> {
    if inode == 0 || inode > MAX_INODE {
        return Err(ImageError::InodeOutOfRange { inode });
    }
    Ok(())
}

impl Image {
    /// The number `allocate_inode` would return, without issuing it.
    pub fn peek_inode(&self, explicit: Option<u32>) -> Result<u32> {
        let inode = explicit.unwrap_or(self.next_inode);
        check_range(inode)?;
        Ok(inode)
    }

    /// Hand out the next inode number, or honour a pinned one.
    ///
    /// A pinned number below the counter has already been issued: it is
    /// returned as asked but the counter does not move.
    pub fn allocate_inode(&mut self, explicit: Option<u32>) -> Result<u32> {
        let inode = self.peek_inode(explicit)?;
        if inode < self.next_inode {
            warn!(
                "inode {inode} requested but numbering is already at {}, counter unchanged",
                self.next_inode
            );
        } else {
            self.next_inode = inode + 1;
        }
        Ok(inode)
    }

    pub fn fill_inode(
        &mut self,
        inode: u32,
        perms: InodeFlags,
        kind: FileKind,
        uid: i32,
        size: usize,
        ptrs: &[usize],
    ) -> Result<()> {
        check_range(inode)?;
        if ptrs.len() > NUM_PTRS {
            return Err(ImageError::TooManyPointers {
                inode,
                count: ptrs.len(),
            });
        }

        let mut flags = (perms & InodeFlags::PERMS) | kind.flags() | InodeFlags::USED;
        if size > MAX_DIRECT_WORDS {
            flags |= InodeFlags::LARGE;
        }

        let (block, offset) = locate(inode);
        self.store.write(block, offset + I_FLAGS, flags.bits())?;
        for slot in 0..NUM_PTRS {
            let ptr = ptrs.get(slot).copied().unwrap_or(0) as u32;
            self.store.write(block, offset + I_PTRS + slot, ptr)?;
        }
        self.store.write(block, offset + I_UID, uid as u32)?;
        self.store.write(block, offset + I_NLINKS, 0)?;
        self.store.write(block, offset + I_SIZE, size as u32)?;

        debug!("inode {inode}: {kind:?} flags {:06o} size {size} ptrs {ptrs:?}", flags.bits());
        self.last_inode = inode;
        Ok(())
    }

    pub fn inode_word(&self, inode: u32, field: usize) -> u32 {
        let (block, offset) = locate(inode);
        self.store.read(block, offset + field)
    }

    fn set_inode_word(&mut self, inode: u32, field: usize, value: u32) -> Result<()> {
        check_range(inode)?;
        let (block, offset) = locate(inode);
        self.store.write(block, offset + field, value)
    }

    pub fn grow_size(&mut self, inode: u32, delta: usize) -> Result<()> {
        let size = self.inode_word(inode, I_SIZE);
        self.set_inode_word(inode, I_SIZE, size.wrapping_add(delta as u32))
    }

    /// One more name refers to `inode`. The count is kept negated.
    pub fn bump_link(&mut self, inode: u32) -> Result<()> {
        let links = self.inode_word(inode, I_NLINKS);
        self.set_inode_word(inode, I_NLINKS, links.wrapping_sub(1))
    }

    /// First unused pointer slot of an inode, if any.
    pub(crate) fn free_ptr_slot(&self, inode: u32) -> Option<usize> {
        (0..NUM_PTRS).find(|&slot| self.inode_word(inode, I_PTRS + slot) == 0)
    }

    pub(crate) fn set_ptr(&mut self, inode: u32, slot: usize, block: usize) -> Result<()> {
        self.set_inode_word(inode, I_PTRS + slot, block as u32)
    }
}
