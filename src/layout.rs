// Fixed geometry of the PDP-7 Unix disk image.
//
// The disk is 8000 blocks of 64 eighteen-bit words:
//   Block 0:           sysdata (word 0 = head of the free-block chain)
//   Block 1:           unused
//   Blocks 2..712:     inode table, 5 inodes of 12 words per block
//   Blocks 712..6400:  allocatable data blocks
//   Blocks 6400..8000: boot track (kernel image, character table)

/// One disk word is 18 bits wide.
pub const WORD_MASK: u32 = 0o777777;

pub const WORDS_PER_BLOCK: usize = 64;
pub const NUM_BLOCKS: usize = 8000;

pub const SYSDATA_BLOCK: usize = 0;
pub const FIRST_INODE_BLOCK: usize = 2;
pub const FIRST_DATA_BLOCK: usize = 712;
pub const BOOT_BLOCK: usize = 6400;

pub const INODE_SIZE: usize = 12;
pub const INODES_PER_BLOCK: usize = 5;
pub const NUM_INODE_BLOCKS: usize = FIRST_DATA_BLOCK - FIRST_INODE_BLOCK;
pub const MAX_INODE: u32 = (NUM_INODE_BLOCKS * INODES_PER_BLOCK) as u32 - 1;

/// Block pointer slots in an inode.
pub const NUM_PTRS: usize = 7;
/// Largest file (in words) that direct pointers can address.
pub const MAX_DIRECT_WORDS: usize = NUM_PTRS * WORDS_PER_BLOCK;

// Word offsets inside an inode
pub const I_FLAGS: usize = 0;
pub const I_PTRS: usize = 1;
pub const I_UID: usize = 8;
pub const I_NLINKS: usize = 9;
pub const I_SIZE: usize = 10;

pub const DIRENT_SIZE: usize = 8;
pub const DIRENT_NAME_WORDS: usize = 4;
pub const DIRENT_NAME_LEN: usize = DIRENT_NAME_WORDS * 2;

/// Raw block numbers kept in each free-list block (word 0 is the chain link).
pub const FREE_PER_BLOCK: usize = 9;

/// Inode of the "dd" directory every directory may point back to.
pub const DD_INODE: u32 = 4;

/// Bytes per word in the simh image, the unit the boot track is laid out in.
pub const SIMH_BYTES_PER_WORD: usize = 4;

/// Byte offset of the character table from the start of BOOT_BLOCK.
pub const CHARTABLE_BYTE_OFFSET: usize = 3072;

/// The same offset in words: block BOOT_BLOCK + 12, word 0.
pub const CHARTABLE_OFFSET: usize = CHARTABLE_BYTE_OFFSET / SIMH_BYTES_PER_WORD;
