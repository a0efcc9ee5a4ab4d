/// Image serializers.
///
/// list: octal dump, 8 lines of 8 words per block followed by the text
///       rendering of those words, blank line between blocks
/// ptr:  paper tape, 3 bytes per word
/// simh: SimH disk, 4 little-endian bytes per word
///
/// The ptr and simh images start with a full-size run of zero words
/// standing in for the other half of the drive, then the real blocks.
use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::image::BlockStore;
use crate::layout::*;
use crate::word::{ascii_pair, ptr_encode, simh_encode};

const WORDS_PER_LINE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    List,
    Ptr,
    Simh,
}

pub fn write_image<W: Write>(store: &BlockStore, format: Format, out: &mut W) -> io::Result<()> {
    match format {
        Format::List => write_list(store, out),
        Format::Ptr => write_words(store, out, |w| ptr_encode(w).to_vec()),
        Format::Simh => write_words(store, out, |w| simh_encode(w).to_vec()),
    }
}

fn write_list<W: Write>(store: &BlockStore, out: &mut W) -> io::Result<()> {
    for block in store.blocks() {
        for line in block.chunks(WORDS_PER_LINE) {
            let octal: Vec<String> = line.iter().map(|w| format!("{w:06o}")).collect();
            let text: String = line.iter().flat_map(|&w| ascii_pair(w)).collect();
            writeln!(out, "{}  {}", octal.join(" "), text)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_words<W: Write>(
    store: &BlockStore,
    out: &mut W,
    encode: impl Fn(u32) -> Vec<u8>,
) -> io::Result<()> {
    let zero = encode(0);
    for _ in 0..NUM_BLOCKS * WORDS_PER_BLOCK {
        out.write_all(&zero)?;
    }
    for block in store.blocks() {
        for &w in block.iter() {
            out.write_all(&encode(w))?;
        }
    }
    Ok(())
}

pub fn save(store: &BlockStore, format: Format, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
    let mut out = BufWriter::new(file);
    write_image(store, format, &mut out)
        .and_then(|_| out.flush())
        .with_context(|| format!("Failed to write {path:?}"))?;
    info!("wrote {format:?} image to {path:?}");
    Ok(())
}
