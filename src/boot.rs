/// Boot track contents.
///
/// The kernel image goes at the start of the boot track and the
/// character table 3072 bytes (768 simh words) into it. Both are plain word
/// streams laid down with the block store's sequential write.
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::image::Image;
use crate::layout::*;
use crate::payload;

pub fn load_boot_track(
    image: &mut Image,
    kernel: Option<&Path>,
    chartable: Option<&Path>,
) -> Result<()> {
    if let Some(path) = kernel {
        write_at(image, path, 0)?;
    }
    if let Some(path) = chartable {
        write_at(image, path, CHARTABLE_OFFSET)?;
    }
    Ok(())
}

fn write_at(image: &mut Image, path: &Path, offset: usize) -> Result<()> {
    let words = payload::load(path)?;
    image
        .store_mut()
        .write_words(BOOT_BLOCK, offset, &words)
        .with_context(|| format!("{path:?} does not fit on the boot track"))?;
    info!(
        "{path:?}: {} words at block {} word {}",
        words.len(),
        BOOT_BLOCK + offset / WORDS_PER_BLOCK,
        offset % WORDS_PER_BLOCK
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::DirPolicy;
    use crate::word::{pack_chars, ptr_encode};
    use std::fs;

    #[test]
    fn test_kernel_and_chartable() {
        let dir = std::env::temp_dir();
        let kernel = dir.join(format!("mkfs7-{}-kernel", std::process::id()));
        let table = dir.join(format!("mkfs7-{}-chartable", std::process::id()));
        let tape: Vec<u8> = [0o740040u32, 0o1, 0o2].iter().flat_map(|&w| ptr_encode(w)).collect();
        fs::write(&kernel, tape).unwrap();
        fs::write(&table, "ab").unwrap();

        let mut image = Image::new(DirPolicy::default());
        let result = load_boot_track(&mut image, Some(kernel.as_path()), Some(table.as_path()));
        fs::remove_file(&kernel).ok();
        fs::remove_file(&table).ok();
        result.unwrap();

        let store = image.store();
        assert_eq!(store.read(BOOT_BLOCK, 0), 0o740040);
        assert_eq!(store.read(BOOT_BLOCK, 2), 0o2);
        assert_eq!(CHARTABLE_OFFSET, 768);
        assert_eq!(store.read(BOOT_BLOCK + 12, 0), pack_chars(b'a', b'b'));
        assert_eq!(store.read(BOOT_BLOCK + 48, 0), 0);
    }

    #[test]
    fn test_nothing_to_load() {
        let mut image = Image::new(DirPolicy::default());
        load_boot_track(&mut image, None, None).unwrap();
        assert!(image.store().blocks()[BOOT_BLOCK..].iter().all(|b| b.iter().all(|&w| w == 0)));
    }
}
