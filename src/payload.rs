/// Turn host files into 18-bit word buffers.
///
/// A file whose first byte has the top two bits set to `10` is taken to be
/// a binary paper tape (three 6-bit frames per word). Anything else is
/// text, packed two characters per word.
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::word::{pack_chars, ptr_decode};

pub fn load(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read(path).with_context(|| format!("Failed to read {path:?}"))?;
    let words = decode(&data);
    debug!("{path:?}: {} bytes -> {} words", data.len(), words.len());
    Ok(words)
}

pub fn is_paper_tape(data: &[u8]) -> bool {
    data.first().is_some_and(|&b| b & 0o300 == 0o200)
}

pub fn decode(data: &[u8]) -> Vec<u32> {
    if is_paper_tape(data) {
        from_paper_tape(data)
    } else {
        from_text(data)
    }
}

fn from_paper_tape(data: &[u8]) -> Vec<u32> {
    let chunks = data.chunks_exact(3);
    if !chunks.remainder().is_empty() {
        warn!(
            "paper tape ends with {} stray byte(s), dropped",
            chunks.remainder().len()
        );
    }
    chunks.map(|c| ptr_decode([c[0], c[1], c[2]])).collect()
}

fn from_text(data: &[u8]) -> Vec<u32> {
    data.chunks(2)
        .map(|pair| pack_chars(pair[0], pair.get(1).copied().unwrap_or(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::ptr_encode;

    #[test]
    fn test_detect() {
        assert!(is_paper_tape(&[0o200, 0, 0]));
        assert!(is_paper_tape(&[0o277]));
        assert!(!is_paper_tape(b"hello"));
        assert!(!is_paper_tape(&[0o300]));
        assert!(!is_paper_tape(&[]));
    }

    #[test]
    fn test_text_packing() {
        assert_eq!(decode(b"abc"), vec![pack_chars(b'a', b'b'), pack_chars(b'c', 0)]);
        assert_eq!(decode(b""), Vec::<u32>::new());
    }

    #[test]
    fn test_paper_tape() {
        let words = [0o123456, 0, 0o777777, 0o400000];
        let tape: Vec<u8> = words.iter().flat_map(|&w| ptr_encode(w)).collect();
        assert_eq!(decode(&tape), words);

        let mut short = tape.clone();
        short.push(0o200);
        assert_eq!(decode(&short), words);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/nonexistent/mkfs7/payload")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read"));
    }
}
