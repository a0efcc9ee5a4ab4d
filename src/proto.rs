/// Proto file reader.
///
/// One directive per line, `#` starts a comment:
///   name  d-perm  uid  [inode]            directory (entered)
///   name  --perm  uid  source  [inode]    file
///   name  i-perm  uid  [inode]            special
///   name  l-perm  [inode]                 link (default: last inode)
///   $                                     leave the current directory
///
/// The permission field is a type letter followed by four flags in fixed
/// order: owner read, owner write, world read, world write (`r`/`w` set,
/// anything else clear). Numbers are octal; a uid of `-1` is kept as -1.
use anyhow::{bail, Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dir::{DirPolicy, EntryTarget};
use crate::error::ImageError;
use crate::image::Image;
use crate::inode::InodeFlags;
use crate::payload;

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Directory {
        name: String,
        perms: InodeFlags,
        uid: i32,
        inode: Option<u32>,
    },
    File {
        name: String,
        perms: InodeFlags,
        uid: i32,
        source: PathBuf,
        inode: Option<u32>,
    },
    Special {
        name: String,
        perms: InodeFlags,
        uid: i32,
        inode: Option<u32>,
    },
    Link {
        name: String,
        target: EntryTarget,
    },
    Ascend,
}

pub fn parse_permissions(descriptor: &str) -> std::result::Result<(char, InodeFlags), ImageError> {
    let bad = || ImageError::BadPermissions {
        descriptor: descriptor.to_string(),
    };
    let chars: Vec<char> = descriptor.chars().collect();
    if chars.len() != 5 || !matches!(chars[0], 'd' | '-' | 'i' | 'l') {
        return Err(bad());
    }

    let bits = [
        ('r', InodeFlags::OWNER_READ),
        ('w', InodeFlags::OWNER_WRITE),
        ('r', InodeFlags::WORLD_READ),
        ('w', InodeFlags::WORLD_WRITE),
    ];
    let mut perms = InodeFlags::empty();
    for (&c, (letter, bit)) in chars[1..].iter().zip(bits) {
        if c == letter {
            perms |= bit;
        }
    }
    Ok((chars[0], perms))
}

fn parse_uid(token: &str) -> Result<i32> {
    if token == "-1" {
        return Ok(-1);
    }
    i32::from_str_radix(token, 8).with_context(|| format!("Bad uid {token:?}"))
}

fn parse_inode(token: Option<&&str>) -> Result<Option<u32>> {
    token
        .map(|t| u32::from_str_radix(t, 8).with_context(|| format!("Bad inode number {t:?}")))
        .transpose()
}

/// Parse one line; comments and blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Directive>> {
    let line = line.split('#').next().unwrap_or("");
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    if tokens == ["$"] {
        return Ok(Some(Directive::Ascend));
    }
    if tokens.len() < 2 {
        bail!("Expected at least a name and a permission field");
    }

    let name = tokens[0].to_string();
    let (kind, perms) = parse_permissions(tokens[1])?;
    let rest = &tokens[2..];

    let directive = match kind {
        'd' | 'i' => {
            if rest.is_empty() || rest.len() > 2 {
                bail!("Expected: name {}perm uid [inode]", kind);
            }
            let uid = parse_uid(rest[0])?;
            let inode = parse_inode(rest.get(1))?;
            if kind == 'd' {
                Directive::Directory { name, perms, uid, inode }
            } else {
                Directive::Special { name, perms, uid, inode }
            }
        }
        '-' => {
            if rest.len() < 2 || rest.len() > 3 {
                bail!("Expected: name -perm uid source [inode]");
            }
            Directive::File {
                name,
                perms,
                uid: parse_uid(rest[0])?,
                source: PathBuf::from(rest[1]),
                inode: parse_inode(rest.get(2))?,
            }
        }
        _ => {
            if rest.len() > 1 {
                bail!("Expected: name lperm [inode]");
            }
            let target = match parse_inode(rest.first())? {
                Some(n) => EntryTarget::Inode(n),
                None => EntryTarget::Last,
            };
            Directive::Link { name, target }
        }
    };
    Ok(Some(directive))
}

pub fn apply(image: &mut Image, directive: &Directive) -> Result<()> {
    debug!("{directive:?}");
    match directive {
        Directive::Directory {
            name,
            perms,
            uid,
            inode,
        } => {
            image.create_directory(name, *perms, *uid, *inode)?;
        }
        Directive::File {
            name,
            perms,
            uid,
            source,
            inode,
        } => {
            let words = payload::load(source)?;
            image.add_file(name, *perms, *uid, &words, *inode)?;
        }
        Directive::Special {
            name,
            perms,
            uid,
            inode,
        } => {
            image.add_special(name, *perms, *uid, *inode)?;
        }
        Directive::Link { name, target } => image.add_entry(name, *target)?,
        Directive::Ascend => image.ascend()?,
    }
    Ok(())
}

/// Run every directive in `text` against a fresh image and finish it.
pub fn build_from_str(text: &str, policy: DirPolicy) -> Result<Image> {
    let mut image = Image::new(policy);
    for (n, line) in text.lines().enumerate() {
        let lineno = n + 1;
        let directive = parse_line(line).with_context(|| format!("line {lineno}: {line:?}"))?;
        if let Some(d) = directive {
            apply(&mut image, &d).with_context(|| format!("line {lineno}: {line:?}"))?;
        }
    }
    image.finish()?;
    Ok(image)
}

pub fn build(path: &Path, policy: DirPolicy) -> Result<Image> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read proto file {path:?}"))?;
    build_from_str(&text, policy).with_context(|| format!("In proto file {path:?}"))
}
