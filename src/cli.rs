use clap::Parser;
use std::path::PathBuf;

use crate::dir::DirPolicy;
use crate::output::Format;

#[derive(Parser, Debug)]
#[command(
    name = "mkfs7",
    about = "Build a PDP-7 Unix filesystem image",
    long_about = "Read a proto file describing a directory tree and write a complete disk image for the PDP-7 simulator"
)]
pub struct Args {
    /// Proto file describing the filesystem
    #[arg(required = true)]
    pub proto: PathBuf,

    /// Debug output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Add a "." entry to every directory
    #[arg(long = "dot")]
    pub dot: bool,

    /// Add a ".." entry to every directory
    #[arg(long = "dotdot")]
    pub dotdot: bool,

    /// Do not add a "dd" entry to directories
    #[arg(long = "nodd")]
    pub nodd: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "simh")]
    pub format: Format,

    /// Output image path
    #[arg(short = 'o', long = "output", default_value = "image.fs")]
    pub output: PathBuf,

    /// Kernel image written at the start of the boot track
    #[arg(long = "kernel", value_name = "FILE")]
    pub kernel: Option<PathBuf>,

    /// Character table written into the boot track
    #[arg(long = "chartable", value_name = "FILE")]
    pub chartable: Option<PathBuf>,
}

impl Args {
    pub fn dir_policy(&self) -> DirPolicy {
        DirPolicy {
            dot: self.dot,
            dotdot: self.dotdot,
            nodd: self.nodd,
        }
    }
}
