mod balloc;
mod boot;
mod cli;
mod dir;
mod error;
mod freelist;
mod image;
mod inode;
mod layout;
mod output;
mod payload;
mod proto;
mod word;

use anyhow::Result;
use clap::Parser;
use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    let mut image = proto::build(&args.proto, args.dir_policy())?;

    boot::load_boot_track(
        &mut image,
        args.kernel.as_deref(),
        args.chartable.as_deref(),
    )?;

    output::save(image.store(), args.format, &args.output)?;
    Ok(())
}
