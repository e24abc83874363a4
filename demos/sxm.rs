// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sends a single file over stdin/stdout using XMODEM, XMODEM-CRC or
//! XMODEM-1K.

#[path = "stdinout.rs"]
mod stdinout;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use xyzmodem::channel::IoChannel;
use xyzmodem::xmodem::Xmodem;

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Classic,
    Crc,
    OneK,
}

#[derive(Parser)]
#[command(about = "Pure Rust implementation of sx")]
struct Args {
    file: PathBuf,

    #[arg(long, value_enum, default_value_t = Variant::OneK)]
    variant: Variant,

    #[arg(long, default_value_t = 16)]
    retry: u32,

    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut input = File::open(&args.file).unwrap_or_else(|e| {
        eprintln!("sxm: cannot open {}: {e}", args.file.display());
        std::process::exit(1);
    });

    let channel = IoChannel::new(stdinout::CombinedStdInOut::new());
    let timeout = Duration::from_secs(args.timeout_secs);
    let mut xmodem = match args.variant {
        Variant::Classic => Xmodem::new(channel),
        Variant::Crc => Xmodem::new_crc(channel),
        Variant::OneK => Xmodem::new_1k(channel),
    };

    match xmodem.send(&mut input, args.retry, timeout) {
        Ok(()) => log::info!("transfer complete"),
        Err(e) => {
            eprintln!("sxm: {e}");
            std::process::exit(1);
        }
    }
}
