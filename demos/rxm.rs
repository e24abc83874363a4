// SPDX-License-Identifier: MIT OR Apache-2.0
//! Receives a single file over stdin/stdout using XMODEM, XMODEM-CRC or
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
#[command(about = "Pure Rust implementation of rx")]
struct Args {
    #[arg(default_value = "rx-out")]
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

    let mut output = File::create(&args.file).unwrap_or_else(|e| {
        eprintln!("rxm: cannot create {}: {e}", args.file.display());
        std::process::exit(1);
    });

    let channel = IoChannel::new(stdinout::CombinedStdInOut::new());
    let timeout = Duration::from_secs(args.timeout_secs);
    let mut xmodem = match args.variant {
        Variant::Classic => Xmodem::new(channel),
        Variant::Crc => Xmodem::new_crc(channel),
        Variant::OneK => Xmodem::new_1k(channel),
    };

    match xmodem.recv(&mut output, args.retry, timeout) {
        Ok(bytes) => log::info!("received {bytes} bytes"),
        Err(e) => {
            eprintln!("rxm: {e}");
            std::process::exit(1);
        }
    }
}
