// SPDX-License-Identifier: MIT OR Apache-2.0
//! Receives a ZMODEM session over stdin/stdout into a destination directory.

#[path = "stdinout.rs"]
mod stdinout;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use xyzmodem::channel::IoChannel;
use xyzmodem::zmodem::Zmodem;

#[derive(Parser)]
#[command(about = "Pure Rust implementation of rz")]
struct Args {
    /// Directory to write received files into.
    #[arg(default_value = ".")]
    directory: PathBuf,

    #[arg(long, default_value_t = 16)]
    retry: u32,

    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let channel = IoChannel::new(stdinout::CombinedStdInOut::new());
    let mut zmodem = Zmodem::new(channel);
    match zmodem.recv(
        &args.directory,
        args.retry,
        Duration::from_secs(args.timeout_secs),
        Duration::from_secs(1),
    ) {
        Ok(count) => log::info!("received {count} file(s)"),
        Err(e) => {
            eprintln!("rzm: {e}");
            std::process::exit(1);
        }
    }
}
