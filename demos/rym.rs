// SPDX-License-Identifier: MIT OR Apache-2.0
//! Receives a batch of files over stdin/stdout using YMODEM.

#[path = "stdinout.rs"]
mod stdinout;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use xyzmodem::channel::IoChannel;
use xyzmodem::ymodem::Ymodem;

#[derive(Parser)]
#[command(about = "Pure Rust implementation of rb")]
struct Args {
    /// Directory to write received files into.
    #[arg(default_value = ".")]
    directory: PathBuf,

    #[arg(long, default_value_t = 3)]
    retry: u32,

    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let channel = IoChannel::new(stdinout::CombinedStdInOut::new());
    let mut ymodem = Ymodem::new(channel);
    let timeout = Duration::from_secs(args.timeout_secs);
    let directory = args.directory.clone();

    let result = ymodem.recv(args.retry, timeout, |incoming| {
        let path = directory.join(&incoming.name);
        log::info!("receiving {} ({} bytes)", incoming.name, incoming.size);
        File::create(&path).map_err(|e| xyzmodem::Error::OpenFailure(e.to_string()))
    });

    match result {
        Ok(count) => log::info!("received {count} file(s)"),
        Err(e) => {
            eprintln!("rym: {e}");
            std::process::exit(1);
        }
    }
}
