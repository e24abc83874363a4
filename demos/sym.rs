// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sends a batch of files over stdin/stdout using YMODEM.

#[path = "stdinout.rs"]
mod stdinout;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

use clap::Parser;

use xyzmodem::channel::IoChannel;
use xyzmodem::ymodem::{OutgoingFile, Ymodem};

#[derive(Parser)]
#[command(about = "Pure Rust implementation of sb")]
struct Args {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, default_value_t = 3)]
    retry: u32,

    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut opened = Vec::new();
    for path in &args.files {
        let metadata = path.metadata().unwrap_or_else(|e| {
            eprintln!("sym: cannot stat {}: {e}", path.display());
            std::process::exit(1);
        });
        let file = File::open(path).unwrap_or_else(|e| {
            eprintln!("sym: cannot open {}: {e}", path.display());
            std::process::exit(1);
        });
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        opened.push((name, metadata.len(), mtime, file));
    }

    let mut outgoing: Vec<_> = opened
        .iter_mut()
        .map(|(name, size, mtime, file)| OutgoingFile {
            name: name.clone(),
            size: *size,
            mtime: *mtime,
            reader: file,
        })
        .collect();

    let channel = IoChannel::new(stdinout::CombinedStdInOut::new());
    let mut ymodem = Ymodem::new(channel);
    let timeout = Duration::from_secs(args.timeout_secs);
    match ymodem.send(&mut outgoing, args.retry, timeout) {
        Ok(()) => log::info!("sent {} file(s)", args.files.len()),
        Err(e) => {
            eprintln!("sym: {e}");
            std::process::exit(1);
        }
    }
}
