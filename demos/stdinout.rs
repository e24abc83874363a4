// SPDX-License-Identifier: MIT OR Apache-2.0
//! Combines stdin and stdout into one duplex stream, for demos that drive a
//! protocol engine directly over a pipe plugged into this process's stdio.

use std::io::{self, Read, Stdin, Stdout, Write};

pub struct CombinedStdInOut {
    stdin: Stdin,
    stdout: Stdout,
}

impl CombinedStdInOut {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Read for CombinedStdInOut {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdin.read(buf)
    }
}

impl Write for CombinedStdInOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
