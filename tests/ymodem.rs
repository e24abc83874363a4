// SPDX-License-Identifier: MIT OR Apache-2.0
//! Round-trips a YMODEM batch of files over a pair of OS pipes.

mod support;

use std::collections::HashMap;
use std::io::Cursor;
use std::thread::spawn;
use std::time::Duration;

use support::{InOut, SharedBuf};
use xyzmodem::channel::IoChannel;
use xyzmodem::ymodem::{OutgoingFile, Ymodem};

const RETRY: u32 = 16;
const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn batch_of_two_files_roundtrips() {
    let first = b"hello, ymodem".to_vec();
    let second = vec![0x42u8; 3000];

    let (in_rx, in_tx) = os_pipe::pipe().unwrap();
    let (out_rx, out_tx) = os_pipe::pipe().unwrap();

    let send_first = first.clone();
    let send_second = second.clone();
    spawn(move || {
        let channel = IoChannel::new(InOut::new(out_rx, in_tx));
        let mut ymodem = Ymodem::new(channel);
        let mut first_reader = Cursor::new(&send_first);
        let mut second_reader = Cursor::new(&send_second);
        let mut files = vec![
            OutgoingFile {
                name: "greeting.txt".to_string(),
                size: send_first.len() as u64,
                mtime: Some(1_700_000_000),
                reader: &mut first_reader,
            },
            OutgoingFile {
                name: "blob.bin".to_string(),
                size: send_second.len() as u64,
                mtime: None,
                reader: &mut second_reader,
            },
        ];
        ymodem.send(&mut files, RETRY, TIMEOUT).unwrap();
    });

    let channel = IoChannel::new(InOut::new(in_rx, out_tx));
    let mut ymodem = Ymodem::new(channel);
    let mut received: HashMap<String, SharedBuf> = HashMap::new();

    let count = ymodem
        .recv(RETRY, TIMEOUT, |incoming| {
            let buf = SharedBuf::new();
            received.insert(incoming.name.clone(), buf.clone());
            Ok(buf)
        })
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(&received["greeting.txt"].take()[..first.len()], &first[..]);
    assert_eq!(&received["blob.bin"].take()[..second.len()], &second[..]);
}

/// A single-file batch still ends with the empty terminating header packet,
/// and the receiver reports exactly one file.
#[test]
fn single_file_batch_reports_count_one() {
    let payload = b"foo.txt contents".to_vec();

    let (in_rx, in_tx) = os_pipe::pipe().unwrap();
    let (out_rx, out_tx) = os_pipe::pipe().unwrap();

    let send_payload = payload.clone();
    spawn(move || {
        let channel = IoChannel::new(InOut::new(out_rx, in_tx));
        let mut ymodem = Ymodem::new(channel);
        let mut reader = Cursor::new(&send_payload);
        let mut files = vec![OutgoingFile {
            name: "foo.txt".to_string(),
            size: send_payload.len() as u64,
            mtime: None,
            reader: &mut reader,
        }];
        ymodem.send(&mut files, RETRY, TIMEOUT).unwrap();
    });

    let channel = IoChannel::new(InOut::new(in_rx, out_tx));
    let mut ymodem = Ymodem::new(channel);
    let mut names = Vec::new();

    let count = ymodem
        .recv(RETRY, TIMEOUT, |incoming| {
            names.push(incoming.name.clone());
            Ok(Cursor::new(Vec::new()))
        })
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(names, vec!["foo.txt".to_string()]);
}
