// SPDX-License-Identifier: MIT

//! Images built by imgfs, read back with an independent FAT driver.

use std::io::{Cursor, Read};

use imgfs::fat32::*;

const MIB: u64 = 1024 * 1024;

fn build(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buf = vec![0u8; (33 * MIB) as usize];
    {
        let mut io = MemImgIO::new(&mut buf);
        let params = Fat32Params::default()
            .with_label("AMT-SETUP")
            .with_volume_id(0x1234_5678);
        let mut vol = Fat32Volume::format(&mut io, 33 * MIB, &params, false).expect("format");
        for (path, data) in files {
            vol.write_file(path, data, &FileAttributes::new_file())
                .expect("write_file");
        }
        vol.flush().expect("flush");
    }
    buf
}

fn read_with_fatfs(image: Vec<u8>, name: &str) -> Vec<u8> {
    let fs = fatfs::FileSystem::new(Cursor::new(image), fatfs::FsOptions::new()).expect("mount");
    let mut file = fs.root_dir().open_file(name).expect("open");
    let mut out = Vec::new();
    file.read_to_end(&mut out).expect("read");
    out
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 253) as u8).collect()
}

#[test]
fn fatfs_sees_fat32_volume() {
    let image = build(&[("/Setup.bin", b"hello".to_vec())]);
    let fs = fatfs::FileSystem::new(Cursor::new(image), fatfs::FsOptions::new()).expect("mount");

    assert_eq!(fs.fat_type(), fatfs::FatType::Fat32);
    assert_eq!(fs.volume_id(), 0x1234_5678);
    assert_eq!(fs.volume_label(), "AMT-SETUP");

    let names: Vec<String> = fs
        .root_dir()
        .iter()
        .map(|e| e.expect("dir entry"))
        .map(|e| e.file_name())
        .filter(|n| n != "." && n != "..")
        .collect();
    assert_eq!(names, vec!["Setup.bin".to_string()]);
}

#[test]
fn multi_cluster_content_round_trips() {
    let data = pattern(3 * 1024 * 1024 + 17);
    let image = build(&[("/Setup.bin", data.clone())]);
    assert_eq!(read_with_fatfs(image, "Setup.bin"), data);
}

#[test]
fn names_of_every_kind() {
    let image = build(&[
        ("/UPPER.TXT", b"u".to_vec()),
        ("/lower.txt", b"l".to_vec()),
        ("/a rather long file name.data", b"long".to_vec()),
        ("/empty.bin", Vec::new()),
    ]);
    let fs = fatfs::FileSystem::new(Cursor::new(image), fatfs::FsOptions::new()).expect("mount");
    let root = fs.root_dir();

    let names: Vec<String> = root
        .iter()
        .map(|e| e.expect("dir entry").file_name())
        .filter(|n| n != "." && n != "..")
        .collect();
    assert!(names.iter().any(|n| n == "UPPER.TXT"));
    assert!(names.iter().any(|n| n == "a rather long file name.data"));
    let mut folded: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    folded.sort();
    assert_eq!(
        folded,
        vec!["a rather long file name.data", "empty.bin", "lower.txt", "upper.txt"]
    );

    let mut s = String::new();
    root.open_file("a rather long file name.data")
        .expect("open")
        .read_to_string(&mut s)
        .expect("read");
    assert_eq!(s, "long");

    let empty = root
        .iter()
        .map(|e| e.expect("dir entry"))
        .find(|e| e.file_name().eq_ignore_ascii_case("empty.bin"))
        .expect("empty.bin");
    assert_eq!(empty.len(), 0);
}

#[test]
fn rewrite_is_seen_by_fatfs() {
    let mut buf = build(&[("/Setup.bin", pattern(10_000))]);
    {
        let mut io = MemImgIO::new(&mut buf);
        let mut vol = Fat32Volume::open(&mut io).expect("open");
        let out = vol
            .write_file("/Setup.bin", b"v2", &FileAttributes::new_file())
            .expect("rewrite");
        assert!(matches!(out, WriteOutcome::Replaced { units: 1, released: 20 }));
        vol.flush().expect("flush");
        assert!(!vol.check().expect("check").has_error());
    }
    assert_eq!(read_with_fatfs(buf, "Setup.bin"), b"v2");
}

#[test]
fn free_space_agrees_with_fatfs() {
    let image = build(&[("/Setup.bin", pattern(100_000))]);
    let expected_free = {
        let mut copy = image.clone();
        let mut io = MemImgIO::new(&mut copy);
        Fat32Volume::open(&mut io).expect("open").free_clusters()
    };
    let fs = fatfs::FileSystem::new(Cursor::new(image), fatfs::FsOptions::new()).expect("mount");
    let stats = fs.stats().expect("stats");
    assert_eq!(stats.free_clusters(), expected_free);
}

#[test]
fn image_is_deterministic() {
    let a = build(&[("/Setup.bin", pattern(4096))]);
    let b = build(&[("/Setup.bin", pattern(4096))]);
    assert!(a == b);
}
