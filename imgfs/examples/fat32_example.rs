// SPDX-License-Identifier: MIT

//! Formats a 33 MiB volume in memory, writes a payload and reports the I/O
//! each phase issued.

use imgfs::fat32::*;
use imgfs::volume_id_from_bytes;
use std::time::Instant;

fn print_io_stats(label: &str, s: &IoStats) {
    println!(
        "[{label}] R={} ({} B) W={} ({} B) F={} | aligned/unaligned W = {}/{} | maxWrite={}B",
        s.reads, s.read_bytes, s.writes, s.write_bytes, s.flushes,
        s.aligned_writes, s.unaligned_writes, s.max_write
    );
}

fn main() -> FsResult {
    const SIZE_BYTES: u64 = 33 * 1024 * 1024;
    let payload: Vec<u8> = (0..1024 * 1024u32).map(|i| (i % 251) as u8).collect();

    let mut buf = vec![0u8; SIZE_BYTES as usize];
    let mut mem = MemImgIO::new(&mut buf);
    let params = Fat32Params::default()
        .with_label("AMT-SETUP")
        .with_volume_id(volume_id_from_bytes(&payload));
    let meta = Fat32Meta::from_params(SIZE_BYTES, &params)?;
    let align = meta.bytes_per_cluster as u64;

    let t0 = Instant::now();
    let mut io = IOCounter::with_align(&mut mem, align);
    Fat32Formatter::new(&mut io, &meta).format(false)?;
    let dt_fmt = t0.elapsed();
    print_io_stats("format", &io.snapshot());

    let mut io = IOCounter::with_align(io.into_inner(), align);
    let t1 = Instant::now();
    let mut allocator = Fat32Allocator::new(&meta);
    let mut injector = Fat32Injector::new(&mut io, &mut allocator, &meta);
    let outcome = injector.write_file("/Setup.bin", &payload, &FileAttributes::new_file())?;
    injector.flush()?;
    let dt_inject = t1.elapsed();
    print_io_stats("inject", &io.snapshot());

    let mut io = IOCounter::with_align(io.into_inner(), align);
    let t2 = Instant::now();
    let report = Fat32Checker::new(&mut io, &meta).check_all()?;
    let dt_check = t2.elapsed();
    print_io_stats("check", &io.snapshot());

    let mut io = IOCounter::with_align(io.into_inner(), align);
    let entries = Fat32Resolver::new(&mut io, &meta).read_dir("/")?;
    print_io_stats("read_dir", &io.snapshot());

    println!("\nSummary:");
    println!("Format  : {dt_fmt:?}");
    println!("Inject  : {dt_inject:?} ({} clusters)", outcome.units());
    println!("Check   : {dt_check:?}");
    println!("Report  :\n{report}");
    for e in entries {
        println!("{:<12} {:>10} B", e.name, e.size);
    }
    Ok(())
}
