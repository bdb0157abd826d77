// SPDX-License-Identifier: MIT

use imgio::prelude::*;

pub use crate::core::formatter::*;

use crate::core::fat::chain;
use crate::fs::fat32::{constant::*, meta::*, types::*};

/// Fat32Formatter:
/// - Writes VBR + backup, FSInfo + backup, both FATs and the root cluster.
/// - The root directory holds only the volume label entry.
/// - Quick format leaves the rest of the cluster heap untouched.
pub struct Fat32Formatter<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a Fat32Meta,
}

impl<'a, IO: ImgIO + ?Sized> Fat32Formatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a Fat32Meta) -> Self {
        Self { io, meta }
    }

    fn write_reserved_region(&mut self) -> FsFormatterResult {
        // unused reserved sectors must not carry stale boot sectors
        self.io
            .zero_fill(0, self.meta.fat_offset_bytes as usize)?;

        let vbr = Fat32Vbr::from_meta(self.meta);
        self.io
            .write_struct(self.meta.sector_offset(FAT_VBR_SECTOR), &vbr)?;
        self.io
            .write_struct(self.meta.sector_offset(FAT_VBR_BACKUP_SECTOR), &vbr)?;

        let fsinfo = Fat32FsInfo::from_meta(self.meta);
        self.io
            .write_struct(self.meta.sector_offset(FAT_FSINFO_SECTOR), &fsinfo)?;
        self.io
            .write_struct(self.meta.sector_offset(FAT_FSINFO_BACKUP_SECTOR), &fsinfo)?;
        Ok(())
    }

    fn write_fat_region(&mut self) -> FsFormatterResult {
        let fat_bytes = self.meta.fat_size_bytes();
        for fat_index in 0..self.meta.num_fats {
            let offset = self.meta.fat_offset_bytes + fat_index as u64 * fat_bytes;
            self.io.zero_fill(offset, fat_bytes as usize)?;
            self.io
                .write_u32_at(self.meta.fat_entry_offset(0, fat_index), FAT_ENTRY0)?;
            self.io
                .write_u32_at(self.meta.fat_entry_offset(1, fat_index), FAT_ENTRY1)?;
        }
        chain::write_chain(self.io, self.meta, &[self.meta.root_unit()])?;
        Ok(())
    }

    fn write_root_dir_cluster(&mut self) -> FsFormatterResult {
        let mut buf = Vec::with_capacity(self.meta.unit_size());
        Fat32Entries::volume_label(self.meta.volume_label).to_raw_buffer(&mut buf);
        buf.resize(self.meta.unit_size(), 0);

        let offset = self.meta.unit_offset(self.meta.root_unit());
        self.io.write_at(offset, &buf)?;
        Ok(())
    }
}

impl<IO: ImgIO + ?Sized> FsFormatter for Fat32Formatter<'_, IO> {
    fn format(&mut self, full_format: bool) -> FsFormatterResult {
        if full_format {
            zero_cluster_heap(self.io, self.meta)?;
        }
        self.write_reserved_region()?;
        self.write_fat_region()?;
        self.write_root_dir_cluster()?;
        Ok(())
    }

    fn flush(&mut self) -> FsFormatterResult {
        self.io.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fat::chain::read_entry;
    use zerocopy::IntoBytes;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn formatted_layout() {
        let meta = Fat32Meta::new(33 * MIB, Some("AMT-SETUP")).unwrap();
        let mut buf = vec![0xAAu8; meta.size_bytes() as usize];
        let mut io = MemImgIO::new(&mut buf);

        let mut fmt = Fat32Formatter::new(&mut io, &meta);
        fmt.format(false).unwrap();
        fmt.flush().unwrap();

        let vbr: Fat32Vbr = io.read_struct(0).unwrap();
        assert!(vbr.validate(&meta).is_ok());
        let backup: Fat32Vbr = io.read_struct(6 * 512).unwrap();
        assert_eq!(vbr.as_bytes(), backup.as_bytes());

        let fsi: Fat32FsInfo = io.read_struct(512).unwrap();
        assert!(fsi.validate().is_ok());
        let (free, next) = (fsi.free_cluster_count, fsi.next_free_cluster);
        assert_eq!(free, meta.cluster_count - 1);
        assert_eq!(next, 3);

        for fi in 0..2 {
            assert_eq!(read_entry(&mut io, &meta, 0, fi).unwrap(), FAT_ENTRY0);
            assert_eq!(read_entry(&mut io, &meta, 1, fi).unwrap(), FAT_ENTRY1);
            assert_eq!(read_entry(&mut io, &meta, 2, fi).unwrap(), FAT_EOC);
            assert_eq!(read_entry(&mut io, &meta, 3, fi).unwrap(), FAT_FREE);
        }

        let root = meta.unit_offset(2);
        let mut slot = [0u8; 64];
        io.read_at(root, &mut slot).unwrap();
        assert_eq!(&slot[0..11], b"AMT-SETUP  ");
        assert_eq!(slot[11], 0x08);
        assert_eq!(slot[32], FAT_EOD);

        // quick format leaves the heap alone
        let mut b = [0u8; 1];
        io.read_at(meta.unit_offset(3), &mut b).unwrap();
        assert_eq!(b[0], 0xAA);
    }

    #[test]
    fn full_format_zeroes_heap() {
        let meta = Fat32Meta::new(33 * MIB, None).unwrap();
        let mut buf = vec![0xAAu8; meta.size_bytes() as usize];
        let mut io = MemImgIO::new(&mut buf);
        Fat32Formatter::new(&mut io, &meta).format(true).unwrap();

        let mut b = [0xFFu8; 512];
        io.read_at(meta.unit_offset(meta.last_data_unit()), &mut b).unwrap();
        assert!(b.iter().all(|&x| x == 0));
        // reserved gap between backups is zeroed too
        io.read_at(2 * 512, &mut b).unwrap();
        assert!(b.iter().all(|&x| x == 0));
    }
}
