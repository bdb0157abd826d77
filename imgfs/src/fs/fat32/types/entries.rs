// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    core::{errors::*, resolver::*},
    fs::fat32::{
        attr::*,
        constant::*,
        utils::{self, ShortName},
    },
};

/// One logical directory entry: its LFN slots (disk order) and the 8.3 entry.
#[derive(Debug, Clone)]
pub struct Fat32Entries {
    pub lfn: Vec<Fat32LFNEntry>,
    pub entry: Fat32Entry,
}

impl Fat32Entries {
    /// Long name when a valid LFN set is attached, short name otherwise.
    pub fn name(&self) -> FsParsingResult<String> {
        if self.lfn.is_empty() {
            utils::decode_sfn(&self.entry.name, self.entry.nt_reserved)
        } else {
            utils::decode_lfn(&self.lfn)
        }
    }

    pub fn name_eq(&self, target: &str) -> bool {
        self.name()
            .map(|name| utils::fat_name_eq(&name, target))
            .unwrap_or(false)
    }

    pub fn size(&self) -> u32 {
        self.entry.file_size
    }

    pub fn attr(&self) -> FileAttributes {
        Fat32Attributes::from_bits_truncate(self.entry.attr).into()
    }

    pub fn is_dir(&self) -> bool {
        self.entry.attr & Fat32Attributes::DIRECTORY.bits() != 0
    }

    pub fn is_volume_label(&self) -> bool {
        Fat32Attributes::is_volume_label(self.entry.attr)
    }

    pub fn first_cluster(&self) -> u32 {
        self.entry.first_cluster()
    }

    /// Number of 32-byte slots the entry set occupies.
    pub fn slot_count(&self) -> usize {
        self.lfn.len() + 1
    }

    pub fn file(
        name: &str,
        short: &ShortName,
        cluster: u32,
        size: u32,
        attr: &FileAttributes,
    ) -> Self {
        let (date, time, fine) = utils::datetime_from_attr(attr);
        let lfn = if short.needs_lfn {
            utils::lfn_entries(name, &short.raw)
        } else {
            Vec::new()
        };
        let mut entry = Fat32Entry::new(
            short.raw,
            Fat32Attributes::from(attr).bits(),
            cluster,
            size,
            date,
            time,
            fine,
        );
        entry.nt_reserved = short.nt_case;
        Self { lfn, entry }
    }

    pub fn volume_label(label: [u8; 11]) -> Self {
        let (date, time, fine) = utils::datetime_from_attr(&FileAttributes::default());
        let entry = Fat32Entry::new(
            label,
            Fat32Attributes::VOLUME_ID.bits(),
            0,
            0,
            date,
            time,
            fine,
        );
        Self {
            lfn: Vec::new(),
            entry,
        }
    }

    #[inline(always)]
    pub fn to_raw_buffer(&self, buf: &mut Vec<u8>) {
        for lfn in &self.lfn {
            lfn.to_raw_buffer(buf);
        }
        self.entry.to_raw_buffer(buf);
    }

    /// Builds an entry set from raw slots; `lfn_stack` is in disk order.
    ///
    /// LFN slots whose order or checksum do not match the 8.3 entry are
    /// dropped, leaving the short name.
    pub fn from_raw(lfn_stack: &[[u8; 32]], raw_entry: &[u8]) -> FsParsingResult<Self> {
        if raw_entry.len() != FAT_DIR_ENTRY_SIZE {
            return Err(FsParsingError::Invalid("Invalid Dir entry"));
        }
        if raw_entry[0] == FAT_EOD || raw_entry[0] == FAT_ENTRY_DELETED {
            return Err(FsParsingError::Invalid("Unused or deleted entry"));
        }

        let entry = Fat32Entry::read_from_bytes(raw_entry)
            .map_err(|_| FsParsingError::Invalid("Invalid SFN entry"))?;

        let lfn = lfn_stack
            .iter()
            .map(|bytes| {
                Fat32LFNEntry::read_from_bytes(bytes)
                    .map_err(|_| FsParsingError::Invalid("Invalid LFN structure"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lfn = if lfn_set_matches(&lfn, &entry.name) {
            lfn
        } else {
            Vec::new()
        };
        Ok(Self { lfn, entry })
    }
}

/// `true` when `lfn` is a complete, well-ordered set for `short`.
fn lfn_set_matches(lfn: &[Fat32LFNEntry], short: &[u8; 11]) -> bool {
    let Some(first) = lfn.first() else {
        return false;
    };
    let n = (first.order & FAT_LFN_ORDER_MASK) as usize;
    let sum = crate::core::utils::checksum_utils::sfn_checksum(short);
    first.order & FAT_LFN_LAST != 0
        && n == lfn.len()
        && lfn.iter().enumerate().all(|(i, e)| {
            let (order, checksum) = (e.order, e.checksum);
            (order & FAT_LFN_ORDER_MASK) as usize == n - i && checksum == sum
        })
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32Entry {
    pub name: [u8; 11],
    pub attr: u8,
    pub nt_reserved: u8,
    pub creation_time_tenth: u8,
    pub creation_time: u16,
    pub creation_date: u16,
    pub access_date: u16,
    pub first_cluster_high: u16,
    pub write_time: u16,
    pub write_date: u16,
    pub first_cluster_low: u16,
    pub file_size: u32,
}

impl Fat32Entry {
    pub fn new(
        name: [u8; 11],
        attr: u8,
        cluster: u32,
        size: u32,
        date: u16,
        time: u16,
        fine: u8,
    ) -> Self {
        let mut entry = Self {
            name,
            attr,
            nt_reserved: 0,
            creation_time_tenth: fine,
            creation_time: time,
            creation_date: date,
            access_date: date,
            first_cluster_high: 0,
            write_time: time,
            write_date: date,
            first_cluster_low: 0,
            file_size: size,
        };
        entry.set_first_cluster(cluster);
        entry
    }

    pub fn first_cluster(&self) -> u32 {
        ((self.first_cluster_high as u32) << 16) | (self.first_cluster_low as u32)
    }

    pub fn set_first_cluster(&mut self, cluster: u32) {
        self.first_cluster_high = (cluster >> 16) as u16;
        self.first_cluster_low = (cluster & 0xFFFF) as u16;
    }

    /// Points the entry at new content, as a rewrite does.
    pub fn set_content(&mut self, cluster: u32, size: u32, attr: &FileAttributes) {
        let (date, time, _) = utils::datetime_from_attr(attr);
        self.set_first_cluster(cluster);
        self.file_size = size;
        self.write_date = date;
        self.write_time = time;
        self.access_date = date;
        self.attr = Fat32Attributes::from(attr).bits();
    }

    #[inline(always)]
    pub fn to_raw_buffer(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32LFNEntry {
    pub order: u8,
    pub name1: [u16; 5],
    pub attr: u8,
    pub type_field: u8,
    pub checksum: u8,
    pub name2: [u16; 6],
    pub zero: u16,
    pub name3: [u16; 2],
}

impl Fat32LFNEntry {
    pub fn new(
        order: u8,
        is_last: bool,
        name_chunk: &[u16], // max 13
        checksum: u8,
    ) -> Self {
        let mut chars = [0xFFFFu16; FAT_LFN_CHARS_PER_ENTRY];
        let n = name_chunk.len().min(FAT_LFN_CHARS_PER_ENTRY);
        chars[..n].copy_from_slice(&name_chunk[..n]);

        let mut name1 = [0u16; 5];
        let mut name2 = [0u16; 6];
        let mut name3 = [0u16; 2];
        name1.copy_from_slice(&chars[0..5]);
        name2.copy_from_slice(&chars[5..11]);
        name3.copy_from_slice(&chars[11..13]);

        Self {
            order: if is_last { order | FAT_LFN_LAST } else { order },
            name1,
            attr: Fat32Attributes::LFN.bits(),
            type_field: 0x00,
            checksum,
            name2,
            zero: 0,
            name3,
        }
    }

    pub fn extract_utf16(&self) -> [u16; 13] {
        let mut out = [0xFFFFu16; 13];
        let name1 = self.name1;
        let name2 = self.name2;
        let name3 = self.name3;
        out[0..5].copy_from_slice(&name1);
        out[5..11].copy_from_slice(&name2);
        out[11..13].copy_from_slice(&name3);
        out
    }

    #[inline(always)]
    pub fn to_raw_buffer(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fat32::utils::*;

    fn entries_for(name: &str) -> Fat32Entries {
        let short = to_short_name(name);
        Fat32Entries::file(name, &short, 5, 42, &FileAttributes::new_file())
    }

    fn raw_slots(e: &Fat32Entries) -> (Vec<[u8; 32]>, Vec<u8>) {
        let mut buf = Vec::new();
        e.to_raw_buffer(&mut buf);
        let slots: Vec<[u8; 32]> = buf
            .chunks_exact(32)
            .map(|c| c.try_into().unwrap())
            .collect();
        let (lfn, sfn) = slots.split_at(slots.len() - 1);
        (lfn.to_vec(), sfn[0].to_vec())
    }

    #[test]
    fn entry_layout() {
        let e = entries_for("Setup.bin");
        let mut buf = Vec::new();
        e.to_raw_buffer(&mut buf);
        assert_eq!(buf.len(), 64);

        let (lfn, sfn) = buf.split_at(32);
        assert_eq!(lfn[0], 0x41);
        assert_eq!(lfn[11], 0x0F);
        assert_eq!(lfn[13], sfn_checksum_of(b"SETUP   BIN"));

        assert_eq!(&sfn[0..11], b"SETUP   BIN");
        assert_eq!(sfn[11], 0x20);
        assert_eq!(u16::from_le_bytes([sfn[24], sfn[25]]), 0x0021);
        assert_eq!(u16::from_le_bytes([sfn[22], sfn[23]]), 0);
        assert_eq!(u16::from_le_bytes([sfn[26], sfn[27]]), 5);
        assert_eq!(u32::from_le_bytes(sfn[28..32].try_into().unwrap()), 42);
    }

    fn sfn_checksum_of(raw: &[u8; 11]) -> u8 {
        crate::core::utils::checksum_utils::sfn_checksum(raw)
    }

    #[test]
    fn high_cluster_split() {
        let mut e = Fat32Entry::new(*b"A          ", 0x20, 0x0012_3456, 0, 0, 0, 0);
        assert_eq!(e.first_cluster(), 0x0012_3456);
        let (hi, lo) = (e.first_cluster_high, e.first_cluster_low);
        assert_eq!((hi, lo), (0x0012, 0x3456));
        e.set_content(9, 1, &FileAttributes::new_file());
        assert_eq!(e.first_cluster(), 9);
    }

    #[test]
    fn raw_round_trip_keeps_long_name() {
        for name in ["Setup.bin", "setup.bin", "a much longer file name.tar.gz"] {
            let e = entries_for(name);
            let (lfn, sfn) = raw_slots(&e);
            let back = Fat32Entries::from_raw(&lfn, &sfn).unwrap();
            assert_eq!(back.name().unwrap(), name);
            assert!(back.name_eq(&name.to_uppercase()));
            assert_eq!(back.size(), 42);
            assert_eq!(back.first_cluster(), 5);
            assert_eq!(back.slot_count(), e.slot_count());
        }
    }

    #[test]
    fn orphan_lfn_is_dropped() {
        let e = entries_for("Setup.bin");
        let (mut lfn, sfn) = raw_slots(&e);
        lfn[0][13] ^= 0xFF;
        let back = Fat32Entries::from_raw(&lfn, &sfn).unwrap();
        assert!(back.lfn.is_empty());
        assert_eq!(back.name().unwrap(), "SETUP.BIN");
    }

    #[test]
    fn deleted_slot_rejected() {
        let mut raw = [0u8; 32];
        raw[0] = FAT_ENTRY_DELETED;
        assert!(Fat32Entries::from_raw(&[], &raw).is_err());
    }

    #[test]
    fn volume_label_entry() {
        let e = Fat32Entries::volume_label(*b"AMT-SETUP  ");
        assert!(e.is_volume_label());
        assert!(!e.is_dir());
        assert_eq!(e.first_cluster(), 0);
        let mut buf = Vec::new();
        e.to_raw_buffer(&mut buf);
        assert_eq!(&buf[0..11], b"AMT-SETUP  ");
        assert_eq!(buf[11], 0x08);
    }
}
