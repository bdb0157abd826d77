// SPDX-License-Identifier: MIT

use crate::errors::*;
use crate::io_ext::ImgIOLbaExt;
use crate::kinds::*;
use imgio::prelude::*;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const MBR_SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const MBR_BOOT_ACTIVE: u8 = 0x80;
pub const MBR_BOOT_INACTIVE: u8 = 0x00;

/// Conventional translated geometry used for CHS tuples.
pub const CHS_HEADS: u64 = 255;
pub const CHS_SECTORS_PER_TRACK: u64 = 63;
/// Marker for addresses beyond cylinder 1023.
pub const CHS_SATURATED: [u8; 3] = [0xFE, 0xFF, 0xFF];

/// Encodes `lba` as the 3-byte CHS tuple of a partition entry.
pub fn lba_to_chs(lba: u64) -> [u8; 3] {
    let cylinder = lba / (CHS_HEADS * CHS_SECTORS_PER_TRACK);
    if cylinder > 1023 {
        return CHS_SATURATED;
    }
    let head = (lba / CHS_SECTORS_PER_TRACK) % CHS_HEADS;
    let sector = lba % CHS_SECTORS_PER_TRACK + 1;
    [
        head as u8,
        (sector as u8 & 0x3F) | ((cylinder >> 2) as u8 & 0xC0),
        (cylinder & 0xFF) as u8,
    ]
}

#[inline]
fn lba_end_inclusive(start_lba: u32, sectors: u32) -> PartResult<u64> {
    if sectors == 0 {
        return Err(MbrError::ZeroSectors.into());
    }
    Ok(start_lba as u64 + sectors as u64 - 1)
}

fn check_overlaps_legacy(entries: &[MbrEntry]) -> PartResult<()> {
    let mut segs: Vec<(u64, u64)> = Vec::with_capacity(entries.len());
    for e in entries.iter().filter(|e| !e.is_empty()) {
        segs.push((e.start_lba as u64, lba_end_inclusive(e.start_lba, e.sectors)?));
    }
    segs.sort_unstable_by_key(|s| s.0);
    for pair in segs.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if curr.0 <= prev.1 {
            return Err(MbrError::Overlap {
                a_start: prev.0,
                a_end: prev.1,
                b_start: curr.0,
                b_end: curr.1,
            }
            .into());
        }
    }
    Ok(())
}

#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct MbrEntry {
    pub boot_flag: u8,
    pub starting_chs: [u8; 3],
    pub part_type: u8,
    pub end_chs: [u8; 3],
    pub start_lba: u32,
    pub sectors: u32,
}

impl MbrEntry {
    #[inline]
    pub fn new(
        boot_flag: u8,
        starting_chs: [u8; 3],
        part_type: u8,
        end_chs: [u8; 3],
        start_lba: u32,
        sectors: u32,
    ) -> Self {
        Self {
            boot_flag,
            starting_chs,
            part_type,
            end_chs,
            start_lba,
            sectors,
        }
    }

    #[inline]
    pub fn new_empty() -> Self {
        Self::new(MBR_BOOT_INACTIVE, [0, 0, 0], 0x00, [0, 0, 0], 0, 0)
    }

    /// Entry of type `part_type` spanning `[start_lba, start_lba + sectors)`,
    /// with CHS tuples derived from the LBA range.
    pub fn new_span(part_type: u8, start_lba: u32, sectors: u32) -> PartResult<Self> {
        let end = lba_end_inclusive(start_lba, sectors)?;
        Ok(Self::new(
            MBR_BOOT_INACTIVE,
            lba_to_chs(start_lba as u64),
            part_type,
            lba_to_chs(end),
            start_lba,
            sectors,
        ))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.part_type == 0
    }

    #[inline]
    pub fn kind(&self) -> MbrPartitionKind {
        MbrPartitionKind::from_byte(self.part_type)
    }

    #[inline]
    pub fn start_bytes(&self, sector_size: u64) -> u64 {
        self.start_lba as u64 * sector_size
    }

    #[inline]
    pub fn size_bytes(&self, sector_size: u64) -> u64 {
        self.sectors as u64 * sector_size
    }

    pub fn validate_basic(&self) -> PartResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if self.sectors == 0 {
            return Err(MbrError::ZeroSectors.into());
        }
        if !(self.boot_flag == MBR_BOOT_INACTIVE || self.boot_flag == MBR_BOOT_ACTIVE) {
            return Err(MbrError::InvalidBootFlag {
                got: self.boot_flag,
            }
            .into());
        }
        Ok(())
    }
}

/// On-disk (unaligned) form of [`MbrEntry`].
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct MbrEntryPacked {
    pub boot_flag: u8,
    pub starting_chs: [u8; 3],
    pub part_type: u8,
    pub end_chs: [u8; 3],
    pub start_lba: u32,
    pub sectors: u32,
}

impl MbrEntryPacked {
    #[inline]
    pub fn to_aligned(self) -> MbrEntry {
        MbrEntry {
            boot_flag: self.boot_flag,
            starting_chs: self.starting_chs,
            part_type: self.part_type,
            end_chs: self.end_chs,
            start_lba: u32::from_le(self.start_lba),
            sectors: u32::from_le(self.sectors),
        }
    }

    #[inline]
    pub fn from_aligned(e: &MbrEntry) -> Self {
        Self {
            boot_flag: e.boot_flag,
            starting_chs: e.starting_chs,
            part_type: e.part_type,
            end_chs: e.end_chs,
            start_lba: e.start_lba.to_le(),
            sectors: e.sectors.to_le(),
        }
    }
}

/// Sector 0 of a legacy-partitioned disk.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Mbr {
    pub bootstrap: [u8; 440],
    pub disk_signature: [u8; 4],
    pub reserved: [u8; 2],
    pub entries: [MbrEntryPacked; 4],
    pub signature: [u8; 2],
}

impl Mbr {
    #[inline]
    pub fn new_from_entries(entries: [MbrEntry; 4], disk_signature: u32) -> Self {
        Self {
            bootstrap: [0u8; 440],
            disk_signature: disk_signature.to_le_bytes(),
            reserved: [0u8; 2],
            entries: entries.map(|e| MbrEntryPacked::from_aligned(&e)),
            signature: MBR_SIGNATURE,
        }
    }

    #[inline]
    pub fn new_empty() -> Self {
        Self::new_from_entries([MbrEntry::new_empty(); 4], 0)
    }

    #[inline]
    pub fn disk_signature(&self) -> u32 {
        u32::from_le_bytes(self.disk_signature)
    }

    #[inline]
    pub fn has_valid_signature(&self) -> bool {
        self.signature == MBR_SIGNATURE
    }

    #[inline]
    pub fn aligned_entries(&self) -> [MbrEntry; 4] {
        self.entries.map(|e| e.to_aligned())
    }

    /// Entry at 1-based `index`, if that slot is in use.
    pub fn entry(&self, index: usize) -> PartResult<MbrEntry> {
        index
            .checked_sub(1)
            .and_then(|i| self.aligned_entries().get(i).copied())
            .filter(|e| !e.is_empty())
            .ok_or(PartError::NoSuchPartition { index })
    }

    pub fn validate_header(&self) -> PartResult<()> {
        if !self.has_valid_signature() {
            return Err(MbrError::InvalidSignature {
                expected: MBR_SIGNATURE,
                found: self.signature,
            }
            .into());
        }
        Ok(())
    }

    pub fn validate_legacy(&self) -> PartResult<()> {
        self.validate_header()?;
        let es = self.aligned_entries();
        for e in es.iter() {
            e.validate_basic()?;
        }
        for e in es.iter().filter(|e| !e.is_empty()) {
            match e.kind() {
                MbrPartitionKind::PROTECTIVE_GPT => return Err(MbrError::ProtectiveEntry.into()),
                k if !k.is_known() => {
                    return Err(MbrError::UnsupportedType { ty: e.part_type }.into());
                }
                _ => {}
            }
        }
        check_overlaps_legacy(&es)
    }
}

pub fn write_mbr<IO: ImgIO + ?Sized>(io: &mut IO, mbr: &Mbr, sector_size: u64) -> PartResult<()> {
    io.write_struct_lba(0, sector_size, mbr)?;
    io.flush()?;
    Ok(())
}

pub fn read_mbr<IO: ImgIO + ?Sized>(io: &mut IO, sector_size: u64) -> PartResult<Mbr> {
    let mbr: Mbr = io.read_struct_lba(0, sector_size)?;
    mbr.validate_header()?;
    Ok(mbr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fat32_at(start: u32, sectors: u32) -> MbrEntry {
        MbrEntry::new_span(MBR_TYPE_FAT32_CHS, start, sectors).unwrap()
    }

    #[test]
    fn mbr_is_one_sector() {
        assert_eq!(core::mem::size_of::<Mbr>(), 512);
        assert_eq!(core::mem::size_of::<MbrEntryPacked>(), 16);
    }

    #[test]
    fn chs_for_common_lbas() {
        assert_eq!(lba_to_chs(0), [0, 1, 0]);
        assert_eq!(lba_to_chs(2048), [32, 33, 0]);
        assert_eq!(lba_to_chs(69_631), [85, 17, 4]);
        // cylinder 1024 and beyond saturate
        assert_eq!(lba_to_chs(1024 * 255 * 63), CHS_SATURATED);
    }

    #[test]
    fn chs_high_cylinder_bits() {
        // cylinder 1023, head 254, sector 63
        let lba = 1023 * 255 * 63 + 254 * 63 + 62;
        assert_eq!(lba_to_chs(lba), [254, 0xFF, 0xFF]);
    }

    #[test]
    fn write_and_read_back() {
        let mut buf = [0u8; 1024];
        let mut io = MemImgIO::new(&mut buf);

        let mut es = [MbrEntry::new_empty(); 4];
        es[0] = fat32_at(2048, 67_584);
        write_mbr(&mut io, &Mbr::new_from_entries(es, 0xCAFE_F00D), 512).unwrap();

        let mbr = read_mbr(&mut io, 512).unwrap();
        mbr.validate_legacy().unwrap();
        assert_eq!(mbr.disk_signature(), 0xCAFE_F00D);

        let e = mbr.entry(1).unwrap();
        assert_eq!(e.part_type, 0x0B);
        assert_eq!(e.start_lba, 2048);
        assert_eq!(e.sectors, 67_584);
        assert_eq!(e.kind(), MbrPartitionKind::FAT32_CHS);
        assert!(is_fat32_chs_entry(&e));

        drop(io);
        assert_eq!(&buf[510..512], &MBR_SIGNATURE);
        assert_eq!(buf[446 + 4], 0x0B);
        assert_eq!(&buf[446 + 8..446 + 12], &2048u32.to_le_bytes());
    }

    #[test]
    fn entry_lookup_bounds() {
        let mut es = [MbrEntry::new_empty(); 4];
        es[0] = fat32_at(2048, 100);
        let mbr = Mbr::new_from_entries(es, 0);

        assert!(mbr.entry(1).is_ok());
        assert!(matches!(mbr.entry(0), Err(PartError::NoSuchPartition { index: 0 })));
        assert!(matches!(mbr.entry(2), Err(PartError::NoSuchPartition { index: 2 })));
        assert!(matches!(mbr.entry(5), Err(PartError::NoSuchPartition { index: 5 })));
    }

    #[test]
    fn read_rejects_bad_signature() {
        let mut buf = [0u8; 512];
        let mut io = MemImgIO::new(&mut buf);
        assert!(matches!(
            read_mbr(&mut io, 512),
            Err(PartError::Mbr(MbrError::InvalidSignature { .. }))
        ));
    }

    #[test]
    fn validate_detects_overlap() {
        let mut es = [MbrEntry::new_empty(); 4];
        es[0] = fat32_at(2048, 4096);
        es[1] = fat32_at(4096, 100);
        let mbr = Mbr::new_from_entries(es, 0);
        assert!(matches!(
            mbr.validate_legacy(),
            Err(PartError::Mbr(MbrError::Overlap { .. }))
        ));
    }

    #[test]
    fn validate_rejects_protective_and_unknown() {
        let mut es = [MbrEntry::new_empty(); 4];
        es[0] = MbrEntry::new_span(MBR_TYPE_PROTECTIVE_GPT, 1, 100).unwrap();
        assert!(Mbr::new_from_entries(es, 0).validate_legacy().is_err());

        es[0] = MbrEntry::new_span(0x42, 1, 100).unwrap();
        assert!(matches!(
            Mbr::new_from_entries(es, 0).validate_legacy(),
            Err(PartError::Mbr(MbrError::UnsupportedType { ty: 0x42 }))
        ));
    }

    #[test]
    fn zero_sector_span_rejected() {
        assert!(MbrEntry::new_span(MBR_TYPE_FAT32_CHS, 2048, 0).is_err());
    }
}
