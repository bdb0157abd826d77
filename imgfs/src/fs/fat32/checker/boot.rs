// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::core::checker::*;
use crate::fs::fat32::{
    constant::*,
    meta::Fat32Meta,
    types::{Fat32FsInfo, Fat32Vbr},
};

pub fn check_boot<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let vbr: Fat32Vbr = io.read_struct(meta.sector_offset(FAT_VBR_SECTOR))?;
    match vbr.validate(meta) {
        Ok(()) => rep.push(Finding::info("VBR.OK", "VBR validated")),
        Err(e) => rep.push(Finding::err("VBR.INVALID", e)),
    }
    compare_sectors(io, meta, FAT_VBR_SECTOR, FAT_VBR_BACKUP_SECTOR, "VBR.MIRROR", rep)?;

    let fsi: Fat32FsInfo = io.read_struct(meta.sector_offset(FAT_FSINFO_SECTOR))?;
    match fsi.validate() {
        Ok(()) => rep.push(Finding::info("FSI.OK", "FSInfo signatures present")),
        Err(e) => rep.push(Finding::err("FSI.INVALID", e)),
    }
    compare_sectors(
        io,
        meta,
        FAT_FSINFO_SECTOR,
        FAT_FSINFO_BACKUP_SECTOR,
        "FSI.MIRROR",
        rep,
    )?;
    Ok(())
}

fn compare_sectors<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    main: u64,
    backup: u64,
    code: &'static str,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let bps = meta.bytes_per_sector as usize;
    let mut a = vec![0u8; bps];
    let mut b = vec![0u8; bps];
    io.read_at(meta.sector_offset(main), &mut a)?;
    io.read_at(meta.sector_offset(backup), &mut b)?;
    if a == b {
        rep.push(Finding::info(code, format!("sector {backup} mirrors sector {main}")));
    } else {
        rep.push(Finding::warn(code, format!("sector {backup} differs from sector {main}")));
    }
    Ok(())
}

/// Compares the FSInfo free count with the clusters actually free.
pub fn check_fsinfo_free<IO: ImgIO + ?Sized>(
    io: &mut IO,
    meta: &Fat32Meta,
    measured_free: u32,
    rep: &mut VerifyReport,
) -> FsCheckerResult {
    let fsi: Fat32FsInfo = io.read_struct(meta.sector_offset(FAT_FSINFO_SECTOR))?;
    let advertised = fsi.free_cluster_count;
    if advertised == FAT_FSINFO_UNKNOWN {
        rep.push(Finding::warn("FSI.FREE", "FSInfo free count unknown"));
    } else if advertised == measured_free {
        rep.push(Finding::info(
            "FSI.FREE",
            format!("FSInfo free count matches FAT ({measured_free})"),
        ));
    } else {
        rep.push(Finding::warn(
            "FSI.FREE",
            format!("FSInfo free count {advertised}, FAT has {measured_free} free"),
        ));
    }
    Ok(())
}
