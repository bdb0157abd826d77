// SPDX-License-Identifier: MIT

//! The image pipeline: read, plan, partition, format, inject, verify.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use imgfs::fat32::*;
use imgfs::volume_id_from_bytes;
use imgpart::kinds::MBR_TYPE_FAT32_CHS;
use imgpart::{PartitionPlan, locate_partition, partition, plan};

use crate::constants::*;
use crate::errors::VerificationFailed;
use crate::image::create_image;
use crate::utils::{StageSpinner, pretty_bytes};

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub image: PathBuf,
    pub label: String,
    pub target_path: String,
}

impl BuildOptions {
    pub fn new(source: impl Into<PathBuf>, image: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            image: image.into(),
            label: VOLUME_LABEL.to_string(),
            target_path: TARGET_PATH.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub image: PathBuf,
    pub plan: PartitionPlan,
    pub source_len: u64,
    pub volume_id: u32,
    pub bytes_per_cluster: u32,
    pub clusters_used: usize,
    pub free_clusters: u32,
    pub warnings: usize,
    pub elapsed: Duration,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written: {} disk, FAT32 volume {:04X}-{:04X}, {} cluster(s) of {} B used, {} free, in {:.2}s",
            self.image.display(),
            pretty_bytes(self.plan.total_bytes()),
            self.volume_id >> 16,
            self.volume_id & 0xFFFF,
            self.clusters_used,
            self.bytes_per_cluster,
            self.free_clusters,
            self.elapsed.as_secs_f32()
        )
    }
}

/// Builds the image described by `opts`.
///
/// The source is read in full before the image file is touched, so an
/// unreadable source never leaves an image behind. Later failures leave a
/// partial image.
pub fn build(opts: &BuildOptions) -> anyhow::Result<BuildReport> {
    let spinner = StageSpinner::start("reading source");

    let data = read_source(&opts.source)?;
    let source_len = data.len() as u64;
    let volume_id = volume_id_from_bytes(&data);
    crate::log_info!(
        "source {} ({}, crc32 {volume_id:08x})",
        opts.source.display(),
        pretty_bytes(source_len)
    );

    let plan = plan(source_len, SECTOR_SIZE);
    crate::log_info!("{plan}");
    if plan.size_bytes() < source_len {
        crate::log_warn!(
            "partition is {} byte(s) smaller than the source",
            source_len - plan.size_bytes()
        );
    }

    spinner.stage("creating image");
    let mut image = create_image(&opts.image, plan.total_bytes())?;

    let (bytes_per_cluster, clusters_used, free_clusters, warnings) = {
        let mut io = image.as_io();

        spinner.stage("writing partition table");
        partition(&mut io, &plan, volume_id).context("cannot write the partition table")?;

        spinner.stage("formatting FAT32");
        let mut vol = format_filesystem(&mut io, PARTITION_INDEX, &opts.label, volume_id)?;
        let bytes_per_cluster = vol.meta().bytes_per_cluster;

        spinner.stage("writing payload");
        let outcome = vol
            .write_file(&opts.target_path, &data, &FileAttributes::new_file())
            .with_context(|| format!("cannot write {}", opts.target_path))?;
        vol.flush().context("cannot flush the filesystem")?;

        spinner.stage("verifying");
        let warnings = verify_filesystem(&mut vol, &opts.target_path, &data)?;
        let free = vol.free_clusters();
        drop(vol);

        io.set_offset(0);
        verify_partition_table(&mut io, &plan)?;
        io.flush().context("cannot flush the image")?;
        (bytes_per_cluster, outcome.units(), free, warnings)
    };

    let path = image.path().to_path_buf();
    image.close()?;

    Ok(BuildReport {
        image: path,
        plan,
        source_len,
        volume_id,
        bytes_per_cluster,
        clusters_used,
        free_clusters,
        warnings,
        elapsed: spinner.finish(),
    })
}

fn read_source(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Formats partition `partition_index` (1-based) of the disk behind `io` as
/// FAT32 and returns the mounted, empty volume.
///
/// `io` must address the whole disk; on return it is rebased onto the
/// partition. The label is checked before any filesystem byte is written.
pub fn format_filesystem<'a, IO: ImgIO + ?Sized>(
    io: &'a mut IO,
    partition_index: usize,
    label: &str,
    volume_id: u32,
) -> anyhow::Result<Fat32Volume<'a, IO>> {
    io.set_offset(0);
    let span = locate_partition(&mut *io, partition_index, SECTOR_SIZE)
        .with_context(|| format!("cannot resolve partition {partition_index}"))?;

    let params = Fat32Params::default()
        .with_label(label)
        .with_volume_id(volume_id)
        .with_hidden_sectors(span.entry.start_lba);

    io.set_offset(span.offset_bytes);
    let vol = Fat32Volume::format(io, span.size_bytes, &params, false)
        .with_context(|| format!("cannot format partition {partition_index} as FAT32"))?;
    crate::log_info!(
        "FAT32 \"{}\": {} clusters of {} B",
        label,
        vol.meta().cluster_count,
        vol.meta().bytes_per_cluster
    );
    Ok(vol)
}

/// Runs the structural checker and reads the payload back. Returns the
/// number of warnings.
fn verify_filesystem<IO: ImgIO + ?Sized>(
    vol: &mut Fat32Volume<'_, IO>,
    target_path: &str,
    expected: &[u8],
) -> anyhow::Result<usize> {
    let report = vol.check().context("cannot verify the filesystem")?;
    for finding in report.findings.iter().filter(|f| f.sev == Severity::Warn) {
        crate::log_warn!("{finding}");
    }
    if let Some(first) = report.first_error() {
        return Err(VerificationFailed {
            errors: report.count(Severity::Error),
            first: first.to_string(),
        }
        .into());
    }

    let back = vol
        .read_file(target_path)
        .with_context(|| format!("cannot read back {target_path}"))?;
    if back != expected {
        return Err(VerificationFailed {
            errors: 1,
            first: format!("{target_path} content differs after write"),
        }
        .into());
    }
    Ok(report.count(Severity::Warn))
}

fn verify_partition_table<IO: ImgIO + ?Sized>(
    io: &mut IO,
    plan: &PartitionPlan,
) -> anyhow::Result<()> {
    let span = locate_partition(io, PARTITION_INDEX, SECTOR_SIZE)
        .context("cannot read back the partition table")?;
    if span.entry.part_type != MBR_TYPE_FAT32_CHS
        || span.offset_bytes != plan.start_bytes()
        || span.size_bytes != plan.size_bytes()
    {
        bail!(VerificationFailed {
            errors: 1,
            first: format!("partition table entry does not match {plan}"),
        });
    }
    Ok(())
}
