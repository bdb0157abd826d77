// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use setupbin_img::utils::shell_quote;
use setupbin_img::{BuildOptions, ErrorClass, build, constants::*, log_error, log_info};

#[derive(Parser)]
#[command(
    name = "amt-setupbin-img",
    version,
    about = "Embed an Intel AMT Setup.bin into a FAT32 USB disk image",
    long_about = None
)]
struct Cli {
    /// The Setup.bin to embed in the disk image
    #[arg(long, default_value = DEFAULT_SOURCE_PATH)]
    path: PathBuf,

    /// The disk image to create
    #[arg(long, default_value = DEFAULT_IMAGE_PATH)]
    img_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let opts = BuildOptions::new(&cli.path, &cli.img_path);

    match build(&opts) {
        Ok(report) => {
            log_info!("{report}");
            print!("{}", instructions(&cli));
            ExitCode::SUCCESS
        }
        Err(err) => {
            log_error!("{err:#}");
            log_error!("{}: no usable image was produced", ErrorClass::of(&err));
            ExitCode::FAILURE
        }
    }
}

fn instructions(cli: &Cli) -> String {
    let img = shell_quote(&cli.img_path.to_string_lossy());
    let src = shell_quote(&cli.path.to_string_lossy());
    let name = TARGET_PATH.trim_start_matches('/');
    format!(
        r#"
You can now burn the {img} image into a USB key with a software like:

	https://github.com/raspberrypi/rpi-imager
	https://github.com/balena-io/etcher

If you are curious, you can mount the created {img} image with:

fdisk -l {img} --bytes
sudo mkdir /mnt/amt-setup
target_device="$(sudo losetup --partscan --show --find {img})"
sudo fdisk -l "$target_device"
sudo mount -o ro "${{target_device}}p1" /mnt/amt-setup
sudo df -h /mnt/amt-setup
sudo ls -laF /mnt/amt-setup
sudo sha256sum /mnt/amt-setup/{name} {src}
sudo umount /mnt/amt-setup
sudo losetup --detach "$target_device"

"#
    )
}
