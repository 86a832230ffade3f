use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use flashplan_core::{
    elf_sizes, hex_data_bytes, open_elf, parse_pm_config, PmEntry, SizeReport, NRF52840_FLASH_SIZE,
};
use log::warn;

use crate::report::{kib, print_size_line, print_size_report, with_commas};

enum ImageUsage {
    Elf(SizeReport),
    Hex(u64),
    Unavailable,
}

impl ImageUsage {
    fn flash_total(&self) -> Option<u64> {
        match self {
            ImageUsage::Elf(report) => Some(report.flash_total()),
            ImageUsage::Hex(bytes) => Some(*bytes),
            ImageUsage::Unavailable => None,
        }
    }
}

pub fn footprint(build_dir: &Path, pm_static: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Flash Footprint Analysis");
    println!("{}", "=".repeat(60));

    let mcuboot_dir = build_dir.join("mcuboot").join("zephyr");
    let app_dir = build_dir.join("zephyr");

    println!("\nMCUboot Bootloader:");
    println!("{}", "-".repeat(30));
    let mcuboot = image_usage(
        &mcuboot_dir.join("zephyr.elf"),
        &mcuboot_dir.join("zephyr.hex"),
    );
    print_image_usage(&mcuboot, "MCUboot");

    println!("\nMain Application:");
    println!("{}", "-".repeat(30));
    let app = image_usage(&app_dir.join("zephyr.elf"), &app_dir.join("zephyr.hex"));
    print_image_usage(&app, "Application");

    println!("\nPartition Usage:");
    println!("{}", "-".repeat(30));
    let partitions = read_partitions(pm_static);
    match &partitions {
        Some(partitions) => print_partition_usage(partitions, &mcuboot, &app),
        None => println!("No partition table found at {}", pm_static.display()),
    }

    println!("\nSummary:");
    println!("{}", "-".repeat(30));
    print_summary(partitions.as_deref(), &mcuboot, &app);

    Ok(())
}

/// Prefers the ELF (full text/data/bss breakdown), falls back to counting
/// the HEX data records, and degrades to "not available" when neither is
/// readable. Missing build output is never fatal.
fn image_usage(elf_path: &Path, hex_path: &Path) -> ImageUsage {
    match File::open(elf_path) {
        Ok(file) => match open_elf(BufReader::new(file)) {
            Ok(elf) => return ImageUsage::Elf(elf_sizes(&elf)),
            Err(err) => warn!("Could not parse {}: {}", elf_path.display(), err),
        },
        Err(err) => warn!("Could not open {}: {}", elf_path.display(), err),
    }

    match File::open(hex_path) {
        Ok(file) => match hex_data_bytes(BufReader::new(file)) {
            Ok(bytes) => return ImageUsage::Hex(bytes),
            Err(err) => warn!("Could not read {}: {}", hex_path.display(), err),
        },
        Err(err) => warn!("Could not open {}: {}", hex_path.display(), err),
    }

    ImageUsage::Unavailable
}

fn print_image_usage(usage: &ImageUsage, label: &str) {
    match usage {
        ImageUsage::Elf(report) => print_size_report(report),
        ImageUsage::Hex(bytes) => print_size_line("Flash usage:", *bytes),
        ImageUsage::Unavailable => println!("{} size information not available", label),
    }
}

fn read_partitions(pm_static: &Path) -> Option<Vec<(String, PmEntry)>> {
    let text = match fs::read_to_string(pm_static) {
        Ok(text) => text,
        Err(err) => {
            warn!("Could not open {}: {}", pm_static.display(), err);
            return None;
        }
    };

    match parse_pm_config(&text) {
        Ok(partitions) => Some(partitions),
        Err(err) => {
            warn!("Could not parse {}: {}", pm_static.display(), err);
            None
        }
    }
}

fn print_partition_usage(
    partitions: &[(String, PmEntry)],
    mcuboot: &ImageUsage,
    app: &ImageUsage,
) {
    for (name, entry) in partitions {
        let size = match entry.size {
            Some(size) => size,
            None => continue,
        };

        println!(
            "{:<16}: {:>10} bytes ({:6.1} KB)",
            name,
            with_commas(size),
            kib(size)
        );

        let image = match name.as_str() {
            "mcuboot" => mcuboot.flash_total(),
            // the primary slot carries the application image
            "mcuboot_primary" | "slot0" => app.flash_total(),
            _ => None,
        };

        if let (Some(used), true) = (image, size > 0) {
            println!(
                "{:16}  Usage: {:5.1}%",
                "",
                used as f64 / size as f64 * 100.0
            );
        }
    }
}

fn print_summary(
    partitions: Option<&[(String, PmEntry)]>,
    mcuboot: &ImageUsage,
    app: &ImageUsage,
) {
    // The partition table ends at the flash boundary; without one assume
    // the nRF52840 flash size
    let total_flash = partitions
        .and_then(|partitions| {
            partitions
                .iter()
                .filter_map(|(_, entry)| entry.end_address)
                .max()
        })
        .unwrap_or(NRF52840_FLASH_SIZE);

    let (mcuboot_used, app_used) = match (mcuboot.flash_total(), app.flash_total()) {
        (Some(mcuboot_used), Some(app_used)) => (mcuboot_used, app_used),
        _ => {
            println!("Summary not available, both image sizes are needed");
            return;
        }
    };

    let total_used = mcuboot_used + app_used;
    let remaining = total_flash.saturating_sub(total_used);

    print_size_line("Total flash:", total_flash);
    print_size_line("Used by code:", total_used);
    print_size_line("Available:", remaining);
    println!(
        "{:<16} {:5.1}%",
        "Usage:",
        total_used as f64 / total_flash as f64 * 100.0
    );
}
