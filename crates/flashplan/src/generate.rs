use std::{
    fs, io,
    path::{Path, PathBuf},
};

use flashplan_core::{compute_layout, render_overlay, render_pm_config, PartitionRequest};
use log::info;

use crate::report::print_layout_table;

/// Builds the request list from the size budgets. The two application slots
/// share the flash left over after the fixed partitions unless an explicit
/// slot size is given.
pub fn build_requests(
    flash_size: u64,
    mcuboot_size: u64,
    storage_size: u64,
    scratch_size: u64,
    slot_size: Option<u64>,
) -> Vec<PartitionRequest> {
    let fixed = mcuboot_size + storage_size + scratch_size;
    let slot = slot_size.unwrap_or_else(|| flash_size.saturating_sub(fixed) / 2);

    vec![
        PartitionRequest::new("mcuboot", mcuboot_size),
        PartitionRequest::new("slot0", slot),
        PartitionRequest::new("slot1", slot),
        PartitionRequest::new("scratch", scratch_size),
        PartitionRequest::new("storage", storage_size),
    ]
}

pub fn generate(
    flash_size: u64,
    mcuboot_size: u64,
    storage_size: u64,
    scratch_size: u64,
    slot_size: Option<u64>,
    out_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let requests = build_requests(
        flash_size,
        mcuboot_size,
        storage_size,
        scratch_size,
        slot_size,
    );

    // Layout first, so an overflow aborts before any file is touched
    let records = compute_layout(flash_size, &requests)?;

    println!("MCUboot Partition Layout for nRF52840");
    println!("{}", "=".repeat(70));
    print_layout_table(&records, flash_size);
    println!();

    let pm_path = out_dir.join("pm_static.yml");
    let overlay_path = out_dir.join("app.overlay");

    backup_existing(&pm_path)?;
    backup_existing(&overlay_path)?;

    fs::write(&pm_path, render_pm_config(&records))?;
    info!("Updated {}", pm_path.display());

    fs::write(&overlay_path, render_overlay(&records))?;
    info!("Updated {}", overlay_path.display());

    Ok(())
}

/// Moves an existing artifact aside as `<name>.backup`. An already present
/// backup is left alone so the first generated-over original survives
/// repeated runs.
fn backup_existing(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    let backup = PathBuf::from(backup);

    if backup.exists() {
        return Ok(());
    }

    fs::rename(path, &backup)?;
    info!("Created backup {}", backup.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashplan_core::{compute_layout, NRF52840_FLASH_SIZE};

    #[test]
    fn default_budgets_fill_the_flash_exactly() {
        let requests = build_requests(NRF52840_FLASH_SIZE, 110 * 1024, 76 * 1024, 1024, None);

        let total: u64 = requests.iter().map(|r| r.size).sum();
        assert_eq!(total, NRF52840_FLASH_SIZE);

        let records = compute_layout(NRF52840_FLASH_SIZE, &requests).unwrap();
        assert_eq!(records[1].name, "slot0");
        assert_eq!(records[1].size, 428544);
        assert_eq!(records[1].size, records[2].size);
        assert_eq!(records.last().unwrap().end, NRF52840_FLASH_SIZE);
    }

    #[test]
    fn explicit_slot_size_overrides_the_split() {
        let requests = build_requests(NRF52840_FLASH_SIZE, 110 * 1024, 76 * 1024, 1024, Some(4096));
        assert_eq!(requests[1].size, 4096);
        assert_eq!(requests[2].size, 4096);
    }

    #[test]
    fn oversized_fixed_budgets_leave_empty_slots() {
        let requests = build_requests(1024, 2048, 0, 0, None);
        assert_eq!(requests[1].size, 0);
        assert_eq!(requests[2].size, 0);
    }
}
