use crate::layout::PartitionRecord;
use thiserror::Error;

/// Nordic Partition Manager names for the partitions this tool lays out.
/// Anything not listed passes through unchanged.
const PM_NAMES: &[(&str, &str)] = &[
    ("mcuboot", "mcuboot"),
    ("slot0", "mcuboot_primary"),
    ("slot1", "mcuboot_secondary"),
    ("scratch", "mcuboot_scratch"),
    ("storage", "settings_storage"),
];

pub fn pm_static_name(name: &str) -> &str {
    PM_NAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Renders the partition records as a `pm_static.yml` static configuration,
/// one block per record in layout order.
pub fn render_pm_config(records: &[PartitionRecord]) -> String {
    let mut out = String::new();
    out.push_str("# Auto-generated by flashplan\n");
    out.push_str("# Nordic Partition Manager static configuration\n\n");

    for record in records {
        out.push_str(&format!(
            "{}:\n  address: {:#x}\n  end_address: {:#x}\n  region: flash_primary\n  size: {:#x}\n\n",
            pm_static_name(&record.name),
            record.start,
            record.end,
            record.size,
        ));
    }

    out
}

/// One parsed `pm_static.yml` block. Properties the file does not carry
/// stay `None`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PmEntry {
    pub address: Option<u64>,
    pub end_address: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Error, Debug)]
pub enum PmParseError {
    #[error("Line {0}: '{1}' is not a hex value")]
    BadHexValue(usize, String),
    #[error("Line {0}: property outside of any partition block")]
    PropertyOutsideBlock(usize),
}

/// Reads back a `pm_static.yml` produced by [`render_pm_config`] (or written
/// by hand in the same shape). Block order is preserved; unknown properties
/// are ignored.
pub fn parse_pm_config(input: &str) -> Result<Vec<(String, PmEntry)>, PmParseError> {
    let mut partitions: Vec<(String, PmEntry)> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;

        if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
            continue;
        }

        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        let line = raw.trim();

        if !indented {
            let name = line.trim_end_matches(':');
            partitions.push((name.to_string(), PmEntry::default()));
            continue;
        }

        let (key, value) = match line.split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => continue,
        };

        let entry = match partitions.last_mut() {
            Some((_, entry)) => entry,
            None => return Err(PmParseError::PropertyOutsideBlock(line_no)),
        };

        let field = match key {
            "address" => &mut entry.address,
            "end_address" => &mut entry.end_address,
            "size" => &mut entry.size,
            _ => continue,
        };

        let digits = value.strip_prefix("0x").unwrap_or(value);
        *field = Some(
            u64::from_str_radix(digits, 16)
                .map_err(|_| PmParseError::BadHexValue(line_no, value.to_string()))?,
        );
    }

    Ok(partitions)
}
