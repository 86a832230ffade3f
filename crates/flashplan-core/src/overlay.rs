use crate::layout::PartitionRecord;
use assert_into::AssertInto;

/// Device-tree labels for the partition nodes. MCUboot expects the image
/// slots under the "image-N" labels; anything not listed passes through.
const OVERLAY_LABELS: &[(&str, &str)] = &[
    ("mcuboot", "mcuboot"),
    ("slot0", "image-0"),
    ("slot1", "image-1"),
    ("scratch", "image-scratch"),
    ("storage", "storage"),
];

pub fn overlay_label(name: &str) -> &str {
    OVERLAY_LABELS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Renders the partition records as a device-tree overlay: a fixed chosen
/// node selecting the boot code partition, then one `fixed-partitions`
/// child node per record under `&flash0`.
///
/// `reg` cells are 32 bit, so any record placed past 4 GiB is a caller bug.
pub fn render_overlay(records: &[PartitionRecord]) -> String {
    let mut out = String::new();
    out.push_str("// Auto-generated by flashplan\n");
    out.push_str("// Device tree overlay for partition configuration\n\n");

    out.push_str("/ {\n");
    out.push_str("\tchosen {\n");
    out.push_str("\t\tzephyr,code-partition = &slot0_partition;\n");
    out.push_str("\t};\n");
    out.push_str("};\n\n");

    out.push_str("&flash0 {\n");
    out.push_str("\tpartitions {\n");
    out.push_str("\t\tcompatible = \"fixed-partitions\";\n");
    out.push_str("\t\t#address-cells = <1>;\n");
    out.push_str("\t\t#size-cells = <1>;\n\n");

    for record in records {
        let start: u32 = record.start.assert_into();
        let size: u32 = record.size.assert_into();

        out.push_str(&format!(
            "\t\t{}_partition: partition@{:x} {{\n",
            record.name, start
        ));
        out.push_str(&format!("\t\t\tlabel = \"{}\";\n", overlay_label(&record.name)));
        out.push_str(&format!("\t\t\treg = <{:#010x} {:#010x}>;\n", start, size));

        match record.name.as_str() {
            "mcuboot" => out.push_str("\t\t\tread-only;\n"),
            "slot0" => out.push_str("\t\t\t// Primary application slot\n"),
            "slot1" => out.push_str("\t\t\t// Secondary application slot\n"),
            "scratch" => out.push_str("\t\t\t// MCUboot scratch area\n"),
            "storage" => out.push_str("\t\t\t// Settings storage\n"),
            _ => {}
        }

        out.push_str("\t\t};\n\n");
    }

    out.push_str("\t};\n");
    out.push_str("};\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, PartitionRequest};

    fn sample_records() -> Vec<PartitionRecord> {
        let requests = vec![
            PartitionRequest::new("mcuboot", 0x1b800),
            PartitionRequest::new("slot0", 0x68a00),
            PartitionRequest::new("slot1", 0x68a00),
            PartitionRequest::new("scratch", 0x400),
            PartitionRequest::new("storage", 0x13000),
        ];
        compute_layout(0x100000, &requests).unwrap()
    }

    #[test]
    fn renders_one_node_per_record() {
        let text = render_overlay(&sample_records());

        assert!(text.contains("zephyr,code-partition = &slot0_partition;"));
        assert!(text.contains("compatible = \"fixed-partitions\";"));

        assert!(text.contains("mcuboot_partition: partition@0 {"));
        assert!(text.contains("\t\t\tlabel = \"mcuboot\";\n\t\t\treg = <0x00000000 0x0001b800>;\n\t\t\tread-only;\n"));

        assert!(text.contains("slot0_partition: partition@1b800 {"));
        assert!(text.contains("\t\t\tlabel = \"image-0\";\n\t\t\treg = <0x0001b800 0x00068a00>;\n"));

        assert!(text.contains("slot1_partition: partition@84200 {"));
        assert!(text.contains("label = \"image-1\";"));

        assert!(text.contains("scratch_partition: partition@ecc00 {"));
        assert!(text.contains("label = \"image-scratch\";"));

        assert!(text.contains("storage_partition: partition@ed000 {"));
        assert!(text.contains("label = \"storage\";"));
    }

    #[test]
    fn node_names_derive_from_the_partition_name() {
        let records = compute_layout(4096, &[PartitionRequest::new("fota_cache", 4096)]).unwrap();
        let text = render_overlay(&records);
        assert!(text.contains("fota_cache_partition: partition@0 {"));
        assert!(text.contains("label = \"fota_cache\";"));
    }

    #[test]
    fn empty_layout_renders_only_the_fixed_template() {
        let text = render_overlay(&[]);
        assert!(text.contains("zephyr,code-partition = &slot0_partition;"));
        assert!(text.contains("#size-cells = <1>;"));
        assert!(!text.contains("partition@"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let records = sample_records();
        assert_eq!(render_overlay(&records), render_overlay(&records));
    }
}
