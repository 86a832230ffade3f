use flashplan_core::{PartitionRecord, SizeReport};

/// Groups a byte count with thousands separators, e.g. `1048576` ->
/// `1,048,576`.
pub fn with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

pub fn kib(value: u64) -> f64 {
    value as f64 / 1024.0
}

pub fn print_size_line(label: &str, bytes: u64) {
    println!(
        "{:<16} {:>10} bytes ({:6.1} KB)",
        label,
        with_commas(bytes),
        kib(bytes)
    );
}

pub fn print_size_report(report: &SizeReport) {
    print_size_line("Text (code):", report.text);
    print_size_line("Data (init):", report.data);
    print_size_line("BSS (uninit):", report.bss);
    print_size_line("Flash usage:", report.flash_total());
    print_size_line("RAM usage:", report.ram_total());
}

/// Prints the layout as a hex table, with a trailing UNUSED row when the
/// partitions do not fill the whole flash.
pub fn print_layout_table(records: &[PartitionRecord], flash_size: u64) {
    println!(
        "Flash Size: {:#x} ({} bytes)",
        flash_size,
        with_commas(flash_size)
    );
    println!("{}", "-".repeat(70));
    println!(
        "{:<20} {:<12} {:<12} {:<12} {:<10}",
        "Partition", "Start", "End", "Size", "Size (KB)"
    );
    println!("{}", "-".repeat(70));

    for record in records {
        println!(
            "{:<20} {:#010x}   {:#010x}   {:#010x}   {}KB",
            record.name,
            record.start,
            record.end,
            record.size,
            record.size / 1024
        );
    }

    let total_used: u64 = records.iter().map(|r| r.size).sum();
    let remaining = flash_size - total_used;
    if remaining > 0 {
        println!("{}", "-".repeat(70));
        println!(
            "{:<20} {:#010x}   {:#010x}   {:#010x}   {}KB",
            "UNUSED",
            total_used,
            flash_size,
            remaining,
            remaining / 1024
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_group_from_the_right() {
        assert_eq!(with_commas(0), "0");
        assert_eq!(with_commas(512), "512");
        assert_eq!(with_commas(1024), "1,024");
        assert_eq!(with_commas(1048576), "1,048,576");
        assert_eq!(with_commas(123456789), "123,456,789");
    }
}
