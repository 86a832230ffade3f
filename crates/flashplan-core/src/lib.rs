pub mod image;
pub mod layout;
pub mod overlay;
pub mod pm_static;

pub use image::{elf_sizes, hex_data_bytes, open_elf, ImageSizeError, SizeReport};
pub use layout::{
    compute_layout, LayoutError, PartitionRecord, PartitionRequest, DEFAULT_MCUBOOT_SIZE,
    DEFAULT_SCRATCH_SIZE, DEFAULT_STORAGE_SIZE, NRF52840_FLASH_SIZE,
};
pub use overlay::render_overlay;
pub use pm_static::{parse_pm_config, render_pm_config, PmEntry, PmParseError};
