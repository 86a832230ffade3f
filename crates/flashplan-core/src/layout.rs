use thiserror::Error;

/// nRF52840 on-chip flash.
pub const NRF52840_FLASH_SIZE: u64 = 1024 * 1024;

pub const DEFAULT_MCUBOOT_SIZE: u64 = 110 * 1024;
pub const DEFAULT_STORAGE_SIZE: u64 = 76 * 1024;
pub const DEFAULT_SCRATCH_SIZE: u64 = 1024;

/// A named size budget to place in flash. Requests are laid out in list
/// order, so the position in the request list decides the address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartitionRequest {
    pub name: String,
    pub size: u64,
}

impl PartitionRequest {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// A placed partition. `end` is exclusive and `end - start == size`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartitionRecord {
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Partition '{partition}' exceeds the flash capacity by {overflow:#x} bytes")]
    CapacityExceeded { partition: String, overflow: u64 },
}

/// Assigns every request a contiguous address range starting at offset 0,
/// in request order, with no padding or reordering. Fails on the first
/// request that would push the layout past `capacity`; no partial layout
/// is returned.
///
/// Sizes are taken as-is, the caller is responsible for any block alignment.
pub fn compute_layout(
    capacity: u64,
    requests: &[PartitionRequest],
) -> Result<Vec<PartitionRecord>, LayoutError> {
    let mut cursor = 0;
    let mut records = Vec::with_capacity(requests.len());

    for request in requests {
        // cursor <= capacity holds here, so the subtraction cannot wrap
        if request.size > capacity - cursor {
            return Err(LayoutError::CapacityExceeded {
                partition: request.name.clone(),
                overflow: request.size - (capacity - cursor),
            });
        }

        records.push(PartitionRecord {
            name: request.name.clone(),
            start: cursor,
            end: cursor + request.size,
            size: request.size,
        });
        cursor += request.size;
    }

    Ok(records)
}
