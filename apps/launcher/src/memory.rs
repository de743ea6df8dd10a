use sysinfo::System;
use tracing::warn;

pub const FALLBACK_MAX_GB: u32 = 16;
pub const DEFAULT_RAM_GB: u32 = 4;

const GIB: u64 = 1024 * 1024 * 1024;

/// Total physical memory in whole GiB, at least 1. Falls back to 16 when the
/// platform reports nothing.
pub fn system_max_gb() -> u32 {
    let mut system = System::new();
    system.refresh_memory();
    match whole_gib(system.total_memory()) {
        Some(gb) => gb,
        None => {
            warn!("RAM detection failed; assuming {FALLBACK_MAX_GB} GB");
            FALLBACK_MAX_GB
        }
    }
}

fn whole_gib(total_bytes: u64) -> Option<u32> {
    if total_bytes == 0 {
        return None;
    }
    let gb = (total_bytes / GIB).max(1);
    Some(u32::try_from(gb).unwrap_or(u32::MAX))
}

pub fn default_ram_gb(max_gb: u32) -> u32 {
    DEFAULT_RAM_GB.min(max_gb).max(1)
}

/// Keeps a requested allocation within `1..=max_gb`.
pub fn clamp_ram_gb(requested: u32, max_gb: u32) -> u32 {
    requested.clamp(1, max_gb.max(1))
}
