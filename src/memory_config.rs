use crate::segment::SEGMENT_BYTES;

/// Memory and page budget for one run.
///
/// Everything the sweep sizes itself by derives from two numbers: M bytes of
/// working memory and B bytes per page. The budget is an explicit contract,
/// not a host measurement, so runs are reproducible.
///
/// Budget breakdown per recursion level:
/// - fan-out k ~ sqrt(M/B) slabs, each with an active-vertical window
/// - half of M for the windows, the rest for pages and merge state
/// - sub-problems at or below M/record_size segments are solved in memory
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub memory_bytes: usize,
    pub page_bytes: usize,
}

impl MemoryConfig {
    pub fn new(memory_bytes: usize, page_bytes: usize) -> Self {
        let page_bytes = page_bytes.max(SEGMENT_BYTES as usize);
        let memory_bytes = memory_bytes.max(page_bytes * 4);
        MemoryConfig {
            memory_bytes,
            page_bytes,
        }
    }

    /// Production defaults: 1 MiB of working memory, 4 KiB pages.
    pub fn default_config() -> Self {
        MemoryConfig::new(1 << 20, 4096)
    }

    pub fn records_per_page(&self) -> usize {
        (self.page_bytes / SEGMENT_BYTES as usize).max(1)
    }

    /// Slab fan-out per recursion level, k ~ sqrt(M/B), at least 2.
    pub fn fan_out(&self) -> usize {
        let ratio = (self.memory_bytes / self.page_bytes) as f64;
        (ratio.sqrt() as usize).max(2)
    }

    /// Sub-problems with at most this many records are swept in memory.
    pub fn base_case_records(&self) -> u64 {
        (self.memory_bytes as u64 / SEGMENT_BYTES).max(1)
    }

    /// In-memory window capacity for one slab's active-vertical buffer,
    /// sized so all windows of a level together stay inside the budget.
    pub fn window_records(&self, slab_count: usize) -> usize {
        let window_budget = self.memory_bytes / 2;
        (window_budget / SEGMENT_BYTES as usize / slab_count.max(1)).max(1)
    }
}
