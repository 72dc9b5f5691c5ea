use crate::buckets::DEFAULT_MAX_BUCKETS;
use crate::query::DEFAULT_PAGE_SIZE;
use anyhow::{Result, bail};

/// Knobs shared by the dashboard and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    pub page_size: u32,
    pub max_buckets: usize,
}

impl DashboardConfig {
    pub fn validated(self) -> Result<Self> {
        if self.page_size == 0 {
            bail!("page size must be at least 1");
        }
        if self.max_buckets == 0 {
            bail!("max buckets must be at least 1");
        }
        Ok(self)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }
}
