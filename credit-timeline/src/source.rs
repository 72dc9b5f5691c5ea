use crate::query::{CustomerFilter, PageRequest, query_string, select_page};
use crate::snapshot::{CustomerPage, CustomerRecord};
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Where customer pages come from.
pub trait CustomerSource: Send + Sync + 'static {
    /// Fetch one filtered page of customers
    fn fetch_page(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<CustomerPage>> + Send;
}

/// The file holds either a bare array of customers or a `{ "data": [...] }`
/// envelope as saved from the listing endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Bare(Vec<CustomerRecord>),
    Envelope { data: Vec<CustomerRecord> },
}

/// Serves pages from a JSON customer listing on disk. The file is re-read on
/// every fetch so edits show up on the next page change.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<CustomerRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read customer listing {}", self.path.display()))?;

        let listing: Listing = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse customer listing {}", self.path.display()))?;

        Ok(match listing {
            Listing::Bare(customers) => customers,
            Listing::Envelope { data } => data,
        })
    }
}

impl CustomerSource for JsonFileSource {
    async fn fetch_page(&self, filter: &CustomerFilter, page: PageRequest) -> Result<CustomerPage> {
        let customers = self.load().await?;
        debug!(
            "serving {}?{} from {} customers",
            self.path.display(),
            query_string(filter, page),
            customers.len()
        );

        Ok(select_page(customers, filter, page))
    }
}
