//! Schema sampling and summarization.
//!
//! The sampler takes a bounded prefix of already-fetched records and hands it
//! to a [`Summarizer`] for a prose description of the set's schema. It never
//! reads from the cluster.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::DisplayRecord;
use crate::normalize::renormalize_record;

/// Default number of records sent for summarization.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Returned instead of a summary when there is nothing to sample.
pub const EMPTY_SET_MESSAGE: &str = "This set appears to be empty. No schema could be generated.";

/// Produces a natural-language description of a record sample.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Describes the schema of `sample`, taken from set `set_name`.
    ///
    /// The returned text may contain line breaks.
    async fn summarize(&self, sample: &[DisplayRecord], set_name: &str) -> Result<String>;
}

/// Draws record samples and forwards them to a summarizer.
#[derive(Clone)]
pub struct SchemaSampler {
    summarizer: Option<Arc<dyn Summarizer>>,
    sample_size: usize,
}

impl SchemaSampler {
    /// Creates a sampler. With no summarizer, summaries fail with
    /// [`Error::SummarizationUnavailable`].
    pub fn new(summarizer: Option<Arc<dyn Summarizer>>, sample_size: usize) -> Self {
        Self {
            summarizer,
            sample_size: sample_size.max(1),
        }
    }

    /// Summarizes a sample of `records` from `set_name`.
    ///
    /// The sample is the first `sample_size` records. An empty sample yields
    /// [`EMPTY_SET_MESSAGE`] without calling the summarizer.
    #[tracing::instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub async fn summarize(&self, records: &[DisplayRecord], set_name: &str) -> Result<String> {
        let sample: Vec<DisplayRecord> = sample(records, self.sample_size)
            .iter()
            .map(renormalize_record)
            .collect();
        if sample.is_empty() {
            return Ok(EMPTY_SET_MESSAGE.to_string());
        }

        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or(Error::SummarizationUnavailable)?;
        summarizer
            .summarize(&sample, set_name)
            .await
            .map_err(|e| match e {
                e @ (Error::SummarizationFailed(_) | Error::SummarizationUnavailable) => e,
                other => Error::SummarizationFailed(other.to_string()),
            })
    }
}

/// Returns the first `max` records.
pub fn sample<T>(records: &[T], max: usize) -> &[T] {
    &records[..records.len().min(max)]
}
