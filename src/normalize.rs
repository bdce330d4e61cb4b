//! Merging of several parsed batches into one dataset.
//!
//! Records keep their parse order (upload order, then document order) and
//! are tagged with the [`BatchId`] of the upload they came from. A batch
//! that failed to parse is reported next to the successful ones instead of
//! aborting the whole upload.

use crate::dialect::{parse_batch, Dialect, ParsedBatch};
use crate::error::{Error, Result};
use crate::types::{BatchId, TransferRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// One uploaded file as handed over by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    /// Name shown to the user, used in error reports.
    pub file_name: String,
    /// Raw document bytes.
    pub content: Vec<u8>,
}

impl Upload {
    /// Upload of `content` named `file_name`.
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Metadata of a successfully merged batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub id: BatchId,
    pub file_name: String,
    pub dialect: Dialect,
    pub originator: String,
    pub record_count: usize,
}

/// A batch that could not be merged, with its file context.
#[derive(Debug, ThisError)]
#[error("{file_name}: {error}")]
pub struct BatchFailure {
    /// Position of the file in the upload order.
    pub upload_index: usize,
    pub file_name: String,
    #[source]
    pub error: Error,
}

/// Union of every successfully parsed batch.
#[derive(Debug, Default)]
pub struct MergedDataset {
    /// Records in upload order, then document order.
    pub records: Vec<TransferRecord>,
    /// Distinct originator names in first-seen order.
    pub originators: Vec<String>,
    /// Successfully merged batches in upload order.
    pub batches: Vec<BatchInfo>,
    /// Batches that failed, in upload order.
    pub failures: Vec<BatchFailure>,
}

impl MergedDataset {
    /// True when no upload failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Originator of batch `id`.
    pub fn originator_of(&self, id: BatchId) -> Option<&str> {
        self.batches
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.originator.as_str())
    }

    /// Records of batch `id`, in document order.
    pub fn batch_records(&self, id: BatchId) -> impl Iterator<Item = &TransferRecord> + '_ {
        self.records.iter().filter(move |r| r.batch == Some(id))
    }

    /// Fail with the first per-file error, for callers that refuse partial data.
    pub fn into_complete(self) -> Result<Self> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(Self {
                failures: Vec::new(),
                ..self
            }),
        }
    }
}

/// Merge per-file parse results given in upload order.
pub fn normalize<I, S>(results: I) -> MergedDataset
where
    I: IntoIterator<Item = (S, Result<ParsedBatch>)>,
    S: Into<String>,
{
    let mut dataset = MergedDataset::default();

    for (upload_index, (file_name, result)) in results.into_iter().enumerate() {
        let file_name = file_name.into();

        let batch = match result {
            Ok(batch) => batch,
            Err(error) => {
                tracing::warn!("Skipping batch '{}': {}", file_name, error);
                dataset.failures.push(BatchFailure {
                    upload_index,
                    file_name,
                    error,
                });
                continue;
            }
        };

        let id = BatchId(upload_index);
        if !dataset.originators.contains(&batch.originator) {
            dataset.originators.push(batch.originator.clone());
        }

        dataset.batches.push(BatchInfo {
            id,
            file_name,
            dialect: batch.dialect,
            originator: batch.originator.clone(),
            record_count: batch.records.len(),
        });

        dataset
            .records
            .extend(batch.records.into_iter().map(|record| TransferRecord {
                originator_name: batch.originator.clone(),
                batch: Some(id),
                ..record
            }));
    }

    tracing::info!(
        "Merged {} records from {} batches ({} failed)",
        dataset.records.len(),
        dataset.batches.len(),
        dataset.failures.len()
    );

    dataset
}

/// Parse every upload with dialect sniffing and merge the results.
pub fn ingest(uploads: &[Upload]) -> MergedDataset {
    normalize(
        uploads
            .iter()
            .map(|upload| (upload.file_name.clone(), parse_batch(&upload.content, None))),
    )
}
