#![cfg(feature = "web")]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::multipart::MultipartError;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};

use crate::codec::{self, CodecError, SpreadsheetDocument};
use crate::error::DashboardError;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The picker was closed without choosing a file.
    #[error("no file selected")]
    EmptyFileSelection,

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A newer import was started before this one finished.
    #[error("import superseded by a newer selection")]
    Cancelled,

    #[error("import worker failed: {0}")]
    Worker(String),

    /// The upload body broke off or was not valid multipart.
    #[error("upload could not be read: {0}")]
    Upload(#[from] MultipartError),
}

impl From<ImportError> for DashboardError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::EmptyFileSelection => DashboardError::EmptyFileSelection,
            ImportError::Codec(e) => DashboardError::Codec(e),
            ImportError::Cancelled => DashboardError::ImportCancelled,
            ImportError::Worker(msg) => DashboardError::ImportFailed(msg),
            ImportError::Upload(e) => DashboardError::UploadFailed(e.to_string()),
        }
    }
}

/// Starts spreadsheet imports for one upload control.
///
/// Each selection becomes a single-shot task. Starting a new one aborts the
/// import still in flight, and that older handle resolves to
/// [`ImportError::Cancelled`].
#[derive(Debug, Default)]
pub struct Importer {
    generation: Arc<AtomicU64>,
    in_flight: Option<AbortHandle>,
}

/// A started import; await [`ImportHandle::finish`] for the decoded workbook.
#[derive(Debug)]
pub struct ImportHandle {
    generation: u64,
    latest: Arc<AtomicU64>,
    task: JoinHandle<Result<SpreadsheetDocument, ImportError>>,
}

impl Importer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently started import, `0` before the first.
    pub fn latest(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Begins decoding `file`. `None` or an empty buffer means nothing was
    /// chosen.
    pub fn start(&mut self, file: Option<Vec<u8>>) -> Result<ImportHandle, ImportError> {
        let bytes = match file {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(ImportError::EmptyFileSelection),
        };

        if let Some(previous) = self.in_flight.take() {
            log::debug!("aborting previous import");
            previous.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let task = tokio::spawn(async move {
            tokio::task::spawn_blocking(move || codec::decode(&bytes))
                .await
                .map_err(|e| ImportError::Worker(e.to_string()))?
                .map_err(ImportError::from)
        });
        self.in_flight = Some(task.abort_handle());

        Ok(ImportHandle {
            generation,
            latest: Arc::clone(&self.generation),
            task,
        })
    }
}

impl ImportHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn finish(self) -> Result<SpreadsheetDocument, ImportError> {
        let result = match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => return Err(ImportError::Cancelled),
            Err(e) => return Err(ImportError::Worker(e.to_string())),
        };

        // The blocking decode cannot be interrupted, so a superseded import
        // may still complete. Its result is dropped.
        if self.latest.load(Ordering::SeqCst) != self.generation {
            return Err(ImportError::Cancelled);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DEFAULT_SHEET_NAME, encode, sample_grid};

    fn workbook() -> Vec<u8> {
        encode(&sample_grid(), DEFAULT_SHEET_NAME).unwrap()
    }

    #[tokio::test]
    async fn imports_a_workbook() {
        let mut importer = Importer::new();
        let doc = importer.start(Some(workbook())).unwrap().finish().await.unwrap();
        assert_eq!(doc.records().len(), 2);
    }

    #[tokio::test]
    async fn nothing_selected_is_reported() {
        let mut importer = Importer::new();
        assert!(matches!(
            importer.start(None),
            Err(ImportError::EmptyFileSelection)
        ));
        assert!(matches!(
            importer.start(Some(Vec::new())),
            Err(ImportError::EmptyFileSelection)
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_a_codec_error() {
        let mut importer = Importer::new();
        let err = importer
            .start(Some(b"not a workbook".to_vec()))
            .unwrap()
            .finish()
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Codec(CodecError::Decode(_))));
    }

    #[tokio::test]
    async fn newer_selection_cancels_the_older_one() {
        let mut importer = Importer::new();
        let first = importer.start(Some(workbook())).unwrap();
        let second = importer.start(Some(workbook())).unwrap();

        assert!(matches!(first.finish().await, Err(ImportError::Cancelled)));
        assert!(second.finish().await.is_ok());
    }

    #[tokio::test]
    async fn separate_importers_do_not_cancel_each_other() {
        let mut left = Importer::new();
        let mut right = Importer::new();
        let a = left.start(Some(workbook())).unwrap();
        let b = right.start(Some(workbook())).unwrap();

        assert!(a.finish().await.is_ok());
        assert!(b.finish().await.is_ok());
    }

    #[tokio::test]
    async fn latest_tracks_started_imports() {
        let mut importer = Importer::new();
        assert_eq!(importer.latest(), 0);
        let handle = importer.start(Some(workbook())).unwrap();
        assert_eq!(handle.generation(), importer.latest());
        let _ = importer.start(None);
        assert_eq!(importer.latest(), 1);
    }
}
