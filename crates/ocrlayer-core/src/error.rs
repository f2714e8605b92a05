// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ocrlayer.
//
// Only fatal conditions live here. Degenerate pages and missing resolution
// metadata are recovered locally and reported as warnings.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level error type for all ocrlayer operations.
#[derive(Debug, Error)]
pub enum OcrLayerError {
    // -- Input document --
    #[error("hOCR document is not well-formed: {0}")]
    DocumentParse(String),

    // -- Resources --
    #[error("cannot open {}: {reason}", path.display())]
    ResourceOpen { path: PathBuf, reason: String },

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OcrLayerError {
    /// Build a [`OcrLayerError::ResourceOpen`] for `path`.
    pub fn open(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::ResourceOpen {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OcrLayerError>;
