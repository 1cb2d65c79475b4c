// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for field construction, sampling and export

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors raised by the library
#[derive(Debug, Error)]
pub enum SdfError {
    /// A constructor received a parameter outside its valid domain
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A transform would collapse space (zero axis, zero scale, ...)
    #[error("degenerate transform: {0}")]
    DegenerateTransform(&'static str),

    /// Sampling region or step is empty or not finite
    #[error("invalid sampling bounds: {0}")]
    InvalidBounds(String),

    /// Reading or writing a mesh file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SdfError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reject non-finite or non-positive values
pub(crate) fn require_positive(name: &'static str, value: f64) -> SdfResult<f64> {
    if !value.is_finite() {
        return Err(SdfError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    if value <= 0.0 {
        return Err(SdfError::InvalidParameter {
            name,
            value,
            reason: "must be positive",
        });
    }
    Ok(value)
}

/// Reject non-finite or negative values
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> SdfResult<f64> {
    if !value.is_finite() {
        return Err(SdfError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    if value < 0.0 {
        return Err(SdfError::InvalidParameter {
            name,
            value,
            reason: "must not be negative",
        });
    }
    Ok(value)
}

/// Reject non-finite values
pub(crate) fn require_finite(name: &'static str, value: f64) -> SdfResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SdfError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        })
    }
}
