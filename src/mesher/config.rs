// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh generation configuration

use crate::error::{SdfError, SdfResult};
use crate::geometry::BoundingBox;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file read by [`MeshConfig::load`]
pub const CONFIG_FILE: &str = "sdfkit.toml";

/// Default sample budget when neither step nor bounds pin the resolution
pub const DEFAULT_SAMPLES: usize = 1 << 22;

/// Step used when no other source provides one
pub const DEFAULT_STEP: f64 = 0.1;

/// Options controlling sampling and surface extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Grid spacing; derived from `samples` when unset
    pub step: Option<f64>,
    /// Target number of grid points when `step` is unset
    pub samples: usize,
    /// Worker threads, 0 for the rayon default
    pub workers: usize,
    /// Edge length of a sampling block, in grid points
    pub chunk_size: usize,
    /// Skip blocks that the field proves are far from the surface
    pub sparse: bool,
    /// Hard cap on grid points; the step grows to stay below it
    pub max_samples: usize,
    /// Field value treated as the surface
    pub iso_level: f64,
    /// Log progress at info level instead of debug
    pub verbose: bool,
    /// Sampling region; taken from the field's bounds hint when unset
    pub bounds: Option<BoundingBox>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            step: None,
            samples: DEFAULT_SAMPLES,
            workers: 0,
            chunk_size: 32,
            sparse: true,
            max_samples: 1 << 26,
            iso_level: 0.0,
            verbose: false,
            bounds: None,
        }
    }
}

impl MeshConfig {
    /// Config with an explicit step and everything else default
    pub fn with_step(step: f64) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    pub fn bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Reject settings that cannot describe a grid
    pub fn validate(&self) -> SdfResult<()> {
        if let Some(step) = self.step {
            if !step.is_finite() || step <= 0.0 {
                return Err(SdfError::InvalidBounds(format!(
                    "step must be positive and finite, got {}",
                    step
                )));
            }
        }
        if let Some(bounds) = &self.bounds {
            let size = bounds.size();
            if !bounds.is_finite() || size.iter().any(|s| *s <= 0.0) {
                return Err(SdfError::InvalidBounds(format!(
                    "bounds must be finite with positive extent, got {:?} to {:?}",
                    bounds.min, bounds.max
                )));
            }
        }
        if self.chunk_size == 0 {
            return Err(SdfError::InvalidBounds("chunk_size must be at least 1".into()));
        }
        if self.samples == 0 || self.max_samples < 8 {
            return Err(SdfError::InvalidBounds(
                "sample budget must allow at least one cell".into(),
            ));
        }
        if !self.iso_level.is_finite() {
            return Err(SdfError::InvalidBounds("iso_level must be finite".into()));
        }
        Ok(())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: MeshConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `sdfkit.toml` if present, then apply environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `SDFKIT_*` overrides from a key lookup; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(step) = lookup("SDFKIT_STEP").and_then(|v| v.parse().ok()) {
            self.step = Some(step);
        }
        if let Some(samples) = lookup("SDFKIT_SAMPLES").and_then(|v| v.parse().ok()) {
            self.samples = samples;
        }
        if let Some(workers) = lookup("SDFKIT_WORKERS").and_then(|v| v.parse().ok()) {
            self.workers = workers;
        }
        if let Some(sparse) = lookup("SDFKIT_SPARSE").and_then(|v| v.parse().ok()) {
            self.sparse = sparse;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
