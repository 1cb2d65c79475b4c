// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene file importer

use crate::field::Sdf;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a scene file and parse it into a field
pub fn import_scene_file(path: impl AsRef<Path>) -> Result<Sdf> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

    super::parse_scene(&source)
        .with_context(|| format!("Failed to parse scene file: {}", path.display()))
}
