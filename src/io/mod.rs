// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - scene parsing, importing, and STL export

mod importer;
mod parser;
pub mod stl;

pub use importer::import_scene_file;
pub use parser::parse_scene;
pub use stl::{export_stl, export_stl_ascii, load_stl, write_stl, write_stl_ascii};
