// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Signed distance fields
//!
//! A field is a tree of [`NodeKind`] values behind shared pointers. Leaves are
//! primitives or user [`Field`]s; inner nodes are booleans, transforms and
//! modifiers. Evaluation dispatches once per node.

mod node;
mod eval;
pub mod ops;

pub use node::{BooleanOp, Field, ModifierOp, NodeKind, Sdf, TransformOp};
