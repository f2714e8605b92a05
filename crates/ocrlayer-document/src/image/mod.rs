// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoded page images and their physical resolution.

pub mod metadata;
pub mod source;

pub use metadata::detect_resolution;
pub use source::{ImageGeometry, ImageSource};
