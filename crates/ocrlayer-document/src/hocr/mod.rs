// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR module — annotation tree model and `title` attribute parsing.

pub mod title;
pub mod tree;

pub use title::{TitleAttributes, parse_title};
pub use tree::{AnnotationNode, HocrDocument};
