//! Core utilities for Strawberry.
//!
//! This crate provides foundational types shared by the other crates:
//! - `span`: Byte-offset source spans
//! - `text`: String interning for names
//! - `diagnostics`: Error reporting
//! - `location`: Line/column lookup for spans

pub mod diagnostics;
pub mod location;
pub mod span;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use location::{LineIndex, Location};
pub use span::Span;
pub use text::{Interner, Text};
