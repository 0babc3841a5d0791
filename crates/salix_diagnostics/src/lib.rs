//! Diagnostic creation, severity management, and rendering.
//!
//! This crate provides structured [`Diagnostic`] messages with severity
//! levels and codes. The thread-safe [`DiagnosticSink`] accumulates
//! diagnostics while passes run, and [`TerminalRenderer`] formats them for
//! output. Optimization passes report their progress (roots found, dead
//! ports, substitutions) as Note-severity diagnostics rather than through
//! a separate logging channel.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
