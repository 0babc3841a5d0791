//! Diagnostic rendering for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// note[O202]: dead mux port
///   = note: port 2/3 on pmux cell `m0`
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// Drop diagnostics below this severity.
    pub min_severity: Severity,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool, min_severity: Severity) -> Self {
        Self {
            color,
            min_severity,
        }
    }

    /// Renders all diagnostics at or above the minimum severity,
    /// one per line group, in emission order.
    pub fn render_all(&self, diags: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diag in diags {
            if diag.severity < self.min_severity {
                continue;
            }
            out.push_str(&self.render(diag));
        }
        out
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();

        // Header line: severity[CODE]: message
        if self.color {
            let color_code = match diag.severity {
                Severity::Error => "\x1b[31m",
                Severity::Warning => "\x1b[33m",
                Severity::Note => "\x1b[36m",
            };
            out.push_str(&format!(
                "{color_code}{}[{}]\x1b[0m: {}\n",
                diag.severity, diag.code, diag.message
            ));
        } else {
            out.push_str(&format!(
                "{}[{}]: {}\n",
                diag.severity, diag.code, diag.message
            ));
        }

        for note in &diag.notes {
            out.push_str(&format!("  = note: {note}\n"));
        }

        out
    }
}
