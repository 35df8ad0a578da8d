//! Display formatting for CLI output
//!
//! Diagnostics go to stderr so that stdout only ever carries the command
//! result (YAML, JSON or type names).

use console::style;

use crdform_core::{Diagnostic, Diagnostics, Severity};

use crate::error::{CliError, Result};

fn print_diagnostic(diagnostic: &Diagnostic) {
    let icon = match diagnostic.severity {
        Severity::Error => style("✗").red(),
        Severity::Warning => style("⚠").yellow(),
    };

    let path_display = match &diagnostic.path {
        Some(path) => format!(" at {}", style(path).dim()),
        None => String::new(),
    };

    eprintln!("  {} {}{}", icon, style(&diagnostic.summary).bold(), path_display);
    if !diagnostic.detail.is_empty() {
        eprintln!("    {}", diagnostic.detail);
    }
}

/// Print every diagnostic
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        print_diagnostic(diagnostic);
    }
}

/// Print diagnostics and fail when any of them is an error
pub fn check(operation: &str, diagnostics: &Diagnostics) -> Result<()> {
    print_diagnostics(diagnostics);

    let errors = diagnostics.errors().count();
    if errors > 0 {
        return Err(CliError::operation_failed(
            operation,
            errors,
            diagnostics.warnings().count(),
        ));
    }
    Ok(())
}

/// Format count with proper pluralization
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
