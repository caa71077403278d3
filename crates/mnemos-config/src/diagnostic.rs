// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration errors.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error rendered as a miette diagnostic.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ConfigError {
    /// Figment failed to parse or merge the configuration sources.
    #[error("configuration parse error: {message}")]
    #[diagnostic(
        code(mnemos::config::parse),
        help("check mnemos.toml for unknown keys or type mismatches")
    )]
    Parse {
        /// The underlying figment error text.
        message: String,
    },

    /// A value parsed but failed semantic validation.
    #[error("{message}")]
    #[diagnostic(code(mnemos::config::validation))]
    Validation {
        /// Description of the violated constraint.
        message: String,
    },
}

/// Render a batch of configuration errors to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
}
