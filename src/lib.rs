//! # dcilint
//!
//! Static-analysis rule engine for DCI (Data, Context, Interaction)
//! architectural conventions.
//!
//! Given a token stream for a class tagged `@context`, dcilint builds a
//! typed semantic model (Context, Role, Method, Ref) in a single forward
//! scan, then runs a multi-pass checker that reports convention
//! violations with precise positions. A finalized Context can also be
//! projected into a node/edge JSON document for visualization.
//!
//! ## Quick start
//!
//! ```rust
//! use dcilint::Analyzer;
//!
//! let analyzer = Analyzer::new().unwrap();
//! let report = analyzer.analyze_source(r#"
//!     /** @context */
//!     final class MoneyTransfer {
//!         public function transfer($source, $destination, $amount) {
//!             $this->source = $source;
//!             $this->destination = $destination;
//!             $this->source_withdraw($amount);
//!         }
//!
//!         private $source;
//!
//!         protected function source_withdraw($amount) {
//!             $this->source->decreaseBalance($amount);
//!             $this->destination_deposit($amount);
//!         }
//!
//!         private $destination;
//!
//!         protected function destination_deposit($amount) {
//!             $this->destination->increaseBalance($amount);
//!         }
//!     }
//! "#).unwrap();
//!
//! assert_eq!(report.contexts.len(), 1);
//! assert!(!report.has_errors());
//! ```

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod lexer;
pub mod listing;
pub mod model;
pub mod rules;
pub mod token;

// Re-exports for convenience
pub use config::{Conventions, RuleConfig};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
pub use error::{DciError, Result};
pub use model::{Access, Context, ContractCall, Method, Ref, RefKind, Role};
pub use token::{Token, TokenKind, TokenStream};

use builder::ContextBuilder;

/// Outcome of analyzing one token stream: the finalized Contexts and
/// every diagnostic raised while building and checking them.
#[derive(Debug)]
pub struct AnalysisReport {
    pub contexts: Vec<Context>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// The main analyzer.
///
/// Owns the configuration and compiled naming conventions; each call to
/// [`analyze`](Self::analyze) runs the full pipeline: scan, check,
/// listings, and (when configured) export.
pub struct Analyzer {
    config: RuleConfig,
    conventions: Conventions,
}

impl Analyzer {
    /// Analyzer with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(RuleConfig::default())
    }

    /// Analyzer with the given configuration. Fails if the configured
    /// naming patterns do not compile.
    pub fn with_config(config: RuleConfig) -> Result<Self> {
        let conventions = Conventions::from_config(&config)?;
        Ok(Self {
            config,
            conventions,
        })
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Analyze a token stream supplied by a host lexer.
    pub fn analyze(&self, stream: &TokenStream) -> Result<AnalysisReport> {
        let mut sink = DiagnosticSink::new();
        let contexts = ContextBuilder::new(stream, &self.conventions).scan(&mut sink);

        for context in &contexts {
            rules::check(context, &mut sink);
            listing::list(context, &self.config, &mut sink);

            if let Some(dir) = &self.config.vis_data_dir {
                export::save(context, dir)?;
            }
        }

        Ok(AnalysisReport {
            contexts,
            diagnostics: sink.take(),
        })
    }

    /// Analyze raw source text through the bundled reference lexer.
    pub fn analyze_source(&self, source: &str) -> Result<AnalysisReport> {
        self.analyze(&lexer::lex(source))
    }
}
