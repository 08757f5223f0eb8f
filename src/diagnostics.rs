//! Diagnostic sink — the only channel for convention violations.
//!
//! Checks never abort analysis; they report here and degrade.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Canonical diagnostic codes.
///
/// The `List*` codes are debug-only warnings emitted by the config-gated
/// listing pass; everything else is a convention check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    ContextNotFinal,
    RoleNotPrivate,
    PublicRoleMethod,
    RoleMethodPosition,
    RolesNotBoundInSingleMethod,
    RoleNotBoundInSingleMethod,
    RoleAccessedOutsideItsMethods,
    InvalidRoleMethodAccess,
    AdjustRoleMethodAccess,
    NonExistingRole,
    UnreferencedRoleMethod,
    RoleLeaking,
    ListRoleMethodCalls,
    ListCallsToRoleMethod,
    ListRoleInterface,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One reported violation: code, severity, token position, message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Token position in the analyzed stream.
    pub pos: usize,
    pub message: String,
}

/// Collects diagnostics during a scan and the check passes.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, pos: usize, code: DiagnosticCode, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            code,
            severity: Severity::Error,
            pos,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, pos: usize, code: DiagnosticCode, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            code,
            severity: Severity::Warning,
            pos,
            message: message.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Drain all collected diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_counts() {
        let mut sink = DiagnosticSink::new();
        sink.error(3, DiagnosticCode::RoleNotPrivate, "Role \"x\" must be private.");
        sink.warning(7, DiagnosticCode::RoleLeaking, "Role \"x\" leaks.");

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);

        let drained = sink.take();
        assert_eq!(drained.len(), 2);
        assert!(sink.is_empty());
    }
}
