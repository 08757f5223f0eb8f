//! Config-gated introspection listings.
//!
//! Non-correctness output: call dumps and per-Role contract aggregation,
//! emitted as debug warnings through the normal diagnostic sink.

use std::collections::BTreeSet;

use crate::config::RuleConfig;
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::model::{Context, RefKind};

/// Emit the listings enabled in `config` for a finalized Context.
pub fn list(context: &Context, config: &RuleConfig, sink: &mut DiagnosticSink) {
    if let Some(name) = &config.list_calls_in_role_method {
        list_calls_in(context, name, sink);
    }
    if let Some(name) = &config.list_calls_to_role_method {
        list_calls_to(context, name, sink);
    }
    if config.list_role_interfaces {
        list_role_interfaces(context, sink);
    }
}

/// Outgoing RoleMethod calls of one method, sorted.
fn list_calls_in(context: &Context, method_name: &str, sink: &mut DiagnosticSink) {
    let Some(method) = context.method(method_name) else {
        return;
    };

    let calls: BTreeSet<&str> = method
        .refs()
        .iter()
        .filter(|r| r.kind() == RefKind::RoleMethod)
        .map(|r| r.to())
        .collect();

    let calls: Vec<&str> = calls.into_iter().collect();
    sink.warning(
        method.start(),
        DiagnosticCode::ListRoleMethodCalls,
        format!("\"{}\" calls to [{}]", method.full_name(), calls.join(", ")),
    );
}

/// Every call site to one RoleMethod, plus a final count at its
/// declaration.
fn list_calls_to(context: &Context, target_name: &str, sink: &mut DiagnosticSink) {
    let mut count = 0usize;

    for method in context.methods() {
        for r in method.refs() {
            if r.kind() == RefKind::RoleMethod && r.to() == target_name {
                sink.warning(
                    r.pos(),
                    DiagnosticCode::ListCallsToRoleMethod,
                    format!("\"{}\" calls \"{}\" here", method.full_name(), target_name),
                );
                count += 1;
            }
        }
    }

    if let Some(target) = context.method(target_name) {
        sink.warning(
            target.start(),
            DiagnosticCode::ListCallsToRoleMethod,
            format!("{} call(s) to \"{}\"", count, target_name),
        );
    }
}

/// Per Role, the distinct contract-call names observed across the whole
/// Context — an approximation of the interface its player must satisfy.
fn list_role_interfaces(context: &Context, sink: &mut DiagnosticSink) {
    for role in context.roles() {
        let mut names: BTreeSet<&str> = BTreeSet::new();

        for method in context.methods() {
            for r in method.refs() {
                if r.kind() == RefKind::Role && r.to() == role.name() {
                    if let Some(name) = r.contract_call().and_then(|c| c.name()) {
                        names.insert(name);
                    }
                }
            }
        }

        let names: Vec<&str> = names.into_iter().collect();
        sink.warning(
            role.pos(),
            DiagnosticCode::ListRoleInterface,
            format!("RoleInterface for {}: [{}]", role.name(), names.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContextBuilder;
    use crate::config::Conventions;
    use crate::lexer::lex;

    const SRC: &str = r#"
        /** @context */
        final class C {
            private $source;
            public function run($x) {
                $this->source = $x;
                $this->source_fetch();
                $this->source_fetch();
            }
            private function source_fetch() {
                $this->source->get();
                $this->source->sync();
            }
        }
    "#;

    fn listed(config: RuleConfig) -> Vec<(DiagnosticCode, String)> {
        let stream = lex(SRC);
        let conventions = Conventions::default();
        let mut sink = DiagnosticSink::new();
        let contexts = ContextBuilder::new(&stream, &conventions).scan(&mut sink);
        sink.take();
        list(&contexts[0], &config, &mut sink);
        sink.take()
            .into_iter()
            .map(|d| (d.code, d.message))
            .collect()
    }

    #[test]
    fn test_calls_to_dump_and_count() {
        let config = RuleConfig {
            list_calls_to_role_method: Some("source_fetch".to_string()),
            ..Default::default()
        };
        let out = listed(config);
        assert_eq!(out.len(), 3);
        assert!(out[0].1.contains("\"run\" calls \"source_fetch\" here"));
        assert_eq!(out[2].1, "2 call(s) to \"source_fetch\"");
    }

    #[test]
    fn test_role_interface_aggregation() {
        let config = RuleConfig {
            list_role_interfaces: true,
            ..Default::default()
        };
        let out = listed(config);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, "RoleInterface for source: [get, sync]");
    }

    #[test]
    fn test_calls_in_dump_is_sorted_and_distinct() {
        let config = RuleConfig {
            list_calls_in_role_method: Some("run".to_string()),
            ..Default::default()
        };
        let out = listed(config);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, "\"run\" calls to [source_fetch]");
    }
}
