//! Convention checks over a finalized Context.
//!
//! Read-only multi-pass checker. Every check degrades on malformed input
//! by excluding the offending edge and reporting why; nothing here
//! mutates the model or aborts the run.

use std::collections::HashSet;

use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::model::{Access, Context, RefKind};

/// Run all convention checks, emitting diagnostics into `sink`.
pub fn check(context: &Context, sink: &mut DiagnosticSink) {
    check_role_method_positions(context, sink);
    check_bindings_and_access(context, sink);
}

/// Roles are ordered by declaration position; every attached method must
/// start inside its Role's zone `[role.pos, next_role.pos)`. The last
/// zone is unbounded.
fn check_role_method_positions(context: &Context, sink: &mut DiagnosticSink) {
    let mut roles: Vec<_> = context.roles().iter().collect();
    roles.sort_by_key(|r| r.pos());

    for (index, role) in roles.iter().enumerate() {
        let zone_start = role.pos();
        let zone_end = roles.get(index + 1).map_or(usize::MAX, |next| next.pos());

        for (_, full_name) in role.methods() {
            let Some(method) = context.method(full_name) else {
                continue;
            };
            if method.start() < zone_start || method.start() >= zone_end {
                sink.error(
                    method.start(),
                    DiagnosticCode::RoleMethodPosition,
                    format!(
                        "RoleMethod \"{}\" must be positioned below its Role.",
                        method.full_name()
                    ),
                );
            }
        }
    }
}

/// Single walk over methods in declaration order, covering:
/// role binding sites, role access control, RoleMethod access control,
/// role leakage, and RoleMethod liveness.
fn check_bindings_and_access(context: &Context, sink: &mut DiagnosticSink) {
    let role_count = context.roles().len();

    // Position of the unique full-binding method, once found.
    let mut binding_pos: Option<usize> = None;
    // Call sites that need an AdjustRoleMethodAccess companion, emitted
    // after the walk so call-site diagnostics come first.
    let mut accessed_outside: Vec<String> = Vec::new();
    // RoleMethods hit by at least one RoleMethod ref.
    let mut referenced: HashSet<&str> = HashSet::new();

    for method in context.methods() {
        // Distinct roles assigned in this method; last ref per role wins.
        let mut assigned: Vec<(&str, usize)> = Vec::new();

        for r in method.refs() {
            match r.kind() {
                RefKind::RoleAssignment => {
                    if !context.has_role(r.to()) {
                        continue;
                    }
                    match assigned.iter_mut().find(|(name, _)| *name == r.to()) {
                        Some(entry) => entry.1 = r.pos(),
                        None => assigned.push((r.to(), r.pos())),
                    }
                }
                RefKind::Role => {
                    // Candidates that never became a declared Role are
                    // plain property accesses; exclude the edge.
                    if !context.has_role(r.to()) {
                        continue;
                    }
                    let own = method.role() == Some(r.to());
                    if !own && !r.excepted() {
                        sink.error(
                            r.pos(),
                            DiagnosticCode::RoleAccessedOutsideItsMethods,
                            format!("Role \"{}\" accessed outside its RoleMethods here.", r.to()),
                        );
                    }
                    if r.returned() && r.contract_call().is_none() {
                        sink.warning(
                            r.pos(),
                            DiagnosticCode::RoleLeaking,
                            format!(
                                "Role \"{}\" must not be returned, it leaks the Role player.",
                                r.to()
                            ),
                        );
                    }
                }
                RefKind::RoleMethod => {
                    referenced.insert(r.to());

                    // A dangling target (no such method, or its Role never
                    // resolved) is excluded; the missing Role was already
                    // reported at finalization.
                    let Some(target) = context.method(r.to()) else {
                        continue;
                    };
                    if target.role().is_none() {
                        continue;
                    }

                    if method.role() != target.role()
                        && target.access() == Access::Private
                        && !r.excepted()
                    {
                        sink.error(
                            r.pos(),
                            DiagnosticCode::InvalidRoleMethodAccess,
                            format!(
                                "Private RoleMethod \"{}\" accessed outside its own RoleMethods here.",
                                target.full_name()
                            ),
                        );
                        accessed_outside.push(target.full_name().to_string());
                    }
                }
                RefKind::Method => {}
                // Property refs are dropped at construction.
                RefKind::Property => debug_assert!(false, "stored Property ref"),
            }
        }

        if assigned.is_empty() {
            continue;
        }

        if let Some(original) = binding_pos {
            // Roles are already bound elsewhere: every assignment here is
            // an error, each with a companion pointing at the original.
            for (_, pos) in &assigned {
                sink.error(
                    *pos,
                    DiagnosticCode::RoleNotBoundInSingleMethod,
                    "All Roles must be bound inside a single method.",
                );
                sink.error(
                    original,
                    DiagnosticCode::RoleNotBoundInSingleMethod,
                    "Method where Roles are currently bound.",
                );
            }
        } else if assigned.len() < role_count {
            let bound: HashSet<&str> = assigned.iter().map(|(name, _)| *name).collect();
            let missing: Vec<&str> = context
                .roles()
                .iter()
                .map(|r| r.name())
                .filter(|name| !bound.contains(name))
                .collect();
            sink.error(
                method.start(),
                DiagnosticCode::RolesNotBoundInSingleMethod,
                format!(
                    "All Roles must be bound inside a single method. Missing: {}",
                    missing.join(", ")
                ),
            );
        } else {
            binding_pos = Some(method.start());
        }
    }

    for full_name in &accessed_outside {
        if let Some(target) = context.method(full_name) {
            sink.error(
                target.start(),
                DiagnosticCode::AdjustRoleMethodAccess,
                format!(
                    "Private RoleMethod \"{}\" accessed outside its own RoleMethods. Make it protected if this is intended.",
                    target.full_name()
                ),
            );
        }
    }

    for method in context.methods() {
        if method.role().is_some() && !referenced.contains(method.full_name()) {
            sink.warning(
                method.start(),
                DiagnosticCode::UnreferencedRoleMethod,
                format!("Unreferenced RoleMethod \"{}\".", method.full_name()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Conventions;
    use crate::builder::ContextBuilder;
    use crate::lexer::lex;
    use crate::diagnostics::Diagnostic;

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let stream = lex(source);
        let conventions = Conventions::default();
        let mut sink = DiagnosticSink::new();
        for context in ContextBuilder::new(&stream, &conventions).scan(&mut sink) {
            check(&context, &mut sink);
        }
        sink.take()
    }

    fn codes(diags: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diags.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_role_method_position_zone() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                private function source_fetch() { $this->source->get(); }
                private $destination;
                private function source_misplaced() { $this->source->touch(); }
                private function destination_store() { $this->destination->keep(1); }
                public function run($x) {
                    $this->source = $x;
                    $this->destination = $x;
                }
            }
        "#;
        let diags = analyze(src);
        // source_fetch sits in source's zone; source_misplaced is past the
        // destination declaration, outside its Role's zone. The last zone
        // is unbounded, so destination_store passes.
        let positions: Vec<_> = diags
            .iter()
            .filter(|d| d.code == DiagnosticCode::RoleMethodPosition)
            .collect();
        assert_eq!(positions.len(), 1);
        assert!(positions[0].message.contains("source_misplaced"));
    }

    #[test]
    fn test_partial_binding_lists_missing_roles() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                private $destination;
                public function bind($x) {
                    $this->source = $x;
                }
            }
        "#;
        let diags = analyze(src);
        let binding: Vec<_> = diags
            .iter()
            .filter(|d| d.code == DiagnosticCode::RolesNotBoundInSingleMethod)
            .collect();
        assert_eq!(binding.len(), 1);
        assert!(binding[0].message.contains("Missing: destination"));
    }

    #[test]
    fn test_assignment_to_non_role_does_not_count() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function bind($x) {
                    $this->source = $x;
                    $this->unknown = $x;
                }
            }
        "#;
        let diags = analyze(src);
        // One role, one valid assignment: complete binding, no errors.
        assert!(
            !codes(&diags).contains(&DiagnosticCode::RolesNotBoundInSingleMethod),
            "{:?}",
            diags
        );
    }

    #[test]
    fn test_role_accessed_outside_its_methods() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function run($x) {
                    $this->source = $x;
                    $this->source->poke();
                }
            }
        "#;
        let diags = analyze(src);
        assert!(codes(&diags).contains(&DiagnosticCode::RoleAccessedOutsideItsMethods));
    }

    #[test]
    fn test_excepted_ref_suppresses_access_error() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function run($x) {
                    $this->source = $x;
                    @$this->source->poke();
                }
            }
        "#;
        let diags = analyze(src);
        assert!(!codes(&diags).contains(&DiagnosticCode::RoleAccessedOutsideItsMethods));
    }

    #[test]
    fn test_unreferenced_role_method_warns_once() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function bind($x) { $this->source = $x; }
                private function source_idle() { $this->source->wait(); }
            }
        "#;
        let diags = analyze(src);
        let unref: Vec<_> = diags
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnreferencedRoleMethod)
            .collect();
        assert_eq!(unref.len(), 1);
        assert!(unref[0].message.contains("source_idle"));
    }

    #[test]
    fn test_role_leak_warns() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function bind($x) { $this->source = $x; }
                private function source_player() {
                    return $this->source;
                }
            }
        "#;
        let diags = analyze(src);
        assert!(codes(&diags).contains(&DiagnosticCode::RoleLeaking));
    }
}
