//! Context exporter — projection into a renderable node/edge document.
//!
//! Pure and read-only: no diagnostics, no mutation. The document is what
//! a visualization front end consumes; layout is its problem, not ours.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::model::{Access, Context, ContractCall, RefKind};

/// Group name for methods that belong to no Role.
pub const CONTEXT_GROUP: &str = "__CONTEXT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
}

/// The exported document: `{ "nodes": [...], "edges": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisDocument {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

/// Project a finalized Context into its vis document.
///
/// Nodes are methods that belong to a Role or retain at least one
/// non-assignment ref, plus one synthetic role-interface node per
/// distinct (role, contract call) pair. Edges follow Method/RoleMethod
/// refs directly and Role refs through their interface node.
pub fn project(context: &Context) -> VisDocument {
    let mut doc = VisDocument::default();

    for method in context.methods() {
        match method.role() {
            Some(role_name) => {
                let local = context
                    .role(role_name)
                    .and_then(|role| {
                        role.methods()
                            .iter()
                            .find(|(_, full)| full == method.full_name())
                            .map(|(local, _)| local.clone())
                    })
                    .unwrap_or_else(|| method.full_name().to_string());

                // Private RoleMethods render italic.
                let label = if method.access() == Access::Private {
                    format!("<i>{}</i>\n<i>{}</i>", role_name, local)
                } else {
                    format!("{}\n{}", role_name, local)
                };

                doc.nodes.push(VisNode {
                    id: method.full_name().to_string(),
                    label,
                    group: role_name.to_string(),
                });
            }
            None => {
                let has_edges = method.refs().iter().any(|r| match r.kind() {
                    RefKind::Method | RefKind::RoleMethod => true,
                    RefKind::Role => context.has_role(r.to()),
                    _ => false,
                });
                if has_edges {
                    doc.nodes.push(VisNode {
                        id: method.full_name().to_string(),
                        label: method.full_name().to_string(),
                        group: CONTEXT_GROUP.to_string(),
                    });
                }
            }
        }
    }

    for method in context.methods() {
        for r in method.refs() {
            match r.kind() {
                RefKind::Method | RefKind::RoleMethod => {
                    doc.edges.push(VisEdge {
                        from: method.full_name().to_string(),
                        to: r.to().to_string(),
                    });
                }
                RefKind::Role => {
                    if !context.has_role(r.to()) {
                        continue;
                    }
                    let Some(call) = r.contract_call() else {
                        continue;
                    };
                    let id = interface_id(r.to(), call);
                    if !doc.nodes.iter().any(|n| n.id == id) {
                        doc.nodes.push(VisNode {
                            id: id.clone(),
                            label: interface_label(r.to(), call),
                            group: r.to().to_string(),
                        });
                    }
                    doc.edges.push(VisEdge {
                        from: method.full_name().to_string(),
                        to: id,
                    });
                }
                _ => {}
            }
        }
    }

    doc
}

/// Id of the synthetic role-interface node for a contract call.
pub fn interface_id(role: &str, call: &ContractCall) -> String {
    match call.name() {
        Some(name) => format!("{}_{}_RI", role, name),
        None => format!("{}_RI", role),
    }
}

fn interface_label(role: &str, call: &ContractCall) -> String {
    match call.name() {
        Some(name) => name.to_string(),
        None => format!("{}[]", role),
    }
}

/// Write the document for `context` into `dir`, overwriting any previous
/// run. The filename derives from the Context name.
pub fn save(context: &Context, dir: &Path) -> Result<PathBuf> {
    let doc = project(context);

    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let path = dir.join(format!("{}.json", context.name()));
    fs::write(&path, serde_json::to_string_pretty(&doc)?)?;

    info!(context = %context.name(), path = %path.display(), "vis document written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ContextBuilder;
    use crate::config::Conventions;
    use crate::diagnostics::DiagnosticSink;
    use crate::lexer::lex;

    fn context(source: &str) -> Context {
        let stream = lex(source);
        let conventions = Conventions::default();
        let mut sink = DiagnosticSink::new();
        ContextBuilder::new(&stream, &conventions)
            .scan(&mut sink)
            .remove(0)
    }

    const SRC: &str = r#"
        /** @context */
        final class MoneyTransfer {
            private $source;
            public function run($x) {
                $this->source = $x;
                $this->source_fetch();
            }
            private function source_fetch() {
                $this->source->get();
                $this->source[0];
            }
        }
    "#;

    #[test]
    fn test_projection_nodes_and_groups() {
        let doc = project(&context(SRC));

        let run = doc.nodes.iter().find(|n| n.id == "run").unwrap();
        assert_eq!(run.group, CONTEXT_GROUP);

        let fetch = doc.nodes.iter().find(|n| n.id == "source_fetch").unwrap();
        assert_eq!(fetch.group, "source");
        assert_eq!(fetch.label, "<i>source</i>\n<i>fetch</i>");

        // One interface node per distinct contract call, array included.
        assert!(doc.nodes.iter().any(|n| n.id == "source_get_RI"));
        let array = doc.nodes.iter().find(|n| n.id == "source_RI").unwrap();
        assert_eq!(array.label, "source[]");
    }

    #[test]
    fn test_projection_edges() {
        let doc = project(&context(SRC));

        assert!(doc.edges.contains(&VisEdge {
            from: "run".to_string(),
            to: "source_fetch".to_string()
        }));
        assert!(doc.edges.contains(&VisEdge {
            from: "source_fetch".to_string(),
            to: "source_get_RI".to_string()
        }));
        // The binding assignment produces no edge.
        assert_eq!(doc.edges.len(), 3);
    }

    #[test]
    fn test_method_without_refs_or_role_is_omitted() {
        let src = r#"
            /** @context */
            final class C {
                private $source;
                public function bind($x) { $this->source = $x; }
                public function idle() {}
            }
        "#;
        let doc = project(&context(src));
        assert!(doc.nodes.iter().all(|n| n.id != "idle"));
        // bind only assigns, so it has no renderable refs either.
        assert!(doc.nodes.iter().all(|n| n.id != "bind"));
    }
}
