//! Context builder — single forward scan over a token stream.
//!
//! Recognizes Context/Role/Method declarations and in-method references,
//! producing finalized [`Context`] models. Role attachment is two-phase:
//! methods matching the RoleMethod convention are provisionally recorded
//! by role *name* and bound to the real Role in one explicit resolution
//! step at the class's closing brace.

use std::collections::HashSet;

use tracing::debug;

use crate::config::Conventions;
use crate::diagnostics::{DiagnosticCode, DiagnosticSink};
use crate::model::{Access, Context, ContractCall, Method, Ref, RefKind, Role};
use crate::token::{TokenKind, TokenStream};

/// Doc-comment tags that open a Context class.
const CONTEXT_TAGS: &[&str] = &["@context", "@dci", "@dcicontext"];

/// Doc-comment tags that suppress Role recognition for the next
/// qualifying declaration.
const IGNORE_TAGS: &[&str] = &["@norole", "@nodcirole", "@ignorerole", "@ignoredcirole"];

/// A RoleMethod waiting for its Role, resolved at finalization.
struct PendingAttachment {
    full_name: String,
    role_name: String,
    local_name: String,
}

/// Scan state. At most one Context and one current method are open at any
/// instant; everything is reset atomically when a Context finalizes.
pub struct ContextBuilder<'a> {
    stream: &'a TokenStream,
    conventions: &'a Conventions,
    context: Option<Context>,
    /// (full name, end position) of the method being scanned.
    current_method: Option<(String, usize)>,
    ignored_roles: HashSet<String>,
    pending: Vec<PendingAttachment>,
    ignore_next_role: bool,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(stream: &'a TokenStream, conventions: &'a Conventions) -> Self {
        Self {
            stream,
            conventions,
            context: None,
            current_method: None,
            ignored_roles: HashSet::new(),
            pending: Vec::new(),
            ignore_next_role: false,
        }
    }

    /// Process the whole stream, returning every finalized Context in
    /// order of appearance. Convention violations found during the scan
    /// go to `sink`.
    pub fn scan(mut self, sink: &mut DiagnosticSink) -> Vec<Context> {
        let mut contexts = Vec::new();

        for pos in 0..self.stream.len() {
            if let Some(context) = self.process(pos, sink) {
                contexts.push(context);
            }
        }

        contexts
    }

    /// Handle one token. Returns a Context when `pos` closes one.
    fn process(&mut self, pos: usize, sink: &mut DiagnosticSink) -> Option<Context> {
        let kind = self.stream.get(pos)?.kind;

        if self.context.is_none() {
            if kind == TokenKind::DocCommentTag {
                self.try_open_context(pos, sink);
            }
            return None;
        }

        match kind {
            TokenKind::DocCommentTag => {
                let tag = self.stream.get(pos)?.text.to_lowercase();
                if IGNORE_TAGS.contains(&tag.as_str()) {
                    self.ignore_next_role = true;
                }
            }
            TokenKind::CloseBrace => {
                if Some(pos) == self.context.as_ref().map(Context::end) {
                    return Some(self.finalize(sink));
                }
                if Some(pos) == self.current_method.as_ref().map(|(_, end)| *end) {
                    self.current_method = None;
                }
            }
            kind if kind.is_visibility() => {
                self.declaration(pos, sink);
            }
            TokenKind::Variable => {
                if self.stream.get(pos)?.text == "$this" {
                    self.reference(pos);
                }
            }
            _ => {}
        }

        None
    }

    /// A Context-opening doc tag: search forward for the class keyword
    /// and open a Context spanning its brace pair. A Context class must
    /// be declared `final`.
    fn try_open_context(&mut self, tag_pos: usize, sink: &mut DiagnosticSink) {
        let tag = match self.stream.get(tag_pos) {
            Some(t) => t.text.to_lowercase(),
            None => return,
        };
        if !CONTEXT_TAGS.contains(&tag.as_str()) {
            return;
        }

        let Some(class_pos) = self.stream.find_next(TokenKind::Class, tag_pos, true) else {
            return;
        };
        let Some(name_pos) = self.stream.find_next(TokenKind::Ident, class_pos, true) else {
            return;
        };
        let Some(open) = self.stream.find_next(TokenKind::OpenBrace, class_pos, true) else {
            return;
        };
        let Some(close) = self.stream.scope_mate(open) else {
            return;
        };

        let is_final = self
            .stream
            .prev_significant(class_pos)
            .and_then(|p| self.stream.get(p))
            .map(|t| t.kind == TokenKind::Final)
            .unwrap_or(false);
        if !is_final {
            sink.error(
                class_pos,
                DiagnosticCode::ContextNotFinal,
                "A DCI Context must be final.",
            );
        }

        let name = self.stream.get(name_pos).map(|t| t.text.clone()).unwrap_or_default();
        debug!(context = %name, start = open, end = close, "context opened");
        self.context = Some(Context::new(name, open, close));
    }

    /// A visibility modifier opens either a method or a field declaration.
    fn declaration(&mut self, pos: usize, sink: &mut DiagnosticSink) {
        let Some(access) = Access::from_token(self.stream.get(pos).map(|t| t.kind).unwrap_or(TokenKind::Other))
        else {
            return;
        };

        if let Some(func_pos) = self.stream.find_next(TokenKind::Function, pos, true) {
            self.method_declaration(pos, func_pos, access, sink);
        } else if let Some(var_pos) = self.stream.find_next(TokenKind::Variable, pos, true) {
            self.field_declaration(pos, var_pos, access, sink);
        }
    }

    fn method_declaration(
        &mut self,
        modifier_pos: usize,
        func_pos: usize,
        access: Access,
        sink: &mut DiagnosticSink,
    ) {
        let Some(name_pos) = self.stream.find_next(TokenKind::Ident, func_pos, true) else {
            return;
        };
        let name = match self.stream.get(name_pos) {
            Some(t) => t.text.clone(),
            None => return,
        };
        // Bodyless declarations (interface/abstract) have no brace to span.
        let Some(open) = self.stream.find_next(TokenKind::OpenBrace, func_pos, true) else {
            return;
        };
        let Some(close) = self.stream.scope_mate(open) else {
            return;
        };

        let role_split = self.conventions.split_role_method(&name);

        if self.ignore_next_role && role_split.is_some() {
            // Marker consumed: the method stays a plain Context method.
            self.ignore_next_role = false;
            self.ignored_roles.insert(name.clone());
        } else if let Some((role_name, local_name)) = role_split {
            if access == Access::Public {
                sink.error(
                    modifier_pos,
                    DiagnosticCode::PublicRoleMethod,
                    format!(
                        "RoleMethod \"{}->{}\" is public, must be private or protected.",
                        role_name, local_name
                    ),
                );
            }
            self.pending.push(PendingAttachment {
                full_name: name.clone(),
                role_name,
                local_name,
            });
        }

        let tags = self.stream.tags_before(modifier_pos);
        let method = Method::new(&name, modifier_pos, close, access, tags);

        if let Some(context) = self.context.as_mut() {
            context.add_method(method);
        }
        self.current_method = Some((name, close));
    }

    fn field_declaration(
        &mut self,
        modifier_pos: usize,
        var_pos: usize,
        access: Access,
        sink: &mut DiagnosticSink,
    ) {
        let name = match self.stream.get(var_pos) {
            Some(t) => t.text.trim_start_matches('$').to_string(),
            None => return,
        };
        if !self.conventions.is_role_name(&name) {
            return;
        }

        if self.ignore_next_role {
            self.ignore_next_role = false;
            self.ignored_roles.insert(name);
            return;
        }

        if access != Access::Private {
            sink.error(
                var_pos,
                DiagnosticCode::RoleNotPrivate,
                format!("Role \"{}\" must be private.", name),
            );
        }

        let tags = self.stream.tags_before(modifier_pos);
        if let Some(context) = self.context.as_mut() {
            context.add_role(Role::new(name, var_pos, access, tags));
        }
    }

    /// Classify a `$this`-qualified reference by its follow-context.
    /// Property refs and refs to non-Role targets where a Role target is
    /// required are dropped here, never stored.
    fn reference(&mut self, this_pos: usize) {
        let Some((method_name, _)) = self.current_method.clone() else {
            return;
        };

        let Some(arrow_pos) = self.stream.next_significant(this_pos) else {
            return;
        };
        if self.stream.get(arrow_pos).map(|t| t.kind) != Some(TokenKind::Arrow) {
            return;
        }
        let Some(target_pos) = self.stream.next_significant(arrow_pos) else {
            return;
        };
        if self.stream.get(target_pos).map(|t| t.kind) != Some(TokenKind::Ident) {
            return;
        }
        let target = match self.stream.get(target_pos) {
            Some(t) => t.text.clone(),
            None => return,
        };

        // An explicit `@` directly before `$this` marks the ref excepted.
        let excepted = self
            .stream
            .prev_significant(this_pos)
            .and_then(|p| self.stream.get(p))
            .map(|t| t.kind == TokenKind::At)
            .unwrap_or(false);

        let follow = self
            .stream
            .next_significant(target_pos)
            .and_then(|p| self.stream.get(p).map(|t| (p, t.kind)));

        let is_role = self.is_role_candidate(&target);

        let reference = match follow {
            Some((_, TokenKind::OpenBracket)) if is_role => Some(
                Ref::new(&target, target_pos, RefKind::Role, excepted)
                    .with_contract_call(ContractCall::Array),
            ),
            Some((arrow2, TokenKind::Arrow)) if is_role => self
                .stream
                .next_significant(arrow2)
                .and_then(|p| self.stream.get(p))
                .filter(|t| t.kind == TokenKind::Ident)
                .map(|t| {
                    Ref::new(&target, target_pos, RefKind::Role, excepted)
                        .with_contract_call(ContractCall::Method(t.text.clone()))
                }),
            Some((_, TokenKind::OpenParen)) => {
                let kind = if self.conventions.split_role_method(&target).is_some() {
                    RefKind::RoleMethod
                } else {
                    RefKind::Method
                };
                Some(Ref::new(&target, target_pos, kind, excepted))
            }
            Some((_, TokenKind::Assign)) if is_role => {
                // Assignment into a RoleMethod never reaches here: the
                // target matched the role pattern, not the method one.
                Some(Ref::new(&target, target_pos, RefKind::RoleAssignment, excepted))
            }
            _ if is_role => {
                let returned = self.precedes_return(this_pos);
                let r = Ref::new(&target, target_pos, RefKind::Role, excepted);
                Some(if returned { r.with_returned() } else { r })
            }
            // Plain property access, dropped immediately.
            _ => None,
        };

        if let (Some(r), Some(context)) = (reference, self.context.as_mut()) {
            if let Some(method) = context.method_mut(&method_name) {
                method.add_ref(r);
            }
        }
    }

    /// Is `$this->x` preceded by a `return` keyword (skipping a possible
    /// `@` exception marker)?
    fn precedes_return(&self, this_pos: usize) -> bool {
        let mut prev = self.stream.prev_significant(this_pos);
        if let Some(p) = prev {
            if self.stream.get(p).map(|t| t.kind) == Some(TokenKind::At) {
                prev = self.stream.prev_significant(p);
            }
        }
        prev.and_then(|p| self.stream.get(p))
            .map(|t| t.kind == TokenKind::Return)
            .unwrap_or(false)
    }

    /// Role-name *candidate* check. Classification happens mid-scan, when
    /// later role declarations are still unknown (the canonical layout
    /// binds roles in a constructor declared above the fields), so it
    /// goes by naming pattern; the rule passes re-validate targets
    /// against the finalized role registry.
    fn is_role_candidate(&self, name: &str) -> bool {
        !self.ignored_roles.contains(name) && self.conventions.is_role_name(name)
    }

    /// Class closing brace: resolve pending attachments, then reset all
    /// scan state in one transition.
    fn finalize(&mut self, sink: &mut DiagnosticSink) -> Context {
        let mut context = self.context.take().expect("finalize without open context");

        for attachment in self.pending.drain(..) {
            if self.ignored_roles.contains(&attachment.role_name) {
                continue;
            }
            if context.has_role(&attachment.role_name) {
                if let Some(role) = context.role_mut(&attachment.role_name) {
                    role.attach_method(&attachment.local_name, &attachment.full_name);
                }
                // A re-declared method leaves a stale pending entry for the
                // same name; only the surviving declaration gets bound.
                if let Some(method) = context.method_mut(&attachment.full_name) {
                    if method.role().is_none() {
                        method.bind_role(&attachment.role_name);
                    }
                }
            } else if let Some(method) = context.method(&attachment.full_name) {
                sink.error(
                    method.start(),
                    DiagnosticCode::NonExistingRole,
                    format!(
                        "Role \"{}\" does not exist. Add it as \"private ${};\" above its RoleMethods.",
                        attachment.role_name, attachment.role_name
                    ),
                );
            }
        }

        self.current_method = None;
        self.ignored_roles.clear();
        self.ignore_next_role = false;

        debug!(
            context = %context.name(),
            roles = context.roles().len(),
            methods = context.methods().len(),
            "context finalized"
        );

        context
    }
}
