//! Semantic model: Context, Role, Method, Ref.
//!
//! Fixed-schema types populated by the builder during a single forward
//! scan and handed read-only to the rule checker and exporter. Internal
//! invariants (write-once role binding, positive spans) are debug
//! assertions: they signal an impossible scan state, never user input.

use serde::Serialize;

use crate::token::TokenKind;

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    /// Map a visibility token to an access level.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Public => Some(Self::Public),
            TokenKind::Protected => Some(Self::Protected),
            TokenKind::Private => Some(Self::Private),
            _ => None,
        }
    }
}

/// What a recorded reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefKind {
    /// Plain Context method call.
    Method,
    /// Non-Role property access; never retained on a Method.
    Property,
    RoleMethod,
    Role,
    RoleAssignment,
}

/// An invocation made through a Role onto its bound player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContractCall {
    /// Named method call on the player.
    Method(String),
    /// Array-style access on the player.
    Array,
}

impl ContractCall {
    /// The called method name; None for array access.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Method(name) => Some(name),
            Self::Array => None,
        }
    }
}

/// A recorded use of a Role or method inside a method body.
#[derive(Debug, Clone, Serialize)]
pub struct Ref {
    to: String,
    pos: usize,
    kind: RefKind,
    excepted: bool,
    contract_call: Option<ContractCall>,
    returned: bool,
}

impl Ref {
    pub fn new(to: impl Into<String>, pos: usize, kind: RefKind, excepted: bool) -> Self {
        let to = to.into();
        debug_assert!(!to.is_empty(), "empty Ref target");

        Self {
            to,
            pos,
            kind,
            excepted,
            contract_call: None,
            returned: false,
        }
    }

    /// Attach a contract call. Only meaningful on Role refs.
    pub fn with_contract_call(mut self, call: ContractCall) -> Self {
        debug_assert!(
            self.kind == RefKind::Role,
            "contract call on non-Role ref to {}",
            self.to
        );
        self.contract_call = Some(call);
        self
    }

    /// Mark the ref as the operand of a bare return statement.
    pub fn with_returned(mut self) -> Self {
        self.returned = true;
        self
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    pub fn excepted(&self) -> bool {
        self.excepted
    }

    pub fn contract_call(&self) -> Option<&ContractCall> {
        self.contract_call.as_ref()
    }

    pub fn returned(&self) -> bool {
        self.returned
    }
}

/// A method of the Context, possibly owned by a Role.
#[derive(Debug, Clone, Serialize)]
pub struct Method {
    full_name: String,
    start: usize,
    end: usize,
    access: Access,
    refs: Vec<Ref>,
    /// Name of the owning Role; None for plain Context methods.
    role: Option<String>,
    tags: Vec<String>,
}

impl Method {
    pub fn new(
        full_name: impl Into<String>,
        start: usize,
        end: usize,
        access: Access,
        tags: Vec<String>,
    ) -> Self {
        let full_name = full_name.into();
        debug_assert!(!full_name.is_empty(), "empty Method name");
        debug_assert!(end > start, "invalid Method span {}..{}", start, end);

        Self {
            full_name,
            start,
            end,
            access,
            refs: Vec::new(),
            role: None,
            tags,
        }
    }

    pub fn add_ref(&mut self, r: Ref) {
        self.refs.push(r);
    }

    /// Bind the method to its Role. Write-once: rebinding is a builder
    /// defect, not a user diagnostic.
    pub fn bind_role(&mut self, role: impl Into<String>) {
        debug_assert!(
            self.role.is_none(),
            "role rebound on method {}",
            self.full_name
        );
        self.role = Some(role.into());
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn refs(&self) -> &[Ref] {
        &self.refs
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// A Role: a private field plus the methods attached under it.
#[derive(Debug, Clone, Serialize)]
pub struct Role {
    name: String,
    pos: usize,
    access: Access,
    tags: Vec<String>,
    /// local method name -> full method name, in attachment order.
    methods: Vec<(String, String)>,
}

impl Role {
    pub fn new(name: impl Into<String>, pos: usize, access: Access, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pos,
            access,
            tags,
            methods: Vec::new(),
        }
    }

    pub fn attach_method(&mut self, local_name: impl Into<String>, full_name: impl Into<String>) {
        let local_name = local_name.into();
        match self.methods.iter_mut().find(|(l, _)| *l == local_name) {
            Some(entry) => entry.1 = full_name.into(),
            None => self.methods.push((local_name, full_name.into())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// (local name, full name) pairs in attachment order.
    pub fn methods(&self) -> &[(String, String)] {
        &self.methods
    }
}

/// A class modeling one use case, composed of Roles.
///
/// Built by one forward scan over the class body, finalized at its
/// closing brace, then discarded after checking and export.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    name: String,
    start: usize,
    end: usize,
    roles: Vec<Role>,
    methods: Vec<Method>,
}

impl Context {
    pub fn new(name: impl Into<String>, start: usize, end: usize) -> Self {
        debug_assert!(end > start, "invalid Context span {}..{}", start, end);

        Self {
            name: name.into(),
            start,
            end,
            roles: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Register a Role. A re-declared name replaces the earlier entry,
    /// keeping names unique.
    pub fn add_role(&mut self, role: Role) {
        match self.roles.iter_mut().find(|r| r.name == role.name) {
            Some(existing) => *existing = role,
            None => self.roles.push(role),
        }
    }

    /// Register a Method, keyed by full name.
    pub fn add_method(&mut self, method: Method) {
        match self
            .methods
            .iter_mut()
            .find(|m| m.full_name == method.full_name)
        {
            Some(existing) => *existing = method,
            None => self.methods.push(method),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Roles in declaration order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn role_mut(&mut self, name: &str) -> Option<&mut Role> {
        self.roles.iter_mut().find(|r| r.name == name)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.role(name).is_some()
    }

    pub fn method(&self, full_name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.full_name == full_name)
    }

    pub fn method_mut(&mut self, full_name: &str) -> Option<&mut Method> {
        self.methods.iter_mut().find(|m| m.full_name == full_name)
    }
}
