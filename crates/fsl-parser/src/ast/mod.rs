//! Typed schema tree produced by the parser.
//!
//! The tree is fully owned: dropping a [`Document`] releases everything
//! reachable from its declarations, and `Clone` is the deep duplicate used
//! by [`Document::filter`]. The one exception is trivia: comments are held
//! behind non-atomic [`Rc`] handles so that filtering or merging trees
//! shares their text instead of copying it. No tree may be shared between
//! threads.
//!
//! Declarations, members and FQL types are closed enums; the canonical
//! printer and [`code_eq`] are exhaustive matches over them, so adding a
//! variant flags every site that needs updating.

mod code_eq;
mod ops;
mod ty;

use std::rc::Rc;

pub use code_eq::CodeEq;
pub use ops::DeclarationSummary;
pub use ty::{FunctionType, FunctionTypeParams, ObjectType, ObjectTypeField, Type};

/// A position in an FSL source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// File the node came from, shared across the nodes of one parse.
    pub file: Option<Rc<str>>,
    /// Byte offset.
    pub index: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// An identifier or literal with its source position.
///
/// Names are the rewrite points of the tree: the linker changes a symbol's
/// identity by replacing `text` in place, without touching the parent node.
#[derive(Clone, Debug)]
pub struct Name {
    /// The text, verbatim (string literals keep their quotes).
    pub text: String,
    /// Where the text was read from, if it came from a parse.
    pub loc: Option<Location>,
}

impl Name {
    /// A name with no source position.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            loc: None,
        }
    }
}

/// An FQL expression captured verbatim, never parsed.
#[derive(Clone, Debug)]
pub struct Expr {
    /// The raw expression text between (not including) its delimiters.
    pub text: String,
    /// Position of the opening delimiter.
    pub loc: Option<Location>,
}

impl Expr {
    /// An expression blob with no source position.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            loc: None,
        }
    }
}

/// A preserved piece of trivia: a comment line or a blank line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extra {
    /// A `//` comment, text verbatim including the slashes.
    Comment(Rc<str>),
    /// One or more consecutive blank lines (collapsed to one).
    Blank,
}

/// Trivia anchored to the declaration or member that follows it.
pub type Extras = Vec<Extra>;

/// The root of a parsed schema: an ordered list of declarations plus any
/// trailing trivia.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Top-level declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Trivia after the last declaration.
    pub trailing: Extras,
}

/// The four kinds of top-level declaration.
#[derive(Clone, Debug)]
pub enum Declaration {
    /// `access provider <name> { ... }`
    AccessProvider(AccessProvider),
    /// `collection <name> { ... }`
    Collection(Collection),
    /// `function <name>(...) { ... }`
    Function(Function),
    /// `role <name> { ... }`
    Role(Role),
}

impl Declaration {
    /// The declaration's kind tag.
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::AccessProvider(_) => DeclarationKind::AccessProvider,
            Declaration::Collection(_) => DeclarationKind::Collection,
            Declaration::Function(_) => DeclarationKind::Function,
            Declaration::Role(_) => DeclarationKind::Role,
        }
    }

    /// The declared name.
    pub fn name(&self) -> &Name {
        match self {
            Declaration::AccessProvider(d) => &d.name,
            Declaration::Collection(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::Role(d) => &d.name,
        }
    }

    /// Trivia anchored to this declaration.
    pub fn leading(&self) -> &Extras {
        match self {
            Declaration::AccessProvider(d) => &d.leading,
            Declaration::Collection(d) => &d.leading,
            Declaration::Function(d) => &d.leading,
            Declaration::Role(d) => &d.leading,
        }
    }
}

/// Kind tag for a [`Declaration`], ordered the way [`Document::sort`] orders
/// declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// An access provider.
    AccessProvider,
    /// A collection.
    Collection,
    /// A user-defined function.
    Function,
    /// A role.
    Role,
}

impl DeclarationKind {
    /// The snake_case kind string used at the FFI and in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::AccessProvider => "access_provider",
            DeclarationKind::Collection => "collection",
            DeclarationKind::Function => "function",
            DeclarationKind::Role => "role",
        }
    }
}

/// Error for an unrecognized kind string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid declaration kind `{0}`")]
pub struct InvalidDeclarationKind(pub String);

impl std::str::FromStr for DeclarationKind {
    type Err = InvalidDeclarationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_provider" => Ok(DeclarationKind::AccessProvider),
            "collection" => Ok(DeclarationKind::Collection),
            "function" => Ok(DeclarationKind::Function),
            "role" => Ok(DeclarationKind::Role),
            other => Err(InvalidDeclarationKind(other.to_string())),
        }
    }
}

/// *AccessProvider*:
///     **access** **provider** Name **{** AccessProviderMember* **}**
#[derive(Clone, Debug)]
pub struct AccessProvider {
    /// The provider name.
    pub name: Name,
    /// Members in source order.
    pub members: Vec<AccessProviderMember>,
    /// Trivia anchored to this declaration.
    pub leading: Extras,
    /// Start of the declaration header.
    pub loc: Option<Location>,
}

impl AccessProvider {
    /// The first `issuer` member, if any.
    pub fn issuer(&self) -> Option<&Name> {
        self.members.iter().find_map(|m| match m {
            AccessProviderMember::Issuer { value, .. } => Some(value),
            _ => None,
        })
    }

    /// The first `jwks_uri` member, if any.
    pub fn jwks_uri(&self) -> Option<&Name> {
        self.members.iter().find_map(|m| match m {
            AccessProviderMember::JwksUri { value, .. } => Some(value),
            _ => None,
        })
    }

    /// All `role` members in source order.
    pub fn roles(&self) -> impl Iterator<Item = &Name> {
        self.members.iter().filter_map(|m| match m {
            AccessProviderMember::Role { role, .. } => Some(role),
            _ => None,
        })
    }

    /// The first `ttl` member, if any.
    pub fn ttl(&self) -> Option<&str> {
        self.members.iter().find_map(|m| match m {
            AccessProviderMember::Ttl { value, .. } => Some(value.as_str()),
            _ => None,
        })
    }
}

/// One member of an access provider block.
#[derive(Clone, Debug)]
pub enum AccessProviderMember {
    /// `issuer "<url>"`
    Issuer {
        /// The quoted issuer URL.
        value: Name,
        /// Trivia anchored to this member.
        leading: Extras,
    },
    /// `jwks_uri "<url>"`
    JwksUri {
        /// The quoted JWKS URL.
        value: Name,
        /// Trivia anchored to this member.
        leading: Extras,
    },
    /// `role <name>`
    Role {
        /// The granted role.
        role: Name,
        /// Trivia anchored to this member.
        leading: Extras,
    },
    /// `ttl <seconds>`
    Ttl {
        /// The number literal, verbatim.
        value: String,
        /// Trivia anchored to this member.
        leading: Extras,
    },
}

/// *Collection*:
///     **collection** Name (**as** Type)? **{** CollectionMember* **}**
#[derive(Clone, Debug)]
pub struct Collection {
    /// The collection name.
    pub name: Name,
    /// The `as` type alias, if declared.
    pub alias: Option<Type>,
    /// Members in source order.
    pub members: Vec<CollectionMember>,
    /// Trivia anchored to this declaration.
    pub leading: Extras,
    /// Start of the declaration header.
    pub loc: Option<Location>,
}

/// One member of a collection block.
#[derive(Clone, Debug)]
pub enum CollectionMember {
    /// `<name>: <type>` (the type is optional and defaults to `unknown`).
    Field(FieldDefinition),
    /// `compute <name>: <type> { <expr> }`
    Computed(ComputedField),
    /// `check <name> { <predicate> }`
    Check(CheckConstraint),
    /// `unique [<terms>]`
    Unique(UniqueConstraint),
    /// `index <name> { ... }`
    Index(IndexDefinition),
    /// `history_days <n>`
    HistoryDays(DaysMember),
    /// `ttl_days <n>`
    TtlDays(DaysMember),
    /// `document_ttls <bool>`
    DocumentTtls(FlagMember),
    /// `migrations { ... }`
    Migrations(MigrationsBlock),
}

/// A stored field.
#[derive(Clone, Debug)]
pub struct FieldDefinition {
    /// The field name.
    pub name: Name,
    /// The field type; absent means `unknown`.
    pub ty: Option<Type>,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A computed field.
#[derive(Clone, Debug)]
pub struct ComputedField {
    /// The computed field name.
    pub name: Name,
    /// The declared result type, if any.
    pub ty: Option<Type>,
    /// The computing expression.
    pub body: Expr,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A named check constraint.
#[derive(Clone, Debug)]
pub struct CheckConstraint {
    /// The constraint name.
    pub name: Name,
    /// The predicate expression.
    pub predicate: Expr,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A uniqueness constraint over a bracketed term list.
#[derive(Clone, Debug)]
pub struct UniqueConstraint {
    /// The term list between (not including) the brackets, verbatim.
    pub terms: Expr,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A named index with a verbatim body.
#[derive(Clone, Debug)]
pub struct IndexDefinition {
    /// The index name.
    pub name: Name,
    /// The index body, verbatim.
    pub body: Expr,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A `history_days` / `ttl_days` member.
#[derive(Clone, Debug)]
pub struct DaysMember {
    /// The number literal, verbatim.
    pub days: String,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A `document_ttls` member.
#[derive(Clone, Debug)]
pub struct FlagMember {
    /// The flag value.
    pub enabled: bool,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// A `migrations` block, body verbatim.
#[derive(Clone, Debug)]
pub struct MigrationsBlock {
    /// The block body, verbatim.
    pub body: Expr,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// *Function*:
///     (**@role(** Name **)**)? **function** Name **(** Parameter* **)**
///     (**:** Type)? **{** FQL **}**
#[derive(Clone, Debug)]
pub struct Function {
    /// The function name; the linker rewrites this in place.
    pub name: Name,
    /// Parameters in source order.
    pub params: Vec<Parameter>,
    /// The declared return type, if any.
    pub ret: Option<Type>,
    /// The FQL body, verbatim.
    pub body: Expr,
    /// The `@role(...)` annotation, if any.
    pub role: Option<Name>,
    /// Trivia anchored to this declaration.
    pub leading: Extras,
    /// Start of the declaration header.
    pub loc: Option<Location>,
}

/// A function parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
    /// The parameter name.
    pub name: Name,
    /// The parameter type, if any.
    pub ty: Option<Type>,
}

/// *Role*:
///     **role** Name **{** RoleMember* **}**
#[derive(Clone, Debug)]
pub struct Role {
    /// The role name.
    pub name: Name,
    /// Members in source order.
    pub members: Vec<RoleMember>,
    /// Trivia anchored to this declaration.
    pub leading: Extras,
    /// Start of the declaration header.
    pub loc: Option<Location>,
}

/// One member of a role block.
#[derive(Clone, Debug)]
pub enum RoleMember {
    /// `privileges <resource> { <action>* }`
    Privileges(Privileges),
    /// `membership <collection> { <predicate> }?`
    Membership(Membership),
}

/// A privilege grant on one resource.
#[derive(Clone, Debug)]
pub struct Privileges {
    /// The resource the actions apply to; UDF resources are rewritten by
    /// the linker.
    pub resource: Name,
    /// Granted actions in source order.
    pub actions: Vec<Action>,
    /// Trivia anchored to this member.
    pub leading: Extras,
}

/// One privileged action, optionally guarded by a predicate.
#[derive(Clone, Debug)]
pub struct Action {
    /// Which action is granted.
    pub kind: ActionKind,
    /// The guarding predicate, if any.
    pub predicate: Option<Expr>,
    /// Trivia anchored to this action.
    pub leading: Extras,
}

/// The closed set of privilege actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `read`
    Read,
    /// `write`
    Write,
    /// `create`
    Create,
    /// `delete`
    Delete,
    /// `history_read`
    HistoryRead,
    /// `call`
    Call,
}

impl ActionKind {
    /// The action keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Read => "read",
            ActionKind::Write => "write",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
            ActionKind::HistoryRead => "history_read",
            ActionKind::Call => "call",
        }
    }

    /// Parse an action keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "read" => Some(ActionKind::Read),
            "write" => Some(ActionKind::Write),
            "create" => Some(ActionKind::Create),
            "delete" => Some(ActionKind::Delete),
            "history_read" => Some(ActionKind::HistoryRead),
            "call" => Some(ActionKind::Call),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A membership rule: documents of a collection belong to the role.
#[derive(Clone, Debug)]
pub struct Membership {
    /// The member collection.
    pub collection: Name,
    /// The guarding predicate, if any.
    pub predicate: Option<Expr>,
    /// Trivia anchored to this member.
    pub leading: Extras,
}
