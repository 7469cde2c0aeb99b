use std::fmt;

use crate::ast::Name;

/// An FQL type expression, fully parsed (unlike FQL value expressions,
/// which stay verbatim blobs).
///
/// Precedence, loosest first: `|` (union, left-associative), `=>`
/// (function, right-associative), postfix `?` (optional), then template
/// application and the primaries. Parenthesized groups are kept as
/// [`Type::Isolated`] so printing round-trips the author's grouping.
#[derive(Clone, Debug)]
pub enum Type {
    /// `User`, `String`, ...
    Named(Name),
    /// `{ name: String, age?: Int, *: Boolean }`
    Object(ObjectType),
    /// `A | B`
    Union(Box<Type>, Box<Type>),
    /// `T?`
    Optional(Box<Type>),
    /// `Ref<User>`, `Set<Order>`
    Template(Name, Vec<Type>),
    /// `[String, Int]`
    Tuple(Vec<Type>),
    /// `"active"`
    StringLiteral(Name),
    /// `0`, `1.5`
    NumberLiteral(Name),
    /// `(A, B) => C` or `A => B`
    Function(FunctionType),
    /// `(T)`
    Isolated(Box<Type>),
}

/// The fields of an object type.
#[derive(Clone, Debug)]
pub struct ObjectType {
    /// Keyed fields in source order.
    pub fields: Vec<ObjectTypeField>,
    /// The `*: T` wildcard value type, if present.
    pub wildcard: Option<Box<Type>>,
}

/// One `key: type` entry of an object type.
#[derive(Clone, Debug)]
pub struct ObjectTypeField {
    /// The key, an identifier or quoted string.
    pub key: Name,
    /// The value type.
    pub ty: Type,
    /// Whether the key was marked `?`.
    pub optional: bool,
}

/// A function type.
#[derive(Clone, Debug)]
pub struct FunctionType {
    /// The parameter side of the arrow.
    pub params: FunctionTypeParams,
    /// The return type.
    pub ret: Box<Type>,
}

/// The two surface forms of a function type's parameters.
#[derive(Clone, Debug)]
pub enum FunctionTypeParams {
    /// A single unparenthesized parameter: `A => B`.
    Short(Box<Type>),
    /// A parenthesized list, optionally variadic: `(A, B, ...C) => D`.
    Long {
        /// Parameter types in order; a variadic type is the last entry.
        params: Vec<Type>,
        /// Whether the last parameter is `...`-variadic.
        variadic: bool,
    },
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => f.write_str(&name.text),
            Type::Object(object) => {
                f.write_str("{ ")?;
                let mut first = true;
                for field in &object.fields {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    f.write_str(&field.key.text)?;
                    if field.optional {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", field.ty)?;
                }
                if let Some(wildcard) = &object.wildcard {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "*: {wildcard}")?;
                }
                f.write_str(" }")
            }
            Type::Union(lhs, rhs) => write!(f, "{lhs} | {rhs}"),
            Type::Optional(inner) => write!(f, "{inner}?"),
            Type::Template(name, params) => {
                write!(f, "{}<", name.text)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(">")
            }
            Type::Tuple(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Type::StringLiteral(name) | Type::NumberLiteral(name) => f.write_str(&name.text),
            Type::Function(function) => {
                match &function.params {
                    FunctionTypeParams::Short(param) => write!(f, "{param}")?,
                    FunctionTypeParams::Long { params, variadic } => {
                        f.write_str("(")?;
                        for (i, param) in params.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            if *variadic && i + 1 == params.len() {
                                f.write_str("...")?;
                            }
                            write!(f, "{param}")?;
                        }
                        f.write_str(")")?;
                    }
                }
                write!(f, " => {}", function.ret)
            }
            Type::Isolated(inner) => write!(f, "({inner})"),
        }
    }
}
