//! The instantiated type model: what the engine hands to consumers after
//! references, generics, indices and dispatcher lookups are resolved away.
//!
//! Container children stay *lazy*: a [`LazyType`] is the source expression
//! plus the environment it must be evaluated in, forced on demand through
//! the engine. That keeps recursive schemas (a tree node whose children list
//! references the node itself) finite without any special-casing.
use crate::ast::{
    Attribute, EnumBaseKind, EnumVariant, NumericKind, PrimArrayKind, Range, TypeExpr, TypedNumber,
};
use crate::resolver::{CanonicalPath, UseMap};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The scope a type expression is evaluated in: the module it textually
/// belongs to and that file's import map.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEnv {
    pub module: CanonicalPath,
    /// Logical file path, for diagnostics.
    pub file: String,
    pub uses: Arc<UseMap>,
}

impl TypeEnv {
    #[must_use]
    pub fn new(module: CanonicalPath, file: impl Into<String>, uses: Arc<UseMap>) -> Self {
        TypeEnv {
            module,
            file: file.into(),
            uses,
        }
    }

    /// The environment of ad-hoc queries: module root, no imports.
    #[must_use]
    pub fn root() -> Self {
        TypeEnv {
            module: CanonicalPath::root(),
            file: "<query>".to_string(),
            uses: Arc::new(HashMap::new()),
        }
    }
}

/// A not-yet-instantiated child: source expression + evaluation scope.
/// Forced through [`McdocProject::force`](crate::McdocProject::force).
#[derive(Debug, Clone, PartialEq)]
pub struct LazyType {
    pub expr: TypeExpr,
    pub env: TypeEnv,
}

impl LazyType {
    #[must_use]
    pub fn new(expr: TypeExpr, env: TypeEnv) -> Self {
        LazyType { expr, env }
    }
}

impl fmt::Display for LazyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// A struct field after instantiation. The value type stays lazy.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: FieldName,
    pub optional: bool,
    pub ty: LazyType,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldName {
    Literal(String),
    Computed(LazyType),
}

impl FieldName {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            FieldName::Literal(s) => Some(s),
            FieldName::Computed(_) => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Literal(s) => f.write_str(s),
            FieldName::Computed(ty) => write!(f, "[{ty}]"),
        }
    }
}

/// An instantiated type. Attributes are carried over from the source and
/// from every reference the instantiation went through; `shadowed` records
/// union members dropped during simplification.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub attributes: Vec<Attribute>,
    pub shadowed: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Any,
    Unsafe,
    Boolean,
    String {
        len_range: Option<Range>,
    },
    LiteralBool(bool),
    LiteralString(String),
    LiteralNumber(TypedNumber),
    Numeric {
        kind: NumericKind,
        value_range: Option<Range>,
    },
    PrimArray {
        kind: PrimArrayKind,
        elem_range: Option<Range>,
        len_range: Option<Range>,
    },
    List {
        elem: Box<LazyType>,
        len_range: Option<Range>,
    },
    Tuple {
        elems: Vec<LazyType>,
    },
    Struct {
        fields: Vec<Field>,
    },
    Enum {
        base: EnumBaseKind,
        variants: Vec<EnumVariant>,
    },
    Union {
        members: Vec<Type>,
    },
    /// The empty union; assignable to everything, admits nothing.
    Bottom,
    /// A cycle handle: the reference re-entered its own expansion. Forcing
    /// the target restarts instantiation from a clean stack.
    Handle {
        key: String,
        target: Box<LazyType>,
    },
    /// Sentinel for a failed resolution. The originating diagnostic was
    /// already reported; this type is assignable only to `any`/`unsafe`.
    Error,
}

impl Type {
    #[must_use]
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            attributes: Vec::new(),
            shadowed: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(kind: TypeKind, attributes: Vec<Attribute>) -> Self {
        Type {
            kind,
            attributes,
            shadowed: Vec::new(),
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Type::new(TypeKind::Any)
    }

    #[must_use]
    pub fn bottom() -> Self {
        Type::new(TypeKind::Bottom)
    }

    #[must_use]
    pub fn error() -> Self {
        Type::new(TypeKind::Error)
    }

    #[must_use]
    pub fn is_bottom(&self) -> bool {
        matches!(self.kind, TypeKind::Bottom)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attr in &self.attributes {
            write!(f, "{attr} ")?;
        }
        match &self.kind {
            TypeKind::Any => f.write_str("any"),
            TypeKind::Unsafe => f.write_str("unsafe"),
            TypeKind::Boolean => f.write_str("boolean"),
            TypeKind::String { len_range } => {
                f.write_str("string")?;
                if let Some(range) = len_range {
                    write!(f, " @ {range}")?;
                }
                Ok(())
            }
            TypeKind::LiteralBool(b) => write!(f, "{b}"),
            TypeKind::LiteralString(s) => crate::ast::write_quoted(f, s),
            TypeKind::LiteralNumber(n) => write!(f, "{n}"),
            TypeKind::Numeric { kind, value_range } => {
                write!(f, "{kind}")?;
                if let Some(range) = value_range {
                    write!(f, " @ {range}")?;
                }
                Ok(())
            }
            TypeKind::PrimArray {
                kind,
                elem_range,
                len_range,
            } => {
                write!(f, "{kind}")?;
                if let Some(range) = elem_range {
                    write!(f, " @ {range}")?;
                }
                f.write_str("[]")?;
                if let Some(range) = len_range {
                    write!(f, " @ {range}")?;
                }
                Ok(())
            }
            TypeKind::List { elem, len_range } => {
                write!(f, "[{elem}]")?;
                if let Some(range) = len_range {
                    write!(f, " @ {range}")?;
                }
                Ok(())
            }
            TypeKind::Tuple { elems } => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                if elems.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str("]")
            }
            TypeKind::Struct { fields } => {
                f.write_str("struct {")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}", field.key)?;
                    if field.optional {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", field.ty)?;
                }
                f.write_str(" }")
            }
            TypeKind::Enum { base, variants } => {
                write!(f, "enum ({base}) {{")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {} = {}", variant.name, variant.value)?;
                }
                f.write_str(" }")
            }
            TypeKind::Union { members } => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" |")?;
                    }
                    write!(f, " {member}")?;
                }
                f.write_str(" )")
            }
            TypeKind::Bottom => f.write_str("()"),
            TypeKind::Handle { key, .. } => f.write_str(key),
            TypeKind::Error => f.write_str("<error>"),
        }
    }
}
