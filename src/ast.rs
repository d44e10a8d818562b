use std::fmt;
use std::fmt::Write as _;

// --- Shared leaf types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl NumericKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NumericKind::Byte => "byte",
            NumericKind::Short => "short",
            NumericKind::Int => "int",
            NumericKind::Long => "long",
            NumericKind::Float => "float",
            NumericKind::Double => "double",
        }
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            NumericKind::Byte | NumericKind::Short | NumericKind::Int | NumericKind::Long
        )
    }

    /// Inclusive bounds for the integer kinds, `None` for the float kinds.
    #[must_use]
    pub fn integer_bounds(self) -> Option<(i64, i64)> {
        match self {
            NumericKind::Byte => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            NumericKind::Short => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            NumericKind::Int => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            NumericKind::Long => Some((i64::MIN, i64::MAX)),
            NumericKind::Float | NumericKind::Double => None,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimArrayKind {
    Byte,
    Int,
    Long,
}

impl PrimArrayKind {
    #[must_use]
    pub fn elem_kind(self) -> NumericKind {
        match self {
            PrimArrayKind::Byte => NumericKind::Byte,
            PrimArrayKind::Int => NumericKind::Int,
            PrimArrayKind::Long => NumericKind::Long,
        }
    }
}

impl fmt::Display for PrimArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.elem_kind().as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl NumberValue {
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            NumberValue::Int(i) => i as f64,
            NumberValue::Float(x) => x,
        }
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Int(i) => write!(f, "{i}"),
            NumberValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            NumberValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A numeric literal together with the kind implied by its suffix (`1b`,
/// `2.5f`, ...). Unsuffixed integers are `int`, unsuffixed floats `double`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedNumber {
    pub value: NumberValue,
    pub kind: NumericKind,
}

impl fmt::Display for TypedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.kind {
            NumericKind::Byte => "b",
            NumericKind::Short => "s",
            NumericKind::Int => "",
            NumericKind::Long => "L",
            NumericKind::Float => "f",
            NumericKind::Double => "",
        };
        write!(f, "{}{}", self.value, suffix)
    }
}

/// A numeric or length range. Either end may be absent (open), and each end
/// carries its own exclusivity flag (`1<..<2` excludes both endpoints).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclusive_min: bool,
    pub exclusive_max: bool,
}

impl Range {
    #[must_use]
    pub fn exact(value: f64) -> Self {
        Range {
            min: Some(value),
            max: Some(value),
            exclusive_min: false,
            exclusive_max: false,
        }
    }

    #[must_use]
    pub fn at_least(min: f64) -> Self {
        Range {
            min: Some(min),
            ..Range::default()
        }
    }

    #[must_use]
    pub fn between(min: f64, max: f64) -> Self {
        Range {
            min: Some(min),
            max: Some(max),
            exclusive_min: false,
            exclusive_max: false,
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min || (self.exclusive_min && value == min) {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max || (self.exclusive_max && value == max) {
                return false;
            }
        }
        true
    }

    /// Inclusive integer bounds, with exclusive endpoints tightened by one.
    #[must_use]
    pub fn integer_bounds(&self) -> (Option<i64>, Option<i64>) {
        let lo = self.min.map(|m| {
            let lo = m.ceil() as i64;
            if self.exclusive_min && m == lo as f64 {
                lo + 1
            } else {
                lo
            }
        });
        let hi = self.max.map(|m| {
            let hi = m.floor() as i64;
            if self.exclusive_max && m == hi as f64 {
                hi - 1
            } else {
                hi
            }
        });
        (lo, hi)
    }

    /// Whether the range admits no value at all. `1<..<2` over the integers
    /// is empty; over the floats it is not.
    #[must_use]
    pub fn is_empty(&self, integral: bool) -> bool {
        if integral {
            match self.integer_bounds() {
                (Some(lo), Some(hi)) => lo > hi,
                _ => false,
            }
        } else {
            match (self.min, self.max) {
                (Some(lo), Some(hi)) => {
                    lo > hi || (lo == hi && (self.exclusive_min || self.exclusive_max))
                }
                _ => false,
            }
        }
    }

    /// Subset relation under the endpoint exclusivity semantics. An empty
    /// range is a subset of everything.
    #[must_use]
    pub fn subset_of(&self, other: &Range, integral: bool) -> bool {
        if self.is_empty(integral) {
            return true;
        }
        if integral {
            let (a_lo, a_hi) = self.integer_bounds();
            let (b_lo, b_hi) = other.integer_bounds();
            let lo_ok = match (a_lo, b_lo) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(a), Some(b)) => a >= b,
            };
            let hi_ok = match (a_hi, b_hi) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(a), Some(b)) => a <= b,
            };
            return lo_ok && hi_ok;
        }
        let lo_ok = match (self.min, other.min) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a > b || (a == b && (!other.exclusive_min || self.exclusive_min)),
        };
        let hi_ok = match (self.max, other.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a < b || (a == b && (!other.exclusive_max || self.exclusive_max)),
        };
        lo_ok && hi_ok
    }
}

fn fmt_bound(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min == max && !self.exclusive_min && !self.exclusive_max {
                return fmt_bound(f, min);
            }
        }
        if let Some(min) = self.min {
            fmt_bound(f, min)?;
        }
        let sep = match (self.exclusive_min, self.exclusive_max) {
            (false, false) => "..",
            (false, true) => "..<",
            (true, false) => "<..",
            (true, true) => "<..<",
        };
        f.write_str(sep)?;
        if let Some(max) = self.max {
            fmt_bound(f, max)?;
        }
        Ok(())
    }
}

/// A `namespace:path/segments` identifier, distinguished from a plain
/// identifier by the `:` inside the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation {
    pub namespace: String,
    pub path: String,
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

// --- Paths ---

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Super,
    Ident(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePath {
    pub absolute: bool,
    pub segments: Vec<PathSegment>,
}

impl TypePath {
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        TypePath {
            absolute: false,
            segments: vec![PathSegment::Ident(name.into())],
        }
    }

    /// The trailing identifier, if the path ends in one.
    #[must_use]
    pub fn last_ident(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Ident(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("::")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            match seg {
                PathSegment::Super => f.write_str("super")?,
                PathSegment::Ident(name) => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

// --- Attributes ---

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<AttributeValue>,
}

impl Attribute {
    #[must_use]
    pub fn marker(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Type(Box<TypeExpr>),
    Tree(AttributeTree),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeDelimiter {
    Paren,
    Square,
    Curly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTree {
    pub delimiter: TreeDelimiter,
    pub positional: Vec<AttributeValue>,
    pub named: Vec<(String, AttributeValue)>,
}

// --- Indices ---

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StaticKey {
    Fallback,
    None,
    Unknown,
    Ident(String),
    String(String),
    Resource(ResourceLocation),
}

impl StaticKey {
    /// The textual content used when matching a struct field key. The `%`
    /// keys have none.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            StaticKey::Ident(s) | StaticKey::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StaticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticKey::Fallback => f.write_str("%fallback"),
            StaticKey::None => f.write_str("%none"),
            StaticKey::Unknown => f.write_str("%unknown"),
            StaticKey::Ident(s) => f.write_str(s),
            StaticKey::String(s) => write_quoted(f, s),
            StaticKey::Resource(r) => write!(f, "{r}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessorKey {
    Key,
    Parent,
    Ident(String),
    String(String),
}

impl fmt::Display for AccessorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKey::Key => f.write_str("%key"),
            AccessorKey::Parent => f.write_str("%parent"),
            AccessorKey::Ident(s) => f.write_str(s),
            AccessorKey::String(s) => write_quoted(f, s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    Static(StaticKey),
    Dynamic(Vec<AccessorKey>),
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Static(key) => write!(f, "{key}"),
            Index::Dynamic(keys) => {
                f.write_str("[")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{key}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// --- Type expressions ---

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub attributes: Vec<Attribute>,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl TypeExpr {
    #[must_use]
    pub fn new(kind: TypeExprKind) -> Self {
        TypeExpr {
            kind,
            attributes: Vec::new(),
            pos_start: 0,
            pos_end: 0,
        }
    }
}

// Equality ignores source positions so that printed-and-reparsed trees
// compare equal to the original.
impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.attributes == other.attributes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
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
        elem: Box<TypeExpr>,
        len_range: Option<Range>,
    },
    Tuple {
        elems: Vec<TypeExpr>,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Enum {
        base: EnumBaseKind,
        variants: Vec<EnumVariant>,
    },
    Reference {
        path: TypePath,
        type_args: Vec<TypeExpr>,
    },
    Dispatcher {
        registry: ResourceLocation,
        indices: Vec<Index>,
    },
    Union {
        members: Vec<TypeExpr>,
    },
    Indexed {
        base: Box<TypeExpr>,
        indices: Vec<Index>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructField {
    Named(NamedField),
    Spread(SpreadField),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedField {
    pub key: FieldKey,
    pub optional: bool,
    pub ty: TypeExpr,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadField {
    pub ty: TypeExpr,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKey {
    Ident(String),
    String(String),
    Computed(Box<TypeExpr>),
}

impl FieldKey {
    /// The textual content for literal keys; computed keys have none.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            FieldKey::Ident(s) | FieldKey::String(s) => Some(s),
            FieldKey::Computed(_) => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Ident(s) => f.write_str(s),
            FieldKey::String(s) => write_quoted(f, s),
            FieldKey::Computed(ty) => write!(f, "[{ty}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumBaseKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl EnumBaseKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnumBaseKind::Byte => "byte",
            EnumBaseKind::Short => "short",
            EnumBaseKind::Int => "int",
            EnumBaseKind::Long => "long",
            EnumBaseKind::Float => "float",
            EnumBaseKind::Double => "double",
            EnumBaseKind::String => "string",
        }
    }

    #[must_use]
    pub fn numeric_kind(self) -> Option<NumericKind> {
        match self {
            EnumBaseKind::Byte => Some(NumericKind::Byte),
            EnumBaseKind::Short => Some(NumericKind::Short),
            EnumBaseKind::Int => Some(NumericKind::Int),
            EnumBaseKind::Long => Some(NumericKind::Long),
            EnumBaseKind::Float => Some(NumericKind::Float),
            EnumBaseKind::Double => Some(NumericKind::Double),
            EnumBaseKind::String => None,
        }
    }
}

impl fmt::Display for EnumBaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub value: EnumValue,
    pub attributes: Vec<Attribute>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Number(TypedNumber),
    String(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Number(n) => write!(f, "{n}"),
            EnumValue::String(s) => write_quoted(f, s),
        }
    }
}

// --- Top-level forms ---

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub kind: ItemKind,
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.doc == other.doc && self.attributes == other.attributes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Struct(StructDef),
    Enum(EnumDef),
    TypeAlias(TypeAlias),
    Use(UseStmt),
    Inject(Injection),
    Dispatch(DispatchStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub base: EnumBaseKind,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: String,
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseStmt {
    pub path: TypePath,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Injection {
    Struct {
        path: TypePath,
        fields: Vec<StructField>,
    },
    Enum {
        path: TypePath,
        base: EnumBaseKind,
        variants: Vec<EnumVariant>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchStmt {
    pub registry: ResourceLocation,
    pub keys: Vec<StaticKey>,
    pub type_params: Vec<String>,
    pub target: TypeExpr,
}

// --- Pretty printing ---
//
// The printed form is legal mcdoc source. It doubles as the instantiation
// cache key format and feeds the parse/print round-trip tests.

pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

fn write_attributes(f: &mut fmt::Formatter<'_>, attributes: &[Attribute]) -> fmt::Result {
    for attr in attributes {
        write!(f, "{attr} ")?;
    }
    Ok(())
}

fn write_doc(f: &mut fmt::Formatter<'_>, doc: &Option<String>) -> fmt::Result {
    if let Some(doc) = doc {
        for line in doc.lines() {
            writeln!(f, "/// {line}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[{}", self.name)?;
        match &self.value {
            Option::None => {}
            Some(AttributeValue::Type(ty)) => write!(f, " = {ty}")?,
            Some(AttributeValue::Tree(tree)) => write!(f, "{tree}")?,
        }
        f.write_str("]")
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Type(ty) => write!(f, "{ty}"),
            AttributeValue::Tree(tree) => write!(f, "{tree}"),
        }
    }
}

impl fmt::Display for AttributeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = match self.delimiter {
            TreeDelimiter::Paren => ('(', ')'),
            TreeDelimiter::Square => ('[', ']'),
            TreeDelimiter::Curly => ('{', '}'),
        };
        f.write_char(open)?;
        let mut first = true;
        for value in &self.positional {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{value}")?;
        }
        for (name, value) in &self.named {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match value {
                AttributeValue::Tree(tree) => write!(f, "{name}{tree}")?,
                other => write!(f, "{name} = {other}")?,
            }
        }
        f.write_char(close)
    }
}

impl fmt::Display for StructField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructField::Named(field) => {
                if field.doc.is_some() {
                    // Doc comments need their own line even in the compact
                    // printed form.
                    f.write_str("\n")?;
                    write_doc(f, &field.doc)?;
                }
                write_attributes(f, &field.attributes)?;
                write!(f, "{}", field.key)?;
                if field.optional {
                    f.write_str("?")?;
                }
                write!(f, ": {}", field.ty)
            }
            StructField::Spread(spread) => {
                write_attributes(f, &spread.attributes)?;
                write!(f, "...{}", spread.ty)
            }
        }
    }
}

impl fmt::Display for EnumVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.doc.is_some() {
            f.write_str("\n")?;
            write_doc(f, &self.doc)?;
        }
        write_attributes(f, &self.attributes)?;
        write!(f, "{} = {}", self.name, self.value)
    }
}

fn write_range_suffix(f: &mut fmt::Formatter<'_>, range: &Option<Range>) -> fmt::Result {
    if let Some(range) = range {
        write!(f, " @ {range}")?;
    }
    Ok(())
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_attributes(f, &self.attributes)?;
        match &self.kind {
            TypeExprKind::Any => f.write_str("any"),
            TypeExprKind::Unsafe => f.write_str("unsafe"),
            TypeExprKind::Boolean => f.write_str("boolean"),
            TypeExprKind::String { len_range } => {
                f.write_str("string")?;
                write_range_suffix(f, len_range)
            }
            TypeExprKind::LiteralBool(b) => write!(f, "{b}"),
            TypeExprKind::LiteralString(s) => write_quoted(f, s),
            TypeExprKind::LiteralNumber(n) => write!(f, "{n}"),
            TypeExprKind::Numeric { kind, value_range } => {
                write!(f, "{kind}")?;
                write_range_suffix(f, value_range)
            }
            TypeExprKind::PrimArray {
                kind,
                elem_range,
                len_range,
            } => {
                write!(f, "{kind}")?;
                write_range_suffix(f, elem_range)?;
                f.write_str("[]")?;
                write_range_suffix(f, len_range)
            }
            TypeExprKind::List { elem, len_range } => {
                write!(f, "[{elem}]")?;
                write_range_suffix(f, len_range)
            }
            TypeExprKind::Tuple { elems } => {
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
            TypeExprKind::Struct { fields } => {
                f.write_str("struct {")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {field}")?;
                }
                f.write_str(" }")
            }
            TypeExprKind::Enum { base, variants } => {
                write!(f, "enum ({base}) {{")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {variant}")?;
                }
                f.write_str(" }")
            }
            TypeExprKind::Reference { path, type_args } => {
                write!(f, "{path}")?;
                if !type_args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeExprKind::Dispatcher { registry, indices } => {
                write!(f, "{registry}")?;
                write_index_body(f, indices)
            }
            TypeExprKind::Union { members } => {
                if members.is_empty() {
                    return f.write_str("()");
                }
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" |")?;
                    }
                    write!(f, " {member}")?;
                }
                f.write_str(" )")
            }
            TypeExprKind::Indexed { base, indices } => {
                write!(f, "{base}")?;
                write_index_body(f, indices)
            }
        }
    }
}

fn write_index_body(f: &mut fmt::Formatter<'_>, indices: &[Index]) -> fmt::Result {
    f.write_str("[")?;
    for (i, index) in indices.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{index}")?;
    }
    f.write_str("]")
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_doc(f, &self.doc)?;
        write_attributes(f, &self.attributes)?;
        match &self.kind {
            ItemKind::Struct(def) => {
                write!(f, "struct {} {{", def.name)?;
                for (i, field) in def.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {field}")?;
                }
                f.write_str(" }")
            }
            ItemKind::Enum(def) => {
                write!(f, "enum ({}) {} {{", def.base, def.name)?;
                for (i, variant) in def.variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {variant}")?;
                }
                f.write_str(" }")
            }
            ItemKind::TypeAlias(alias) => {
                write!(f, "type {}", alias.name)?;
                if !alias.type_params.is_empty() {
                    write!(f, "<{}>", alias.type_params.join(", "))?;
                }
                write!(f, " = {}", alias.ty)
            }
            ItemKind::Use(stmt) => {
                write!(f, "use {}", stmt.path)?;
                if let Some(alias) = &stmt.alias {
                    write!(f, " as {alias}")?;
                }
                Ok(())
            }
            ItemKind::Inject(Injection::Struct { path, fields }) => {
                write!(f, "inject struct {path} {{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {field}")?;
                }
                f.write_str(" }")
            }
            ItemKind::Inject(Injection::Enum {
                path,
                base,
                variants,
            }) => {
                write!(f, "inject enum ({base}) {path} {{")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {variant}")?;
                }
                f.write_str(" }")
            }
            ItemKind::Dispatch(stmt) => {
                write!(f, "dispatch {}[", stmt.registry)?;
                for (i, key) in stmt.keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}")?;
                }
                f.write_str("]")?;
                if !stmt.type_params.is_empty() {
                    write!(f, "<{}>", stmt.type_params.join(", "))?;
                }
                write!(f, " to {}", stmt.target)
            }
        }
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
