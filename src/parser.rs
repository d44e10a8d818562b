use crate::ast::*;
use crate::error::{McdocError, ParserError};
use crate::lexer::{Keyword, Lexer, Token, TokenType};
use miette::NamedSource;
use std::sync::Arc;

/// A recursive descent parser for mcdoc source files.
///
/// The parser is whitespace- and comment-tolerant (those tokens are filtered
/// out up front; doc comments are kept because they attach to the following
/// form). Errors inside one top-level form do not abort the file: the parser
/// records the error, skips ahead to the next `struct`/`enum`/`type`/`use`/
/// `inject`/`dispatch` keyword, and keeps going, so a file always yields the
/// forms that could be recovered.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
    errors: Vec<McdocError>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.mcdoc".to_string())
    }

    #[must_use]
    pub fn new_with_name(source_text: &'a str, file_name: String) -> Self {
        let source = Arc::new(NamedSource::new(file_name, source_text.to_string()));
        let mut lexer = Lexer::new(source_text);
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();
        let errors = lexer
            .take_errors()
            .into_iter()
            .map(McdocError::Lex)
            .collect();

        Self {
            source,
            tokens,
            position: 0,
            source_text,
            errors,
        }
    }

    /// The lexical and syntactic errors collected so far, in source order.
    #[must_use]
    pub fn errors(&self) -> &[McdocError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<McdocError> {
        std::mem::take(&mut self.errors)
    }

    // === Main Parsing Methods ===

    /// File ::= { Prelim TopLevelForm }
    ///
    /// Never fails: unparseable forms are skipped with panic-mode recovery
    /// and reported through [`Parser::errors`].
    pub fn parse_file(&mut self) -> SourceFile {
        let mut items = Vec::new();
        loop {
            let (doc, attributes, prelim_start) = match self.parse_prelim() {
                Ok(prelim) => prelim,
                Err(err) => {
                    self.errors.push(err);
                    self.recover_to_next_form();
                    continue;
                }
            };
            if self.check(TokenType::Eof) {
                // Trailing doc comments or attributes with nothing to
                // attach to are dropped as trivia.
                break;
            }
            let pos_start = prelim_start.unwrap_or_else(|| self.current_start());
            match self.parse_item_kind() {
                Ok(kind) => items.push(Item {
                    kind,
                    doc,
                    attributes,
                    pos_start,
                    pos_end: self.previous_end(),
                }),
                Err(err) => {
                    self.errors.push(err);
                    self.recover_to_next_form();
                }
            }
        }
        SourceFile { items }
    }

    fn recover_to_next_form(&mut self) {
        self.advance();
        while let Ok(token) = self.current_token() {
            match token.ttype {
                TokenType::Eof
                | TokenType::Keyword(
                    Keyword::Struct
                    | Keyword::Enum
                    | Keyword::Type
                    | Keyword::Use
                    | Keyword::Inject
                    | Keyword::Dispatch,
                ) => break,
                _ => self.advance(),
            }
        }
    }

    /// Prelim ::= { DocComment | Attribute }
    fn parse_prelim(
        &mut self,
    ) -> Result<(Option<String>, Vec<Attribute>, Option<usize>), McdocError> {
        let mut doc_lines: Vec<String> = Vec::new();
        let mut attributes = Vec::new();
        let mut start: Option<usize> = None;
        loop {
            let token = match self.current_token() {
                Ok(token) => token,
                Err(_) => break,
            };
            match &token.ttype {
                TokenType::DocComment(text) => {
                    start.get_or_insert(token.pos_start);
                    doc_lines.push(text.clone());
                    self.advance();
                }
                TokenType::Hash => {
                    start.get_or_insert(token.pos_start);
                    attributes.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }
        let doc = if doc_lines.is_empty() {
            None
        } else {
            Some(doc_lines.join("\n"))
        };
        Ok((doc, attributes, start))
    }

    /// TopLevelForm ::= StructDef | EnumDef | TypeAlias | UseStmt
    ///                | Injection | DispatchStmt
    fn parse_item_kind(&mut self) -> Result<ItemKind, McdocError> {
        let token = self.current_token()?;
        match token.ttype {
            TokenType::Keyword(Keyword::Struct) => {
                self.advance();
                let name = self.parse_decl_name()?;
                let fields = self.parse_struct_body()?;
                Ok(ItemKind::Struct(StructDef { name, fields }))
            }
            TokenType::Keyword(Keyword::Enum) => {
                self.advance();
                self.expect(TokenType::LParen)?;
                let base = self.parse_enum_base()?;
                self.expect(TokenType::RParen)?;
                let name = self.parse_decl_name()?;
                let variants = self.parse_enum_body()?;
                Ok(ItemKind::Enum(EnumDef {
                    name,
                    base,
                    variants,
                }))
            }
            TokenType::Keyword(Keyword::Type) => {
                self.advance();
                let name = self.parse_decl_name()?;
                let type_params = self.parse_type_params()?;
                self.expect(TokenType::Equals)?;
                let ty = self.parse_type()?;
                Ok(ItemKind::TypeAlias(TypeAlias {
                    name,
                    type_params,
                    ty,
                }))
            }
            TokenType::Keyword(Keyword::Use) => {
                self.advance();
                let path = self.parse_path()?;
                let alias = if self.match_keyword(Keyword::As) {
                    Some(self.parse_decl_name()?)
                } else {
                    None
                };
                Ok(ItemKind::Use(UseStmt { path, alias }))
            }
            TokenType::Keyword(Keyword::Inject) => {
                self.advance();
                self.parse_injection()
            }
            TokenType::Keyword(Keyword::Dispatch) => {
                self.advance();
                self.parse_dispatch()
            }
            _ => self.err_unexpected("a top-level declaration"),
        }
    }

    /// Injection ::= "inject" "struct" Path StructBody
    ///             | "inject" "enum" "(" EnumBase ")" Path EnumBody
    fn parse_injection(&mut self) -> Result<ItemKind, McdocError> {
        if self.match_keyword(Keyword::Struct) {
            let path = self.parse_path()?;
            let fields = self.parse_struct_body()?;
            Ok(ItemKind::Inject(Injection::Struct { path, fields }))
        } else if self.match_keyword(Keyword::Enum) {
            self.expect(TokenType::LParen)?;
            let base = self.parse_enum_base()?;
            self.expect(TokenType::RParen)?;
            let path = self.parse_path()?;
            let variants = self.parse_enum_body()?;
            Ok(ItemKind::Inject(Injection::Enum {
                path,
                base,
                variants,
            }))
        } else {
            self.err_unexpected("'struct' or 'enum' after 'inject'")
        }
    }

    /// DispatchStmt ::= "dispatch" RES_LOC "[" StaticKey { "," StaticKey } "]"
    ///                  TypeParams? "to" Type
    fn parse_dispatch(&mut self) -> Result<ItemKind, McdocError> {
        let token = self.current_token()?.clone();
        let registry = match token.ttype {
            TokenType::Resource(registry) => {
                self.advance();
                registry
            }
            _ => return self.err_unexpected("a registry resource location"),
        };
        self.expect(TokenType::LBracket)?;
        let mut keys = Vec::new();
        if !self.check(TokenType::RBracket) {
            loop {
                let index_start = self.current_start();
                match self.parse_index()? {
                    Index::Static(StaticKey::Fallback) => {
                        return Err(ParserError::FallbackOnDispatchLhs {
                            src: (*self.source).clone(),
                            span: (index_start, self.previous_end() - index_start).into(),
                        }
                        .into());
                    }
                    Index::Static(key) => keys.push(key),
                    Index::Dynamic(_) => {
                        return Err(ParserError::DynamicIndexInDispatch {
                            src: (*self.source).clone(),
                            span: (index_start, self.previous_end() - index_start).into(),
                        }
                        .into());
                    }
                }
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBracket) {
                    break;
                }
            }
        }
        self.expect(TokenType::RBracket)?;
        let type_params = self.parse_type_params()?;
        self.expect_keyword(Keyword::To)?;
        let target = self.parse_type()?;
        Ok(ItemKind::Dispatch(DispatchStmt {
            registry,
            keys,
            type_params,
            target,
        }))
    }

    // === Types ===

    /// Type ::= { Attribute } UnattributedType { IndexBody | TypeArgBlock }
    ///
    /// Suffix bodies fold left-associatively; an index body only attaches to
    /// references, dispatchers, structs and already-indexed types.
    pub fn parse_type(&mut self) -> Result<TypeExpr, McdocError> {
        let pos_start = self.current_start();
        let attributes = self.parse_attribute_list()?;
        let mut ty = self.parse_unattributed_type()?;
        loop {
            if self.check(TokenType::LBracket) && Self::is_indexable(&ty.kind) {
                let indices = self.parse_index_body()?;
                let pos_end = self.previous_end();
                ty = TypeExpr {
                    kind: TypeExprKind::Indexed {
                        base: Box::new(ty),
                        indices,
                    },
                    attributes: Vec::new(),
                    pos_start,
                    pos_end,
                };
            } else if self.check(TokenType::Lt) && Self::takes_type_args(&ty.kind) {
                let args = self.parse_type_args()?;
                if let TypeExprKind::Reference { type_args, .. } = &mut ty.kind {
                    *type_args = args;
                }
            } else {
                break;
            }
        }
        ty.attributes = attributes;
        ty.pos_start = pos_start;
        ty.pos_end = self.previous_end();
        Ok(ty)
    }

    fn is_indexable(kind: &TypeExprKind) -> bool {
        matches!(
            kind,
            TypeExprKind::Reference { .. }
                | TypeExprKind::Dispatcher { .. }
                | TypeExprKind::Struct { .. }
                | TypeExprKind::Indexed { .. }
        )
    }

    fn takes_type_args(kind: &TypeExprKind) -> bool {
        matches!(
            kind,
            TypeExprKind::Reference { type_args, .. } if type_args.is_empty()
        )
    }

    fn parse_unattributed_type(&mut self) -> Result<TypeExpr, McdocError> {
        let token = self.current_token()?.clone();
        let pos_start = token.pos_start;
        let kind = match token.ttype {
            TokenType::Keyword(Keyword::Any) => {
                self.advance();
                TypeExprKind::Any
            }
            TokenType::Keyword(Keyword::Unsafe) => {
                self.advance();
                TypeExprKind::Unsafe
            }
            TokenType::Keyword(Keyword::Boolean) => {
                self.advance();
                TypeExprKind::Boolean
            }
            TokenType::Keyword(Keyword::String) => {
                self.advance();
                TypeExprKind::String {
                    len_range: self.parse_optional_range()?,
                }
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance();
                TypeExprKind::LiteralBool(true)
            }
            TokenType::Keyword(Keyword::False) => {
                self.advance();
                TypeExprKind::LiteralBool(false)
            }
            TokenType::String(s) => {
                self.advance();
                TypeExprKind::LiteralString(s)
            }
            TokenType::Integer(i) => {
                self.advance();
                TypeExprKind::LiteralNumber(TypedNumber {
                    value: NumberValue::Int(i),
                    kind: NumericKind::Int,
                })
            }
            TokenType::Float(x) => {
                self.advance();
                TypeExprKind::LiteralNumber(TypedNumber {
                    value: NumberValue::Float(x),
                    kind: NumericKind::Double,
                })
            }
            TokenType::TypedNumber(n) => {
                self.advance();
                TypeExprKind::LiteralNumber(n)
            }
            TokenType::Keyword(
                kw @ (Keyword::Byte
                | Keyword::Short
                | Keyword::Int
                | Keyword::Long
                | Keyword::Float
                | Keyword::Double),
            ) => {
                self.advance();
                self.parse_numeric_rest(kw)?
            }
            TokenType::LBracket => self.parse_list_or_tuple()?,
            TokenType::LParen => self.parse_union()?,
            TokenType::Keyword(Keyword::Struct) => {
                self.advance();
                TypeExprKind::Struct {
                    fields: self.parse_struct_body()?,
                }
            }
            TokenType::Keyword(Keyword::Enum) => {
                self.advance();
                self.expect(TokenType::LParen)?;
                let base = self.parse_enum_base()?;
                self.expect(TokenType::RParen)?;
                let variants = self.parse_enum_body()?;
                TypeExprKind::Enum { base, variants }
            }
            TokenType::Resource(registry) => {
                self.advance();
                if !self.check(TokenType::LBracket) {
                    return self.err_unexpected("an index body after the dispatcher registry");
                }
                let indices = self.parse_index_body()?;
                TypeExprKind::Dispatcher { registry, indices }
            }
            TokenType::Identifier(_)
            | TokenType::DoubleColon
            | TokenType::Keyword(Keyword::Super) => TypeExprKind::Reference {
                path: self.parse_path()?,
                type_args: Vec::new(),
            },
            _ => return self.err_unexpected("a type"),
        };
        Ok(TypeExpr {
            kind,
            attributes: Vec::new(),
            pos_start,
            pos_end: self.previous_end(),
        })
    }

    /// NumericType ::= NumericKind ValueRange?
    /// PrimArrayType ::= ("byte" | "int" | "long") ValueRange? "[]" LengthRange?
    fn parse_numeric_rest(&mut self, kw: Keyword) -> Result<TypeExprKind, McdocError> {
        let kind = match kw {
            Keyword::Byte => NumericKind::Byte,
            Keyword::Short => NumericKind::Short,
            Keyword::Int => NumericKind::Int,
            Keyword::Long => NumericKind::Long,
            Keyword::Float => NumericKind::Float,
            _ => NumericKind::Double,
        };
        let value_range = self.parse_optional_range()?;
        let array_kind = match kind {
            NumericKind::Byte => Some(PrimArrayKind::Byte),
            NumericKind::Int => Some(PrimArrayKind::Int),
            NumericKind::Long => Some(PrimArrayKind::Long),
            _ => None,
        };
        if let Some(array_kind) = array_kind {
            if self.check(TokenType::LBracket) && self.peek_is(TokenType::RBracket) {
                self.advance();
                self.advance();
                let len_range = self.parse_optional_range()?;
                return Ok(TypeExprKind::PrimArray {
                    kind: array_kind,
                    elem_range: value_range,
                    len_range,
                });
            }
        }
        Ok(TypeExprKind::Numeric { kind, value_range })
    }

    /// ListType ::= "[" Type "]" LengthRange?
    /// TupleType ::= "[" Type "," [ Type { "," Type } [ "," ] ] "]"
    ///
    /// The trailing comma in `[T,]` is what makes a one-element tuple; its
    /// absence makes a list.
    fn parse_list_or_tuple(&mut self) -> Result<TypeExprKind, McdocError> {
        self.expect(TokenType::LBracket)?;
        let first = self.parse_type()?;
        if self.match_token(TokenType::Comma) {
            let mut elems = vec![first];
            if !self.check(TokenType::RBracket) {
                loop {
                    elems.push(self.parse_type()?);
                    if !self.match_token(TokenType::Comma) {
                        break;
                    }
                    if self.check(TokenType::RBracket) {
                        break;
                    }
                }
            }
            self.expect(TokenType::RBracket)?;
            Ok(TypeExprKind::Tuple { elems })
        } else {
            self.expect(TokenType::RBracket)?;
            let len_range = self.parse_optional_range()?;
            Ok(TypeExprKind::List {
                elem: Box::new(first),
                len_range,
            })
        }
    }

    /// UnionType ::= "(" ")" | "(" Type { "|" Type } [ "|" ] ")"
    ///
    /// `()` is the empty union (the bottom type). A parenthesized single
    /// type without any `|` is rejected.
    fn parse_union(&mut self) -> Result<TypeExprKind, McdocError> {
        self.expect(TokenType::LParen)?;
        if self.match_token(TokenType::RParen) {
            return Ok(TypeExprKind::Union {
                members: Vec::new(),
            });
        }
        let first = self.parse_type()?;
        if !self.check(TokenType::Pipe) {
            return self.err_unexpected("'|' (a union needs the alternative bar form)");
        }
        let mut members = vec![first];
        while self.match_token(TokenType::Pipe) {
            if self.check(TokenType::RParen) {
                break;
            }
            members.push(self.parse_type()?);
        }
        self.expect(TokenType::RParen)?;
        Ok(TypeExprKind::Union { members })
    }

    /// TypeArgBlock ::= "<" Type { "," Type } ">"
    fn parse_type_args(&mut self) -> Result<Vec<TypeExpr>, McdocError> {
        self.expect(TokenType::Lt)?;
        let mut args = vec![self.parse_type()?];
        while self.match_token(TokenType::Comma) {
            if self.check(TokenType::Gt) {
                break;
            }
            args.push(self.parse_type()?);
        }
        self.expect(TokenType::Gt)?;
        Ok(args)
    }

    /// TypeParams ::= [ "<" IDENT { "," IDENT } ">" ]
    fn parse_type_params(&mut self) -> Result<Vec<String>, McdocError> {
        if !self.match_token(TokenType::Lt) {
            return Ok(Vec::new());
        }
        let mut params = vec![self.parse_decl_name()?];
        while self.match_token(TokenType::Comma) {
            if self.check(TokenType::Gt) {
                break;
            }
            params.push(self.parse_decl_name()?);
        }
        self.expect(TokenType::Gt)?;
        Ok(params)
    }

    // === Indices ===

    /// IndexBody ::= "[" Index { "," Index } [ "," ] "]"
    fn parse_index_body(&mut self) -> Result<Vec<Index>, McdocError> {
        self.expect(TokenType::LBracket)?;
        let mut indices = vec![self.parse_index()?];
        while self.match_token(TokenType::Comma) {
            if self.check(TokenType::RBracket) {
                break;
            }
            indices.push(self.parse_index()?);
        }
        self.expect(TokenType::RBracket)?;
        Ok(indices)
    }

    /// Index ::= StaticKey | "[" Accessor "]"
    fn parse_index(&mut self) -> Result<Index, McdocError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::LBracket => {
                self.advance();
                let mut keys = vec![self.parse_accessor_key()?];
                while self.match_token(TokenType::Dot) {
                    keys.push(self.parse_accessor_key()?);
                }
                self.expect(TokenType::RBracket)?;
                Ok(Index::Dynamic(keys))
            }
            TokenType::Special(name) => {
                self.advance();
                match name.as_str() {
                    "fallback" => Ok(Index::Static(StaticKey::Fallback)),
                    "none" => Ok(Index::Static(StaticKey::None)),
                    "unknown" => Ok(Index::Static(StaticKey::Unknown)),
                    _ => self.err_unexpected("%fallback, %none or %unknown"),
                }
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Index::Static(StaticKey::Ident(name)))
            }
            TokenType::Keyword(kw) => {
                self.advance();
                Ok(Index::Static(StaticKey::Ident(kw.as_str().to_string())))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Index::Static(StaticKey::String(s)))
            }
            TokenType::Resource(r) => {
                self.advance();
                Ok(Index::Static(StaticKey::Resource(r)))
            }
            _ => self.err_unexpected("an index"),
        }
    }

    /// AccessorKey ::= "%key" | "%parent" | IDENT | STRING
    fn parse_accessor_key(&mut self) -> Result<AccessorKey, McdocError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::Special(name) => {
                self.advance();
                match name.as_str() {
                    "key" => Ok(AccessorKey::Key),
                    "parent" => Ok(AccessorKey::Parent),
                    _ => self.err_unexpected("%key or %parent"),
                }
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(AccessorKey::Ident(name))
            }
            TokenType::Keyword(kw) => {
                self.advance();
                Ok(AccessorKey::Ident(kw.as_str().to_string()))
            }
            TokenType::String(s) => {
                self.advance();
                Ok(AccessorKey::String(s))
            }
            _ => self.err_unexpected("an accessor key"),
        }
    }

    // === Structs and enums ===

    /// StructBody ::= "{" [ StructField { "," StructField } [ "," ] ] "}"
    fn parse_struct_body(&mut self) -> Result<Vec<StructField>, McdocError> {
        self.expect(TokenType::LBrace)?;
        let mut fields = Vec::new();
        if !self.check(TokenType::RBrace) {
            loop {
                fields.push(self.parse_struct_field()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBrace) {
                    break;
                }
            }
        }
        self.expect(TokenType::RBrace)?;
        Ok(fields)
    }

    /// StructField ::= Prelim ( Key "?"? ":" Type | "..." Type )
    /// Key ::= IDENT | STRING | "[" Type "]"
    fn parse_struct_field(&mut self) -> Result<StructField, McdocError> {
        let (doc, attributes, _) = self.parse_prelim()?;
        if self.match_token(TokenType::Spread) {
            let ty = self.parse_type()?;
            return Ok(StructField::Spread(SpreadField { ty, attributes }));
        }
        let token = self.current_token()?.clone();
        let key = match token.ttype {
            TokenType::Identifier(name) => {
                self.advance();
                FieldKey::Ident(name)
            }
            // Data fields are frequently named after reserved words
            // ("type", "float", ...); those stay valid keys.
            TokenType::Keyword(kw) => {
                self.advance();
                FieldKey::Ident(kw.as_str().to_string())
            }
            TokenType::String(s) => {
                self.advance();
                FieldKey::String(s)
            }
            TokenType::LBracket => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(TokenType::RBracket)?;
                FieldKey::Computed(Box::new(ty))
            }
            _ => return self.err_unexpected("a field key"),
        };
        let optional = self.match_token(TokenType::Question);
        self.expect(TokenType::Colon)?;
        let ty = self.parse_type()?;
        Ok(StructField::Named(NamedField {
            key,
            optional,
            ty,
            attributes,
            doc,
        }))
    }

    /// EnumBody ::= "{" [ EnumVariant { "," EnumVariant } [ "," ] ] "}"
    fn parse_enum_body(&mut self) -> Result<Vec<EnumVariant>, McdocError> {
        self.expect(TokenType::LBrace)?;
        let mut variants = Vec::new();
        if !self.check(TokenType::RBrace) {
            loop {
                variants.push(self.parse_enum_variant()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBrace) {
                    break;
                }
            }
        }
        self.expect(TokenType::RBrace)?;
        Ok(variants)
    }

    /// EnumVariant ::= Prelim IDENT "=" ( Number | String )
    fn parse_enum_variant(&mut self) -> Result<EnumVariant, McdocError> {
        let (doc, attributes, _) = self.parse_prelim()?;
        let name = self.parse_decl_name()?;
        self.expect(TokenType::Equals)?;
        let token = self.current_token()?.clone();
        let value = match token.ttype {
            TokenType::Integer(i) => {
                self.advance();
                EnumValue::Number(TypedNumber {
                    value: NumberValue::Int(i),
                    kind: NumericKind::Int,
                })
            }
            TokenType::Float(x) => {
                self.advance();
                EnumValue::Number(TypedNumber {
                    value: NumberValue::Float(x),
                    kind: NumericKind::Double,
                })
            }
            TokenType::TypedNumber(n) => {
                self.advance();
                EnumValue::Number(n)
            }
            TokenType::String(s) => {
                self.advance();
                EnumValue::String(s)
            }
            _ => return self.err_unexpected("a literal enum value"),
        };
        Ok(EnumVariant {
            name,
            value,
            attributes,
            doc,
        })
    }

    fn parse_enum_base(&mut self) -> Result<EnumBaseKind, McdocError> {
        let token = self.current_token()?;
        let base = match token.ttype {
            TokenType::Keyword(Keyword::Byte) => EnumBaseKind::Byte,
            TokenType::Keyword(Keyword::Short) => EnumBaseKind::Short,
            TokenType::Keyword(Keyword::Int) => EnumBaseKind::Int,
            TokenType::Keyword(Keyword::Long) => EnumBaseKind::Long,
            TokenType::Keyword(Keyword::Float) => EnumBaseKind::Float,
            TokenType::Keyword(Keyword::Double) => EnumBaseKind::Double,
            TokenType::Keyword(Keyword::String) => EnumBaseKind::String,
            _ => return self.err_unexpected("an enum base kind"),
        };
        self.advance();
        Ok(base)
    }

    // === Attributes ===

    /// Attribute ::= "#" "[" IDENT ( "=" Type | TreeValue )? "]"
    fn parse_attribute(&mut self) -> Result<Attribute, McdocError> {
        self.expect(TokenType::Hash)?;
        self.expect(TokenType::LBracket)?;
        let name = self.parse_name_like()?;
        let token = self.current_token()?;
        let value = match token.ttype {
            TokenType::RBracket => None,
            TokenType::Equals => {
                self.advance();
                Some(AttributeValue::Type(Box::new(self.parse_type()?)))
            }
            TokenType::LParen | TokenType::LBracket | TokenType::LBrace => {
                Some(AttributeValue::Tree(self.parse_attribute_tree()?))
            }
            _ => return self.err_unexpected("']', '=' or an attribute tree"),
        };
        self.expect(TokenType::RBracket)?;
        Ok(Attribute { name, value })
    }

    fn parse_attribute_list(&mut self) -> Result<Vec<Attribute>, McdocError> {
        let mut attributes = Vec::new();
        while self.check(TokenType::Hash) {
            attributes.push(self.parse_attribute()?);
        }
        Ok(attributes)
    }

    /// TreeValue ::= "(" TreeBody ")" | "[" TreeBody "]" | "{" TreeBody "}"
    /// TreeBody ::= [ Value { "," Value } ] [ NamedValue { "," NamedValue } ] [ "," ]
    fn parse_attribute_tree(&mut self) -> Result<AttributeTree, McdocError> {
        let token = self.current_token()?;
        let (delimiter, closing) = match token.ttype {
            TokenType::LParen => (TreeDelimiter::Paren, TokenType::RParen),
            TokenType::LBracket => (TreeDelimiter::Square, TokenType::RBracket),
            TokenType::LBrace => (TreeDelimiter::Curly, TokenType::RBrace),
            _ => return self.err_unexpected("an attribute tree"),
        };
        self.advance();
        let mut positional = Vec::new();
        let mut named = Vec::new();
        if !self.check(closing.clone()) {
            loop {
                if let Some(name) = self.peek_name_like() {
                    if self.peek_is(TokenType::Equals) {
                        self.advance();
                        self.advance();
                        named.push((name, AttributeValue::Type(Box::new(self.parse_type()?))));
                    } else if self.peek_is(TokenType::LParen)
                        || self.peek_is(TokenType::LBracket)
                        || self.peek_is(TokenType::LBrace)
                    {
                        self.advance();
                        named.push((name, AttributeValue::Tree(self.parse_attribute_tree()?)));
                    } else {
                        positional.push(AttributeValue::Type(Box::new(self.parse_type()?)));
                    }
                } else if self.check(TokenType::LBrace) {
                    positional.push(AttributeValue::Tree(self.parse_attribute_tree()?));
                } else {
                    positional.push(AttributeValue::Type(Box::new(self.parse_type()?)));
                }
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(closing.clone()) {
                    break;
                }
            }
        }
        self.expect(closing)?;
        Ok(AttributeTree {
            delimiter,
            positional,
            named,
        })
    }

    // === Names and paths ===

    /// A declaration name: a plain identifier. Reserved words are diagnosed
    /// and the surrounding form is dropped by the caller.
    fn parse_decl_name(&mut self) -> Result<String, McdocError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            TokenType::Keyword(kw) => Err(ParserError::ReservedWord {
                src: (*self.source).clone(),
                span: (token.pos_start, token.pos_end - token.pos_start).into(),
                word: kw.as_str().to_string(),
            }
            .into()),
            _ => self.err_unexpected("an identifier"),
        }
    }

    /// A name in a position where reserved words are acceptable (attribute
    /// names, tree keys).
    fn parse_name_like(&mut self) -> Result<String, McdocError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            TokenType::Keyword(kw) => {
                self.advance();
                Ok(kw.as_str().to_string())
            }
            _ => self.err_unexpected("a name"),
        }
    }

    fn peek_name_like(&self) -> Option<String> {
        match self.current_token() {
            Ok(token) => match &token.ttype {
                TokenType::Identifier(name) => Some(name.clone()),
                TokenType::Keyword(kw) => Some(kw.as_str().to_string()),
                _ => None,
            },
            Err(_) => None,
        }
    }

    /// Path ::= "::"? PathSegment { "::" PathSegment }
    /// PathSegment ::= "super" | IDENT
    fn parse_path(&mut self) -> Result<TypePath, McdocError> {
        let absolute = self.match_token(TokenType::DoubleColon);
        let mut segments = vec![self.parse_path_segment()?];
        while self.match_token(TokenType::DoubleColon) {
            segments.push(self.parse_path_segment()?);
        }
        Ok(TypePath { absolute, segments })
    }

    fn parse_path_segment(&mut self) -> Result<PathSegment, McdocError> {
        let token = self.current_token()?.clone();
        match token.ttype {
            TokenType::Keyword(Keyword::Super) => {
                self.advance();
                Ok(PathSegment::Super)
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(PathSegment::Ident(name))
            }
            _ => self.err_unexpected("a path segment"),
        }
    }

    // === Ranges ===

    /// ValueRange ::= "@" Range
    fn parse_optional_range(&mut self) -> Result<Option<Range>, McdocError> {
        if !self.match_token(TokenType::At) {
            return Ok(None);
        }
        self.parse_range().map(Some)
    }

    /// Range ::= Number | Number? RangeSep Number?
    /// RangeSep ::= ".." | "..<" | "<.." | "<..<"
    fn parse_range(&mut self) -> Result<Range, McdocError> {
        let min = self.parse_range_bound();
        let separator = match self.current_token()?.ttype {
            TokenType::DotDot => Some((false, false)),
            TokenType::DotDotLt => Some((false, true)),
            TokenType::LtDotDot => Some((true, false)),
            TokenType::LtDotDotLt => Some((true, true)),
            _ => None,
        };
        match (min, separator) {
            (Some(min), None) => Ok(Range::exact(min)),
            (min, Some((exclusive_min, exclusive_max))) => {
                self.advance();
                let max = self.parse_range_bound();
                Ok(Range {
                    min,
                    max,
                    exclusive_min,
                    exclusive_max,
                })
            }
            (None, None) => self.err_unexpected("a range"),
        }
    }

    fn parse_range_bound(&mut self) -> Option<f64> {
        let value = match self.current_token() {
            Ok(token) => match &token.ttype {
                TokenType::Integer(i) => Some(*i as f64),
                TokenType::Float(x) => Some(*x),
                TokenType::TypedNumber(n) => Some(n.value.as_f64()),
                _ => None,
            },
            Err(_) => None,
        };
        if value.is_some() {
            self.advance();
        }
        value
    }

    // === Tokenizer Helper Methods ===

    fn current_token(&self) -> Result<&Token, McdocError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len().saturating_sub(1);
            ParserError::UnexpectedEof {
                src: (*self.source).clone(),
                span: (pos, 0).into(),
            }
            .into()
        })
    }

    fn current_start(&self) -> usize {
        match self.current_token() {
            Ok(token) => token.pos_start,
            Err(_) => self.source_text.len(),
        }
    }

    fn previous_end(&self) -> usize {
        if self.position == 0 {
            0
        } else {
            self.tokens
                .get(self.position - 1)
                .map_or(0, |t| t.pos_end)
        }
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<(), McdocError> {
        let token = self.current_token()?;
        if std::mem::discriminant(&token.ttype) == std::mem::discriminant(&expected) {
            self.advance();
            Ok(())
        } else {
            self.err_unexpected(&format!("{expected:?}"))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), McdocError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            self.err_unexpected(&format!("'{}'", keyword.as_str()))
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(
            self.current_token(),
            Ok(token) if token.ttype == TokenType::Keyword(keyword)
        )
    }

    fn peek_is(&self, ttype: TokenType) -> bool {
        if let Some(token) = self.tokens.get(self.position + 1) {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, McdocError> {
        let token = self.current_token()?;
        Err(ParserError::UnexpectedToken {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end.saturating_sub(token.pos_start)).into(),
            expected: expected.to_string(),
        }
        .into())
    }
}
