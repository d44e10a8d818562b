use crate::ast::{
    Attribute, EnumBaseKind, EnumVariant, Injection, ItemKind, PathSegment, StaticKey, StructField,
    TypeExpr, TypePath,
};
use crate::error::{DiagnosticRecord, DiagnosticSink};
use crate::parser::Parser;
use crate::utils::get_line_and_column;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A fully qualified, root-anchored path naming a declaration. The root
/// itself is the empty segment list and prints as `::`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CanonicalPath {
    pub segments: Vec<String>,
}

impl CanonicalPath {
    #[must_use]
    pub fn root() -> Self {
        CanonicalPath::default()
    }

    #[must_use]
    pub fn from_segments(segments: Vec<String>) -> Self {
        CanonicalPath { segments }
    }

    /// Parses a `::`-separated textual path; a leading `::` is optional
    /// since canonical paths are always rooted.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        CanonicalPath {
            segments: text
                .trim_start_matches("::")
                .split("::")
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        CanonicalPath { segments }
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("::");
        }
        for segment in &self.segments {
            write!(f, "::{segment}")?;
        }
        Ok(())
    }
}

/// The per-file import map: alias (or last path segment) to canonical path.
pub type UseMap = HashMap<String, CanonicalPath>;

#[derive(Debug, Clone)]
pub enum DeclarationBody {
    Struct {
        fields: Vec<StructField>,
    },
    Enum {
        base: EnumBaseKind,
        variants: Vec<EnumVariant>,
    },
    Alias {
        ty: TypeExpr,
    },
}

/// One named declaration in the symbol table, together with everything the
/// instantiation engine needs to evaluate its body in the right scope.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub path: CanonicalPath,
    /// The module the declaring file contributes to.
    pub module: CanonicalPath,
    /// Logical path of the declaring file, for diagnostics.
    pub file: String,
    pub load_index: usize,
    pub type_params: Vec<String>,
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub body: DeclarationBody,
    pub uses: Arc<UseMap>,
}

/// One registered dispatch case: the right-hand type of a `dispatch`
/// statement plus its source scope.
#[derive(Debug, Clone)]
pub struct DispatchCase {
    pub target: TypeExpr,
    pub type_params: Vec<String>,
    pub module: CanonicalPath,
    pub file: String,
    pub doc: Option<String>,
    pub attributes: Vec<Attribute>,
    pub uses: Arc<UseMap>,
}

/// The project-wide symbol table: declarations keyed by canonical path and
/// the global dispatch registries. Read-only once loading finishes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub declarations: IndexMap<CanonicalPath, Declaration>,
    pub dispatchers: IndexMap<String, IndexMap<StaticKey, DispatchCase>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        SymbolTable::default()
    }

    #[must_use]
    pub fn declaration(&self, path: &CanonicalPath) -> Option<&Declaration> {
        self.declarations.get(path)
    }

    #[must_use]
    pub fn registry(&self, name: &str) -> Option<&IndexMap<StaticKey, DispatchCase>> {
        self.dispatchers.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    SuperPastRoot,
}

/// Resolves a source path against a module scope and an import map, yielding
/// the canonical path. This is pure path arithmetic; whether a declaration
/// exists there is the caller's concern.
pub fn resolve_type_path(
    path: &TypePath,
    module: &CanonicalPath,
    uses: &UseMap,
) -> Result<CanonicalPath, PathError> {
    let mut segments: Vec<String>;
    let mut rest = path.segments.iter();
    if path.absolute {
        segments = Vec::new();
    } else {
        match path.segments.first() {
            Some(PathSegment::Ident(name)) if uses.contains_key(name) => {
                segments = uses[name].segments.clone();
                rest.next();
            }
            _ => segments = module.segments.clone(),
        }
    }
    for segment in rest {
        match segment {
            PathSegment::Super => {
                if segments.pop().is_none() {
                    return Err(PathError::SuperPastRoot);
                }
            }
            PathSegment::Ident(name) => segments.push(name.clone()),
        }
    }
    Ok(CanonicalPath { segments })
}

struct PendingInjection {
    injection: Injection,
    module: CanonicalPath,
    uses: Arc<UseMap>,
    file: String,
    span: (usize, usize),
}

/// Loads parsed files into a [`SymbolTable`].
///
/// Files are accepted in caller order; the earliest declaration of a
/// canonical path wins and later ones are diagnosed. Injections are queued
/// during loading and merged into their targets by [`Resolver::finish`].
pub struct Resolver {
    pub symbols: SymbolTable,
    injections: Vec<PendingInjection>,
    sink: Arc<DiagnosticSink>,
    load_counter: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Arc::new(DiagnosticSink::new()))
    }

    #[must_use]
    pub fn with_sink(sink: Arc<DiagnosticSink>) -> Self {
        Resolver {
            symbols: SymbolTable::new(),
            injections: Vec::new(),
            sink,
            load_counter: 0,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<DiagnosticSink> {
        &self.sink
    }

    /// Derives the module path a file contributes to: its folder chain plus
    /// the file stem, except that `mod` files collapse into the folder.
    #[must_use]
    pub fn module_path_of(logical_path: &str) -> CanonicalPath {
        let trimmed = logical_path
            .strip_suffix(".mcdoc")
            .unwrap_or(logical_path);
        let mut segments: Vec<String> = trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.last().map(String::as_str) == Some("mod") {
            segments.pop();
        }
        CanonicalPath { segments }
    }

    /// Parses one file and registers its declarations, imports, dispatch
    /// cases and injections. Parse failures abort only the broken form, not
    /// the file.
    pub fn load_file(&mut self, logical_path: &str, source: &str) {
        let module = Self::module_path_of(logical_path);
        let file = logical_path.to_string();

        let mut parser = Parser::new_with_name(source, file.clone());
        let ast = parser.parse_file();
        for err in parser.take_errors() {
            let span = err.span();
            let (line, column) = get_line_and_column(source, span.0);
            self.sink.push(DiagnosticRecord::error(
                &file,
                span,
                err.code_str(),
                format!("{err} (at {line}:{column})"),
            ));
        }

        // Imports first: references anywhere in the file may go through them.
        let mut uses = UseMap::new();
        for item in &ast.items {
            let ItemKind::Use(stmt) = &item.kind else {
                continue;
            };
            match resolve_type_path(&stmt.path, &module, &UseMap::new()) {
                Ok(canonical) => {
                    let alias = stmt
                        .alias
                        .clone()
                        .or_else(|| stmt.path.last_ident().map(str::to_string));
                    match alias {
                        Some(alias) => {
                            uses.insert(alias, canonical);
                        }
                        None => self.sink.push(DiagnosticRecord::warning(
                            &file,
                            (item.pos_start, item.pos_end - item.pos_start),
                            "use-missing-alias",
                            format!(
                                "`use {}` ends in `super` and has no `as` alias; import ignored",
                                stmt.path
                            ),
                        )),
                    }
                }
                Err(PathError::SuperPastRoot) => self.sink.push(DiagnosticRecord::error(
                    &file,
                    (item.pos_start, item.pos_end - item.pos_start),
                    "super-past-root",
                    format!("`use {}` walks above the module root", stmt.path),
                )),
            }
        }
        let uses = Arc::new(uses);

        for item in ast.items {
            let span = (item.pos_start, item.pos_end - item.pos_start);
            match item.kind {
                ItemKind::Use(_) => {}
                ItemKind::Struct(def) => self.register(
                    module.child(&def.name),
                    &module,
                    &file,
                    span,
                    Vec::new(),
                    item.doc,
                    item.attributes,
                    DeclarationBody::Struct { fields: def.fields },
                    &uses,
                ),
                ItemKind::Enum(def) => self.register(
                    module.child(&def.name),
                    &module,
                    &file,
                    span,
                    Vec::new(),
                    item.doc,
                    item.attributes,
                    DeclarationBody::Enum {
                        base: def.base,
                        variants: def.variants,
                    },
                    &uses,
                ),
                ItemKind::TypeAlias(alias) => self.register(
                    module.child(&alias.name),
                    &module,
                    &file,
                    span,
                    alias.type_params,
                    item.doc,
                    item.attributes,
                    DeclarationBody::Alias { ty: alias.ty },
                    &uses,
                ),
                ItemKind::Inject(injection) => self.injections.push(PendingInjection {
                    injection,
                    module: module.clone(),
                    uses: Arc::clone(&uses),
                    file: file.clone(),
                    span,
                }),
                ItemKind::Dispatch(stmt) => {
                    let registry = self
                        .symbols
                        .dispatchers
                        .entry(stmt.registry.to_string())
                        .or_default();
                    for key in stmt.keys {
                        if registry.contains_key(&key) {
                            self.sink.push(DiagnosticRecord::warning(
                                &file,
                                span,
                                "duplicate-dispatch-key",
                                format!(
                                    "dispatch key `{key}` is already registered for `{}`; keeping the earliest",
                                    stmt.registry
                                ),
                            ));
                            continue;
                        }
                        registry.insert(
                            key,
                            DispatchCase {
                                target: stmt.target.clone(),
                                type_params: stmt.type_params.clone(),
                                module: module.clone(),
                                file: file.clone(),
                                doc: item.doc.clone(),
                                attributes: item.attributes.clone(),
                                uses: Arc::clone(&uses),
                            },
                        );
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        &mut self,
        path: CanonicalPath,
        module: &CanonicalPath,
        file: &str,
        span: (usize, usize),
        type_params: Vec<String>,
        doc: Option<String>,
        attributes: Vec<Attribute>,
        body: DeclarationBody,
        uses: &Arc<UseMap>,
    ) {
        if let Some(existing) = self.symbols.declarations.get(&path) {
            self.sink.push(DiagnosticRecord::warning(
                file,
                span,
                "duplicate-declaration",
                format!(
                    "`{path}` is already declared in `{}`; this declaration is ignored",
                    existing.file
                ),
            ));
            return;
        }
        let load_index = self.load_counter;
        self.load_counter += 1;
        self.symbols.declarations.insert(
            path.clone(),
            Declaration {
                path,
                module: module.clone(),
                file: file.to_string(),
                load_index,
                type_params,
                doc,
                attributes,
                body,
                uses: Arc::clone(uses),
            },
        );
    }

    /// Applies the queued injections. Must be called after the last
    /// [`Resolver::load_file`]; injections merge in queue order regardless of
    /// where the target was declared.
    pub fn finish(&mut self) {
        for pending in std::mem::take(&mut self.injections) {
            let target = match resolve_type_path(
                match &pending.injection {
                    Injection::Struct { path, .. } | Injection::Enum { path, .. } => path,
                },
                &pending.module,
                &pending.uses,
            ) {
                Ok(target) => target,
                Err(PathError::SuperPastRoot) => {
                    self.sink.push(DiagnosticRecord::error(
                        &pending.file,
                        pending.span,
                        "super-past-root",
                        "injection path walks above the module root".to_string(),
                    ));
                    continue;
                }
            };
            let Some(decl) = self.symbols.declarations.get_mut(&target) else {
                self.sink.push(DiagnosticRecord::error(
                    &pending.file,
                    pending.span,
                    "unknown-path",
                    format!("cannot inject into `{target}`: no such declaration"),
                ));
                continue;
            };
            match (pending.injection, &mut decl.body) {
                (
                    Injection::Struct { fields, .. },
                    DeclarationBody::Struct {
                        fields: existing, ..
                    },
                ) => merge_struct_fields(existing, fields),
                (
                    Injection::Enum { variants, .. },
                    DeclarationBody::Enum {
                        variants: existing, ..
                    },
                ) => merge_enum_variants(existing, variants),
                _ => self.sink.push(DiagnosticRecord::warning(
                    &pending.file,
                    pending.span,
                    "injection-kind-mismatch",
                    format!("`{target}` is not the kind of declaration this injection targets"),
                )),
            }
        }
    }
}

/// Merges additional fields into a struct body. A field whose literal key
/// matches an existing one replaces it at the original index; everything
/// else is appended in order.
pub fn merge_struct_fields(existing: &mut Vec<StructField>, additions: Vec<StructField>) {
    for addition in additions {
        let key_text = match &addition {
            StructField::Named(field) => field.key.text().map(str::to_string),
            StructField::Spread(_) => None,
        };
        let slot = key_text.and_then(|key| {
            existing.iter().position(|f| {
                matches!(f, StructField::Named(named) if named.key.text() == Some(key.as_str()))
            })
        });
        match slot {
            Some(index) => existing[index] = addition,
            None => existing.push(addition),
        }
    }
}

/// Same replacement rule for enum variants, keyed by variant name.
pub fn merge_enum_variants(existing: &mut Vec<EnumVariant>, additions: Vec<EnumVariant>) {
    for addition in additions {
        match existing.iter().position(|v| v.name == addition.name) {
            Some(index) => existing[index] = addition,
            None => existing.push(addition),
        }
    }
}
