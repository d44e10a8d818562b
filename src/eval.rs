//! The type instantiation engine.
//!
//! Walks parsed type expressions and produces [`Type`]s: references are
//! resolved through the symbol table, generic arguments substituted,
//! indices applied to dispatchers and struct fields, unions simplified.
//! Containers capture their children lazily; spreads are resolved eagerly so
//! the struct shape is known up front.
//!
//! Expansion results are memoized per `(canonical path, type args)` and
//! `(registry, key)` under a single-flight discipline, and a visit stack
//! turns re-entered expansions into [`TypeKind::Handle`]s so recursive
//! schemas stay finite.
use crate::ast::{
    Attribute, AttributeTree, AttributeValue, Index, NamedField, PathSegment, ResourceLocation,
    SpreadField, StaticKey, StructField, TreeDelimiter, TypeExpr, TypeExprKind, TypePath,
};
use crate::error::{lock_recovering, DiagnosticRecord, DiagnosticSink};
use crate::resolver::{resolve_type_path, DispatchCase, PathError, SymbolTable};
use crate::simplify::{self, ValidatorProfile};
use crate::types::{Field, FieldName, LazyType, Type, TypeEnv, TypeKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

/// The distinguished result of a cancelled request. Not a diagnostic: the
/// caller asked the engine to stop, and it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("instantiation was cancelled")
    }
}

impl std::error::Error for Cancelled {}

pub type EvalResult<T = Type> = Result<T, Cancelled>;

/// Cooperative cancellation flag, checked before every node the engine
/// descends into.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Memoization for reference and dispatcher expansions.
///
/// Single-flight: the outer map lock only covers slot lookup; the per-key
/// lock serializes the actual computation. A thread that finds another
/// thread mid-computation receives an unexpanded [`TypeKind::Handle`]
/// instead of waiting, which rules out lock-order deadlocks between
/// mutually recursive keys.
#[derive(Debug, Default)]
pub struct InstCache {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<Type>>>>>,
}

impl InstCache {
    #[must_use]
    pub fn new() -> Self {
        InstCache::default()
    }

    fn get_or_compute(
        &self,
        key: &str,
        handle: impl FnOnce() -> Type,
        compute: impl FnOnce() -> EvalResult,
    ) -> EvalResult {
        let slot = {
            let mut slots = lock_recovering(&self.slots);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let mut guard = match slot.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Ok(handle()),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let value = compute()?;
        *guard = Some(value.clone());
        Ok(value)
    }
}

/// One instantiation context over a loaded symbol table.
pub struct TypeEngine<'a> {
    symbols: &'a SymbolTable,
    cache: &'a InstCache,
    sink: &'a DiagnosticSink,
    profile: &'a ValidatorProfile,
    cancel: CancelToken,
}

impl<'a> TypeEngine<'a> {
    #[must_use]
    pub fn new(
        symbols: &'a SymbolTable,
        cache: &'a InstCache,
        sink: &'a DiagnosticSink,
        profile: &'a ValidatorProfile,
        cancel: CancelToken,
    ) -> Self {
        TypeEngine {
            symbols,
            cache,
            sink,
            profile,
            cancel,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &ValidatorProfile {
        self.profile
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Instantiates a type expression in the given environment.
    pub fn instantiate(&self, expr: &TypeExpr, env: &TypeEnv) -> EvalResult {
        let mut stack = Vec::new();
        self.eval(expr, env, &mut stack)
    }

    /// Forces a lazy container child.
    pub fn force(&self, lazy: &LazyType) -> EvalResult {
        self.instantiate(&lazy.expr, &lazy.env)
    }

    /// Resolves a cycle handle to its underlying type; other types pass
    /// through unchanged.
    pub fn force_type(&self, ty: &Type) -> EvalResult {
        match &ty.kind {
            TypeKind::Handle { target, .. } => {
                let mut forced = self.force(target)?;
                forced.attributes.extend(ty.attributes.iter().cloned());
                Ok(forced)
            }
            _ => Ok(ty.clone()),
        }
    }

    /// Instantiates a dispatcher lookup, as if `registry[keys...]` had been
    /// written as a type.
    pub fn dispatch(&self, registry: &ResourceLocation, keys: &[StaticKey]) -> EvalResult {
        let indices: Vec<Index> = keys.iter().cloned().map(Index::Static).collect();
        let expr = TypeExpr::new(TypeExprKind::Dispatcher {
            registry: registry.clone(),
            indices,
        });
        self.instantiate(&expr, &TypeEnv::root())
    }

    pub fn assignable(&self, a: &Type, b: &Type) -> EvalResult<bool> {
        simplify::assignable(self, a, b)
    }

    pub fn simplify(&self, ty: &Type) -> EvalResult {
        simplify::simplify(self, ty)
    }

    pub(crate) fn eval(
        &self,
        expr: &TypeExpr,
        env: &TypeEnv,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let attrs = expr.attributes.clone();
        let span = (expr.pos_start, expr.pos_end.saturating_sub(expr.pos_start));
        let kind = match &expr.kind {
            TypeExprKind::Any => TypeKind::Any,
            TypeExprKind::Unsafe => TypeKind::Unsafe,
            TypeExprKind::Boolean => TypeKind::Boolean,
            TypeExprKind::String { len_range } => TypeKind::String {
                len_range: *len_range,
            },
            TypeExprKind::LiteralBool(b) => TypeKind::LiteralBool(*b),
            TypeExprKind::LiteralString(s) => TypeKind::LiteralString(s.clone()),
            TypeExprKind::LiteralNumber(n) => TypeKind::LiteralNumber(*n),
            TypeExprKind::Numeric { kind, value_range } => TypeKind::Numeric {
                kind: *kind,
                value_range: *value_range,
            },
            TypeExprKind::PrimArray {
                kind,
                elem_range,
                len_range,
            } => TypeKind::PrimArray {
                kind: *kind,
                elem_range: *elem_range,
                len_range: *len_range,
            },
            TypeExprKind::Enum { base, variants } => TypeKind::Enum {
                base: *base,
                variants: variants.clone(),
            },
            TypeExprKind::List { elem, len_range } => TypeKind::List {
                elem: Box::new(LazyType::new((**elem).clone(), env.clone())),
                len_range: *len_range,
            },
            TypeExprKind::Tuple { elems } => TypeKind::Tuple {
                elems: elems
                    .iter()
                    .map(|e| LazyType::new(e.clone(), env.clone()))
                    .collect(),
            },
            TypeExprKind::Struct { fields } => {
                return self.eval_struct(fields, attrs, env, stack);
            }
            TypeExprKind::Union { members } => {
                let mut instantiated = Vec::with_capacity(members.len());
                for member in members {
                    instantiated.push(self.eval(member, env, stack)?);
                }
                return simplify::simplify_union(self, instantiated, attrs);
            }
            TypeExprKind::Reference { path, type_args } => {
                return self.eval_reference(expr, path, type_args, attrs, env, stack);
            }
            TypeExprKind::Dispatcher { registry, indices } => {
                return self.eval_dispatcher(registry, indices, attrs, span, env, stack);
            }
            TypeExprKind::Indexed { base, indices } => {
                let mut current = self.eval(base, env, stack)?;
                for index in indices {
                    current = self.resolve_index(current, index, span, env, stack)?;
                }
                current.attributes.extend(attrs);
                return Ok(current);
            }
        };
        Ok(Type::with_attributes(kind, attrs))
    }

    /// Structs resolve their spreads eagerly: a spread of a struct in-lines
    /// that struct's fields at the spread position, and the target's
    /// attributes hoist onto the enclosing struct either way.
    fn eval_struct(
        &self,
        ast_fields: &[StructField],
        mut attrs: Vec<Attribute>,
        env: &TypeEnv,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        let mut fields: Vec<Field> = Vec::new();
        for field in ast_fields {
            match field {
                StructField::Named(named) => {
                    push_field(&mut fields, self.lower_field(named, env));
                }
                StructField::Spread(SpreadField {
                    ty,
                    attributes: spread_attrs,
                }) => {
                    let target = self.eval(ty, env, stack)?;
                    attrs.extend(spread_attrs.iter().cloned());
                    match target.kind {
                        TypeKind::Struct {
                            fields: spread_fields,
                        } => {
                            attrs.extend(target.attributes);
                            for spread_field in spread_fields {
                                push_field(&mut fields, spread_field);
                            }
                        }
                        // A non-struct spread target contributes only its
                        // attributes. A cycle handle lands here too: a
                        // struct spreading itself has no finite field list.
                        _ => attrs.extend(target.attributes),
                    }
                }
            }
        }
        Ok(Type::with_attributes(TypeKind::Struct { fields }, attrs))
    }

    fn lower_field(&self, named: &NamedField, env: &TypeEnv) -> Field {
        let key = match &named.key {
            crate::ast::FieldKey::Ident(s) | crate::ast::FieldKey::String(s) => {
                FieldName::Literal(s.clone())
            }
            crate::ast::FieldKey::Computed(ty) => {
                FieldName::Computed(LazyType::new((**ty).clone(), env.clone()))
            }
        };
        Field {
            key,
            optional: named.optional,
            ty: LazyType::new(named.ty.clone(), env.clone()),
            attributes: named.attributes.clone(),
            doc: named.doc.clone(),
        }
    }

    fn eval_reference(
        &self,
        expr: &TypeExpr,
        path: &TypePath,
        type_args: &[TypeExpr],
        attrs: Vec<Attribute>,
        env: &TypeEnv,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        let span = (expr.pos_start, expr.pos_end.saturating_sub(expr.pos_start));
        let canonical = match resolve_type_path(path, &env.module, &env.uses) {
            Ok(canonical) => canonical,
            Err(PathError::SuperPastRoot) => {
                self.sink.push(DiagnosticRecord::error(
                    &env.file,
                    span,
                    "super-past-root",
                    format!("`{path}` walks above the module root"),
                ));
                return Ok(Type::with_attributes(TypeKind::Error, attrs));
            }
        };
        let Some(decl) = self.symbols.declaration(&canonical) else {
            self.sink.push(DiagnosticRecord::error(
                &env.file,
                span,
                "unknown-path",
                format!("unknown path `{canonical}`"),
            ));
            return Ok(Type::with_attributes(TypeKind::Error, attrs));
        };
        if decl.type_params.len() != type_args.len() {
            self.sink.push(DiagnosticRecord::error(
                &env.file,
                span,
                "type-arg-count-mismatch",
                format!(
                    "`{canonical}` takes {} type argument(s), {} given",
                    decl.type_params.len(),
                    type_args.len()
                ),
            ));
            return Ok(Type::with_attributes(TypeKind::Error, attrs));
        }

        let key = if type_args.is_empty() {
            canonical.to_string()
        } else {
            let args: Vec<String> = type_args.iter().map(ToString::to_string).collect();
            format!("{canonical}<{}>", args.join(", "))
        };
        let make_handle = || {
            Type::new(TypeKind::Handle {
                key: key.clone(),
                target: Box::new(LazyType::new(expr.clone(), env.clone())),
            })
        };
        if stack.contains(&key) {
            let mut handle = make_handle();
            handle.attributes = attrs;
            return Ok(handle);
        }

        let mut result = self.cache.get_or_compute(&key, make_handle, || {
            stack.push(key.clone());
            let body = match &decl.body {
                crate::resolver::DeclarationBody::Alias { ty } => ty.clone(),
                crate::resolver::DeclarationBody::Struct { fields } => {
                    TypeExpr::new(TypeExprKind::Struct {
                        fields: fields.clone(),
                    })
                }
                crate::resolver::DeclarationBody::Enum { base, variants } => {
                    TypeExpr::new(TypeExprKind::Enum {
                        base: *base,
                        variants: variants.clone(),
                    })
                }
            };
            let body = if decl.type_params.is_empty() {
                body
            } else {
                let mut bindings = HashMap::new();
                for (param, arg) in decl.type_params.iter().zip(type_args) {
                    // A parameter colliding with a module-level name loses:
                    // the module-level name keeps resolving, the parameter
                    // is diagnosed and left unbound.
                    if self
                        .symbols
                        .declaration(&decl.module.child(param))
                        .is_some()
                    {
                        self.sink.push(DiagnosticRecord::warning(
                            &decl.file,
                            span,
                            "generic-param-collision",
                            format!(
                                "type parameter `{param}` of `{canonical}` collides with a module-level declaration; the declaration wins"
                            ),
                        ));
                        continue;
                    }
                    bindings.insert(param.clone(), arg.clone());
                }
                substitute(&body, &bindings)
            };
            let inner_env = TypeEnv::new(
                decl.module.clone(),
                decl.file.clone(),
                Arc::clone(&decl.uses),
            );
            let mut ty = self.eval(&body, &inner_env, stack)?;
            stack.pop();
            ty.attributes.extend(decl.attributes.iter().cloned());
            Ok(ty)
        })?;
        result.attributes.extend(attrs);
        Ok(result)
    }

    fn eval_dispatcher(
        &self,
        registry: &ResourceLocation,
        indices: &[Index],
        attrs: Vec<Attribute>,
        span: (usize, usize),
        env: &TypeEnv,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        let name = registry.to_string();
        let Some(map) = self.symbols.registry(&name) else {
            self.sink.push(DiagnosticRecord::warning(
                &env.file,
                span,
                "unknown-dispatcher-registry",
                format!("no dispatch statement registers `{name}`; using the empty fallback"),
            ));
            let mut bottom = Type::with_attributes(TypeKind::Bottom, attrs);
            bottom.push_attribute(Attribute::marker("nonexhaustive"));
            return Ok(bottom);
        };
        let Some((first, rest)) = indices.split_first() else {
            // The parser guarantees at least one index; be defensive anyway.
            return Ok(Type::with_attributes(TypeKind::Error, attrs));
        };
        let mut current = match first {
            Index::Static(key) => {
                let case = map.get(key).or_else(|| match key {
                    StaticKey::None | StaticKey::Unknown => map.get(&StaticKey::Fallback),
                    _ => map
                        .get(&StaticKey::Unknown)
                        .or_else(|| map.get(&StaticKey::Fallback)),
                });
                match case {
                    Some(case) => self.instantiate_case(registry, key, case, stack)?,
                    None => self.fallback_union(registry, None, stack)?,
                }
            }
            Index::Dynamic(accessor) => {
                self.fallback_union(registry, Some(accessor.as_slice()), stack)?
            }
        };
        for index in rest {
            current = self.resolve_index(current, index, span, env, stack)?;
        }
        current.attributes.extend(attrs);
        Ok(current)
    }

    fn instantiate_case(
        &self,
        registry: &ResourceLocation,
        key: &StaticKey,
        case: &DispatchCase,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        let cache_key = format!("{registry}[{key}]");
        let target = LazyType::new(
            TypeExpr::new(TypeExprKind::Dispatcher {
                registry: registry.clone(),
                indices: vec![Index::Static(key.clone())],
            }),
            TypeEnv::root(),
        );
        let make_handle = || {
            Type::new(TypeKind::Handle {
                key: cache_key.clone(),
                target: Box::new(target.clone()),
            })
        };
        if stack.contains(&cache_key) {
            return Ok(make_handle());
        }
        self.cache.get_or_compute(&cache_key, make_handle, || {
            stack.push(cache_key.clone());
            let body = if case.type_params.is_empty() {
                case.target.clone()
            } else {
                // A case reached through an index has no argument list;
                // unsupplied parameters degrade to `any`.
                let bindings = case
                    .type_params
                    .iter()
                    .map(|p| (p.clone(), TypeExpr::new(TypeExprKind::Any)))
                    .collect();
                substitute(&case.target, &bindings)
            };
            let case_env = TypeEnv::new(
                case.module.clone(),
                case.file.clone(),
                Arc::clone(&case.uses),
            );
            let mut ty = self.eval(&body, &case_env, stack)?;
            stack.pop();
            ty.attributes.extend(case.attributes.iter().cloned());
            Ok(ty)
        })
    }

    /// The union of every registered case (excluding `%none` and
    /// `%unknown`), tagged `nonexhaustive`. Produced for dynamic indices and
    /// for static keys no case matched.
    fn fallback_union(
        &self,
        registry: &ResourceLocation,
        accessor: Option<&[crate::ast::AccessorKey]>,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        let name = registry.to_string();
        let mut members = Vec::new();
        if let Some(map) = self.symbols.registry(&name) {
            for (key, case) in map {
                if matches!(key, StaticKey::None | StaticKey::Unknown) {
                    continue;
                }
                members.push(self.instantiate_case(registry, key, case, stack)?);
            }
        }
        let mut union = simplify::simplify_union(self, members, Vec::new())?;
        union.push_attribute(Attribute::marker("nonexhaustive"));
        if let Some(accessor) = accessor {
            union.push_attribute(accessor_attribute(accessor));
        }
        Ok(union)
    }

    /// Forces a type and everything reachable from it. Recursive schemas
    /// cannot be fully forced: a re-entered expansion is reported as
    /// `cycle-without-laziness` and left in place as a handle.
    ///
    /// The returned type is structurally the same as the input (container
    /// children stay lazy); the walk's value is that it has instantiated and
    /// cached every reachable expansion and surfaced every resolution
    /// diagnostic eagerly.
    pub fn force_all(&self, ty: &Type, file: &str) -> EvalResult<()> {
        let mut seen = Vec::new();
        self.force_all_inner(ty, file, &mut seen)
    }

    fn force_all_inner(
        &self,
        ty: &Type,
        file: &str,
        seen: &mut Vec<String>,
    ) -> EvalResult<()> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let key = ty.to_string();
        if seen.contains(&key) {
            self.sink.push(DiagnosticRecord::warning(
                file,
                (0, 0),
                "cycle-without-laziness",
                format!("`{key}` recurses and cannot be fully forced"),
            ));
            return Ok(());
        }
        seen.push(key);
        let result = match &ty.kind {
            TypeKind::Handle { key, .. } => {
                self.sink.push(DiagnosticRecord::warning(
                    file,
                    (0, 0),
                    "cycle-without-laziness",
                    format!("`{key}` recurses and cannot be fully forced"),
                ));
                Ok(())
            }
            TypeKind::List { elem, .. } => {
                let forced = self.force(elem)?;
                self.force_all_inner(&forced, file, seen)
            }
            TypeKind::Tuple { elems } => {
                for elem in elems {
                    let forced = self.force(elem)?;
                    self.force_all_inner(&forced, file, seen)?;
                }
                Ok(())
            }
            TypeKind::Struct { fields } => {
                for field in fields {
                    let forced = self.force(&field.ty)?;
                    self.force_all_inner(&forced, file, seen)?;
                }
                Ok(())
            }
            TypeKind::Union { members } => {
                for member in members {
                    self.force_all_inner(member, file, seen)?;
                }
                Ok(())
            }
            _ => Ok(()),
        };
        seen.pop();
        result
    }

    /// Applies one index to an already instantiated type.
    fn resolve_index(
        &self,
        current: Type,
        index: &Index,
        span: (usize, usize),
        env: &TypeEnv,
        stack: &mut Vec<String>,
    ) -> EvalResult {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let current = self.force_type(&current)?;
        match (&current.kind, index) {
            (TypeKind::Struct { fields }, Index::Static(key)) => {
                let Some(text) = key.text() else {
                    self.sink.push(DiagnosticRecord::warning(
                        &env.file,
                        span,
                        "unknown-index-key",
                        format!("`{key}` does not address a struct field"),
                    ));
                    return Ok(Type::error());
                };
                match fields.iter().find(|f| f.key.text() == Some(text)) {
                    Some(field) => self.force(&field.ty),
                    None => {
                        self.sink.push(DiagnosticRecord::warning(
                            &env.file,
                            span,
                            "unknown-index-key",
                            format!("no field `{text}` to index into"),
                        ));
                        Ok(Type::error())
                    }
                }
            }
            (TypeKind::Struct { fields }, Index::Dynamic(accessor)) => {
                let mut members = Vec::with_capacity(fields.len());
                for field in fields {
                    members.push(self.force(&field.ty)?);
                }
                let mut union = simplify::simplify_union(self, members, Vec::new())?;
                union.push_attribute(Attribute::marker("nonexhaustive"));
                union.push_attribute(accessor_attribute(accessor));
                Ok(union)
            }
            (_, index) => {
                self.sink.push(DiagnosticRecord::error(
                    &env.file,
                    span,
                    "static-key-on-non-dispatcher-non-struct",
                    format!("index `{index}` applied to a type that is neither a dispatcher nor a struct"),
                ));
                Ok(Type::error())
            }
        }
    }
}

fn push_field(fields: &mut Vec<Field>, field: Field) {
    // Within one struct a repeated literal key replaces the earlier type but
    // keeps the earlier position.
    let slot = field
        .key
        .text()
        .map(str::to_string)
        .and_then(|key| {
            fields
                .iter()
                .position(|f| f.key.text() == Some(key.as_str()))
        });
    match slot {
        Some(index) => fields[index] = field,
        None => fields.push(field),
    }
}

/// The accessor of a dynamic index, preserved verbatim for downstream
/// validators as `#[accessor("%parent", "id")]`.
fn accessor_attribute(accessor: &[crate::ast::AccessorKey]) -> Attribute {
    Attribute {
        name: "accessor".to_string(),
        value: Some(AttributeValue::Tree(AttributeTree {
            delimiter: TreeDelimiter::Paren,
            positional: accessor
                .iter()
                .map(|key| {
                    AttributeValue::Type(Box::new(TypeExpr::new(TypeExprKind::LiteralString(
                        key.to_string(),
                    ))))
                })
                .collect(),
            named: Vec::new(),
        })),
    }
}

/// Textual-by-identifier generic substitution: a bare single-segment
/// reference that names a bound parameter is replaced by the actual
/// argument. Parameters bind only within one statement, so no hygiene
/// machinery is needed.
pub(crate) fn substitute(expr: &TypeExpr, bindings: &HashMap<String, TypeExpr>) -> TypeExpr {
    if bindings.is_empty() {
        return expr.clone();
    }
    let kind = match &expr.kind {
        TypeExprKind::Reference { path, type_args } => {
            if type_args.is_empty() && !path.absolute && path.segments.len() == 1 {
                if let PathSegment::Ident(name) = &path.segments[0] {
                    if let Some(replacement) = bindings.get(name) {
                        let mut replaced = replacement.clone();
                        replaced
                            .attributes
                            .extend(expr.attributes.iter().cloned());
                        return replaced;
                    }
                }
            }
            TypeExprKind::Reference {
                path: path.clone(),
                type_args: type_args.iter().map(|a| substitute(a, bindings)).collect(),
            }
        }
        TypeExprKind::List { elem, len_range } => TypeExprKind::List {
            elem: Box::new(substitute(elem, bindings)),
            len_range: *len_range,
        },
        TypeExprKind::Tuple { elems } => TypeExprKind::Tuple {
            elems: elems.iter().map(|e| substitute(e, bindings)).collect(),
        },
        TypeExprKind::Union { members } => TypeExprKind::Union {
            members: members.iter().map(|m| substitute(m, bindings)).collect(),
        },
        TypeExprKind::Indexed { base, indices } => TypeExprKind::Indexed {
            base: Box::new(substitute(base, bindings)),
            indices: indices.clone(),
        },
        TypeExprKind::Struct { fields } => TypeExprKind::Struct {
            fields: fields
                .iter()
                .map(|field| match field {
                    StructField::Named(named) => StructField::Named(NamedField {
                        key: match &named.key {
                            crate::ast::FieldKey::Computed(ty) => crate::ast::FieldKey::Computed(
                                Box::new(substitute(ty, bindings)),
                            ),
                            other => other.clone(),
                        },
                        optional: named.optional,
                        ty: substitute(&named.ty, bindings),
                        attributes: named.attributes.clone(),
                        doc: named.doc.clone(),
                    }),
                    StructField::Spread(spread) => StructField::Spread(SpreadField {
                        ty: substitute(&spread.ty, bindings),
                        attributes: spread.attributes.clone(),
                    }),
                })
                .collect(),
        },
        other => other.clone(),
    };
    TypeExpr {
        kind,
        attributes: expr.attributes.clone(),
        pos_start: expr.pos_start,
        pos_end: expr.pos_end,
    }
}
