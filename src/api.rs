use crate::ast::{
    Attribute, PathSegment, ResourceLocation, StaticKey, TypeExpr, TypeExprKind, TypePath,
};
use crate::error::DiagnosticRecord;
use crate::eval::{CancelToken, EvalResult, InstCache, TypeEngine};
use crate::resolver::{CanonicalPath, Declaration, Resolver, SymbolTable};
use crate::simplify::ValidatorProfile;
use crate::types::{LazyType, Type, TypeEnv};
use std::collections::HashMap;

type AttributeCheck = Box<dyn Fn(&Attribute) -> Result<(), String> + Send + Sync>;

/// Host-provided attribute semantics.
///
/// The engine stores attributes as uninterpreted `(name, value tree)` pairs;
/// the vocabulary is open. Hosts that do assign meaning to an attribute
/// (`since`, `id`, ...) register a checker here and run it over the
/// attributes of the types they walk.
#[derive(Default)]
pub struct AttributeRegistry {
    checks: HashMap<String, AttributeCheck>,
}

impl AttributeRegistry {
    #[must_use]
    pub fn new() -> Self {
        AttributeRegistry::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        check: impl Fn(&Attribute) -> Result<(), String> + Send + Sync + 'static,
    ) {
        self.checks.insert(name.into(), Box::new(check));
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Runs the registered checker, if any. Unregistered names pass: the
    /// vocabulary is open by design.
    pub fn check(&self, attribute: &Attribute) -> Result<(), String> {
        match self.checks.get(&attribute.name) {
            Some(check) => check(attribute),
            None => Ok(()),
        }
    }
}

/// A loaded mcdoc project: the symbol table plus everything needed to answer
/// type queries against it.
///
/// Usage follows the load → build → query shape:
///
/// ```rust
/// use mcdoc_core::McdocProject;
///
/// let mut project = McdocProject::new();
/// project.add_file("tags", "type Tag<V> = struct { values: [V] }");
/// project.add_file("blocks", "use super::tags::Tag\ntype BlockTag = Tag<string>");
/// project.build();
///
/// let ty = project.instantiate_path("::blocks::BlockTag").unwrap();
/// assert!(project.diagnostics().is_empty());
/// println!("{ty}");
/// ```
///
/// All queries are `&self` and safe to issue concurrently; instantiation
/// results are memoized with a single-flight cache, and every request checks
/// the project's [`CancelToken`] before descending into a node.
pub struct McdocProject {
    resolver: Resolver,
    cache: InstCache,
    profile: ValidatorProfile,
    cancel: CancelToken,
    attributes: AttributeRegistry,
}

impl Default for McdocProject {
    fn default() -> Self {
        Self::new()
    }
}

impl McdocProject {
    #[must_use]
    pub fn new() -> Self {
        Self::with_profile(ValidatorProfile::default())
    }

    #[must_use]
    pub fn with_profile(profile: ValidatorProfile) -> Self {
        McdocProject {
            resolver: Resolver::new(),
            cache: InstCache::new(),
            profile,
            cancel: CancelToken::new(),
            attributes: AttributeRegistry::new(),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeRegistry {
        &mut self.attributes
    }

    /// Adds one source file. `logical_path` is the `/`-separated module path
    /// without extension (a trailing `.mcdoc` is tolerated); a file stem of
    /// `mod` collapses into the folder path.
    pub fn add_file(&mut self, logical_path: &str, source: &str) {
        self.resolver.load_file(logical_path, source);
    }

    /// Finalizes loading: applies queued injections. Must be called after
    /// the last [`McdocProject::add_file`] and before querying.
    pub fn build(&mut self) {
        self.resolver.finish();
    }

    /// The token queries of this project observe; cancel it to make
    /// in-flight instantiations return `Err(Cancelled)`.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.resolver.symbols
    }

    /// Looks up a declaration record by absolute textual path (`::a::b::C`).
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Declaration> {
        self.resolver.symbols.declaration(&CanonicalPath::parse(path))
    }

    /// Instantiates an arbitrary type expression in the given environment.
    pub fn instantiate(&self, expr: &TypeExpr, env: &TypeEnv) -> EvalResult {
        self.engine().instantiate(expr, env)
    }

    /// Instantiates the declaration at an absolute textual path. Unknown
    /// paths yield the error sentinel plus an `unknown-path` diagnostic,
    /// like any other dangling reference.
    pub fn instantiate_path(&self, path: &str) -> EvalResult {
        let canonical = CanonicalPath::parse(path);
        let expr = TypeExpr::new(TypeExprKind::Reference {
            path: TypePath {
                absolute: true,
                segments: canonical
                    .segments
                    .into_iter()
                    .map(PathSegment::Ident)
                    .collect(),
            },
            type_args: Vec::new(),
        });
        self.engine().instantiate(&expr, &TypeEnv::root())
    }

    /// Resolves a dispatcher lookup, exactly as instantiating the type
    /// `registry[key, ...]` would. A registry name without a `:` defaults to
    /// the `minecraft` namespace.
    pub fn dispatch(&self, registry: &str, keys: &[StaticKey]) -> EvalResult {
        let registry = match registry.split_once(':') {
            Some((namespace, path)) => ResourceLocation {
                namespace: namespace.to_string(),
                path: path.to_string(),
            },
            None => ResourceLocation {
                namespace: "minecraft".to_string(),
                path: registry.to_string(),
            },
        };
        self.engine().dispatch(&registry, keys)
    }

    /// Forces a lazy container child into an instantiated type.
    pub fn force(&self, lazy: &LazyType) -> EvalResult {
        self.engine().force(lazy)
    }

    /// The strict variant of [`McdocProject::instantiate_path`]: forces the
    /// whole reachable type graph so that every resolution diagnostic
    /// surfaces eagerly. A recursive schema cannot be fully forced and is
    /// reported as `cycle-without-laziness`; the returned type is still
    /// usable lazily.
    pub fn instantiate_path_fully(&self, path: &str) -> EvalResult {
        let ty = self.instantiate_path(path)?;
        self.engine().force_all(&ty, "<query>")?;
        Ok(ty)
    }

    /// The assignability relation `A ⊆ B` under this project's profile.
    pub fn assignable(&self, a: &Type, b: &Type) -> EvalResult<bool> {
        self.engine().assignable(a, b)
    }

    /// Canonicalizes a type (flattens and trims unions).
    pub fn simplify(&self, ty: &Type) -> EvalResult<Type> {
        self.engine().simplify(ty)
    }

    /// Every diagnostic emitted so far, in emission order: load-time records
    /// first, then whatever the queries issued so far surfaced.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        self.resolver.sink().snapshot()
    }

    fn engine(&self) -> TypeEngine<'_> {
        TypeEngine::new(
            &self.resolver.symbols,
            &self.cache,
            self.resolver.sink(),
            &self.profile,
            self.cancel.clone(),
        )
    }
}

/// One-shot convenience: load every `(logical_path, source)` pair in order,
/// apply injections, and return the queryable project.
#[must_use]
pub fn analyze(files: &[(&str, &str)]) -> McdocProject {
    let mut project = McdocProject::new();
    for (logical_path, source) in files {
        project.add_file(logical_path, source);
    }
    project.build();
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn test_generic_alias_instantiation() {
        let project = analyze(&[(
            "tags",
            "type Tag<V> = struct { replace?: boolean, values: [V] }\n\
             type BlockTag = Tag<string>",
        )]);
        let ty = project.instantiate_path("::tags::BlockTag").expect("ok");
        let TypeKind::Struct { fields } = &ty.kind else {
            panic!("expected a struct, got {ty}");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key.text(), Some("replace"));
        assert!(fields[0].optional);
        let values = project.force(&fields[1].ty).expect("ok");
        let TypeKind::List { elem, .. } = &values.kind else {
            panic!("expected a list, got {values}");
        };
        let elem = project.force(elem).expect("ok");
        assert!(matches!(elem.kind, TypeKind::String { .. }));
        assert!(project.diagnostics().is_empty());
    }

    #[test]
    fn test_serialization_of_instantiated_type() {
        let project = analyze(&[("a", "struct Foo { bar?: int @ 0..10 }")]);
        let ty = project.instantiate_path("::a::Foo").expect("ok");
        let json = ty.to_json().expect("serializable");
        assert!(json.contains("\"struct\""));
        assert!(json.contains("\"bar\""));
        let yaml = ty.to_yaml().expect("serializable");
        assert!(yaml.contains("struct"));
    }

    #[test]
    fn test_dispatch_query_matches_dispatcher_type() {
        let project = analyze(&[(
            "r",
            "dispatch minecraft:resource[uniform] to struct { min?: int, max?: int }",
        )]);
        let from_query = project
            .dispatch(
                "minecraft:resource",
                &[StaticKey::Ident("uniform".to_string())],
            )
            .expect("ok");
        assert!(matches!(from_query.kind, TypeKind::Struct { .. }));
    }
}
