use mcdoc_core::analyze;
use mcdoc_core::ast::StaticKey;
use mcdoc_core::error::Severity;
use mcdoc_core::resolver::{CanonicalPath, DeclarationBody, Resolver};
use mcdoc_core::types::TypeKind;

#[test]
fn test_module_path_derivation() {
    assert_eq!(Resolver::module_path_of("foo/bar.mcdoc").to_string(), "::foo::bar");
    assert_eq!(Resolver::module_path_of("foo/bar").to_string(), "::foo::bar");
    assert_eq!(Resolver::module_path_of("foo/mod.mcdoc").to_string(), "::foo");
    assert_eq!(Resolver::module_path_of("mod").to_string(), "::");
    assert_eq!(Resolver::module_path_of("top.mcdoc").to_string(), "::top");
}

#[test]
fn test_super_path_resolution_across_files() {
    let project = analyze(&[
        ("foo", "struct A {}"),
        ("foo/bar", "type Bar = super::super::qux::Something"),
        ("qux", "struct Something {}"),
    ]);
    let ty = project.instantiate_path("::foo::bar::Bar").expect("ok");
    match &ty.kind {
        TypeKind::Struct { fields } => assert!(fields.is_empty()),
        other => panic!("expected an empty struct, got {other:?}"),
    }
    assert!(
        project.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        project.diagnostics()
    );
}

#[test]
fn test_mod_file_collapses_and_collides() {
    // `/foo.mcdoc` and `/foo/mod.mcdoc` both contribute to `::foo`; the
    // later-loaded declaration of the same name is dropped with a
    // diagnostic.
    let project = analyze(&[
        ("foo", "struct Z { first: int }"),
        ("foo/mod", "struct Z { second: int }"),
    ]);
    let diagnostics = project.diagnostics();
    assert!(diagnostics
        .iter()
        .any(|d| d.code == "duplicate-declaration" && d.file == "foo/mod"));

    let ty = project.instantiate_path("::foo::Z").expect("ok");
    match &ty.kind {
        TypeKind::Struct { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].key.text(), Some("first"));
        }
        other => panic!("expected a struct, got {other:?}"),
    }
}

#[test]
fn test_duplicate_declaration_is_warning_and_earliest_wins() {
    let project = analyze(&[("a", "type T = int"), ("a/mod", "type T = string")]);
    let diagnostics = project.diagnostics();
    let dup = diagnostics
        .iter()
        .find(|d| d.code == "duplicate-declaration")
        .expect("duplicate diagnostic");
    assert_eq!(dup.severity, Severity::Warning);

    let ty = project.instantiate_path("::a::T").expect("ok");
    assert!(matches!(ty.kind, TypeKind::Numeric { .. }));
}

#[test]
fn test_use_alias_resolution() {
    let project = analyze(&[
        ("defs", "struct Thing { a: int }"),
        ("main", "use super::defs::Thing as Other\ntype T = Other"),
    ]);
    let ty = project.instantiate_path("::main::T").expect("ok");
    assert!(matches!(ty.kind, TypeKind::Struct { .. }));
    assert!(project.diagnostics().is_empty());
}

#[test]
fn test_use_default_alias_is_last_segment() {
    let project = analyze(&[
        ("defs", "struct Thing { a: int }"),
        ("main", "use super::defs::Thing\ntype T = Thing"),
    ]);
    let ty = project.instantiate_path("::main::T").expect("ok");
    assert!(matches!(ty.kind, TypeKind::Struct { .. }));
    assert!(project.diagnostics().is_empty());
}

#[test]
fn test_declaration_record_contents() {
    let project = analyze(&[(
        "tags",
        "/// A tag file.\ntype Tag<V> = struct { values: [V] }",
    )]);
    let decl = project.resolve("::tags::Tag").expect("declared");
    assert_eq!(decl.path, CanonicalPath::parse("::tags::Tag"));
    assert_eq!(decl.module.to_string(), "::tags");
    assert_eq!(decl.file, "tags");
    assert_eq!(decl.type_params, vec!["V".to_string()]);
    assert_eq!(decl.doc.as_deref(), Some("A tag file."));
    assert!(matches!(decl.body, DeclarationBody::Alias { .. }));
    assert!(project.resolve("::tags::Missing").is_none());
}

#[test]
fn test_dispatch_registry_contents() {
    let project = analyze(&[(
        "r",
        "dispatch minecraft:resource[uniform] to struct { min: int }\n\
         dispatch minecraft:resource[%none] to struct { max: int }",
    )]);
    let registry = project
        .symbols()
        .registry("minecraft:resource")
        .expect("registry");
    assert_eq!(registry.len(), 2);
    assert!(registry.contains_key(&StaticKey::Ident("uniform".to_string())));
    assert!(registry.contains_key(&StaticKey::None));
}

#[test]
fn test_duplicate_dispatch_key_earliest_wins() {
    let project = analyze(&[(
        "r",
        "dispatch minecraft:resource[uniform] to struct { first: int }\n\
         dispatch minecraft:resource[uniform] to struct { second: int }",
    )]);
    assert!(project
        .diagnostics()
        .iter()
        .any(|d| d.code == "duplicate-dispatch-key" && d.severity == Severity::Warning));

    let ty = project
        .dispatch(
            "minecraft:resource",
            &[StaticKey::Ident("uniform".to_string())],
        )
        .expect("ok");
    match &ty.kind {
        TypeKind::Struct { fields } => assert_eq!(fields[0].key.text(), Some("first")),
        other => panic!("expected a struct, got {other:?}"),
    }
}

#[test]
fn test_dispatchers_are_global_across_files() {
    let project = analyze(&[
        ("one", "dispatch minecraft:thing[a] to struct { a: int }"),
        ("two/deep", "dispatch minecraft:thing[b] to struct { b: int }"),
    ]);
    let registry = project
        .symbols()
        .registry("minecraft:thing")
        .expect("registry");
    assert_eq!(registry.len(), 2);
}
