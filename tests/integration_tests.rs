use mcdoc_core::analyze;
use mcdoc_core::ast::StaticKey;
use mcdoc_core::types::TypeKind;

#[test]
fn test_dispatcher_with_none_key() {
    let project = analyze(&[(
        "range",
        "dispatch minecraft:int_provider[uniform, %none] to struct { min: int, max: int }\n\
         dispatch minecraft:int_provider[binomial] to struct { n: int, p: float }",
    )]);

    // `%none` was registered explicitly; an absent discriminator resolves to
    // the uniform shape.
    let none = project
        .dispatch("minecraft:int_provider", &[StaticKey::None])
        .expect("ok");
    match &none.kind {
        TypeKind::Struct { fields } => {
            assert_eq!(fields[0].key.text(), Some("min"));
        }
        other => panic!("expected a struct, got {other:?}"),
    }

    let binomial = project
        .dispatch(
            "minecraft:int_provider",
            &[StaticKey::Ident("binomial".to_string())],
        )
        .expect("ok");
    match &binomial.kind {
        TypeKind::Struct { fields } => assert_eq!(fields[0].key.text(), Some("n")),
        other => panic!("expected a struct, got {other:?}"),
    }

    // An unknown key produces the fallback union over the registered cases
    // (excluding %none), tagged nonexhaustive.
    let unknown = project
        .dispatch(
            "minecraft:int_provider",
            &[StaticKey::Ident("who_knows".to_string())],
        )
        .expect("ok");
    assert!(unknown.has_attribute("nonexhaustive"));
    match &unknown.kind {
        TypeKind::Union { members } => assert_eq!(members.len(), 2),
        other => panic!("expected the fallback union, got {other:?}"),
    }
}

#[test]
fn test_dynamic_index_spread() {
    let project = analyze(&[(
        "range",
        "dispatch minecraft:int_provider[uniform, %none] to struct { min: int, max: int }\n\
         dispatch minecraft:int_provider[binomial] to struct { n: int, p: float }\n\
         struct IntProvider { type?: (\"uniform\" | \"binomial\"), ...minecraft:int_provider[[type]] }",
    )]);

    // The spread target is the nonexhaustive fallback union, which is not a
    // struct: its attributes hoist onto the enclosing struct and the
    // accessor is preserved for the downstream validator to refine with.
    let ty = project.instantiate_path("::range::IntProvider").expect("ok");
    match &ty.kind {
        TypeKind::Struct { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].key.text(), Some("type"));
        }
        other => panic!("expected a struct, got {other:?}"),
    }
    assert!(ty.has_attribute("nonexhaustive"));
    assert!(ty.has_attribute("accessor"));
}

#[test]
fn test_recursive_struct_terminates() {
    let project = analyze(&[("node", "struct Node { value: int, children: [Node] }")]);
    let ty = project.instantiate_path("::node::Node").expect("ok");
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    assert_eq!(fields.len(), 2);

    // Descending lazily re-yields the node type without diverging.
    let children = project.force(&fields[1].ty).expect("ok");
    let TypeKind::List { elem, .. } = &children.kind else {
        panic!("expected a list, got {children}");
    };
    let node_again = project.force(elem).expect("ok");
    assert!(matches!(node_again.kind, TypeKind::Struct { .. }));

    assert!(project.assignable(&ty, &node_again).expect("ok"));
    assert!(project.diagnostics().is_empty());
}

#[test]
fn test_mutually_recursive_aliases_yield_handles() {
    let project = analyze(&[("m", "type A = ( int | B )\ntype B = ( string | A )")]);
    // Must terminate; the inner re-entry of A is represented by a handle.
    let ty = project.instantiate_path("::m::A").expect("ok");
    assert!(!ty.is_error());
}

#[test]
fn test_injection_merges_in_source_order() {
    let forward = analyze(&[
        ("a", "struct Foo { a: int }"),
        ("b", "inject struct ::a::Foo { b?: string }"),
    ]);
    let backward = analyze(&[
        ("b", "inject struct ::a::Foo { b?: string }"),
        ("a", "struct Foo { a: int }"),
    ]);
    for project in [forward, backward] {
        let ty = project.instantiate_path("::a::Foo").expect("ok");
        let TypeKind::Struct { fields } = &ty.kind else {
            panic!("expected a struct, got {ty}");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key.text(), Some("a"));
        assert_eq!(fields[1].key.text(), Some("b"));
        assert!(fields[1].optional);
    }
}

#[test]
fn test_injection_into_missing_path() {
    let project = analyze(&[("b", "inject struct ::nowhere::Foo { b?: string }")]);
    assert!(project
        .diagnostics()
        .iter()
        .any(|d| d.code == "unknown-path"));
}

#[test]
fn test_injection_overrides_existing_field_in_place() {
    let project = analyze(&[
        ("a", "struct Foo { a: int, b: int }"),
        ("b", "inject struct ::a::Foo { a: string }"),
    ]);
    let ty = project.instantiate_path("::a::Foo").expect("ok");
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].key.text(), Some("a"));
    let replaced = project.force(&fields[0].ty).expect("ok");
    assert!(matches!(replaced.kind, TypeKind::String { .. }));
}

#[test]
fn test_enum_injection() {
    let project = analyze(&[
        ("a", "enum (string) Color { Red = \"red\" }"),
        ("b", "inject enum (string) ::a::Color { Blue = \"blue\" }"),
    ]);
    let ty = project.instantiate_path("::a::Color").expect("ok");
    match &ty.kind {
        TypeKind::Enum { variants, .. } => {
            assert_eq!(variants.len(), 2);
            assert_eq!(variants[1].name, "Blue");
        }
        other => panic!("expected an enum, got {other:?}"),
    }
}

#[test]
fn test_spread_inlines_struct_fields() {
    let project = analyze(&[(
        "m",
        "struct Base { x: int }\nstruct Ext { ...Base, y: string }",
    )]);
    let ty = project.instantiate_path("::m::Ext").expect("ok");
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].key.text(), Some("x"));
    assert_eq!(fields[1].key.text(), Some("y"));
}

#[test]
fn test_spread_duplicate_key_keeps_position() {
    // The later occurrence (through the spread) replaces the type but keeps
    // the original position.
    let project = analyze(&[(
        "m",
        "struct Base { x: int }\nstruct Ext { x: string, y: boolean, ...Base }",
    )]);
    let ty = project.instantiate_path("::m::Ext").expect("ok");
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].key.text(), Some("x"));
    let x = project.force(&fields[0].ty).expect("ok");
    assert!(matches!(x.kind, TypeKind::Numeric { .. }));
}

#[test]
fn test_spread_target_attributes_hoist() {
    let project = analyze(&[(
        "m",
        "#[special] struct Base { x: int }\nstruct Ext { ...Base }",
    )]);
    let ty = project.instantiate_path("::m::Ext").expect("ok");
    assert!(ty.has_attribute("special"));
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    // The target's attributes hoist onto the struct, not onto its fields.
    assert!(fields[0].attributes.is_empty());
}

#[test]
fn test_reference_attributes_propagate() {
    let project = analyze(&[("m", "#[tagged] struct Foo { a: int }\ntype Bar = Foo")]);
    let ty = project.instantiate_path("::m::Bar").expect("ok");
    assert!(ty.has_attribute("tagged"));
}

#[test]
fn test_cancellation_yields_distinguished_result() {
    let project = analyze(&[("m", "struct Foo { a: int }")]);
    project.cancel_token().cancel();
    assert!(project.instantiate_path("::m::Foo").is_err());
    // Cancellation is not a diagnostic.
    assert!(project
        .diagnostics()
        .iter()
        .all(|d| d.code != "cancelled"));
}

#[test]
fn test_fully_forcing_a_recursive_schema_is_diagnosed() {
    let project = analyze(&[("node", "struct Node { value: int, children: [Node] }")]);
    let ty = project
        .instantiate_path_fully("::node::Node")
        .expect("still terminates");
    assert!(matches!(ty.kind, TypeKind::Struct { .. }));
    assert!(project
        .diagnostics()
        .iter()
        .any(|d| d.code == "cycle-without-laziness"));
}

#[test]
fn test_fully_forcing_a_finite_schema_is_clean() {
    let project = analyze(&[(
        "m",
        "struct Outer { inner: struct { leaf: [string] }, pair: [int, boolean] }",
    )]);
    project
        .instantiate_path_fully("::m::Outer")
        .expect("terminates");
    assert!(project.diagnostics().is_empty());
}

#[test]
fn test_nested_generic_instantiation() {
    let project = analyze(&[(
        "m",
        "type Pair<A, B> = struct { first: A, second: B }\n\
         type Entry = Pair<string, [int]>",
    )]);
    let ty = project.instantiate_path("::m::Entry").expect("ok");
    let TypeKind::Struct { fields } = &ty.kind else {
        panic!("expected a struct, got {ty}");
    };
    let first = project.force(&fields[0].ty).expect("ok");
    assert!(matches!(first.kind, TypeKind::String { .. }));
    let second = project.force(&fields[1].ty).expect("ok");
    assert!(matches!(second.kind, TypeKind::List { .. }));
}

#[test]
fn test_static_index_into_struct_field() {
    let project = analyze(&[(
        "m",
        "struct Outer { inner: struct { deep: string } }\ntype Deep = Outer[inner][deep]",
    )]);
    let ty = project.instantiate_path("::m::Deep").expect("ok");
    assert!(matches!(ty.kind, TypeKind::String { .. }));
}

#[test]
fn test_dynamic_index_into_struct_is_field_union() {
    let project = analyze(&[(
        "m",
        "struct Holder { a: int, b: string }\ntype AnyField = Holder[[%key]]",
    )]);
    let ty = project.instantiate_path("::m::AnyField").expect("ok");
    assert!(ty.has_attribute("nonexhaustive"));
    match &ty.kind {
        TypeKind::Union { members } => assert_eq!(members.len(), 2),
        other => panic!("expected a union of field types, got {other:?}"),
    }
}
