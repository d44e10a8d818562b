use mcdoc_core::analyze;
use mcdoc_core::types::TypeKind;
use mcdoc_core::McdocProject;

#[test]
fn test_union_simplification_end_to_end() {
    let project = analyze(&[("u", "type U = ( string | \"foo\" | \"bar\" )")]);
    let ty = project.instantiate_path("::u::U").expect("ok");
    assert!(matches!(ty.kind, TypeKind::String { .. }));
    assert_eq!(ty.shadowed.len(), 2);
    assert_eq!(
        ty.shadowed[0].kind,
        TypeKind::LiteralString("foo".to_string())
    );
    assert_eq!(
        ty.shadowed[1].kind,
        TypeKind::LiteralString("bar".to_string())
    );
}

#[test]
fn test_empty_union_is_bottom() {
    let project = analyze(&[("u", "type Nothing = ()\ntype T = int")]);
    let bottom = project.instantiate_path("::u::Nothing").expect("ok");
    assert!(bottom.is_bottom());
    let int = project.instantiate_path("::u::T").expect("ok");
    assert!(project.assignable(&bottom, &int).expect("ok"));
    assert!(!project.assignable(&int, &bottom).expect("ok"));
}

#[test]
fn test_union_with_bottom_member_collapses() {
    let project = analyze(&[("u", "type T = ( int | () | )")]);
    let ty = project.instantiate_path("::u::T").expect("ok");
    assert!(matches!(ty.kind, TypeKind::Numeric { .. }));
}

#[test]
fn test_assignable_between_instantiated_types() {
    let project = analyze(&[(
        "m",
        "struct Wide { a: int }\nstruct Narrow { a: int @ 0..10, b: string }",
    )]);
    let wide = project.instantiate_path("::m::Wide").expect("ok");
    let narrow = project.instantiate_path("::m::Narrow").expect("ok");
    // Narrow has every field Wide requires (width subtyping).
    assert!(project.assignable(&narrow, &wide).expect("ok"));
    assert!(!project.assignable(&wide, &narrow).expect("ok"));
}

#[test]
fn test_simplify_query_is_idempotent() {
    let project = analyze(&[("u", "type U = ( string | \"foo\" | int | )")]);
    let ty = project.instantiate_path("::u::U").expect("ok");
    let once = project.simplify(&ty).expect("ok");
    let twice = project.simplify(&once).expect("ok");
    assert_eq!(once, twice);
}

#[test]
fn test_incremental_project_building() {
    let mut project = McdocProject::new();
    project.add_file("defs", "struct Thing { id: string }");
    project.add_file("main", "use super::defs::Thing\ntype T = [Thing] @ 1..");
    project.build();

    let ty = project.instantiate_path("::main::T").expect("ok");
    let TypeKind::List { elem, len_range } = &ty.kind else {
        panic!("expected a list, got {ty}");
    };
    assert_eq!(len_range.expect("range").min, Some(1.0));
    let elem = project.force(elem).expect("ok");
    assert!(matches!(elem.kind, TypeKind::Struct { .. }));
}

#[test]
fn test_instantiated_type_to_json() {
    let project = analyze(&[(
        "m",
        "struct Foo { id: string, count?: int @ 0..64, data: byte[] @ 4 }",
    )]);
    let ty = project.instantiate_path("::m::Foo").expect("ok");
    let json = ty.to_json().expect("serializable");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(parsed["kind"], "struct");
    assert_eq!(parsed["fields"][1]["key"], "count");
    assert_eq!(parsed["fields"][1]["optional"], true);
}

#[test]
fn test_shadowed_types_survive_serialization() {
    let project = analyze(&[("u", "type U = ( string | \"foo\" )")]);
    let ty = project.instantiate_path("::u::U").expect("ok");
    let json = ty.to_json().expect("serializable");
    assert!(json.contains("shadowedTypes"));
    assert!(json.contains("foo"));
}

#[test]
fn test_literal_and_enum_assignability_end_to_end() {
    let project = analyze(&[(
        "m",
        "enum (string) Color { Red = \"red\", Green = \"green\" }\n\
         type Lit = \"red\"\ntype Str = string",
    )]);
    let color = project.instantiate_path("::m::Color").expect("ok");
    let lit = project.instantiate_path("::m::Lit").expect("ok");
    let string = project.instantiate_path("::m::Str").expect("ok");
    assert!(project.assignable(&lit, &color).expect("ok"));
    assert!(project.assignable(&color, &string).expect("ok"));
    assert!(!project.assignable(&string, &color).expect("ok"));
}

#[test]
fn test_boolean_and_literals() {
    let project = analyze(&[("m", "type B = boolean\ntype T = true")]);
    let boolean = project.instantiate_path("::m::B").expect("ok");
    let lit = project.instantiate_path("::m::T").expect("ok");
    assert!(project.assignable(&lit, &boolean).expect("ok"));
    assert!(!project.assignable(&boolean, &lit).expect("ok"));
}

#[test]
fn test_tuple_assignable_to_list() {
    let project = analyze(&[("m", "type Pair = [int, int]\ntype Ints = [int]")]);
    let pair = project.instantiate_path("::m::Pair").expect("ok");
    let ints = project.instantiate_path("::m::Ints").expect("ok");
    assert!(project.assignable(&pair, &ints).expect("ok"));
    assert!(!project.assignable(&ints, &pair).expect("ok"));
}

#[test]
fn test_attribute_registry_checks_registered_names() {
    use mcdoc_core::ast::AttributeValue;

    let mut project = McdocProject::new();
    project.add_file("m", "#[since=\"1.19\"] #[experimental] struct Foo { a: int }");
    project.build();
    project.attributes_mut().register("since", |attribute| {
        match &attribute.value {
            Some(AttributeValue::Type(ty)) if ty.to_string().starts_with('"') => Ok(()),
            _ => Err("`since` expects a version string".to_string()),
        }
    });

    let ty = project.instantiate_path("::m::Foo").expect("ok");
    let results: Vec<Result<(), String>> = ty
        .attributes
        .iter()
        .map(|a| project.attributes().check(a))
        .collect();
    // `since` passes its checker; `experimental` is unregistered and passes
    // by virtue of the open vocabulary.
    assert!(results.iter().all(Result::is_ok));
    assert!(project.attributes().is_registered("since"));
    assert!(!project.attributes().is_registered("experimental"));

    let bad = mcdoc_core::ast::Attribute::marker("since");
    assert!(project.attributes().check(&bad).is_err());
}

#[test]
fn test_prim_array_subsets() {
    let project = analyze(&[(
        "m",
        "type Wide = byte[]\ntype Narrow = byte @ 0..1 [] @ 4",
    )]);
    let wide = project.instantiate_path("::m::Wide").expect("ok");
    let narrow = project.instantiate_path("::m::Narrow").expect("ok");
    assert!(project.assignable(&narrow, &wide).expect("ok"));
    assert!(!project.assignable(&wide, &narrow).expect("ok"));
}
