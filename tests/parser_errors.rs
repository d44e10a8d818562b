// Lexical and syntactic failure paths, observed through the public API:
// broken forms are dropped, the rest of the file survives, and every
// failure shows up as an ordered diagnostic record.
use mcdoc_core::analyze;
use mcdoc_core::error::Severity;

fn codes(project: &mcdoc_core::McdocProject) -> Vec<String> {
    project.diagnostics().iter().map(|d| d.code.clone()).collect()
}

#[test]
fn test_unterminated_string() {
    let project = analyze(&[("m", "type T = \"never closed")]);
    assert!(codes(&project).contains(&"unterminated-string".to_string()));
}

#[test]
fn test_invalid_escape() {
    let project = analyze(&[("m", "type T = \"bad\\q\"")]);
    assert!(codes(&project).contains(&"invalid-escape".to_string()));
}

#[test]
fn test_number_out_of_range_for_suffix() {
    let project = analyze(&[("m", "type T = 300b")]);
    assert!(codes(&project).contains(&"number-out-of-range-for-suffix".to_string()));
}

#[test]
fn test_short_suffix_out_of_range() {
    let project = analyze(&[("m", "type T = 40000s")]);
    assert!(codes(&project).contains(&"number-out-of-range-for-suffix".to_string()));
}

#[test]
fn test_parse_errors_are_errors_with_position() {
    let project = analyze(&[("m", "type = int")]);
    let diagnostics = project.diagnostics();
    let err = diagnostics.first().expect("a diagnostic");
    assert_eq!(err.severity, Severity::Error);
    assert_eq!(err.file, "m");
    // Messages carry the human-readable line:column position.
    assert!(err.message.contains("1:"), "message was {:?}", err.message);
}

#[test]
fn test_panic_mode_recovery_registers_surviving_forms() {
    let source = "struct First { a: int }\n\
                  struct { broken without a name\n\
                  struct Last { b: string }";
    let project = analyze(&[("m", source)]);
    assert!(project.resolve("::m::First").is_some());
    assert!(project.resolve("::m::Last").is_some());
    assert!(!project.diagnostics().is_empty());
}

#[test]
fn test_single_member_union_is_a_parse_error() {
    let project = analyze(&[("m", "type T = ( byte )\ntype U = int")]);
    assert!(codes(&project).contains(&"unexpected-token".to_string()));
    // The broken alias is gone, the next form survived.
    assert!(project.resolve("::m::T").is_none());
    assert!(project.resolve("::m::U").is_some());
}

#[test]
fn test_stray_doc_comment() {
    let project = analyze(&[("m", "type T = int /// not at line start")]);
    assert!(codes(&project).contains(&"stray-doc-comment".to_string()));
    // The form itself still parses.
    assert!(project.resolve("::m::T").is_some());
}

#[test]
fn test_dispatch_statement_errors_drop_only_that_statement() {
    let source = "dispatch minecraft:thing[[dynamic]] to struct {}\n\
                  dispatch minecraft:thing[ok] to struct { a: int }";
    let project = analyze(&[("m", source)]);
    assert!(codes(&project).contains(&"dynamic-index-in-dispatch-statement".to_string()));
    let registry = project.symbols().registry("minecraft:thing").expect("registry");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_fallback_key_in_dispatch_statement() {
    let project = analyze(&[("m", "dispatch minecraft:thing[%fallback] to struct {}")]);
    assert!(codes(&project).contains(&"fallback-on-dispatch-lhs".to_string()));
    assert!(project.symbols().registry("minecraft:thing").is_none());
}

#[test]
fn test_diagnostics_preserve_emission_order() {
    let project = analyze(&[
        ("a", "type Broken = ( byte )"),
        ("b", "type AlsoBroken = ( short )"),
    ]);
    let diagnostics = project.diagnostics();
    assert!(diagnostics.len() >= 2);
    assert_eq!(diagnostics[0].file, "a");
    assert_eq!(diagnostics[1].file, "b");
}
