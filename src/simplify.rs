//! Assignability and union simplification.
//!
//! `assignable(A, B)` is the compositional subset relation the engine uses
//! both for validation queries and to canonicalize unions. `unsafe` is top
//! and bottom; the empty union is bottom; `any` is top, and by default also
//! behaves like `unsafe` (a host-visible toggle on [`ValidatorProfile`]).
//!
//! Simplification flattens a union one level, drops bottom members, and
//! trims members subsumed by a peer, recording them on the survivor's
//! `shadowed` list for tooling.
use crate::ast::{EnumBaseKind, EnumValue, EnumVariant, Range, TypedNumber};
use crate::eval::{Cancelled, EvalResult, TypeEngine};
use crate::types::{Type, TypeKind};
use std::fmt;

type OverrideFn = Box<dyn Fn(&Type, &Type) -> Option<bool> + Send + Sync>;

enum ProfileKind {
    Strict,
    Json,
    Nbt,
    Custom(OverrideFn),
}

/// A data-validator profile: a pure pre-filter consulted before the default
/// assignability rules, plus the `any`-is-`unsafe` toggle.
pub struct ValidatorProfile {
    /// When set (the default), `any` is assignable both ways so that
    /// unspecified values stay usable.
    pub default_any_is_unsafe: bool,
    kind: ProfileKind,
}

impl Default for ValidatorProfile {
    fn default() -> Self {
        ValidatorProfile {
            default_any_is_unsafe: true,
            kind: ProfileKind::Strict,
        }
    }
}

impl fmt::Debug for ValidatorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ProfileKind::Strict => "strict",
            ProfileKind::Json => "json",
            ProfileKind::Nbt => "nbt",
            ProfileKind::Custom(_) => "custom",
        };
        f.debug_struct("ValidatorProfile")
            .field("default_any_is_unsafe", &self.default_any_is_unsafe)
            .field("kind", &kind)
            .finish()
    }
}

impl ValidatorProfile {
    /// Kind-strict assignability; no overrides.
    #[must_use]
    pub fn strict() -> Self {
        ValidatorProfile::default()
    }

    /// JSON data carries one number type, so all numeric kinds are mutually
    /// assignable; only ranges matter.
    #[must_use]
    pub fn json() -> Self {
        ValidatorProfile {
            default_any_is_unsafe: true,
            kind: ProfileKind::Json,
        }
    }

    /// NBT has no boolean tag: `boolean ≡ byte @ 0..1 ⊂ byte`.
    #[must_use]
    pub fn nbt() -> Self {
        ValidatorProfile {
            default_any_is_unsafe: true,
            kind: ProfileKind::Nbt,
        }
    }

    /// A custom override consulted before the default rules; `None` falls
    /// through.
    #[must_use]
    pub fn with_override(
        check: impl Fn(&Type, &Type) -> Option<bool> + Send + Sync + 'static,
    ) -> Self {
        ValidatorProfile {
            default_any_is_unsafe: true,
            kind: ProfileKind::Custom(Box::new(check)),
        }
    }

    #[must_use]
    pub fn any_is_unsafe(mut self, value: bool) -> Self {
        self.default_any_is_unsafe = value;
        self
    }

    fn check(&self, a: &Type, b: &Type) -> Option<bool> {
        match &self.kind {
            ProfileKind::Strict => None,
            ProfileKind::Custom(check) => check(a, b),
            ProfileKind::Json => match (&a.kind, &b.kind) {
                (
                    TypeKind::Numeric {
                        kind: ka,
                        value_range: ra,
                    },
                    TypeKind::Numeric {
                        kind: kb,
                        value_range: rb,
                    },
                ) => Some(opt_range_subset(
                    ra,
                    rb,
                    ka.is_integer() && kb.is_integer(),
                )),
                (TypeKind::LiteralNumber(n), TypeKind::Numeric { value_range, .. }) => {
                    Some(value_range.map_or(true, |r| r.contains(n.value.as_f64())))
                }
                _ => None,
            },
            ProfileKind::Nbt => match (&a.kind, &b.kind) {
                (
                    TypeKind::Boolean,
                    TypeKind::Numeric {
                        kind: crate::ast::NumericKind::Byte,
                        value_range,
                    },
                ) => Some(match value_range {
                    None => true,
                    Some(range) => Range::between(0.0, 1.0).subset_of(range, true),
                }),
                (
                    TypeKind::Numeric {
                        kind: crate::ast::NumericKind::Byte,
                        value_range,
                    },
                    TypeKind::Boolean,
                ) => Some(match value_range {
                    None => false,
                    Some(range) => range.subset_of(&Range::between(0.0, 1.0), true),
                }),
                (
                    TypeKind::LiteralBool(value),
                    TypeKind::Numeric {
                        kind: crate::ast::NumericKind::Byte,
                        value_range,
                    },
                ) => Some(
                    value_range.map_or(true, |r| r.contains(if *value { 1.0 } else { 0.0 })),
                ),
                (TypeKind::LiteralNumber(n), TypeKind::Boolean) => Some(
                    n.kind == crate::ast::NumericKind::Byte
                        && matches!(n.value.as_f64(), v if v == 0.0 || v == 1.0),
                ),
                _ => None,
            },
        }
    }
}

/// The subset relation `A ⊆ B`.
pub fn assignable(engine: &TypeEngine, a: &Type, b: &Type) -> EvalResult<bool> {
    let mut assumptions = Vec::new();
    assignable_inner(engine, a, b, &mut assumptions)
}

fn assignable_inner(
    engine: &TypeEngine,
    a: &Type,
    b: &Type,
    assumptions: &mut Vec<(String, String)>,
) -> EvalResult<bool> {
    if engine.is_cancelled() {
        return Err(Cancelled);
    }
    if let Some(verdict) = engine.profile().check(a, b) {
        return Ok(verdict);
    }
    if matches!(a.kind, TypeKind::Unsafe) || matches!(b.kind, TypeKind::Unsafe) {
        return Ok(true);
    }
    if engine.profile().default_any_is_unsafe
        && (matches!(a.kind, TypeKind::Any) || matches!(b.kind, TypeKind::Any))
    {
        return Ok(true);
    }
    if matches!(b.kind, TypeKind::Any) {
        return Ok(true);
    }
    if matches!(a.kind, TypeKind::Any) {
        return Ok(false);
    }
    if matches!(a.kind, TypeKind::Bottom) {
        return Ok(true);
    }
    if a.is_error() || b.is_error() {
        return Ok(false);
    }
    if matches!(b.kind, TypeKind::Bottom) {
        return Ok(false);
    }

    // Containers and handles can recurse through the type graph; a pair
    // already under consideration on this path is assumed to hold
    // (coinduction), which is what makes `Node ⊆ Node` terminate.
    let recursive = [a, b].iter().any(|t| {
        matches!(
            t.kind,
            TypeKind::Handle { .. }
                | TypeKind::Struct { .. }
                | TypeKind::List { .. }
                | TypeKind::Tuple { .. }
        )
    });
    if recursive {
        let pair = (a.to_string(), b.to_string());
        if assumptions.contains(&pair) {
            return Ok(true);
        }
        assumptions.push(pair);
        let verdict = check_pair(engine, a, b, assumptions);
        assumptions.pop();
        verdict
    } else {
        check_pair(engine, a, b, assumptions)
    }
}

fn check_pair(
    engine: &TypeEngine,
    a: &Type,
    b: &Type,
    assumptions: &mut Vec<(String, String)>,
) -> EvalResult<bool> {
    if matches!(a.kind, TypeKind::Handle { .. }) || matches!(b.kind, TypeKind::Handle { .. }) {
        let fa = engine.force_type(a)?;
        let fb = engine.force_type(b)?;
        return assignable_inner(engine, &fa, &fb, assumptions);
    }
    if let TypeKind::Union { members } = &a.kind {
        for member in members {
            if !assignable_inner(engine, member, b, assumptions)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if let TypeKind::Union { members } = &b.kind {
        for member in members {
            if assignable_inner(engine, a, member, assumptions)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    if let TypeKind::Enum { base, variants } = &a.kind {
        for variant in variants {
            let literal = variant_literal(*base, variant);
            if !assignable_inner(engine, &literal, b, assumptions)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if let TypeKind::Enum { base, variants } = &b.kind {
        return Ok(variants
            .iter()
            .any(|variant| literal_matches_variant(a, *base, variant)));
    }

    Ok(match (&a.kind, &b.kind) {
        (TypeKind::Boolean, TypeKind::Boolean) => true,
        (TypeKind::LiteralBool(_), TypeKind::Boolean) => true,
        (TypeKind::LiteralBool(x), TypeKind::LiteralBool(y)) => x == y,
        (TypeKind::String { len_range: ra }, TypeKind::String { len_range: rb }) => {
            opt_range_subset(ra, rb, true)
        }
        (TypeKind::LiteralString(s), TypeKind::String { len_range }) => {
            len_range.map_or(true, |r| r.contains(s.chars().count() as f64))
        }
        (TypeKind::LiteralString(x), TypeKind::LiteralString(y)) => x == y,
        (TypeKind::LiteralNumber(n), TypeKind::Numeric { kind, value_range }) => {
            n.kind == *kind && value_range.map_or(true, |r| r.contains(n.value.as_f64()))
        }
        (TypeKind::LiteralNumber(x), TypeKind::LiteralNumber(y)) => {
            x.kind == y.kind && x.value.as_f64() == y.value.as_f64()
        }
        (
            TypeKind::Numeric {
                kind: ka,
                value_range: ra,
            },
            TypeKind::Numeric {
                kind: kb,
                value_range: rb,
            },
        ) => ka == kb && opt_range_subset(ra, rb, ka.is_integer()),
        (
            TypeKind::PrimArray {
                kind: ka,
                elem_range: ea,
                len_range: la,
            },
            TypeKind::PrimArray {
                kind: kb,
                elem_range: eb,
                len_range: lb,
            },
        ) => ka == kb && opt_range_subset(ea, eb, true) && opt_range_subset(la, lb, true),
        (
            TypeKind::List {
                elem: ea,
                len_range: la,
            },
            TypeKind::List {
                elem: eb,
                len_range: lb,
            },
        ) => {
            if !opt_range_subset(la, lb, true) {
                return Ok(false);
            }
            let fa = engine.force(ea)?;
            let fb = engine.force(eb)?;
            assignable_inner(engine, &fa, &fb, assumptions)?
        }
        (TypeKind::Tuple { elems: ea }, TypeKind::Tuple { elems: eb }) => {
            if ea.len() != eb.len() {
                return Ok(false);
            }
            for (x, y) in ea.iter().zip(eb) {
                let fx = engine.force(x)?;
                let fy = engine.force(y)?;
                if !assignable_inner(engine, &fx, &fy, assumptions)? {
                    return Ok(false);
                }
            }
            true
        }
        (TypeKind::Tuple { elems }, TypeKind::List { elem, len_range }) => {
            if !len_range.map_or(true, |r| r.contains(elems.len() as f64)) {
                return Ok(false);
            }
            let target = engine.force(elem)?;
            for member in elems {
                let forced = engine.force(member)?;
                if !assignable_inner(engine, &forced, &target, assumptions)? {
                    return Ok(false);
                }
            }
            true
        }
        (TypeKind::Struct { fields: af }, TypeKind::Struct { fields: bf }) => {
            for bfield in bf {
                // Computed keys have no static identity to match on.
                let Some(key) = bfield.key.text() else {
                    continue;
                };
                match af.iter().find(|f| f.key.text() == Some(key)) {
                    Some(afield) => {
                        if afield.optional && !bfield.optional {
                            return Ok(false);
                        }
                        let fa = engine.force(&afield.ty)?;
                        let fb = engine.force(&bfield.ty)?;
                        if !assignable_inner(engine, &fa, &fb, assumptions)? {
                            return Ok(false);
                        }
                    }
                    None => {
                        if !bfield.optional {
                            return Ok(false);
                        }
                    }
                }
            }
            // Width subtyping: extra fields in A are tolerated.
            true
        }
        _ => false,
    })
}

fn variant_literal(base: EnumBaseKind, variant: &EnumVariant) -> Type {
    match &variant.value {
        EnumValue::Number(n) => Type::new(TypeKind::LiteralNumber(TypedNumber {
            value: n.value,
            kind: base.numeric_kind().unwrap_or(n.kind),
        })),
        EnumValue::String(s) => Type::new(TypeKind::LiteralString(s.clone())),
    }
}

fn literal_matches_variant(a: &Type, _base: EnumBaseKind, variant: &EnumVariant) -> bool {
    match (&a.kind, &variant.value) {
        (TypeKind::LiteralString(s), EnumValue::String(v)) => s == v,
        (TypeKind::LiteralNumber(n), EnumValue::Number(v)) => {
            n.value.as_f64() == v.value.as_f64()
        }
        _ => false,
    }
}

fn opt_range_subset(a: &Option<Range>, b: &Option<Range>, integral: bool) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a.subset_of(b, integral),
    }
}

/// Canonicalizes a type; a no-op except on unions.
pub fn simplify(engine: &TypeEngine, ty: &Type) -> EvalResult<Type> {
    match &ty.kind {
        TypeKind::Union { members } => {
            let mut simplified =
                simplify_union(engine, members.clone(), ty.attributes.clone())?;
            simplified.shadowed.extend(ty.shadowed.iter().cloned());
            Ok(simplified)
        }
        _ => Ok(ty.clone()),
    }
}

/// Builds the canonical form of a union from already-instantiated members:
/// flatten one level, drop bottoms, trim dominated members onto their
/// dominator's `shadowed` list, unwrap singletons.
pub fn simplify_union(
    engine: &TypeEngine,
    members: Vec<Type>,
    attributes: Vec<crate::ast::Attribute>,
) -> EvalResult<Type> {
    let mut flat = Vec::with_capacity(members.len());
    for member in members {
        match member.kind {
            TypeKind::Union {
                members: mut inner,
            } => flat.append(&mut inner),
            TypeKind::Bottom => {}
            _ => flat.push(member),
        }
    }

    let mut slots: Vec<Option<Type>> = flat.into_iter().map(Some).collect();
    for i in 0..slots.len() {
        for j in (i + 1)..slots.len() {
            if slots[i].is_none() {
                break;
            }
            let (forward, backward) = {
                let (Some(x), Some(y)) = (&slots[i], &slots[j]) else {
                    continue;
                };
                (assignable(engine, x, y)?, assignable(engine, y, x)?)
            };
            if forward && backward {
                // Mutually assignable: the first in source order survives.
                if let Some(dropped) = slots[j].take() {
                    if let Some(keeper) = slots[i].as_mut() {
                        keeper.shadowed.push(dropped);
                    }
                }
            } else if forward {
                // Strict subset: x disappears into y.
                if let Some(dropped) = slots[i].take() {
                    if let Some(keeper) = slots[j].as_mut() {
                        keeper.shadowed.push(dropped);
                    }
                }
            } else if backward {
                if let Some(dropped) = slots[j].take() {
                    if let Some(keeper) = slots[i].as_mut() {
                        keeper.shadowed.push(dropped);
                    }
                }
            }
        }
    }

    let mut remaining: Vec<Type> = slots.into_iter().flatten().collect();
    match remaining.len() {
        0 => Ok(Type::with_attributes(TypeKind::Bottom, attributes)),
        1 => {
            let mut only = remaining.remove(0);
            only.attributes.extend(attributes);
            Ok(only)
        }
        _ => Ok(Type::with_attributes(
            TypeKind::Union { members: remaining },
            attributes,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NumberValue, NumericKind};
    use crate::error::DiagnosticSink;
    use crate::eval::{CancelToken, InstCache};
    use crate::resolver::SymbolTable;

    fn with_engine<T>(profile: ValidatorProfile, run: impl FnOnce(&TypeEngine) -> T) -> T {
        let symbols = SymbolTable::new();
        let cache = InstCache::new();
        let sink = DiagnosticSink::new();
        let engine = TypeEngine::new(&symbols, &cache, &sink, &profile, CancelToken::new());
        run(&engine)
    }

    fn int(range: Option<Range>) -> Type {
        Type::new(TypeKind::Numeric {
            kind: NumericKind::Int,
            value_range: range,
        })
    }

    fn byte(range: Option<Range>) -> Type {
        Type::new(TypeKind::Numeric {
            kind: NumericKind::Byte,
            value_range: range,
        })
    }

    fn int_lit(value: i64) -> Type {
        Type::new(TypeKind::LiteralNumber(TypedNumber {
            value: NumberValue::Int(value),
            kind: NumericKind::Int,
        }))
    }

    fn string() -> Type {
        Type::new(TypeKind::String { len_range: None })
    }

    fn str_lit(s: &str) -> Type {
        Type::new(TypeKind::LiteralString(s.to_string()))
    }

    fn union(members: Vec<Type>) -> Type {
        Type::new(TypeKind::Union { members })
    }

    #[test]
    fn test_reflexivity() {
        with_engine(ValidatorProfile::default(), |engine| {
            for ty in [
                Type::any(),
                Type::bottom(),
                Type::new(TypeKind::Boolean),
                string(),
                int(Some(Range::between(0.0, 5.0))),
                str_lit("x"),
                union(vec![string(), int(None)]),
            ] {
                assert!(
                    assignable(engine, &ty, &ty).expect("not cancelled"),
                    "{ty} not assignable to itself"
                );
            }
        });
    }

    #[test]
    fn test_bottom_and_top() {
        with_engine(ValidatorProfile::default(), |engine| {
            assert!(assignable(engine, &Type::bottom(), &string()).expect("ok"));
            assert!(assignable(engine, &string(), &Type::any()).expect("ok"));
            assert!(!assignable(engine, &string(), &Type::bottom()).expect("ok"));
        });
    }

    #[test]
    fn test_any_is_unsafe_toggle() {
        with_engine(ValidatorProfile::default(), |engine| {
            // Default: any behaves like unsafe, both directions work.
            assert!(assignable(engine, &Type::any(), &int(None)).expect("ok"));
        });
        with_engine(ValidatorProfile::strict().any_is_unsafe(false), |engine| {
            assert!(!assignable(engine, &Type::any(), &int(None)).expect("ok"));
            assert!(assignable(engine, &int(None), &Type::any()).expect("ok"));
        });
    }

    #[test]
    fn test_error_type_only_into_any_and_unsafe() {
        with_engine(ValidatorProfile::strict().any_is_unsafe(false), |engine| {
            assert!(assignable(engine, &Type::error(), &Type::any()).expect("ok"));
            assert!(
                assignable(engine, &Type::error(), &Type::new(TypeKind::Unsafe)).expect("ok")
            );
            assert!(!assignable(engine, &Type::error(), &int(None)).expect("ok"));
            assert!(!assignable(engine, &int(None), &Type::error()).expect("ok"));
        });
    }

    #[test]
    fn test_numeric_range_subset() {
        with_engine(ValidatorProfile::default(), |engine| {
            let narrow = int(Some(Range::between(1.0, 3.0)));
            let wide = int(Some(Range::between(0.0, 10.0)));
            assert!(assignable(engine, &narrow, &wide).expect("ok"));
            assert!(!assignable(engine, &wide, &narrow).expect("ok"));
            // Kinds are strict by default.
            assert!(!assignable(engine, &byte(None), &int(None)).expect("ok"));
        });
    }

    #[test]
    fn test_exclusive_endpoints() {
        with_engine(ValidatorProfile::default(), |engine| {
            let exclusive = int(Some(Range {
                min: Some(0.0),
                max: Some(5.0),
                exclusive_min: false,
                exclusive_max: true,
            }));
            let inclusive = int(Some(Range::between(0.0, 5.0)));
            assert!(assignable(engine, &exclusive, &inclusive).expect("ok"));
            // 0..5 includes 5, 0..<5 does not; integral tightening makes
            // 0..<5 equal to 0..4.
            assert!(!assignable(engine, &inclusive, &exclusive).expect("ok"));
            assert!(assignable(engine, &int_lit(4), &exclusive).expect("ok"));
            assert!(!assignable(engine, &int_lit(5), &exclusive).expect("ok"));
        });
    }

    #[test]
    fn test_empty_integer_range_rejects_all_literals() {
        with_engine(ValidatorProfile::default(), |engine| {
            let empty = int(Some(Range {
                min: Some(1.0),
                max: Some(2.0),
                exclusive_min: true,
                exclusive_max: true,
            }));
            for value in [0, 1, 2, 3] {
                assert!(!assignable(engine, &int_lit(value), &empty).expect("ok"));
            }
            // But the empty range itself is a subset of anything.
            assert!(assignable(engine, &empty, &int(None)).expect("ok"));
        });
    }

    #[test]
    fn test_string_length_ranges() {
        with_engine(ValidatorProfile::default(), |engine| {
            let bounded = Type::new(TypeKind::String {
                len_range: Some(Range::between(1.0, 3.0)),
            });
            assert!(assignable(engine, &str_lit("ab"), &bounded).expect("ok"));
            assert!(!assignable(engine, &str_lit(""), &bounded).expect("ok"));
            assert!(!assignable(engine, &str_lit("abcd"), &bounded).expect("ok"));
            assert!(assignable(engine, &bounded, &string()).expect("ok"));
        });
    }

    #[test]
    fn test_union_rules() {
        with_engine(ValidatorProfile::default(), |engine| {
            let sum = union(vec![string(), int(None)]);
            assert!(assignable(engine, &str_lit("x"), &sum).expect("ok"));
            assert!(assignable(engine, &sum, &union(vec![string(), int(None), byte(None)]))
                .expect("ok"));
            assert!(!assignable(engine, &sum, &string()).expect("ok"));
        });
    }

    #[test]
    fn test_enum_as_literal_set() {
        with_engine(ValidatorProfile::default(), |engine| {
            let color = Type::new(TypeKind::Enum {
                base: EnumBaseKind::String,
                variants: vec![
                    EnumVariant {
                        name: "Red".to_string(),
                        value: EnumValue::String("red".to_string()),
                        attributes: Vec::new(),
                        doc: None,
                    },
                    EnumVariant {
                        name: "Green".to_string(),
                        value: EnumValue::String("green".to_string()),
                        attributes: Vec::new(),
                        doc: None,
                    },
                ],
            });
            assert!(assignable(engine, &color, &string()).expect("ok"));
            assert!(assignable(engine, &str_lit("red"), &color).expect("ok"));
            assert!(!assignable(engine, &str_lit("blue"), &color).expect("ok"));
        });
    }

    #[test]
    fn test_json_profile_merges_numeric_kinds() {
        with_engine(ValidatorProfile::json(), |engine| {
            assert!(assignable(engine, &byte(None), &int(None)).expect("ok"));
            let narrow = byte(Some(Range::between(0.0, 1.0)));
            let wide = int(Some(Range::between(0.0, 10.0)));
            assert!(assignable(engine, &narrow, &wide).expect("ok"));
            assert!(!assignable(engine, &wide, &narrow).expect("ok"));
        });
    }

    #[test]
    fn test_nbt_profile_boolean_byte() {
        with_engine(ValidatorProfile::nbt(), |engine| {
            let bool_ty = Type::new(TypeKind::Boolean);
            assert!(assignable(engine, &bool_ty, &byte(None)).expect("ok"));
            let flag = byte(Some(Range::between(0.0, 1.0)));
            assert!(assignable(engine, &flag, &bool_ty).expect("ok"));
            assert!(!assignable(engine, &byte(None), &bool_ty).expect("ok"));
        });
    }

    #[test]
    fn test_simplify_shadows_subsumed_literals() {
        with_engine(ValidatorProfile::default(), |engine| {
            let input = union(vec![string(), str_lit("foo"), str_lit("bar")]);
            let simplified = simplify(engine, &input).expect("ok");
            assert!(matches!(simplified.kind, TypeKind::String { .. }));
            assert_eq!(simplified.shadowed.len(), 2);
            assert_eq!(
                simplified.shadowed[0].kind,
                TypeKind::LiteralString("foo".to_string())
            );
            assert_eq!(
                simplified.shadowed[1].kind,
                TypeKind::LiteralString("bar".to_string())
            );
        });
    }

    #[test]
    fn test_simplify_drops_bottom_and_flattens() {
        with_engine(ValidatorProfile::default(), |engine| {
            let input = union(vec![
                Type::bottom(),
                union(vec![string(), int(None)]),
                byte(None),
            ]);
            let simplified = simplify(engine, &input).expect("ok");
            match simplified.kind {
                TypeKind::Union { members } => assert_eq!(members.len(), 3),
                other => panic!("expected a union, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_simplify_mutual_members_keep_first() {
        with_engine(ValidatorProfile::default(), |engine| {
            let input = union(vec![str_lit("x"), str_lit("x")]);
            let simplified = simplify(engine, &input).expect("ok");
            assert_eq!(simplified.kind, TypeKind::LiteralString("x".to_string()));
            assert_eq!(simplified.shadowed.len(), 1);
        });
    }

    #[test]
    fn test_simplify_single_member_unwraps() {
        with_engine(ValidatorProfile::default(), |engine| {
            let input = union(vec![Type::bottom(), string()]);
            let simplified = simplify(engine, &input).expect("ok");
            assert!(matches!(simplified.kind, TypeKind::String { .. }));
        });
    }

    #[test]
    fn test_simplify_is_idempotent() {
        with_engine(ValidatorProfile::default(), |engine| {
            let inputs = [
                union(vec![string(), str_lit("foo")]),
                union(vec![int(None), string(), Type::bottom()]),
                union(Vec::new()),
                string(),
            ];
            for input in inputs {
                let once = simplify(engine, &input).expect("ok");
                let twice = simplify(engine, &once).expect("ok");
                assert_eq!(once, twice, "simplify not idempotent on {input}");
            }
        });
    }

    #[test]
    fn test_empty_union_simplifies_to_bottom() {
        with_engine(ValidatorProfile::default(), |engine| {
            let simplified = simplify(engine, &union(Vec::new())).expect("ok");
            assert!(simplified.is_bottom());
        });
    }

    #[test]
    fn test_custom_override_wins() {
        let profile = ValidatorProfile::with_override(|a, b| {
            match (&a.kind, &b.kind) {
                // Pretend strings accept anything, for the sake of the test.
                (_, TypeKind::String { .. }) => Some(true),
                _ => None,
            }
        });
        with_engine(profile, |engine| {
            assert!(assignable(engine, &int(None), &string()).expect("ok"));
        });
    }

    #[test]
    fn test_transitivity_sample() {
        with_engine(ValidatorProfile::default(), |engine| {
            let a = int(Some(Range::between(2.0, 3.0)));
            let b = int(Some(Range::between(1.0, 5.0)));
            let c = int(Some(Range::between(0.0, 10.0)));
            assert!(assignable(engine, &a, &b).expect("ok"));
            assert!(assignable(engine, &b, &c).expect("ok"));
            assert!(assignable(engine, &a, &c).expect("ok"));
        });
    }
}
