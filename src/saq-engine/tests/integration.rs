//! End-to-end query evaluation against a seeded store.

use std::sync::Arc;

use serde_json::json;

use common_config::QueryConfig;
use common_error::SaqError;
use saq_core::{SaObject, Value};
use saq_engine::Executor;
use saq_query::QueryValue;
use saq_storage::SaoStore;

fn obj(json: serde_json::Value) -> SaObject {
    SaObject::from_json(json).unwrap()
}

/// Three people from source `hr`, two of them employees.
fn hr_store() -> Arc<SaoStore> {
    let store = Arc::new(SaoStore::new());
    store.replace_provider(
        "hr",
        vec![
            obj(json!({
                "__id__": "a", "__source__": "hr",
                "__types__": ["person", "employee"],
                "name": "Alice", "salary": 100, "team": "eng",
                "tags": ["x", "y"],
            })),
            obj(json!({
                "__id__": "b", "__source__": "hr",
                "__types__": ["person", "employee"],
                "name": "Bob", "salary": 80, "team": "eng",
            })),
            obj(json!({
                "__id__": "c", "__source__": "hr",
                "__types__": ["person"],
                "name": "Carol", "salary": 120, "team": "ops",
            })),
        ],
    );
    store
}

fn run(store: &Arc<SaoStore>, query: &str) -> QueryValue {
    Executor::default()
        .run(query, store.snapshot())
        .unwrap_or_else(|e| panic!("query '{query}' failed: {e}"))
        .value
}

fn run_err(store: &Arc<SaoStore>, query: &str) -> SaqError {
    match Executor::default().run(query, store.snapshot()) {
        Ok(outcome) => panic!("query '{query}' unexpectedly succeeded: {:?}", outcome.value),
        Err(e) => e,
    }
}

fn ids(value: &QueryValue) -> Vec<String> {
    match value {
        QueryValue::Objects(list) => list.iter().map(|o| o.id().to_string()).collect(),
        QueryValue::Object(obj) => vec![obj.id().to_string()],
        other => panic!("expected objects, got {other:?}"),
    }
}

#[test]
fn test_type_count() {
    let store = hr_store();
    assert_eq!(run(&store, "person.count()"), QueryValue::from(3i64));
    assert_eq!(run(&store, "employee.count()"), QueryValue::from(2i64));
}

#[test]
fn test_id_lookup() {
    let store = hr_store();
    let result = run(&store, "#a");
    assert_eq!(ids(&result), ["a"]);
}

#[test]
fn test_filter_by_predicate() {
    let store = hr_store();
    let result = run(&store, "person[.salary == 100]");
    assert_eq!(ids(&result), ["a"]);
}

#[test]
fn test_lowest_then_field() {
    let store = hr_store();
    assert_eq!(
        run(&store, "person.lowest(.salary).name"),
        QueryValue::Value(Value::from("Bob"))
    );
}

#[test]
fn test_projection_keeps_reserved_keys() {
    let store = hr_store();
    let QueryValue::Objects(list) = run(&store, "person{.name}") else {
        panic!("expected objects");
    };
    assert_eq!(list.len(), 3);
    for o in list.iter() {
        assert_eq!(o.fields().len(), 4);
        assert!(o.has_field("name"));
        assert!(!o.has_field("salary"));
    }
}

#[test]
fn test_projection_skips_absorbed_fields_not_objects() {
    let store = Arc::new(SaoStore::new());
    store.replace_provider(
        "hr",
        vec![
            obj(json!({
                "__id__": "a", "__source__": "hr", "__types__": ["person"],
                "name": "Alice", "nickname": "Al", "tags": ["x", "x"],
            })),
            obj(json!({
                "__id__": "b", "__source__": "hr", "__types__": ["person"],
                "name": "Bob",
            })),
        ],
    );

    // Bare field selection: the object missing the field stays, with the
    // field omitted from its projection.
    let QueryValue::Objects(list) = run(&store, "person{.name, .nickname}") else {
        panic!("expected objects");
    };
    assert_eq!(list.len(), 2);
    let alice = list.get(0).unwrap();
    assert_eq!(alice.field("nickname"), Some(&Value::from("Al")));
    let bob = list.get(1).unwrap();
    assert!(bob.has_field("name"));
    assert!(!bob.has_field("nickname"));

    // Same for derived chains that absorb mid-way.
    let QueryValue::Objects(list) = run(&store, "person{.name, .tags.unique()}") else {
        panic!("expected objects");
    };
    assert_eq!(list.len(), 2);
    let alice = list.get(0).unwrap();
    assert_eq!(
        alice.field("tags"),
        Some(&Value::List(vec![Value::from("x")]))
    );
    let bob = list.get(1).unwrap();
    assert!(!bob.has_field("tags"));
}

#[test]
fn test_missing_field_drops_object() {
    let store = hr_store();
    assert_eq!(
        run(&store, "person[.nickname == \"x\"].count()"),
        QueryValue::from(0i64)
    );
}

#[test]
fn test_duplicate_contribution_collapses() {
    let store = Arc::new(SaoStore::new());
    let a = json!({
        "__id__": "a", "__source__": "hr", "__types__": ["person"], "name": "Alice",
    });
    store.replace_provider("hr", vec![obj(a.clone()), obj(a)]);
    assert_eq!(run(&store, "person.count()"), QueryValue::from(1i64));
}

#[test]
fn test_absent_absorbs_through_the_chain() {
    let store = hr_store();
    assert_eq!(run(&store, "#a[0].nickname"), QueryValue::Absent);
    assert_eq!(run(&store, "#a[0].nickname.count()"), QueryValue::Absent);
}

#[test]
fn test_source_filter_and_reserved_shorthands() {
    let store = hr_store();
    assert_eq!(run(&store, "@hr.count()"), QueryValue::from(3i64));
    assert_eq!(run(&store, "@it.count()"), QueryValue::from(0i64));
    assert_eq!(
        run(&store, "#a[0].@"),
        QueryValue::Value(Value::from("hr"))
    );
    assert_eq!(run(&store, "#a[0].#"), QueryValue::Value(Value::from("a")));
}

#[test]
fn test_logical_operators() {
    let store = hr_store();
    assert_eq!(
        run(&store, "person[.salary == 80 || .salary == 120].count()"),
        QueryValue::from(2i64)
    );
    assert_eq!(
        run(&store, "person[.team == 'eng' && .salary == 100].count()"),
        QueryValue::from(1i64)
    );
    assert_eq!(
        run(&store, "person[!(.team == 'eng')].count()"),
        QueryValue::from(1i64)
    );
}

#[test]
fn test_regex_match() {
    let store = hr_store();
    assert_eq!(
        run(&store, "person[.name =~ '^A'].count()"),
        QueryValue::from(1i64)
    );
    let err = run_err(&store, "person[.name =~ '('].count()");
    assert!(matches!(err, SaqError::Value(_)), "got {err:?}");
}

#[test]
fn test_id_wildcard() {
    let store = hr_store();
    assert_eq!(run(&store, "#a*.count()"), QueryValue::from(1i64));
}

#[test]
fn test_contains() {
    let store = hr_store();
    assert_eq!(run(&store, "#a[0].tags.contains('x')"), QueryValue::from(true));
    assert_eq!(run(&store, "#a[0].tags.contains('z')"), QueryValue::from(false));
}

#[test]
fn test_field_over_list_collects_values() {
    let store = hr_store();
    let QueryValue::Value(Value::List(names)) = run(&store, "person.name") else {
        panic!("expected list of names");
    };
    assert_eq!(
        names,
        vec![Value::from("Alice"), Value::from("Bob"), Value::from("Carol")]
    );
}

#[test]
fn test_value_unwraps_single_element() {
    let store = hr_store();
    assert_eq!(
        run(&store, "person[.salary == 100].name.value()"),
        QueryValue::Value(Value::from("Alice"))
    );
    let err = run_err(&store, "person.name.value()");
    assert!(matches!(err, SaqError::Value(_)));
}

#[test]
fn test_single() {
    let store = hr_store();
    assert_eq!(
        run(&store, "employee.team.single()"),
        QueryValue::Value(Value::from("eng"))
    );
    let err = run_err(&store, "person.team.single()");
    assert!(matches!(err, SaqError::SingleDisagreement(_)));
}

#[test]
fn test_indexing() {
    let store = hr_store();
    assert_eq!(run(&store, "person[0].name"), QueryValue::Value(Value::from("Alice")));
    assert_eq!(run(&store, "person[-1].name"), QueryValue::Value(Value::from("Carol")));

    let err = run_err(&store, "person[3]");
    assert!(matches!(err, SaqError::IndexOutOfRange { index: 3, len: 3 }));

    let empty = Arc::new(SaoStore::new());
    let err = run_err(&empty, "person[0]");
    assert!(matches!(err, SaqError::IndexOutOfRange { index: 0, len: 0 }));
}

#[test]
fn test_slicing() {
    let store = hr_store();
    assert_eq!(run(&store, "person[0:2].count()"), QueryValue::from(2i64));
    assert_eq!(run(&store, "person[1:].count()"), QueryValue::from(2i64));
    assert_eq!(run(&store, "person[:1].count()"), QueryValue::from(1i64));
    assert_eq!(run(&store, "person[5:9].count()"), QueryValue::from(0i64));
}

#[test]
fn test_grouped_lowest() {
    let store = hr_store();
    let QueryValue::Grouping(grouping) = run(&store, "person.grouped_lowest(.salary, .team)")
    else {
        panic!("expected grouping");
    };
    assert_eq!(grouping.len(), 2);

    let groups: Vec<(String, Vec<&str>)> = grouping
        .iter()
        .map(|(key, members)| {
            (
                key.display_string(),
                members.iter().map(|o| o.id()).collect(),
            )
        })
        .collect();
    assert_eq!(
        groups,
        vec![
            ("eng".to_string(), vec!["b"]),
            ("ops".to_string(), vec!["c"]),
        ]
    );
}

#[test]
fn test_grouped_filter() {
    let store = hr_store();
    let result = run(&store, "person.grouped_filter(.count() == 2, .team)");
    assert_eq!(ids(&result), ["a", "b"]);
}

#[test]
fn test_map_flatten_unique() {
    let store = hr_store();
    let QueryValue::Value(Value::List(teams)) = run(&store, "person.map(.team).unique()") else {
        panic!("expected list");
    };
    assert_eq!(teams, vec![Value::from("eng"), Value::from("ops")]);
}

#[test]
fn test_has_field_and_any() {
    let store = hr_store();
    assert_eq!(run(&store, "#a[0].has_field('salary')"), QueryValue::from(true));
    assert_eq!(run(&store, "#a[0].has_field('badge')"), QueryValue::from(false));
    assert_eq!(run(&store, "person.any()"), QueryValue::from(true));
    assert_eq!(run(&store, "robot.any()"), QueryValue::from(false));
}

#[test]
fn test_type_errors_carry_operator_and_kinds() {
    let store = hr_store();
    let err = run_err(&store, "person.name.lowest(.x)");
    match err {
        SaqError::Type { operator, got, .. } => {
            assert_eq!(operator, "lowest");
            assert_eq!(got, "List");
        }
        other => panic!("expected type error, got {other:?}"),
    }
}

#[test]
fn test_literal_queries() {
    let store = hr_store();
    assert_eq!(run(&store, "42"), QueryValue::Value(Value::Int(42)));
    assert_eq!(run(&store, "'hi'"), QueryValue::Value(Value::from("hi")));
}

#[test]
fn test_star_is_whole_store() {
    let store = hr_store();
    assert_eq!(run(&store, "*.count()"), QueryValue::from(3i64));
}

#[test]
fn test_show_plan_returns_chain() {
    let store = hr_store();
    let QueryValue::Chain(chain) = run(&store, ".show_plan(.equals(.name, 'Alice'))") else {
        panic!("expected chain");
    };
    assert_eq!(chain.to_string(), ".equals(.get_field('name'), 'Alice')");
}

#[test]
fn test_to_json_round_trips() {
    let store = hr_store();
    let QueryValue::Value(Value::List(items)) = run(&store, "employee.to_json()") else {
        panic!("expected json list");
    };
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|v| v.as_map().is_some_and(|m| m.contains_key("__id__"))));
}

#[test]
fn test_fast_path_notes_and_rewrites() {
    let store = hr_store();
    let executor = Executor::new(QueryConfig {
        profile: true,
        ..QueryConfig::default()
    });

    let outcome = executor
        .run(".filter(.__types__.includes('person')).count()", store.snapshot())
        .unwrap();
    assert_eq!(outcome.value, QueryValue::from(3i64));
    assert!(outcome.rewrites.iter().any(|t| t.changed));
    let profile = outcome.profile.unwrap();
    assert!(profile.contains("filter → type_index ('person'"), "{profile}");

    let outcome = executor.run("#a.count()", store.snapshot()).unwrap();
    let profile = outcome.profile.unwrap();
    assert!(profile.contains("filter → id_index ('a'"), "{profile}");
}

// ---------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------

fn linked_store() -> Arc<SaoStore> {
    let store = Arc::new(SaoStore::new());
    store.replace_provider(
        "hr",
        vec![
            obj(json!({
                "__id__": "a", "__source__": "hr", "__types__": ["person"],
                "name": "Alice",
                "team": {"__sa_type__": "link", "query": "team#core", "label": "core team"},
            })),
            obj(json!({
                "__id__": "core", "__source__": "hr", "__types__": ["team"],
                "name": "Core",
            })),
        ],
    );
    store
}

#[test]
fn test_link_resolves_lazily() {
    let store = linked_store();
    let result = run(&store, "#a[0].team");
    assert_eq!(ids(&result), ["core"]);
    assert_eq!(run(&store, "#a[0].team.count()"), QueryValue::from(1i64));
}

#[test]
fn test_link_cycle_is_detected() {
    let store = Arc::new(SaoStore::new());
    store.replace_provider(
        "hr",
        vec![
            obj(json!({
                "__id__": "a", "__source__": "hr", "__types__": ["person"],
                "friend": {"__sa_type__": "link", "query": "#b[0].friend"},
            })),
            obj(json!({
                "__id__": "b", "__source__": "hr", "__types__": ["person"],
                "friend": {"__sa_type__": "link", "query": "#a[0].friend"},
            })),
        ],
    );
    let err = run_err(&store, "#a[0].friend");
    assert!(matches!(err, SaqError::LinkResolution(_)), "got {err:?}");
}

#[test]
fn test_invalid_link_query_is_a_link_error() {
    let store = Arc::new(SaoStore::new());
    store.replace_provider(
        "hr",
        vec![obj(json!({
            "__id__": "a", "__source__": "hr", "__types__": ["person"],
            "team": {"__sa_type__": "link", "query": "person[unclosed"},
        }))],
    );
    let err = run_err(&store, "#a[0].team");
    assert!(matches!(err, SaqError::LinkResolution(_)));
}

// ---------------------------------------------------------------------
// Store immutability
// ---------------------------------------------------------------------

#[test]
fn test_queries_do_not_mutate_the_store() {
    let store = hr_store();
    let before = store.snapshot();

    for query in [
        "person.count()",
        "person[.salary == 100]",
        "person{.name}",
        "person.grouped_lowest(.salary, .team)",
        "person.lowest(.salary).name",
    ] {
        let _ = run(&store, query);
    }

    let after = store.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(before.all(), after.all());
}
