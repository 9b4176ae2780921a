//! Property tests: optimizer equivalence, absorption, parse round-trips.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use common_config::QueryConfig;
use saq_core::SaObject;
use saq_engine::{evaluate_root, EvalContext, Executor, Registry};
use saq_query::{parse_query, Parsed, QueryValue};
use saq_storage::SaoStore;

#[derive(Debug, Clone)]
struct Person {
    id: String,
    salary: i64,
    team: &'static str,
    employee: bool,
}

fn arb_person() -> impl Strategy<Value = Person> {
    (
        "[a-z][a-z0-9]{0,5}",
        0i64..500,
        prop::sample::select(vec!["eng", "ops", "qa"]),
        any::<bool>(),
    )
        .prop_map(|(id, salary, team, employee)| Person {
            id,
            salary,
            team,
            employee,
        })
}

fn seed_store(people: &[Person]) -> Arc<SaoStore> {
    let store = Arc::new(SaoStore::new());
    let objects = people
        .iter()
        .map(|p| {
            let types = if p.employee {
                json!(["person", "employee"])
            } else {
                json!(["person"])
            };
            SaObject::from_json(json!({
                "__id__": p.id,
                "__source__": "gen",
                "__types__": types,
                "salary": p.salary,
                "team": p.team,
            }))
            .unwrap()
        })
        .collect();
    store.replace_provider("gen", objects);
    store
}

/// Evaluate without the optimizer, straight from the parsed chain.
fn run_unoptimized(store: &Arc<SaoStore>, query: &str) -> QueryValue {
    let Parsed::Chain(chain) = parse_query(query).unwrap() else {
        panic!("expected chain query");
    };
    let registry = Arc::new(Registry::standard());
    let mut ctx = EvalContext::new(registry, store.snapshot(), &QueryConfig::default());
    evaluate_root(&mut ctx, &chain).unwrap()
}

fn run_optimized(store: &Arc<SaoStore>, query: &str) -> QueryValue {
    Executor::default().run(query, store.snapshot()).unwrap().value
}

proptest! {
    /// Wherever a rewrite fires, the optimized evaluation matches naive
    /// execution on the same store.
    #[test]
    fn optimizer_equivalence(people in prop::collection::vec(arb_person(), 0..20), salary in 0i64..500) {
        let store = seed_store(&people);
        let probe_id = people.first().map_or_else(|| "nobody".to_string(), |p| p.id.clone());

        let queries = [
            ".filter(.__types__.includes('person')).count()".to_string(),
            ".filter(.__types__.includes('employee'))".to_string(),
            format!(".filter(.__id__ =~ '^{probe_id}$')"),
            format!(".filter(.__types__.includes('person') && .salary == {salary})"),
        ];

        for query in &queries {
            prop_assert_eq!(
                run_unoptimized(&store, query),
                run_optimized(&store, query),
                "query diverged: {}",
                query
            );
        }
    }

    /// Queries never mutate the store.
    #[test]
    fn evaluation_is_read_only(people in prop::collection::vec(arb_person(), 0..12)) {
        let store = seed_store(&people);
        let before = store.snapshot();

        let _ = run_optimized(&store, "person[.salary == 100].count()");
        let _ = run_optimized(&store, "person.grouped_lowest(.salary, .team)");

        let after = store.snapshot();
        prop_assert!(Arc::ptr_eq(&before, &after));
    }
}

#[test]
fn absorbing_none_propagates_through_scalar_operators() {
    let store = seed_store(&[Person {
        id: "a".to_string(),
        salary: 10,
        team: "eng",
        employee: true,
    }]);

    // Every scalar operator must absorb a missing-field operand.
    let absorbed = [
        "#a[0].ghost",
        "#a[0].ghost.count()",
        "#a[0].ghost.single()",
        "#a[0].ghost.value()",
        "#a[0].ghost.flatten()",
        "#a[0].equals(.ghost, 1)",
        "#a[0].has_field(.ghost)",
        ".equals(#a[0].ghost, 1)",
        "#a[0][.ghost =~ 'x'].count()",
    ];
    for query in absorbed {
        let value = run_optimized(&store, query);
        let expected: QueryValue = match query {
            // The iterating filter drops the element instead of absorbing.
            "#a[0][.ghost =~ 'x'].count()" => QueryValue::from(0i64),
            _ => QueryValue::Absent,
        };
        assert_eq!(value, expected, "query: {query}");
    }
}

#[test]
fn parse_round_trip_is_stable() {
    let corpus = [
        "person.count()",
        "#a",
        "@hr",
        "person[.salary == 100]",
        "person.lowest(.salary).name",
        "person{.name, .salary}",
        "person[.team == 'eng' && .salary == 100]",
        "person[.salary == 80 || .salary == 120].count()",
        "person[!(.team == 'eng')]",
        "person[.name =~ '^A']",
        "person.grouped_lowest(.salary, .team)",
        "person.grouped_filter(.count() == 2, .team)",
        "person[0]",
        "person[1:3]",
        "person.map(.team).unique()",
        ".filter(.__types__.includes('person'))",
        ".filter(.__id__ =~ '^a$')",
        "*",
    ];

    for query in corpus {
        let Parsed::Chain(first) = parse_query(query).unwrap() else {
            panic!("corpus entry is not a chain: {query}");
        };
        let rendered = first.to_string();
        let Parsed::Chain(second) = parse_query(&rendered)
            .unwrap_or_else(|e| panic!("re-parse of '{rendered}' failed: {e}"))
        else {
            panic!("re-parse is not a chain: {rendered}");
        };
        assert_eq!(first, second, "round trip diverged for: {query}");
    }
}
