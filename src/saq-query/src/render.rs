//! Textual rendering of query results.

use std::collections::BTreeSet;

use saq_core::{Link, ObjectList, SaObject, Value};

use crate::value::QueryValue;

const INDENT: &str = "    ";

/// Render a query result for terminal output.
pub fn render(value: &QueryValue) -> String {
    match value {
        QueryValue::Value(v) => render_value(v),
        QueryValue::Object(obj) => render_object(obj),
        QueryValue::Objects(list) => render_objects(list),
        QueryValue::Grouping(grouping) => {
            let mut out = String::new();
            for (key, members) in grouping.iter() {
                out.push_str(&key.display_string());
                out.push_str(":\n");
                out.push_str(&indent_block(&render_objects(members)));
            }
            out
        }
        QueryValue::Chain(chain) => chain.to_string(),
        QueryValue::Absent => "none".to_string(),
    }
}

fn render_value(value: &Value) -> String {
    match Link::detect(value) {
        Some(Ok(link)) => link.display_string(),
        _ => value.display_string(),
    }
}

/// A single object: header line plus indented user fields.
///
/// ```text
/// #a (person, employee @hr)
///     name: Alice
///     salary: 100
/// ```
fn render_object(obj: &SaObject) -> String {
    let types: Vec<&str> = obj.types().collect();
    let mut out = format!("#{} ({} @{})\n", obj.id(), types.join(", "), obj.source());
    for (key, value) in obj.properties() {
        out.push_str(INDENT);
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&render_value(value));
        out.push('\n');
    }
    out
}

fn render_objects(list: &ObjectList) -> String {
    if list.is_empty() {
        return "No objects found\n".to_string();
    }
    if list.len() == 1 {
        return render_object(list.get(0).expect("non-empty"));
    }
    if list.single_id().is_some() {
        return render_logical_group(list);
    }

    // Mixed ids: one summary line per object.
    let mut out = String::new();
    for obj in list.iter() {
        let first_type = obj.types().next().unwrap_or("?");
        out.push_str(&format!("{first_type}#{}@{}\n", obj.id(), obj.source()));
    }
    out
}

/// Objects sharing one logical identity, merged across sources.
///
/// Fields all sources agree on render once; disagreements render one
/// bullet per source.
fn render_logical_group(list: &ObjectList) -> String {
    let id = list.single_id().expect("caller checked");

    let mut types: Vec<&str> = Vec::new();
    let mut sources: Vec<&str> = Vec::new();
    for obj in list.iter() {
        for t in obj.types() {
            if !types.contains(&t) {
                types.push(t);
            }
        }
        if !sources.contains(&obj.source()) {
            sources.push(obj.source());
        }
    }
    let mut out = format!(
        "#{id} ({} @{})\n",
        types.join(", "),
        sources.join(" @")
    );

    let field_names: BTreeSet<&str> = list
        .iter()
        .flat_map(|obj| obj.properties().map(|(k, _)| k))
        .collect();

    for field in field_names {
        let values: Vec<(&str, &Value)> = list
            .iter()
            .filter_map(|obj| obj.field(field).map(|v| (obj.source(), v)))
            .collect();
        let all_same = values.windows(2).all(|pair| pair[0].1 == pair[1].1);
        if all_same {
            let (_, value) = values.first().expect("field came from some object");
            out.push_str(&format!("{INDENT}{field}: {}\n", render_value(value)));
        } else {
            for (source, value) in values {
                out.push_str(&format!("{INDENT}{field}@{source}: {}\n", render_value(value)));
            }
        }
    }
    out
}

fn indent_block(text: &str) -> String {
    text.lines()
        .map(|line| format!("{INDENT}{line}\n"))
        .collect()
}
