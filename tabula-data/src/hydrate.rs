//! Assembly of flat result rows into nested records.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::resolve::JoinRegistry;
use crate::schema::{Column, ColumnType, EntitySchema};

/// A record keyed by logical column and relation names.
pub type Record = Map<String, Value>;

/// Fold rows produced by a hydrate or find-by-id statement into one record
/// per root primary key, in first-seen order.
///
/// Rows carry root columns under their logical names and relation columns
/// under `relation.column`. A many-to-one relation becomes an object (or
/// `null` when nothing matched); a one-to-many relation becomes an array
/// without duplicates.
pub fn assemble(root: &EntitySchema, joins: &JoinRegistry, rows: Vec<Record>) -> Vec<Record> {
    let pk = &root.primary_key().name;
    let mut records: Vec<Record> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(id) = row.get(pk).filter(|v| !v.is_null()) else {
            continue;
        };
        let key = id.to_string();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                records.push(own_fields(root.columns(), "", &row));
                index.insert(key, records.len() - 1);
                records.len() - 1
            }
        };
        let record = &mut records[slot];

        for join in joins.selected() {
            let prefix = format!("{}.", join.alias);
            let target_pk = &join.target.primary_key().name;
            let related = row
                .get(&format!("{prefix}{target_pk}"))
                .filter(|v| !v.is_null())
                .map(|_| Value::Object(own_fields(join.target.columns(), &prefix, &row)));

            if join.relation.is_to_many() {
                let entry = record
                    .entry(join.alias.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let (Value::Array(items), Some(Value::Object(child))) = (entry, related) {
                    let seen = items
                        .iter()
                        .any(|item| item.get(target_pk) == child.get(target_pk));
                    if !seen {
                        items.push(Value::Object(child));
                    }
                }
            } else if !record.contains_key(&join.alias) {
                record.insert(join.alias.clone(), related.unwrap_or(Value::Null));
            }
        }
    }
    records
}

/// Reorder records to follow `ids`; records whose id is not listed are dropped.
pub fn order_by_ids(root: &EntitySchema, records: Vec<Record>, ids: &[Value]) -> Vec<Record> {
    let pk = &root.primary_key().name;
    let mut by_id: HashMap<String, Record> = records
        .into_iter()
        .filter_map(|r| {
            let key = r.get(pk)?.to_string();
            Some((key, r))
        })
        .collect();
    ids.iter()
        .filter_map(|id| by_id.remove(&id.to_string()))
        .collect()
}

fn own_fields(columns: &[Column], prefix: &str, row: &Record) -> Record {
    let mut out = Map::new();
    for column in columns {
        let value = row
            .get(&format!("{prefix}{}", column.name))
            .cloned()
            .unwrap_or(Value::Null);
        out.insert(column.name.clone(), normalize(value, column.ty));
    }
    out
}

/// Backends without native boolean or JSON types hand back integers and
/// text for those columns.
fn normalize(value: Value, ty: ColumnType) -> Value {
    match (ty, value) {
        (ColumnType::Boolean, Value::Number(n)) => match n.as_i64() {
            Some(0) => Value::Bool(false),
            Some(_) => Value::Bool(true),
            None => Value::Number(n),
        },
        (ColumnType::Json, Value::String(s)) => {
            serde_json::from_str(&s).unwrap_or(Value::String(s))
        }
        (_, v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::build_find_query;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .schema(
                EntitySchema::builder("User", "users")
                    .primary("id", ColumnType::Integer)
                    .column("email", ColumnType::Text)
                    .column("active", ColumnType::Boolean)
                    .many_to_one("project", "Project", "project_id")
                    .one_to_many("uploads", "Asset", "user_id")
                    .build()
                    .unwrap(),
            )
            .schema(
                EntitySchema::builder("Project", "projects")
                    .primary("id", ColumnType::Integer)
                    .column("name", ColumnType::Text)
                    .build()
                    .unwrap(),
            )
            .schema(
                EntitySchema::builder("Asset", "assets")
                    .primary("id", ColumnType::Integer)
                    .column("meta", ColumnType::Json)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn nests_relations_and_dedupes_to_many() {
        let registry = registry();
        let relations = vec!["project".to_string(), "uploads".to_string()];
        let query = build_find_query(&registry, "User", &relations).unwrap();
        let rows = vec![
            row(json!({"id": 1, "email": "a", "active": 1, "project.id": 7, "project.name": "Alpha",
                       "uploads.id": 10, "uploads.meta": "{\"k\":1}"})),
            row(json!({"id": 1, "email": "a", "active": 1, "project.id": 7, "project.name": "Alpha",
                       "uploads.id": 11, "uploads.meta": null})),
            row(json!({"id": 1, "email": "a", "active": 1, "project.id": 7, "project.name": "Alpha",
                       "uploads.id": 10, "uploads.meta": "{\"k\":1}"})),
            row(json!({"id": 2, "email": "b", "active": 0, "project.id": null, "project.name": null,
                       "uploads.id": null, "uploads.meta": null})),
        ];
        let records = assemble(query.root(), query.joins(), rows);
        assert_eq!(
            Value::Array(records.into_iter().map(Value::Object).collect()),
            json!([
                {"id": 1, "email": "a", "active": true,
                 "project": {"id": 7, "name": "Alpha"},
                 "uploads": [{"id": 10, "meta": {"k": 1}}, {"id": 11, "meta": null}]},
                {"id": 2, "email": "b", "active": false, "project": null, "uploads": []}
            ])
        );
    }

    #[test]
    fn ordering_follows_page_ids() {
        let registry = registry();
        let query = build_find_query(&registry, "User", &[]).unwrap();
        let rows = vec![
            row(json!({"id": 1, "email": "a", "active": true})),
            row(json!({"id": 2, "email": "b", "active": true})),
            row(json!({"id": 3, "email": "c", "active": true})),
        ];
        let records = assemble(query.root(), query.joins(), rows);
        let ordered = order_by_ids(query.root(), records, &[json!(3), json!(1), json!(2)]);
        let ids: Vec<_> = ordered.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
        assert!(!ordered[0].contains_key("project"));
    }
}
