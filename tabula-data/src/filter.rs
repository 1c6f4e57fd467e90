//! Typed representation of the `filters` request payload.
//!
//! The payload is an arbitrarily nested JSON object. It is flattened into
//! dotted keys (`{"project": {"name": "Alpha"}}` becomes `project.name`),
//! each key is split into a base field and an optional operator suffix, and
//! the result is grouped by base field. Shape errors are reported here,
//! before any schema lookup happens.

use serde_json::{Map, Value};

use crate::error::DataError;

/// Value that forces an `IS NULL` check whatever operator was requested.
pub const NULL_SENTINEL: &str = "__NULL__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    ILike,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    IsNull,
}

impl FilterOp {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "like" => FilterOp::Like,
            "ilike" => FilterOp::ILike,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "ne" => FilterOp::Ne,
            "isnull" => FilterOp::IsNull,
            _ => return None,
        })
    }

    /// Suffix spelling, `None` for plain equality.
    pub fn suffix(self) -> Option<&'static str> {
        Some(match self {
            FilterOp::Eq => return None,
            FilterOp::Like => "like",
            FilterOp::ILike => "ilike",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Ne => "ne",
            FilterOp::IsNull => "isnull",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    /// Equality against any of the values (`IN`).
    List(Vec<Value>),
    /// `true` for `IS NULL`, `false` for `IS NOT NULL`.
    Null(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Flattened key as sent by the caller (`age.gte`), used for parameter naming.
    pub key: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Condition {
    pub fn param_name(&self) -> String {
        self.key.replace('.', "_")
    }
}

/// All conditions on one base field, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGroup {
    /// Field path without operator suffix, e.g. `project.name`.
    pub base: String,
    pub conditions: Vec<Condition>,
}

impl FilterGroup {
    /// The `gte`/`lte` pair when both bounds are present.
    pub fn range(&self) -> Option<(&Value, &Value)> {
        let bound = |op| {
            self.conditions.iter().find_map(|c| match (&c.value, c.op == op) {
                (FilterValue::Scalar(v), true) => Some(v),
                _ => None,
            })
        };
        Some((bound(FilterOp::Gte)?, bound(FilterOp::Lte)?))
    }

    /// Parameter names for the two bounds of a collapsed range.
    pub fn range_params(&self) -> (String, String) {
        let stem = self.base.replace('.', "_");
        (format!("{stem}_from"), format!("{stem}_to"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    groups: Vec<FilterGroup>,
}

impl FilterSet {
    /// Parse a raw `filters` payload. Anything other than an object is
    /// treated as "no filters".
    pub fn parse(raw: &Value) -> Result<Self, DataError> {
        let mut set = FilterSet::default();
        for (key, value) in flatten(raw) {
            if let Some(condition) = parse_condition(&key, value)? {
                let base = split_op(&key).0.to_string();
                set.push(base, condition);
            }
        }
        Ok(set)
    }

    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, base: String, condition: Condition) {
        let group = match self.groups.iter_mut().position(|g| g.base == base) {
            Some(idx) => &mut self.groups[idx],
            None => {
                self.groups.push(FilterGroup {
                    base,
                    conditions: Vec::new(),
                });
                let last = self.groups.len() - 1;
                &mut self.groups[last]
            }
        };
        // A later key with the same operator replaces the earlier one.
        match group.conditions.iter_mut().find(|c| c.op == condition.op) {
            Some(existing) => *existing = condition,
            None => group.conditions.push(condition),
        }
    }
}

/// Flatten nested objects into dotted keys. Arrays and scalars are leaves.
pub fn flatten(raw: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    if let Value::Object(map) = raw {
        flatten_into(map, "", &mut out);
    }
    out
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (k, v) in map {
        let key = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        match v {
            Value::Object(child) => flatten_into(child, &key, out),
            leaf => {
                // Same key spelled twice (nested and dotted): last one wins.
                out.retain(|(existing, _)| existing != &key);
                out.push((key, leaf.clone()));
            }
        }
    }
}

fn split_op(key: &str) -> (&str, FilterOp) {
    match key.rsplit_once('.') {
        Some((base, suffix)) => match FilterOp::from_suffix(suffix) {
            Some(op) => (base, op),
            None => (key, FilterOp::Eq),
        },
        None => (key, FilterOp::Eq),
    }
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

fn is_truthy_null_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Returns `None` for conditions that carry no constraint (blank values,
/// empty lists).
fn parse_condition(key: &str, value: Value) -> Result<Option<Condition>, DataError> {
    let (_, requested) = split_op(key);

    if value.as_str() == Some(NULL_SENTINEL) {
        return Ok(Some(Condition {
            key: key.to_string(),
            op: FilterOp::IsNull,
            value: FilterValue::Null(true),
        }));
    }

    let value = match (requested, value) {
        (FilterOp::IsNull, v) => FilterValue::Null(is_truthy_null_flag(&v)),
        (_, v) if is_blank(&v) => return Ok(None),
        (FilterOp::Eq, Value::Array(items)) => {
            if items.iter().any(|i| i.is_object() || i.is_array()) {
                return Err(DataError::invalid(format!(
                    "Filter '{key}' must be a list of scalar values"
                )));
            }
            if items.is_empty() {
                return Ok(None);
            }
            FilterValue::List(items)
        }
        (_, Value::Array(_)) => {
            return Err(DataError::invalid(format!(
                "Filter '{key}' does not accept a list"
            )));
        }
        (_, v) => FilterValue::Scalar(v),
    };

    Ok(Some(Condition {
        key: key.to_string(),
        op: requested,
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: Value) -> FilterSet {
        FilterSet::parse(&raw).unwrap()
    }

    #[test]
    fn flatten_descends_objects_only() {
        let flat = flatten(&json!({
            "project": {"name": "Alpha"},
            "role": ["admin", "user"],
            "age": 3
        }));
        assert_eq!(
            flat,
            vec![
                ("age".to_string(), json!(3)),
                ("project.name".to_string(), json!("Alpha")),
                ("role".to_string(), json!(["admin", "user"])),
            ]
        );
        assert!(flatten(&json!("nope")).is_empty());
    }

    #[test]
    fn operator_suffix_is_split_off() {
        let set = parse(json!({"age": {"gt": 3}, "project.name": {"ilike": "al"}}));
        let groups = set.groups();
        assert_eq!(groups[0].base, "age");
        assert_eq!(groups[0].conditions[0].op, FilterOp::Gt);
        assert_eq!(groups[0].conditions[0].param_name(), "age_gt");
        assert_eq!(groups[1].base, "project.name");
        assert_eq!(groups[1].conditions[0].op, FilterOp::ILike);
        assert_eq!(groups[1].conditions[0].param_name(), "project_name_ilike");
    }

    #[test]
    fn unknown_suffix_is_part_of_the_field() {
        let set = parse(json!({"project": {"name": "Alpha"}}));
        let group = &set.groups()[0];
        assert_eq!(group.base, "project.name");
        assert_eq!(group.conditions[0].op, FilterOp::Eq);
        assert_eq!(group.conditions[0].param_name(), "project_name");
    }

    #[test]
    fn sentinel_forces_is_null() {
        let set = parse(json!({"deletedAt": "__NULL__", "age": {"gt": "__NULL__"}}));
        for group in set.groups() {
            assert_eq!(group.conditions[0].op, FilterOp::IsNull);
            assert_eq!(group.conditions[0].value, FilterValue::Null(true));
        }
    }

    #[test]
    fn isnull_flag_truthiness() {
        for (raw, expected) in [
            (json!(true), true),
            (json!("true"), true),
            (json!(1), true),
            (json!("1"), true),
            (json!(false), false),
            (json!("false"), false),
            (json!(0), false),
            (json!("0"), false),
        ] {
            let set = parse(json!({"deletedAt": {"isnull": raw}}));
            assert_eq!(set.groups()[0].conditions[0].value, FilterValue::Null(expected));
        }
    }

    #[test]
    fn blank_values_are_dropped() {
        let set = parse(json!({"email": "", "name": null, "age": {"gt": ""}, "role": []}));
        assert!(set.is_empty());
    }

    #[test]
    fn range_requires_both_bounds() {
        let set = parse(json!({"age": {"gte": 18, "lte": 65, "ne": 30}}));
        let group = &set.groups()[0];
        assert_eq!(group.range(), Some((&json!(18), &json!(65))));
        assert_eq!(group.range_params(), ("age_from".to_string(), "age_to".to_string()));

        let set = parse(json!({"age": {"gte": 18}}));
        assert_eq!(set.groups()[0].range(), None);
    }

    #[test]
    fn lists_only_with_equality() {
        let set = parse(json!({"role": ["admin", "user"]}));
        assert_eq!(
            set.groups()[0].conditions[0].value,
            FilterValue::List(vec![json!("admin"), json!("user")])
        );

        let err = FilterSet::parse(&json!({"age": {"gt": [1, 2]}})).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = FilterSet::parse(&json!({"role": [{"a": 1}]})).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn dotted_and_nested_spellings_merge() {
        let set = parse(json!({"age.gte": 1, "age": {"lte": 9}}));
        assert_eq!(set.groups().len(), 1);
        assert!(set.groups()[0].range().is_some());
    }
}
