use serde_json::{Map, Value};

/// Parse a query string into key-value pairs.
pub fn parse_query_string(query: Option<&str>) -> Vec<(String, String)> {
    match query {
        Some(q) => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Fold decoded query pairs into a JSON object, honouring bracket notation.
///
/// - `filters[age][gte]=18` becomes `{"filters": {"age": {"gte": "18"}}}`
/// - `relations[]=a&relations[]=b` becomes `{"relations": ["a", "b"]}`
/// - a repeated plain key (`tag=a&tag=b`) becomes an array
///
/// All leaf values stay strings; typing happens downstream. A later
/// assignment to a path that is already an object replaces it.
pub fn nest_query_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Value {
    let mut root = Map::new();
    for (key, value) in pairs {
        if key.is_empty() {
            continue;
        }
        let segments = split_key(&key);
        insert(&mut root, &segments, value);
    }
    Value::Object(root)
}

fn split_key(key: &str) -> Vec<String> {
    let literal = || vec![key.to_string()];
    let Some(open) = key.find('[') else {
        return literal();
    };
    if open == 0 || !key.ends_with(']') {
        return literal();
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return literal();
        }
        let Some(close) = rest.find(']') else {
            return literal();
        };
        segments.push(rest[1..close].to_string());
        rest = &rest[close + 1..];
    }
    segments
}

fn insert(map: &mut Map<String, Value>, segments: &[String], value: String) {
    let Some((head, tail)) = segments.split_first() else {
        return;
    };
    let leaf = Value::String(value.clone());

    match tail.first() {
        None => match map.get_mut(head) {
            Some(Value::Array(items)) => items.push(leaf),
            Some(existing @ Value::String(_)) => {
                let old = existing.take();
                *existing = Value::Array(vec![old, leaf]);
            }
            _ => {
                map.insert(head.clone(), leaf);
            }
        },
        Some(next) if next.is_empty() => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            match entry {
                Value::Array(items) => items.push(leaf),
                other => {
                    let old = other.take();
                    *other = if old.is_string() {
                        Value::Array(vec![old, leaf])
                    } else {
                        Value::Array(vec![leaf])
                    };
                }
            }
        }
        Some(_) => {
            let entry = map
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert(child, tail, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nest(query: &str) -> Value {
        nest_query_pairs(parse_query_string(Some(query)))
    }

    #[test]
    fn plain_pairs() {
        assert_eq!(nest("page=2&limit=5"), json!({"page": "2", "limit": "5"}));
    }

    #[test]
    fn bracket_nesting() {
        assert_eq!(
            nest("filters[project][name]=Alpha&filters[age][gte]=18&filters[age][lte]=65"),
            json!({"filters": {"project": {"name": "Alpha"}, "age": {"gte": "18", "lte": "65"}}})
        );
    }

    #[test]
    fn dotted_keys_inside_brackets_stay_whole() {
        assert_eq!(
            nest("filters[project.name]=Alpha"),
            json!({"filters": {"project.name": "Alpha"}})
        );
    }

    #[test]
    fn append_and_repeat_build_arrays() {
        assert_eq!(
            nest("relations[]=project&relations[]=uploads&tag=a&tag=b&tag=c"),
            json!({"relations": ["project", "uploads"], "tag": ["a", "b", "c"]})
        );
    }

    #[test]
    fn percent_decoding_and_malformed_brackets() {
        assert_eq!(
            nest("search=john%20doe&odd[key=1&[x]=2"),
            json!({"search": "john doe", "odd[key": "1", "[x]": "2"})
        );
    }

    #[test]
    fn missing_query_is_empty_object() {
        assert_eq!(nest_query_pairs(parse_query_string(None)), json!({}));
    }
}
