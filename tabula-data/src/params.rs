use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tabula_core::http::{FromRequestParts, Parts};
use tabula_core::{AppError, ConfigError, ConfigSection, TabulaConfig};

use crate::error::DataError;
use crate::filter::FilterSet;

/// Raw list parameters as received from a client.
///
/// Deserialises from a JSON body or, through [`ListParams::from_query_str`],
/// from a query string. Nothing is checked until [`ListParams::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<Value>,
    pub limit: Option<Value>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub relations: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub search_fields: Vec<String>,
    #[serde(deserialize_with = "object_or_json")]
    pub filters: Value,
    #[serde(deserialize_with = "flag")]
    pub with_deleted: bool,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse bracket-notation query strings such as
    /// `page=2&filters[project][name]=Alpha&relations=project,uploads`.
    pub fn from_query_str(query: Option<&str>) -> Result<Self, DataError> {
        let nested = tabula_core::nest_query_pairs(tabula_core::parse_query_string(query));
        serde_json::from_value(nested)
            .map_err(|e| DataError::invalid(format!("Invalid list parameters: {e}")))
    }

    pub fn page(mut self, page: impl Into<Value>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn sort_by(mut self, field: &str) -> Self {
        self.sort_by = Some(field.to_string());
        self
    }

    pub fn sort_order(mut self, order: &str) -> Self {
        self.sort_order = Some(order.to_string());
        self
    }

    pub fn relations(mut self, relations: &[&str]) -> Self {
        self.relations = relations.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn search(mut self, term: &str, fields: &[&str]) -> Self {
        self.search = Some(term.to_string());
        self.search_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_deleted(mut self, with_deleted: bool) -> Self {
        self.with_deleted = with_deleted;
        self
    }

    /// Apply defaults and check pagination, sort order and filter shapes.
    pub fn validate(&self, config: &ListingConfig) -> Result<ListRequest, DataError> {
        let page = positive(self.page.as_ref(), 1);
        let limit = positive(self.limit.as_ref(), config.default_limit);
        let (Some(page), Some(limit)) = (page, limit) else {
            return Err(DataError::invalid(
                "Pagination parameters must be valid numbers greater than 0.",
            ));
        };
        if let Some(max) = config.max_limit {
            if limit > max {
                return Err(DataError::invalid(format!(
                    "Limit must not exceed {max}."
                )));
            }
        }

        let sort_order = match self.sort_order.as_deref() {
            None => SortOrder::Desc,
            Some("ASC") => SortOrder::Asc,
            Some("DESC") => SortOrder::Desc,
            Some(_) => {
                return Err(DataError::invalid(
                    "Sort order must be either 'ASC' or 'DESC'.",
                ))
            }
        };

        let sort_by = match self.sort_by.as_deref() {
            Some(field) if !field.is_empty() => field.to_string(),
            _ => config.default_sort.clone(),
        };

        Ok(ListRequest {
            page,
            limit,
            sort_by,
            sort_order,
            relations: self.relations.clone(),
            search: self.search.clone().filter(|s| !s.is_empty()),
            search_fields: self.search_fields.clone(),
            filters: FilterSet::parse(&self.filters)?,
            with_deleted: self.with_deleted,
        })
    }
}

/// Largest page or limit the database can take as a signed 64-bit integer.
const MAX_PAGINATION: u64 = i64::MAX as u64;

/// `None` when present but not a positive integer. Whole-valued numbers are
/// accepted in either JSON or string form.
fn positive(raw: Option<&Value>, default: u64) -> Option<u64> {
    let parsed = match raw {
        None | Some(Value::Null) => return Some(default),
        Some(Value::String(s)) if s.trim().is_empty() => return Some(default),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
        Some(_) => None,
    };
    parsed.filter(|n| (1..=MAX_PAGINATION).contains(n))
}

fn whole(f: f64) -> Option<u64> {
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f <= MAX_PAGINATION as f64)
        .then(|| f as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated list parameters.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub page: u64,
    pub limit: u64,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub relations: Vec<String>,
    pub search: Option<String>,
    pub search_fields: Vec<String>,
    pub filters: FilterSet,
    pub with_deleted: bool,
}

impl ListRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(MAX_PAGINATION)
    }
}

/// Listing defaults (`listing.*`).
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub default_limit: u64,
    /// Upper bound for `limit`; unbounded when absent.
    pub max_limit: Option<u64>,
    pub default_sort: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: None,
            default_sort: "created_at".to_string(),
        }
    }
}

impl ConfigSection for ListingConfig {
    const PREFIX: &'static str = "listing";

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let section = Self {
            default_limit: config.get_or(&Self::key("default-limit"), defaults.default_limit)?,
            max_limit: config.get_or(&Self::key("max-limit"), defaults.max_limit)?,
            default_sort: config.get_or(&Self::key("default-sort"), defaults.default_sort)?,
        };
        if section.default_limit == 0 {
            return Err(ConfigError::Invalid {
                key: Self::key("default-limit"),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(max) = section.max_limit {
            if max < section.default_limit {
                return Err(ConfigError::Invalid {
                    key: Self::key("max-limit"),
                    message: format!("must be at least default-limit ({})", section.default_limit),
                });
            }
        }
        Ok(section)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ListParams {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        ListParams::from_query_str(parts.uri.query()).map_err(AppError::from)
    }
}

/// `relations` query parameter for single-record endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelationsParam {
    #[serde(default, deserialize_with = "string_or_list")]
    pub relations: Vec<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for RelationsParam {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let nested =
            tabula_core::nest_query_pairs(tabula_core::parse_query_string(parts.uri.query()));
        serde_json::from_value(nested)
            .map_err(|e| AppError::BadRequest(format!("Invalid relations parameter: {e}")))
    }
}

/// Accepts `"a,b"`, `["a", "b"]` or `["a,b"]`; trims and de-duplicates.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !out.iter().any(|existing| existing == part) {
                out.push(part.to_string());
            }
        }
    };
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => push(&s),
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(s) => push(&s),
                    other => {
                        return Err(D::Error::custom(format!(
                            "expected a list of names, found {other}"
                        )))
                    }
                }
            }
        }
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a list of names, found {other}"
            )))
        }
    }
    Ok(out)
}

/// Filters may arrive as an object or as a JSON-encoded string.
fn object_or_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(Value::Null),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Value::Null),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(v @ Value::Object(_)) => Ok(v),
            _ => Err(D::Error::custom("filters must be a JSON object")),
        },
        Some(v @ (Value::Object(_) | Value::Null)) => Ok(v),
        Some(_) => Err(D::Error::custom("filters must be an object")),
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) if n.as_i64() == Some(0) => Ok(false),
        Some(Value::Number(n)) if n.as_i64() == Some(1) => Ok(true),
        Some(Value::String(s)) => match s.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(D::Error::custom(format!("expected a boolean, found '{other}'"))),
        },
        Some(other) => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ListingConfig {
        ListingConfig::default()
    }

    #[test]
    fn defaults() {
        let req = ListParams::new().validate(&config()).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
        assert_eq!(req.sort_by, "created_at");
        assert_eq!(req.sort_order, SortOrder::Desc);
        assert_eq!(req.offset(), 0);
        assert!(req.filters.is_empty());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let req = ListParams::new()
            .page("3")
            .limit(25)
            .validate(&config())
            .unwrap();
        assert_eq!((req.page, req.limit, req.offset()), (3, 25, 50));
    }

    #[test]
    fn invalid_pagination_is_rejected() {
        for (page, limit) in [
            (json!(0), json!(10)),
            (json!(1), json!(-1)),
            (json!("abc"), json!(10)),
            (json!(1.5), json!(10)),
            (json!(1), json!("0")),
            (json!(1), json!("1.5")),
            (json!(1), json!("9223372036854775808")),
            (json!(1), json!("18446744073709551615")),
            (json!(1), json!(1e300)),
            (json!("1e300"), json!(10)),
        ] {
            let err = ListParams::new()
                .page(page.clone())
                .limit(limit.clone())
                .validate(&config())
                .unwrap_err();
            assert!(err.is_invalid_argument(), "page={page} limit={limit}");
        }
    }

    #[test]
    fn whole_numbers_match_in_both_forms() {
        for (page, limit) in [(json!(2.0), json!("5.0")), (json!("2.0"), json!(5.0))] {
            let req = ListParams::new().page(page).limit(limit).validate(&config()).unwrap();
            assert_eq!((req.page, req.limit), (2, 5));
        }
    }

    #[test]
    fn largest_signed_limit_is_accepted_and_offset_is_clamped() {
        let req = ListParams::new()
            .page(3)
            .limit("9223372036854775807")
            .validate(&config())
            .unwrap();
        assert_eq!(req.limit, i64::MAX as u64);
        assert_eq!(req.offset(), i64::MAX as u64);
    }

    #[test]
    fn max_limit_is_enforced_when_configured() {
        let config = ListingConfig {
            max_limit: Some(50),
            ..ListingConfig::default()
        };
        assert!(ListParams::new().limit(50).validate(&config).is_ok());
        assert!(ListParams::new().limit(51).validate(&config).is_err());
    }

    #[test]
    fn sort_order_is_case_sensitive() {
        assert_eq!(
            ListParams::new().sort_order("ASC").validate(&config()).unwrap().sort_order,
            SortOrder::Asc
        );
        for bad in ["asc", "Desc", "UP", ""] {
            let err = ListParams::new().sort_order(bad).validate(&config()).unwrap_err();
            assert!(err.is_invalid_argument(), "{bad}");
        }
    }

    #[test]
    fn query_string_binding() {
        let params = ListParams::from_query_str(Some(
            "page=2&limit=5&sortBy=project.name&sortOrder=ASC&relations=project,uploads\
             &searchFields[]=email&searchFields[]=project.name&search=ali\
             &filters[project][name]=Alpha&filters[age][gte]=18&withDeleted=true",
        ))
        .unwrap();
        assert_eq!(params.page, Some(json!("2")));
        assert_eq!(params.sort_by.as_deref(), Some("project.name"));
        assert_eq!(params.relations, vec!["project", "uploads"]);
        assert_eq!(params.search_fields, vec!["email", "project.name"]);
        assert_eq!(
            params.filters,
            json!({"project": {"name": "Alpha"}, "age": {"gte": "18"}})
        );
        assert!(params.with_deleted);
    }

    #[test]
    fn json_encoded_filters_in_query() {
        let params =
            ListParams::from_query_str(Some("filters=%7B%22role%22%3A%22admin%22%7D")).unwrap();
        assert_eq!(params.filters, json!({"role": "admin"}));

        let err = ListParams::from_query_str(Some("filters=oops")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn json_body_binding() {
        let params: ListParams = serde_json::from_value(json!({
            "page": 1,
            "limit": 10,
            "relations": ["project"],
            "searchFields": "email, name",
            "filters": {"deletedAt": "__NULL__"}
        }))
        .unwrap();
        assert_eq!(params.relations, vec!["project"]);
        assert_eq!(params.search_fields, vec!["email", "name"]);
        assert!(!params.with_deleted);
    }

    #[test]
    fn empty_search_is_ignored() {
        let req = ListParams::new().search("", &["email"]).validate(&config()).unwrap();
        assert!(req.search.is_none());
    }

    #[test]
    fn listing_config_section() {
        let yaml = "listing:\n  default-limit: 20\n  max-limit: 100\n  default-sort: id\n";
        let cfg = TabulaConfig::from_yaml_str(yaml, "test").unwrap();
        let section: ListingConfig = cfg.section().unwrap();
        assert_eq!(section.default_limit, 20);
        assert_eq!(section.max_limit, Some(100));
        assert_eq!(section.default_sort, "id");

        let bad = TabulaConfig::from_yaml_str("listing:\n  default-limit: 0\n", "test").unwrap();
        assert!(bad.section::<ListingConfig>().is_err());
    }
}
