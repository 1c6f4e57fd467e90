//! Turns a validated [`ListRequest`] into a [`ListQuery`].
//!
//! Order matters for the join registry: explicitly requested relations are
//! joined first, then whatever filters, search fields and the sort key need.
//! Every check happens here, before anything is sent to the database.

use serde_json::Value;

use crate::error::DataError;
use crate::filter::{Condition, FilterGroup, FilterOp, FilterValue};
use crate::params::ListRequest;
use crate::query::{ColumnRef, CompareOp, ListQuery, Param, Predicate};
use crate::resolve::FieldResolver;
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::value::{coerce, scalar_text, SqlValue};

/// Build the list query for `entity`.
pub fn build_list_query(
    registry: &SchemaRegistry,
    entity: &str,
    request: &ListRequest,
) -> Result<ListQuery, DataError> {
    let root = registry.require(entity)?.clone();
    let mut resolver = FieldResolver::new(registry, root.clone());
    let mut query = ListQuery::new(root.clone());

    select_relations(&mut resolver, &root, &request.relations)?;

    for group in request.filters.groups() {
        apply_filter_group(&mut resolver, &mut query, group)?;
    }

    if let Some(term) = request.search.as_deref() {
        if !request.search_fields.is_empty() {
            let branches = search_branches(&mut resolver, term, &request.search_fields);
            query.and_where(Predicate::Any(branches));
        }
    }

    let sort = resolve_sort(&mut resolver, &root, &request.sort_by)?;
    query.order_by(sort, request.sort_order);

    for join in resolver.into_joins() {
        query.left_join(join);
    }
    query
        .skip(request.offset())
        .take(request.limit)
        .with_deleted(request.with_deleted);
    Ok(query)
}

/// Build the query used to load one record with the given relations.
pub fn build_find_query(
    registry: &SchemaRegistry,
    entity: &str,
    relations: &[String],
) -> Result<ListQuery, DataError> {
    let root = registry.require(entity)?.clone();
    let mut resolver = FieldResolver::new(registry, root.clone());
    select_relations(&mut resolver, &root, relations)?;

    let mut query = ListQuery::new(root);
    for join in resolver.into_joins() {
        query.left_join(join);
    }
    Ok(query)
}

/// Requested relations must be direct relations of the root. All invalid
/// names are reported together.
fn select_relations(
    resolver: &mut FieldResolver<'_>,
    root: &EntitySchema,
    relations: &[String],
) -> Result<(), DataError> {
    let invalid: Vec<&str> = relations
        .iter()
        .filter(|name| root.relation(name).is_none())
        .map(String::as_str)
        .collect();
    if !invalid.is_empty() {
        return Err(DataError::invalid(format!(
            "Invalid relations: {}",
            invalid.join(", ")
        )));
    }
    for name in relations {
        resolver.select_relation(name)?;
    }
    Ok(())
}

fn apply_filter_group(
    resolver: &mut FieldResolver<'_>,
    query: &mut ListQuery,
    group: &FilterGroup,
) -> Result<(), DataError> {
    let column = resolver.qualify(&group.base)?;
    let range = group.range();

    if let Some((from, to)) = range {
        let (from_name, to_name) = group.range_params();
        query.and_where(Predicate::Between {
            column: column.clone(),
            from: Param::new(from_name, coerce(&group.base, from, column.ty)?),
            to: Param::new(to_name, coerce(&group.base, to, column.ty)?),
        });
    }

    for condition in &group.conditions {
        if range.is_some() && matches!(condition.op, FilterOp::Gte | FilterOp::Lte) {
            continue;
        }
        query.and_where(condition_predicate(&group.base, condition, &column)?);
    }
    Ok(())
}

fn condition_predicate(
    field: &str,
    condition: &Condition,
    column: &ColumnRef,
) -> Result<Predicate, DataError> {
    let param = condition.param_name();
    let compare = |op: CompareOp, value: &Value| -> Result<Predicate, DataError> {
        Ok(Predicate::Compare {
            column: column.clone(),
            op,
            param: Param::new(param.clone(), coerce(field, value, column.ty)?),
        })
    };
    let pattern = |value: &Value| -> Result<Param, DataError> {
        let text = scalar_text(value).ok_or_else(|| {
            DataError::invalid(format!("Filter '{}' needs a scalar value", condition.key))
        })?;
        Ok(Param::new(param.clone(), SqlValue::Text(format!("%{text}%"))))
    };

    match (condition.op, &condition.value) {
        (FilterOp::IsNull, FilterValue::Null(true)) => Ok(Predicate::IsNull(column.clone())),
        (FilterOp::IsNull, FilterValue::Null(false)) => Ok(Predicate::IsNotNull(column.clone())),
        (FilterOp::Eq, FilterValue::List(values)) => {
            let params = values
                .iter()
                .enumerate()
                .map(|(idx, v)| {
                    coerce(field, v, column.ty).map(|value| Param::new(format!("{param}_{idx}"), value))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::In {
                column: column.clone(),
                params,
            })
        }
        (FilterOp::Eq, FilterValue::Scalar(v)) => compare(CompareOp::Eq, v),
        (FilterOp::Ne, FilterValue::Scalar(v)) => compare(CompareOp::Ne, v),
        (FilterOp::Gt, FilterValue::Scalar(v)) => compare(CompareOp::Gt, v),
        (FilterOp::Gte, FilterValue::Scalar(v)) => compare(CompareOp::Gte, v),
        (FilterOp::Lt, FilterValue::Scalar(v)) => compare(CompareOp::Lt, v),
        (FilterOp::Lte, FilterValue::Scalar(v)) => compare(CompareOp::Lte, v),
        (FilterOp::Like, FilterValue::Scalar(v)) => Ok(Predicate::Like {
            column: column.clone(),
            param: pattern(v)?,
        }),
        (FilterOp::ILike, FilterValue::Scalar(v)) => Ok(Predicate::ILike {
            column: column.clone(),
            param: pattern(v)?,
        }),
        _ => Err(DataError::invalid(format!(
            "Unsupported value for filter '{}'",
            condition.key
        ))),
    }
}

/// One case-insensitive `contains` branch per resolvable field. Fields that
/// do not resolve are skipped.
fn search_branches(
    resolver: &mut FieldResolver<'_>,
    term: &str,
    fields: &[String],
) -> Vec<Predicate> {
    let pattern = format!("%{term}%");
    let mut branches = Vec::with_capacity(fields.len());
    for field in fields {
        match resolver.qualify(field) {
            Ok(column) => branches.push(Predicate::Contains {
                column,
                param: Param::new("search", SqlValue::Text(pattern.clone())),
            }),
            Err(err) => {
                tracing::debug!(
                    entity = resolver.root().name(),
                    field = %field,
                    error = %err,
                    "skipping search field"
                );
            }
        }
    }
    branches
}

fn resolve_sort(
    resolver: &mut FieldResolver<'_>,
    root: &EntitySchema,
    field: &str,
) -> Result<ColumnRef, DataError> {
    if field.contains('.') {
        return resolver.qualify(field).map_err(DataError::from);
    }
    resolver.qualify(field).map_err(|_| {
        DataError::invalid(format!(
            "Invalid sortBy field: '{field}'. Available: {}",
            root.available_columns()
        ))
    })
}
