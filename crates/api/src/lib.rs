//! Tabulon API - REST-style query translation.
//!
//! Translates the store's structured `QueryParams` into the query object a
//! REST-style collaborator understands: `$limit`, `$skip`, `$sort`,
//! `$select` at the top level and per-field operator objects below. Equality
//! collapses to a bare value, raw `Where` predicates are never emitted (they
//! cannot be represented outside the local predicate engine), and empty
//! sub-objects inside `$and`/`$or` arrays are dropped so an empty local
//! filter does not become an impossible remote constraint.

use serde_json::{json, Map, Value as JsonValue};
use tabulon_core::Value;
use tabulon_query::{Direction, Filter, Predicate, QueryParams};

/// Translates query params into a REST-style query object.
///
/// `$skip` is emitted only when the base skip is non-zero; `$limit` only
/// when a limit was set explicitly.
pub fn to_rest_query(params: &QueryParams) -> JsonValue {
    let mut query = Map::new();

    if let Some(limit) = params.limit {
        query.insert("$limit".to_string(), json!(limit));
    }
    if params.skip > 0 {
        query.insert("$skip".to_string(), json!(params.skip));
    }
    if !params.sort.is_empty() {
        let mut sort = Map::new();
        for (field, direction) in params.sort.keys() {
            let direction = match direction {
                Direction::Asc => 1,
                Direction::Desc => -1,
            };
            sort.insert(field.clone(), json!(direction));
        }
        query.insert("$sort".to_string(), JsonValue::Object(sort));
    }
    if !params.select.is_empty() {
        query.insert("$select".to_string(), json!(params.select));
    }

    for (key, value) in filter_to_object(&params.filter) {
        query.insert(key, value);
    }

    JsonValue::Object(query)
}

fn filter_to_object(filter: &Filter) -> Map<String, JsonValue> {
    let mut object = Map::new();

    for predicate in filter.predicates() {
        match predicate {
            // Equality collapses to a bare value
            Predicate::Eq(field, value) => {
                object.insert(field.clone(), to_json(value));
            }
            Predicate::Ne(field, value) => field_op(&mut object, field, "$ne", to_json(value)),
            Predicate::Lt(field, value) => field_op(&mut object, field, "$lt", to_json(value)),
            Predicate::Lte(field, value) => field_op(&mut object, field, "$lte", to_json(value)),
            Predicate::Gt(field, value) => field_op(&mut object, field, "$gt", to_json(value)),
            Predicate::Gte(field, value) => field_op(&mut object, field, "$gte", to_json(value)),
            Predicate::In(field, values) => {
                field_op(&mut object, field, "$in", values_json(values));
            }
            Predicate::Nin(field, values) => {
                field_op(&mut object, field, "$nin", values_json(values));
            }
            // Raw predicates have no wire representation
            Predicate::Where(_) => {}
            Predicate::And(filters) => {
                object.insert("$and".to_string(), sub_queries(filters));
            }
            Predicate::Or(filters) => {
                object.insert("$or".to_string(), sub_queries(filters));
            }
        }
    }

    object
}

/// Adds one operator to a field's operator object, merging with operators
/// already emitted for the same field.
fn field_op(object: &mut Map<String, JsonValue>, field: &str, op: &str, value: JsonValue) {
    match object.get_mut(field) {
        Some(JsonValue::Object(ops)) => {
            ops.insert(op.to_string(), value);
        }
        _ => {
            let mut ops = Map::new();
            ops.insert(op.to_string(), value);
            object.insert(field.to_string(), JsonValue::Object(ops));
        }
    }
}

/// Translates sub-filters of `$and`/`$or`, dropping the empty ones.
fn sub_queries(filters: &[Filter]) -> JsonValue {
    JsonValue::Array(
        filters
            .iter()
            .map(filter_to_object)
            .filter(|object| !object.is_empty())
            .map(JsonValue::Object)
            .collect(),
    )
}

fn to_json(value: &Value) -> JsonValue {
    serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

fn values_json(values: &[Value]) -> JsonValue {
    JsonValue::Array(values.iter().map(to_json).collect())
}
