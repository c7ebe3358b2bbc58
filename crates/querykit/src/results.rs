//! Result shaping: flat rows into nested JSON objects.
//!
//! Rows are JSON objects keyed by column label. A label such as
//! `owner__name` becomes `{"owner": {"name": ...}}`, which pairs with the
//! labels produced by [`crate::columns::label_columns`].

use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

/// A single result row, keyed by column label.
pub type Row = Map<String, Value>;

/// Separator between path segments in a column label.
pub const PATH_SEPARATOR: &str = "__";

/// Options for [`entity_to_dict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityOptions {
    /// Nest `__` paths (default: true). When false the row is returned as-is.
    pub transform_attrs: bool,
    /// Keep labels starting with `_` (default: false).
    pub include_privates: bool,
}

impl Default for EntityOptions {
    fn default() -> Self {
        Self {
            transform_attrs: true,
            include_privates: false,
        }
    }
}

/// Write `value` at a `__`-separated path, creating intermediate objects.
pub fn set_attribute(entity: &mut Row, path: &str, value: Value) -> QueryResult<()> {
    let mut parents: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = parents.pop().unwrap_or(path);

    let mut cursor = entity;
    for name in parents {
        cursor = match cursor
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            _ => return Err(QueryError::ConflictingPath(path.to_string())),
        };
    }

    cursor.insert(last.to_string(), value);
    Ok(())
}

/// Convert a flat row into a (possibly nested) object.
pub fn entity_to_dict(row: &Row, options: EntityOptions) -> QueryResult<Row> {
    if !options.transform_attrs {
        return Ok(row.clone());
    }

    let mut result = Row::new();
    for (key, value) in row {
        if !key.starts_with('_') || options.include_privates {
            set_attribute(&mut result, key, value.clone())?;
        }
    }
    Ok(result)
}

/// [`entity_to_dict`] over a list of rows.
pub fn result_list_to_dict(rows: &[Row], options: EntityOptions) -> QueryResult<Vec<Row>> {
    rows.iter()
        .map(|row| entity_to_dict(row, options))
        .collect()
}

/// Collapse consecutive rows sharing the same `key` into one object.
///
/// Typical input is a joined result set ordered by `key`: the parent columns
/// repeat and the child columns vary. Differing values for the same label are
/// gathered into a list. Rows missing `key` group under `null`.
pub fn group_result_set(
    rows: impl IntoIterator<Item = Row>,
    key: &str,
) -> QueryResult<Vec<Row>> {
    let mut grouped = Vec::new();
    let mut current: Option<(Value, Row)> = None;

    for row in rows {
        let group_key = row.get(key).cloned().unwrap_or(Value::Null);
        let entity = entity_to_dict(&row, EntityOptions::default())?;

        let same_group = matches!(&current, Some((k, _)) if *k == group_key);
        if !same_group {
            if let Some((_, done)) = current.take() {
                grouped.push(done);
            }
            current = Some((group_key, Row::new()));
        }
        if let Some((_, merged)) = current.as_mut() {
            merge_entity(merged, entity);
        }
    }

    if let Some((_, done)) = current {
        grouped.push(done);
    }

    tracing::trace!(groups = grouped.len(), key, "grouped result set");
    Ok(grouped)
}

fn merge_entity(merged: &mut Row, entity: Row) {
    for (key, value) in entity {
        match merged.get_mut(&key) {
            Some(existing) if is_truthy(existing) && *existing != value => {
                if let Value::Array(items) = existing {
                    items.push(value);
                } else {
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, value]);
                }
            }
            _ => {
                merged.insert(key, value);
            }
        }
    }
}

/// Empty strings, zero, false, null and empty containers are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
