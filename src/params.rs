//! Caller parameter shapes and their normalization into canonical bindings.
//!
//! A call supplies parameters in one of the [`ParamArg`] shapes; binding
//! reconciles the shape against the statement's placeholders and produces a
//! canonical ordered form the executors consume. All count/shape validation
//! happens here, before anything touches the driver.

use serde_json::Value as JsonValue;

use crate::error::SqlConduitError;
use crate::inference::{infer_param_types, storage_type_for};
use crate::template::SqlTemplate;
use crate::types::{ParamValue, StorageType};

/// One explicitly typed, name-keyed parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    pub name: String,
    pub value: ParamValue,
    pub ty: StorageType,
}

impl NamedParam {
    pub fn new(name: impl Into<String>, value: ParamValue, ty: StorageType) -> Self {
        Self {
            name: name.into(),
            value,
            ty,
        }
    }

    /// Name-keyed entry with its storage type inferred from the value.
    pub fn inferred(name: impl Into<String>, value: ParamValue) -> Self {
        let ty = storage_type_for(&value);
        Self {
            name: name.into(),
            value,
            ty,
        }
    }
}

/// Ordered placeholder-name → storage-type mapping.
///
/// Supplied by the caller alongside positional values, or generated from the
/// first data row when absent (see [`crate::inference`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTypes {
    entries: Vec<(String, StorageType)>,
}

impl ParamTypes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, StorageType)>) -> Self {
        let mut types = Self::new();
        for (name, ty) in pairs {
            types.set(name, ty);
        }
        types
    }

    /// Set the storage type for a placeholder, replacing any earlier entry.
    pub fn set(&mut self, name: impl Into<String>, ty: StorageType) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = ty;
        } else {
            self.entries.push((name, ty));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<StorageType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Heterogeneous caller-supplied parameter argument.
///
/// Three shapes are accepted, mirroring what callers actually hold:
/// name-keyed entries with explicit storage types, positional values (one row
/// or many), and a single bare scalar for one-placeholder statements.
/// [`ParamArg::from_json`] maps loosely typed JSON input onto these shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamArg {
    /// No parameters supplied.
    #[default]
    None,
    /// A single bare scalar; valid only for one-placeholder statements.
    Value(ParamValue),
    /// One positional row.
    Row(Vec<ParamValue>),
    /// A positional multi-row batch.
    Rows(Vec<Vec<ParamValue>>),
    /// Name-keyed entries, each carrying its own storage type.
    Named(Vec<NamedParam>),
}

impl ParamArg {
    pub fn value(value: ParamValue) -> Self {
        ParamArg::Value(value)
    }

    pub fn row(values: Vec<ParamValue>) -> Self {
        ParamArg::Row(values)
    }

    pub fn rows(rows: Vec<Vec<ParamValue>>) -> Self {
        ParamArg::Rows(rows)
    }

    pub fn named(entries: Vec<NamedParam>) -> Self {
        ParamArg::Named(entries)
    }

    /// Classify a JSON value into a parameter shape.
    ///
    /// - `null` → no parameters;
    /// - a scalar → a bare scalar;
    /// - an array whose first element is an array → a multi-row batch (every
    ///   later element must then also be an array);
    /// - any other array → one positional row;
    /// - an object whose keys are exactly `"0".."n-1"` → one positional row,
    ///   values ordered by numeric key. A positional-style collection keyed
    ///   by sequential integers is indistinguishable from a plain list, so it
    ///   is classified positional; this ambiguity is deliberate and pinned by
    ///   tests rather than resolved away.
    /// - any other object → name-keyed entries with per-value inferred
    ///   storage types.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::ParameterMismatch` when a multi-row array
    /// contains a non-array row; the message names the offending row index.
    pub fn from_json(json: JsonValue) -> Result<Self, SqlConduitError> {
        match json {
            JsonValue::Null => Ok(ParamArg::None),
            JsonValue::Array(items) => {
                if items.first().is_some_and(JsonValue::is_array) {
                    let mut rows = Vec::with_capacity(items.len());
                    for (idx, item) in items.into_iter().enumerate() {
                        match item {
                            JsonValue::Array(cells) => {
                                rows.push(cells.into_iter().map(json_scalar).collect());
                            }
                            _ => {
                                return Err(SqlConduitError::ParameterMismatch(format!(
                                    "parameter row {idx} is not a sequence of values"
                                )));
                            }
                        }
                    }
                    Ok(ParamArg::Rows(rows))
                } else {
                    Ok(ParamArg::Row(items.into_iter().map(json_scalar).collect()))
                }
            }
            JsonValue::Object(map) => match positional_indexes(&map) {
                Some(order) => {
                    let mut values = vec![ParamValue::Null; map.len()];
                    for (idx, (_, v)) in order.into_iter().zip(map) {
                        values[idx] = json_scalar(v);
                    }
                    Ok(ParamArg::Row(values))
                }
                None => Ok(ParamArg::Named(
                    map.into_iter()
                        .map(|(name, v)| NamedParam::inferred(name, json_scalar(v)))
                        .collect(),
                )),
            },
            scalar => Ok(ParamArg::Value(json_scalar(scalar))),
        }
    }
}

/// Parsed key indexes, in map iteration order, when the object's keys are
/// exactly the canonical decimal forms of `0..n`.
///
/// Map iteration is sorted lexicographically (`"0", "1", "10", "2", ...`),
/// so both the detection and the value placement must go through the parsed
/// index, never the iteration position. The canonical-form check rejects
/// keys like `"00"` or `"+1"`; distinct keys then map to distinct indexes,
/// and n distinct indexes below n cover `0..n` exactly.
fn positional_indexes(map: &serde_json::Map<String, JsonValue>) -> Option<Vec<usize>> {
    if map.is_empty() {
        return None;
    }
    let n = map.len();
    map.keys()
        .map(|key| {
            key.parse::<usize>()
                .ok()
                .filter(|idx| *idx < n && idx.to_string() == *key)
        })
        .collect()
}

fn json_scalar(value: JsonValue) -> ParamValue {
    match value {
        JsonValue::Null => ParamValue::Null,
        JsonValue::Bool(b) => ParamValue::Bool(b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(ParamValue::Int)
            .or_else(|| n.as_f64().map(ParamValue::Float))
            .unwrap_or(ParamValue::Null),
        JsonValue::String(s) => ParamValue::Text(s),
        structured => ParamValue::Json(structured),
    }
}

/// One canonical binding: placeholder name, value, storage type.
#[derive(Debug, Clone)]
pub(crate) struct BoundParam {
    pub(crate) name: String,
    pub(crate) value: ParamValue,
    pub(crate) ty: StorageType,
}

/// A validated multi-row batch sharing one type set.
#[derive(Debug, Clone)]
pub(crate) struct BatchBindings {
    /// Placeholder names in statement order.
    pub(crate) names: Vec<String>,
    /// Data rows, each aligned with `names`.
    pub(crate) rows: Vec<Vec<ParamValue>>,
    pub(crate) types: ParamTypes,
}

/// Canonical bindings produced by [`bind_params`].
#[derive(Debug, Clone)]
pub(crate) enum BoundParams {
    None,
    Single(Vec<BoundParam>),
    Batch(BatchBindings),
}

/// Render bindings into the `(":name", value)` pairs the driver binds by
/// name.
pub(crate) fn render_named_args(
    params: &[BoundParam],
) -> Vec<(String, rusqlite::types::Value)> {
    params
        .iter()
        .map(|p| {
            (
                format!(":{}", p.name),
                crate::types::render_value(&p.value, p.ty),
            )
        })
        .collect()
}

/// Reconcile a parameter argument against a template.
///
/// Validation order: placeholder count, then presence, then shape-specific
/// checks. Every violation is raised here; malformed parameters never reach
/// the driver.
pub(crate) fn bind_params(
    template: &SqlTemplate,
    arg: ParamArg,
    explicit: Option<&ParamTypes>,
) -> Result<BoundParams, SqlConduitError> {
    let expected = template.placeholder_count();
    match arg {
        ParamArg::None => {
            if expected > 0 {
                Err(SqlConduitError::MissingParameters(format!(
                    "statement names {expected} placeholder(s) but no parameters were supplied"
                )))
            } else {
                Ok(BoundParams::None)
            }
        }
        ParamArg::Named(entries) => bind_named(template, entries),
        ParamArg::Value(value) => bind_row(template, vec![value], explicit, true),
        ParamArg::Row(values) => bind_row(template, values, explicit, false),
        ParamArg::Rows(rows) => bind_rows(template, rows, explicit),
    }
}

fn bind_named(
    template: &SqlTemplate,
    entries: Vec<NamedParam>,
) -> Result<BoundParams, SqlConduitError> {
    let expected = template.placeholder_count();
    if expected == 0 && entries.is_empty() {
        return Ok(BoundParams::None);
    }

    for (idx, entry) in entries.iter().enumerate() {
        if entries[..idx].iter().any(|e| e.name == entry.name) {
            return Err(SqlConduitError::ParameterMismatch(format!(
                "duplicate parameter name :{}",
                entry.name
            )));
        }
    }

    if entries.len() != expected {
        return Err(SqlConduitError::ParameterMismatch(format!(
            "statement names {expected} placeholder(s) but {} name-keyed parameter(s) were supplied",
            entries.len()
        )));
    }

    let mut bound = Vec::with_capacity(expected);
    for name in template.placeholders() {
        let entry = entries
            .iter()
            .find(|e| &e.name == name)
            .ok_or_else(|| {
                SqlConduitError::ParameterMismatch(format!(
                    "no value supplied for placeholder :{name}"
                ))
            })?;
        bound.push(BoundParam {
            name: name.clone(),
            value: entry.value.clone(),
            ty: entry.ty,
        });
    }
    Ok(BoundParams::Single(bound))
}

fn bind_row(
    template: &SqlTemplate,
    values: Vec<ParamValue>,
    explicit: Option<&ParamTypes>,
    from_scalar: bool,
) -> Result<BoundParams, SqlConduitError> {
    let expected = template.placeholder_count();
    if expected == 0 && values.is_empty() {
        return Ok(BoundParams::None);
    }
    if from_scalar && expected != 1 {
        return Err(SqlConduitError::ParameterMismatch(format!(
            "a bare scalar parameter requires exactly one placeholder; statement names {expected}"
        )));
    }
    if values.len() != expected {
        return Err(SqlConduitError::ParameterMismatch(format!(
            "statement names {expected} placeholder(s) but {} value(s) were supplied",
            values.len()
        )));
    }

    let types = resolve_types(template, explicit, &values)?;
    let bound = template
        .placeholders()
        .iter()
        .zip(values)
        .map(|(name, value)| {
            // resolve_types guarantees an entry per placeholder
            let ty = types.get(name).unwrap_or(StorageType::Text);
            BoundParam {
                name: name.clone(),
                value,
                ty,
            }
        })
        .collect();
    Ok(BoundParams::Single(bound))
}

fn bind_rows(
    template: &SqlTemplate,
    rows: Vec<Vec<ParamValue>>,
    explicit: Option<&ParamTypes>,
) -> Result<BoundParams, SqlConduitError> {
    let expected = template.placeholder_count();
    if rows.is_empty() {
        return Err(SqlConduitError::MissingParameters(
            "parameter batch is empty".into(),
        ));
    }

    // One malformed row fails the whole construction; nothing is accepted
    // partially.
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(SqlConduitError::ParameterMismatch(format!(
                "parameter row {idx} has {} value(s); statement names {expected} placeholder(s)",
                row.len()
            )));
        }
    }

    let types = resolve_types(template, explicit, &rows[0])?;
    Ok(BoundParams::Batch(BatchBindings {
        names: template.placeholders().to_vec(),
        rows,
        types,
    }))
}

fn resolve_types(
    template: &SqlTemplate,
    explicit: Option<&ParamTypes>,
    first_row: &[ParamValue],
) -> Result<ParamTypes, SqlConduitError> {
    match explicit {
        Some(config) => {
            if config.len() > template.placeholder_count() {
                tracing::debug!(
                    "{} storage type(s) configured but statement names {} placeholder(s)",
                    config.len(),
                    template.placeholder_count()
                );
            }
            let mut resolved = ParamTypes::new();
            for name in template.placeholders() {
                let ty = config.get(name).ok_or_else(|| {
                    SqlConduitError::Config(format!(
                        "no storage type configured for placeholder :{name}"
                    ))
                })?;
                resolved.set(name.clone(), ty);
            }
            Ok(resolved)
        }
        None => Ok(infer_param_types(template.placeholders(), first_row)),
    }
}
