//! Integration-test scaffolding for registered models.
//!
//! For every model registered with `GET` or `POST`, a sample row is drawn
//! from the model's data and rendered into a test stub appended to a single
//! test file. The output is a starting point for hand-written tests, not
//! verified behaviour: a model that cannot be sampled is simply skipped.

use crate::error::{Error, Result};
use crate::introspect::{get_columns, primary_key_name};
use crate::model::{ColumnDescriptor, ModelCatalog, ModelDescriptor, ModelSource};
use crate::type_mapper::strip_type_params;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use minijinja::Environment;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER_TEMPLATE: &str = r#"import json

import requests

BASE_URL = "{{ base_url }}"
HEADERS = {
    "Content-Type": "application/vnd.api+json",
    "Accept": "application/vnd.api+json",
    "X-Api-Key": "{{ api_key }}",
}
"#;

const GET_TEMPLATE: &str = r#"

def test_get_{{ table }}():
    response = requests.get(BASE_URL + "/{{ table }}", headers=HEADERS)
    assert response.status_code == 200
    response = requests.get(BASE_URL + "/{{ table }}/{{ id }}", headers=HEADERS)
    assert response.status_code == 200
    response = requests.get(
        BASE_URL + "/{{ table }}",
        headers=HEADERS,
        params={"filter[objects]": {{ filter | tojson }}},
    )
    assert response.status_code == 200
"#;

const POST_TEMPLATE: &str = r#"

def test_post_{{ table }}():
    payload = {{ payload }}
    response = requests.post(BASE_URL + "/{{ table }}", headers=HEADERS, data=json.dumps(payload))
    assert response.status_code == 201
"#;

/// A value read from a sampled row.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Enumeration member, carrying its underlying value
    Enum(String),
}

impl SampleValue {
    fn is_truthy(&self) -> bool {
        match self {
            SampleValue::Null => false,
            SampleValue::Integer(i) => *i != 0,
            SampleValue::Float(f) => *f != 0.0,
            SampleValue::Text(s) => !s.is_empty(),
            SampleValue::Boolean(b) => *b,
            SampleValue::Date(_) | SampleValue::DateTime(_) | SampleValue::Enum(_) => true,
        }
    }

    fn to_text(&self) -> String {
        match self {
            SampleValue::Null => "None".to_string(),
            SampleValue::Integer(i) => i.to_string(),
            SampleValue::Float(f) => f.to_string(),
            SampleValue::Text(s) | SampleValue::Enum(s) => s.clone(),
            SampleValue::Boolean(b) => b.to_string(),
            SampleValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            SampleValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SampleValue::Null => Value::Null,
            SampleValue::Integer(i) => json!(i),
            SampleValue::Float(f) => json!(f),
            SampleValue::Boolean(b) => json!(b),
            other => Value::String(other.to_text()),
        }
    }
}

/// One sampled row, keyed by column name.
pub type Row = BTreeMap<String, SampleValue>;

/// Draws one row of live data for a model.
pub trait RowSampler {
    /// Returns a random row of `model`, or `None` when it has no rows.
    fn sample_row(&self, model: &ModelDescriptor) -> Result<Option<Row>>;
}

/// Converts a manifest value into a typed sample according to its column.
fn parse_sample(column: Option<&ColumnDescriptor>, raw: &Value) -> Result<SampleValue> {
    let base = column
        .and_then(|c| c.column_type.as_deref())
        .map(strip_type_params);

    let value = match (base, raw) {
        (_, Value::Null) => SampleValue::Null,
        (Some("DATE"), Value::String(s)) => SampleValue::Date(
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|e| Error::SampleError(format!("{}: {}", s, e)))?,
        ),
        (Some("DATETIME"), Value::String(s)) => SampleValue::DateTime(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT))
                .map_err(|e| Error::SampleError(format!("{}: {}", s, e)))?,
        ),
        (Some("ENUM"), Value::String(s)) => SampleValue::Enum(s.clone()),
        (_, Value::Bool(b)) => SampleValue::Boolean(*b),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => SampleValue::Integer(i),
            None => SampleValue::Float(n.as_f64().unwrap_or_default()),
        },
        (_, Value::String(s)) => SampleValue::Text(s.clone()),
        (_, other) => {
            return Err(Error::SampleError(format!(
                "unsupported sample value {}",
                other
            )))
        }
    };
    Ok(value)
}

impl RowSampler for ModelCatalog {
    fn sample_row(&self, model: &ModelDescriptor) -> Result<Option<Row>> {
        let Some(raw) = model.rows.choose(&mut rand::thread_rng()) else {
            return Ok(None);
        };
        let columns = get_columns(self, model)?;
        raw.iter()
            .map(|(name, value)| Ok((name.clone(), parse_sample(columns.get(name), value)?)))
            .collect::<Result<Row>>()
            .map(Some)
    }
}

/// Builds the example equality filter on a primary key value.
pub fn example_filter(primary_key: &str, value: &SampleValue) -> Result<String> {
    match value {
        SampleValue::Integer(i) => Ok(format!(
            r#"[{{"name": "{}", "op": "==", "val": {}}}]"#,
            primary_key, i
        )),
        SampleValue::Text(s) => Ok(format!(
            r#"[{{"name": "{}", "op": "==", "val": "{}"}}]"#,
            primary_key, s
        )),
        other => Err(Error::SampleError(format!(
            "cannot filter on primary key value {:?}",
            other
        ))),
    }
}

/// Coerces a sampled value to its JSON request representation.
pub fn coerce_value(column: &ColumnDescriptor, value: &SampleValue) -> Result<Value> {
    let base = column
        .column_type
        .as_deref()
        .map(strip_type_params)
        .unwrap_or_default();

    if column.nullable && !value.is_truthy() {
        return Ok(Value::Null);
    }

    let coerced = match (base, value) {
        ("DATE", SampleValue::Date(d)) => json!(d.format(DATE_FORMAT).to_string()),
        ("DATETIME", SampleValue::DateTime(dt)) => json!(dt.format(DATETIME_FORMAT).to_string()),
        ("INTEGER", v) if !v.is_truthy() => Value::Null,
        ("INTEGER", SampleValue::Integer(i)) => json!(i),
        ("INTEGER", SampleValue::Float(f)) => json!(f.trunc() as i64),
        ("INTEGER", SampleValue::Text(s)) => {
            let parsed: i64 = s
                .trim()
                .parse()
                .map_err(|e| Error::SampleError(format!("{}: {}", s, e)))?;
            json!(parsed)
        }
        ("TEXT", v) => json!(v.to_text()),
        ("BOOLEAN", v) => json!(v.is_truthy()),
        ("VARCHAR" | "ENUM", SampleValue::Enum(s) | SampleValue::Text(s)) => json!(s),
        ("DATE" | "DATETIME" | "INTEGER" | "VARCHAR" | "ENUM", other) => {
            return Err(Error::SampleError(format!(
                "cannot coerce {:?} for {} column {}",
                other, base, column.name
            )))
        }
        (_, v) => v.to_json(),
    };
    Ok(coerced)
}

/// Renders a JSON value as the equivalent Python literal.
///
/// JSON string escapes are valid Python, so only the keywords and the
/// separators differ from the JSON text.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| {
                    format!("{}: {}", Value::String(key.clone()), python_literal(value))
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Builds the JSON-API POST payload from a sampled row.
///
/// The primary key is dropped; every other value is coerced per its column.
pub fn post_payload(
    model: &ModelDescriptor,
    columns: &BTreeMap<String, ColumnDescriptor>,
    primary_key: &str,
    mut row: Row,
) -> Result<Value> {
    row.remove(primary_key);

    let mut attributes = serde_json::Map::new();
    for (name, value) in &row {
        let column = columns.get(name).ok_or_else(|| {
            Error::SampleError(format!("{} has no column {}", model.name, name))
        })?;
        attributes.insert(name.clone(), coerce_value(column, value)?);
    }

    Ok(json!({
        "data": {
            "type": model.table_name,
            "attributes": attributes,
        }
    }))
}

/// Where and how test stubs are written.
#[derive(Debug, Clone)]
pub struct ScaffoldConfig {
    pub tests_dir: PathBuf,
    /// Directory holding `header_tests_template`, `get_template` and
    /// `post_template` overrides
    pub templates_dir: Option<PathBuf>,
    /// Environment variable the API key is read from
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("tests"),
            templates_dir: None,
            api_key_env: "SWAGGER_API_KEY".to_string(),
            base_url: "http://localhost:5000/api".to_string(),
        }
    }
}

struct TestTemplates {
    header: String,
    get: String,
    post: String,
}

impl TestTemplates {
    fn load(dir: Option<&Path>) -> Result<Self> {
        let read = |name: &str, fallback: &str| -> Result<String> {
            match dir {
                Some(dir) => {
                    let path = dir.join(name);
                    if path.is_file() {
                        debug!("Using template {}", path.display());
                        return Ok(fs::read_to_string(path)?);
                    }
                    Ok(fallback.to_string())
                }
                None => Ok(fallback.to_string()),
            }
        };
        Ok(Self {
            header: read("header_tests_template", HEADER_TEMPLATE)?,
            get: read("get_template", GET_TEMPLATE)?,
            post: read("post_template", POST_TEMPLATE)?,
        })
    }
}

fn render(source: &str, ctx: &Value) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("tpl", source)?;
    Ok(env.get_template("tpl")?.render(ctx)?)
}

/// Appends rendered test stubs to a single test file.
pub struct ScaffoldWriter {
    test_file: PathBuf,
    templates: TestTemplates,
    api_key: String,
    base_url: String,
}

impl ScaffoldWriter {
    /// Creates (or resets) the tests package and writes the file header.
    pub fn begin(config: &ScaffoldConfig) -> Result<Self> {
        if config.tests_dir.is_dir() {
            info!("Updating tests in {}", config.tests_dir.display());
        } else {
            info!("Creating tests package in {}", config.tests_dir.display());
            fs::create_dir_all(&config.tests_dir)?;
        }

        let writer = Self {
            test_file: config.tests_dir.join("test_routes.py"),
            templates: TestTemplates::load(config.templates_dir.as_deref())?,
            api_key: std::env::var(&config.api_key_env).unwrap_or_default(),
            base_url: config.base_url.clone(),
        };

        fs::write(config.tests_dir.join("__init__.py"), "")?;
        let header = render(
            &writer.templates.header,
            &json!({"api_key": writer.api_key, "base_url": writer.base_url}),
        )?;
        fs::write(&writer.test_file, header)?;
        Ok(writer)
    }

    pub fn test_file(&self) -> &Path {
        &self.test_file
    }

    fn append(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.test_file)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Appends a GET stub for `model`. Returns `false` when the model has no rows.
    pub fn generate_get_test<S>(&self, source: &S, model: &ModelDescriptor) -> Result<bool>
    where
        S: ModelSource + RowSampler + ?Sized,
    {
        let Some(row) = source.sample_row(model)? else {
            return Ok(false);
        };
        let primary_key = primary_key_name(source, model)?;
        let id = row.get(&primary_key).ok_or_else(|| {
            Error::SampleError(format!("sample row lacks primary key {}", primary_key))
        })?;
        let filter = example_filter(&primary_key, id)?;

        let stub = render(
            &self.templates.get,
            &json!({
                "api_key": self.api_key,
                "table": model.table_name,
                "id": id.to_text(),
                "filter": filter,
            }),
        )?;
        self.append(&stub)?;
        info!("Generated test_get_{}()", model.table_name);
        Ok(true)
    }

    /// Appends a POST stub for `model`. Returns `false` when the model has no rows.
    pub fn generate_post_test<S>(&self, source: &S, model: &ModelDescriptor) -> Result<bool>
    where
        S: ModelSource + RowSampler + ?Sized,
    {
        let Some(row) = source.sample_row(model)? else {
            return Ok(false);
        };
        let primary_key = primary_key_name(source, model)?;
        let columns = get_columns(source, model)?;
        let payload = post_payload(model, &columns, &primary_key, row)?;

        let stub = render(
            &self.templates.post,
            &json!({
                "api_key": self.api_key,
                "table": model.table_name,
                "payload": python_literal(&payload),
            }),
        )?;
        self.append(&stub)?;
        info!("Generated test_post_{}()", model.table_name);
        Ok(true)
    }
}
