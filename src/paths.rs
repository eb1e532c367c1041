//! Path builder - generates the collection and item path items for a model.
//!
//! Every model is exposed under a collection path (`/<table>`) and an item
//! path (`/<table>/{<key>}`). Which operations appear on them depends on the
//! HTTP methods the model is registered with.

use crate::document::{
    definition_ref, Operation, Parameter, PathItem, Response, Schema, SwaggerDocument, Tag,
};
use crate::error::{Error, Result};
use crate::introspect::{get_columns, primary_key_name};
use crate::model::{ModelDescriptor, ModelSource};
use crate::type_mapper::map_column_type;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the authentication header every operation requires
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP methods a model can be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// The slot for this method on a path item.
    fn slot(self, item: &mut PathItem) -> &mut Option<Operation> {
        match self {
            HttpMethod::Get => &mut item.get,
            HttpMethod::Post => &mut item.post,
            HttpMethod::Put => &mut item.put,
            HttpMethod::Delete => &mut item.delete,
            HttpMethod::Patch => &mut item.patch,
            HttpMethod::Options => &mut item.options,
            HttpMethod::Head => &mut item.head,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    /// Parses a method name case-insensitively.
    ///
    /// Only the seven operations a Swagger 2.0 path item can hold are
    /// accepted. Any other verb (`TRACE`, `CONNECT`, custom methods) is
    /// rejected with [`Error::InvalidMethod`] instead of being documented
    /// like `POST`, since the document would have nowhere to put it.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration options for one model.
///
/// These are handed verbatim to the REST manager that creates the
/// endpoints, and drive the path and definition builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiOptions {
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    #[serde(default)]
    pub url_prefix: String,
    /// Overrides the resolved primary key name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub exclude_columns: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            methods: default_methods(),
            url_prefix: String::new(),
            primary_key: None,
            exclude_columns: Vec::new(),
        }
    }
}

impl ApiOptions {
    pub fn with_methods(methods: &[&str]) -> Self {
        Self {
            methods: methods.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Parses the requested method names.
    pub fn parsed_methods(&self) -> Result<Vec<HttpMethod>> {
        self.methods.iter().map(|m| m.parse()).collect()
    }
}

fn api_key_parameter() -> Parameter {
    Parameter {
        name: API_KEY_HEADER.to_string(),
        location: "header".to_string(),
        description: None,
        required: true,
        param_type: Some("string".to_string()),
        format: None,
        default: None,
        schema: None,
    }
}

fn body_parameter(name: &str, description: &str, definition: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: "body".to_string(),
        description: Some(description.to_string()),
        required: true,
        param_type: None,
        format: None,
        default: None,
        schema: Some(Schema::reference(definition)),
    }
}

fn success(description: String, schema: Option<Schema>) -> BTreeMap<String, Response> {
    BTreeMap::from([("200".to_string(), Response { description, schema })])
}

/// Builds the `<Schema><kind>Body` / `<Schema><kind>BodyParams` envelope
/// definitions for a mutating method and returns the body definition name.
fn insert_body_definitions(
    doc: &mut SwaggerDocument,
    model: &ModelDescriptor,
    kind: &str,
    primary_key: Option<&str>,
) -> String {
    let body = format!("{}{}Body", model.name, kind);
    let params = format!("{}{}BodyParams", model.name, kind);

    let data = Schema {
        schema_type: Some("object".to_string()),
        reference: Some(definition_ref(&params)),
        ..Default::default()
    };
    doc.definitions.insert(
        body.clone(),
        Schema {
            properties: Some(BTreeMap::from([("data".to_string(), data)])),
            ..Schema::object()
        },
    );

    let mut properties = BTreeMap::from([
        (
            "type".to_string(),
            Schema {
                schema_type: Some("string".to_string()),
                example: Some(serde_json::Value::from(model.table_name.as_str())),
                ..Default::default()
            },
        ),
        ("attributes".to_string(), Schema::reference(&model.name)),
    ]);
    if let Some(key) = primary_key {
        properties.insert(
            key.to_string(),
            Schema {
                schema_type: Some("string".to_string()),
                example: Some(serde_json::Value::from("1")),
                ..Default::default()
            },
        );
    }
    doc.definitions.insert(
        params,
        Schema {
            properties: Some(properties),
            ..Schema::object()
        },
    );

    body
}

/// Resolves the collection path for a model, without the document's base path.
pub fn collection_path(doc: &SwaggerDocument, model: &ModelDescriptor, url_prefix: &str) -> String {
    let path = format!("{}/{}", url_prefix, model.table_name);
    match path.strip_prefix(doc.base_path()) {
        Some(stripped) if !doc.base_path().is_empty() => stripped.to_string(),
        _ => path,
    }
}

/// Name of the item path parameter for a primary key.
///
/// A key literally named `id` becomes `<Schema>Id` so that resources sharing
/// a generic key name stay distinguishable.
pub fn path_parameter_name(model: &ModelDescriptor, primary_key: &str) -> String {
    if primary_key == "id" {
        format!("{}Id", model.name)
    } else {
        primary_key.to_string()
    }
}

/// Adds the path items, tag and body definitions for `model`.
///
/// Re-registering a model overwrites its operations and body definitions but
/// appends another tag entry.
///
/// # Errors
///
/// Fails on an unknown method name, when no primary key can be resolved, or
/// when the primary key column has no scalar type.
pub fn build_paths<S: ModelSource + ?Sized>(
    doc: &mut SwaggerDocument,
    source: &S,
    model: &ModelDescriptor,
    options: &ApiOptions,
) -> Result<()> {
    let methods = options.parsed_methods()?;
    let name = &model.table_name;
    let schema = &model.name;
    let path = collection_path(doc, model, &options.url_prefix);
    debug!("Generating paths for {} at {}", schema, path);

    let columns = get_columns(source, model)?;
    let pkey = match &options.primary_key {
        Some(key) => key.clone(),
        None => primary_key_name(source, model)?,
    };
    let id_name = path_parameter_name(model, &pkey);
    let id_path = format!("{}/{{{}}}", path, id_name);

    let pkey_type = columns
        .get(&pkey)
        .and_then(|column| column.column_type.as_deref())
        .and_then(map_column_type)
        .ok_or_else(|| Error::UnsupportedPrimaryKey {
            model: schema.clone(),
            column: pkey.clone(),
        })?;
    let pkey_param = Parameter {
        name: id_name.clone(),
        location: "path".to_string(),
        description: Some(format!("Primary key of {}", schema)),
        required: true,
        param_type: Some(pkey_type.schema_type.to_string()),
        format: Some(pkey_type.format.to_string()),
        default: None,
        schema: None,
    };

    doc.paths.insert(path.clone(), PathItem::default());
    doc.tags.push(Tag {
        name: schema.clone(),
    });

    let operation = |parameters: Vec<Parameter>, responses| Operation {
        tags: vec![schema.clone()],
        description: model.doc.clone(),
        parameters,
        responses,
    };

    for method in methods {
        debug!("Adding {} operations for {}", method, schema);
        match method {
            HttpMethod::Get => {
                let filter = Parameter {
                    name: "filter[objects]".to_string(),
                    location: "query".to_string(),
                    description: Some("Filter by field".to_string()),
                    required: false,
                    param_type: Some("string".to_string()),
                    format: None,
                    default: Some(format!(
                        r#"[{{"name": "{}", "op": "==", "val": 1}}]"#,
                        pkey
                    )),
                    schema: None,
                };
                let list = Schema {
                    title: Some(name.clone()),
                    schema_type: Some("array".to_string()),
                    items: Some(Box::new(Schema::reference(schema))),
                    ..Default::default()
                };
                let collection_op = operation(
                    vec![filter, api_key_parameter()],
                    success(format!("List {}", name), Some(list)),
                );
                let item_op = operation(
                    vec![pkey_param.clone(), api_key_parameter()],
                    success(format!("Success {}", name), Some(Schema::reference(schema))),
                );
                *method.slot(doc.paths.entry(path.clone()).or_default()) = Some(collection_op);
                *method.slot(doc.paths.entry(id_path.clone()).or_default()) = Some(item_op);
            }
            HttpMethod::Delete => {
                let item_op = operation(
                    vec![pkey_param.clone(), api_key_parameter()],
                    success("Success".to_string(), None),
                );
                *method.slot(doc.paths.entry(id_path.clone()).or_default()) = Some(item_op);
            }
            HttpMethod::Patch | HttpMethod::Put => {
                let body = insert_body_definitions(doc, model, "patch", Some(&pkey));
                let mut parameters = vec![pkey_param.clone(), body_parameter(name, schema, &body)];
                if method == HttpMethod::Patch {
                    parameters.push(api_key_parameter());
                }
                let item_op = operation(parameters, success("Success".to_string(), None));
                *method.slot(doc.paths.entry(id_path.clone()).or_default()) = Some(item_op);
            }
            HttpMethod::Post | HttpMethod::Options | HttpMethod::Head => {
                let body = insert_body_definitions(doc, model, "post", None);
                let mut parameters = vec![body_parameter("data", schema, &body)];
                if method == HttpMethod::Post {
                    parameters.push(api_key_parameter());
                }
                let collection_op = operation(parameters, success("Success".to_string(), None));
                *method.slot(doc.paths.entry(path.clone()).or_default()) = Some(collection_op);
            }
        }
    }

    Ok(())
}
