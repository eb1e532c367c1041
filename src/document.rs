//! The Swagger 2.0 document accumulated while models are registered.
//!
//! A [`SwaggerDocument`] starts out with the fixed top-level fields every
//! generated API shares and grows additively: each registration adds
//! definitions, path items and a tag. It never shrinks. The `host` field is
//! left empty until the document is served, because the network authority is
//! only known once a request arrives.

use crate::error::Result;
use crate::serializer::{serialize_json_with, serialize_yaml, JsonOptions};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Media type used for both request and response bodies
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Default `basePath` under which the REST endpoints are mounted
pub const DEFAULT_BASE_PATH: &str = "/api";

/// Swagger Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Swagger Schema object, also used for definition properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    /// Item schema for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Nested schema wrapper used for foreign-key backed relationships
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
}

impl Schema {
    /// An empty object schema with a property map.
    pub fn object() -> Self {
        Schema {
            schema_type: Some("object".to_string()),
            properties: Some(BTreeMap::new()),
            ..Default::default()
        }
    }

    /// A `$ref` to `#/definitions/<name>`.
    pub fn reference(name: &str) -> Self {
        Schema {
            reference: Some(definition_ref(name)),
            ..Default::default()
        }
    }

    /// A primitive schema of the given type and format.
    pub fn primitive(schema_type: &str, format: &str) -> Self {
        Schema {
            schema_type: Some(schema_type.to_string()),
            format: Some(format.to_string()),
            ..Default::default()
        }
    }
}

/// Builds the `$ref` target for a definition name.
pub fn definition_ref(name: &str) -> String {
    format!("#/definitions/{}", name)
}

/// Swagger Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header, body)
    #[serde(rename = "in")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Body schema, only for `in: body`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Swagger Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Swagger Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// Swagger PathItem object - all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

/// Swagger Tag object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    pub swagger: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub schemes: Vec<String>,
    #[serde(rename = "basePath")]
    pub base_path: String,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub paths: BTreeMap<String, PathItem>,
    pub definitions: BTreeMap<String, Schema>,
    pub tags: Vec<Tag>,
}

impl SwaggerDocument {
    /// Creates an empty document with the fixed top-level fields.
    pub fn new() -> Self {
        debug!("Initializing SwaggerDocument");
        Self {
            swagger: "2.0".to_string(),
            info: Info::default(),
            host: None,
            schemes: vec!["http".to_string(), "https".to_string()],
            base_path: DEFAULT_BASE_PATH.to_string(),
            consumes: vec![JSON_API_MEDIA_TYPE.to_string()],
            produces: vec![JSON_API_MEDIA_TYPE.to_string()],
            paths: BTreeMap::new(),
            definitions: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.info.version.as_deref()
    }

    pub fn set_version(&mut self, value: impl Into<String>) {
        self.info.version = Some(value.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.info.title.as_deref()
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.info.title = Some(value.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.info.description.as_deref()
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.info.description = Some(value.into());
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn set_base_path(&mut self, value: impl Into<String>) {
        self.base_path = value.into();
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Sets `host` to the network authority (`host[:port]`) of `url_root`.
    pub fn set_host_from_url(&mut self, url_root: &str) -> Result<()> {
        let url = Url::parse(url_root)?;
        let host = url
            .host_str()
            .ok_or_else(|| crate::error::Error::InvalidUrl(format!("{} has no host", url_root)))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        debug!("Serving document for host {}", authority);
        self.host = Some(authority);
        Ok(())
    }

    /// Returns a copy of the document with `host` resolved from the request URL.
    pub fn served(&self, url_root: &str) -> Result<SwaggerDocument> {
        let mut served = self.clone();
        served.set_host_from_url(url_root)?;
        Ok(served)
    }

    /// Serializes the document to JSON using the given formatting options.
    pub fn to_json(&self, options: &JsonOptions) -> Result<String> {
        serialize_json_with(self, options)
    }

    /// Serializes the document to YAML.
    ///
    /// Unlike [`SwaggerDocument::to_json`] this takes no options: serde_yaml
    /// exposes no formatting knobs.
    pub fn to_yaml(&self) -> Result<String> {
        serialize_yaml(self)
    }

    /// Every `$ref` in the document that does not resolve to a definition.
    pub fn dangling_refs(&self) -> Vec<String> {
        fn collect<'a>(schema: &'a Schema, out: &mut Vec<&'a str>) {
            if let Some(reference) = &schema.reference {
                out.push(reference);
            }
            for nested in [&schema.items, &schema.schema].into_iter().flatten() {
                collect(nested, out);
            }
            for property in schema.properties.iter().flat_map(|p| p.values()) {
                collect(property, out);
            }
        }

        let mut refs = Vec::new();
        for schema in self.definitions.values() {
            collect(schema, &mut refs);
        }
        for item in self.paths.values() {
            let operations = [
                &item.get,
                &item.post,
                &item.put,
                &item.delete,
                &item.patch,
                &item.options,
                &item.head,
            ];
            for operation in operations.into_iter().flatten() {
                for schema in operation.parameters.iter().filter_map(|p| p.schema.as_ref()) {
                    collect(schema, &mut refs);
                }
                for schema in operation.responses.values().filter_map(|r| r.schema.as_ref()) {
                    collect(schema, &mut refs);
                }
            }
        }

        refs.into_iter()
            .filter(|r| {
                r.strip_prefix("#/definitions/")
                    .map_or(true, |name| !self.definitions.contains_key(name))
            })
            .map(str::to_string)
            .collect()
    }
}

impl Default for SwaggerDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwaggerDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self
            .to_json(&JsonOptions::indented(4))
            .map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_shape() {
        let doc = SwaggerDocument::new();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["basePath"], "/api");
        assert_eq!(value["schemes"], serde_json::json!(["http", "https"]));
        assert_eq!(value["consumes"], serde_json::json!(["application/vnd.api+json"]));
        assert_eq!(value["produces"], serde_json::json!(["application/vnd.api+json"]));
        assert_eq!(value["info"], serde_json::json!({}));
        assert!(value.get("host").is_none());
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_info_accessors() {
        let mut doc = SwaggerDocument::new();
        assert_eq!(doc.title(), None);
        assert_eq!(doc.version(), None);
        assert_eq!(doc.description(), None);

        doc.set_title("Inventory");
        doc.set_version("1.2.0");
        doc.set_description("Widgets and gadgets");
        doc.set_base_path("/v2");

        assert_eq!(doc.title(), Some("Inventory"));
        assert_eq!(doc.version(), Some("1.2.0"));
        assert_eq!(doc.description(), Some("Widgets and gadgets"));
        assert_eq!(doc.base_path(), "/v2");
    }

    #[test]
    fn test_served_sets_host_from_authority() {
        let doc = SwaggerDocument::new();
        let served = doc.served("http://example.com:8080/").unwrap();
        assert_eq!(served.host.as_deref(), Some("example.com:8080"));

        let served = doc.served("https://api.example.com/").unwrap();
        assert_eq!(served.host.as_deref(), Some("api.example.com"));

        // The accumulated document itself is untouched.
        assert!(doc.host.is_none());
    }

    #[test]
    fn test_served_rejects_invalid_url() {
        let doc = SwaggerDocument::new();
        assert!(doc.served("not a url").is_err());
    }

    #[test]
    fn test_display_is_four_space_json() {
        let doc = SwaggerDocument::new();
        let rendered = doc.to_string();
        assert!(rendered.starts_with("{\n    \"swagger\": \"2.0\""));
    }

    #[test]
    fn test_to_yaml() {
        let mut doc = SwaggerDocument::new();
        doc.set_title("Inventory");
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.starts_with("swagger: '2.0'") || yaml.starts_with("swagger: \"2.0\""));
        assert!(yaml.contains("title: Inventory"));
        assert!(yaml.contains("basePath: /api"));
    }

    #[test]
    fn test_dangling_refs() {
        let mut doc = SwaggerDocument::new();
        let mut widget = Schema::object();
        widget
            .properties
            .as_mut()
            .unwrap()
            .insert("owner".to_string(), Schema::reference("Owner"));
        doc.definitions.insert("Widget".to_string(), widget);
        assert_eq!(doc.dangling_refs(), vec!["#/definitions/Owner".to_string()]);

        doc.definitions.insert("Owner".to_string(), Schema::object());
        assert!(doc.dangling_refs().is_empty());
    }
}
