//! Model descriptors and the capability interface the generators read them through.
//!
//! A model is described by plain data: its schema (class) name, table name,
//! docstring, an optional parent model it inherits columns from, its stored
//! columns, and its hybrid (computed) properties. Anything able to hand out
//! [`ModelDescriptor`]s by name can drive the generators by implementing
//! [`ModelSource`]; [`ModelCatalog`] is the in-memory implementation loaded
//! from a manifest.

use crate::introspect;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single column-like attribute of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Attribute name
    pub name: String,
    /// Rendered database type, e.g. `VARCHAR(255)`. Relationship
    /// attributes have no type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Column docstring, copied into the property description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Schema name of the model this attribute points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    /// Creates a nullable scalar column of the given rendered type.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: Some(column_type.into()),
            nullable: true,
            primary_key: false,
            doc: None,
            related: None,
        }
    }

    /// Creates a relationship attribute pointing at `related`.
    pub fn relationship(name: impl Into<String>, related: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: None,
            nullable: true,
            primary_key: false,
            doc: None,
            related: Some(related.into()),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// The live description of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Schema name, used for definitions and tags (e.g. `Widget`)
    pub name: String,
    /// Table name, used for URL paths (e.g. `widgets`)
    pub table_name: String,
    /// Database schema the table lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Model docstring, used as the operation description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Parent model whose columns are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Derived, non-stored attributes
    #[serde(default)]
    pub hybrid_properties: Vec<ColumnDescriptor>,
    /// Example rows used when scaffolding tests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<BTreeMap<String, serde_json::Value>>,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            schema: None,
            doc: None,
            extends: None,
            columns: Vec::new(),
            hybrid_properties: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_hybrid(mut self, property: ColumnDescriptor) -> Self {
        self.hybrid_properties.push(property);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_row(mut self, row: BTreeMap<String, serde_json::Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Columns and hybrid properties declared directly on this model.
    pub fn own_attributes(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().chain(self.hybrid_properties.iter())
    }
}

/// Capability interface over a set of models.
///
/// Implementors hand out descriptors by schema name and resolve
/// relationship attributes to the model they point at.
pub trait ModelSource {
    /// Looks a model up by schema name.
    fn model(&self, name: &str) -> Option<&ModelDescriptor>;

    /// Resolves the model a relationship attribute of `model` points at.
    ///
    /// The default looks the attribute up across the inheritance chain and
    /// follows its `related` name.
    fn related_model(&self, model: &ModelDescriptor, column: &str) -> Option<&ModelDescriptor> {
        let columns = introspect::get_columns(self, model).ok()?;
        let related = columns.get(column)?.related.as_deref()?;
        self.model(related)
    }
}

/// In-memory set of models keyed by schema name.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model, replacing any previous model with the same name.
    pub fn insert(&mut self, model: ModelDescriptor) {
        debug!("Adding model {} (table {})", model.name, model.table_name);
        self.models.insert(model.name.clone(), model);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }
}

impl FromIterator<ModelDescriptor> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = ModelDescriptor>>(iter: I) -> Self {
        let mut catalog = ModelCatalog::new();
        for model in iter {
            catalog.insert(model);
        }
        catalog
    }
}

impl ModelSource for ModelCatalog {
    fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModelCatalog {
        [
            ModelDescriptor::new("Owner", "owners")
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key()),
            ModelDescriptor::new("Widget", "widgets")
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key())
                .with_column(ColumnDescriptor::new("owner_id", "INTEGER"))
                .with_column(ColumnDescriptor::relationship("owner", "Owner")),
            ModelDescriptor::new("Gadget", "gadgets").extending("Widget"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.model("Widget").unwrap().table_name, "widgets");
        assert!(catalog.model("Missing").is_none());
    }

    #[test]
    fn test_related_model_follows_relationship() {
        let catalog = catalog();
        let widget = catalog.model("Widget").unwrap();
        let owner = catalog.related_model(widget, "owner").unwrap();
        assert_eq!(owner.name, "Owner");
        assert!(catalog.related_model(widget, "owner_id").is_none());
    }

    #[test]
    fn test_related_model_through_parent() {
        let catalog = catalog();
        let gadget = catalog.model("Gadget").unwrap();
        assert_eq!(catalog.related_model(gadget, "owner").unwrap().name, "Owner");
    }

    #[test]
    fn test_column_deserializes_with_defaults() {
        let column: ColumnDescriptor =
            serde_yaml::from_str("name: title\ntype: VARCHAR(80)\n").unwrap();
        assert_eq!(column.column_type.as_deref(), Some("VARCHAR(80)"));
        assert!(column.nullable);
        assert!(!column.primary_key);
        assert!(column.related.is_none());
    }
}
