//! Definition builder - turns model columns into Swagger schema definitions.
//!
//! Scalar columns become typed properties. Columns whose type has no scalar
//! mapping are treated as relationships: the property references the related
//! model's definition, and that definition is generated as well unless the
//! document already holds one.

use crate::document::{Schema, SwaggerDocument};
use crate::error::{Error, Result};
use crate::introspect::get_columns;
use crate::model::{ModelDescriptor, ModelSource};
use crate::type_mapper::map_column_type;
use log::debug;
use std::collections::BTreeMap;

/// Builds (or rebuilds) `definitions[model.name]`.
///
/// Columns named in `exclude_columns` are left out. Related models reached
/// through relationship columns are defined recursively with no exclusions,
/// but only when the document has no definition for them yet; a model that
/// is already present is never refreshed, which also terminates mutually
/// referencing relationships.
///
/// # Errors
///
/// Returns [`Error::UnresolvedColumn`] for a column that has neither a known
/// scalar type nor a resolvable related model, and propagates column
/// collection errors.
pub fn build_definition<S: ModelSource + ?Sized>(
    doc: &mut SwaggerDocument,
    source: &S,
    model: &ModelDescriptor,
    exclude_columns: &[String],
) -> Result<()> {
    debug!("Generating definition for {}", model.name);

    let columns = get_columns(source, model)?;
    let mut properties = BTreeMap::new();
    let mut related_models: Vec<&ModelDescriptor> = Vec::new();

    for (name, column) in &columns {
        if exclude_columns.contains(name) {
            debug!("Excluding {}.{}", model.name, name);
            continue;
        }

        let scalar = column.column_type.as_deref().and_then(map_column_type);
        let mut property = match scalar {
            Some(mapping) => Schema::primitive(mapping.schema_type, mapping.format),
            None => {
                let related = source.related_model(model, name).ok_or_else(|| {
                    Error::UnresolvedColumn {
                        model: model.name.clone(),
                        column: name.clone(),
                    }
                })?;
                debug!("{}.{} references {}", model.name, name, related.name);
                related_models.push(related);

                if columns.contains_key(&format!("{}_id", name)) {
                    Schema {
                        schema: Some(Box::new(Schema::reference(&related.name))),
                        ..Default::default()
                    }
                } else {
                    Schema::reference(&related.name)
                }
            }
        };

        if let Some(doc_string) = &column.doc {
            property.description = Some(doc_string.clone());
        }
        properties.insert(name.clone(), property);
    }

    doc.definitions.insert(
        model.name.clone(),
        Schema {
            properties: Some(properties),
            ..Schema::object()
        },
    );

    for related in related_models {
        if doc.has_definition(&related.name) {
            debug!("Definition for {} already exists", related.name);
            continue;
        }
        build_definition(doc, source, related, &[])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDescriptor, ModelCatalog};
    use pretty_assertions::assert_eq;

    fn catalog() -> ModelCatalog {
        [
            ModelDescriptor::new("A", "as")
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key())
                .with_column(ColumnDescriptor::new("b_id", "INTEGER"))
                .with_column(ColumnDescriptor::relationship("b", "B"))
                .with_column(ColumnDescriptor::relationship("c", "C").with_doc("Linked C")),
            ModelDescriptor::new("B", "bs")
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key())
                .with_column(ColumnDescriptor::new("secret", "TEXT"))
                .with_column(ColumnDescriptor::relationship("a", "A")),
            ModelDescriptor::new("C", "cs")
                .with_column(ColumnDescriptor::new("id", "BIGINT").primary_key())
                .with_column(ColumnDescriptor::new("name", "VARCHAR(40)").with_doc("Display name")),
            ModelDescriptor::new("Broken", "broken")
                .with_column(ColumnDescriptor::new("payload", "JSONB")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scalar_properties_and_descriptions() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        build_definition(&mut doc, &catalog, catalog.model("C").unwrap(), &[]).unwrap();

        let value = serde_json::to_value(&doc.definitions["C"]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "name": {"type": "string", "format": "string", "description": "Display name"}
                }
            })
        );
    }

    #[test]
    fn test_relationship_with_foreign_key_column() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        build_definition(&mut doc, &catalog, catalog.model("A").unwrap(), &[]).unwrap();

        let properties = doc.definitions["A"].properties.as_ref().unwrap();
        assert_eq!(
            serde_json::to_value(&properties["b"]).unwrap(),
            serde_json::json!({"schema": {"$ref": "#/definitions/B"}})
        );
        // No sibling c_id column: direct reference, keeping the docstring
        assert_eq!(
            serde_json::to_value(&properties["c"]).unwrap(),
            serde_json::json!({"$ref": "#/definitions/C", "description": "Linked C"})
        );

        // Related models are defined even though only A was requested
        assert!(doc.has_definition("B"));
        assert!(doc.has_definition("C"));
        assert!(doc.dangling_refs().is_empty());
    }

    #[test]
    fn test_mutual_relationships_terminate() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        build_definition(&mut doc, &catalog, catalog.model("B").unwrap(), &[]).unwrap();

        assert_eq!(doc.definitions.len(), 3);
        let b = doc.definitions["B"].properties.as_ref().unwrap();
        assert_eq!(b["a"].reference.as_deref(), Some("#/definitions/A"));
    }

    #[test]
    fn test_exclusions_do_not_cascade_to_existing_definitions() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        build_definition(&mut doc, &catalog, catalog.model("B").unwrap(), &[]).unwrap();

        let exclude = vec!["secret".to_string()];
        build_definition(&mut doc, &catalog, catalog.model("A").unwrap(), &exclude).unwrap();

        // B was already present and is not regenerated
        let b = doc.definitions["B"].properties.as_ref().unwrap();
        assert!(b.contains_key("secret"));
    }

    #[test]
    fn test_excluded_columns_are_skipped() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        let exclude = vec!["secret".to_string(), "a".to_string()];
        build_definition(&mut doc, &catalog, catalog.model("B").unwrap(), &exclude).unwrap();

        let b = doc.definitions["B"].properties.as_ref().unwrap();
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["id"]);
        // Nothing related was reached
        assert_eq!(doc.definitions.len(), 1);
    }

    #[test]
    fn test_unresolvable_column_is_an_error() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        let result = build_definition(&mut doc, &catalog, catalog.model("Broken").unwrap(), &[]);
        assert!(matches!(
            result,
            Err(Error::UnresolvedColumn { column, .. }) if column == "payload"
        ));
    }

    #[test]
    fn test_rebuild_overwrites_definition() {
        let catalog = catalog();
        let mut doc = SwaggerDocument::new();
        let c = catalog.model("C").unwrap();
        build_definition(&mut doc, &catalog, c, &["name".to_string()]).unwrap();
        build_definition(&mut doc, &catalog, c, &[]).unwrap();

        let properties = doc.definitions["C"].properties.as_ref().unwrap();
        assert!(properties.contains_key("name"));
    }
}
