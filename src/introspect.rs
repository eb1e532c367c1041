//! Column collection and primary-key resolution.

use crate::error::{Error, Result};
use crate::model::{ColumnDescriptor, ModelDescriptor, ModelSource};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Returns every column-like attribute of `model`, keyed by name.
///
/// Attributes declared on ancestors (via `extends`) are included, as are
/// hybrid properties. A descendant's declaration shadows an ancestor's
/// attribute of the same name.
///
/// # Errors
///
/// Returns [`Error::UnknownModel`] when an ancestor cannot be found and
/// [`Error::InheritanceCycle`] when the `extends` chain loops.
pub fn get_columns<S: ModelSource + ?Sized>(
    source: &S,
    model: &ModelDescriptor,
) -> Result<BTreeMap<String, ColumnDescriptor>> {
    let mut chain: Vec<&ModelDescriptor> = vec![model];
    let mut seen: HashSet<&str> = HashSet::from([model.name.as_str()]);
    let mut current = model;

    while let Some(parent_name) = current.extends.as_deref() {
        if !seen.insert(parent_name) {
            return Err(Error::InheritanceCycle(parent_name.to_string()));
        }
        let parent = source
            .model(parent_name)
            .ok_or_else(|| Error::UnknownModel(parent_name.to_string()))?;
        chain.push(parent);
        current = parent;
    }

    // Root ancestor first so descendants overwrite.
    let mut columns = BTreeMap::new();
    for ancestor in chain.iter().rev() {
        for column in ancestor.own_attributes() {
            columns.insert(column.name.clone(), column.clone());
        }
    }

    debug!("Collected {} columns for {}", columns.len(), model.name);
    Ok(columns)
}

/// Returns the names of all primary-key columns of `model`.
pub fn primary_key_names<S: ModelSource + ?Sized>(
    source: &S,
    model: &ModelDescriptor,
) -> Result<Vec<String>> {
    Ok(get_columns(source, model)?
        .into_values()
        .filter(|column| column.primary_key)
        .map(|column| column.name)
        .collect())
}

/// Picks the single primary key name used to identify `model`.
///
/// `"id"` wins when it is among several keys; otherwise the first key is
/// returned. Composite keys are not otherwise supported.
pub fn primary_key_name<S: ModelSource + ?Sized>(
    source: &S,
    model: &ModelDescriptor,
) -> Result<String> {
    let names = primary_key_names(source, model)?;
    if names.iter().any(|name| name == "id") {
        return Ok("id".to_string());
    }
    names
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoPrimaryKey(model.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelCatalog;

    fn catalog() -> ModelCatalog {
        [
            ModelDescriptor::new("Base", "bases")
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key())
                .with_column(ColumnDescriptor::new("created", "DATETIME"))
                .with_column(ColumnDescriptor::new("label", "TEXT")),
            ModelDescriptor::new("Widget", "widgets")
                .extending("Base")
                .with_column(ColumnDescriptor::new("label", "VARCHAR(20)"))
                .with_hybrid(ColumnDescriptor::new("display_name", "TEXT")),
            ModelDescriptor::new("Pair", "pairs")
                .with_column(ColumnDescriptor::new("left_code", "VARCHAR(4)").primary_key())
                .with_column(ColumnDescriptor::new("right_code", "VARCHAR(4)").primary_key()),
            ModelDescriptor::new("Tagged", "tagged")
                .with_column(ColumnDescriptor::new("slug", "TEXT").primary_key())
                .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key()),
            ModelDescriptor::new("Keyless", "keyless")
                .with_column(ColumnDescriptor::new("value", "TEXT")),
            ModelDescriptor::new("Loop", "loops").extending("Loop"),
            ModelDescriptor::new("Orphan", "orphans").extending("Nowhere"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_columns_include_ancestors_and_hybrids() {
        let catalog = catalog();
        let widget = catalog.model("Widget").unwrap();
        let columns = get_columns(&catalog, widget).unwrap();

        let names: Vec<_> = columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["created", "display_name", "id", "label"]);
    }

    #[test]
    fn test_descendant_shadows_ancestor() {
        let catalog = catalog();
        let widget = catalog.model("Widget").unwrap();
        let columns = get_columns(&catalog, widget).unwrap();
        assert_eq!(columns["label"].column_type.as_deref(), Some("VARCHAR(20)"));
    }

    #[test]
    fn test_inheritance_cycle_is_an_error() {
        let catalog = catalog();
        let looping = catalog.model("Loop").unwrap();
        assert!(matches!(
            get_columns(&catalog, looping),
            Err(Error::InheritanceCycle(_))
        ));
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let catalog = catalog();
        let orphan = catalog.model("Orphan").unwrap();
        assert!(matches!(
            get_columns(&catalog, orphan),
            Err(Error::UnknownModel(name)) if name == "Nowhere"
        ));
    }

    #[test]
    fn test_primary_key_inherited() {
        let catalog = catalog();
        let widget = catalog.model("Widget").unwrap();
        assert_eq!(primary_key_names(&catalog, widget).unwrap(), vec!["id"]);
        assert_eq!(primary_key_name(&catalog, widget).unwrap(), "id");
    }

    #[test]
    fn test_id_preferred_among_composite_keys() {
        let catalog = catalog();
        let tagged = catalog.model("Tagged").unwrap();
        assert_eq!(primary_key_names(&catalog, tagged).unwrap().len(), 2);
        assert_eq!(primary_key_name(&catalog, tagged).unwrap(), "id");
    }

    #[test]
    fn test_first_key_without_id() {
        let catalog = catalog();
        let pair = catalog.model("Pair").unwrap();
        assert_eq!(primary_key_name(&catalog, pair).unwrap(), "left_code");
    }

    #[test]
    fn test_no_primary_key() {
        let catalog = catalog();
        let keyless = catalog.model("Keyless").unwrap();
        assert!(matches!(
            primary_key_name(&catalog, keyless),
            Err(Error::NoPrimaryKey(_))
        ));
    }
}
