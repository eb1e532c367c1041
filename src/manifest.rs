//! Model manifest loading.
//!
//! A manifest describes the API metadata, every model, and which models are
//! registered with which options. It is read from YAML or JSON depending on
//! the file extension.
//!
//! ```yaml
//! api:
//!   title: Inventory
//!   version: 1.0.0
//!   base_path: /api
//! models:
//!   - name: Widget
//!     table_name: widgets
//!     columns:
//!       - { name: id, type: INTEGER, primary_key: true }
//!     register:
//!       methods: [GET, POST]
//! ```

use crate::document::{SwaggerDocument, DEFAULT_BASE_PATH};
use crate::error::{Error, Result};
use crate::model::{ModelCatalog, ModelDescriptor};
use crate::paths::ApiOptions;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// API-wide document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            title: None,
            version: None,
            description: None,
            base_path: default_base_path(),
        }
    }
}

impl ApiSettings {
    /// Copies the settings onto a document.
    pub fn apply(&self, doc: &mut SwaggerDocument) {
        if let Some(title) = &self.title {
            doc.set_title(title.clone());
        }
        if let Some(version) = &self.version {
            doc.set_version(version.clone());
        }
        if let Some(description) = &self.description {
            doc.set_description(description.clone());
        }
        doc.set_base_path(self.base_path.clone());
    }
}

/// One model plus its optional registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(flatten)]
    pub model: ModelDescriptor,
    /// Absent for models that are only inherited from or related to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<ApiOptions>,
}

/// A parsed model manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl Manifest {
    /// Reads a manifest, choosing JSON for `.json` files and YAML otherwise.
    pub fn from_path(path: &Path) -> Result<Self> {
        info!("Loading model manifest {}", path.display());
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let manifest: Manifest = parsed.map_err(|message| Error::ManifestError {
            file: path.to_path_buf(),
            message,
        })?;

        debug!("Manifest declares {} models", manifest.models.len());
        Ok(manifest)
    }

    /// All declared models, registered or not.
    pub fn catalog(&self) -> ModelCatalog {
        self.models.iter().map(|entry| entry.model.clone()).collect()
    }

    /// Registrations in declaration order.
    pub fn registrations(&self) -> impl Iterator<Item = (&str, &ApiOptions)> {
        self.models.iter().filter_map(|entry| {
            entry
                .register
                .as_ref()
                .map(|options| (entry.model.name.as_str(), options))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSource;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
api:
  title: Inventory
  version: 2.1.0
models:
  - name: Base
    table_name: bases
    columns:
      - { name: id, type: INTEGER, primary_key: true }
  - name: Widget
    table_name: widgets
    extends: Base
    doc: A widget
    columns:
      - { name: name, type: VARCHAR(40), nullable: false }
    register:
      methods: [GET, PATCH]
      exclude_columns: [name]
"#;

    #[test]
    fn test_parse_yaml_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("models.yaml");
        fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::from_path(&path).unwrap();
        assert_eq!(manifest.api.title.as_deref(), Some("Inventory"));
        assert_eq!(manifest.api.base_path, "/api");

        let registrations: Vec<_> = manifest.registrations().collect();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].0, "Widget");
        assert_eq!(registrations[0].1.methods, vec!["GET", "PATCH"]);
        assert_eq!(registrations[0].1.url_prefix, "");

        let catalog = manifest.catalog();
        assert_eq!(catalog.model("Widget").unwrap().extends.as_deref(), Some("Base"));
    }

    #[test]
    fn test_parse_json_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("models.json");
        fs::write(
            &path,
            r#"{"models": [{"name": "Tag", "table_name": "tags", "register": {}}]}"#,
        )
        .unwrap();

        let manifest = Manifest::from_path(&path).unwrap();
        let (name, options) = manifest.registrations().next().unwrap();
        assert_eq!(name, "Tag");
        assert_eq!(options.methods, vec!["GET"]);
    }

    #[test]
    fn test_invalid_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.yaml");
        fs::write(&path, "models: 12").unwrap();
        assert!(matches!(
            Manifest::from_path(&path),
            Err(Error::ManifestError { .. })
        ));
    }

    #[test]
    fn test_settings_apply() {
        let settings = ApiSettings {
            title: Some("T".into()),
            base_path: "/v1".into(),
            ..Default::default()
        };
        let mut doc = SwaggerDocument::new();
        settings.apply(&mut doc);
        assert_eq!(doc.title(), Some("T"));
        assert_eq!(doc.version(), None);
        assert_eq!(doc.base_path(), "/v1");
    }
}
