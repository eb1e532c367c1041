//! Registration manager tying endpoint creation to documentation.
//!
//! [`SwagApiManager::register`] is the single entry point per model: it
//! hands the model to the REST manager that creates the CRUD endpoints,
//! extends the Swagger document with the model's definition and paths, and
//! then opportunistically writes test scaffolding.

use crate::definitions::build_definition;
use crate::document::SwaggerDocument;
use crate::error::{Error, Result};
use crate::model::{ModelDescriptor, ModelSource};
use crate::paths::{build_paths, ApiOptions, HttpMethod};
use crate::scaffold::{RowSampler, ScaffoldWriter};
use log::{debug, info, warn};

/// Creates the actual REST endpoints for a model.
pub trait ApiManager {
    /// Creates the endpoints for `model`. Options are passed through verbatim.
    fn create_api(&mut self, model: &ModelDescriptor, options: &ApiOptions) -> Result<()>;
}

/// An [`ApiManager`] that creates no endpoints, for documentation-only runs.
#[derive(Debug, Default)]
pub struct DocumentationOnly;

impl ApiManager for DocumentationOnly {
    fn create_api(&mut self, model: &ModelDescriptor, options: &ApiOptions) -> Result<()> {
        debug!(
            "Skipping endpoint creation for {} ({:?})",
            model.name, options.methods
        );
        Ok(())
    }
}

/// Owns the Swagger document while models are registered.
pub struct SwagApiManager<M: ApiManager> {
    manager: M,
    document: SwaggerDocument,
    scaffold: Option<ScaffoldWriter>,
}

impl<M: ApiManager> SwagApiManager<M> {
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            document: SwaggerDocument::new(),
            scaffold: None,
        }
    }

    /// Enables test scaffolding for subsequent registrations.
    pub fn with_scaffold(mut self, scaffold: ScaffoldWriter) -> Self {
        self.scaffold = Some(scaffold);
        self
    }

    pub fn document(&self) -> &SwaggerDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SwaggerDocument {
        &mut self.document
    }

    pub fn api_manager(&self) -> &M {
        &self.manager
    }

    /// Registers a model: endpoints, definition, paths, then test stubs.
    ///
    /// Registering the same model twice overwrites its definition and paths
    /// but adds a second tag entry.
    ///
    /// # Errors
    ///
    /// Fails when the model is unknown, when the REST manager fails, or when
    /// the definition or paths cannot be built. Test scaffolding failures are
    /// logged and never returned.
    pub fn register<S>(&mut self, source: &S, model_name: &str, options: &ApiOptions) -> Result<()>
    where
        S: ModelSource + RowSampler + ?Sized,
    {
        let model = source
            .model(model_name)
            .ok_or_else(|| Error::UnknownModel(model_name.to_string()))?;
        let methods = options.parsed_methods()?;
        info!(
            "Registering {} ({}) for {:?}",
            model.name, model.table_name, options.methods
        );

        self.manager.create_api(model, options)?;
        build_definition(&mut self.document, source, model, &options.exclude_columns)?;
        build_paths(&mut self.document, source, model, options)?;

        if let Some(scaffold) = &self.scaffold {
            if methods.contains(&HttpMethod::Get) {
                log_scaffold("GET", model, scaffold.generate_get_test(source, model));
            }
            if methods.contains(&HttpMethod::Post) {
                log_scaffold("POST", model, scaffold.generate_post_test(source, model));
            }
        }

        Ok(())
    }

    /// Consumes the manager and returns the finished document.
    pub fn finalize(self) -> SwaggerDocument {
        let dangling = self.document.dangling_refs();
        if !dangling.is_empty() {
            warn!("Document has unresolved references: {:?}", dangling);
        }
        self.document
    }
}

fn log_scaffold(method: &str, model: &ModelDescriptor, outcome: Result<bool>) {
    match outcome {
        Ok(true) => {}
        Ok(false) => debug!("No rows in {}, skipping {} test", model.table_name, method),
        Err(e) => warn!("Skipping {} test for {}: {}", method, model.table_name, e),
    }
}
