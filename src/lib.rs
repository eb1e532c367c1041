//! restless-swagger - Swagger 2.0 documentation for auto-generated REST APIs.
//!
//! Given a set of model descriptors (tables, columns, relationships), this
//! library builds the Swagger document describing the CRUD endpoints an
//! auto-REST manager exposes for them, and writes integration-test stubs
//! for those endpoints.
//!
//! # Architecture
//!
//! 1. [`type_mapper`] - Maps database column types to Swagger type/format pairs
//! 2. [`model`] - Model descriptors and the [`model::ModelSource`] capability trait
//! 3. [`introspect`] - Collects inherited columns and resolves primary keys
//! 4. [`definitions`] - Builds schema definitions, following relationships
//! 5. [`paths`] - Builds collection and item path operations
//! 6. [`document`] - The accumulated Swagger document
//! 7. [`manager`] - Per-model registration driving all of the above
//! 8. [`scaffold`] - Integration-test stub generation
//! 9. [`manifest`] - Loads models and registrations from YAML or JSON
//! 10. [`serializer`] - Serializes the document to YAML or JSON
//! 11. [`server`] - Serves the document at `swagger.json`
//!
//! # Example Usage
//!
//! ```no_run
//! use restless_swagger::{
//!     manager::{DocumentationOnly, SwagApiManager},
//!     model::{ColumnDescriptor, ModelCatalog, ModelDescriptor},
//!     paths::ApiOptions,
//!     serializer::JsonOptions,
//! };
//!
//! let catalog: ModelCatalog = [ModelDescriptor::new("Widget", "widgets")
//!     .with_column(ColumnDescriptor::new("id", "INTEGER").primary_key())
//!     .with_column(ColumnDescriptor::new("name", "VARCHAR(64)"))]
//! .into_iter()
//! .collect();
//!
//! let mut manager = SwagApiManager::new(DocumentationOnly);
//! manager
//!     .register(&catalog, "Widget", &ApiOptions::with_methods(&["GET", "POST"]))
//!     .unwrap();
//!
//! let document = manager.finalize();
//! println!("{}", document.to_json(&JsonOptions::indented(2)).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod definitions;
pub mod document;
pub mod error;
pub mod introspect;
pub mod manager;
pub mod manifest;
pub mod model;
pub mod paths;
pub mod scaffold;
pub mod serializer;
pub mod server;
pub mod type_mapper;
