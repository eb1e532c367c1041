//! Column type to Swagger primitive mapping.
//!
//! Database column types are rendered as strings such as `INTEGER` or
//! `VARCHAR(255)`. This module maps the base name (type parameters stripped)
//! onto the Swagger 2.0 `{type, format}` pair. A type name missing from the
//! table is not an error: callers treat it as "not a scalar column" and fall
//! back to relationship resolution.

use log::debug;

/// A Swagger primitive `type` and `format` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFormat {
    /// Swagger primitive type (`integer`, `number`, `string`, `boolean`)
    pub schema_type: &'static str,
    /// Swagger format qualifier
    pub format: &'static str,
}

const fn tf(schema_type: &'static str, format: &'static str) -> TypeFormat {
    TypeFormat {
        schema_type,
        format,
    }
}

/// Fixed mapping from database type names to Swagger type/format pairs.
///
/// Lookup is case-sensitive; `geometry` is spelled the way spatial
/// extensions render it.
pub const TYPE_MAPPING: &[(&str, TypeFormat)] = &[
    ("INTEGER", tf("integer", "int32")),
    ("SMALLINT", tf("integer", "int32")),
    ("NUMERIC", tf("number", "float")),
    ("DECIMAL", tf("number", "float")),
    ("VARCHAR", tf("string", "string")),
    ("TEXT", tf("string", "string")),
    ("DATE", tf("string", "date")),
    ("BOOLEAN", tf("boolean", "bool")),
    ("BLOB", tf("string", "binary")),
    ("BYTEA", tf("string", "binary")),
    ("BINARY", tf("string", "binary")),
    ("VARBINARY", tf("string", "binary")),
    ("FLOAT", tf("number", "float")),
    ("REAL", tf("number", "double")),
    ("DATETIME", tf("string", "date-time")),
    ("BIGINT", tf("integer", "int64")),
    ("ENUM", tf("string", "string")),
    ("INTERVAL", tf("string", "date-time")),
    ("geometry", tf("string", "string")),
];

/// Strips type parameters from a rendered column type.
///
/// `"VARCHAR(255)"` becomes `"VARCHAR"`; names without parameters are
/// returned unchanged.
pub fn strip_type_params(raw: &str) -> &str {
    match raw.split_once('(') {
        Some((base, _)) => base.trim_end(),
        None => raw,
    }
}

/// Looks up a base type name in [`TYPE_MAPPING`].
pub fn map_type(name: &str) -> Option<TypeFormat> {
    TYPE_MAPPING
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, mapping)| *mapping)
}

/// Strips type parameters from `raw` and looks the result up.
pub fn map_column_type(raw: &str) -> Option<TypeFormat> {
    let base = strip_type_params(raw);
    let mapped = map_type(base);
    if mapped.is_none() {
        debug!("Column type {} has no scalar mapping", raw);
    }
    mapped
}
