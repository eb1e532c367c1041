use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ManifestError { file: PathBuf, message: String },
    UnknownModel(String),
    InheritanceCycle(String),
    NoPrimaryKey(String),
    UnsupportedPrimaryKey { model: String, column: String },
    UnresolvedColumn { model: String, column: String },
    InvalidMethod(String),
    InvalidUrl(String),
    SerializationError(String),
    TemplateError(String),
    SampleError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ManifestError { file, message } => {
                write!(f, "invalid model manifest {}: {}", file.display(), message)
            }
            Error::UnknownModel(name) => write!(f, "unknown model: {}", name),
            Error::InheritanceCycle(name) => {
                write!(f, "inheritance cycle detected at model: {}", name)
            }
            Error::NoPrimaryKey(name) => write!(f, "model {} has no primary key", name),
            Error::UnsupportedPrimaryKey { model, column } => write!(
                f,
                "primary key {}.{} is not a scalar column",
                model, column
            ),
            Error::UnresolvedColumn { model, column } => write!(
                f,
                "column {}.{} has no known type and no related model",
                model, column
            ),
            Error::InvalidMethod(method) => write!(f, "unsupported HTTP method: {}", method),
            Error::InvalidUrl(msg) => write!(f, "invalid URL: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            Error::TemplateError(msg) => write!(f, "template error: {}", msg),
            Error::SampleError(msg) => write!(f, "sample error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::TemplateError(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
