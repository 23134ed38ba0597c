use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal resolution error.
///
/// Every variant names what the operator has to fix: the service and
/// endpoint for validation failures, the type for lookup failures, the file
/// for I/O and parse failures.
#[derive(Debug)]
pub enum ResolveError {
    /// Malformed or contradictory annotations or signatures
    Validation {
        /// Service identifier, or the interface name before one is known
        service: String,
        /// Endpoint name, when the failure is endpoint-specific
        endpoint: Option<String>,
        message: String,
    },
    /// A referenced record type could not be located
    NotFound {
        type_name: String,
        reason: String,
    },
    /// A file or directory could not be read
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// A source unit could not be deserialized
    Parse {
        path: PathBuf,
        message: String,
    },
    /// An endpoint failed to resolve
    Endpoint {
        interface: String,
        method: String,
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    pub fn validation(service: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::Validation {
            service: service.into(),
            endpoint: None,
            message: message.into(),
        }
    }

    pub fn endpoint_validation(
        service: impl Into<String>,
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolveError::Validation {
            service: service.into(),
            endpoint: Some(endpoint.into()),
            message: message.into(),
        }
    }

    pub fn not_found(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ResolveError::NotFound {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error, or the error it wraps, is a validation failure.
    pub fn is_validation(&self) -> bool {
        match self {
            ResolveError::Validation { .. } => true,
            ResolveError::Endpoint { source, .. } => source.is_validation(),
            _ => false,
        }
    }

    /// Whether this error, or the error it wraps, is a failed type lookup.
    pub fn is_not_found(&self) -> bool {
        match self {
            ResolveError::NotFound { .. } => true,
            ResolveError::Endpoint { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Validation {
                service,
                endpoint: Some(endpoint),
                message,
            } => write!(f, "service '{service}', endpoint '{endpoint}': {message}"),
            ResolveError::Validation {
                service,
                endpoint: None,
                message,
            } => write!(f, "service '{service}': {message}"),
            ResolveError::NotFound { type_name, reason } => {
                write!(f, "could not find record type '{type_name}': {reason}")
            }
            ResolveError::Io { path, source } => {
                write!(f, "failed to read '{}': {source}", path.display())
            }
            ResolveError::Parse { path, message } => {
                write!(f, "failed to parse source unit '{}': {message}", path.display())
            }
            ResolveError::Endpoint {
                interface,
                method,
                source,
            } => write!(f, "{interface}.{method}: {source}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io { source, .. } => Some(source),
            ResolveError::Endpoint { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
