use std::fmt;

/// Error types shared by the migration, billing and smoke-test tooling.
#[derive(Debug)]
pub enum OpsError {
    /// Database-related errors (connection, constraint violation, bad DDL).
    Database(sqlx::Error),
    /// Missing or malformed configuration.
    Config(String),
    /// A table the procedure depends on does not exist.
    MissingTable(String),
    /// A row the operator asked for does not exist.
    NotFound(String),
    /// A catalog-derived name that is not a plain SQL identifier.
    UnsafeIdentifier(String),
    /// Stripe rejected the API key.
    StripeAuth(String),
    /// Stripe rejected the request itself (unknown id, bad parameter).
    StripeInvalidRequest(String),
    /// Any other failure talking to an external API.
    ExternalApi(String),
    /// Transport-level HTTP failure (connection refused, timeout).
    Http(String),
    /// Reading or writing a local file failed.
    Io(std::io::Error),
    /// A data file is not the CSV shape the importer expects.
    Csv(csv::Error),
    /// A post-condition check did not hold.
    Verification(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<OpsError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for OpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpsError::Database(e) => write!(f, "Database error: {}", e),
            OpsError::Config(msg) => write!(f, "Configuration error: {}", msg),
            OpsError::MissingTable(table) => write!(f, "Table '{}' does not exist", table),
            OpsError::NotFound(msg) => write!(f, "Not found: {}", msg),
            OpsError::UnsafeIdentifier(name) => {
                write!(f, "Refusing to use unsafe SQL identifier: {:?}", name)
            }
            OpsError::StripeAuth(msg) => write!(f, "Stripe authentication failed: {}", msg),
            OpsError::StripeInvalidRequest(msg) => write!(f, "Stripe invalid request: {}", msg),
            OpsError::ExternalApi(msg) => write!(f, "External API error: {}", msg),
            OpsError::Http(msg) => write!(f, "HTTP error: {}", msg),
            OpsError::Io(e) => write!(f, "I/O error: {}", e),
            OpsError::Csv(e) => write!(f, "CSV error: {}", e),
            OpsError::Verification(msg) => write!(f, "Verification failed: {}", msg),
            OpsError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for OpsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OpsError::Database(e) => Some(e),
            OpsError::Io(e) => Some(e),
            OpsError::Csv(e) => Some(e),
            OpsError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl OpsError {
    /// Strips context wrappers and returns the innermost error.
    pub fn root(&self) -> &OpsError {
        match self {
            OpsError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the root cause is a rejected Stripe API key.
    pub fn is_stripe_auth(&self) -> bool {
        matches!(self.root(), OpsError::StripeAuth(_))
    }
}

impl From<sqlx::Error> for OpsError {
    fn from(err: sqlx::Error) -> Self {
        OpsError::Database(err)
    }
}

impl From<reqwest::Error> for OpsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            OpsError::Http(err.to_string())
        } else {
            OpsError::ExternalApi(err.to_string())
        }
    }
}

impl From<std::io::Error> for OpsError {
    fn from(err: std::io::Error) -> Self {
        OpsError::Io(err)
    }
}

impl From<csv::Error> for OpsError {
    fn from(err: csv::Error) -> Self {
        OpsError::Csv(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `OpsError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, OpsError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, OpsError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, OpsError> {
    fn context(self, context: impl Into<String>) -> Result<T, OpsError> {
        self.map_err(|e| OpsError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, OpsError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| OpsError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, OpsError> {
        self.map_err(|e| OpsError::WithContext {
            source: Box::new(OpsError::Database(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, OpsError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| OpsError::WithContext {
            source: Box::new(OpsError::Database(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_and_displays_chain() {
        let err: Result<(), OpsError> = Err(OpsError::MissingTable("disputes".into()));
        let wrapped = err.context("fixing dispute schema").unwrap_err();
        assert_eq!(
            wrapped.to_string(),
            "fixing dispute schema: Table 'disputes' does not exist"
        );
        assert!(matches!(wrapped.root(), OpsError::MissingTable(_)));
    }

    #[test]
    fn stripe_auth_detected_through_context() {
        let err: Result<(), OpsError> = Err(OpsError::StripeAuth("Invalid API Key".into()));
        let wrapped = err.with_context(|| "retrieving product".to_string()).unwrap_err();
        assert!(wrapped.is_stripe_auth());
        assert!(!OpsError::Http("refused".into()).is_stripe_auth());
    }
}
