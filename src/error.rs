use std::fmt;

/// Form fields that can fail validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Title,
    Category,
    Description,
    Steps,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::Title => "title",
            FormField::Category => "category",
            FormField::Description => "description",
            FormField::Steps => "steps",
        };
        f.write_str(name)
    }
}

/// A caller-correctable problem with the submitted form. Produced before any write.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationError {
    pub field: FormField,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: FormField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures talking to the remote record store.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Store responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// All errors that can occur while composing or submitting a bug report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Both the remote write and the local fallback failed.
    #[error("Could not submit bug report ({transport}) and saving it locally failed: {local}")]
    Persistence {
        transport: TransportError,
        local: Box<ReportError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
