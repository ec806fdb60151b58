use dspec::SpecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToqinError {
    /// A referenced document could not be read or parsed.
    #[error("{}", resolution_message(reference, parent.as_deref(), source))]
    Resolution {
        reference: String,
        parent: Option<String>,
        #[source]
        source: Box<ToqinError>,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("No document is loaded for {0}")]
    UnknownDocument(String),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

fn resolution_message(reference: &str, parent: Option<&str>, source: &ToqinError) -> String {
    match parent {
        Some(parent) => format!("Can not load \"{reference}\" referenced by {parent}: {source}"),
        None => format!("Can not load \"{reference}\": {source}"),
    }
}

impl ToqinError {
    pub fn resolution(reference: &str, parent: Option<&str>, source: ToqinError) -> Self {
        ToqinError::Resolution {
            reference: reference.to_string(),
            parent: parent.map(str::to_string),
            source: Box::new(source),
        }
    }
}

// Create a type alias for convenience
pub type Result<T> = std::result::Result<T, ToqinError>;
