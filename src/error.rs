use std::path::PathBuf;

use thiserror::Error;

/// Failures of the history store and its storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored value for a plant could not be read back as a history.
    #[error("corrupt history under key '{key}': {reason}")]
    CorruptHistory { key: String, reason: String },

    /// The file backing the store is not a valid key/value document.
    #[error("corrupt store file {}: {source}", .path.display())]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no history for plant '{0}'")]
    NotFound(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced to whoever drives an analysis (the CLI).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Required input missing or unusable; nothing was generated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackerError {
    /// Whether the request was refused before any work was attempted.
    pub fn is_input_error(&self) -> bool {
        matches!(self, TrackerError::InvalidInput(_))
    }

    /// Message shown to the user. Input problems and unknown plants are
    /// explained; everything else gets the same retry prompt.
    pub fn user_message(&self) -> String {
        match self {
            TrackerError::InvalidInput(reason) => reason.clone(),
            TrackerError::Store(StoreError::NotFound(plant_id)) => {
                format!("No se encontró planta con ID {}", plant_id)
            }
            TrackerError::ImageRead { .. } | TrackerError::Store(_) => {
                "No se pudo analizar la imagen. Intenta de nuevo.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_keep_their_reason() {
        let err = TrackerError::InvalidInput("Falta el ID de la planta".into());
        assert!(err.is_input_error());
        assert_eq!(err.user_message(), "Falta el ID de la planta");
    }

    #[test]
    fn runtime_failures_share_retry_prompt() {
        let corrupt = TrackerError::from(StoreError::CorruptHistory {
            key: "plant_p1".into(),
            reason: "EOF".into(),
        });
        let io = TrackerError::ImageRead {
            path: "foto.jpg".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!corrupt.is_input_error());
        assert_eq!(corrupt.user_message(), io.user_message());
        assert!(corrupt.to_string().contains("plant_p1"));
    }

    #[test]
    fn unknown_plant_is_named() {
        let err = TrackerError::from(StoreError::NotFound("p9".into()));
        assert!(!err.is_input_error());
        assert_eq!(err.user_message(), "No se encontró planta con ID p9");
    }

    #[test]
    fn storage_failures_outside_analysis_share_retry_prompt() {
        let io = TrackerError::from(StoreError::io(
            "arbolitos.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        ));
        assert_eq!(io.user_message(), "No se pudo analizar la imagen. Intenta de nuevo.");
    }
}
