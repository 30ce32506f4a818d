use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid {entity} record {id}: {reason}")]
    InvalidRecord {
        entity: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Unknown ore type '{0}'")]
    UnknownOre(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Subsystem '{name}' failed: {source}")]
    Subsystem {
        name: &'static str,
        #[source]
        source: Box<SimError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
