use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown base layer preset: {0}")]
    UnknownBaseLayer(String),

    #[error("Map library not ready after {attempts} attempts")]
    LibraryNotReady { attempts: u32 },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
