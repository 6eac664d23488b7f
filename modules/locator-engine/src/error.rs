use locator_common::LocatorError;
use locator_map::MapError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FinderError>;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),
}
