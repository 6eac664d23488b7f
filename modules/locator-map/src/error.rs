use locator_common::LocationId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has not been initialized")]
    NotInitialized,

    #[error("no marker placed for location {0}")]
    UnknownMarker(LocationId),

    #[error("{0} is not supported by this map provider")]
    Unsupported(&'static str),
}
