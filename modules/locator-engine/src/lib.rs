//! Location finder engine: filter state, the filter pipeline, URL sync, the
//! search workflow and the coordinator that drives a map provider and the
//! companion list from them.

pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod readiness;
pub mod registry;
pub mod search;
pub mod state;
pub mod url_sync;
pub mod view;

pub use coordinator::{FinderEvent, PendingSearch, RenderCoordinator, SearchOutcome};
pub use error::{FinderError, Result};
pub use pipeline::{apply_filters, FilterResult, VisibleLocation};
pub use readiness::{wait_for_library, ReadyPolicy};
pub use registry::{PageData, Registry};
pub use search::{SearchPhase, SearchState};
pub use state::{Dimension, FilterChange, FilterStore, Filters, TagEntry, TagMeta};
pub use url_sync::UrlState;
pub use view::{AmenityControl, FinderView, MemoryView, NO_RESULTS_MESSAGE};
