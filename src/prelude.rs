//! Prelude module for convenient imports.
//!
//! ```ignore
//! use provider_stream::prelude::*;
//! ```

pub use crate::commands::{CompositeId, LookupQuery, ProviderClient, StreamQuery};
pub use crate::config::StreamConfig;
pub use crate::data::{Data, MetaValue};
pub use crate::error::{ProviderError, ProviderResult, ResultExt};
pub use crate::stream::ErrorLog;
pub use crate::stub::{Field, Record, RecordKind, RecordTemplate};
