//! Stub substitution for identifiers the store cannot resolve.
//!
//! A lookup moves from *requested* to *found* or *not found*. A miss then
//! either fails with [`LookupError::NotFound`](crate::error::LookupError) or,
//! with stubs enabled, resolves to a [`Record`] whose layout matches a real
//! one and whose non-identifier fields are [`Field::Broken`].

mod record;
mod resolve;

pub use record::{Field, Record, RecordKind, RecordTemplate};
pub use resolve::{resolve, resolve_all, Resolution};
