//! Not-found handling for single and batch lookups.

use std::future::Future;

use serde_json::Value;

use crate::error::{LookupError, ProviderResult};

use super::record::{Record, RecordTemplate};

/// How a lookup ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Record),
    Stubbed(Record),
}

impl Resolution {
    pub fn is_stubbed(&self) -> bool {
        matches!(self, Resolution::Stubbed(_))
    }

    pub fn into_record(self) -> Record {
        match self {
            Resolution::Found(record) | Resolution::Stubbed(record) => record,
        }
    }
}

/// Settle one fetched lookup.
///
/// A not-found failure becomes a stub when `use_stub` is set and
/// [`LookupError::NotFound`] naming `id` otherwise. Other failures pass
/// through unchanged.
pub fn resolve(
    template: &RecordTemplate,
    id: &str,
    fetched: ProviderResult<Value>,
    use_stub: bool,
) -> ProviderResult<Resolution> {
    match fetched {
        Ok(value) => Ok(Resolution::Found(template.record(value))),
        Err(err) if err.is_not_found() => {
            if use_stub {
                tracing::warn!("No {} '{}', substituting a stub", template.kind(), id);
                Ok(Resolution::Stubbed(template.stub(id)))
            } else {
                Err(LookupError::NotFound { id: id.to_string() }.into())
            }
        }
        Err(err) => Err(err),
    }
}

/// Resolve `ids` in order, one fetch at a time.
///
/// The result has one record per identifier. Without stubs the first
/// failure aborts the batch.
pub async fn resolve_all<I, S, F, Fut>(
    template: &RecordTemplate,
    ids: I,
    use_stub: bool,
    fetch: F,
) -> ProviderResult<Vec<Record>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = ProviderResult<Value>>,
{
    let mut records = Vec::new();
    for id in ids {
        let id = id.as_ref();
        let fetched = fetch(id.to_string()).await;
        records.push(resolve(template, id, fetched, use_stub)?.into_record());
    }
    Ok(records)
}
