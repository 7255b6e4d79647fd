//! Query descriptions.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::LookupError;
use crate::splitter::UrlTemplate;
use crate::stub::RecordTemplate;

pub const START_TIMESTAMP: &str = "startTimestamp";
pub const END_TIMESTAMP: &str = "endTimestamp";

/// A `:`-separated identifier with a known number of fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    raw: String,
    parts: Vec<String>,
}

impl CompositeId {
    /// Split `id` and check it has exactly `expected` fields.
    pub fn parse(id: &str, expected: usize) -> Result<Self, LookupError> {
        let parts: Vec<String> = id.split(':').map(str::to_string).collect();
        if parts.len() != expected {
            return Err(LookupError::MalformedId {
                id: id.to_string(),
                expected,
                actual: parts.len(),
            });
        }
        Ok(Self {
            raw: id.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts.get(index).map(String::as_str)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A streaming endpoint call.
///
/// # Example
///
/// ```ignore
/// let query = StreamQuery::new("search/sse/events")
///     .param("bookId", "demo")
///     .start(start)
///     .ids("scope", ["s1", "s2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamQuery {
    path: String,
    params: Vec<(String, String)>,
    id_param: Option<String>,
    ids: Vec<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl StreamQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a fixed query parameter. Order is kept.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Identifiers sent as a repeated `name` parameter, split across URLs
    /// as needed.
    pub fn ids<I, S>(mut self, name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_param = Some(name.into());
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Like [`ids`](Self::ids), rejecting any identifier without exactly
    /// `fields` `:`-separated fields.
    pub fn composite_ids<I, S>(self, name: impl Into<String>, ids: I, fields: usize) -> Result<Self, LookupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        for id in &ids {
            CompositeId::parse(id, fields)?;
        }
        Ok(self.ids(name, ids))
    }

    pub fn start(mut self, at: DateTime<Utc>) -> Self {
        self.start = Some(at);
        self
    }

    pub fn end(mut self, at: DateTime<Utc>) -> Self {
        self.end = Some(at);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn identifiers(&self) -> &[String] {
        &self.ids
    }

    /// URL up to and including the fixed parameters.
    pub fn base_url(&self, root: &str) -> String {
        let mut url = format!("{}/{}", root.trim_end_matches('/'), self.path.trim_start_matches('/'));

        let mut pairs: Vec<(&str, String)> = self
            .params
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        if let Some(start) = self.start {
            pairs.push((START_TIMESTAMP, start.timestamp_millis().to_string()));
        }
        if let Some(end) = self.end {
            pairs.push((END_TIMESTAMP, end.timestamp_millis().to_string()));
        }

        for (i, (name, value)) in pairs.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(name));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Template for splitting identifiers, if the query has any.
    pub fn template(&self, root: &str) -> Option<UrlTemplate> {
        self.id_param
            .as_ref()
            .map(|param| UrlTemplate::new(self.base_url(root), param.clone()))
    }
}

/// A single-identifier endpoint, `{root}/{path}/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    path: String,
    template: RecordTemplate,
    id_fields: Option<usize>,
}

impl LookupQuery {
    pub fn new(path: impl Into<String>, template: RecordTemplate) -> Self {
        Self {
            path: path.into(),
            template,
            id_fields: None,
        }
    }

    pub fn event() -> Self {
        Self::new("event", RecordTemplate::event())
    }

    pub fn message() -> Self {
        Self::new("message", RecordTemplate::message())
    }

    /// Require identifiers to have exactly `fields` `:`-separated fields.
    pub fn with_id_fields(mut self, fields: usize) -> Self {
        self.id_fields = Some(fields);
        self
    }

    pub fn template(&self) -> &RecordTemplate {
        &self.template
    }

    /// Reject a malformed identifier before any request is made.
    pub fn validate(&self, id: &str) -> Result<(), LookupError> {
        match self.id_fields {
            Some(fields) => CompositeId::parse(id, fields).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn url(&self, root: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            root.trim_end_matches('/'),
            self.path.trim_matches('/'),
            urlencoding::encode(id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_composite_id() {
        let id = CompositeId::parse("book:scope:20240101", 3).unwrap();
        assert_eq!(id.part(1), Some("scope"));
        assert_eq!(id.to_string(), "book:scope:20240101");

        let err = CompositeId::parse("book:scope", 3).unwrap_err();
        assert_eq!(
            err,
            LookupError::MalformedId {
                id: "book:scope".to_string(),
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_base_url() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = StreamQuery::new("/search/sse/events")
            .param("bookId", "demo book")
            .start(start);

        assert_eq!(
            query.base_url("http://store:8080/"),
            "http://store:8080/search/sse/events?bookId=demo%20book&startTimestamp=1704067200000"
        );
        assert!(query.template("http://store").is_none());
    }

    #[test]
    fn test_template_carries_id_param() {
        let query = StreamQuery::new("search/sse/messages").ids("stream", ["a", "b"]);
        let template = query.template("http://s").unwrap();
        assert_eq!(template.base(), "http://s/search/sse/messages");
        assert_eq!(template.param(), "stream");
        assert_eq!(query.identifiers(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_composite_ids_rejected_at_construction() {
        let result = StreamQuery::new("p").composite_ids("id", ["a:b:c", "a:b"], 3);
        assert!(matches!(result, Err(LookupError::MalformedId { actual: 2, .. })));
    }

    #[test]
    fn test_lookup_url_and_validation() {
        let query = LookupQuery::event().with_id_fields(3);
        assert_eq!(query.url("http://s/", "b:s:1"), "http://s/event/b%3As%3A1");
        assert!(query.validate("b:s:1").is_ok());
        assert!(query.validate("b:s").is_err());
        assert!(LookupQuery::message().validate("anything").is_ok());
    }
}
