//! Side metadata attached to a [`Data`](super::Data) collection.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::stream::ErrorLog;

/// Key under which a streaming command records the URLs it requested.
pub const META_URLS: &str = "urls";

/// Key under which interactive-mode stream errors are exposed.
pub const META_ERRORS: &str = "errors";

/// One metadata entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Json(Value),
    Urls(Vec<String>),
    Errors(ErrorLog),
}

impl MetaValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MetaValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_urls(&self) -> Option<&[String]> {
        match self {
            MetaValue::Urls(urls) => Some(urls),
            _ => None,
        }
    }

    pub fn as_errors(&self) -> Option<&ErrorLog> {
        match self {
            MetaValue::Errors(log) => Some(log),
            _ => None,
        }
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        MetaValue::Json(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(urls: Vec<String>) -> Self {
        MetaValue::Urls(urls)
    }
}

impl From<ErrorLog> for MetaValue {
    fn from(log: ErrorLog) -> Self {
        MetaValue::Errors(log)
    }
}

/// Ordered so `Debug` output is stable.
pub type Metadata = BTreeMap<String, MetaValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let urls = MetaValue::from(vec!["http://a".to_string()]);
        assert_eq!(urls.as_urls(), Some(&["http://a".to_string()][..]));
        assert!(urls.as_json().is_none());

        let status = MetaValue::from(json!({"status": "done"}));
        assert_eq!(status.as_json(), Some(&json!({"status": "done"})));

        let log = ErrorLog::new();
        let errors = MetaValue::from(log.clone());
        log.push(json!("late"));
        assert_eq!(errors.as_errors().map(ErrorLog::len), Some(1));
    }
}
