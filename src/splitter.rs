//! Partitioning identifier lists into bounded-length request URLs.
//!
//! Identifiers are packed greedily, left to right, each as a repeated
//! `param=value` pair. Input order is preserved within and across URLs.

/// Base URL plus the name of the repeated identifier parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    base: String,
    param: String,
}

impl UrlTemplate {
    /// `base` may already carry a query string.
    pub fn new(base: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            param: param.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// The `?name=value` or `&name=value` piece appending `id` to `url`.
    fn piece(&self, url: &str, id: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}={}", sep, self.param, urlencoding::encode(id))
    }

    /// Identifiers carried by a URL built from this template, in order.
    pub fn identifiers(&self, url: &str) -> Vec<String> {
        let Some((_, query)) = url.split_once('?') else {
            return Vec::new();
        };
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .filter(|(name, _)| *name == self.param)
            .filter_map(|(_, value)| urlencoding::decode(value).ok())
            .map(|value| value.into_owned())
            .collect()
    }
}

/// Split `ids` over as few URLs as greedy packing allows, each at most
/// `max_url_length` bytes.
///
/// An identifier that does not fit even alone still gets a URL of its own.
/// No input is ever rejected. An empty list yields the bare base URL.
pub fn split<I, S>(ids: I, template: &UrlTemplate, max_url_length: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut urls = Vec::new();
    let mut current = template.base.clone();
    let mut packed = 0usize;

    for id in ids {
        let id = id.as_ref();
        let piece = template.piece(&current, id);

        if packed > 0 && current.len() + piece.len() > max_url_length {
            urls.push(std::mem::replace(&mut current, template.base.clone()));
            packed = 0;
            let piece = template.piece(&current, id);
            current.push_str(&piece);
        } else {
            current.push_str(&piece);
        }
        packed += 1;

        if packed == 1 && current.len() > max_url_length {
            tracing::warn!(
                "Identifier {:?} alone exceeds the URL limit ({} > {})",
                id,
                current.len(),
                max_url_length
            );
        }
    }

    if packed > 0 || urls.is_empty() {
        urls.push(current);
    }
    tracing::debug!("Split request into {} URL(s)", urls.len());
    urls
}
