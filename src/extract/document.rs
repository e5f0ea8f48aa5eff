use scraper::Html;

/// A fetched page whose body decoded as text
///
/// The body is kept as a string and parsed on demand, so a document can be
/// moved between worker tasks freely; the parsed tree stays local to the
/// synchronous extraction that walks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    body: String,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Final URL the body was read from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parses the body into a traversable HTML tree
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}
