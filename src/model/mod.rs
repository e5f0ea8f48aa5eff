//! Record types produced by extraction and consumed by storage
//!
//! A [`Record`] is the full result of one detail page. Related entities are
//! identified by natural keys and shared between records.

/// A person credited on a record, either as director or actor
///
/// Keyed by `href`, the person's reference path on the site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub href: String,
    pub name: String,
    /// Portrait URL, only known for actors
    pub image: Option<String>,
}

/// A category (genre) a record is filed under, keyed by `href`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub href: String,
    pub name: String,
}

/// A production country, keyed by `code`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub href: String,
    pub name: String,
}

/// A free-text tag, keyed by its text
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Keyword {
    pub text: String,
}

/// Structured record extracted from one detail page
///
/// Every field is always present; missing data is represented by empty strings,
/// zero numbers, and empty lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Canonical URL of the detail page; the record's unique key
    pub url: String,

    pub title: String,
    pub original_title: String,
    pub duration: String,
    pub quality: String,
    pub resolution: String,
    pub language: String,
    pub production_company: String,
    pub release_date: String,
    pub status: String,
    pub poster: String,

    /// Inner HTML of the description block
    pub content: String,

    pub year: i32,
    pub views: f64,
    pub imdb_score: f64,
    pub aw_score: f64,

    pub directors: Vec<Person>,
    pub actors: Vec<Person>,
    pub categories: Vec<Category>,
    pub countries: Vec<Country>,
    pub keywords: Vec<Keyword>,
}

impl Record {
    /// Creates an empty record for the given canonical URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns true if extraction found neither a title nor any label/value field
    ///
    /// Such a record usually means the page layout did not match the selectors.
    pub fn is_blank(&self) -> bool {
        self.title.is_empty()
            && self.original_title.is_empty()
            && self.duration.is_empty()
            && self.release_date.is_empty()
            && self.year == 0
    }
}
