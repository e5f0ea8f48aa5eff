//! URL handling module for Reel-Harvest
//!
//! Builds listing-page URLs from the configured template, resolves the relative
//! detail links found on listing pages, and derives natural keys from entity links.

use url::Url;

/// Builds the URL of a 1-based listing page: `{base}/{category}/page-{n}.html`
///
/// # Examples
///
/// ```
/// use reel_harvest::url::listing_page_url;
///
/// let url = listing_page_url("http://catalogue.example.com/", "phim-le", 3).unwrap();
/// assert_eq!(url.as_str(), "http://catalogue.example.com/phim-le/page-3.html");
/// ```
pub fn listing_page_url(base: &str, category: &str, page: u32) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/{}/page-{}.html",
        base.trim_end_matches('/'),
        category.trim_matches('/'),
        page
    ))
}

/// Resolves a detail link taken from a listing page against the site root
///
/// Absolute links are kept as they are; relative ones become `{base}/{href}`.
/// The result is the record's canonical URL, so the same href always yields the
/// same string.
pub fn detail_url(base: &str, href: &str) -> Result<Url, url::ParseError> {
    let href = href.trim();

    match Url::parse(href) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!(
            "{}/{}",
            base.trim_end_matches('/'),
            href.trim_start_matches('/')
        )),
        Err(e) => Err(e),
    }
}

/// Derives a country code from a country link such as `quoc-gia/my/`
///
/// The code is the path segment following the section segment. Links with a
/// single segment use that segment; empty links give an empty code.
pub fn country_code(href: &str) -> String {
    let path = match Url::parse(href) {
        Ok(absolute) => absolute.path().to_string(),
        Err(_) => href.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [_, code, ..] => code.to_string(),
    }
}
