use crate::extract::{Document, SelectorSet};

/// Extracts the detail link of every item on a listing page, in document order
///
/// Each listing item keeps its slot even when it has no usable link, so slot
/// `i` always corresponds to the `i`-th item on the page. Items whose link
/// element or `href` attribute is missing, or whose `href` is blank, yield `None`.
pub fn extract_listing_hrefs(document: &Document, selectors: &SelectorSet) -> Vec<Option<String>> {
    document
        .html()
        .select(&selectors.listing_item)
        .map(|item| {
            item.select(&selectors.listing_link)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(|href| href.trim().to_string())
                .filter(|href| !href.is_empty())
        })
        .collect()
}
