//! Record extraction from listing and detail markup
//!
//! This module turns fetched documents into data:
//! - Detail-link discovery on listing pages
//! - The label/value lookup primitive used for every scalar field
//! - Full record extraction from a detail page

mod document;
mod listing;
mod lookup;
mod record;
mod selectors;

pub use document::Document;
pub use listing::extract_listing_hrefs;
pub use lookup::{lookup, lookup_elements};
pub use record::{background_image_url, extract_record, parse_count, parse_score, parse_year};
pub use selectors::SelectorSet;
