use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::Selector;

/// Compiled form of [`SelectorConfig`], built once and shared by all workers
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub listing_item: Selector,
    pub listing_link: Selector,
    pub title: Selector,
    pub original_title: Selector,
    pub status: Selector,
    pub poster: Selector,
    pub content: Selector,
    pub meta: Selector,
    pub meta_label: Selector,
    pub meta_value: Selector,
    pub director: Selector,
    pub country: Selector,
    pub category: Selector,
    pub keyword: Selector,
    pub actor: Selector,
    pub actor_image: Selector,
}

impl SelectorSet {
    /// Compiles every configured selector
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorSet)` - All selectors compiled
    /// * `Err(ConfigError::Validation)` - A selector string is not valid CSS
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            listing_item: compile("listing-item", &config.listing_item)?,
            listing_link: compile("listing-link", &config.listing_link)?,
            title: compile("title", &config.title)?,
            original_title: compile("original-title", &config.original_title)?,
            status: compile("status", &config.status)?,
            poster: compile("poster", &config.poster)?,
            content: compile("content", &config.content)?,
            meta: compile("meta", &config.meta)?,
            meta_label: compile("meta-label", &config.meta_label)?,
            meta_value: compile("meta-value", &config.meta_value)?,
            director: compile("director", &config.director)?,
            country: compile("country", &config.country)?,
            category: compile("category", &config.category)?,
            keyword: compile("keyword", &config.keyword)?,
            actor: compile("actor", &config.actor)?,
            actor_image: compile("actor-image", &config.actor_image)?,
        })
    }
}

fn compile(name: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| {
        ConfigError::Validation(format!("Invalid selector {} '{}': {:?}", name, css, e))
    })
}
