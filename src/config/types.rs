use serde::Deserialize;

/// Main configuration structure for Reel-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub labels: LabelConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site root every listing and detail URL is built from
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing category segment, as in `{base}/{category}/page-{n}.html`
    pub category: String,

    /// Number of listing pages to crawl when `--pages` is not given
    #[serde(rename = "total-pages")]
    pub total_pages: u32,

    /// Number of concurrent workers when `--workers` is not given
    pub workers: u32,

    /// Items per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Extra attempts the fetcher makes after a failed GET
    #[serde(rename = "fetch-retries", default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Attempts to populate a listing page before its tasks give up
    #[serde(rename = "resolve-attempts", default = "default_resolve_attempts")]
    pub resolve_attempts: u32,

    /// Initial delay between listing population attempts (milliseconds, doubled each time)
    #[serde(rename = "resolve-backoff-ms", default = "default_resolve_backoff_ms")]
    pub resolve_backoff_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_page_size() -> u32 {
    30
}

fn default_fetch_retries() -> u32 {
    3
}

fn default_resolve_attempts() -> u32 {
    5
}

fn default_resolve_backoff_ms() -> u64 {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// CSS selectors locating records in listing and detail markup
///
/// Every selector has a default matching the reference catalogue layout, so the
/// `[selectors]` table only needs the keys a different site layout changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    pub listing_item: String,
    pub listing_link: String,
    pub title: String,
    pub original_title: String,
    pub status: String,
    pub poster: String,
    pub content: String,
    pub meta: String,
    pub meta_label: String,
    pub meta_value: String,
    pub director: String,
    pub country: String,
    pub category: String,
    pub keyword: String,
    pub actor: String,
    pub actor_image: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_item: ".list-movie > .movie-item".to_string(),
            listing_link: ".block-wrapper".to_string(),
            title: "a.title-1".to_string(),
            original_title: ".title-2".to_string(),
            status: ".status".to_string(),
            poster: ".movie-l-img img".to_string(),
            content: "#film-content".to_string(),
            meta: ".movie-meta-info .movie-dl".to_string(),
            meta_label: ".movie-dt".to_string(),
            meta_value: ".movie-dd".to_string(),
            director: ".dd-director .director".to_string(),
            country: ".dd-country .country".to_string(),
            category: ".dd-cat .category".to_string(),
            keyword: ".tag-list .tag-item".to_string(),
            actor: "#list_actor_carousel .actor-profile-item".to_string(),
            actor_image: ".actor-image".to_string(),
        }
    }
}

/// Label texts naming the scalar fields in the detail page's label/value list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LabelConfig {
    pub views: String,
    pub year: String,
    pub imdb: String,
    pub aw: String,
    pub release_date: String,
    pub duration: String,
    pub quality: String,
    pub resolution: String,
    pub language: String,
    pub production_company: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            views: "Lượt xem:".to_string(),
            year: "Năm:".to_string(),
            imdb: "Điểm IMDb:".to_string(),
            aw: "Điểm AW:".to_string(),
            release_date: "Ngày ra rạp:".to_string(),
            duration: "Thời lượng:".to_string(),
            quality: "Chất lượng:".to_string(),
            resolution: "Độ phân giải:".to_string(),
            language: "Ngôn ngữ:".to_string(),
            production_company: "Công ty SX:".to_string(),
        }
    }
}

impl LabelConfig {
    /// All configured labels, for validation
    pub fn all(&self) -> [&str; 10] {
        [
            &self.views,
            &self.year,
            &self.imdb,
            &self.aw,
            &self.release_date,
            &self.duration,
            &self.quality,
            &self.resolution,
            &self.language,
            &self.production_company,
        ]
    }
}
