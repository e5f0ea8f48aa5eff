//! Detail-page record extraction
//!
//! Extraction never fails: whatever the page does not provide stays empty or
//! zero, and malformed related-entity entries are skipped one by one.

use crate::config::LabelConfig;
use crate::extract::lookup::{element_text, lookup_elements};
use crate::extract::{Document, SelectorSet};
use crate::model::{Category, Country, Keyword, Person, Record};
use crate::url::country_code;
use scraper::{ElementRef, Html, Selector};

/// Extracts a structurally complete [`Record`] from a detail page
///
/// # Field Sources
///
/// | Field | Source |
/// |-------|--------|
/// | title, original title | first match of their selectors, whole document |
/// | status | first match inside the metadata block |
/// | poster | `src` of the poster image |
/// | content | inner HTML of the description block |
/// | duration, quality, year, scores, ... | label/value lookup in the metadata block |
/// | directors, countries, categories, keywords | repeated entries inside the metadata block |
/// | actors | repeated entries, whole document |
///
/// # Arguments
///
/// * `document` - The fetched detail page; its URL becomes the record key
/// * `selectors` - Compiled selectors
/// * `labels` - Label texts of the scalar fields
pub fn extract_record(document: &Document, selectors: &SelectorSet, labels: &LabelConfig) -> Record {
    let html = document.html();
    let meta: Vec<ElementRef<'_>> = html.select(&selectors.meta).collect();

    let dt = select_within(&meta, &selectors.meta_label);
    let dd = select_within(&meta, &selectors.meta_value);
    let field = |label: &str| lookup_elements(&dt, &dd, label);

    Record {
        url: document.url().to_string(),
        title: first_text(&html, &selectors.title),
        original_title: first_text(&html, &selectors.original_title),
        status: select_within(&meta, &selectors.status)
            .first()
            .map(element_text)
            .unwrap_or_default(),
        poster: html
            .select(&selectors.poster)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.trim().to_string())
            .unwrap_or_default(),
        content: html
            .select(&selectors.content)
            .next()
            .map(|block| block.inner_html().trim().to_string())
            .unwrap_or_default(),
        duration: field(&labels.duration),
        quality: field(&labels.quality),
        resolution: field(&labels.resolution),
        language: field(&labels.language),
        production_company: field(&labels.production_company),
        release_date: field(&labels.release_date),
        year: parse_year(&field(&labels.year)),
        views: parse_count(&field(&labels.views)),
        imdb_score: parse_score(&field(&labels.imdb)),
        aw_score: parse_score(&field(&labels.aw)),
        directors: linked_entries(&select_within(&meta, &selectors.director))
            .map(|(href, name)| Person {
                href,
                name,
                image: None,
            })
            .collect(),
        actors: extract_actors(&html, selectors),
        categories: linked_entries(&select_within(&meta, &selectors.category))
            .map(|(href, name)| Category { href, name })
            .collect(),
        countries: linked_entries(&select_within(&meta, &selectors.country))
            .map(|(href, name)| Country {
                code: country_code(&href),
                href,
                name,
            })
            .collect(),
        keywords: select_within(&meta, &selectors.keyword)
            .iter()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .map(|text| Keyword { text })
            .collect(),
    }
}

fn extract_actors(html: &Html, selectors: &SelectorSet) -> Vec<Person> {
    html.select(&selectors.actor)
        .filter_map(|actor| {
            let href = actor.value().attr("href")?.trim().to_string();
            if href.is_empty() {
                return None;
            }
            let image = actor
                .select(&selectors.actor_image)
                .next()
                .and_then(|img| img.value().attr("style"))
                .and_then(background_image_url);

            Some(Person {
                href,
                name: element_text(&actor),
                image,
            })
        })
        .collect()
}

/// Collects all matches of `selector` below any of the scope elements
fn select_within<'a>(scopes: &[ElementRef<'a>], selector: &Selector) -> Vec<ElementRef<'a>> {
    scopes
        .iter()
        .flat_map(|scope| scope.select(selector))
        .collect()
}

fn first_text(html: &Html, selector: &Selector) -> String {
    html.select(selector)
        .next()
        .map(|element| element_text(&element))
        .unwrap_or_default()
}

/// Yields `(href, text)` for entries carrying a non-empty `href`; others are skipped
fn linked_entries<'a>(
    elements: &'a [ElementRef<'a>],
) -> impl Iterator<Item = (String, String)> + 'a {
    elements.iter().filter_map(|element| {
        let href = element.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        Some((href.to_string(), element_text(element)))
    })
}

/// Pulls the URL out of an inline `background-image: url('...')` style
///
/// # Examples
///
/// ```
/// use reel_harvest::extract::background_image_url;
///
/// assert_eq!(
///     background_image_url("background-image:url('http://img.example.com/a.jpg')"),
///     Some("http://img.example.com/a.jpg".to_string())
/// );
/// assert_eq!(background_image_url("color: red"), None);
/// ```
pub fn background_image_url(style: &str) -> Option<String> {
    let start = style.find("url(")? + "url(".len();
    let rest = &style[start..];
    let end = rest.find(')')?;

    let url = rest[..end].trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// Parses a view counter such as `1,234,567`; anything unparseable is 0
pub fn parse_count(text: &str) -> f64 {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}'))
        .collect();
    digits
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Parses a score such as `7.5` or `7,5`; anything unparseable is 0
pub fn parse_score(text: &str) -> f64 {
    let score = text.trim().replace(',', ".");
    score
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Parses a release year; anything unparseable is 0
pub fn parse_year(text: &str) -> i32 {
    text.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    const DETAIL_PAGE: &str = r##"<html><body>
        <div class="movie-l-img"><img src="http://img.example.com/poster.jpg"></div>
        <a class="title-1" href="#">Ký Sinh Trùng</a>
        <span class="title-2">Parasite (2019)</span>
        <div class="movie-meta-info">
          <dl class="movie-dl">
            <dt class="movie-dt">Trạng thái:</dt><dd class="movie-dd status">Full HD</dd>
            <dt class="movie-dt">Đạo diễn:</dt>
            <dd class="movie-dd dd-director">
              <a class="director" href="dao-dien/bong-joon-ho/">Bong Joon Ho</a>
              <a class="director">Không có link</a>
            </dd>
            <dt class="movie-dt">Quốc gia:</dt>
            <dd class="movie-dd dd-country"><a class="country" href="quoc-gia/han-quoc/">Hàn Quốc</a></dd>
            <dt class="movie-dt">Năm:</dt><dd class="movie-dd">2019</dd>
            <dt class="movie-dt">Ngày ra rạp:</dt><dd class="movie-dd">30/05/2019</dd>
            <dt class="movie-dt">Thời lượng:</dt><dd class="movie-dd">132 phút</dd>
            <dt class="movie-dt">Chất lượng:</dt><dd class="movie-dd">Bản đẹp</dd>
            <dt class="movie-dt">Độ phân giải:</dt><dd class="movie-dd">Full HD 1080p</dd>
            <dt class="movie-dt">Ngôn ngữ:</dt><dd class="movie-dd">Phụ đề Việt</dd>
            <dt class="movie-dt">Thể loại:</dt>
            <dd class="movie-dd dd-cat">
              <a class="category" href="the-loai/phim-hai/">Phim hài</a>
              <a class="category" href="the-loai/phim-tam-ly/">Phim tâm lý</a>
            </dd>
            <dt class="movie-dt">Công ty SX:</dt><dd class="movie-dd">Barunson E&amp;A</dd>
            <dt class="movie-dt">Lượt xem:</dt><dd class="movie-dd">1,234,567</dd>
            <dt class="movie-dt">Điểm IMDb:</dt><dd class="movie-dd">8.6</dd>
            <dt class="movie-dt">Điểm AW:</dt><dd class="movie-dd">không rõ</dd>
          </dl>
          <div class="movie-dl"><ul class="tag-list">
            <li class="tag-item">parasite</li>
            <li class="tag-item"> </li>
            <li class="tag-item">ky sinh trung</li>
          </ul></div>
        </div>
        <div id="film-content"><p>Gia đình Ki-taek <b>thất nghiệp</b>.</p></div>
        <div id="list_actor_carousel">
          <a class="actor-profile-item" href="dien-vien/song-kang-ho/">
            <div class="actor-image" style="background-image:url('http://img.example.com/skh.jpg')"></div>
            <span>Song Kang Ho</span>
          </a>
          <a class="actor-profile-item" href="dien-vien/cho-yeo-jeong/">
            <span>Cho Yeo Jeong</span>
          </a>
          <div class="actor-profile-item"><span>Không có link</span></div>
        </div>
    </body></html>"##;

    fn extract(body: &str) -> Record {
        let selectors = SelectorSet::compile(&SelectorConfig::default()).unwrap();
        let doc = Document::new("http://catalogue.example.com/phim/ky-sinh-trung/", body);
        extract_record(&doc, &selectors, &LabelConfig::default())
    }

    #[test]
    fn test_scalar_fields() {
        let record = extract(DETAIL_PAGE);

        assert_eq!(record.url, "http://catalogue.example.com/phim/ky-sinh-trung/");
        assert_eq!(record.title, "Ký Sinh Trùng");
        assert_eq!(record.original_title, "Parasite (2019)");
        assert_eq!(record.status, "Full HD");
        assert_eq!(record.poster, "http://img.example.com/poster.jpg");
        assert_eq!(record.year, 2019);
        assert_eq!(record.release_date, "30/05/2019");
        assert_eq!(record.duration, "132 phút");
        assert_eq!(record.quality, "Bản đẹp");
        assert_eq!(record.resolution, "Full HD 1080p");
        assert_eq!(record.language, "Phụ đề Việt");
        assert_eq!(record.production_company, "Barunson E&A");
        assert_eq!(record.views, 1_234_567.0);
        assert_eq!(record.imdb_score, 8.6);
        assert_eq!(record.aw_score, 0.0);
        assert!(record.content.contains("<b>thất nghiệp</b>"));
    }

    #[test]
    fn test_related_entities() {
        let record = extract(DETAIL_PAGE);

        assert_eq!(record.directors.len(), 1);
        assert_eq!(record.directors[0].href, "dao-dien/bong-joon-ho/");
        assert_eq!(record.directors[0].name, "Bong Joon Ho");

        assert_eq!(record.countries.len(), 1);
        assert_eq!(record.countries[0].code, "han-quoc");
        assert_eq!(record.countries[0].name, "Hàn Quốc");

        let categories: Vec<&str> = record.categories.iter().map(|c| c.href.as_str()).collect();
        assert_eq!(categories, vec!["the-loai/phim-hai/", "the-loai/phim-tam-ly/"]);

        let keywords: Vec<&str> = record.keywords.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(keywords, vec!["parasite", "ky sinh trung"]);
    }

    #[test]
    fn test_actors_skip_entries_without_href() {
        let record = extract(DETAIL_PAGE);

        assert_eq!(record.actors.len(), 2);
        assert_eq!(record.actors[0].name, "Song Kang Ho");
        assert_eq!(
            record.actors[0].image.as_deref(),
            Some("http://img.example.com/skh.jpg")
        );
        assert_eq!(record.actors[1].href, "dien-vien/cho-yeo-jeong/");
        assert_eq!(record.actors[1].image, None);
    }

    #[test]
    fn test_unrecognized_document_gives_empty_record() {
        let record = extract("<html><body><p>Maintenance</p></body></html>");

        assert_eq!(record, Record::new("http://catalogue.example.com/phim/ky-sinh-trung/"));
        assert!(record.is_blank());
    }

    #[test]
    fn test_empty_body() {
        let record = extract("");
        assert!(record.is_blank());
        assert!(record.keywords.is_empty());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_count("12,345"), 12345.0);
        assert_eq!(parse_count("12.345"), 12345.0);
        assert_eq!(parse_count("n/a"), 0.0);
        assert_eq!(parse_score("7,2"), 7.2);
        assert_eq!(parse_score(""), 0.0);
        assert_eq!(parse_score("NaN"), 0.0);
        assert_eq!(parse_year(" 2004 "), 2004);
        assert_eq!(parse_year("2004?"), 0);
    }

    #[test]
    fn test_background_image_url() {
        assert_eq!(
            background_image_url(r#"background-image: url("http://img.example.com/b.png");"#),
            Some("http://img.example.com/b.png".to_string())
        );
        assert_eq!(background_image_url("background-image:url('')"), None);
        assert_eq!(background_image_url("background-image:url(http://x/y.png"), None);
    }
}
