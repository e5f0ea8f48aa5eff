//! Label/value lookup over two aligned node lists
//!
//! Detail pages describe most scalar fields as a definition list: one list of
//! label nodes and one list of value nodes, aligned by position. Looking a field
//! up means finding its label and reading the value at the same index.

use scraper::ElementRef;

/// Returns the value aligned with the first label equal to `target`
///
/// Labels are compared after trimming surrounding whitespace. If no label
/// matches, or the values list is shorter than the labels list, the result is
/// an empty string.
///
/// # Examples
///
/// ```
/// use reel_harvest::extract::lookup;
///
/// let labels = vec!["Năm:".to_string(), "Thời lượng:".to_string()];
/// let values = vec!["2019".to_string(), "120 phút".to_string()];
///
/// assert_eq!(lookup(&labels, &values, "Thời lượng:"), "120 phút");
/// assert_eq!(lookup(&labels, &values, "Ngôn ngữ:"), "");
/// ```
pub fn lookup<L, V>(labels: &[L], values: &[V], target: &str) -> String
where
    L: AsRef<str>,
    V: AsRef<str>,
{
    let target = target.trim();

    labels
        .iter()
        .position(|label| label.as_ref().trim() == target)
        .and_then(|index| values.get(index))
        .map(|value| value.as_ref().trim().to_string())
        .unwrap_or_default()
}

/// Runs [`lookup`] over the text content of two element lists
pub fn lookup_elements(labels: &[ElementRef<'_>], values: &[ElementRef<'_>], target: &str) -> String {
    let labels: Vec<String> = labels.iter().map(element_text).collect();
    let values: Vec<String> = values.iter().map(element_text).collect();
    lookup(&labels, &values, target)
}

pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
