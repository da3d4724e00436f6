use crate::error::MirrorError;
use scraper::{Html, Selector};

/// Visible text of every anchor that carries an `href`, trimmed, in document order.
pub fn extract_anchor_names(html: &str) -> Result<Vec<String>, MirrorError> {
    let selector = Selector::parse("a[href]")
        .map_err(|e| eyre::eyre!("Invalid anchor selector: {}", e))?;
    let doc = Html::parse_document(html);

    Ok(doc
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}
