//! Sitemap document parsing
//!
//! Sitemaps are read with the same tolerant HTML tokenizer used for pages:
//! `<loc>` elements survive the HTML tree builder as unknown elements, which
//! is all we need. CDATA wrappers are unwrapped before parsing.

use scraper::{Html, Selector};

/// The two sitemap document shapes we understand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// A `<urlset>` listing page URLs
    UrlSet(Vec<String>),
    /// A `<sitemapindex>` listing child sitemap URLs
    Index(Vec<String>),
}

/// Parses sitemap XML into its `<loc>` entries
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    let cleaned = xml.replace("<![CDATA[", "").replace("]]>", "");
    let is_index = cleaned.to_lowercase().contains("<sitemapindex");
    let document = Html::parse_document(&cleaned);

    let mut locs = Vec::new();
    if let Ok(selector) = Selector::parse("loc") {
        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                locs.push(text.to_string());
            }
        }
    }

    if is_index {
        SitemapDocument::Index(locs)
    } else {
        SitemapDocument::UrlSet(locs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://example.com/about </loc></url>
</urlset>"#;
        assert_eq!(
            parse_sitemap(xml),
            SitemapDocument::UrlSet(vec![
                "https://example.com/".to_string(),
                "https://example.com/about".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_index() {
        let xml = r#"<sitemapindex><sitemap><loc>https://example.com/pages.xml</loc></sitemap></sitemapindex>"#;
        assert_eq!(
            parse_sitemap(xml),
            SitemapDocument::Index(vec!["https://example.com/pages.xml".to_string()])
        );
    }

    #[test]
    fn test_cdata_and_entities() {
        let xml = r#"<urlset><url><loc><![CDATA[https://example.com/a]]></loc></url><url><loc>https://example.com/b?x=1&amp;y=2</loc></url></urlset>"#;
        assert_eq!(
            parse_sitemap(xml),
            SitemapDocument::UrlSet(vec![
                "https://example.com/a".to_string(),
                "https://example.com/b?x=1&y=2".to_string()
            ])
        );
    }

    #[test]
    fn test_html_error_page_has_no_locs() {
        let html = "<html><body><h1>Not Found</h1></body></html>";
        assert_eq!(parse_sitemap(html), SitemapDocument::UrlSet(vec![]));
    }
}
