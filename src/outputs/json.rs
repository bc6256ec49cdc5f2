//! JSON rendering of a [`Listing`].

use super::Listing;

/// Serialize `listing` as pretty-printed JSON.
pub fn render(listing: &Listing<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use crate::query::paginate;

    fn article(title: &str) -> Article {
        Article {
            source: "Tech Daily".into(),
            domains: vec!["IoT".into()],
            themes: vec!["AI".into()],
            title: title.into(),
            link: "https://tech.example/x".into(),
            published: "06 May 2025 – 14:30".into(),
            summary: "Summary".into(),
            full_text: String::new(),
            image_url: None,
            source_ranking: 5,
            article_ranking: 5,
            ranking_author: "alice".into(),
            feasibility_score: 0,
            feasibility_author: String::new(),
            fetched_at: "now".into(),
        }
    }

    #[test]
    fn test_render_listing() {
        let articles = vec![article("One"), article("Two")];
        let refs: Vec<&Article> = articles.iter().collect();
        let listing = Listing {
            page: paginate(&refs, 1, 1),
            query: Some("one"),
            selected_domains: &[],
            selected_themes: &[],
            errors: Vec::new(),
        };

        let value: serde_json::Value = serde_json::from_str(&render(&listing).unwrap()).unwrap();
        assert_eq!(value["page"], 1);
        assert_eq!(value["total_pages"], 2);
        assert_eq!(value["total_items"], 2);
        assert_eq!(value["query"], "one");
        assert_eq!(value["items"][0]["title"], "One");
        assert_eq!(value["items"][0]["domains"][0], "IoT");
        assert!(value["items"][0]["image_url"].is_null());
    }
}
