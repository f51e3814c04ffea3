use serde::Serialize;

/// Title used when a document has no first-level heading.
pub const DEFAULT_TITLE: &str = "Untitled Recipe";

/// MIME type of every rendered card.
pub const CARD_MIME_TYPE: &str = "image/png";

/// The structured part of a recipe that fits on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    pub title: String,
    /// At most five entries, in document order
    pub ingredients: Vec<String>,
    /// At most three entries, in document order
    pub instructions_preview: Vec<String>,
}

impl Default for RecipeSummary {
    fn default() -> Self {
        RecipeSummary {
            title: DEFAULT_TITLE.to_string(),
            ingredients: Vec::new(),
            instructions_preview: Vec::new(),
        }
    }
}

/// A rendered card waiting to be handed to the artifact store.
#[derive(Debug, Clone)]
pub struct CardArtifact {
    pub key: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl CardArtifact {
    pub fn new(recipe_id: &str, bytes: Vec<u8>) -> Self {
        CardArtifact {
            key: card_key(recipe_id),
            bytes,
            mime_type: CARD_MIME_TYPE,
        }
    }
}

/// Storage key of the card for `recipe_id`.
pub fn card_key(recipe_id: &str) -> String {
    format!("recipe_card_{}.png", recipe_id)
}

/// URL encoded into the card's QR code.
pub fn recipe_url(base_url: &str, recipe_id: &str) -> String {
    format!("{}/recipes/{}", base_url.trim_end_matches('/'), recipe_id)
}

/// Public download link announced once a card is stored.
pub fn card_download_url(base_url: &str, recipe_id: &str) -> String {
    format!(
        "{}/artifacts/download/{}",
        base_url.trim_end_matches('/'),
        card_key(recipe_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_templates() {
        assert_eq!(
            recipe_url("http://localhost:8700", "abc"),
            "http://localhost:8700/recipes/abc"
        );
        assert_eq!(
            card_download_url("http://localhost:8700/", "abc"),
            "http://localhost:8700/artifacts/download/recipe_card_abc.png"
        );
    }

    #[test]
    fn test_artifact_key() {
        let artifact = CardArtifact::new("soup", vec![1, 2, 3]);
        assert_eq!(artifact.key, "recipe_card_soup.png");
        assert_eq!(artifact.mime_type, "image/png");
    }
}
