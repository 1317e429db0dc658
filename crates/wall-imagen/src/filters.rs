//! Style filter prompts

/// Filter used when the requested name is unknown
pub const DEFAULT_FILTER_NAME: &str = "defiant";

const ANIME_PROMPT: &str = "Transform this photo into a high-quality anime illustration. \
Clean line art, large expressive eyes, soft shading, vibrant colors, studio-quality anime style, \
keep facial features recognizable";

/// Known filter names and their prompts
pub const FILTER_PROMPTS: [(&str, &str); 4] = [
    ("military", ANIME_PROMPT),
    ("defiant", ANIME_PROMPT),
    ("warrior", ANIME_PROMPT),
    ("fierce", ANIME_PROMPT),
];

/// Prompt for a filter name, falling back to [`DEFAULT_FILTER_NAME`]
#[must_use]
pub fn prompt_for(filter_type: &str) -> &'static str {
    lookup(filter_type)
        .or_else(|| lookup(DEFAULT_FILTER_NAME))
        .unwrap_or(ANIME_PROMPT)
}

fn lookup(name: &str) -> Option<&'static str> {
    FILTER_PROMPTS
        .iter()
        .find(|(filter, _)| *filter == name)
        .map(|(_, prompt)| *prompt)
}

/// Raw base64 payload of a possibly data-URI-prefixed image
///
/// Everything up to and including the first comma is dropped.
#[must_use]
pub fn strip_data_uri(image: &str) -> &str {
    image.split_once(',').map_or(image, |(_, payload)| payload)
}
