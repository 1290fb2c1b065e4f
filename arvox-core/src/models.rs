//! Catalog of models selectable through the bot menu.

/// Known model ids with human-readable labels.
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("llama3-70b", "Llama 3 70B"),
    ("llama3-8b", "Llama 3 8B"),
    ("mixtral-8x7b", "Mixtral 8x7B"),
    ("gemma-7b", "Gemma 7B"),
];

/// Check whether a model id is in the catalog.
pub fn is_known_model(id: &str) -> bool {
    AVAILABLE_MODELS.iter().any(|(model_id, _)| *model_id == id)
}

/// Display label for a model id. Falls back to the id itself.
pub fn model_label(id: &str) -> &str {
    AVAILABLE_MODELS
        .iter()
        .find(|(model_id, _)| *model_id == id)
        .map_or(id, |(_, label)| *label)
}
