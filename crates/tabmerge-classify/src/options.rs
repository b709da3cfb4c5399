use crate::shading::ShadingPolicy;

/// Classification policy knobs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassifyOptions {
    /// Minimum text length (in characters) for a first-data-row cell to be
    /// classified as an Add field.
    pub add_text_threshold: usize,
    pub shading: ShadingPolicy,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            add_text_threshold: 30,
            shading: ShadingPolicy::default(),
        }
    }
}
