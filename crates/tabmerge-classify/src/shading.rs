use tabmerge_model::Color;

/// Decides whether a background color counts as shading.
///
/// Near-white fills are treated as unshaded; the exact channel threshold is
/// a policy choice, not an invariant, so it stays configurable here at the
/// classifier boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShadingPolicy {
    /// A color is shaded only if some RGB channel falls below this value.
    pub near_white_min: u8,
}

impl Default for ShadingPolicy {
    fn default() -> Self {
        Self { near_white_min: 220 }
    }
}

impl ShadingPolicy {
    pub fn is_shaded(&self, color: Color) -> bool {
        color.r < self.near_white_min
            || color.g < self.near_white_min
            || color.b < self.near_white_min
    }

    pub fn is_background_shaded(&self, background: Option<Color>) -> bool {
        background.is_some_and(|color| self.is_shaded(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_white_is_unshaded() {
        let policy = ShadingPolicy::default();
        assert!(!policy.is_shaded(Color::new(255, 255, 255)));
        assert!(!policy.is_shaded(Color::new(220, 230, 240)));
    }

    #[test]
    fn any_low_channel_is_shaded() {
        let policy = ShadingPolicy::default();
        assert!(policy.is_shaded(Color::new(204, 204, 204)));
        assert!(policy.is_shaded(Color::new(255, 255, 219)));
    }

    #[test]
    fn missing_background_is_unshaded() {
        let policy = ShadingPolicy::default();
        assert!(!policy.is_background_shaded(None));
        assert!(policy.is_background_shaded(Some(Color::new(128, 128, 128))));
    }
}
