//! Engine configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::hazard::HazardCategory;

/// Distance at which an armed hazard fires (metres).
pub const DEFAULT_INNER_DISTANCE_M: f64 = 200.0;

/// Extra distance beyond the inner threshold before a fired hazard re-arms.
///
/// Together with the inner distance this forms the hysteresis band that keeps
/// GPS jitter at the boundary from re-triggering an alert.
pub const DEFAULT_RESET_MARGIN_M: f64 = 100.0;

/// Radius of the hazard fetch around the current position (metres).
pub const DEFAULT_REFRESH_RADIUS_M: f64 = 1000.0;

/// Minimum time between two alert dispatches.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Default speech language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Per-category alert toggles. Categories not listed are enabled.
#[derive(Debug, Clone, Default)]
pub struct CategoryToggles {
    overrides: BTreeMap<HazardCategory, bool>,
}

// Equal when every category resolves to the same flag, however it was set.
impl PartialEq for CategoryToggles {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for CategoryToggles {}

impl CategoryToggles {
    /// All categories enabled.
    pub fn all_enabled() -> Self {
        Self::default()
    }

    /// Whether alerts for `category` are enabled.
    pub fn is_enabled(&self, category: HazardCategory) -> bool {
        self.overrides.get(&category).copied().unwrap_or(true)
    }

    /// Enable or disable a category.
    pub fn set(&mut self, category: HazardCategory, enabled: bool) {
        self.overrides.insert(category, enabled);
    }

    /// Iterate over every category with its effective flag.
    pub fn iter(&self) -> impl Iterator<Item = (HazardCategory, bool)> + '_ {
        HazardCategory::ALL
            .into_iter()
            .map(|c| (c, self.is_enabled(c)))
    }
}

/// Configuration read by the proximity engine on every check cycle.
///
/// Owned by the engine and changed only through
/// [`ProximityEngine::update_settings`](crate::proximity::ProximityEngine::update_settings).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Distance at or below which an armed hazard fires.
    pub inner_distance_m: f64,
    /// Hysteresis margin; a fired hazard re-arms beyond inner + margin.
    pub reset_margin_m: f64,
    /// Radius passed to the hazard repository.
    pub refresh_radius_m: f64,
    /// Per-category alert toggles.
    pub categories: CategoryToggles,
    /// Whether alerts are spoken.
    pub sound_enabled: bool,
    /// Minimum time between two dispatches.
    pub cooldown: Duration,
    /// Speech language code (e.g. "en", "ar").
    pub language: String,
    /// Speech volume in [0, 1].
    pub volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inner_distance_m: DEFAULT_INNER_DISTANCE_M,
            reset_margin_m: DEFAULT_RESET_MARGIN_M,
            refresh_radius_m: DEFAULT_REFRESH_RADIUS_M,
            categories: CategoryToggles::all_enabled(),
            sound_enabled: true,
            cooldown: DEFAULT_COOLDOWN,
            language: DEFAULT_LANGUAGE.to_string(),
            volume: 1.0,
        }
    }
}

impl EngineConfig {
    /// Distance beyond which a fired hazard re-arms.
    pub fn reset_distance_m(&self) -> f64 {
        self.inner_distance_m + self.reset_margin_m
    }

    /// Whether alerts for `category` are enabled.
    pub fn is_category_enabled(&self, category: HazardCategory) -> bool {
        self.categories.is_enabled(category)
    }

    /// Set the inner alert distance.
    pub fn with_inner_distance(mut self, metres: f64) -> Self {
        self.inner_distance_m = metres;
        self
    }

    /// Set the hysteresis margin.
    pub fn with_reset_margin(mut self, metres: f64) -> Self {
        self.reset_margin_m = metres;
        self
    }

    /// Set the fetch radius.
    pub fn with_refresh_radius(mut self, metres: f64) -> Self {
        self.refresh_radius_m = metres;
        self
    }

    /// Set the dispatch cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Enable or disable a category.
    pub fn with_category(mut self, category: HazardCategory, enabled: bool) -> Self {
        self.categories.set(category, enabled);
        self
    }

    /// Enable or disable speech.
    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    /// Set the speech language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the speech volume (clamped to [0, 1]).
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = clamp_volume(volume);
        self
    }

    /// Merge a partial update into this config.
    pub fn apply(&mut self, patch: &EngineConfigPatch) {
        if let Some(v) = patch.inner_distance_m {
            self.inner_distance_m = v;
        }
        if let Some(v) = patch.reset_margin_m {
            self.reset_margin_m = v;
        }
        if let Some(v) = patch.refresh_radius_m {
            self.refresh_radius_m = v;
        }
        for (category, enabled) in &patch.categories {
            self.categories.set(*category, *enabled);
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.cooldown {
            self.cooldown = v;
        }
        if let Some(v) = &patch.language {
            self.language = v.clone();
        }
        if let Some(v) = patch.volume {
            self.volume = clamp_volume(v);
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 1.0;
    }
    volume.clamp(0.0, 1.0)
}

/// Partial update for [`EngineConfig`]. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfigPatch {
    pub inner_distance_m: Option<f64>,
    pub reset_margin_m: Option<f64>,
    pub refresh_radius_m: Option<f64>,
    pub categories: BTreeMap<HazardCategory, bool>,
    pub sound_enabled: Option<bool>,
    pub cooldown: Option<Duration>,
    pub language: Option<String>,
    pub volume: Option<f32>,
}

impl EngineConfigPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a category.
    pub fn category(mut self, category: HazardCategory, enabled: bool) -> Self {
        self.categories.insert(category, enabled);
        self
    }

    /// Change the inner alert distance.
    pub fn inner_distance(mut self, metres: f64) -> Self {
        self.inner_distance_m = Some(metres);
        self
    }

    /// Change the hysteresis margin.
    pub fn reset_margin(mut self, metres: f64) -> Self {
        self.reset_margin_m = Some(metres);
        self
    }

    /// Change the fetch radius.
    pub fn refresh_radius(mut self, metres: f64) -> Self {
        self.refresh_radius_m = Some(metres);
        self
    }

    /// Toggle speech.
    pub fn sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = Some(enabled);
        self
    }

    /// Change the dispatch cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Change the speech language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Change the speech volume.
    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later patch into this one; fields set in `later` win.
    pub fn merge(&mut self, later: &EngineConfigPatch) {
        if later.inner_distance_m.is_some() {
            self.inner_distance_m = later.inner_distance_m;
        }
        if later.reset_margin_m.is_some() {
            self.reset_margin_m = later.reset_margin_m;
        }
        if later.refresh_radius_m.is_some() {
            self.refresh_radius_m = later.refresh_radius_m;
        }
        self.categories
            .extend(later.categories.iter().map(|(c, e)| (*c, *e)));
        if later.sound_enabled.is_some() {
            self.sound_enabled = later.sound_enabled;
        }
        if later.cooldown.is_some() {
            self.cooldown = later.cooldown;
        }
        if later.language.is_some() {
            self.language = later.language.clone();
        }
        if later.volume.is_some() {
            self.volume = later.volume;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.inner_distance_m, 200.0);
        assert_eq!(config.reset_margin_m, 100.0);
        assert_eq!(config.reset_distance_m(), 300.0);
        assert_eq!(config.refresh_radius_m, 1000.0);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert!(config.sound_enabled);
        assert!(HazardCategory::ALL
            .iter()
            .all(|c| config.is_category_enabled(*c)));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_inner_distance(150.0)
            .with_reset_margin(50.0)
            .with_category(HazardCategory::SpeedCamera, false)
            .with_language("ar")
            .with_volume(3.0);

        assert_eq!(config.reset_distance_m(), 200.0);
        assert!(!config.is_category_enabled(HazardCategory::SpeedCamera));
        assert!(config.is_category_enabled(HazardCategory::Pothole));
        assert_eq!(config.language, "ar");
        assert_eq!(config.volume, 1.0);
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut config = EngineConfig::default().with_language("ar");
        let patch = EngineConfigPatch::new()
            .category(HazardCategory::Accident, false)
            .volume(0.4)
            .cooldown(Duration::from_secs(8));

        config.apply(&patch);

        assert!(!config.is_category_enabled(HazardCategory::Accident));
        assert_eq!(config.volume, 0.4);
        assert_eq!(config.cooldown, Duration::from_secs(8));
        assert_eq!(config.language, "ar");
        assert_eq!(config.inner_distance_m, 200.0);
    }

    #[test]
    fn test_patch_can_re_enable_category() {
        let mut config = EngineConfig::default().with_category(HazardCategory::Accident, false);
        config.apply(&EngineConfigPatch::new().category(HazardCategory::Accident, true));
        assert!(config.is_category_enabled(HazardCategory::Accident));
    }

    #[test]
    fn test_patch_merge_later_wins() {
        let mut patch = EngineConfigPatch::new()
            .category(HazardCategory::Accident, false)
            .volume(0.2);
        patch.merge(
            &EngineConfigPatch::new()
                .category(HazardCategory::Accident, true)
                .language("ar"),
        );

        assert_eq!(patch.categories.get(&HazardCategory::Accident), Some(&true));
        assert_eq!(patch.volume, Some(0.2));
        assert_eq!(patch.language.as_deref(), Some("ar"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(EngineConfigPatch::new().is_empty());
        assert!(!EngineConfigPatch::new().sound(false).is_empty());
    }

    #[test]
    fn test_toggles_iter_covers_all_categories() {
        let mut toggles = CategoryToggles::all_enabled();
        toggles.set(HazardCategory::Other, false);
        let flags: Vec<_> = toggles.iter().collect();
        assert_eq!(flags.len(), HazardCategory::ALL.len());
        assert!(flags.contains(&(HazardCategory::Other, false)));
    }
}
