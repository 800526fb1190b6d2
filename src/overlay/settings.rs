use std::ops::RangeInclusive;

use anyhow::Result;
use serde_json::Value;

use crate::storage::{preferences::Preferences, KeyValueStore};

use super::gesture::Position;

/// Namespace the settings are expected to be opened with.
pub const OVERLAY_NAMESPACE: &str = "overlay_settings";

const KEY_ENABLED: &str = "overlay_enabled";
const KEY_POSITION_X: &str = "overlay_position_x";
const KEY_POSITION_Y: &str = "overlay_position_y";
const KEY_SIZE_DP: &str = "overlay_size_dp";
const KEY_ALPHA: &str = "overlay_alpha";

pub const DEFAULT_POSITION: Position = Position { x: 0, y: 240 };
pub const DEFAULT_SIZE_DP: f32 = 48.;
pub const DEFAULT_ALPHA: f32 = 0.8;
pub const SIZE_DP_RANGE: RangeInclusive<f32> = 36.0..=72.0;
pub const ALPHA_RANGE: RangeInclusive<f32> = 0.4..=1.0;

/// Look of the button. Only read when the window is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayAppearance {
    pub size_dp: f32,
    pub alpha: f32,
}

impl Default for OverlayAppearance {
    fn default() -> Self {
        Self {
            size_dp: DEFAULT_SIZE_DP,
            alpha: DEFAULT_ALPHA,
        }
    }
}

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

/// Persisted overlay configuration: whether the button is on, where it was last dropped and
/// how it looks.
pub struct OverlaySettings<S> {
    preferences: Preferences<S>,
}

impl<S: KeyValueStore> OverlaySettings<S> {
    pub fn new(store: S) -> Self {
        Self {
            preferences: Preferences::new(store),
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.preferences.get_bool(KEY_ENABLED, false).await
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.preferences.put_bool(KEY_ENABLED, enabled).await
    }

    pub async fn load_position(&self) -> Position {
        Position {
            x: self.preferences.get_i32(KEY_POSITION_X, DEFAULT_POSITION.x).await,
            y: self.preferences.get_i32(KEY_POSITION_Y, DEFAULT_POSITION.y).await,
        }
    }

    pub async fn save_position(&self, position: Position) -> Result<()> {
        self.preferences
            .put_all(vec![
                (KEY_POSITION_X, Value::from(position.x)),
                (KEY_POSITION_Y, Value::from(position.y)),
            ])
            .await
    }

    /// Forgets the saved position so the next window starts at [DEFAULT_POSITION].
    pub async fn reset_position(&self) -> Result<()> {
        self.preferences
            .remove(&[KEY_POSITION_X, KEY_POSITION_Y])
            .await
    }

    pub async fn load_size_dp(&self) -> f32 {
        clamp_to(
            self.preferences.get_f32(KEY_SIZE_DP, DEFAULT_SIZE_DP).await,
            &SIZE_DP_RANGE,
        )
    }

    pub async fn save_size_dp(&self, size_dp: f32) -> Result<()> {
        self.preferences
            .put_f32(KEY_SIZE_DP, clamp_to(size_dp, &SIZE_DP_RANGE))
            .await
    }

    pub async fn load_alpha(&self) -> f32 {
        clamp_to(
            self.preferences.get_f32(KEY_ALPHA, DEFAULT_ALPHA).await,
            &ALPHA_RANGE,
        )
    }

    pub async fn save_alpha(&self, alpha: f32) -> Result<()> {
        self.preferences
            .put_f32(KEY_ALPHA, clamp_to(alpha, &ALPHA_RANGE))
            .await
    }

    pub async fn load_appearance(&self) -> OverlayAppearance {
        OverlayAppearance {
            size_dp: self.load_size_dp().await,
            alpha: self.load_alpha().await,
        }
    }

    pub async fn save_appearance(&self, appearance: OverlayAppearance) -> Result<()> {
        self.save_size_dp(appearance.size_dp).await?;
        self.save_alpha(appearance.alpha).await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        overlay::gesture::Position,
        storage::{file::JsonFileStore, memory::MemoryStore},
    };

    use super::{OverlayAppearance, OverlaySettings, DEFAULT_POSITION, OVERLAY_NAMESPACE};

    #[tokio::test]
    async fn test_defaults() {
        let settings = OverlaySettings::new(MemoryStore::new());

        assert!(!settings.is_enabled().await);
        assert_eq!(settings.load_position().await, DEFAULT_POSITION);
        assert_eq!(settings.load_appearance().await, OverlayAppearance::default());
    }

    #[tokio::test]
    async fn test_position_round_trip_and_reset() -> Result<()> {
        let dir = tempdir()?;
        let settings = OverlaySettings::new(JsonFileStore::open(dir.path(), OVERLAY_NAMESPACE)?);

        settings.save_position(Position { x: 120, y: -30 }).await?;
        let reopened = OverlaySettings::new(JsonFileStore::open(dir.path(), OVERLAY_NAMESPACE)?);
        assert_eq!(reopened.load_position().await, Position { x: 120, y: -30 });

        reopened.reset_position().await?;
        assert_eq!(settings.load_position().await, DEFAULT_POSITION);
        Ok(())
    }

    #[tokio::test]
    async fn test_appearance_is_clamped() -> Result<()> {
        let settings = OverlaySettings::new(MemoryStore::new());

        settings
            .save_appearance(OverlayAppearance {
                size_dp: 100.,
                alpha: 0.1,
            })
            .await?;
        assert_eq!(
            settings.load_appearance().await,
            OverlayAppearance {
                size_dp: 72.,
                alpha: 0.4,
            }
        );

        settings.save_size_dp(60.).await?;
        settings.save_alpha(0.9).await?;
        assert_eq!(settings.load_size_dp().await, 60.);
        assert_eq!(settings.load_alpha().await, 0.9);
        Ok(())
    }

    #[tokio::test]
    async fn test_enabled_flag() -> Result<()> {
        let settings = OverlaySettings::new(MemoryStore::new());
        settings.set_enabled(true).await?;
        assert!(settings.is_enabled().await);
        settings.set_enabled(false).await?;
        assert!(!settings.is_enabled().await);
        Ok(())
    }
}
