use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    storage::KeyValueStore,
    store::{EventStore, TimeEvent},
};

use super::{
    gesture::{GestureOutcome, Position, TouchEvent, TouchTracker},
    platform::{Platform, WindowHost, WindowParams},
    settings::{OverlayAppearance, OverlaySettings},
};

/// Movement, in dp, a touch may wander before it stops being a tap.
pub const TOUCH_SLOP_DP: f32 = 6.;

/// Shown to the user after a tap recorded an event.
pub const EVENT_RECORDED_MESSAGE: &str = "기록이 추가되었습니다";

/// When an enabled overlay is actually on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPolicy {
    Always,
    /// Only while the device is locked. Unlocking hides the button, locking shows it again.
    WhenLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    Shown,
}

/// Owns the overlay window's lifecycle.
///
/// Two pieces of state decide visibility: `enabled`, driven by the host's enable and disable
/// signals, and the device lock state when the policy is [VisibilityPolicy::WhenLocked]. The
/// window is attached exactly while both allow it.
pub struct OverlayController<S, E> {
    host: Box<dyn WindowHost>,
    platform: Box<dyn Platform>,
    settings: OverlaySettings<S>,
    store: Arc<EventStore<E>>,
    policy: VisibilityPolicy,
    enabled: bool,
    attached: bool,
    params: Option<WindowParams>,
    tracker: TouchTracker,
}

impl<S: KeyValueStore, E: KeyValueStore> OverlayController<S, E> {
    pub fn new(
        host: Box<dyn WindowHost>,
        platform: Box<dyn Platform>,
        settings: OverlaySettings<S>,
        store: Arc<EventStore<E>>,
        policy: VisibilityPolicy,
    ) -> Self {
        let tracker = TouchTracker::new(platform.dp_to_px(TOUCH_SLOP_DP));
        Self {
            host,
            platform,
            settings,
            store,
            policy,
            enabled: false,
            attached: false,
            params: None,
            tracker,
        }
    }

    pub fn state(&self) -> OverlayState {
        if self.attached {
            OverlayState::Shown
        } else {
            OverlayState::Hidden
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> &OverlaySettings<S> {
        &self.settings
    }

    /// Current window layout, if the overlay is enabled.
    pub fn window_params(&self) -> Option<WindowParams> {
        self.params
    }

    /// Turns the overlay on. Returns `false` without doing anything when the platform doesn't
    /// allow drawing over other applications. Enabling twice keeps the existing window, use
    /// [Self::restart] to pick up new settings.
    #[instrument(skip(self))]
    pub async fn enable(&mut self) -> Result<bool> {
        if !self.platform.can_overlay() {
            warn!("Overlay permission is missing, not showing the button");
            return Ok(false);
        }
        self.store.initialize().await;

        if self.params.is_none() {
            let OverlayAppearance { size_dp, alpha } = self.settings.load_appearance().await;
            let Position { x, y } = self.settings.load_position().await;
            let params = WindowParams {
                x,
                y,
                size_px: self.platform.dp_to_px(size_dp),
                alpha,
                focusable: false,
                show_when_locked: true,
            };
            debug!("Created window params {params:?}");
            self.params = Some(params);
            self.tracker = TouchTracker::new(self.platform.dp_to_px(TOUCH_SLOP_DP));
        }

        self.enabled = true;
        self.settings.set_enabled(true).await?;
        self.update_visibility()?;
        Ok(true)
    }

    /// Turns the overlay off, removing the window if it's shown.
    #[instrument(skip(self))]
    pub async fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        let detached = self.detach();
        self.params = None;
        self.settings.set_enabled(false).await?;
        detached
    }

    /// Re-creates the window so changed appearance or a reset position take effect. Window
    /// layout is fixed once added, so this is the only way to apply them.
    pub async fn restart(&mut self) -> Result<bool> {
        self.disable().await?;
        self.enable().await
    }

    /// Persists a new look and applies it if the overlay is on.
    pub async fn apply_appearance(&mut self, appearance: OverlayAppearance) -> Result<()> {
        self.settings.save_appearance(appearance).await?;
        if self.enabled {
            self.restart().await?;
        }
        Ok(())
    }

    /// Moves the button back to its default spot.
    pub async fn reset_position(&mut self) -> Result<()> {
        self.settings.reset_position().await?;
        if self.enabled {
            self.restart().await?;
        }
        Ok(())
    }

    /// Called whenever the host observes the device being locked or unlocked.
    pub fn on_lock_state_changed(&mut self) -> Result<()> {
        self.update_visibility()
    }

    fn update_visibility(&mut self) -> Result<()> {
        let visible = self.enabled
            && match self.policy {
                VisibilityPolicy::Always => true,
                VisibilityPolicy::WhenLocked => self.platform.is_locked(),
            };
        if visible {
            self.attach()
        } else {
            self.detach()
        }
    }

    fn attach(&mut self) -> Result<()> {
        if self.attached {
            return Ok(());
        }
        let Some(params) = self.params.as_ref() else {
            return Ok(());
        };
        self.host.add_window(params)?;
        self.attached = true;
        info!("Overlay shown at {}, {}", params.x, params.y);
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.tracker.cancel();
        self.host.remove_window()?;
        self.attached = false;
        info!("Overlay hidden");
        Ok(())
    }

    /// Feeds pointer input from the window. Returns the recorded event when the input completed
    /// a tap.
    pub async fn handle_touch(&mut self, touch: TouchEvent) -> Result<Option<TimeEvent>> {
        if !self.attached {
            debug!("Ignoring {touch:?} while hidden");
            return Ok(None);
        }
        let Some(params) = self.params.as_mut() else {
            return Ok(None);
        };

        match touch {
            TouchEvent::Press { x, y } => {
                self.tracker.press(
                    Position {
                        x: params.x,
                        y: params.y,
                    },
                    x,
                    y,
                );
                Ok(None)
            }
            TouchEvent::Move { x, y } => {
                if let Some(position) = self.tracker.drag(x, y) {
                    params.x = position.x;
                    params.y = position.y;
                    self.host.update_window(params)?;
                }
                Ok(None)
            }
            TouchEvent::Release => {
                let Some((outcome, position)) = self.tracker.release() else {
                    return Ok(None);
                };
                if let Err(e) = self.settings.save_position(position).await {
                    error!("Failed to save overlay position {e:?}");
                }
                match outcome {
                    GestureOutcome::Tap => {
                        let event = self.store.append("").await;
                        info!("Recorded {} from the overlay", event.id);
                        self.host.notify(EVENT_RECORDED_MESSAGE);
                        Ok(Some(event))
                    }
                    GestureOutcome::Drag => Ok(None),
                }
            }
        }
    }
}
