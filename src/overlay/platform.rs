use anyhow::Result;

/// What the core needs to know about the device. Supplied by the host platform layer.
#[cfg_attr(test, mockall::automock)]
pub trait Platform {
    /// Whether the device currently shows the lock screen.
    fn is_locked(&self) -> bool;

    /// Whether this application is allowed to draw windows over others.
    fn can_overlay(&self) -> bool;

    /// Converts density independent pixels to physical pixels.
    fn dp_to_px(&self, dp: f32) -> i32;
}

/// Layout of the overlay window. Fixed at creation apart from the position, which follows
/// drags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    pub x: i32,
    pub y: i32,
    /// Width and height, the window is a circle.
    pub size_px: i32,
    pub alpha: f32,
    pub focusable: bool,
    pub show_when_locked: bool,
}

/// System window layer the overlay lives in.
#[cfg_attr(test, mockall::automock)]
pub trait WindowHost {
    fn add_window(&mut self, params: &WindowParams) -> Result<()>;

    /// Moves the already added window.
    fn update_window(&mut self, params: &WindowParams) -> Result<()>;

    fn remove_window(&mut self) -> Result<()>;

    /// Short transient message, like a toast.
    fn notify(&mut self, message: &str);
}

/// [Platform] with fixed answers. Useful for hosts that can't observe the lock state and show
/// the button unconditionally.
#[derive(Debug, Clone, Copy)]
pub struct StaticPlatform {
    pub locked: bool,
    pub can_overlay: bool,
    /// Physical pixels per dp.
    pub density: f32,
}

impl Platform for StaticPlatform {
    fn is_locked(&self) -> bool {
        self.locked
    }

    fn can_overlay(&self) -> bool {
        self.can_overlay
    }

    fn dp_to_px(&self, dp: f32) -> i32 {
        (dp * self.density) as i32
    }
}
