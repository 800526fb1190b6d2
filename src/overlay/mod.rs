//! Floating record button.
//!
//! A small circular window drawn above everything else, including the lock screen. Dragging
//! moves it, tapping it records an unnamed event. The actual window system is supplied by the
//! host through [platform::WindowHost] and [platform::Platform]; this module only decides when
//! the window exists, where it is and what a touch means.
//!
//! [service::OverlayService] is the entry point for hosts: it feeds [service::OverlaySignal]s
//! into an [controller::OverlayController].

pub mod controller;
pub mod gesture;
pub mod platform;
pub mod service;
pub mod settings;
