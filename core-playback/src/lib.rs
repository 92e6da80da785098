//! # Core Playback Module
//!
//! Playback status reconciliation on top of a host playback engine.
//!
//! ## Overview
//!
//! The engine decodes and renders; this crate decides what the playback
//! status *is*. It fuses engine rate and time-control changes, item
//! readiness, periodic position ticks, audio-route interruptions and remote
//! commands into one authoritative [`Status`], without letting late engine
//! signals override user intent such as a manual pause or a manual seek.
//!
//! ## Components
//!
//! - [`clock`] - Engine time readings to elapsed time / duration
//! - [`seek`] - Generation-counted seek coordination
//! - [`interruption`] - Interruption-end resumption policy
//! - [`transition`] - Pure status transition function
//! - [`commands`] - Remote command routing
//! - [`events`] - Notification bus
//! - [`controller`] - The actor tying everything together
//!
//! ## Example
//!
//! ```ignore
//! use core_playback::{PlaybackConfiguration, PlaybackController, Status};
//! use bridge_desktop::VirtualEngine;
//! use bridge_traits::MediaSource;
//! use std::sync::Arc;
//!
//! let engine = Arc::new(VirtualEngine::new());
//! let controller = PlaybackController::with_engine(engine)?;
//!
//! controller.prepare_to_play(MediaSource::audio_file("/music/track.mp3"), PlaybackConfiguration::autoplay())?;
//!
//! let mut watch = controller.watch();
//! watch.wait_for(|s| matches!(s.status, Status::Playing { .. })).await?;
//! ```

pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod interruption;
pub mod seek;
pub mod status;
pub mod transition;

pub use commands::{CommandStatus, RemoteCommand};
pub use config::PlaybackConfiguration;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{
    ControllerEvent, ControllerId, EventBus, EventStream, NotificationName, PlaybackNotification,
};
pub use seek::SeekCompletion;
pub use status::{PlaybackSnapshot, Status};
