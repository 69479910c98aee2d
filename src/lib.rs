//! # GPUI PiP Player
//!
//! A single-window video playback demo for GPUI with a toggleable
//! picture-in-picture floating surface, built on top of GStreamer.
//!
//! ## Features
//!
//! - GStreamer-powered video decoding and playback
//! - Transport control (play, pause, restart) with a status readout
//! - Picture-in-picture: an always-on-top floating window sharing the
//!   session's render surface
//! - Letterboxed rendering pinned to the video's natural aspect ratio, with
//!   a one-shot window fit to the natural pixel size after load
//! - CPU-based NV12 to RGBA conversion (no GPU shaders required)
//!
//! ## Example
//!
//! ```rust,no_run
//! use gpui_pip_player::MediaSession;
//!
//! let mut session: MediaSession = MediaSession::new("https://example.com/stream.m3u8");
//! session.load();
//! assert_eq!(session.status(), "Playing");
//! session.pause();
//! assert_eq!(session.status(), "Paused");
//! ```

mod app;
mod element;
mod error;
mod geometry;
mod overlay;
mod pip;
mod session;
mod video;

pub use app::PipDemo;
pub use element::{VideoElement, video_surface};
pub use error::Error;
pub use geometry::{
    BoundsProbe, STATUS_STRIP_HEIGHT, STATUS_STRIP_MARGIN, WindowFit, WindowHost, centered_frame,
    letterbox, status_strip,
};
pub use overlay::overlay_badge;
pub use pip::{PipController, PipRequest, PipState, PipVideoView, open_pip_window, pip_supported};
pub use session::{MediaSession, PlayerSource, TransportState};
pub use video::Video;

// Re-export commonly used types
pub use gstreamer as gst;
pub use url::Url;
