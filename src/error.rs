use gstreamer as gst;

/// Errors that can occur while building or driving the playback pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("glib error: {0}")]
    Glib(#[from] glib::Error),

    #[error("{0}")]
    Bool(#[from] glib::BoolError),

    #[error("pipeline state change failed: {0}")]
    StateChange(#[from] gst::StateChangeError),

    #[error("failed to downcast gstreamer element")]
    Cast,

    #[error("failed to read video caps")]
    Caps,

    #[error("invalid framerate: {0}")]
    Framerate(f64),

    #[error("invalid media uri: {0}")]
    InvalidSource(#[from] url::ParseError),
}
