use crate::Error;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_app::prelude::*;
use gstreamer_video as gst_video;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The most recently decoded NV12 sample.
#[derive(Debug)]
pub(crate) struct Frame(gst::Sample);

impl Frame {
    pub fn empty() -> Self {
        Self(gst::Sample::builder().build())
    }

    pub fn readable(&self) -> Option<gst::BufferMap<gst::buffer::Readable>> {
        self.0.buffer().and_then(|x| x.map_readable().ok())
    }
}

#[derive(Debug)]
pub(crate) struct Internal {
    pub(crate) bus: gst::Bus,
    pub(crate) source: gst::Pipeline,
    pub(crate) alive: Arc<AtomicBool>,
    pub(crate) worker: Option<std::thread::JoinHandle<()>>,

    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) framerate: f64,
    pub(crate) duration: std::time::Duration,

    pub(crate) frame: Arc<Mutex<Frame>>,
    pub(crate) upload_frame: Arc<AtomicBool>,
    pub(crate) is_eos: bool,
}

impl Internal {
    pub(crate) fn seek_to_start(&mut self) -> Result<(), Error> {
        self.source.seek(
            1.0,
            gst::SeekFlags::FLUSH,
            gst::SeekType::Set,
            gst::ClockTime::ZERO,
            gst::SeekType::Set,
            gst::ClockTime::NONE,
        )?;
        self.is_eos = false;
        Ok(())
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        let target = if paused {
            gst::State::Paused
        } else {
            gst::State::Playing
        };
        if let Err(err) = self.source.set_state(target) {
            // The ctor already verified the pipeline can reach Playing, so
            // state errors here are transient.
            log::error!("failed to set pipeline state to {target:?}: {err}");
        }
    }

    pub(crate) fn paused(&self) -> bool {
        self.source.state(gst::ClockTime::ZERO).1 == gst::State::Paused
    }
}

/// A streaming video decoded by GStreamer, loaded from a URI (a local file
/// path or an HTTP(S) stream).
///
/// Cloning is cheap and shares the underlying pipeline, so the same video can
/// be painted by several surfaces at once (e.g. the main window and a
/// floating picture-in-picture window).
#[derive(Debug, Clone)]
pub struct Video(pub(crate) Arc<RwLock<Internal>>);

impl Drop for Video {
    fn drop(&mut self) {
        // Only tear down the pipeline with the last reference.
        if Arc::strong_count(&self.0) == 1 {
            if let Some(mut inner) = self.0.try_write() {
                if let Err(err) = inner.source.set_state(gst::State::Null) {
                    log::error!("failed to stop pipeline: {err}");
                }

                inner.alive.store(false, Ordering::SeqCst);
                if let Some(worker) = inner.worker.take() {
                    if let Err(err) = worker.join() {
                        match err.downcast_ref::<String>() {
                            Some(e) => log::error!("video thread panicked: {e}"),
                            None => log::error!("video thread panicked with unknown reason"),
                        }
                    }
                }
            }
        }
    }
}

impl Video {
    /// Build a `playbin` pipeline for `uri` and start it playing.
    pub fn new(uri: &url::Url) -> Result<Self, Error> {
        gst::init()?;

        let pipeline = format!(
            "playbin uri=\"{}\" video-sink=\"videoscale ! videoconvert ! appsink name=pip_video drop=true caps=video/x-raw,format=NV12,pixel-aspect-ratio=1/1\"",
            uri.as_str()
        );
        let pipeline = gst::parse::launch(pipeline.as_ref())?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Cast)?;

        let video_sink: gst::Element = pipeline.property("video-sink");
        let pad = video_sink.pads().first().cloned().ok_or(Error::Cast)?;
        let pad = pad.dynamic_cast::<gst::GhostPad>().map_err(|_| Error::Cast)?;
        let bin = pad
            .parent_element()
            .ok_or(Error::Cast)?
            .downcast::<gst::Bin>()
            .map_err(|_| Error::Cast)?;
        let video_sink = bin.by_name("pip_video").ok_or(Error::Cast)?;
        let video_sink = video_sink
            .downcast::<gst_app::AppSink>()
            .map_err(|_| Error::Cast)?;

        Self::from_gst_pipeline(pipeline, video_sink)
    }

    /// Create a video from an existing pipeline and NV12 appsink.
    pub fn from_gst_pipeline(
        pipeline: gst::Pipeline,
        video_sink: gst_app::AppSink,
    ) -> Result<Self, Error> {
        gst::init()?;

        macro_rules! cleanup {
            ($expr:expr) => {
                $expr.map_err(|e| {
                    let _ = pipeline.set_state(gst::State::Null);
                    e
                })
            };
        }

        let pad = video_sink.pads().first().cloned().ok_or(Error::Cast)?;

        cleanup!(pipeline.set_state(gst::State::Playing))?;

        // Give the pipeline a moment to preroll, then insist on it.
        let _ = pipeline.state(gst::ClockTime::from_mseconds(100));
        cleanup!(pipeline.state(gst::ClockTime::from_seconds(5)).0)?;

        let caps = cleanup!(pad.current_caps().ok_or(Error::Caps))?;
        let s = cleanup!(caps.structure(0).ok_or(Error::Caps))?;
        let width = cleanup!(s.get::<i32>("width").map_err(|_| Error::Caps))?;
        let height = cleanup!(s.get::<i32>("height").map_err(|_| Error::Caps))?;
        let framerate = cleanup!(s.get::<gst::Fraction>("framerate").map_err(|_| Error::Caps))?;
        let framerate = framerate.numer() as f64 / framerate.denom() as f64;

        // Validate that the caps describe a real NV12 layout.
        cleanup!(gst_video::VideoInfo::from_caps(&caps).map_err(|_| Error::Caps))?;

        if framerate.is_nan()
            || framerate.is_infinite()
            || framerate < 0.0
            || framerate.abs() < f64::EPSILON
        {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(Error::Framerate(framerate));
        }

        let duration = std::time::Duration::from_nanos(
            pipeline
                .query_duration::<gst::ClockTime>()
                .map(|duration| duration.nseconds())
                .unwrap_or(0),
        );

        let frame = Arc::new(Mutex::new(Frame::empty()));
        let upload_frame = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let frame_ref = Arc::clone(&frame);
        let upload_frame_ref = Arc::clone(&upload_frame);
        let alive_ref = Arc::clone(&alive);
        let pipeline_ref = pipeline.clone();

        let worker = std::thread::spawn(move || {
            while alive_ref.load(Ordering::Acquire) {
                // Pull with a short timeout so a paused or stalled stream
                // keeps the loop responsive to shutdown.
                let sample = if pipeline_ref.state(gst::ClockTime::ZERO).1 != gst::State::Playing {
                    video_sink.try_pull_preroll(gst::ClockTime::from_mseconds(16))
                } else {
                    video_sink.try_pull_sample(gst::ClockTime::from_mseconds(16))
                };

                if let Some(sample) = sample {
                    *frame_ref.lock() = Frame(sample);
                    upload_frame_ref.store(true, Ordering::SeqCst);
                }
            }
        });

        Ok(Video(Arc::new(RwLock::new(Internal {
            bus: pipeline.bus().ok_or(Error::Cast)?,
            source: pipeline,
            alive,
            worker: Some(worker),

            width,
            height,
            framerate,
            duration,

            frame,
            upload_frame,
            is_eos: false,
        }))))
    }

    pub(crate) fn read(&self) -> parking_lot::RwLockReadGuard<'_, Internal> {
        self.0.read()
    }

    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Internal> {
        self.0.write()
    }

    /// Get the natural size of the video as `(width, height)` in pixels.
    pub fn size(&self) -> (i32, i32) {
        (self.read().width, self.read().height)
    }

    /// Get the framerate of the video as frames per second.
    pub fn framerate(&self) -> f64 {
        self.read().framerate
    }

    /// Get if the stream ended or not.
    pub fn eos(&self) -> bool {
        self.read().is_eos
    }

    /// Set if the media is paused or not.
    pub fn set_paused(&self, paused: bool) {
        self.read().set_paused(paused)
    }

    /// Get if the media is paused or not.
    pub fn paused(&self) -> bool {
        self.read().paused()
    }

    /// Jump back to the beginning of the media.
    pub fn seek_to_start(&self) -> Result<(), Error> {
        self.write().seek_to_start()
    }

    /// Get the current playback position in time.
    pub fn position(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(
            self.read()
                .source
                .query_position::<gst::ClockTime>()
                .map_or(0, |pos| pos.nseconds()),
        )
    }

    /// Get the media duration.
    pub fn duration(&self) -> std::time::Duration {
        self.read().duration
    }

    /// Drain pending bus messages, recording end-of-stream and logging
    /// pipeline errors. Intended to be called from the render loop.
    pub fn poll_bus(&self) {
        let mut inner = self.write();
        while let Some(msg) = inner
            .bus
            .pop_filtered(&[gst::MessageType::Error, gst::MessageType::Eos])
        {
            match msg.view() {
                gst::MessageView::Error(err) => {
                    log::error!("gstreamer error: {}", err.error());
                }
                gst::MessageView::Eos(_) => {
                    inner.is_eos = true;
                }
                _ => {}
            }
        }
    }

    /// Consume the new-frame flag, returning whether a fresh frame arrived
    /// since the last call.
    pub fn take_frame_ready(&self) -> bool {
        self.read().upload_frame.swap(false, Ordering::SeqCst)
    }

    /// Get a copy of the current NV12 frame data, if any has been decoded.
    pub fn current_frame_data(&self) -> Option<(Vec<u8>, u32, u32)> {
        let inner = self.read();

        if let Some(readable) = inner.frame.lock().readable() {
            let data = readable.as_slice().to_vec();
            if !data.is_empty() {
                return Some((data, inner.width as u32, inner.height as u32));
            }
        }

        None
    }
}
