use crate::{Error, Video};
use gpui::{Pixels, Size, px, size};
use url::Url;

/// Transport state of the media session.
///
/// `Idle` only exists before a successful load; `Loading` flips to `Playing`
/// optimistically as soon as the source opens, without waiting for a
/// first-frame signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// The engine seam: what the session needs from a playable source.
pub trait PlayerSource: Sized {
    fn open(uri: &Url) -> Result<Self, Error>;
    fn resume(&self);
    fn suspend(&self);
    fn seek_to_start(&self) -> Result<(), Error>;
    fn natural_size(&self) -> Option<Size<Pixels>>;
}

impl PlayerSource for Video {
    fn open(uri: &Url) -> Result<Self, Error> {
        Video::new(uri)
    }

    fn resume(&self) {
        self.set_paused(false);
    }

    fn suspend(&self) {
        self.set_paused(true);
    }

    fn seek_to_start(&self) -> Result<(), Error> {
        Video::seek_to_start(self)
    }

    fn natural_size(&self) -> Option<Size<Pixels>> {
        let (width, height) = self.size();
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(size(px(width as f32), px(height as f32)))
    }
}

/// Owns the player and is the single source of truth for transport state.
///
/// All failure paths degrade to logged no-ops; nothing here surfaces an
/// error to the UI.
pub struct MediaSession<S: PlayerSource = Video> {
    source_uri: String,
    state: TransportState,
    source: Option<S>,
}

impl<S: PlayerSource> MediaSession<S> {
    /// Create an idle session for `uri`. Nothing is opened until [`load`].
    ///
    /// [`load`]: MediaSession::load
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            source_uri: uri.into(),
            state: TransportState::Idle,
            source: None,
        }
    }

    /// Open the source and start playback (autoplay).
    ///
    /// A malformed URI or an engine failure leaves the session idle; both are
    /// logged and otherwise silent. Loading twice is a no-op.
    pub fn load(&mut self) {
        if self.source.is_some() {
            return;
        }

        let uri = match Url::parse(&self.source_uri) {
            Ok(uri) => uri,
            Err(err) => {
                log::warn!("ignoring malformed media uri {:?}: {err}", self.source_uri);
                return;
            }
        };

        self.state = TransportState::Loading;
        match S::open(&uri) {
            Ok(source) => {
                source.resume();
                self.source = Some(source);
                self.state = TransportState::Playing;
            }
            Err(err) => {
                log::error!("failed to open {uri}: {err}");
                self.state = TransportState::Idle;
            }
        }
    }

    /// Resume playback. No effect when already playing.
    pub fn play(&mut self) {
        if self.state == TransportState::Playing {
            return;
        }
        if let Some(source) = &self.source {
            source.resume();
        }
        self.state = TransportState::Playing;
    }

    /// Pause playback. A no-op unless currently playing or loading.
    pub fn pause(&mut self) {
        match self.state {
            TransportState::Playing | TransportState::Loading => {
                if let Some(source) = &self.source {
                    source.suspend();
                }
                self.state = TransportState::Paused;
            }
            TransportState::Idle | TransportState::Paused => {}
        }
    }

    /// Seek back to the start and play. Always ends up playing, whatever the
    /// prior state.
    pub fn restart(&mut self) {
        if let Some(source) = &self.source {
            if let Err(err) = source.seek_to_start() {
                log::error!("failed to seek to start: {err}");
            }
            source.resume();
        }
        self.state = TransportState::Playing;
    }

    pub fn transport_state(&self) -> TransportState {
        self.state
    }

    /// The status readout shown in the UI. Only two strings exist; anything
    /// not paused reads as "Playing".
    pub fn status(&self) -> &'static str {
        match self.state {
            TransportState::Paused => "Paused",
            _ => "Playing",
        }
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// The video's intrinsic pixel dimensions, once known.
    pub fn natural_size(&self) -> Option<Size<Pixels>> {
        self.source.as_ref().and_then(|source| source.natural_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Resume,
        Suspend,
        SeekToStart,
    }

    #[derive(Clone, Default)]
    struct FakeSource {
        calls: Rc<RefCell<Vec<Call>>>,
    }

    thread_local! {
        static NEXT_SOURCE: RefCell<Option<Result<FakeSource, Error>>> = RefCell::new(None);
    }

    impl FakeSource {
        fn stage(source: Result<FakeSource, Error>) {
            NEXT_SOURCE.with(|next| *next.borrow_mut() = Some(source));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl PlayerSource for FakeSource {
        fn open(_uri: &Url) -> Result<Self, Error> {
            NEXT_SOURCE
                .with(|next| next.borrow_mut().take())
                .expect("no staged source")
        }

        fn resume(&self) {
            self.calls.borrow_mut().push(Call::Resume);
        }

        fn suspend(&self) {
            self.calls.borrow_mut().push(Call::Suspend);
        }

        fn seek_to_start(&self) -> Result<(), Error> {
            self.calls.borrow_mut().push(Call::SeekToStart);
            Ok(())
        }

        fn natural_size(&self) -> Option<Size<Pixels>> {
            Some(size(px(640.0), px(360.0)))
        }
    }

    fn loaded_session() -> (MediaSession<FakeSource>, FakeSource) {
        let source = FakeSource::default();
        FakeSource::stage(Ok(source.clone()));
        let mut session = MediaSession::new("https://example.com/stream.m3u8");
        session.load();
        (session, source)
    }

    #[test]
    fn load_autoplays() {
        let (session, source) = loaded_session();
        assert_eq!(session.transport_state(), TransportState::Playing);
        assert_eq!(session.status(), "Playing");
        assert_eq!(source.calls(), vec![Call::Resume]);
    }

    #[test]
    fn malformed_uri_is_a_silent_no_op() {
        let mut session: MediaSession<FakeSource> = MediaSession::new("not a uri");
        session.load();
        assert_eq!(session.transport_state(), TransportState::Idle);
        assert!(session.source().is_none());
    }

    #[test]
    fn engine_open_failure_reverts_to_idle() {
        FakeSource::stage(Err(Error::Cast));
        let mut session: MediaSession<FakeSource> = MediaSession::new("https://example.com/a.mp4");
        session.load();
        assert_eq!(session.transport_state(), TransportState::Idle);
        assert!(session.source().is_none());
    }

    #[test]
    fn paused_iff_last_call_was_pause() {
        let (mut session, _source) = loaded_session();

        session.pause();
        assert_eq!(session.transport_state(), TransportState::Paused);

        session.play();
        assert_eq!(session.transport_state(), TransportState::Playing);

        session.pause();
        session.pause();
        assert_eq!(session.transport_state(), TransportState::Paused);

        session.restart();
        assert_eq!(session.transport_state(), TransportState::Playing);
    }

    #[test]
    fn play_while_playing_does_not_touch_the_source() {
        let (mut session, source) = loaded_session();
        let before = source.calls().len();
        session.play();
        assert_eq!(source.calls().len(), before);
    }

    #[test]
    fn restart_always_ends_playing() {
        // From idle, with no source at all.
        let mut idle: MediaSession<FakeSource> = MediaSession::new("https://example.com/a.mp4");
        idle.restart();
        assert_eq!(idle.transport_state(), TransportState::Playing);

        // From paused.
        let (mut session, source) = loaded_session();
        session.pause();
        session.restart();
        assert_eq!(session.transport_state(), TransportState::Playing);
        assert!(source.calls().contains(&Call::SeekToStart));

        // From playing.
        session.restart();
        assert_eq!(session.transport_state(), TransportState::Playing);
    }

    #[test]
    fn pause_from_idle_is_a_no_op() {
        let mut session: MediaSession<FakeSource> = MediaSession::new("https://example.com/a.mp4");
        session.pause();
        assert_eq!(session.transport_state(), TransportState::Idle);
    }

    #[test]
    fn status_maps_exactly() {
        let (mut session, _source) = loaded_session();
        assert_eq!(session.status(), "Playing");
        session.pause();
        assert_eq!(session.status(), "Paused");
        session.restart();
        assert_eq!(session.status(), "Playing");

        // Idle has no surfaced label of its own; it reads as "Playing".
        let idle: MediaSession<FakeSource> = MediaSession::new("https://example.com/a.mp4");
        assert_eq!(idle.status(), "Playing");
    }

    #[test]
    fn scenario_load_pause_restart() {
        let (mut session, source) = loaded_session();
        assert_eq!(session.transport_state(), TransportState::Playing);
        assert_eq!(session.status(), "Playing");

        session.pause();
        assert_eq!(session.status(), "Paused");

        session.restart();
        assert_eq!(session.status(), "Playing");
        assert_eq!(
            source.calls(),
            vec![Call::Resume, Call::Suspend, Call::SeekToStart, Call::Resume]
        );
    }

    #[test]
    fn load_twice_is_a_no_op() {
        let (mut session, source) = loaded_session();
        session.load();
        assert_eq!(source.calls(), vec![Call::Resume]);
    }

    #[test]
    fn natural_size_is_none_before_load() {
        let session: MediaSession<FakeSource> = MediaSession::new("https://example.com/a.mp4");
        assert_eq!(session.natural_size(), None);

        let (session, _source) = loaded_session();
        assert_eq!(session.natural_size(), Some(size(px(640.0), px(360.0))));
    }
}
