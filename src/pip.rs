use crate::Video;
use crate::element::video_surface;
use gpui::{
    App, AppContext, Bounds, Context, Entity, IntoElement, ParentElement, Render, Styled, Window,
    WindowBounds, WindowHandle, WindowKind, WindowOptions, div, point, px, size,
};

/// Width of the floating surface; height follows the video's aspect ratio.
const PIP_WINDOW_WIDTH: f32 = 320.0;

/// Gap between the floating surface and the display edges.
const PIP_WINDOW_MARGIN: f32 = 24.0;

/// Lifecycle state of the picture-in-picture surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipState {
    /// The platform cannot float a video surface; permanent for the session.
    Unsupported,
    Inactive,
    Active,
}

/// Command for the platform binding, produced by [`PipController::request_toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipRequest {
    Start,
    Stop,
}

/// Mediates between user toggles and the platform's floating surface.
///
/// The controller never talks to the platform itself; `request_toggle` hands
/// a command to the caller and the caller reports back with
/// `surface_started` / `surface_stopped` once the surface actually changed.
/// While such a report is outstanding further toggles are ignored, so a
/// rapid double-toggle cannot double-start or double-stop the surface.
#[derive(Debug)]
pub struct PipController {
    state: PipState,
    transition_pending: bool,
}

impl PipController {
    pub fn new(supported: bool) -> Self {
        Self {
            state: if supported {
                PipState::Inactive
            } else {
                PipState::Unsupported
            },
            transition_pending: false,
        }
    }

    pub fn state(&self) -> PipState {
        self.state
    }

    pub fn is_supported(&self) -> bool {
        self.state != PipState::Unsupported
    }

    pub fn is_active(&self) -> bool {
        self.state == PipState::Active
    }

    /// Handle a user toggle. Returns the command to execute, or `None` when
    /// the toggle is a no-op (unsupported platform, or a transition already
    /// in flight).
    pub fn request_toggle(&mut self) -> Option<PipRequest> {
        if self.transition_pending {
            log::debug!("pip toggle ignored; transition already in flight");
            return None;
        }
        match self.state {
            PipState::Unsupported => {
                log::debug!("pip toggle ignored; not supported on this platform");
                None
            }
            PipState::Inactive => {
                self.transition_pending = true;
                Some(PipRequest::Start)
            }
            PipState::Active => {
                self.transition_pending = true;
                Some(PipRequest::Stop)
            }
        }
    }

    /// The floating surface is now showing.
    pub fn surface_started(&mut self) {
        if self.state != PipState::Unsupported {
            self.state = PipState::Active;
        }
        self.transition_pending = false;
    }

    /// The floating surface is gone. Also the resynchronization path when
    /// the platform ends it on its own (e.g. the user closes the floating
    /// window via its own chrome).
    pub fn surface_stopped(&mut self) {
        if self.state != PipState::Unsupported {
            self.state = PipState::Inactive;
        }
        self.transition_pending = false;
    }

    /// A requested transition failed to happen; state is unchanged.
    pub fn cancel_transition(&mut self) {
        self.transition_pending = false;
    }
}

/// Whether this platform can float a video surface right now.
pub fn pip_supported(cx: &App) -> bool {
    cx.primary_display().is_some()
}

/// The content of the floating window: just the shared video, edge to edge.
pub struct PipVideoView {
    video: Video,
}

impl PipVideoView {
    pub fn new(video: Video) -> Self {
        Self { video }
    }
}

impl Render for PipVideoView {
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .size_full()
            .bg(gpui::black())
            .child(video_surface(self.video.clone()).id("pip-video"))
    }
}

/// Open a borderless always-on-top window near the bottom-right of the
/// primary display, rendering `video` (a clone sharing the session's render
/// surface). Returns the window handle and its root view so the caller can
/// observe the view's release; `None` (logged) when the window cannot open.
pub fn open_pip_window(
    video: Video,
    cx: &mut App,
) -> Option<(WindowHandle<PipVideoView>, Entity<PipVideoView>)> {
    let (natural_width, natural_height) = video.size();
    let aspect = if natural_width > 0 && natural_height > 0 {
        natural_height as f32 / natural_width as f32
    } else {
        9.0 / 16.0
    };
    let window_size = size(px(PIP_WINDOW_WIDTH), px(PIP_WINDOW_WIDTH * aspect));

    let display = cx.primary_display()?;
    let display_bounds = display.bounds();
    let bounds = Bounds {
        origin: point(
            display_bounds.origin.x + display_bounds.size.width
                - window_size.width
                - px(PIP_WINDOW_MARGIN),
            display_bounds.origin.y + display_bounds.size.height
                - window_size.height
                - px(PIP_WINDOW_MARGIN),
        ),
        size: window_size,
    };

    let mut view_slot = None;
    match cx.open_window(
        WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(bounds)),
            titlebar: None,
            focus: false,
            kind: WindowKind::PopUp,
            is_movable: true,
            ..Default::default()
        },
        |_, cx| {
            let view = cx.new(|_| PipVideoView::new(video));
            view_slot = Some(view.clone());
            view
        },
    ) {
        Ok(handle) => view_slot.map(|view| (handle, view)),
        Err(err) => {
            log::error!("failed to open pip window: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_toggle_is_inert() {
        let mut pip = PipController::new(false);
        assert!(!pip.is_supported());

        assert_eq!(pip.request_toggle(), None);
        assert!(!pip.is_active());
        assert_eq!(pip.state(), PipState::Unsupported);
    }

    #[test]
    fn toggle_starts_then_stops() {
        let mut pip = PipController::new(true);

        assert_eq!(pip.request_toggle(), Some(PipRequest::Start));
        pip.surface_started();
        assert!(pip.is_active());

        assert_eq!(pip.request_toggle(), Some(PipRequest::Stop));
        pip.surface_stopped();
        assert!(!pip.is_active());
    }

    #[test]
    fn double_toggle_before_completion_is_coalesced() {
        let mut pip = PipController::new(true);

        assert_eq!(pip.request_toggle(), Some(PipRequest::Start));
        // Second toggle arrives before the surface reported in.
        assert_eq!(pip.request_toggle(), None);

        pip.surface_started();
        assert!(pip.is_active());

        // Same guard on the way down.
        assert_eq!(pip.request_toggle(), Some(PipRequest::Stop));
        assert_eq!(pip.request_toggle(), None);
        pip.surface_stopped();
        assert!(!pip.is_active());
    }

    #[test]
    fn failed_start_cancels_the_transition() {
        let mut pip = PipController::new(true);

        assert_eq!(pip.request_toggle(), Some(PipRequest::Start));
        pip.cancel_transition();
        assert!(!pip.is_active());

        // The next toggle tries again.
        assert_eq!(pip.request_toggle(), Some(PipRequest::Start));
    }

    #[test]
    fn platform_ending_pip_resyncs_to_inactive() {
        let mut pip = PipController::new(true);
        pip.request_toggle();
        pip.surface_started();

        // User closed the floating window via its own chrome.
        pip.surface_stopped();
        assert_eq!(pip.state(), PipState::Inactive);

        // A later toggle is a fresh start, not a double-stop.
        assert_eq!(pip.request_toggle(), Some(PipRequest::Start));
    }
}
