use crate::geometry::{self, BoundsProbe, WindowFit, WindowHost};
use crate::overlay::overlay_badge;
use crate::pip::{self, PipController, PipRequest, PipVideoView};
use crate::session::MediaSession;
use crate::element::video_surface;
use gpui::{Bounds, Context, Pixels, Window, WindowHandle, div, prelude::*, px, rgb};
use std::time::Duration;

/// How long after load the one-shot window fit waits for the natural size to
/// settle before firing. No readiness event is modeled; if the size is still
/// unknown when the timer fires, the fit is skipped.
const FIT_SETTLE: Duration = Duration::from_millis(500);

/// Applies geometry decisions through the window the view lives in.
struct GpuiWindowHost<'a>(&'a mut Window);

impl WindowHost for GpuiWindowHost<'_> {
    fn frame(&self) -> Bounds<Pixels> {
        self.0.bounds()
    }

    fn set_frame(&mut self, frame: Bounds<Pixels>) {
        self.0.resize(frame.size);
    }
}

/// The demo's single window: control strip, letterboxed video with overlay
/// badge and status readout, and the pip toggle.
pub struct PipDemo {
    session: MediaSession,
    pip: PipController,
    pip_window: Option<WindowHandle<PipVideoView>>,
    video_bounds: BoundsProbe,
    window_fit: WindowFit,
}

impl PipDemo {
    pub fn new(uri: impl Into<String>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let mut session = MediaSession::new(uri);
        session.load();

        let pip = PipController::new(pip::pip_supported(cx));

        // One-shot deferred window fit. Skipped automatically if the view is
        // torn down before the timer fires.
        cx.spawn_in(window, async move |this, cx| {
            cx.background_executor().timer(FIT_SETTLE).await;
            this.update_in(cx, |this, window, cx| {
                this.fit_window_to_video(window, cx);
            })
            .ok();
        })
        .detach();

        Self {
            session,
            pip,
            pip_window: None,
            video_bounds: BoundsProbe::new(),
            window_fit: WindowFit::new(),
        }
    }

    fn fit_window_to_video(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let natural = self.session.natural_size();
        let display = window.display(cx).map(|display| display.bounds());
        let mut host = GpuiWindowHost(window);
        if self.window_fit.fire(natural, display, &mut host) {
            cx.notify();
        }
    }

    fn toggle_pip(&mut self, cx: &mut Context<Self>) {
        let Some(request) = self.pip.request_toggle() else {
            return;
        };

        match request {
            PipRequest::Start => {
                let Some(video) = self.session.source().cloned() else {
                    self.pip.cancel_transition();
                    return;
                };
                match pip::open_pip_window(video, cx) {
                    Some((handle, view)) => {
                        // Resync if the floating window goes away on its own
                        // (e.g. closed via its own chrome).
                        cx.observe_release(&view, |this, _view, cx| {
                            this.pip_window = None;
                            this.pip.surface_stopped();
                            cx.notify();
                        })
                        .detach();

                        self.pip_window = Some(handle);
                        self.pip.surface_started();
                    }
                    None => self.pip.cancel_transition(),
                }
            }
            PipRequest::Stop => {
                if let Some(handle) = self.pip_window.take() {
                    let _ = handle.update(cx, |_, window, _| window.remove_window());
                }
                self.pip.surface_stopped();
            }
        }
        cx.notify();
    }
}

impl Render for PipDemo {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let status = self.session.status();
        let pip_label = if !self.pip.is_supported() {
            "PiP Unavailable"
        } else if self.pip.is_active() {
            "Exit PiP"
        } else {
            "Enter PiP"
        };

        let button = |id: &'static str, label: &'static str| {
            div()
                .id(id)
                .px_3()
                .py_2()
                .bg(rgb(0x404040))
                .rounded_md()
                .cursor_pointer()
                .child(label)
        };

        let controls = div()
            .h(px(60.0))
            .w_full()
            .bg(rgb(0x1e1e1e))
            .text_color(rgb(0xcccccc))
            .flex()
            .items_center()
            .px_4()
            .gap_4()
            .child(
                button("btn-play", "Play").on_click(cx.listener(|this, _, _window, cx| {
                    this.session.play();
                    cx.notify();
                })),
            )
            .child(
                button("btn-pause", "Pause").on_click(cx.listener(|this, _, _window, cx| {
                    this.session.pause();
                    cx.notify();
                })),
            )
            .child(
                button("btn-restart", "Restart").on_click(cx.listener(|this, _, _window, cx| {
                    this.session.restart();
                    cx.notify();
                })),
            )
            .child(
                button("btn-pip", pip_label)
                    .on_click(cx.listener(|this, _, _window, cx| this.toggle_pip(cx))),
            );

        let mut video_area = div().relative().flex_1().bg(gpui::black());

        if let Some(video) = self.session.source().cloned() {
            video_area = video_area.child(
                video_surface(video)
                    .id("main-video")
                    .probe(self.video_bounds.clone()),
            );
        }

        // Decorative overlay, centered on the video surface. No handlers, so
        // clicks fall through to the controls beneath.
        video_area = video_area.child(
            div()
                .absolute()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .child(overlay_badge("gpui-pip-player")),
        );

        // The status readout stays hidden until the first layout pass has
        // produced real video bounds.
        if let Some(bounds) = self.video_bounds.get() {
            let strip = geometry::status_strip(bounds);
            video_area = video_area.child(
                div()
                    .absolute()
                    .left(strip.origin.x)
                    .top(strip.origin.y)
                    .w(strip.size.width)
                    .h(strip.size.height)
                    .bg(gpui::rgba(0x000000cc))
                    .text_color(gpui::white())
                    .text_sm()
                    .flex()
                    .items_center()
                    .justify_center()
                    .child(status),
            );
        }

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(rgb(0x2d2d2d))
            .child(controls)
            .child(video_area)
    }
}
