use gpui::{Bounds, Pixels, Size, point, px, size};
use parking_lot::Mutex;
use std::sync::Arc;

/// Height of the status readout strip.
pub const STATUS_STRIP_HEIGHT: f32 = 20.0;

/// Gap between the strip and the bottom edge of the video.
pub const STATUS_STRIP_MARGIN: f32 = 10.0;

/// Fit `natural` into `container` preserving aspect ratio (contain fit),
/// centered. The returned bounds are the region actually covered by video
/// pixels; the rest of the container is letterboxing.
pub fn letterbox(natural: Size<Pixels>, container: Bounds<Pixels>) -> Bounds<Pixels> {
    if f32::from(natural.width) <= 0.0 || f32::from(natural.height) <= 0.0 {
        return container;
    }

    let scale = (container.size.width / natural.width)
        .min(container.size.height / natural.height);
    let width = px(f32::from(natural.width) * scale);
    let height = px(f32::from(natural.height) * scale);

    Bounds {
        origin: point(
            container.origin.x + px((f32::from(container.size.width) - f32::from(width)) / 2.0),
            container.origin.y + px((f32::from(container.size.height) - f32::from(height)) / 2.0),
        ),
        size: size(width, height),
    }
}

/// Placement of the status readout: full video width, fixed height, pinned a
/// fixed margin above the bottom edge of the displayed video.
pub fn status_strip(video_bounds: Bounds<Pixels>) -> Bounds<Pixels> {
    Bounds {
        origin: point(
            video_bounds.origin.x,
            video_bounds.origin.y + video_bounds.size.height
                - px(STATUS_STRIP_HEIGHT + STATUS_STRIP_MARGIN),
        ),
        size: size(video_bounds.size.width, px(STATUS_STRIP_HEIGHT)),
    }
}

/// A window frame of exactly `natural` size, centered on `display`.
pub fn centered_frame(display: Bounds<Pixels>, natural: Size<Pixels>) -> Bounds<Pixels> {
    Bounds {
        origin: point(
            display.origin.x + px((f32::from(display.size.width) - f32::from(natural.width)) / 2.0),
            display.origin.y + px((f32::from(display.size.height) - f32::from(natural.height)) / 2.0),
        ),
        size: natural,
    }
}

/// Shared cell the video element writes on every paint pass with the
/// displayed video bounds, relative to the element's own origin.
///
/// Starts empty; consumers treat "no value yet" as "no frame laid out yet"
/// and keep dependent widgets hidden.
#[derive(Debug, Clone, Default)]
pub struct BoundsProbe(Arc<Mutex<Option<Bounds<Pixels>>>>);

impl BoundsProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, bounds: Bounds<Pixels>) {
        *self.0.lock() = Some(bounds);
    }

    pub fn get(&self) -> Option<Bounds<Pixels>> {
        *self.0.lock()
    }
}

/// The window/shell primitives the geometry code is allowed to call.
pub trait WindowHost {
    fn frame(&self) -> Bounds<Pixels>;
    fn set_frame(&mut self, frame: Bounds<Pixels>);
}

/// One-shot window fit: after load, resize the top-level window to the
/// video's natural pixel size, centered on its display.
///
/// Fires at most once. If the natural size is still unknown at fire time the
/// shot is spent anyway and nothing is resized; later user resizes are never
/// overridden.
#[derive(Debug, Default)]
pub struct WindowFit {
    fired: bool,
}

impl WindowFit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the window frame was actually changed.
    pub fn fire(
        &mut self,
        natural: Option<Size<Pixels>>,
        display: Option<Bounds<Pixels>>,
        host: &mut dyn WindowHost,
    ) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;

        let Some(natural) = natural else {
            log::debug!("natural size unknown at fit time; leaving window frame alone");
            return false;
        };

        let frame = match display {
            Some(display) => centered_frame(display, natural),
            None => Bounds {
                origin: host.frame().origin,
                size: natural,
            },
        };
        host.set_frame(frame);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(x: f32, y: f32, w: f32, h: f32) -> Bounds<Pixels> {
        Bounds {
            origin: point(px(x), px(y)),
            size: size(px(w), px(h)),
        }
    }

    #[derive(Default)]
    struct FakeHost {
        frame: Bounds<Pixels>,
        set_count: usize,
    }

    impl WindowHost for FakeHost {
        fn frame(&self) -> Bounds<Pixels> {
            self.frame
        }

        fn set_frame(&mut self, frame: Bounds<Pixels>) {
            self.frame = frame;
            self.set_count += 1;
        }
    }

    #[test]
    fn letterbox_pillarboxes_tall_container() {
        let video = letterbox(size(px(1920.0), px(1080.0)), bounds(0.0, 0.0, 800.0, 800.0));
        assert_eq!(video, bounds(0.0, 175.0, 800.0, 450.0));
    }

    #[test]
    fn letterbox_sidebars_wide_container() {
        let video = letterbox(size(px(100.0), px(100.0)), bounds(0.0, 0.0, 300.0, 100.0));
        assert_eq!(video, bounds(100.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn letterbox_exact_fit_fills_container() {
        let container = bounds(10.0, 20.0, 640.0, 360.0);
        let video = letterbox(size(px(1280.0), px(720.0)), container);
        assert_eq!(video, container);
    }

    #[test]
    fn letterbox_degenerate_natural_size_returns_container() {
        let container = bounds(0.0, 0.0, 640.0, 480.0);
        assert_eq!(letterbox(size(px(0.0), px(0.0)), container), container);
    }

    #[test]
    fn status_strip_spans_video_above_bottom_edge() {
        let strip = status_strip(bounds(100.0, 175.0, 800.0, 450.0));
        assert_eq!(strip, bounds(100.0, 595.0, 800.0, 20.0));
    }

    #[test]
    fn centered_frame_centers_on_display() {
        let frame = centered_frame(bounds(0.0, 0.0, 2560.0, 1440.0), size(px(1920.0), px(1080.0)));
        assert_eq!(frame, bounds(320.0, 180.0, 1920.0, 1080.0));
    }

    #[test]
    fn probe_starts_empty_then_holds_last_record() {
        let probe = BoundsProbe::new();
        assert_eq!(probe.get(), None);

        probe.record(bounds(0.0, 0.0, 10.0, 10.0));
        probe.record(bounds(1.0, 2.0, 3.0, 4.0));
        assert_eq!(probe.get(), Some(bounds(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn window_fit_fires_at_most_once() {
        let mut fit = WindowFit::new();
        let mut host = FakeHost {
            frame: bounds(0.0, 0.0, 800.0, 600.0),
            ..Default::default()
        };
        let display = Some(bounds(0.0, 0.0, 2560.0, 1440.0));
        let natural = Some(size(px(1280.0), px(720.0)));

        assert!(fit.fire(natural, display, &mut host));
        assert_eq!(host.frame, bounds(640.0, 360.0, 1280.0, 720.0));

        assert!(!fit.fire(natural, display, &mut host));
        assert_eq!(host.set_count, 1);
    }

    #[test]
    fn window_fit_with_unknown_natural_size_spends_the_shot() {
        let mut fit = WindowFit::new();
        let mut host = FakeHost::default();

        assert!(!fit.fire(None, None, &mut host));
        assert_eq!(host.set_count, 0);

        // No retry even once the size becomes known.
        assert!(!fit.fire(Some(size(px(640.0), px(480.0))), None, &mut host));
        assert_eq!(host.set_count, 0);
    }

    #[test]
    fn window_fit_without_display_keeps_origin() {
        let mut fit = WindowFit::new();
        let mut host = FakeHost {
            frame: bounds(40.0, 50.0, 800.0, 600.0),
            ..Default::default()
        };

        assert!(fit.fire(Some(size(px(320.0), px(240.0))), None, &mut host));
        assert_eq!(host.frame, bounds(40.0, 50.0, 320.0, 240.0));
    }
}
