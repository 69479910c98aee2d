use crate::geometry::{BoundsProbe, letterbox};
use crate::video::Video;
use gpui::{
    Element, ElementId, GlobalElementId, InspectorElementId, IntoElement, LayoutId, Window, point,
    px, relative, size,
};
use yuv::{YuvBiPlanarImage, YuvConversionMode, YuvRange, YuvStandardMatrix, yuv_nv12_to_rgba};

/// A GPUI element that paints the current video frame letterboxed into its
/// bounds, preserving the video's natural aspect ratio.
pub struct VideoElement {
    video: Video,
    probe: Option<BoundsProbe>,
    element_id: Option<ElementId>,
}

impl VideoElement {
    pub fn new(video: Video) -> Self {
        Self {
            video,
            probe: None,
            element_id: None,
        }
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Report the displayed video bounds (relative to this element) into
    /// `probe` on every paint pass.
    pub fn probe(mut self, probe: BoundsProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Convert an NV12 frame to RGBA, falling back through the common
    /// colorimetry variants.
    fn yuv_to_rgba(&self, yuv_data: &[u8], width: u32, height: u32) -> Vec<u8> {
        let width_usize = width as usize;
        let height_usize = height as usize;
        let y_size = width_usize * height_usize;
        let uv_size = (width_usize * height_usize) / 2;

        if yuv_data.len() < y_size + uv_size {
            // Not enough data, return a black frame.
            return vec![0; width_usize * height_usize * 4];
        }

        let yuv_bi_planar = YuvBiPlanarImage {
            y_plane: &yuv_data[..y_size],
            y_stride: width,
            uv_plane: &yuv_data[y_size..y_size + uv_size],
            uv_stride: width, // NV12 UV stride matches width
            width,
            height,
        };

        let mut rgba = vec![0u8; width_usize * height_usize * 4];
        let rgba_stride = width * 4;

        for (range, matrix) in [
            (YuvRange::Full, YuvStandardMatrix::Bt709),
            (YuvRange::Limited, YuvStandardMatrix::Bt709),
            (YuvRange::Limited, YuvStandardMatrix::Bt601),
        ] {
            if yuv_nv12_to_rgba(
                &yuv_bi_planar,
                &mut rgba,
                rgba_stride,
                range,
                matrix,
                YuvConversionMode::Balanced,
            )
            .is_ok()
            {
                return rgba;
            }
        }

        // Conversion failed outright; show black.
        vec![0; width_usize * height_usize * 4]
    }
}

impl Element for VideoElement {
    type RequestLayoutState = ();
    type PrepaintState = ();

    fn id(&self) -> Option<ElementId> {
        self.element_id.clone()
    }

    fn source_location(&self) -> Option<&'static core::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        window: &mut Window,
        cx: &mut gpui::App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        // Fill the container; letterboxing happens at paint time.
        let style = gpui::Style {
            size: gpui::Size {
                width: relative(1.0).into(),
                height: relative(1.0).into(),
            },
            ..Default::default()
        };

        let layout_id = window.request_layout(style, [], cx);
        (layout_id, ())
    }

    fn prepaint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        _bounds: gpui::Bounds<gpui::Pixels>,
        _request_layout_state: &mut Self::RequestLayoutState,
        window: &mut Window,
        _cx: &mut gpui::App,
    ) -> Self::PrepaintState {
        self.video.poll_bus();

        // Schedule repaints only while playing or when a new frame arrived.
        let is_playing = !self.video.eos() && !self.video.paused();
        let has_new_frame = self.video.take_frame_ready();
        if is_playing || has_new_frame {
            window.request_animation_frame();
        }
    }

    fn paint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        bounds: gpui::Bounds<gpui::Pixels>,
        _request_layout_state: &mut Self::RequestLayoutState,
        _prepaint_state: &mut Self::PrepaintState,
        window: &mut Window,
        _cx: &mut gpui::App,
    ) {
        let (natural_width, natural_height) = self.video.size();
        let natural = size(px(natural_width as f32), px(natural_height as f32));

        // Video bounds relative to this element; what the geometry layer and
        // the status readout work from.
        let local = letterbox(
            natural,
            gpui::Bounds {
                origin: point(px(0.0), px(0.0)),
                size: bounds.size,
            },
        );
        if let Some(probe) = &self.probe {
            probe.record(local);
        }

        let video_bounds = gpui::Bounds {
            origin: bounds.origin + local.origin,
            size: local.size,
        };

        if let Some((yuv_data, frame_width, frame_height)) = self.video.current_frame_data() {
            let rgba_data = self.yuv_to_rgba(&yuv_data, frame_width, frame_height);

            use image::{ImageBuffer, Rgba};
            use smallvec::SmallVec;

            if let Some(image_buffer) =
                ImageBuffer::<Rgba<u8>, _>::from_raw(frame_width, frame_height, rgba_data)
            {
                let frames: SmallVec<[image::Frame; 1]> =
                    SmallVec::from_elem(image::Frame::new(image_buffer), 1);
                let render_image = std::sync::Arc::new(gpui::RenderImage::new(frames));

                window
                    .paint_image(
                        video_bounds,
                        gpui::Corners::default(),
                        render_image,
                        0,     // frame index
                        false, // grayscale
                    )
                    .ok();
            }
        }
    }
}

impl IntoElement for VideoElement {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

/// Helper function to create a video surface element.
pub fn video_surface(video: Video) -> VideoElement {
    VideoElement::new(video)
}
