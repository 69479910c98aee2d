use gpui::{IntoElement, ParentElement, SharedString, Styled, div, px};

/// A small decorative badge composited over the video surface.
///
/// Attached once and left alone: it has no transport or pip state and no
/// event handlers, so pointer input falls through to whatever sits beneath.
pub fn overlay_badge(text: impl Into<SharedString>) -> impl IntoElement {
    div()
        .px(px(10.0))
        .py(px(10.0))
        .bg(gpui::rgba(0x00000080))
        .text_color(gpui::white())
        .rounded_md()
        .child(text.into())
}
