use gpui::{App, Application, Bounds, WindowBounds, WindowOptions, prelude::*, px, size};
use gpui_pip_player::PipDemo;

const DEFAULT_STREAM: &str = "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8";

fn main() {
    env_logger::init();

    let uri = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_STREAM.to_string());

    Application::new().run(move |cx: &mut App| {
        let bounds = Bounds::centered(None, size(px(800.0), px(600.0)), cx);
        let _ = cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                focus: true,
                ..Default::default()
            },
            |window, cx| cx.new(|cx| PipDemo::new(uri, window, cx)),
        );
        cx.activate(true);
    });
}
