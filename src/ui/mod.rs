use egui::{Color32, Visuals, style::Widgets};

pub mod live;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

const DEFAULT_WINDOW_TRANSPARENCY: u8 = 230;

pub(crate) fn default_visuals() -> Visuals {
    Visuals {
        dark_mode: true,
        hyperlink_color: PALETTE_MAROON,
        faint_bg_color: PALETTE_BLACK,
        extreme_bg_color: PALETTE_BROWN,
        panel_fill: PALETTE_BLACK,
        button_frame: true,
        window_fill: Color32::from_rgba_premultiplied(
            PALETTE_BLACK.r(),
            PALETTE_BLACK.g(),
            PALETTE_BLACK.b(),
            DEFAULT_WINDOW_TRANSPARENCY,
        ),
        widgets: Widgets::dark(),
        striped: true,
        ..Default::default()
    }
}

/// Linear blend from `start` (y = 0) to `end` (y = 1), y is clamped.
pub(crate) fn stroke_shade(start: Color32, end: Color32, y: f32) -> Color32 {
    let y = y.clamp(0., 1.);
    let channel = |from: u8, to: u8| (from as f32 + y * (to as f32 - from as f32)).round() as u8;
    Color32::from_rgb(
        channel(start.r(), end.r()),
        channel(start.g(), end.g()),
        channel(start.b(), end.b()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_shade_endpoints() {
        assert_eq!(stroke_shade(Color32::GREEN, Color32::RED, 0.), Color32::GREEN);
        assert_eq!(stroke_shade(Color32::GREEN, Color32::RED, 1.), Color32::RED);
        assert_eq!(stroke_shade(Color32::GREEN, Color32::RED, 7.), Color32::RED);
        assert_eq!(
            stroke_shade(Color32::BLACK, Color32::WHITE, 0.5),
            Color32::from_rgb(128, 128, 128)
        );
    }
}
