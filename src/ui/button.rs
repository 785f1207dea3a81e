use macroquad::prelude::*;

use super::fill_color;

/// Clickable panel button
#[derive(Clone, Debug)]
pub struct Button {
    bounds: Rect,
    text: &'static str,
}

impl Button {
    pub fn new(bounds: Rect, text: &'static str) -> Self {
        Self { bounds, text }
    }

    pub fn is_hovered(&self, mouse_pos: (f32, f32)) -> bool {
        self.bounds.contains(vec2(mouse_pos.0, mouse_pos.1))
    }

    pub fn is_clicked(&self, mouse_pos: (f32, f32)) -> bool {
        self.is_hovered(mouse_pos) && is_mouse_button_pressed(MouseButton::Left)
    }

    pub fn draw(&self, mouse_pos: (f32, f32)) {
        let Rect { x, y, w, h } = self.bounds;
        draw_rectangle(x, y, w, h, fill_color(self.is_hovered(mouse_pos)));
        draw_rectangle_lines(x, y, w, h, 2.0, WHITE);

        let size = measure_text(self.text, None, 18, 1.0);
        draw_text(self.text, x + (w - size.width) / 2.0, y + (h + size.height) / 2.0, 18.0, WHITE);
    }
}
