use macroquad::prelude::*;

use super::{fill_color, fit_text};

const ROW_HEIGHT: f32 = 28.0;
const FONT_SIZE: u16 = 16;

/// Single-choice selector that expands downwards
#[derive(Clone, Debug)]
pub struct Dropdown {
    x: f32,
    y: f32,
    width: f32,
    label: &'static str,
    items: Vec<String>,
    selected: usize,
    is_open: bool,
}

impl Dropdown {
    pub fn new(x: f32, y: f32, width: f32, label: &'static str, items: Vec<String>) -> Self {
        Self {
            x,
            y,
            width,
            label,
            items,
            selected: 0,
            is_open: false,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn set_selected(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = index;
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Row 0 is the header; rows 1.. are the open list
    fn row(&self, index: usize) -> Rect {
        Rect::new(self.x, self.y + index as f32 * ROW_HEIGHT, self.width, ROW_HEIGHT)
    }

    fn hovered_row(&self, mouse_pos: (f32, f32)) -> Option<usize> {
        let point = vec2(mouse_pos.0, mouse_pos.1);
        let rows = if self.is_open { self.items.len() + 1 } else { 1 };
        (0..rows).find(|&i| self.row(i).contains(point))
    }

    /// Handle a click; returns the item picked from the open list
    pub fn update(&mut self, mouse_pos: (f32, f32)) -> Option<usize> {
        if !is_mouse_button_pressed(MouseButton::Left) {
            return None;
        }
        match self.hovered_row(mouse_pos) {
            Some(0) => {
                self.is_open = !self.is_open;
                None
            }
            Some(row) => {
                self.is_open = false;
                self.selected = row - 1;
                Some(self.selected)
            }
            None => {
                self.is_open = false;
                None
            }
        }
    }

    pub fn draw(&self, mouse_pos: (f32, f32)) {
        let hovered = self.hovered_row(mouse_pos);
        draw_text(self.label, self.x, self.y - 5.0, 14.0, GRAY);

        let header = self.row(0);
        draw_rectangle(header.x, header.y, header.w, header.h, fill_color(hovered == Some(0)));
        draw_rectangle_lines(header.x, header.y, header.w, header.h, 2.0, WHITE);
        if let Some(item) = self.items.get(self.selected) {
            let text = fit_text(item, FONT_SIZE, self.width - 30.0);
            draw_text(&text, header.x + 5.0, header.y + 19.0, f32::from(FONT_SIZE), WHITE);
        }
        draw_text(if self.is_open { "^" } else { "v" }, header.x + header.w - 16.0, header.y + 19.0, 16.0, WHITE);

        if !self.is_open {
            return;
        }
        for (i, item) in self.items.iter().enumerate() {
            let row = self.row(i + 1);
            let color = if hovered == Some(i + 1) {
                fill_color(true)
            } else if i == self.selected {
                Color::from_rgba(50, 100, 150, 255)
            } else {
                Color::from_rgba(45, 45, 45, 255)
            };
            draw_rectangle(row.x, row.y, row.w, row.h, color);
            draw_rectangle_lines(row.x, row.y, row.w, row.h, 1.0, Color::from_rgba(80, 80, 80, 255));
            let text = fit_text(item, FONT_SIZE, self.width - 10.0);
            draw_text(&text, row.x + 5.0, row.y + 19.0, f32::from(FONT_SIZE), WHITE);
        }
    }
}
