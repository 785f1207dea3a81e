mod button;
mod dropdown;

pub use button::Button;
pub use dropdown::Dropdown;

use macroquad::prelude::*;

pub const PANEL_WIDTH: f32 = 190.0;
pub const BUTTON_HEIGHT: f32 = 34.0;

const IDLE: Color = Color::new(0.27, 0.51, 0.71, 1.0);
const HOVER: Color = Color::new(0.39, 0.58, 0.93, 1.0);

/// X position where the side panel starts
pub fn panel_x() -> f32 {
    screen_width() - PANEL_WIDTH
}

/// Size of the area the grid is drawn into
pub fn grid_viewport() -> (f32, f32) {
    (screen_width() - PANEL_WIDTH, screen_height())
}

/// Panel actions, in button order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelAction {
    PlayPause,
    Step,
    Clear,
    Randomize,
    Frame,
}

impl PanelAction {
    pub const ALL: [PanelAction; 5] = [
        PanelAction::PlayPause,
        PanelAction::Step,
        PanelAction::Clear,
        PanelAction::Randomize,
        PanelAction::Frame,
    ];

    fn label(&self) -> &'static str {
        match self {
            PanelAction::PlayPause => "Play/Pause",
            PanelAction::Step => "Step",
            PanelAction::Clear => "Clear",
            PanelAction::Randomize => "Random",
            PanelAction::Frame => "Fit pattern",
        }
    }
}

/// Buttons for every panel action, stacked from `top`
pub fn create_buttons(top: f32) -> Vec<(PanelAction, Button)> {
    let px = panel_x() + 5.0;
    PanelAction::ALL
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let y = top + i as f32 * (BUTTON_HEIGHT + 6.0);
            (*action, Button::new(Rect::new(px, y, PANEL_WIDTH - 10.0, BUTTON_HEIGHT), action.label()))
        })
        .collect()
}

/// Shorten `text` with an ellipsis until it fits `max_width`
fn fit_text(text: &str, font_size: u16, max_width: f32) -> String {
    if measure_text(text, None, font_size, 1.0).width <= max_width {
        return text.to_string();
    }
    let mut shortened: String = text.to_string();
    while !shortened.is_empty() {
        shortened.pop();
        let candidate = format!("{shortened}...");
        if measure_text(&candidate, None, font_size, 1.0).width <= max_width {
            return candidate;
        }
    }
    "...".to_string()
}

fn fill_color(hovered: bool) -> Color {
    if hovered { HOVER } else { IDLE }
}
