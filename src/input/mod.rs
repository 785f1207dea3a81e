use macroquad::prelude::*;

use crate::application::{Camera, StateError, TemporalGameOfLifeState};
use crate::domain::Coordinate;

const MIN_STEPS_PER_SECOND: f64 = 0.5;
const MAX_STEPS_PER_SECOND: f64 = 240.0;
const MAX_GENERATIONS_PER_STEP: u32 = 1 << 20;

/// A user request decoded from keyboard or mouse input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleRunning,
    Step,
    Clear,
    Randomize,
    FrameView,
    SpeedUp,
    SlowDown,
    MoreGenerations,
    FewerGenerations,
    CycleAlgorithm,
    Save,
    ToggleCell(Coordinate),
}

/// Commands for the keys pressed this frame
pub fn keyboard_commands() -> Vec<Command> {
    let bindings = [
        (KeyCode::Space, Command::ToggleRunning),
        (KeyCode::N, Command::Step),
        (KeyCode::C, Command::Clear),
        (KeyCode::R, Command::Randomize),
        (KeyCode::H, Command::FrameView),
        (KeyCode::Up, Command::SpeedUp),
        (KeyCode::Down, Command::SlowDown),
        (KeyCode::Equal, Command::MoreGenerations),
        (KeyCode::KpAdd, Command::MoreGenerations),
        (KeyCode::Minus, Command::FewerGenerations),
        (KeyCode::KpSubtract, Command::FewerGenerations),
        (KeyCode::A, Command::CycleAlgorithm),
        (KeyCode::S, Command::Save),
    ];
    bindings
        .iter()
        .filter(|(key, _)| is_key_pressed(*key))
        .map(|(_, command)| *command)
        .collect()
}

/// A left click on the grid toggles the cell under the cursor
pub fn cell_click(camera: &Camera, mouse_pos: (f32, f32), viewport: (f32, f32), cell_size: f32) -> Option<Command> {
    let on_grid = mouse_pos.0 < viewport.0 && mouse_pos.1 < viewport.1;
    if !on_grid || !is_mouse_button_pressed(MouseButton::Left) {
        return None;
    }
    Some(Command::ToggleCell(camera.screen_to_cell(mouse_pos.0, mouse_pos.1, cell_size)))
}

/// Zoom around the cursor with the mouse wheel
pub fn handle_zoom(camera: &mut Camera, mouse_pos: (f32, f32)) {
    let wheel = mouse_wheel().1;
    if wheel > 0.0 {
        camera.zoom_at(1.1, mouse_pos);
    } else if wheel < 0.0 {
        camera.zoom_at(1.0 / 1.1, mouse_pos);
    }
}

/// Drag-to-pan with the right or middle mouse button
#[derive(Debug, Default)]
pub struct PanDrag {
    last: Option<(f32, f32)>,
}

impl PanDrag {
    pub fn update(&mut self, camera: &mut Camera, mouse_pos: (f32, f32)) {
        let held = is_mouse_button_down(MouseButton::Right) || is_mouse_button_down(MouseButton::Middle);
        self.drag(camera, mouse_pos, held);
    }

    fn drag(&mut self, camera: &mut Camera, mouse_pos: (f32, f32), held: bool) {
        if !held {
            self.last = None;
            return;
        }
        if let Some((x, y)) = self.last {
            camera.pan(mouse_pos.0 - x, mouse_pos.1 - y);
        }
        self.last = Some(mouse_pos);
    }
}

pub fn faster(steps_per_second: f64) -> f64 {
    (steps_per_second * 1.5).min(MAX_STEPS_PER_SECOND)
}

pub fn slower(steps_per_second: f64) -> f64 {
    (steps_per_second / 1.5).max(MIN_STEPS_PER_SECOND)
}

/// Apply a command that only touches session settings.
/// Returns `false` for commands the caller must handle itself.
pub fn apply_setting(state: &TemporalGameOfLifeState, command: Command) -> Result<bool, StateError> {
    match command {
        Command::ToggleRunning => state.toggle_running(),
        Command::SpeedUp => state.set_target_steps_per_second(faster(state.target_steps_per_second()))?,
        Command::SlowDown => state.set_target_steps_per_second(slower(state.target_steps_per_second()))?,
        Command::MoreGenerations => state.set_generations_per_step(
            state.generations_per_step().saturating_mul(2).min(MAX_GENERATIONS_PER_STEP),
        )?,
        Command::FewerGenerations => {
            state.set_generations_per_step((state.generations_per_step() / 2).max(1))?
        }
        Command::ToggleCell(cell) => {
            if state.is_running() {
                return Ok(true);
            }
            state.update_cell_state(|cells| cells.with_cell(cell, !cells.contains(cell)));
        }
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellState;

    #[test]
    fn test_speed_is_bounded() {
        assert_eq!(faster(60.0), 90.0);
        assert_eq!(faster(200.0), MAX_STEPS_PER_SECOND);
        assert_eq!(slower(0.6), MIN_STEPS_PER_SECOND);
    }

    #[test]
    fn test_generation_batch_doubles_and_halves() {
        let state = TemporalGameOfLifeState::default();
        assert_eq!(apply_setting(&state, Command::MoreGenerations), Ok(true));
        assert_eq!(apply_setting(&state, Command::MoreGenerations), Ok(true));
        assert_eq!(state.generations_per_step(), 4);
        for _ in 0..5 {
            apply_setting(&state, Command::FewerGenerations).unwrap();
        }
        assert_eq!(state.generations_per_step(), 1);
    }

    #[test]
    fn test_toggle_cell_only_while_paused() {
        let state = TemporalGameOfLifeState::new(CellState::empty());
        let cell = Coordinate::new(-4, 9);
        apply_setting(&state, Command::ToggleCell(cell)).unwrap();
        assert!(state.cell_state().contains(cell));
        apply_setting(&state, Command::ToggleCell(cell)).unwrap();
        assert!(state.cell_state().is_empty());

        state.set_is_running(true);
        apply_setting(&state, Command::ToggleCell(cell)).unwrap();
        assert!(state.cell_state().is_empty());
    }

    #[test]
    fn test_unhandled_commands_are_reported() {
        let state = TemporalGameOfLifeState::default();
        assert_eq!(apply_setting(&state, Command::Clear), Ok(false));
        assert_eq!(apply_setting(&state, Command::CycleAlgorithm), Ok(false));
    }

    #[test]
    fn test_pan_drag_follows_mouse() {
        let mut camera = Camera::new();
        let mut drag = PanDrag::default();
        drag.drag(&mut camera, (10.0, 10.0), true);
        drag.drag(&mut camera, (25.0, 5.0), true);
        assert_eq!((camera.offset_x, camera.offset_y), (15.0, -5.0));
        drag.drag(&mut camera, (100.0, 100.0), false);
        drag.drag(&mut camera, (110.0, 100.0), true);
        assert_eq!((camera.offset_x, camera.offset_y), (15.0, -5.0));
    }
}
