use macroquad::prelude::*;

use crate::application::{Camera, EvolutionStatus, TemporalSnapshot};
use crate::domain::{CellState, Coordinate, Pattern};
use crate::ui::{Button, Dropdown, PANEL_WIDTH, panel_x};

const ALIVE: Color = Color::new(0.0, 1.0, 0.59, 1.0);
const GRID_LINE: Color = Color::new(0.16, 0.16, 0.16, 1.0);

/// Format large numbers with K/M/B suffixes
pub fn format_number(n: u64) -> String {
    let n_f = n as f64;
    if n >= 1_000_000_000 {
        format!("{:.1}B", n_f / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n_f / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n_f / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Draw the alive cells that fall inside the viewport
pub fn draw_cells(cell_state: &CellState, camera: &Camera, viewport: (f32, f32), cell_size: f32) {
    let size = (cell_size * camera.zoom).max(1.0);
    let visible = camera.visible_bounds(viewport.0, viewport.1, cell_size);

    if size >= 6.0 {
        draw_grid_lines(camera, viewport, cell_size);
    }

    cell_state.for_each_alive(|cell| {
        if !visible.contains(cell) {
            return;
        }
        let (x, y) = camera.cell_to_screen(cell, cell_size);
        draw_rectangle(x, y, size, size, ALIVE);
    });
}

fn draw_grid_lines(camera: &Camera, viewport: (f32, f32), cell_size: f32) {
    let visible = camera.visible_bounds(viewport.0, viewport.1, cell_size);
    for x in visible.min.x..=visible.max.x {
        let (sx, _) = camera.cell_to_screen(Coordinate::new(x, 0), cell_size);
        draw_line(sx, 0.0, sx, viewport.1, 1.0, GRID_LINE);
    }
    for y in visible.min.y..=visible.max.y {
        let (_, sy) = camera.cell_to_screen(Coordinate::new(0, y), cell_size);
        draw_line(0.0, sy, viewport.0, sy, 1.0, GRID_LINE);
    }
}

/// Semi-transparent ghost of a pattern centred on the cursor
pub fn draw_pattern_preview(pattern: &Pattern, camera: &Camera, mouse_pos: (f32, f32), cell_size: f32) {
    let size = cell_size * camera.zoom;
    let Some(ghost) = pattern.placed_at(preview_origin(pattern, camera, mouse_pos, cell_size)) else {
        return;
    };

    ghost.for_each_alive(|cell| {
        let (x, y) = camera.cell_to_screen(cell, cell_size);
        draw_rectangle(x, y, size, size, Color::from_rgba(0, 255, 150, 120));
        draw_rectangle_lines(x, y, size, size, 1.5, Color::from_rgba(0, 255, 150, 200));
    });

    if let Some(bounds) = ghost.bounding_box() {
        let (x, y) = camera.cell_to_screen(bounds.min, cell_size);
        draw_rectangle_lines(
            x,
            y,
            bounds.width() as f32 * size,
            bounds.height() as f32 * size,
            2.0,
            Color::from_rgba(255, 255, 0, 180),
        );
    }
}

/// Where a pattern's anchor lands so that it is centred on the cursor
pub fn preview_origin(
    pattern: &Pattern,
    camera: &Camera,
    mouse_pos: (f32, f32),
    cell_size: f32,
) -> Coordinate {
    let cursor = camera.screen_to_cell(mouse_pos.0, mouse_pos.1, cell_size);
    let Some(bounds) = pattern.cell_state().bounding_box() else {
        return cursor;
    };
    let half_w = (bounds.width() / 2) as i32;
    let half_h = (bounds.height() / 2) as i32;
    Coordinate::new(cursor.x.saturating_sub(half_w), cursor.y.saturating_sub(half_h))
}

/// Side panel: widgets, session status and key help
pub fn draw_panel(
    snapshot: &TemporalSnapshot,
    algorithm_name: &str,
    camera: &Camera,
    buttons: &[Button],
    dropdowns: &[&Dropdown],
    mouse_pos: (f32, f32),
) {
    let px = panel_x() + 5.0;
    draw_rectangle(panel_x(), 0.0, PANEL_WIDTH, screen_height(), Color::from_rgba(30, 30, 30, 255));
    buttons.iter().for_each(|button| button.draw(mouse_pos));

    let (status, status_color) = match snapshot.status {
        EvolutionStatus::Paused => ("Paused".to_string(), ORANGE),
        EvolutionStatus::Running {
            average_generations_per_second,
        } => (
            format!("Running {average_generations_per_second:.1} gen/s"),
            GREEN,
        ),
    };

    let population = format_number(snapshot.cell_state.population());
    let generation = snapshot.generation.to_string();
    let target = format!(
        "{:.1} steps/s x {}",
        snapshot.target_steps_per_second, snapshot.generations_per_step
    );
    let zoom = format!("{:.2}x", camera.zoom);
    let fps = format!("{algorithm_name} | FPS {}", get_fps());

    let labels: [(&str, f32, f32, Color); 12] = [
        ("Status:", 350.0, 16.0, WHITE),
        (&status, 368.0, 15.0, status_color),
        ("Generation:", 395.0, 16.0, WHITE),
        (&generation, 415.0, 20.0, ALIVE),
        ("Population:", 442.0, 16.0, WHITE),
        (&population, 460.0, 15.0, LIGHTGRAY),
        ("Target:", 487.0, 16.0, WHITE),
        (&target, 505.0, 14.0, LIGHTGRAY),
        ("Zoom:", 532.0, 16.0, WHITE),
        (&zoom, 550.0, 14.0, LIGHTGRAY),
        (&fps, 577.0, 13.0, GRAY),
        ("Space play | N step | Up/Down speed", 600.0, 11.0, GRAY),
    ];
    for (text, y, size, color) in labels {
        draw_text(text, px, y, size, color);
    }
    let help = [
        "+/- gens per step | A algorithm",
        "LMB toggle (paused) | RMB drag pan",
        "Wheel zoom | H fit | C clear | R random",
    ];
    for (i, text) in help.iter().enumerate() {
        draw_text(text, px, 615.0 + i as f32 * 15.0, 11.0, GRAY);
    }

    // Open dropdown last so its list covers the rest
    let (open, closed): (Vec<&Dropdown>, Vec<&Dropdown>) =
        dropdowns.iter().copied().partition(|d| d.is_open());
    closed.iter().chain(open.iter()).for_each(|d| d.draw(mouse_pos));
}
