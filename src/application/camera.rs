use crate::domain::{CellRect, Coordinate};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 10.0;

/// Viewport over the unbounded grid.
///
/// A cell at `(x, y)` is drawn at `x * cell_size * zoom + offset_x` (and
/// likewise for `y`), so negative coordinates are reachable by panning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub offset_x: f32,
    pub offset_y: f32,
    pub zoom: f32, // 1.0 = one cell_size per cell
}

impl Camera {
    pub fn new() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }

    pub fn zoom_in(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_out(&mut self, factor: f32) {
        self.zoom = (self.zoom / factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom by `factor` while keeping the grid point under `anchor` in place
    pub fn zoom_at(&mut self, factor: f32, anchor: (f32, f32)) {
        let before = self.zoom;
        self.zoom_in(factor);
        let ratio = self.zoom / before;
        self.offset_x = anchor.0 - (anchor.0 - self.offset_x) * ratio;
        self.offset_y = anchor.1 - (anchor.1 - self.offset_y) * ratio;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Cell under a screen point
    pub fn screen_to_cell(&self, screen_x: f32, screen_y: f32, cell_size: f32) -> Coordinate {
        let scale = cell_size * self.zoom;
        let x = ((screen_x - self.offset_x) / scale).floor();
        let y = ((screen_y - self.offset_y) / scale).floor();
        // `as` saturates at the i32 range for far-away points
        Coordinate::new(x as i32, y as i32)
    }

    /// Top-left screen corner of a cell
    pub fn cell_to_screen(&self, cell: Coordinate, cell_size: f32) -> (f32, f32) {
        let scale = cell_size * self.zoom;
        (
            cell.x as f32 * scale + self.offset_x,
            cell.y as f32 * scale + self.offset_y,
        )
    }

    /// Cells at least partly inside a viewport, for culling
    pub fn visible_bounds(&self, viewport_width: f32, viewport_height: f32, cell_size: f32) -> CellRect {
        CellRect::new(
            self.screen_to_cell(0.0, 0.0, cell_size),
            self.screen_to_cell(viewport_width, viewport_height, cell_size),
        )
    }

    /// Fit `bounds` into the viewport with a small margin
    pub fn frame(&mut self, bounds: CellRect, viewport: (f32, f32), cell_size: f32) {
        let width = bounds.width() as f32 + 4.0;
        let height = bounds.height() as f32 + 4.0;
        let fit = (viewport.0 / (width * cell_size)).min(viewport.1 / (height * cell_size));
        self.zoom = fit.clamp(MIN_ZOOM, MAX_ZOOM);

        let scale = cell_size * self.zoom;
        let center_x = (bounds.min.x as f32 + bounds.max.x as f32 + 1.0) / 2.0;
        let center_y = (bounds.min.y as f32 + bounds.max.y as f32 + 1.0) / 2.0;
        self.offset_x = viewport.0 / 2.0 - center_x * scale;
        self.offset_y = viewport.1 / 2.0 - center_y * scale;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_cell_floors_negative_positions() {
        let mut camera = Camera::new();
        camera.pan(100.0, 100.0);
        assert_eq!(camera.screen_to_cell(105.0, 105.0, 10.0), Coordinate::new(0, 0));
        assert_eq!(camera.screen_to_cell(95.0, 99.0, 10.0), Coordinate::new(-1, -1));
        assert_eq!(camera.screen_to_cell(0.0, 0.0, 10.0), Coordinate::new(-10, -10));
    }

    #[test]
    fn test_cell_to_screen_inverts_screen_to_cell() {
        let mut camera = Camera::new();
        camera.pan(-37.0, 12.5);
        camera.zoom_in(2.0);
        for cell in [Coordinate::new(0, 0), Coordinate::new(-7, 3), Coordinate::new(40, -40)] {
            let (sx, sy) = camera.cell_to_screen(cell, 10.0);
            assert_eq!(camera.screen_to_cell(sx + 1.0, sy + 1.0, 10.0), cell);
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.zoom_in(2.0);
        }
        assert_eq!(camera.zoom, MAX_ZOOM);
        for _ in 0..100 {
            camera.zoom_out(2.0);
        }
        assert_eq!(camera.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_cell() {
        let mut camera = Camera::new();
        camera.pan(50.0, 20.0);
        let anchor = (333.0, 217.0);
        let before = camera.screen_to_cell(anchor.0, anchor.1, 10.0);
        camera.zoom_at(1.5, anchor);
        assert_eq!(camera.screen_to_cell(anchor.0, anchor.1, 10.0), before);
    }

    #[test]
    fn test_visible_bounds_and_frame() {
        let mut camera = Camera::new();
        let view = camera.visible_bounds(800.0, 600.0, 10.0);
        assert_eq!(view, CellRect::new(Coordinate::new(0, 0), Coordinate::new(80, 60)));

        let pattern = CellRect::new(Coordinate::new(-30, -5), Coordinate::new(-20, 5));
        camera.frame(pattern, (800.0, 600.0), 10.0);
        let view = camera.visible_bounds(800.0, 600.0, 10.0);
        assert!(view.contains(pattern.min) && view.contains(pattern.max));

        camera.reset();
        assert_eq!(camera, Camera::new());
    }
}
