/*
 * Camera Module
 *
 * Pan and zoom over the XY projection of the world. Zoom is measured in
 * screen pixels per world unit, and its limits follow from the world size:
 * fully zoomed out the world fills a quarter of the window, fully zoomed in
 * the window spans 1/50 of the world's longer side.
 */

use nannou::prelude::*;

const MIN_FILL: f32 = 0.25;
const MAX_MAGNIFICATION: f32 = 50.0;
// Border left around the world when it is fitted to the window
const FIT_FILL: f32 = 0.9;

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub is_dragging: bool,
    world: Rect,
    min_zoom: f32,
    max_zoom: f32,
    last_cursor_pos: Vec2,
}

// Pixels per world unit at which `world` exactly fills `window_rect`
fn fill_zoom(world: Rect, window_rect: Rect) -> f32 {
    let span_x = world.w().max(f32::EPSILON);
    let span_y = world.h().max(f32::EPSILON);
    (window_rect.w() / span_x).min(window_rect.h() / span_y)
}

impl Camera {
    pub fn fit(world: Rect, window_rect: Rect) -> Self {
        let mut camera = Self {
            position: world.xy(),
            zoom: 1.0,
            is_dragging: false,
            world,
            min_zoom: 0.0,
            max_zoom: 0.0,
            last_cursor_pos: Vec2::ZERO,
        };
        camera.reset(window_rect);
        camera
    }

    // Recentre on the world and recompute the limits for the current window size
    pub fn reset(&mut self, window_rect: Rect) {
        let fill = fill_zoom(self.world, window_rect);
        let longest = self.world.w().max(self.world.h()).max(f32::EPSILON);
        self.min_zoom = fill * MIN_FILL;
        self.max_zoom = (window_rect.w().min(window_rect.h()) * MAX_MAGNIFICATION / longest).max(fill);
        self.zoom = fill * FIT_FILL;
        self.position = self.world.xy();
    }

    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    // Zoom around the cursor so the world point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let before = self.screen_to_world(cursor_position, window_rect);
        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);
        let after = self.screen_to_world(cursor_position, window_rect);
        self.position += before - after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    pub fn drag(&mut self, position: Vec2) {
        if self.is_dragging {
            let delta = position - self.last_cursor_pos;
            if delta.length_squared() > 0.0 {
                self.position -= delta / self.zoom;
                self.last_cursor_pos = position;
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }
}
