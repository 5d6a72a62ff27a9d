/*
 * Viewer Module
 *
 * nannou front end for the flock. It projects the world onto the XY plane,
 * drives the simulator with a fixed-timestep accumulator and turns held keys
 * into predator control directions. The simulator itself knows nothing about
 * the window.
 */

mod camera;
mod ui;

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};
use nannou_egui::Egui;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::control::ControlDirection;
use crate::error::Result;
use crate::simulator::FlockSimulator;

use camera::Camera;
use ui::UiState;

const AGENT_SIZE: f32 = 6.0;
const PREDATOR_SIZE: f32 = 12.0;
// Upper bound on catch-up ticks per frame after a stall
const MAX_TICKS_PER_FRAME: u32 = 5;

const KEY_BINDINGS: [(Key, ControlDirection); 6] = [
    (Key::W, ControlDirection::PosY),
    (Key::A, ControlDirection::NegX),
    (Key::S, ControlDirection::NegY),
    (Key::D, ControlDirection::PosX),
    (Key::E, ControlDirection::PosZ),
    (Key::Q, ControlDirection::NegZ),
];

static CONFIG: OnceLock<SimConfig> = OnceLock::new();

pub struct Model {
    simulator: FlockSimulator,
    egui: Egui,
    ui_state: UiState,
    camera: Camera,
    mouse_position: Vec2,
    accumulator: Duration,
    step_size: Duration,
    last_update_time: Instant,
}

/// Open the window and run until it is closed.
pub fn run(config: SimConfig) -> Result<()> {
    config.validate()?;
    if CONFIG.set(config).is_err() {
        warn!("Viewer already configured; keeping the first configuration");
    }
    nannou::app(model).update(update).run();
    Ok(())
}

fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("3D Flock (XY projection)")
        .size(1200, 900)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .raw_event(raw_window_event)
        .build()
        .unwrap();
    let window = app.window(window_id).unwrap();
    let egui = Egui::from_window(&window);

    let config = CONFIG.get().cloned().unwrap_or_default();
    let step_size = Duration::from_secs_f32(config.dt);
    let simulator = FlockSimulator::new(config).expect("configuration validated before the window opened");

    let camera = Camera::fit(world_rect(&simulator), window.rect());
    let ui_state = UiState::from_simulator(&simulator);
    info!(agents = simulator.agents().len(), "Viewer started");

    Model {
        simulator,
        egui,
        ui_state,
        camera,
        mouse_position: Vec2::ZERO,
        accumulator: Duration::ZERO,
        step_size,
        last_update_time: Instant::now(),
    }
}

// XY footprint of the world bounds
fn world_rect(simulator: &FlockSimulator) -> Rect {
    let bounds = simulator.config().bounds();
    let (center, size) = (bounds.center(), bounds.size());
    Rect::from_x_y_w_h(center.x, center.y, size.x, size.y)
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let actions = ui::update_ui(&mut model.egui, &mut model.ui_state, &model.simulator, app.fps());

    if actions.params_changed {
        if let Err(err) = model.simulator.set_params(model.ui_state.params) {
            warn!(%err, "Rejected parameter change");
            model.ui_state.params = *model.simulator.params();
        }
    }
    if actions.reset_camera {
        model.camera.reset(app.window_rect());
    }
    model.simulator.set_parallel(model.ui_state.parallel);
    model.simulator.set_use_spatial_index(model.ui_state.use_spatial_index);

    // Held keys, in binding order; the last one held wins
    if !model.egui.ctx().wants_keyboard_input() {
        for (key, direction) in KEY_BINDINGS {
            if app.keys.down.contains(&key) {
                model.simulator.push_control(direction);
            }
        }
    }

    let now = Instant::now();
    let frame_time = now.duration_since(model.last_update_time);
    model.last_update_time = now;

    if model.ui_state.paused {
        model.accumulator = Duration::ZERO;
        return;
    }

    model.accumulator += frame_time;
    let mut ticks = 0;
    while model.accumulator >= model.step_size && ticks < MAX_TICKS_PER_FRAME {
        model.simulator.step();
        model.accumulator -= model.step_size;
        ticks += 1;
    }
    if ticks == MAX_TICKS_PER_FRAME {
        model.accumulator = Duration::ZERO;
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let camera = &model.camera;
    let simulator = &model.simulator;

    let world = world_rect(simulator);
    let corner_a = camera.world_to_screen(vec2(world.left(), world.bottom()), window_rect);
    let corner_b = camera.world_to_screen(vec2(world.right(), world.top()), window_rect);
    let screen_world = Rect::from_corners(corner_a, corner_b);
    draw.rect()
        .xy(screen_world.xy())
        .wh(screen_world.wh())
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    let bounds = simulator.config().bounds();
    let depth = bounds.size().z.max(f32::EPSILON);
    let forward = simulator.config().model_forward;
    let predator = simulator.predator_id();

    for (id, position, orientation) in simulator.poses() {
        let screen_pos = camera.world_to_screen(vec2(position.x, position.y), window_rect);
        if !on_screen(screen_pos, window_rect) {
            continue;
        }

        let heading = orientation * forward;
        let angle = heading.y.atan2(heading.x);

        let (size, color) = if Some(id) == predator {
            (PREDATOR_SIZE, rgba(0.9, 0.2, 0.2, 1.0))
        } else {
            // Nearer the +Z face is brighter
            let shade = 0.35 + 0.65 * ((position.z - bounds.lower.z) / depth).clamp(0.0, 1.0);
            (AGENT_SIZE, rgba(shade, shade, shade, 1.0))
        };

        let points = [
            pt2(size, 0.0),
            pt2(-size * 0.6, size * 0.5),
            pt2(-size * 0.6, -size * 0.5),
        ];
        draw.polygon()
            .color(color)
            .points(points)
            .xy(screen_pos)
            .rotate(angle);
    }

    draw.to_frame(app, &frame).unwrap();
    model.egui.draw_to_frame(&frame).unwrap();
}

fn on_screen(point: Vec2, window_rect: Rect) -> bool {
    let pad = PREDATOR_SIZE;
    point.x >= window_rect.left() - pad
        && point.x <= window_rect.right() + pad
        && point.y >= window_rect.bottom() - pad
        && point.y <= window_rect.top() + pad
}

fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    if model.camera.is_dragging {
        model.camera.drag(pos);
    }
    model.mouse_position = pos;
}

fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left && !model.egui.ctx().is_pointer_over_area() {
        model.camera.start_drag(model.mouse_position);
    }
}

fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.camera.end_drag();
    }
}

fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    let window_rect = app.window_rect();
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            model.camera.zoom(vec2(x, y), model.mouse_position, window_rect);
        }
        MouseScrollDelta::PixelDelta(pos) => {
            model
                .camera
                .zoom(vec2(pos.x as f32, pos.y as f32) * 0.01, model.mouse_position, window_rect);
        }
    }
}

fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
