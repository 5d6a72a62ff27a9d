/*
 * UI Module
 *
 * egui controls for the live parameter vector and the per-tick statistics.
 */

use nannou_egui::{egui, Egui};

use crate::params::FlockParams;
use crate::simulator::FlockSimulator;

// What the user changed this frame
#[derive(Default)]
pub struct UiActions {
    pub params_changed: bool,
    pub reset_camera: bool,
}

pub struct UiState {
    pub params: FlockParams,
    pub use_spatial_index: bool,
    pub parallel: bool,
    pub paused: bool,
}

impl UiState {
    pub fn from_simulator(simulator: &FlockSimulator) -> Self {
        Self {
            params: *simulator.params(),
            use_spatial_index: simulator.config().use_spatial_index,
            parallel: simulator.config().parallel,
            paused: false,
        }
    }
}

pub fn update_ui(egui: &mut Egui, state: &mut UiState, simulator: &FlockSimulator, fps: f32) -> UiActions {
    let mut actions = UiActions::default();
    let before = state.params;

    let ctx = egui.begin_frame();

    egui::Window::new("Flock Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            let params = &mut state.params;

            ui.collapsing("Perception", |ui| {
                ui.add(egui::Slider::new(&mut params.close_range, FlockParams::close_range_range()).text("Close Range"));
                ui.add(egui::Slider::new(&mut params.visible_range, FlockParams::visible_range_range()).text("Visible Range"));
                ui.add(egui::Slider::new(&mut params.visible_angle, FlockParams::visible_angle_range()).text("Visible Angle"));
            });

            ui.collapsing("Flocking Behavior", |ui| {
                ui.add(egui::Slider::new(&mut params.separation_strength, FlockParams::strength_range()).text("Separation"));
                ui.add(egui::Slider::new(&mut params.alignment_strength, FlockParams::strength_range()).text("Alignment"));
                ui.add(egui::Slider::new(&mut params.cohesion_strength, FlockParams::strength_range()).text("Cohesion"));
                ui.add(
                    egui::Slider::new(&mut params.predator_avoidance_weight, FlockParams::predator_avoidance_range())
                        .text("Predator Avoidance"),
                );
            });

            ui.collapsing("Limits", |ui| {
                ui.add(egui::Slider::new(&mut params.max_speed, FlockParams::max_speed_range()).text("Max Speed"));
                ui.add(
                    egui::Slider::new(&mut params.max_acceleration, FlockParams::max_acceleration_range())
                        .text("Max Acceleration"),
                );
            });

            ui.collapsing("Camera Controls", |ui| {
                ui.label("Zoom: mouse wheel");
                ui.label("Pan: click and drag");
                ui.label("Predator: W/A/S/D in the view plane, E/Q toward/away");
                if ui.button("Reset Camera").clicked() {
                    actions.reset_camera = true;
                }
            });

            ui.collapsing("Performance", |ui| {
                ui.checkbox(&mut state.parallel, "Enable Parallel Processing");
                ui.checkbox(&mut state.use_spatial_index, "Enable Octree");

                ui.separator();

                let stats = simulator.stats();
                ui.label(format!("FPS: {:.1}", fps));
                ui.label(format!("Tick time: {:.2} ms", stats.total_ms()));
                ui.label(format!("Ticks over budget: {}", simulator.overrun_count()));
                ui.label(format!("Agents: {}", simulator.agents().len()));
                ui.label(format!("Indexed agents: {}", stats.indexed_agents));
                ui.label(format!("Octree nodes: {} (depth {})", stats.index_nodes, stats.index_depth));
            });

            ui.checkbox(&mut state.paused, "Pause Simulation");
        });

    actions.params_changed = state.params != before;
    actions
}
