/*
 * UI Module
 *
 * egui controls for the viewer. Sliders edit a copy of the parameters; the
 * caller compares it with the running flock and applies what changed.
 */

use flocking::{EdgeMode, SimulationParams, SteeringMode, StepStats};
use nannou_egui::{egui, Egui};

#[derive(Default)]
pub struct UiActions {
    pub reset: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    params: &mut SimulationParams,
    paused: &mut bool,
    stats: &StepStats,
    fps: f32,
) -> UiActions {
    let mut actions = UiActions::default();
    let num_boids_range = params.num_boids_range();

    let ctx = egui.begin_frame();

    egui::Window::new("Simulation Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("Population", |ui| {
                ui.add(egui::Slider::new(&mut params.num_boids, num_boids_range).text("Number of Boids"));
                if ui.button("Reset Boids").clicked() {
                    actions.reset = true;
                }
                ui.checkbox(paused, "Pause Simulation");
            });

            ui.collapsing("Flocking Behavior", |ui| {
                ui.add(egui::Slider::new(&mut params.separation_weight, SimulationParams::weight_range()).text("Separation Weight"));
                ui.add(egui::Slider::new(&mut params.alignment_weight, SimulationParams::weight_range()).text("Alignment Weight"));
                ui.add(egui::Slider::new(&mut params.cohesion_weight, SimulationParams::weight_range()).text("Cohesion Weight"));
                ui.add(egui::Slider::new(&mut params.neighbour_radius, SimulationParams::radius_range()).text("Neighbour Radius"));
                // Separation never reaches past the neighborhood
                params.separation_radius = params.separation_radius.min(params.neighbour_radius);
                let separation_range = params.separation_radius_range();
                ui.add(egui::Slider::new(&mut params.separation_radius, separation_range).text("Separation Radius"));
                ui.add(egui::Slider::new(&mut params.max_speed, SimulationParams::max_speed_range()).text("Max Speed"));
                ui.add(egui::Slider::new(&mut params.max_force, SimulationParams::max_force_range()).text("Max Force"));

                ui.horizontal(|ui| {
                    ui.label("Steering");
                    ui.radio_value(&mut params.steering_mode, SteeringMode::Direct, "Direct");
                    ui.radio_value(&mut params.steering_mode, SteeringMode::Reynolds, "Reynolds");
                });
                ui.horizontal(|ui| {
                    ui.label("Edges");
                    ui.radio_value(&mut params.edge_mode, EdgeMode::Wrap, "Wrap");
                    ui.radio_value(&mut params.edge_mode, EdgeMode::Avoid, "Avoid");
                    ui.radio_value(&mut params.edge_mode, EdgeMode::Open, "Open");
                });
            });

            ui.collapsing("Performance", |ui| {
                ui.label(format!("FPS: {:.1}", fps));
                ui.label(format!("Tick: {}", stats.tick));
                ui.label(format!("Build: {:.2} ms", stats.build_time.as_secs_f64() * 1000.0));
                ui.label(format!("Compute: {:.2} ms", stats.compute_time.as_secs_f64() * 1000.0));
                ui.label(format!("Avg neighbours: {:.1}", stats.average_neighbors()));
            });
        });

    actions
}
