/*
 * Boid Flocking Viewer
 *
 * A small nannou host for the flocking engine. It only reads the per-tick
 * snapshot (drawn as an XY projection of the world box, shaded by depth) and
 * edits parameters through an egui panel.
 *
 * Usage: flocking-viewer [config.json]
 */

use flocking::{Flock, SimulationParams, SNAPSHOT_STRIDE};
use nannou::prelude::*;
use nannou_egui::Egui;
use tracing::{error, info, warn};

mod ui;

const BOID_SIZE: f32 = 4.0;

// Main model for the application
struct Model {
    flock: Flock,
    // Parameters as edited in the UI; applied to the flock when they change
    params: SimulationParams,
    egui: Egui,
    paused: bool,
}

fn main() {
    init_tracing();
    nannou::app(model).update(update).run();
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_params() -> SimulationParams {
    let Some(path) = std::env::args().nth(1) else {
        return SimulationParams::default();
    };
    match SimulationParams::from_json_file(&path) {
        Ok(params) => {
            info!(%path, "loaded configuration");
            params
        }
        Err(err) => {
            warn!(%path, %err, "falling back to default configuration");
            SimulationParams::default()
        }
    }
}

fn model(app: &App) -> Model {
    let params = load_params();

    // Create the main window
    let window_id = app
        .new_window()
        .title("Boid Flocking Simulation")
        .size(1280, 800)
        .view(view)
        .raw_event(raw_window_event)
        .build()
        .expect("Failed to create window");

    let window = app.window(window_id).expect("Window closed during setup");
    let egui = Egui::from_window(&window);

    let flock = Flock::new(params.clone()).expect("Failed to create flock");
    info!(
        boids = flock.len(),
        threads = flock.simulation().thread_count(),
        "viewer started"
    );

    Model {
        flock,
        params,
        egui,
        paused: false,
    }
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let actions = ui::update_ui(
        &mut model.egui,
        &mut model.params,
        &mut model.paused,
        model.flock.stats(),
        app.fps(),
    );

    if model.params.changes_from(model.flock.params()).any() {
        if let Err(err) = model.flock.set_params(model.params.clone()) {
            warn!(%err, "rejected parameter change");
            model.params = model.flock.params().clone();
        }
    }

    if actions.reset {
        if let Err(err) = model.flock.reset() {
            error!(%err, "failed to reset flock");
        }
    }

    if !model.paused {
        if let Err(err) = model.flock.tick() {
            error!(%err, "simulation step failed, pausing");
            model.paused = true;
        }
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    // Fit the XY face of the world box into the window
    let window_rect = app.window_rect();
    let bounds = model.flock.params().bounds;
    let scale = (window_rect.w() / bounds.x).min(window_rect.h() / bounds.y) * 0.9;
    let to_screen =
        |x: f32, y: f32| pt2((x - bounds.x / 2.0) * scale, (y - bounds.y / 2.0) * scale);

    draw.rect()
        .x_y(0.0, 0.0)
        .w_h(bounds.x * scale, bounds.y * scale)
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    let points = [
        pt2(BOID_SIZE, 0.0),
        pt2(-BOID_SIZE, BOID_SIZE / 2.0),
        pt2(-BOID_SIZE, -BOID_SIZE / 2.0),
    ];

    for entry in model.flock.snapshot().as_floats().chunks_exact(SNAPSHOT_STRIDE) {
        // Nearer boids (larger z) are brighter
        let depth = (entry[2] / bounds.z).clamp(0.0, 1.0);
        let shade = 0.35 + 0.65 * depth;
        let angle = entry[5].atan2(entry[4]);

        draw.polygon()
            .color(rgb(0.0, shade, shade * 0.55))
            .points(points)
            .xy(to_screen(entry[0], entry[1]))
            .rotate(angle);
    }

    draw.to_frame(app, &frame).unwrap();
    model.egui.draw_to_frame(&frame).unwrap();
}

// Handle raw window events for egui
fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}
