/*
 * Debug Information Module
 *
 * This module defines the StepStats struct that records what the last
 * simulation tick cost and how crowded the neighborhoods were. It is filled by
 * the step driver and read by hosts for logging or overlays.
 */

use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Number of completed steps, including this one.
    pub tick: u64,
    pub agents: usize,
    pub build_time: Duration,
    pub compute_time: Duration,
    /// Sum of neighbor counts over all agents (self excluded).
    pub total_neighbors: u64,
}

impl StepStats {
    pub fn total_time(&self) -> Duration {
        self.build_time + self.compute_time
    }

    pub fn average_neighbors(&self) -> f32 {
        if self.agents == 0 {
            0.0
        } else {
            self.total_neighbors as f32 / self.agents as f32
        }
    }
}
