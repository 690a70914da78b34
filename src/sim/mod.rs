// sim/ - Crossing simulation
//
// One tick = controller (braking decisions, velocities) then integrator
// (positions, wraparound). Both mutate the scene they are handed; nothing is
// global.

mod controller;
mod integrator;

pub use controller::{conflict_predicted, time_to_entry};
pub use integrator::clamp_dt;

use crate::scene::{Scene, TrainId};

/// State changes produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    BrakingStarted(TrainId),
    Holding(TrainId),
    Released(TrainId),
    Wrapped(TrainId),
}

/// Advance the scene by `dt` seconds (clamped to the configured maximum).
pub fn step(scene: &mut Scene, dt: f32) -> Vec<SimEvent> {
    let dt = clamp_dt(dt, scene.config().max_dt);
    let mut events = Vec::new();

    controller::update(scene, dt, &mut events);
    integrator::advance(scene, dt, &mut events);

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scene::BrakingState;

    #[test]
    fn huge_frame_gap_is_clamped() {
        let mut a = Scene::new(SimConfig::default(), 800.0, 600.0, 1.0);
        let mut b = a.clone();

        step(&mut a, 5.0);
        step(&mut b, 0.05);
        assert_eq!(a.trains, b.trains);
    }

    #[test]
    fn velocities_stay_in_bounds() {
        let mut s = Scene::new(SimConfig::default(), 800.0, 600.0, 1.0);
        for _ in 0..2000 {
            step(&mut s, 0.016);
            for t in &s.trains {
                assert!(t.velocity >= 0.0 && t.velocity <= t.nominal_velocity);
                if t.state == BrakingState::Holding {
                    assert_eq!(t.front, t.stop_line);
                }
            }
        }
    }
}
