// controller.rs - Predictive braking at the crossing
//
// Purely reactive: each tick looks at where both trains are now, predicts when
// each front reaches its entry boundary and, if the two arrivals are too close
// together, tells the yielding train to stop short of the intersection.

use super::SimEvent;
use crate::scene::{BrakingState, Role, Scene, Train};

/// Seconds until the front reaches its entry boundary. Stopped trains never
/// arrive; trains already past the boundary get a negative time.
pub fn time_to_entry(scene: &Scene, train: &Train) -> f32 {
    if train.velocity > 0.0 {
        train.distance_to(scene.entry_boundary(train)) / train.velocity
    } else {
        f32::INFINITY
    }
}

#[inline]
pub fn conflict_predicted(t_priority: f32, t_yielding: f32, safe_window: f32) -> bool {
    t_priority > 0.0 && t_yielding > 0.0 && (t_priority - t_yielding).abs() < safe_window
}

/// Decide braking transitions and set this tick's velocities.
pub(super) fn update(scene: &mut Scene, dt: f32, events: &mut Vec<SimEvent>) {
    if let (Some(p), Some(y)) = (scene.index_of(Role::Priority), scene.index_of(Role::Yielding)) {
        arbitrate(scene, p, y, events);
    }

    let resume = scene.config().resume_factor;
    for train in scene.trains.iter_mut() {
        govern(train, dt, resume);
    }
}

fn arbitrate(scene: &mut Scene, p: usize, y: usize, events: &mut Vec<SimEvent>) {
    let priority = &scene.trains[p];
    let yielder = &scene.trains[y];

    let t_p = time_to_entry(scene, priority);
    let t_y = time_to_entry(scene, yielder);
    let conflict = conflict_predicted(t_p, t_y, scene.config().safe_window);
    let before_entry = yielder.distance_to(scene.entry_boundary(yielder)) > 0.0;
    let stop_line = scene.stop_line_for(yielder);
    let cleared = scene.has_cleared(priority);

    let yielder = &mut scene.trains[y];
    match yielder.state {
        BrakingState::Cruising if conflict && before_entry => {
            log::debug!(
                "train {} braking: entry in {:.2}s vs {:.2}s, stop line {:.1}",
                yielder.id.label(),
                t_y,
                t_p,
                stop_line
            );
            yielder.state = BrakingState::Braking;
            yielder.stop_line = stop_line;
            events.push(SimEvent::BrakingStarted(yielder.id));
        }
        BrakingState::Holding if cleared => {
            log::debug!("train {} released", yielder.id.label());
            yielder.state = BrakingState::Cruising;
            events.push(SimEvent::Released(yielder.id));
        }
        _ => {}
    }
}

fn govern(train: &mut Train, dt: f32, resume: f32) {
    let ramp = resume * train.acceleration * dt;
    match train.state {
        BrakingState::Cruising => {
            if train.velocity < train.nominal_velocity {
                train.velocity = (train.velocity + ramp).min(train.nominal_velocity);
            }
        }
        BrakingState::Braking => {
            // Fastest speed that can still stop on the line at `acceleration`.
            // Never speeds up, and never sheds more than `acceleration * dt`;
            // the integrator clamps the front at the line if that is not enough.
            let remaining = train.distance_to(train.stop_line).max(0.0);
            let limit = (2.0 * train.acceleration * remaining).sqrt();
            let slowest = train.velocity - train.acceleration * dt;
            train.velocity = train.velocity.min(limit).max(slowest);
        }
        BrakingState::Holding => train.velocity = 0.0,
    }
    train.velocity = train.velocity.clamp(0.0, train.nominal_velocity);
}
