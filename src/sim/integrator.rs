// integrator.rs - Explicit Euler position update
//
// Runs after the controller has set velocities. Braking trains are clamped to
// their stop line; trains that run off the canvas wrap back to their spawn.

use super::SimEvent;
use crate::scene::{BrakingState, Scene};

/// Frame gap in seconds, clamped to [0, max_dt]. Garbage timestamps give 0.
#[inline]
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 }
}

pub(super) fn advance(scene: &mut Scene, dt: f32, events: &mut Vec<SimEvent>) {
    for i in 0..scene.trains.len() {
        let wrap_at = scene.wrap_front(&scene.trains[i]);
        let train = &mut scene.trains[i];

        match train.state {
            BrakingState::Cruising => {
                train.front += train.sign() * train.velocity * dt;
            }
            BrakingState::Braking => {
                let remaining = train.distance_to(train.stop_line).max(0.0);
                let step = train.velocity * dt;
                if step >= remaining {
                    let stop_line = train.stop_line;
                    train.hold_at(stop_line);
                    log::debug!("train {} holding at {:.1}", train.id.label(), stop_line);
                    events.push(SimEvent::Holding(train.id));
                } else {
                    train.front += train.sign() * step;
                }
            }
            BrakingState::Holding => {
                train.velocity = 0.0;
            }
        }

        if train.distance_to(wrap_at) < 0.0 {
            train.respawn();
            events.push(SimEvent::Wrapped(train.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scene::TrainId;
    use approx::assert_relative_eq;

    fn scene() -> Scene {
        Scene::new(SimConfig::default(), 800.0, 600.0, 1.0)
    }

    #[test]
    fn dt_is_clamped() {
        assert_relative_eq!(clamp_dt(0.016, 0.05), 0.016);
        assert_relative_eq!(clamp_dt(2.5, 0.05), 0.05);
        assert_relative_eq!(clamp_dt(-1.0, 0.05), 0.0);
        assert_relative_eq!(clamp_dt(f32::NAN, 0.05), 0.0);
        assert_relative_eq!(clamp_dt(f32::INFINITY, 0.05), 0.0);
    }

    #[test]
    fn trains_move_along_heading() {
        let mut s = scene();
        let mut events = Vec::new();
        advance(&mut s, 0.01, &mut events);

        assert_relative_eq!(s.train(TrainId::A).front, 231.8, epsilon = 1e-4);
        assert_relative_eq!(s.train(TrainId::B).front, 468.3, epsilon = 1e-4);
        assert!(events.is_empty());
    }

    #[test]
    fn zero_dt_is_static() {
        let mut s = scene();
        let before = s.trains.clone();
        let mut events = Vec::new();
        advance(&mut s, 0.0, &mut events);
        assert_eq!(s.trains, before);
    }

    #[test]
    fn braking_train_lands_exactly_on_stop_line() {
        let mut s = scene();
        let b = &mut s.trains[1];
        b.state = BrakingState::Braking;
        b.stop_line = b.front - 1.0;
        b.velocity = 170.0;

        let mut events = Vec::new();
        advance(&mut s, 0.016, &mut events);

        let b = s.train(TrainId::B);
        assert_eq!(b.state, BrakingState::Holding);
        assert_eq!(b.front, b.stop_line);
        assert_eq!(b.velocity, 0.0);
        assert_eq!(events, vec![SimEvent::Holding(TrainId::B)]);
    }

    #[test]
    fn holding_train_stays_put() {
        let mut s = scene();
        let stop = s.stop_line_for(s.train(TrainId::B));
        s.trains[1].hold_at(stop);

        let mut events = Vec::new();
        for _ in 0..10 {
            advance(&mut s, 0.05, &mut events);
        }
        assert_eq!(s.train(TrainId::B).front, stop);
    }

    #[test]
    fn wrap_resets_to_spawn_cruising() {
        let mut s = scene();
        let wrap_a = s.wrap_front(s.train(TrainId::A));
        let wrap_b = s.wrap_front(s.train(TrainId::B));
        s.trains[0].front = wrap_a;
        s.trains[1].front = wrap_b + 0.5;
        s.trains[1].state = BrakingState::Braking;
        s.trains[1].stop_line = -1000.0;
        s.trains[1].velocity = 50.0;

        let mut events = Vec::new();
        advance(&mut s, 0.016, &mut events);

        assert_eq!(events, vec![SimEvent::Wrapped(TrainId::A), SimEvent::Wrapped(TrainId::B)]);
        for t in &s.trains {
            assert_eq!(t.front, t.start);
            assert_eq!(t.state, BrakingState::Cruising);
            assert_eq!(t.velocity, t.nominal_velocity);
        }
    }

    #[test]
    fn wrap_threshold_is_rear_past_margin() {
        let s = scene();
        // rear > 800 + 40
        assert_relative_eq!(s.wrap_front(s.train(TrainId::A)), 900.0);
        // rear < -40
        assert_relative_eq!(s.wrap_front(s.train(TrainId::B)), -100.0);
    }
}
