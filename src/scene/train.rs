// train.rs - A single train on a straight track
//
// Positions are one-dimensional along the train's axis of travel; `heading`
// says whether forward means increasing or decreasing coordinates.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum TrainId {
    A,
    B,
}

impl TrainId {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            TrainId::A => 0,
            TrainId::B => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrainId::A => "A",
            TrainId::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Increasing,
    Decreasing,
}

impl Heading {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Heading::Increasing => 1.0,
            Heading::Decreasing => -1.0,
        }
    }
}

/// Which train gives way at the crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Priority,
    Yielding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakingState {
    Cruising,
    Braking,
    Holding,
}

impl BrakingState {
    pub fn as_str(self) -> &'static str {
        match self {
            BrakingState::Cruising => "cruising",
            BrakingState::Braking => "braking",
            BrakingState::Holding => "holding",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    pub id: TrainId,
    pub axis: Axis,
    pub heading: Heading,
    pub role: Role,

    // Along the axis of travel
    pub front: f32,
    pub start: f32,
    pub span: f32, // start -> wrap point

    // Perpendicular to it
    pub lateral: f32,

    pub velocity: f32,
    pub nominal_velocity: f32,
    pub acceleration: f32,

    pub length: f32,
    pub width: f32,

    pub state: BrakingState,
    pub stop_line: f32,

    pub color: &'static str,
}

impl Train {
    /// Unplaced train; Scene::reset_scenario fills in geometry.
    pub fn new(id: TrainId) -> Self {
        let (axis, heading, color) = match id {
            TrainId::A => (Axis::Horizontal, Heading::Increasing, "#e74c3c"),
            TrainId::B => (Axis::Vertical, Heading::Decreasing, "#3498db"),
        };
        Self {
            id,
            axis,
            heading,
            role: Role::Priority,
            front: 0.0,
            start: 0.0,
            span: 0.0,
            lateral: 0.0,
            velocity: 0.0,
            nominal_velocity: 0.0,
            acceleration: 0.0,
            length: 0.0,
            width: 0.0,
            state: BrakingState::Cruising,
            stop_line: 0.0,
            color,
        }
    }

    #[inline]
    pub fn sign(&self) -> f32 {
        self.heading.sign()
    }

    #[inline]
    pub fn rear(&self) -> f32 {
        self.front - self.sign() * self.length
    }

    /// Distance the front still has to travel to reach `coord`; negative once past it.
    #[inline]
    pub fn distance_to(&self, coord: f32) -> f32 {
        self.sign() * (coord - self.front)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self.state, BrakingState::Braking | BrakingState::Holding)
    }

    /// Back to the spawn point at full speed, forgetting any braking.
    pub fn respawn(&mut self) {
        self.front = self.start;
        self.velocity = self.nominal_velocity;
        self.state = BrakingState::Cruising;
        self.stop_line = 0.0;
    }

    pub fn hold_at(&mut self, stop_line: f32) {
        self.front = stop_line;
        self.stop_line = stop_line;
        self.velocity = 0.0;
        self.state = BrakingState::Holding;
    }

    /// How far along start -> wrap point the front is, in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.span > 0.0 {
            (self.sign() * (self.front - self.start) / self.span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
