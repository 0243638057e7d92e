use crate::error::{FlowError, FlowResult};
use crate::Vec2;
use std::f64::consts::PI;

/// Prescribed motion of a body relative to its initial placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kinematics {
    Fixed,
    Translating { velocity: Vec2 },
    Oscillating { amplitude: Vec2, frequency: f64 },
}

impl Kinematics {
    /// Displacement from the initial placement and velocity at `time`.
    pub fn state(&self, time: f64) -> (Vec2, Vec2) {
        match *self {
            Kinematics::Fixed => (Vec2::zero(), Vec2::zero()),
            Kinematics::Translating { velocity } => (velocity.scale(time), velocity),
            Kinematics::Oscillating {
                amplitude,
                frequency,
            } => {
                let omega = 2.0 * PI * frequency;
                let phase = omega * time;
                (
                    amplitude.scale(phase.sin()),
                    amplitude.scale(omega * phase.cos()),
                )
            }
        }
    }
}

/// Closed boundary polygon; the last point connects back to the first.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    origin: Vec<Vec2>,
    points: Vec<Vec2>,
    velocity: Vec2,
    kinematics: Kinematics,
}

impl Body {
    pub fn new(mut points: Vec<Vec2>, kinematics: Kinematics) -> FlowResult<Self> {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(FlowError::DegeneratePolygon(points.len()));
        }
        let (_, velocity) = kinematics.state(0.0);
        Ok(Self {
            origin: points.clone(),
            points,
            velocity,
            kinematics,
        })
    }

    pub fn circle(
        center: Vec2,
        radius: f64,
        npoints: usize,
        kinematics: Kinematics,
    ) -> FlowResult<Self> {
        let points = (0..npoints)
            .map(|k| {
                let theta = 2.0 * PI * k as f64 / npoints as f64;
                center.add(Vec2::new(radius * theta.cos(), radius * theta.sin()))
            })
            .collect();
        Self::new(points, kinematics)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |k| (self.points[k], self.points[(k + 1) % n]))
    }

    pub fn max_panel_length(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f64::max)
    }

    pub fn advance(&mut self, time: f64) {
        let (offset, velocity) = self.kinematics.state(time);
        for (point, origin) in self.points.iter_mut().zip(self.origin.iter()) {
            *point = origin.add(offset);
        }
        self.velocity = velocity;
    }
}
