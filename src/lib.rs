pub mod body;
pub mod boundary;
pub mod config;
pub mod error;
pub mod extrapolation;
mod field;
pub mod grid;
pub mod imbound;
pub mod ins;
pub mod level_set;
mod mac;
pub mod mapping;
pub mod poisson;
mod scalars;
mod vec2;
mod vec_field;
pub mod weno;

pub use body::{Body, Kinematics};
pub use boundary::{BoundaryConfig, BoundaryKind, BoundarySide, BoundaryValue, Side};
pub use config::{SimulationConfig, TimeStepping};
pub use error::{FlowError, FlowResult};
pub use field::{Field2, GuardState};
pub use grid::{Bounds, Grid2, GridKind};
pub use imbound::ImBound;
pub use ins::{IncompNs, Stats};
pub use mac::{Domain, MacVelocity2};
pub use poisson::{PoissonReport, PoissonSolver};
pub use scalars::Scalars;
pub use vec2::Vec2;
pub use vec_field::VecField2;
