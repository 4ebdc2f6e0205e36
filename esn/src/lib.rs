//! Echo State Network with a ridge-trained linear readout.
//!
//! The recurrent weights are random, sparse and rescaled to an exact
//! spectral radius; only the readout is fit, via the `lin-reg` crate.

#[macro_use]
extern crate log;

use nalgebra::{Const, DVector, Dyn, Matrix, VecStorage};

mod constructor;
mod esn;
mod params;

pub use constructor::ReservoirConstructor;
pub use esn::Esn;
pub use params::{HyperParams, Params};

/// Column vector holding the reservoir activation state
pub type StateMatrix = Matrix<f64, Dyn, Const<1>, VecStorage<f64, Dyn, Const<1>>>;

/// A prediction trajectory, one value per input time step
pub type Trajectory = DVector<f64>;
