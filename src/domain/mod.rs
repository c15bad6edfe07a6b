// Domain layer: ranking models and the data-source port. No I/O lives here.

pub mod model;
pub mod ports;
