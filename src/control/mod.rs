pub mod control_model;
pub mod correlator;
