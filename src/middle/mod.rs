//! Middle-end module - value inference, naming and the enum model

pub mod values;
pub mod naming;
pub mod model;
pub mod builder;
