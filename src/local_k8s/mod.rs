pub mod kubectl;
pub mod pods;
