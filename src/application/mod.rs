pub mod actions;
pub mod ports;
pub mod services;
