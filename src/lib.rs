// library crate for bwm
// the binary is a thin wrapper around `cli::run`

pub mod apply;
pub mod blueprint;
pub mod cli;
pub mod config;
pub mod desktop;
pub mod display;
pub mod geom;
pub mod logging;
pub mod script;
pub mod window;
