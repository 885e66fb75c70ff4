pub mod chart;
pub mod config;
pub mod memlog;
pub mod styling;
pub mod viewer;
