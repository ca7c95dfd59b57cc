pub mod config;
pub mod detect;
pub mod report;
pub mod submit;
