//! CLI-facing data models

pub mod display;
