// src/models/mod.rs

pub mod attempt;
pub mod exercise;
pub mod log_entry;
pub mod quiz;
pub mod registration;
pub mod submission;
pub mod user;
pub mod week;

/// Document identifier. Generated as a UUID v4 string on insert.
pub type Id = String;
