//! Request handlers

pub mod cases;
pub mod dashboard;
pub mod health;
