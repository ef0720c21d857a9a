//! Request and response bodies

pub mod cases;
