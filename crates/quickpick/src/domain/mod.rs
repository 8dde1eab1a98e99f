//! Core domain types shared by the controller and its collaborators.

pub mod errors;
pub mod model;
