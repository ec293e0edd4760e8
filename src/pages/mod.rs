//! Views other than the activity workspace.

pub mod catalogue;
pub mod dashboard;
pub mod hub;
pub mod login;
