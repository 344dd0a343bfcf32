//! Output formatting for finished turns

pub mod console;
pub mod view;
