//! UI layer for the desktop app.

pub mod app;

pub use app::GestureApp;
