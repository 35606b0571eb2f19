pub mod app;
pub mod console;
pub mod display;
pub mod theme;
