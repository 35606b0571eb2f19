pub mod controller;
pub mod error;
pub mod events;
pub mod models;
pub mod settings;
pub mod statistics;
