//! Library exports for the URL shortener application
//!
//! The core is [`registry::Registry`]; everything else wires it to storage and HTTP.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod model;
pub mod registry;
pub mod route;
pub mod shortcode;
pub mod state;
pub mod store;
