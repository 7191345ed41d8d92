pub mod config;
pub mod content;
pub mod generation;
pub mod pipeline;
pub mod site;
pub mod store;
pub mod tracker;
