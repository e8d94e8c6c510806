pub mod context;
pub mod persist;
pub mod rules;
pub mod settings;
pub mod tracker;
pub mod types;
