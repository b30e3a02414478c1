pub mod analytics;
pub mod settings;
pub mod task;
pub mod time_entry;
