pub mod achievements;
pub mod activity_aggregator;
pub mod analytics_service;
pub mod analytics_utils;
pub mod dashboard_service;
pub mod focus_score;
pub mod heatmap;
pub mod productivity_metrics;
pub mod settings_service;
pub mod task_service;
pub mod timer_service;
