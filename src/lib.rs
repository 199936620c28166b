pub mod aggregate;
pub mod board_config;
pub mod chart;
pub mod errors;
pub mod resolve;
pub mod shortcut;
pub mod svg;
pub mod ui;
pub mod view;
pub mod workflow;
