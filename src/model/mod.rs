pub mod alert;
pub mod config;
pub mod mode;
pub mod theme;
