pub mod exit;
pub mod rate;
pub mod send;
pub mod setup;
pub mod subscribe;
pub mod subscribers;
pub mod ui;
