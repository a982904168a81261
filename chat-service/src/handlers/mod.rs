pub mod app;
pub mod chat;
pub mod sessions;
pub mod workflow;
