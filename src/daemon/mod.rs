pub mod app;
pub mod outbound;
pub mod repository;
