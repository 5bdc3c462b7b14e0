//! Saved readings and generated zodiac profiles, stored in Postgres.

pub mod handlers;
pub mod models;
pub mod repository;
