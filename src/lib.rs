//! Storage layer for a picture-of-the-day journal.

pub mod config;
pub mod db;
pub mod error;
pub mod password;
pub mod repository;
pub mod schemas;
pub mod validation;
