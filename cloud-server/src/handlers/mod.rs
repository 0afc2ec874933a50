//! HTTP handlers

pub mod health;
pub mod evaluate;
pub mod sessions;
pub mod forensics;
pub mod admin;
