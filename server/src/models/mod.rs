//! Data models for the release-management backend.

pub mod app;
pub mod iteration;
pub mod member;
pub mod publish;
pub mod review;
pub mod user;
