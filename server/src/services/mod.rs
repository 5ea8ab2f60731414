//! Business logic over the persistence layer.

pub mod app_service;
pub mod iteration_service;
pub mod publish_service;
pub mod scm_service;
