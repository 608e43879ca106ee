//! Service layer: lobby management, match orchestration, grading, reports.

pub mod documentation;
pub mod game_service;
pub mod health_service;
pub mod report_service;
pub mod room_service;
pub mod sse_events;
pub mod sse_service;
pub mod submission_service;
