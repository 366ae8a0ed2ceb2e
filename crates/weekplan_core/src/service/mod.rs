//! Planner use-case services.
//!
//! # Responsibility
//! - Keep week-partitioned state consistent with storage (`planner_store`).
//! - Hold the interactive application state a UI drives (`planner_session`).

pub mod planner_session;
pub mod planner_store;
