//! Terminal client for the Social Study Teammates room service.
//!
//! Learners and facilitators log in with a temporary account, create or join
//! coded rooms, and chat inside an activity: a named sequence of timed
//! discussion phases. The interesting part is [`workspace`], which reconciles
//! each polled transcript snapshot with a queue of moderation interventions
//! so that no intervention is shown twice, and runs the phase countdown.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod modal;
pub mod pages;
pub mod render;
pub mod router;
pub mod storage;
pub mod workspace;
