//! HydroReminder library
//!
//! This library exposes the reminder scheduling, sign-in and screen state
//! of HydroReminder for testing and for embedding in a host shell.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod screens;
pub mod services;
