//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod admin;
pub mod analysis;
pub mod health;
pub mod jobs;
pub mod reports;
