//! Video generation proxy
//!
//! This library provides the pieces of the video-gen-proxy system: an HTTP
//! relay that attaches the Replicate API credential to video-generation
//! requests, and a client that submits a job through the relay and polls it
//! until the video is ready.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
