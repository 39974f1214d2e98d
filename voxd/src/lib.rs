//! voxd — a background daemon that speaks lines written to its FIFO,
//! with a processed voice and a synchronized on-screen typewriter alert.

pub mod config;
pub mod listener;
pub mod pipeline;
pub mod playback;
pub mod server;

pub use server::{ShutdownHandle, VoiceServer};
