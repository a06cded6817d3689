//! gd-drive: Drive v2 backend for gd
//!
//! Implements the [`gd_core::RemoteStore`] trait over the Drive v2 REST API.

pub mod client;
pub mod multipart;
pub mod types;

pub use client::DriveClient;
