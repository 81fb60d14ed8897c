//! Portfolio chat. The scripted assistant behind a personal portfolio site.

pub mod config;
pub mod contact;
pub mod dialogue;
pub mod error;
pub mod host;
pub mod session;
