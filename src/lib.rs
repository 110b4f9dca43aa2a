//! tallybot library
//!
//! Chat poll bot: command parsing, the poll engine, storage backends and the
//! Mattermost transport.

pub mod app;
pub mod bot;
pub mod channels;
pub mod cli;
pub mod config;
pub mod logging;
pub mod polls;
pub mod storage;
