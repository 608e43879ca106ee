//! Library crate for code-clash-back, exposing modules for binaries and integration tests.

pub mod catalog;
mod config;
pub mod dao;
mod dto;
mod error;
pub mod judge;
pub mod routes;
pub mod services;
pub mod state;
