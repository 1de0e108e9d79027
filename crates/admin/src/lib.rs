//! Storekeep admin library.
//!
//! The dashboard and JSON API are built here so the router can be exercised
//! from unit tests and the CLI can reuse the configuration and repositories.
//!
//! # Security
//!
//! Every write goes through an ownership check: the signed-in user must own
//! the store that scopes the record. Storefront reads under `/api` are public.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
