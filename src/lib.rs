//! Legal services backend
//!
//! REST API over a document store for lawyers, clients, cases, queries,
//! bookings, feedback, support tickets and published content.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
