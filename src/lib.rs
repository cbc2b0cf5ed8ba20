// Library exports for collabex
// Integration tests build the router from here

pub mod activity;
pub mod attachments;
pub mod auth;
pub mod commands;
pub mod config;
pub mod counts;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod store;
pub mod views;

#[cfg(test)]
mod testing;
