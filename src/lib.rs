pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod perks;
pub mod state;

#[cfg(test)]
mod test_support;
