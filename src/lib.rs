pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod images;
pub mod providers;
pub mod services;
pub mod sources;
pub mod stages;

#[cfg(test)]
mod test_support;
