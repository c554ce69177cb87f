pub mod agent;
pub mod bootstrap;
pub mod configuration;
pub mod conversation;
pub mod errors;
pub mod gateway;
pub mod index;
pub mod ingest;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod tools;
