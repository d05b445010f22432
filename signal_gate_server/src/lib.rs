pub mod check_worker;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod dispatcher;
pub mod errors;
pub mod replies;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
