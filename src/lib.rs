pub mod backend;
pub mod cli;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod gateway;
pub mod hashing;
pub mod schema;
pub mod sql;
#[cfg(test)]
mod testutil;
pub mod typemap;
pub mod value;
