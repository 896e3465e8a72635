pub mod config;
pub mod logging;

pub mod clock;
pub mod exchange;
pub mod factory;
pub mod filter;
pub mod http;
pub mod retriever;
pub mod retry;
pub mod stream;
