pub mod error;
pub mod http;
pub mod mock;
pub mod transport;
