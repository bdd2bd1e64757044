pub mod credentials;
pub mod server;
