pub mod arguments;
pub mod config;
pub mod confirmation;
pub mod constants;
pub mod errors;
pub mod fees;
pub mod logger;
pub mod rpc;
pub mod websocket;
