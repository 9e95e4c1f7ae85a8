//! # Capa de Red
//! src/server/mod.rs
//!
//! Todo lo que toca sockets vive acá: el lector incremental de bytes del
//! cliente y el loop de servicio secuencial que lo usa.

pub mod reader;
pub mod tcp;

pub use reader::{ClientReader, HTTP_EOL, MAX_UPLOAD_SIZE};
pub use tcp::Server;
