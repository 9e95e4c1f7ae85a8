//! # Módulo HTTP
//!
//! Implementa el protocolo HTTP/1.0 desde cero, sin librerías de alto nivel:
//!
//! - Parsing de requests (request line, headers, body URL-encoded y multipart)
//! - Construcción y serialización de responses
//! - Códigos de estado
//! - El multi-mapa `Bag` para headers, query y campos POST
//!
//! ## Especificación HTTP/1.0
//!
//! El protocolo HTTP/1.0 (RFC 1945) es más simple que HTTP/1.1:
//! - No requiere el header `Host`
//! - No tiene chunked transfer encoding
//! - No mantiene conexiones persistentes
//!
//! Esa simplicidad es deliberada: una conexión por petición encaja con el
//! modelo de ejecución de un solo thread y una conexión en vuelo a la vez.

pub mod bag;       // Multi-mapa ordenado para headers/query/POST
pub mod builder;   // Parsing de HTTP requests desde el socket
pub mod error;     // ProtocolError
pub mod request;   // Objeto Request y helpers de path
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use bag::Bag;
pub use builder::RequestBuilder;
pub use error::ProtocolError;
pub use request::{FileUpload, PostValue, Request};
pub use response::{Content, Response, ResponseBuilder};
pub use status::StatusCode;
