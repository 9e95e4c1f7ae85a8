//! # solo_http
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de un solo thread implementado desde cero: atiende
//! una conexión a la vez, completa, y recién entonces acepta la próxima.
//! Pensado para front-ends locales donde el único usuario es el que está
//! sentado frente a la máquina.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Tipos del protocolo (Bag, Request, Response) y el parser
//! - `server`: Lector incremental de sockets y loop de servicio
//! - `router`: Árbol de rutas con comodines y backtracking
//! - `handlers`: Handlers listos para usar (carpetas estáticas)
//! - `config`: Argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use solo_http::config::Config;
//! use solo_http::http::{Request, Response};
//! use solo_http::router::Router;
//! use solo_http::server::Server;
//!
//! let mut router = Router::new();
//! router.delegate("/", |_req: &mut Request| "<h1>Hola</h1>");
//!
//! let server = Server::new(Config::default(), router);
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;
