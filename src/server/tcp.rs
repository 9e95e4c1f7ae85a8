//! # Servidor TCP de un Solo Thread
//! src/server/tcp.rs
//!
//! Implementación del loop principal: un socket de escucha con backlog 1
//! y una conexión atendida a la vez, de principio a fin, en el mismo
//! thread. El sistema operativo hace de cola de espera; no hay threads ni
//! locks que coordinar.

use std::any::Any;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::panic;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::Config;
use crate::http::{RequestBuilder, Response, StatusCode};
use crate::router::Handler;
use crate::server::reader::ClientReader;

/// Servidor HTTP/1.0 secuencial
///
/// Recibe en `new` el handler de la aplicación (normalmente un `Router`
/// entero) y lo invoca una petición a la vez. El loop termina solo cuando
/// algún handler marca su respuesta con el flag de apagado.
pub struct Server {
    config: Config,
    handler: Box<dyn Handler>,
}

impl Server {
    pub fn new(config: Config, handler: impl Handler + 'static) -> Self {
        Self {
            config,
            handler: Box::new(handler),
        }
    }

    /// Liga el socket de escucha y atiende conexiones hasta el apagado
    pub fn run(&self) -> io::Result<()> {
        let address = self.config.address();
        println!("[*] Iniciando servidor en {}", address);

        let addr: SocketAddr = address.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("dirección inválida {}: {}", address, e),
            )
        })?;
        let listener = Self::bind(&addr)?;

        println!("[+] Servidor escuchando en {}", address);
        println!("[*] Modo secuencial: una conexión a la vez\n");

        self.serve(listener)
    }

    fn bind(addr: &SocketAddr) -> io::Result<TcpListener> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        // SO_REUSEADDR: permite religar la dirección en TIME_WAIT
        socket.set_reuse_address(true)?;
        socket.bind(&(*addr).into())?;

        // Backlog de 1: el kernel encola a los que esperan turno
        socket.listen(1)?;

        Ok(socket.into())
    }

    /// El loop de servicio propiamente dicho, separado de `run` para poder
    /// alimentarlo con un listener efímero en los tests
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut alive = true;

        while alive {
            let (stream, peer) = match listener.accept() {
                Ok(pair) => pair,
                Err(e) => {
                    eprintln!("[!] Error al aceptar conexión: {}", e);
                    continue;
                }
            };
            println!("[+] Conexión aceptada desde {}", peer);
            stream.set_read_timeout(Some(timeout))?;

            match ClientReader::new(&stream) {
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    // Sin respuesta: colgar y pasar al siguiente
                    println!("[!] Timed out.");
                }
                Err(e) => {
                    eprintln!("[!] Conexión sin datos utilizables: {}", e);
                }
                Ok(mut reader) => match RequestBuilder::build(&mut reader) {
                    Err(pe) => {
                        eprintln!("[!] Protocol Error: {}", pe);
                        Self::reply(&stream, &Response::generic(None, None, StatusCode::BadRequest));
                    }
                    Ok(mut request) => {
                        println!("--> {} {}", request.method(), request.uri());
                        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                            self.handler.handle(&mut request)
                        }));
                        let response = match outcome {
                            Ok(response) => {
                                alive = !response.shut_down();
                                response
                            }
                            Err(payload) => {
                                let detail = describe_panic(payload);
                                eprintln!(
                                    "[!] Pánico durante {} {}: {}",
                                    request.method(),
                                    request.uri(),
                                    detail
                                );
                                Response::from_panic(&request, &detail)
                            }
                        };
                        Self::reply(&stream, &response);
                    }
                },
            }
            let _ = stream.shutdown(Shutdown::Both);
        }

        println!("[*] Apagando el servidor.");
        Ok(())
    }

    fn reply(mut stream: &TcpStream, response: &Response) {
        match stream.write_all(response.content()) {
            Ok(()) => println!("<-- {}", response.code()),
            Err(e) => eprintln!("[!] Failed to send: {}", e),
        }
    }
}

/// Extrae un texto legible del payload de un pánico
fn describe_panic(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unidentified panic payload".to_string()
    }
}
