//! # Lector de conexión
//! src/server/reader.rs
//!
//! Encapsula las fases de leer una petición desde un socket bajo la
//! restricción de operar con un único thread.
//!
//! Los navegadores muchas veces abren una conexión y gotean la petición en
//! varios segmentos TCP, o abren conexiones extra sin mandar nada. Un read
//! ingenuo de un solo paquete retornaría antes de tiempo, y un read
//! bloqueante sin límite congelaría el proceso entero. La política de este
//! lector es: intentar levantar toda la petición en un (teórico) paquete, y
//! solo esperar más datos cuando un marcador estructural (delimitador,
//! content-length declarado) demuestra que falta algo. Las esperas están
//! acotadas por el timeout del socket: pasado ese plazo se desiste con un
//! error, nunca se cuelga.

use std::io::{self, ErrorKind, Read};

use crate::http::ProtocolError;

/// Techo duro de payload por petición: por encima de esto, un cliente
/// patológico es un error de protocolo, no un crecimiento sin límite
pub const MAX_UPLOAD_SIZE: usize = 10_000_000;

/// Tamaño de cada lectura individual del socket
const PACKET_SIZE: usize = 4096;

/// Fin de línea HTTP
pub const HTTP_EOL: &[u8] = b"\r\n";

/// Lector incremental sobre una conexión ya aceptada
///
/// Genérico sobre `Read` para que los tests puedan alimentar secuencias de
/// chunks con guion en vez de un socket real. Con un `TcpStream` el timeout
/// debe configurarse antes (`set_read_timeout`): una lectura que expira se
/// reporta como `WouldBlock`/`TimedOut` y aquí se trata como "no llegó más".
pub struct ClientReader<R: Read> {
    source: R,

    /// Todo lo recibido hasta ahora
    blob: Vec<u8>,

    /// Cursor de lectura dentro de `blob`
    start: usize,

    /// ¿Ya hicimos al menos una pasada de "esperar más datos"?
    waited: bool,
}

impl<R: Read> ClientReader<R> {
    /// Crea el lector intentando levantar la petición completa en una lectura
    ///
    /// Un timeout antes del primer byte, o un cierre inmediato del peer,
    /// retornan el error de IO tal cual: el servidor descarta esas conexiones
    /// en silencio.
    pub fn new(mut source: R) -> io::Result<Self> {
        let mut packet = [0u8; PACKET_SIZE];
        let n = source.read(&mut packet)?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "peer closed without sending anything",
            ));
        }
        Ok(Self {
            source,
            blob: packet[..n].to_vec(),
            start: 0,
            waited: false,
        })
    }

    /// Busca la próxima ocurrencia del patrón desde el cursor
    fn find(&self, what: &[u8]) -> Option<usize> {
        self.blob[self.start..]
            .windows(what.len())
            .position(|window| window == what)
            .map(|offset| self.start + offset)
    }

    /// Lee todos los bytes hasta (sin incluir) el próximo delimitador,
    /// avanzando el cursor más allá del delimitador
    ///
    /// Si el delimitador todavía no está en el buffer y aún no hicimos una
    /// pasada de recolección, primero se intenta traer más datos del socket.
    /// Si aun así no aparece, es un error de protocolo.
    pub fn read_until(&mut self, delimiter: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let found = match self.find(delimiter) {
            Some(index) => index,
            None => {
                if !self.waited {
                    self.collect_at_least(usize::MAX)?;
                }
                self.find(delimiter).ok_or(ProtocolError::MissingDelimiter)?
            }
        };
        let line = self.blob[self.start..found].to_vec();
        self.start = found + delimiter.len();
        Ok(line)
    }

    /// Lee una línea terminada en CRLF
    pub fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        self.read_until(HTTP_EOL)
    }

    /// Devuelve una línea recién consumida al buffer (cursor hacia atrás)
    ///
    /// Se usa cuando el parser de headers se topa con el primer boundary de
    /// un cuerpo multipart y debe dejárselo al parser del body.
    pub fn unput(&mut self, line_len: usize) {
        self.start -= line_len + HTTP_EOL.len();
    }

    /// Retorna exactamente `n` bytes desde el cursor
    ///
    /// Falla si hay menos disponibles: el llamador debe haber asegurado la
    /// recolección previa (típicamente vía `collect_at_least` con el
    /// content-length declarado).
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        let available = self.blob.len() - self.start;
        if available < n {
            return Err(ProtocolError::TruncatedPayload {
                wanted: n,
                available,
            });
        }
        let bytes = self.blob[self.start..self.start + n].to_vec();
        self.start += n;
        Ok(bytes)
    }

    /// Acumula lecturas del socket hasta tener al menos `limit` bytes sin
    /// consumir, o hasta que el peer se calle (timeout) o cierre
    ///
    /// Superar el techo de payload es un error de protocolo.
    pub fn collect_at_least(&mut self, limit: usize) -> Result<(), ProtocolError> {
        self.waited = true;
        // Descartar lo ya consumido para que el cursor parta de cero
        self.blob.drain(..self.start);
        self.start = 0;

        let mut packet = [0u8; PACKET_SIZE];
        while self.blob.len() < limit {
            match self.source.read(&mut packet) {
                Ok(0) => break,
                Ok(n) => {
                    self.blob.extend_from_slice(&packet[..n]);
                    if self.blob.len() > MAX_UPLOAD_SIZE {
                        return Err(ProtocolError::OversizedPayload(self.blob.len()));
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break
                }
                // Cualquier otro error de IO corta la recolección; el parseo
                // posterior fallará solo si realmente faltaban datos.
                Err(_) => break,
            }
        }
        Ok(())
    }

    /// Hasta `n` bytes desde el cursor, sin avanzarlo
    ///
    /// Se usa para olfatear marcadores de boundary multipart.
    pub fn peek(&self, n: usize) -> &[u8] {
        let end = (self.start + n).min(self.blob.len());
        &self.blob[self.start..end]
    }

    /// ¿Se consumió todo el buffer, después de haberle dado al cliente una
    /// oportunidad justa de mandar más?
    pub fn exhausted(&self) -> bool {
        self.start == self.blob.len() && self.waited
    }

    /// Asegura una pasada de recolección y retorna cuántos bytes quedan
    pub fn expect_rest(&mut self) -> Result<usize, ProtocolError> {
        if !self.waited {
            self.collect_at_least(usize::MAX)?;
        }
        Ok(self.blob.len() - self.start)
    }
}
