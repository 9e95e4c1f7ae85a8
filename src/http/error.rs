//! # Errores de Protocolo
//! src/http/error.rs
//!
//! El navegador hizo algo fuera de contrato. Todo lo que el peer remoto pueda
//! romper (request line, headers, framing multipart, tamaño del payload) cae
//! en este único tipo: la acción de recuperación es siempre la misma,
//! responder 400 y cerrar la conexión. Nunca es fatal para el proceso.

/// Errores producidos al leer o interpretar la petición del cliente
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Se buscó un delimitador que nunca llegó (ej: fin de línea)
    MissingDelimiter,

    /// Se pidieron más bytes de los que hay disponibles
    TruncatedPayload { wanted: usize, available: usize },

    /// El payload acumulado supera el techo permitido
    OversizedPayload(usize),

    /// La request line no tiene la forma `METHOD URI PROTOCOL`
    BadRequestLine(String),

    /// Línea de header sin `:`
    BadHeaderLine(String),

    /// `multipart/form-data` sin parámetro `boundary` utilizable
    BadBoundary,

    /// `Content-Disposition` con una forma que no reconocemos
    BadDisposition(String),

    /// Header inesperado dentro de una parte multipart
    StrayPartHeader(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MissingDelimiter => {
                write!(f, "Expected delimiter never arrived")
            }
            ProtocolError::TruncatedPayload { wanted, available } => {
                write!(f, "Wanted {} bytes but only {} available", wanted, available)
            }
            ProtocolError::OversizedPayload(size) => {
                write!(f, "Payload of {} bytes exceeds the upload ceiling", size)
            }
            ProtocolError::BadRequestLine(line) => {
                write!(f, "Malformed request line: {:?}", line)
            }
            ProtocolError::BadHeaderLine(line) => {
                write!(f, "Bogus header line: {:?}", line)
            }
            ProtocolError::BadBoundary => {
                write!(f, "Multipart content-type without usable boundary")
            }
            ProtocolError::BadDisposition(value) => {
                write!(f, "Odd Content-Disposition: {}", value)
            }
            ProtocolError::StrayPartHeader(key) => {
                write!(f, "Unexpected header in multipart part: {}", key)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}
