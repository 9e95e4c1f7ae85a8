//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos de estado HTTP/1.0 (RFC 1945) que el servidor sabe emitir.
//! La tabla es deliberadamente cerrada: un código fuera de ella es un error
//! de programación, y representarlos como enum hace ese error imposible de
//! construir en vez de detectarlo al serializar.

/// Códigos de estado que este servidor puede emitir
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 201 Created - Recurso creado
    Created = 201,

    /// 202 Accepted - Petición aceptada para procesamiento
    Accepted = 202,

    /// 204 No Content - Petición exitosa sin contenido en el body
    NoContent = 204,

    /// 301 Moved Permanently - Redirección permanente
    MovedPermanently = 301,

    /// 302 Moved Temporarily - Redirección temporal
    MovedTemporarily = 302,

    /// 304 Not Modified - El recurso no cambió
    NotModified = 304,

    /// 400 Bad Request - Petición malformada
    BadRequest = 400,

    /// 401 Unauthorized - Falta autenticación
    Unauthorized = 401,

    /// 403 Forbidden - Acceso prohibido
    Forbidden = 403,

    /// 404 Not Found - Ruta o recurso no encontrado
    NotFound = 404,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError = 500,

    /// 501 Not Implemented - Operación no implementada
    NotImplemented = 501,

    /// 502 Bad Gateway - Respuesta inválida de un colaborador
    BadGateway = 502,

    /// 503 Service Unavailable - Servidor sobrecargado o apagándose
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use solo_http::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use solo_http::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::MovedTemporarily => "Moved Temporarily",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        let code = self.as_u16();
        (200..300).contains(&code)
    }

    /// Verifica si el código indica redirección (3xx)
    pub fn is_redirect(&self) -> bool {
        let code = self.as_u16();
        (300..400).contains(&code)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        let code = self.as_u16();
        (400..500).contains(&code)
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        let code = self.as_u16();
        (500..600).contains(&code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
