//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Una `Response` es el mensaje HTTP/1.0 completo ya serializado: status line,
//! headers en minúscula, línea en blanco y body. Se construye una sola vez y
//! es inmutable después.
//!
//! ## Formato producido
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! content-type: text/html\r\n
//! \r\n
//! <body>
//! ```
//!
//! El body se arma aplanando una estructura anidada arbitraria de textos,
//! bytes, listas y pares clave/valor (`Content`), para no materializar
//! strings intermedios grandes al componer páginas.

use rand::seq::SliceRandom;

use super::request::Request;
use super::status::StatusCode;

/// Exclamaciones para los títulos de las páginas de diagnóstico.
/// Cosmético: el tono le quita dramatismo a un stack trace.
const MINCED_OATHS: &[&str] = &[
    "Ack", "ARGH", "Aw, SNAP", "Blargh", "Blasted Thing", "Confound it",
    "Crud", "Oh crud", "Curses", "Gack", "Dag Blammit", "Dag Nabbit",
    "Darkness Everywhere", "Drat", "Fiddlesticks", "Flaming Flamingos",
    "Good Grief", "Golly Gee Willikers", "Oh, Snot",
    "Oh, Sweet Cheese and Crackers", "Great Googly Moogly", "Great Scott",
    "Jeepers", "Heavens to Betsy", "Crikey", "Cheese and Rice all Friday",
    "Infernal Tarnation", "Mercy", "[Insert Curse Word Here]", "Nuts",
    "Oh Heavens", "Rats", "Wretch it all", "Whiskey Tango ....",
    "Woe be unto me", "Woe is me",
];

/// Contenido anidable que se aplana a un stream de bytes ("iolist")
///
/// # Ejemplo
/// ```
/// use solo_http::http::Content;
///
/// let content = Content::List(vec![
///     Content::from("<ul>"),
///     Content::List(vec![Content::from("<li>uno</li>")]),
///     Content::from("</ul>"),
/// ]);
/// assert_eq!(content.flatten(), b"<ul><li>uno</li></ul>");
/// ```
#[derive(Debug, Clone)]
pub enum Content {
    /// Texto UTF-8
    Text(String),

    /// Bytes crudos
    Bytes(Vec<u8>),

    /// Secuencia ordenada de más contenido
    List(Vec<Content>),

    /// Pares clave/valor que se renderizan como `clave: valor\r\n`
    Pairs(Vec<(String, String)>),
}

impl Content {
    /// Aplana la estructura a un único buffer de bytes
    ///
    /// Recorrido en profundidad con pila explícita: el anidamiento puede ser
    /// arbitrario y no queremos depender de la profundidad de recursión.
    pub fn flatten(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stack: Vec<&Content> = vec![self];
        while let Some(item) = stack.pop() {
            match item {
                Content::Text(text) => out.extend_from_slice(text.as_bytes()),
                Content::Bytes(bytes) => out.extend_from_slice(bytes),
                Content::List(items) => {
                    // En orden: el tope de la pila debe ser el primer item
                    stack.extend(items.iter().rev());
                }
                Content::Pairs(pairs) => {
                    for (key, value) in pairs {
                        out.extend_from_slice(key.as_bytes());
                        out.extend_from_slice(b": ");
                        out.extend_from_slice(value.as_bytes());
                        out.extend_from_slice(b"\r\n");
                    }
                }
            }
        }
        out
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Content::Bytes(bytes.to_vec())
    }
}

impl From<Vec<Content>> for Content {
    fn from(items: Vec<Content>) -> Self {
        Content::List(items)
    }
}

/// Respuesta HTTP/1.0 completa y serializada
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado con el que se serializó
    code: StatusCode,

    /// Mensaje HTTP completo (status line + headers + línea en blanco + body)
    content: Vec<u8>,

    /// Después de enviar esta respuesta, el servidor debe apagarse
    shut_down: bool,
}

impl Response {
    /// Comienza a construir una respuesta con el body dado
    ///
    /// # Ejemplo
    /// ```
    /// use solo_http::http::{Response, StatusCode};
    ///
    /// let response = Response::build("<p>hola</p>")
    ///     .code(StatusCode::Ok)
    ///     .finish();
    ///
    /// assert_eq!(response.code(), StatusCode::Ok);
    /// ```
    pub fn build(body: impl Into<Content>) -> ResponseBuilder {
        ResponseBuilder {
            body: body.into(),
            code: StatusCode::Ok,
            headers: Vec::new(),
            shut_down: false,
        }
    }

    /// Código de estado
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// El mensaje HTTP completo, listo para mandar por el socket
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// ¿El servidor debe apagarse después de enviar esto?
    pub fn shut_down(&self) -> bool {
        self.shut_down
    }

    /// Envuelve contenido arbitrario en la página HTML estándar del servidor
    ///
    /// Si no se da título, usa el reason phrase del código.
    pub fn generic(
        body: Option<Content>,
        title: Option<&str>,
        code: StatusCode,
    ) -> Response {
        let title = title.unwrap_or_else(|| code.reason_phrase()).to_string();
        let body = body.unwrap_or_else(|| Content::from("No further information."));
        let head = format!(
            "<!DOCTYPE html>\r\n<html><head><title>{}</title></head>\r\n<body> <h1>{}</h1>\r\n",
            title, title
        );
        let tail = format!(
            "\r\n<hr/>\r\n<pre style=\"background:black;color:green;padding:20px;font-size:15px\">solo_http {}</pre>\r\n</body></html>\r\n",
            env!("CARGO_PKG_VERSION")
        );
        Response::build(Content::List(vec![
            Content::Text(head),
            body,
            Content::Text(tail),
        ]))
        .code(code)
        .finish()
    }

    /// Página de diagnóstico que incluye el método y la URL de la petición
    ///
    /// El título es una exclamación elegida al azar.
    pub fn swear(request: &Request, detail: Content, code: StatusCode) -> Response {
        let gripe = format!(
            "<p> Something went wrong during: {} <a href=\"{}\">{}</a> </p>\r\n",
            request.method(),
            request.uri(),
            request.uri()
        );
        let oath = MINCED_OATHS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Drat");
        let title = format!("{}!", oath);
        Response::generic(
            Some(Content::List(vec![Content::Text(gripe), detail])),
            Some(&title),
            code,
        )
    }

    /// Respuesta 500 construida desde el payload de un pánico del handler
    pub fn from_panic(request: &Request, detail: &str) -> Response {
        let blob = format!(
            "<p> Here's what the handler left behind. Perhaps you can send it to the responsible party. </p>\r\n\
             <pre style=\"background:red;color:white;padding:20px;font-weight:bold;font-size:15px\">{}</pre>\r\n",
            detail
        );
        Response::swear(request, Content::Text(blob), StatusCode::InternalServerError)
    }

    /// Redirección 302 a la URL dada
    pub fn redirect(url: &str) -> Response {
        Response::build("")
            .code(StatusCode::MovedTemporarily)
            .header("location", url)
            .finish()
    }

    /// Respuesta 200 con content-type text/plain
    pub fn plain_text(body: impl Into<Content>) -> Response {
        Response::build(body)
            .header("content-type", "text/plain")
            .finish()
    }
}

impl From<Content> for Response {
    /// Un handler puede retornar contenido pelado; se envuelve como 200
    fn from(content: Content) -> Self {
        Response::build(content).finish()
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Response::build(text).finish()
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Response::build(text).finish()
    }
}

impl From<Vec<u8>> for Response {
    fn from(bytes: Vec<u8>) -> Self {
        Response::build(bytes).finish()
    }
}

/// Builder que acumula código, headers y flag de apagado antes de serializar
pub struct ResponseBuilder {
    body: Content,
    code: StatusCode,
    headers: Vec<(String, String)>,
    shut_down: bool,
}

impl ResponseBuilder {
    /// Establece el código de estado
    pub fn code(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }

    /// Agrega un header (la clave se pasa a minúscula; si ya existía,
    /// se sobrescribe)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_lowercase();
        match self.headers.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name, value.to_string())),
        }
        self
    }

    /// Marca que el servidor debe apagarse después de enviar esta respuesta
    pub fn shut_down(mut self) -> Self {
        self.shut_down = true;
        self
    }

    /// Serializa el mensaje completo y entrega la Response final
    pub fn finish(mut self) -> Response {
        if !self.headers.iter().any(|(k, _)| k == "content-type") {
            self.headers
                .push(("content-type".to_string(), "text/html".to_string()));
        }

        let mut content = Vec::new();
        content.extend_from_slice(
            format!("HTTP/1.0 {}\r\n", self.code).as_bytes(),
        );
        content.extend_from_slice(&Content::Pairs(self.headers).flatten());
        content.extend_from_slice(b"\r\n");
        content.extend_from_slice(&self.body.flatten());

        Response {
            code: self.code,
            content,
            shut_down: self.shut_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Bag;

    #[test]
    fn test_flatten_plain_text() {
        assert_eq!(Content::from("hola").flatten(), b"hola");
    }

    #[test]
    fn test_flatten_nested_order() {
        let content = Content::List(vec![
            Content::from("a"),
            Content::List(vec![
                Content::from("b"),
                Content::List(vec![Content::from("c")]),
                Content::from("d"),
            ]),
            Content::Bytes(vec![b'e']),
        ]);
        assert_eq!(content.flatten(), b"abcde");
    }

    #[test]
    fn test_flatten_pairs() {
        let content = Content::Pairs(vec![
            ("content-type".to_string(), "text/html".to_string()),
            ("location".to_string(), "/x".to_string()),
        ]);
        assert_eq!(
            content.flatten(),
            b"content-type: text/html\r\nlocation: /x\r\n"
        );
    }

    #[test]
    fn test_serialized_message_shape() {
        let response = Response::build("Test")
            .header("Content-Type", "text/plain")
            .finish();
        let text = String::from_utf8(response.content().to_vec()).unwrap();

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        // Los headers salen en minúscula
        assert!(text.contains("content-type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_default_content_type() {
        let response = Response::build("x").finish();
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("content-type: text/html\r\n"));
    }

    #[test]
    fn test_header_overwrite() {
        let response = Response::build("x")
            .header("content-type", "text/plain")
            .header("Content-Type", "application/json")
            .finish();
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("content-type: application/json\r\n"));
        assert!(!text.contains("text/plain"));
    }

    #[test]
    fn test_serialization_is_pure() {
        // Misma entrada, bytes idénticos
        let make = || {
            Response::build("cuerpo")
                .code(StatusCode::Created)
                .header("x-extra", "1")
                .finish()
        };
        assert_eq!(make().content(), make().content());
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/destino");
        assert_eq!(response.code(), StatusCode::MovedTemporarily);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.0 302 Moved Temporarily\r\n"));
        assert!(text.contains("location: /destino\r\n"));
    }

    #[test]
    fn test_plain_text() {
        let response = Response::plain_text("solo texto");
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("content-type: text/plain\r\n"));
        assert!(text.ends_with("solo texto"));
    }

    #[test]
    fn test_generic_defaults() {
        let response = Response::generic(None, None, StatusCode::NotFound);
        assert_eq!(response.code(), StatusCode::NotFound);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("<title>Not Found</title>"));
        assert!(text.contains("No further information."));
    }

    #[test]
    fn test_swear_embeds_method_and_uri() {
        let request = Request::new("POST", "/x/y?z=1", "HTTP/1.0", Bag::new(), Bag::new());
        let response =
            Response::swear(&request, Content::from("detalle"), StatusCode::InternalServerError);
        assert_eq!(response.code(), StatusCode::InternalServerError);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("POST"));
        assert!(text.contains("/x/y?z=1"));
        assert!(text.contains("detalle"));
    }

    #[test]
    fn test_shut_down_flag() {
        let normal = Response::build("x").finish();
        assert!(!normal.shut_down());

        let last = Response::build("adiós").shut_down().finish();
        assert!(last.shut_down());
    }

    #[test]
    fn test_handler_leniency_conversions() {
        let from_str: Response = "pelado".into();
        assert_eq!(from_str.code(), StatusCode::Ok);

        let from_bytes: Response = vec![1u8, 2, 3].into();
        assert_eq!(from_bytes.code(), StatusCode::Ok);
    }
}
