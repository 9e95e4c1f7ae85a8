//! # Request HTTP
//! src/http/request.rs
//!
//! El objeto request que consulta un handler. Para favorecer la testabilidad,
//! el constructor acepta datos ya parseados: la conversión desde el blob
//! binario de la red vive en `builder` (RequestBuilder).
//!
//! ## Colaboración con el Router
//!
//! El path se descompone en segmentos (sin el slash inicial). Durante la
//! resolución, el Router anota cuántos segmentos iniciales pertenecen al
//! mount que atendió la petición (`mount_depth`) y qué valores concretos
//! tomaron los comodines de ese mount (`args`). El resto del path es el
//! "sub-path" propio del handler.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

use super::bag::Bag;

/// Caracteres que se escapan al construir URLs de path
/// (equivale a dejar pasar letras, dígitos y `/ - _ . ~`)
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Archivo subido vía `multipart/form-data`
///
/// Solo se produce para campos multipart que declaran `filename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Nombre de archivo declarado por el navegador
    pub filename: String,

    /// Content-Type declarado para la parte (default: text/plain)
    pub content_type: String,

    /// Payload crudo
    pub content: Vec<u8>,
}

/// Valor de un campo POST: texto plano o archivo subido
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValue {
    Text(String),
    File(FileUpload),
}

impl PostValue {
    /// El valor como texto, si es un campo de texto
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PostValue::Text(text) => Some(text),
            PostValue::File(_) => None,
        }
    }

    /// El valor como archivo, si es un upload
    pub fn as_file(&self) -> Option<&FileUpload> {
        match self {
            PostValue::Text(_) => None,
            PostValue::File(upload) => Some(upload),
        }
    }
}

/// Representa una petición HTTP/1.0 ya interpretada
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP tal como llegó ("GET", "POST", ...)
    method: String,

    /// URI cruda de la request line
    uri: String,

    /// Token de protocolo ("HTTP/1.0", "HTTP/1.1")
    protocol: String,

    /// Headers con claves en minúscula
    headers: Bag,

    /// Query string parseada (siempre, sin importar el método)
    get: Bag,

    /// Campos POST (texto o archivos)
    post: Bag<PostValue>,

    /// Path descompuesto en segmentos, percent-decodificado,
    /// sin el slash inicial
    path: Vec<String>,

    /// Cuántos segmentos iniciales consumió el mount que atendió la petición
    mount_depth: usize,

    /// Valores ligados a los comodines del mount path, de izquierda a derecha
    args: Vec<String>,
}

impl Request {
    /// Construye una Request a partir de sus componentes ya parseados
    ///
    /// # Ejemplo
    /// ```
    /// use solo_http::http::{Bag, Request};
    ///
    /// let request = Request::new("GET", "/tareas/7?orden=fecha", "HTTP/1.0",
    ///                            Bag::new(), Bag::new());
    ///
    /// assert_eq!(request.path(), &["tareas".to_string(), "7".to_string()]);
    /// assert_eq!(request.get().get("orden"), Some(&"fecha".to_string()));
    /// ```
    pub fn new(
        method: &str,
        uri: &str,
        protocol: &str,
        headers: Bag,
        post: Bag<PostValue>,
    ) -> Self {
        let (raw_path, raw_query) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri, ""),
        };

        let mut get = Bag::new();
        get.update(
            form_urlencoded::parse(raw_query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );

        // Los paths no vacíos siempre empiezan con slash; lo saltamos.
        let decoded = percent_decode_str(raw_path).decode_utf8_lossy();
        let trimmed = decoded.strip_prefix('/').unwrap_or(&decoded);
        let path: Vec<String> = trimmed.split('/').map(String::from).collect();

        Self {
            method: method.to_string(),
            uri: uri.to_string(),
            protocol: protocol.to_string(),
            headers,
            get,
            post,
            path,
            mount_depth: 0,
            args: Vec::new(),
        }
    }

    /// Método HTTP ("GET", "POST", ...)
    pub fn method(&self) -> &str {
        &self.method
    }

    /// URI cruda de la request line
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Token de protocolo
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Headers (claves en minúscula)
    pub fn headers(&self) -> &Bag {
        &self.headers
    }

    /// Query parameters parseados
    pub fn get(&self) -> &Bag {
        &self.get
    }

    /// Campos POST parseados
    pub fn post(&self) -> &Bag<PostValue> {
        &self.post
    }

    /// Path descompuesto en segmentos
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Profundidad del mount que atendió esta petición
    pub fn mount_depth(&self) -> usize {
        self.mount_depth
    }

    /// Valores ligados a los comodines del mount path
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Anota el resultado de la resolución de rutas. Solo el Router la usa.
    pub(crate) fn set_mount(&mut self, depth: usize, args: Vec<String>) {
        self.mount_depth = depth;
        self.args = args;
    }

    /// Si el path no está en forma canónica (contiene segmentos `""`, `.`
    /// o `..`), retorna la URL canónica equivalente, conservando el query
    /// string. Si ya es canónico, retorna None.
    ///
    /// # Ejemplo
    /// ```
    /// use solo_http::http::{Bag, Request};
    ///
    /// let request = Request::new("GET", "/a/../b", "HTTP/1.0", Bag::new(), Bag::new());
    /// assert_eq!(request.normalize(), Some("/b".to_string()));
    ///
    /// let request = Request::new("GET", "/a/b", "HTTP/1.0", Bag::new(), Bag::new());
    /// assert_eq!(request.normalize(), None);
    /// ```
    pub fn normalize(&self) -> Option<String> {
        let mut normal: Vec<String> = Vec::new();
        for segment in &self.path {
            match segment.as_str() {
                ".." => {
                    normal.pop();
                }
                "" | "." => {}
                _ => normal.push(segment.clone()),
            }
        }
        // Un path de carpeta conserva su segmento vacío final
        if self.path.last().map(String::as_str) == Some("") {
            normal.push(String::new());
        }
        if normal.len() < self.path.len() {
            let query = if self.get.is_empty() { None } else { Some(&self.get) };
            Some(Self::root_url(&normal, query))
        } else {
            None
        }
    }

    /// Construye una URL absoluta (desde la raíz del servidor) para los
    /// segmentos dados, con query string opcional
    pub fn root_url(path: &[String], query: Option<&Bag>) -> String {
        let joined = format!("/{}", path.join("/"));
        let mut url = utf8_percent_encode(&joined, PATH_ENCODE_SET).to_string();
        if let Some(bag) = query {
            if !bag.is_empty() {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, value) in bag.items() {
                    serializer.append_pair(key, value);
                }
                url.push('?');
                url.push_str(&serializer.finish());
            }
        }
        url
    }

    /// Construye una URL relativa al mount que atendió esta petición
    ///
    /// Útil para que un handler "foldered" genere links dentro de su propio
    /// sub-espacio sin saber dónde está montado.
    pub fn app_url(&self, suffix: &[&str], query: Option<&Bag>) -> String {
        let mut full: Vec<String> = self.path[..self.mount_depth].to_vec();
        full.extend(suffix.iter().map(|s| s.to_string()));
        Self::root_url(&full, query)
    }

    /// Los segmentos del path que quedan después del mount
    pub fn path_suffix(&self) -> &[String] {
        &self.path[self.mount_depth..]
    }

    /// ¿Quedan segmentos de path después del mount?
    pub fn has_suffix(&self) -> bool {
        self.mount_depth < self.path.len()
    }
}
