//! # Construcción de Requests desde el socket
//! src/http/builder.rs
//!
//! Consume un `ClientReader` para producir una `Request`: parsea la request
//! line, los headers y el body, despachando el parseo del body según el
//! content-type (URL-encoded, multipart, o crudo/desconocido).
//!
//! Para entender la parte multipart, ver RFC 7578. Sí, sería más simple
//! apoyarse en una librería MIME completa; el RFC es lo que el formato
//! realmente exige y esto implementa exactamente eso.

use std::io::Read;
use std::sync::OnceLock;

use regex::Regex;
use url::form_urlencoded;

use crate::server::reader::{ClientReader, HTTP_EOL, MAX_UPLOAD_SIZE};

use super::bag::Bag;
use super::error::ProtocolError;
use super::request::{FileUpload, PostValue, Request};

/// Prefijo con el que empieza todo marcador de boundary multipart
const BOUNDARY_PREFIX: &[u8] = b"--";

/// Convierte el blob binario de una conexión en una `Request`
pub struct RequestBuilder;

impl RequestBuilder {
    /// Lee y parsea una petición completa desde el lector
    ///
    /// Falla con `ProtocolError` ante cualquier entrada malformada; el
    /// servidor responde 400 y sigue con la próxima conexión.
    pub fn build<R: Read>(reader: &mut ClientReader<R>) -> Result<Request, ProtocolError> {
        // 1. Request line: exactamente METHOD URI PROTOCOL
        let line = reader.read_line()?;
        let line_text = String::from_utf8_lossy(&line).into_owned();
        let tokens: Vec<&str> = line_text.split_whitespace().collect();
        let (method, uri, protocol) = match tokens.as_slice() {
            [method, uri, protocol] => (*method, *uri, *protocol),
            _ => return Err(ProtocolError::BadRequestLine(line_text.clone())),
        };

        // 2. Headers hasta línea en blanco (o un boundary adelantado)
        let mut headers = Bag::new();
        Self::read_headers(reader, &mut headers)?;

        // 3. Si hay content-length declarado, recolectar proactivamente esa
        //    cantidad; si no, juntar lo que gotee antes del timeout.
        let content_length = match headers.get("content-length") {
            Some(value) => {
                let declared: usize = value.trim().parse().map_err(|_| {
                    ProtocolError::BadHeaderLine(format!("content-length: {}", value))
                })?;
                if declared > MAX_UPLOAD_SIZE {
                    return Err(ProtocolError::OversizedPayload(declared));
                }
                reader.collect_at_least(declared)?;
                declared
            }
            None => reader.expect_rest()?,
        };

        // 4. Despachar el parseo del body según content-type
        let mut post: Bag<PostValue> = Bag::new();
        let content_type = headers.get("content-type").cloned();
        match content_type.as_deref() {
            None => {
                if reader.peek(2) == BOUNDARY_PREFIX {
                    // Recuperación tolerante: hay clientes que mandan
                    // multipart sin declarar el content-type
                    let delimiter = reader.read_line()?;
                    Self::multipart_mode(reader, &mut post, &delimiter)?;
                } else if content_length > 0 {
                    Self::bogus_payload(reader, &headers, &line_text, content_length);
                }
            }
            Some("application/x-www-form-urlencoded") => {
                let body = reader.read_exact(content_length)?;
                post.update(
                    form_urlencoded::parse(&body)
                        .map(|(k, v)| (k.into_owned(), PostValue::Text(v.into_owned()))),
                );
            }
            Some(ct) if ct.starts_with("multipart/form-data;") => {
                let boundary = ct
                    .split("boundary=")
                    .nth(1)
                    .filter(|b| !b.is_empty())
                    .ok_or(ProtocolError::BadBoundary)?;
                let delimiter = [BOUNDARY_PREFIX, boundary.as_bytes()].concat();
                Self::multipart_mode(reader, &mut post, &delimiter)?;
            }
            Some(_) => {
                // Body con content-type desconocido: se tolera y descarta
                if content_length > 0 {
                    Self::bogus_payload(reader, &headers, &line_text, content_length);
                }
            }
        }

        Ok(Request::new(method, uri, protocol, headers, post))
    }

    /// Lee líneas de header hasta la línea en blanco
    ///
    /// Una línea que empieza con `--` es el primer boundary de un body
    /// multipart adelantado: se devuelve al buffer para el parser del body.
    fn read_headers<R: Read>(
        reader: &mut ClientReader<R>,
        headers: &mut Bag,
    ) -> Result<(), ProtocolError> {
        while !reader.exhausted() {
            let line = reader.read_line()?;
            if line.is_empty() {
                return Ok(());
            }
            if line.starts_with(BOUNDARY_PREFIX) {
                reader.unput(line.len());
                return Ok(());
            }
            let text = String::from_utf8_lossy(&line);
            match text.split_once(':') {
                Some((key, value)) => {
                    headers.set(&key.trim().to_lowercase(), value.trim_start().to_string());
                }
                None => return Err(ProtocolError::BadHeaderLine(text.into_owned())),
            }
        }
        Ok(())
    }

    /// Parte el body en el marcador de boundary y analiza cada parte
    ///
    /// El trailer final (`--<boundary>--`) ya no contiene el delimitador,
    /// así que el `MissingDelimiter` resultante es la terminación normal.
    fn multipart_mode<R: Read>(
        reader: &mut ClientReader<R>,
        post: &mut Bag<PostValue>,
        delimiter: &[u8],
    ) -> Result<(), ProtocolError> {
        while !reader.exhausted() {
            let part = match reader.read_until(delimiter) {
                Ok(part) => part,
                Err(ProtocolError::MissingDelimiter) => return Ok(()),
                Err(other) => return Err(other),
            };
            // Las partes triviales (el preámbulo vacío) se saltan
            if part.len() > 10 {
                let trimmed = &part[..part.len() - HTTP_EOL.len()];
                Self::analyze_part(post, trimmed)?;
            }
        }
        Ok(())
    }

    /// Analiza una parte multipart: bloque de headers, línea en blanco, payload
    fn analyze_part(post: &mut Bag<PostValue>, part: &[u8]) -> Result<(), ProtocolError> {
        let split = match find_blank_line(part) {
            Some(index) => index,
            None => {
                eprintln!("[!] Parte multipart rota (largo={})", part.len());
                return Ok(());
            }
        };
        let head = String::from_utf8_lossy(&part[..split]).into_owned();
        let body = &part[split + 2 * HTTP_EOL.len()..];

        let mut name: Option<String> = None;
        let mut filename: Option<String> = None;
        let mut content_type = "text/plain".to_string();

        for line in head.split("\r\n") {
            if line.is_empty() {
                continue;
            }
            match line.split_once(": ") {
                Some(("Content-Disposition", value)) => {
                    let (n, f) = Self::analyze_disposition(value)?;
                    name = Some(n);
                    filename = f;
                }
                Some(("Content-Type", value)) => content_type = value.to_string(),
                Some((key, _)) => return Err(ProtocolError::StrayPartHeader(key.to_string())),
                None => return Err(ProtocolError::BadHeaderLine(line.to_string())),
            }
        }

        let name = name.ok_or_else(|| {
            ProtocolError::BadDisposition("part without Content-Disposition".to_string())
        })?;
        match filename {
            None => post.set(
                &name,
                PostValue::Text(String::from_utf8_lossy(body).into_owned()),
            ),
            Some(filename) => post.set(
                &name,
                PostValue::File(FileUpload {
                    filename,
                    content_type,
                    content: body.to_vec(),
                }),
            ),
        }
        Ok(())
    }

    /// Extrae `name` y `filename` opcional del Content-Disposition
    ///
    /// Solo se aceptan las dos formas que los navegadores realmente mandan.
    fn analyze_disposition(
        disposition: &str,
    ) -> Result<(String, Option<String>), ProtocolError> {
        static WITH_FILENAME: OnceLock<Regex> = OnceLock::new();
        static NAME_ONLY: OnceLock<Regex> = OnceLock::new();

        let with_filename = WITH_FILENAME.get_or_init(|| {
            Regex::new(r#"^form-data; name="([^"]*)"; filename="([^"]*)"$"#).unwrap()
        });
        let name_only = NAME_ONLY
            .get_or_init(|| Regex::new(r#"^form-data; name="([^"]*)"$"#).unwrap());

        if let Some(captures) = with_filename.captures(disposition) {
            return Ok((captures[1].to_string(), Some(captures[2].to_string())));
        }
        if let Some(captures) = name_only.captures(disposition) {
            return Ok((captures[1].to_string(), None));
        }
        eprintln!("[!] Content-Disposition raro: {}", disposition);
        Err(ProtocolError::BadDisposition(disposition.to_string()))
    }

    /// Body con content-type irreconocible: se registra y se descarta
    fn bogus_payload<R: Read>(
        reader: &ClientReader<R>,
        headers: &Bag,
        request_line: &str,
        content_length: usize,
    ) {
        eprintln!(
            "[!] content-type era {:?}",
            headers.get("content-type").map(String::as_str)
        );
        eprintln!("[!] Request line: {}", request_line);
        eprintln!("[!] Payload: {:?}", reader.peek(content_length.min(256)));
    }
}

/// Posición de la primera línea en blanco (CRLF CRLF) dentro de la parte
fn find_blank_line(part: &[u8]) -> Option<usize> {
    part.windows(4).position(|window| window == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader_for(raw: &[u8]) -> ClientReader<Cursor<Vec<u8>>> {
        ClientReader::new(Cursor::new(raw.to_vec())).expect("primer paquete")
    }

    fn build(raw: &[u8]) -> Result<Request, ProtocolError> {
        RequestBuilder::build(&mut reader_for(raw))
    }

    #[test]
    fn test_simple_get() {
        let request = build(b"GET /hola?q=1 HTTP/1.0\r\nHost: localhost\r\n\r\n").unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.uri(), "/hola?q=1");
        assert_eq!(request.protocol(), "HTTP/1.0");
        // Las claves de header se guardan en minúscula
        assert_eq!(request.headers().get("host"), Some(&"localhost".to_string()));
        assert_eq!(request.get().get("q"), Some(&"1".to_string()));
    }

    #[test]
    fn test_bad_request_line() {
        let result = build(b"GET /solo-dos-tokens\r\n\r\n");
        assert!(matches!(result, Err(ProtocolError::BadRequestLine(_))));

        let result = build(b"GET / HTTP/1.0 extra\r\n\r\n");
        assert!(matches!(result, Err(ProtocolError::BadRequestLine(_))));
    }

    #[test]
    fn test_header_without_colon() {
        let result = build(b"GET / HTTP/1.0\r\nEstoNoEsUnHeader\r\n\r\n");
        assert!(matches!(result, Err(ProtocolError::BadHeaderLine(_))));
    }

    #[test]
    fn test_urlencoded_post() {
        let body = "nombre=Ana+Mar%C3%ADa&edad=30&edad=31";
        let raw = format!(
            "POST /form HTTP/1.0\r\ncontent-type: application/x-www-form-urlencoded\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let request = build(raw.as_bytes()).unwrap();

        assert_eq!(
            request.post().get("nombre").and_then(PostValue::as_text),
            Some("Ana María")
        );
        // Valores repetidos conservan el orden y el último gana en `get`
        assert_eq!(
            request.post().get("edad").and_then(PostValue::as_text),
            Some("31")
        );
        assert_eq!(request.post().get_list("edad").len(), 2);
    }

    #[test]
    fn test_query_parsed_even_for_post() {
        let raw = b"POST /x?orden=fecha HTTP/1.0\r\ncontent-length: 0\r\n\r\n";
        let request = build(raw).unwrap();
        assert_eq!(request.get().get("orden"), Some(&"fecha".to_string()));
    }

    fn multipart_request(boundary: &str) -> Vec<u8> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"foo\"\r\n\r\nbar\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"archivo\"; filename=\"x.txt\"\r\n\
             Content-Type: text/plain\r\n\r\ncontenido del archivo\r\n\
             --{b}--\r\n",
            b = boundary
        );
        format!(
            "POST /subir HTTP/1.0\r\ncontent-type: multipart/form-data; boundary={}\r\ncontent-length: {}\r\n\r\n{}",
            boundary,
            body.len(),
            body
        )
        .into_bytes()
    }

    #[test]
    fn test_multipart_text_and_file() {
        let request = build(&multipart_request("XbOuNdArY")).unwrap();

        assert_eq!(
            request.post().get("foo").and_then(PostValue::as_text),
            Some("bar")
        );
        let upload = request
            .post()
            .get("archivo")
            .and_then(PostValue::as_file)
            .expect("debe ser un archivo");
        assert_eq!(upload.filename, "x.txt");
        assert_eq!(upload.content_type, "text/plain");
        assert_eq!(upload.content, b"contenido del archivo");
    }

    #[test]
    fn test_multipart_without_content_type_is_recovered() {
        // Cliente malformado pero común: multipart sin declarar content-type
        let body = "--FRONTERA\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nv\r\n--FRONTERA--\r\n";
        let raw = format!(
            "POST /subir HTTP/1.0\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let request = build(raw.as_bytes()).unwrap();
        assert_eq!(
            request.post().get("k").and_then(PostValue::as_text),
            Some("v")
        );
    }

    #[test]
    fn test_multipart_stray_header_is_error() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"k\"\r\nX-Raro: si\r\n\r\nv\r\n--B--\r\n";
        let raw = format!(
            "POST /subir HTTP/1.0\r\ncontent-type: multipart/form-data; boundary=B\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let result = build(raw.as_bytes());
        assert!(matches!(result, Err(ProtocolError::StrayPartHeader(_))));
    }

    #[test]
    fn test_multipart_odd_disposition_is_error() {
        let body = "--B\r\nContent-Disposition: attachment; cosa=\"k\"\r\n\r\nv\r\n--B--\r\n";
        let raw = format!(
            "POST /subir HTTP/1.0\r\ncontent-type: multipart/form-data; boundary=B\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let result = build(raw.as_bytes());
        assert!(matches!(result, Err(ProtocolError::BadDisposition(_))));
    }

    #[test]
    fn test_multipart_missing_boundary_parameter() {
        let raw = b"POST /subir HTTP/1.0\r\ncontent-type: multipart/form-data; boundary=\r\ncontent-length: 4\r\n\r\nxxxx";
        let result = build(raw);
        assert!(matches!(result, Err(ProtocolError::BadBoundary)));
    }

    #[test]
    fn test_unknown_body_is_tolerated() {
        let raw = b"POST /blob HTTP/1.0\r\ncontent-type: application/octet-stream\r\ncontent-length: 4\r\n\r\n\x01\x02\x03\x04";
        let request = build(raw).unwrap();
        // Se loguea y descarta: no es un error, pero tampoco llega al POST bag
        assert!(request.post().is_empty());
    }

    #[test]
    fn test_oversized_content_length_rejected() {
        // El techo se aplica sobre el largo declarado, antes de leer nada
        let raw = b"POST /subir HTTP/1.0\r\ncontent-length: 20000000\r\n\r\n";
        let result = build(raw);
        assert!(matches!(result, Err(ProtocolError::OversizedPayload(20000000))));
    }

    #[test]
    fn test_bad_content_length_value() {
        let raw = b"POST /x HTTP/1.0\r\ncontent-length: muchos\r\n\r\n";
        let result = build(raw);
        assert!(matches!(result, Err(ProtocolError::BadHeaderLine(_))));
    }

    #[test]
    fn test_analyze_disposition_shapes() {
        assert_eq!(
            RequestBuilder::analyze_disposition(r#"form-data; name="campo""#).unwrap(),
            ("campo".to_string(), None)
        );
        assert_eq!(
            RequestBuilder::analyze_disposition(
                r#"form-data; name="campo"; filename="f.bin""#
            )
            .unwrap(),
            ("campo".to_string(), Some("f.bin".to_string()))
        );
        assert!(RequestBuilder::analyze_disposition("inline").is_err());
    }
}
