//! # Handlers de Archivos Estáticos
//! src/handlers/mod.rs
//!
//! Un handler listo para usar que expone el contenido de una carpeta del
//! sistema de archivos al navegador. Se monta en el router mediante
//! `delegate_folder`, que garantiza que toda petición llegue con al menos
//! un segmento de sufijo.

use std::fs;
use std::path::PathBuf;

use crate::http::{Content, Request, Response, StatusCode};
use crate::router::Handler;

/// Sirve los contenidos de una carpeta real por HTTP
///
/// Como medida de seguridad simple, rechaza con 403 cualquier componente
/// de path que empiece con punto o guión bajo. Los errores del sistema de
/// archivos (no existe, sin permiso) responden 404 sin distinguir causa.
///
/// # Ejemplo
///
/// ```no_run
/// use solo_http::handlers::StaticFolder;
/// use solo_http::router::Router;
///
/// let mut router = Router::new();
/// router.delegate_folder("/docs/", StaticFolder::new("./docs"));
/// ```
pub struct StaticFolder {
    root: PathBuf,
}

impl StaticFolder {
    pub fn new(real_path: impl Into<PathBuf>) -> Self {
        Self {
            root: real_path.into(),
        }
    }

    fn forbid(component: &str) -> bool {
        component.starts_with('.') || component.starts_with('_')
    }

    /// Lista una carpeta como HTML, con link a la carpeta padre
    fn show_folder(&self, request: &Request, local_path: &PathBuf) -> Response {
        let entries = match fs::read_dir(local_path) {
            Ok(entries) => entries,
            Err(_) => return Response::generic(None, None, StatusCode::NotFound),
        };
        let mut body: Vec<Content> = vec![Content::Text("<ul>".into())];
        if request.path().len() > 1 {
            body.push(Self::link(".."));
        }
        let mut names: Vec<String> = Vec::new();
        for entry in entries.flatten() {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if Self::forbid(&name) {
                continue;
            }
            if entry.path().is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();
        for name in names {
            body.push(Self::link(&name));
        }
        body.push(Content::Text("</ul>".into()));
        let path = request.path();
        let title = format!("Showing Folder /{}", path[..path.len() - 1].join("/"));
        Response::generic(Some(Content::List(body)), Some(&title), StatusCode::Ok)
    }

    fn link(name: &str) -> Content {
        Content::Text(format!("<li><a href=\"{name}\">{name}</a></li>\r\n"))
    }
}

impl Handler for StaticFolder {
    fn handle(&self, request: &mut Request) -> Response {
        let mut suffix = request.path_suffix().to_vec();
        // Un sufijo que termina en segmento vacío pide la carpeta misma
        let want_folder = suffix.last().map(String::as_str) == Some("");
        if want_folder {
            suffix.pop();
        }
        if suffix.iter().any(|c| Self::forbid(c)) {
            return Response::generic(None, None, StatusCode::Forbidden);
        }
        let mut local_path = self.root.clone();
        for component in &suffix {
            local_path.push(component);
        }
        if want_folder {
            self.show_folder(request, &local_path)
        } else {
            match fs::read(&local_path) {
                Ok(bytes) => Response::plain_text(bytes),
                Err(_) => Response::generic(None, None, StatusCode::NotFound),
            }
        }
    }
}
