//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Expone funcionalidad en un espacio de paths virtual con soporte para
//! mounts con comodín. El asterisco hace de comodín por larga asociación:
//! es prácticamente el único candidato viable.
//!
//! Internamente es un árbol de prefijos sobre segmentos de path. La
//! resolución busca el mount más profundo que matchee, con backtracking
//! sobre las ramas comodín: en cada nivel se prefiere el hijo exacto, pero
//! la rama comodín queda guardada para reintentar si el camino exacto
//! después muere sin candidato.
//!
//! ```text
//! Request → Router::resolve → Handler → Response
//! ```

use std::collections::HashMap;

use crate::http::{Request, Response, StatusCode};

/// Etiqueta de segmento reservada que matchea cualquier segmento concreto
pub const WILDCARD: &str = "*";

/// Capacidad única detrás de toda funcionalidad montable
///
/// Recibe la petición (ya anotada con mount_depth y args por el Router)
/// y produce la respuesta. Las variantes de registración (funciones,
/// servlets, carpetas) son adaptadores sobre esta única capacidad.
pub trait Handler {
    fn handle(&self, request: &mut Request) -> Response;
}

/// Cualquier función de Request a algo convertible en Response es un handler
///
/// La conversión cubre la tolerancia clásica: un handler puede retornar
/// texto pelado y se envuelve como 200 con body.
impl<F, R> Handler for F
where
    F: Fn(&mut Request) -> R,
    R: Into<Response>,
{
    fn handle(&self, request: &mut Request) -> Response {
        self(request).into()
    }
}

/// Handler con un método por verbo HTTP
///
/// Implementar solo lo que se soporta: lo demás responde 501.
pub trait Servlet {
    fn do_get(&self, _request: &mut Request) -> Response {
        Response::generic(None, None, StatusCode::NotImplemented)
    }

    fn do_post(&self, _request: &mut Request) -> Response {
        Response::generic(None, None, StatusCode::NotImplemented)
    }
}

/// Handler que atiende una carpeta virtual entera, una operación por nombre
///
/// Parecido a `Servlet`, con una diferencia grande: cada petición con
/// exactamente un segmento de sufijo se despacha según el verbo HTTP y ese
/// nombre. Donde un lenguaje dinámico buscaría un método `do_GET_lista`
/// por reflexión, acá el único método recibe ambos y decide con un match.
pub trait Service {
    /// Retorna la respuesta de la operación, o None si no existe ninguna
    /// para ese verbo y nombre (el shim responde 501)
    fn dispatch(&self, verb: &str, name: &str, request: &mut Request) -> Option<Response>;
}

/// Entrada registrada en un nodo: el handler y los índices (relativos al
/// mount path) donde había comodines
type Entry = (Box<dyn Handler>, Vec<usize>);

/// Nodo del árbol de prefijos. Nada que ver aquí, circule.
#[derive(Default)]
struct RouteNode {
    entry: Option<Entry>,
    kids: HashMap<String, RouteNode>,
}

impl RouteNode {
    fn dig(&mut self, label: &str) -> &mut RouteNode {
        self.kids.entry(label.to_string()).or_default()
    }
}

/// Árbol de rutas: mapea paths virtuales (con comodines) a handlers
///
/// Se construye una vez al armar la aplicación y es de solo lectura
/// durante el servicio; cada `resolve` es una lectura sin estado.
pub struct Router {
    root: RouteNode,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self {
            root: RouteNode::default(),
        }
    }

    /// Resuelve una petición al handler del mount más profundo que matchee
    ///
    /// Antes de matchear se valida la forma canónica del path: si contiene
    /// segmentos `.`, `..` o vacíos embebidos, se responde con una
    /// redirección al equivalente canónico (conservando el query string)
    /// en vez de ejecutar handler alguno.
    pub fn resolve(&self, request: &mut Request) -> Response {
        if let Some(canonical) = request.normalize() {
            return Response::redirect(&canonical);
        }

        // Búsqueda con backtracking, no demasiado complicada. Una aplicación
        // real difícilmente la estrese: el usuario final es el cuello de
        // botella, no este árbol.
        let path = request.path().to_vec();
        let mut node = &self.root;
        let mut depth = 0usize;
        let mut found: Option<(&RouteNode, usize)> = None;
        let mut backtrack: Vec<(&RouteNode, usize)> = Vec::new();

        loop {
            if node.entry.is_some() && found.map_or(true, |(_, best)| depth > best) {
                found = Some((node, depth));
            }
            if depth < path.len() {
                if let Some(wild) = node.kids.get(WILDCARD) {
                    backtrack.push((wild, depth + 1));
                }
            }
            if depth < path.len() && node.kids.contains_key(&path[depth]) {
                node = &node.kids[&path[depth]];
                depth += 1;
            } else if let Some((next, next_depth)) = backtrack.pop() {
                node = next;
                depth = next_depth;
            } else {
                match found {
                    None => return Response::generic(None, None, StatusCode::NotFound),
                    Some((winner, best)) => {
                        let (handler, wildcards) =
                            winner.entry.as_ref().expect("nodo ganador sin entry");
                        let args = wildcards.iter().map(|&w| path[w].clone()).collect();
                        request.set_mount(best, args);
                        return handler.handle(request);
                    }
                }
            }
        }
    }

    /// Monta un handler en un path virtual, potencialmente con comodines
    ///
    /// El string vacío significa la carpeta raíz absoluta (no su índice).
    /// Cualquier otro path debe empezar con slash; se quitan los slashes
    /// iniciales y se parte en segmentos. Un `*` en un segmento liga el
    /// valor concreto como argumento posicional del handler.
    ///
    /// # Panics
    ///
    /// Registrar dos veces el mismo path, embeber segmentos vacíos (salvo
    /// uno final deliberado) o usar segmentos que empiezan con punto son
    /// errores de programación y revientan al armar la aplicación.
    pub fn delegate(&mut self, mount: &str, handler: impl Handler + 'static) {
        let mut wildcards = Vec::new();
        let mut node = &mut self.root;
        if !mount.is_empty() {
            assert!(
                mount.starts_with('/'),
                "Los mount points que no son la raíz empiezan con slash."
            );
            let path: Vec<&str> = mount.trim_start_matches('/').split('/').collect();
            assert!(
                path[..path.len() - 1].iter().all(|s| !s.is_empty()),
                "No embebas componentes en blanco en tus paths virtuales."
            );
            for (index, item) in path.iter().enumerate() {
                assert!(
                    !item.starts_with('.'),
                    "Los componentes que empiezan con punto están reservados."
                );
                if *item == WILDCARD {
                    wildcards.push(index);
                }
                node = node.dig(item);
            }
        }
        assert!(
            node.entry.is_none(),
            "Ya había algo montado en este mismo path."
        );
        node.entry = Some((Box::new(handler), wildcards));
    }

    /// Monta un handler que espera comportarse como una carpeta
    ///
    /// El shim común: una petición que llega al mount pelado (sin sufijo)
    /// se redirige a la URL canónica de carpeta (con slash final); el resto
    /// se le entrega al handler.
    pub fn delegate_folder(&mut self, mount: &str, handler: impl Handler + 'static) {
        assert!(
            mount.ends_with('/'),
            "Las carpetas se montan en una carpeta, no un archivo. (Terminá el path virtual con slash.)"
        );
        struct FolderShim<H> {
            inner: H,
        }
        impl<H: Handler> Handler for FolderShim<H> {
            fn handle(&self, request: &mut Request) -> Response {
                if request.has_suffix() {
                    self.inner.handle(request)
                } else {
                    let query = if request.get().is_empty() {
                        None
                    } else {
                        Some(request.get().clone())
                    };
                    Response::redirect(&request.app_url(&[""], query.as_ref()))
                }
            }
        }
        self.delegate(&mount[..mount.len() - 1], FolderShim { inner: handler });
    }

    /// Monta un `Servlet`, despachando por verbo HTTP
    ///
    /// Las peticiones con sufijo de path (más allá del mount exacto)
    /// responden 501, igual que los verbos no implementados.
    pub fn delegate_servlet(&mut self, mount: &str, servlet: impl Servlet + 'static) {
        struct ServletShim<S> {
            inner: S,
        }
        impl<S: Servlet> Handler for ServletShim<S> {
            fn handle(&self, request: &mut Request) -> Response {
                if request.has_suffix() {
                    return Response::generic(None, None, StatusCode::NotImplemented);
                }
                match request.method() {
                    "GET" => self.inner.do_get(request),
                    "POST" => self.inner.do_post(request),
                    _ => Response::generic(None, None, StatusCode::NotImplemented),
                }
            }
        }
        self.delegate(mount, ServletShim { inner: servlet });
    }

    /// Monta un `Service`: una carpeta entera de operaciones con nombre
    ///
    /// Solo las peticiones con exactamente un segmento de sufijo llegan a
    /// `dispatch`; el resto (sub-carpetas, sufijos más largos) responde
    /// 501. El mount pelado se redirige a la forma con slash, como toda
    /// carpeta.
    pub fn delegate_service(&mut self, mount: &str, service: impl Service + 'static) {
        struct ServiceShim<S> {
            inner: S,
        }
        impl<S: Service> Handler for ServiceShim<S> {
            fn handle(&self, request: &mut Request) -> Response {
                let suffix = request.path_suffix().to_vec();
                if let [name] = suffix.as_slice() {
                    let verb = request.method().to_string();
                    if let Some(response) = self.inner.dispatch(&verb, name, request) {
                        return response;
                    }
                }
                Response::generic(None, None, StatusCode::NotImplemented)
            }
        }
        self.delegate_folder(mount, ServiceShim { inner: service });
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Router {
    /// Un Router entero es a su vez un handler: el que el servidor invoca
    fn handle(&self, request: &mut Request) -> Response {
        self.resolve(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Bag;
    use std::cell::Cell;
    use std::rc::Rc;

    fn get_request(uri: &str) -> Request {
        Request::new("GET", uri, "HTTP/1.0", Bag::new(), Bag::new())
    }

    fn ok_handler(_request: &mut Request) -> Response {
        Response::plain_text("ok")
    }

    #[test]
    fn test_exact_mount_resolution() {
        let mut router = Router::new();
        router.delegate("/a/b", |req: &mut Request| {
            Response::plain_text(format!("depth={}", req.mount_depth()))
        });

        let mut request = get_request("/a/b");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
        // Sin comodines: profundidad = cantidad de segmentos, args vacíos
        assert_eq!(request.mount_depth(), 2);
        assert!(request.args().is_empty());
    }

    #[test]
    fn test_wildcard_binding_order() {
        let mut router = Router::new();
        router.delegate("/usuario/*/tarea/*", ok_handler);

        let mut request = get_request("/usuario/7/tarea/9");
        router.resolve(&mut request);
        assert_eq!(request.args(), &["7".to_string(), "9".to_string()]);
        assert_eq!(request.mount_depth(), 4);
    }

    #[test]
    fn test_deepest_match_wins_over_wildcard() {
        let mut router = Router::new();
        router.delegate("/a/*", |req: &mut Request| {
            Response::plain_text(format!("comodin:{}", req.args()[0]))
        });
        router.delegate("/a/b", |_req: &mut Request| Response::plain_text("exacto"));

        let mut request = get_request("/a/b");
        let response = router.resolve(&mut request);
        assert!(response.content().ends_with(b"exacto"));

        let mut request = get_request("/a/c");
        let response = router.resolve(&mut request);
        assert!(response.content().ends_with(b"comodin:c"));
    }

    #[test]
    fn test_backtracking_from_dead_end() {
        // El camino exacto /a/b existe pero no tiene entry; el comodín
        // guardado en el backtrack debe rescatar la resolución.
        let mut router = Router::new();
        router.delegate("/a/*", ok_handler);
        router.delegate("/a/b/c", ok_handler);

        let mut request = get_request("/a/b");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
        assert_eq!(request.args(), &["b".to_string()]);
        assert_eq!(request.mount_depth(), 2);
    }

    #[test]
    fn test_not_found() {
        let mut router = Router::new();
        router.delegate("/algo", ok_handler);

        let mut request = get_request("/otra/cosa");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::NotFound);
    }

    #[test]
    fn test_normalization_redirects_before_any_handler() {
        let invoked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&invoked);

        let mut router = Router::new();
        router.delegate("/b", move |_req: &mut Request| {
            flag.set(true);
            Response::plain_text("no debería verse")
        });

        let mut request = get_request("/a/../b");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::MovedTemporarily);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("location: /b\r\n"));
        assert!(!invoked.get(), "el handler no debe ejecutarse");
    }

    #[test]
    fn test_root_mount() {
        let mut router = Router::new();
        router.delegate("/", |_req: &mut Request| Response::plain_text("índice"));

        let mut request = get_request("/");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
        assert_eq!(request.mount_depth(), 1);
        assert!(!request.has_suffix());
    }

    #[test]
    #[should_panic(expected = "en blanco")]
    fn test_delegate_rejects_embedded_blank() {
        let mut router = Router::new();
        router.delegate("/a//b", ok_handler);
    }

    #[test]
    #[should_panic(expected = "punto")]
    fn test_delegate_rejects_dot_segment() {
        let mut router = Router::new();
        router.delegate("/a/.oculto", ok_handler);
    }

    #[test]
    #[should_panic(expected = "montado")]
    fn test_delegate_rejects_double_registration() {
        let mut router = Router::new();
        router.delegate("/a", ok_handler);
        router.delegate("/a", ok_handler);
    }

    #[test]
    fn test_trailing_slash_mount_is_allowed() {
        let mut router = Router::new();
        router.delegate("/carpeta/", ok_handler);

        let mut request = get_request("/carpeta/");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
        assert_eq!(request.mount_depth(), 2);
    }

    #[test]
    fn test_delegate_folder_redirects_bare_mount() {
        let mut router = Router::new();
        router.delegate_folder("/files/", ok_handler);

        // Sin slash final: redirección a la URL canónica de carpeta
        let mut request = get_request("/files");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::MovedTemporarily);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("location: /files/\r\n"));

        // Con sufijo: pasa al handler
        let mut request = get_request("/files/x");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
    }

    #[test]
    fn test_delegate_folder_redirect_keeps_query() {
        let mut router = Router::new();
        router.delegate_folder("/files/", ok_handler);

        let mut request = get_request("/files?orden=fecha");
        let response = router.resolve(&mut request);
        let text = String::from_utf8(response.content().to_vec()).unwrap();
        assert!(text.contains("location: /files/?orden=fecha\r\n"));
    }

    #[test]
    fn test_servlet_dispatch() {
        struct Tablero;
        impl Servlet for Tablero {
            fn do_get(&self, _request: &mut Request) -> Response {
                Response::plain_text("get")
            }
        }

        let mut router = Router::new();
        router.delegate_servlet("/tablero", Tablero);

        let mut request = get_request("/tablero");
        assert!(router.resolve(&mut request).content().ends_with(b"get"));

        // do_post no implementado: usa el default 501
        let mut request =
            Request::new("POST", "/tablero", "HTTP/1.0", Bag::new(), Bag::new());
        assert_eq!(
            router.resolve(&mut request).code(),
            StatusCode::NotImplemented
        );

        // Verbos desconocidos también
        let mut request =
            Request::new("DELETE", "/tablero", "HTTP/1.0", Bag::new(), Bag::new());
        assert_eq!(
            router.resolve(&mut request).code(),
            StatusCode::NotImplemented
        );
    }

    #[test]
    fn test_service_dispatch_by_verb_and_name() {
        struct Tareas;
        impl Service for Tareas {
            fn dispatch(
                &self,
                verb: &str,
                name: &str,
                _request: &mut Request,
            ) -> Option<Response> {
                match (verb, name) {
                    ("GET", "lista") => Some(Response::plain_text("todas")),
                    ("POST", "alta") => Some(Response::plain_text("creada")),
                    _ => None,
                }
            }
        }

        let mut router = Router::new();
        router.delegate_service("/tareas/", Tareas);

        let mut request = get_request("/tareas/lista");
        assert!(router.resolve(&mut request).content().ends_with(b"todas"));

        let mut request =
            Request::new("POST", "/tareas/alta", "HTTP/1.0", Bag::new(), Bag::new());
        assert!(router.resolve(&mut request).content().ends_with(b"creada"));

        // Verbo sin operación para ese nombre: 501
        let mut request = get_request("/tareas/alta");
        assert_eq!(
            router.resolve(&mut request).code(),
            StatusCode::NotImplemented
        );

        // Más de un segmento de sufijo: nunca llega a dispatch
        let mut request = get_request("/tareas/a/b");
        assert_eq!(
            router.resolve(&mut request).code(),
            StatusCode::NotImplemented
        );

        // El mount pelado se redirige como cualquier carpeta
        let mut request = get_request("/tareas");
        assert_eq!(
            router.resolve(&mut request).code(),
            StatusCode::MovedTemporarily
        );
    }

    #[test]
    fn test_handler_leniency_with_plain_return() {
        let mut router = Router::new();
        router.delegate("/texto", |_req: &mut Request| "pelado".to_string());

        let mut request = get_request("/texto");
        let response = router.resolve(&mut request);
        assert_eq!(response.code(), StatusCode::Ok);
        assert!(response.content().ends_with(b"pelado"));
    }
}
