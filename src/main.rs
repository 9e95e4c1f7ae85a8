//! # solo_http - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor con una pequeña aplicación de muestra:
//! una portada, un eco con comodín, una carpeta estática y una ruta de
//! apagado ordenado.

use solo_http::config::Config;
use solo_http::handlers::StaticFolder;
use solo_http::http::{Request, Response};
use solo_http::router::Router;
use solo_http::server::Server;

fn main() {
    println!("=================================");
    println!("  solo_http — HTTP/1.0 Server");
    println!("=================================\n");

    let config = Config::new();
    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(1);
    }
    config.print_summary();

    let mut router = Router::new();
    router.delegate("/", |_req: &mut Request| {
        Response::generic(
            Some(
                "<ul>\
                 <li><a href=\"/echo/hola\">/echo/*</a></li>\
                 <li><a href=\"/static/\">/static/</a></li>\
                 <li><a href=\"/apagar\">/apagar</a></li>\
                 </ul>"
                    .into(),
            ),
            Some("solo_http"),
            solo_http::http::StatusCode::Ok,
        )
    });
    router.delegate("/echo/*", |req: &mut Request| {
        Response::plain_text(req.args().join("\n"))
    });
    router.delegate_folder("/static/", StaticFolder::new(config.static_dir.clone()));
    router.delegate("/apagar", |_req: &mut Request| {
        Response::build("<p>Hasta luego.</p>").shut_down().finish()
    });

    let server = Server::new(config, router);
    if let Err(e) = server.run() {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}
