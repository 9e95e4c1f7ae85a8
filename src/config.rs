//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./solo_http --port 8080 --timeout-ms 1000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 ./solo_http
//! ```

use clap::Parser;

/// Configuración del servidor HTTP/1.0 de un solo thread
#[derive(Debug, Clone, Parser)]
#[command(name = "solo_http")]
#[command(about = "Servidor HTTP/1.0 de un solo thread, una conexión a la vez")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha. Cambiarlo solo si de verdad se quiere
    /// atender tráfico remoto.
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Cuánto esperar (ms) datos adicionales de un navegador lento
    #[arg(long = "timeout-ms", default_value = "1000", env = "HTTP_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Carpeta de archivos estáticos a exponer bajo /static/
    #[arg(long = "static-dir", default_value = "./public", env = "STATIC_DIR")]
    pub static_dir: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use solo_http::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Timeout must be > 0 ms".to_string());
        }
        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════╗");
        println!("║     solo_http — HTTP/1.0 Server Config       ║");
        println!("╚══════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Timeout:      {} ms", self.timeout_ms);
        println!("   Static dir:   {}", self.static_dir);
        println!();
        println!("═══════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            timeout_ms: 1000,
            static_dir: "./public".to_string(),
        }
    }
}
