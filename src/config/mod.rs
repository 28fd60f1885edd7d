use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads configuration from the environment. `DATABASE_URL` is either a
    /// `postgres://` URL or a SQLite file path; the persistence layer picks
    /// the backend from it.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "helpdesk.db".to_string());

        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match std::env::var("SERVER_PORT") {
            Ok(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid SERVER_PORT value: {v}"))?,
            Err(_) => 8080,
        };

        Ok(AppConfig {
            server: ServerConfig { host, port },
            database_url,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
