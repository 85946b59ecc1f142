use std::env;

/// Process-wide configuration, collected from the environment exactly once
/// at startup. Business logic receives these values by reference; nothing
/// below `main` reads environment variables.
pub struct Config {
    pub database_url: String,
    /// Dedicated signing secret for session tokens, independent from the
    /// database credentials.
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
        }
    }
}
