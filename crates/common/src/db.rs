use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::config::PostgresConfig;

/// Build connect options from the configured connection parameters.
pub fn connect_options(config: &PostgresConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.dbname)
        .ssl_mode(PgSslMode::Disable)
}

/// Create a PostgreSQL connection pool.
///
/// The pipeline uses the pool sequentially, so `max_connections` defaults to 1.
pub async fn create_pool(config: &PostgresConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_with(connect_options(config))
        .await?;

    tracing::info!(
        host = %config.host,
        port = config.port,
        dbname = %config.dbname,
        max_connections = config.max_connections,
        "Connected to PostgreSQL"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_carry_config() {
        let config = PostgresConfig {
            host: "db.internal".to_string(),
            port: 6543,
            username: "relay".to_string(),
            password: "secret".to_string(),
            dbname: "uploads".to_string(),
            max_connections: 1,
        };
        let options = connect_options(&config);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "relay");
        assert_eq!(options.get_database(), Some("uploads"));
    }
}
