use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;

use tasknest::{
    auth::{AuthService, TokenService},
    config::Config,
    routes,
    store::{
        CredentialStore, InMemoryCredentialStore, InMemoryTaskStore, PgCredentialStore,
        PgTaskStore, TaskStore,
    },
    tasks::TaskService,
};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::other(err.to_string())
}

async fn build_stores(
    config: &Config,
) -> io::Result<(Arc<dyn CredentialStore>, Arc<dyn TaskStore>)> {
    match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .map_err(startup_error)?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(startup_error)?;
            log::info!("connected to PostgreSQL, migrations applied");

            let credentials: Arc<dyn CredentialStore> =
                Arc::new(PgCredentialStore::new(pool.clone()));
            let todos: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(pool));
            Ok((credentials, todos))
        }
        None => {
            log::warn!("DATABASE_URL is not set; using in-memory stores, data is lost on restart");
            let credentials: Arc<dyn CredentialStore> =
                Arc::new(InMemoryCredentialStore::new());
            let todos: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
            Ok((credentials, todos))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("invalid configuration: {}", e);
        startup_error(e)
    })?;

    let (credentials, todos) = build_stores(&config).await?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.jwt_expiration_secs);
    let auth_service =
        AuthService::new(credentials, tokens, config.bcrypt_cost).map_err(startup_error)?;
    let task_service = TaskService::new(todos);

    let auth_data = web::Data::new(auth_service);
    let task_data = web::Data::new(task_service);
    let json_body_limit = config.json_body_limit;

    log::info!("Starting TaskNest server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors())
            .wrap(Logger::default())
            .app_data(auth_data.clone())
            .app_data(task_data.clone())
            .app_data(routes::json_config(json_body_limit))
            .app_data(routes::path_config())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
