use std::{process, sync::Arc, time::Duration};

use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use wijiwiki::{
    application::{
        auth::{AuthService, LoginThrottle},
        error::AppError,
        render::default_renderer,
    },
    cache::PageCache,
    config,
    infra::{
        error::InfraError,
        http::{self, AppRegistry, HttpState},
        pages::FsPageStore,
        telemetry,
        users::TomlUserStore,
    },
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Init(args) => run_init(settings, args),
    }
}

fn build_auth_service(settings: &config::Settings) -> Result<AuthService, AppError> {
    let users = TomlUserStore::open(settings.auth.users_file.clone())?;
    let throttle = LoginThrottle::new(
        settings.auth.brute_limit.get(),
        settings.auth.brute_window,
    );
    Ok(AuthService::new(
        Arc::new(users),
        throttle,
        settings.auth.session_ttl,
    ))
}

fn run_init(settings: config::Settings, args: config::InitArgs) -> Result<(), AppError> {
    let auth = build_auth_service(&settings)?;
    let admin = auth.init_admin(&args.admin_password)?;
    info!(
        target = "wijiwiki::init",
        username = %admin.username,
        users_file = %settings.auth.users_file.display(),
        "Admin account ready"
    );
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = FsPageStore::new(settings.pages.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let pages = Arc::new(PageCache::new(Arc::new(store), default_renderer()));
    let auth = build_auth_service(&settings)?;

    let sweeper = spawn_session_sweeper(auth.clone());
    let state = HttpState::new(pages, auth, AppRegistry::new());

    let result = serve_http(&settings, state).await;
    sweeper.abort();
    result
}

fn spawn_session_sweeper(auth: AuthService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = auth.purge_expired();
            if removed > 0 {
                debug!(target = "wijiwiki::auth", removed, "Purged expired sessions");
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "wijiwiki::http",
        addr = %settings.server.addr,
        pages = %settings.pages.directory.display(),
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Server(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(target = "wijiwiki::http", "Shutting down");
}
