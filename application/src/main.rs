use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, graphql, Args, Config};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use futures::{future, TryFutureExt as _};
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::TraceLayer,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to stderr rather than stdout.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level being logged, known once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(log_layer(io::stdout, false))
        .with(log_layer(io::stderr, true))
        .init();

    _ = run().await;
}

/// Creates a compact log layer writing either the [`STDERR_LEVELS`] or all
/// the others into the provided `writer`.
fn log_layer<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(filter_fn(move |meta| {
            let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
            meta.is_span()
                || STDERR_LEVELS.contains(meta.level()) == stderr
                    && max >= *meta.level()
        }))
}

async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    log::info!("applied {} migrations", report.applied_migrations().len());

    let notifier = service.notifier().map_err(|e| {
        log::error!("failed to initialize `Notifier`: {e}");
    })?;
    if !notifier.is_enabled() {
        log::warn!("`service.slack.webhook_url` is empty, notifications off");
    }
    let service: service::Config = service.try_into().map_err(|e| {
        log::error!("invalid `service` configuration: {e}");
    })?;
    let (service, background) = Service::new(service, postgres, notifier);

    let schema = api::Schema::new(
        api::Query,
        api::Mutation,
        juniper::EmptySubscription::new(),
    );

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(service))
        .layer(cors_layer(server.cors)?)
        .layer(http_trace_layer());

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("serving GraphQL on `{addr}/graphql`");

    future::try_join(
        axum::serve(listener, app)
            .into_future()
            .map_err(|e| log::error!("webserver failed: {e}")),
        background.into_future().map_err(|e| log::error!("{e}")),
    )
    .await
    .map(drop)
}

/// Builds the [`CorsLayer`] allowing the configured origins.
fn cors_layer(cors: application::config::Cors) -> Result<CorsLayer, ()> {
    let origins = cors
        .origins
        .into_iter()
        .map(|origin| {
            origin.parse::<http::header::HeaderValue>().map_err(|e| {
                log::error!("`{origin}` is not a correct CORS origin: {e}");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::OPTIONS,
            http::Method::POST,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_origin(origins))
}

/// Builds the [`TraceLayer`] recording a span per HTTP request.
fn http_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&http::Request<axum::body::Body>) -> tracing::Span + Clone,
    tower_http::trace::DefaultOnRequest,
    impl Fn(&http::Response<axum::body::Body>, time::Duration, &tracing::Span)
        + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|r: &http::Request<axum::body::Body>| {
            tracing::info_span!(
                "HTTP request",
                http.client_ip = InsecureClientIp::from(
                    r.headers(),
                    r.extensions(),
                )
                .map(|ip| ip.0.to_string())
                .ok(),
                http.flavor = ?r.version(),
                http.method = r.method().as_str(),
                http.route = r
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str),
                http.target = r
                    .uri()
                    .path_and_query()
                    .map(http::uri::PathAndQuery::as_str),
                http.user_agent = r
                    .headers()
                    .get(http::header::USER_AGENT)
                    .and_then(|h| h.to_str().ok()),
                http.status_code = tracing::field::Empty,
            )
        })
        .on_response(
            |r: &http::Response<axum::body::Body>,
             dur: time::Duration,
             span: &tracing::Span| {
                let status = r.status();
                _ = span.record(
                    "http.status_code",
                    tracing::field::display(status.as_u16()),
                );

                let duration = format!("{}ms", dur.as_millis());
                if status.is_server_error() || status.is_client_error() {
                    tracing::error!(duration = %duration);
                } else {
                    tracing::info!(duration = %duration);
                }
            },
        )
}
