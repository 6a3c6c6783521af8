use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use society_rs::{
    AppState, IntervalSchedule, MailConfig, Mailer, MonthlyReceiptNotifier, MonthlySchedule,
    NotifierConfig, Schedule, SmtpMailer, Society, build_router, get_local_offset,
    graceful_shutdown, logging_middleware, run_complaint_cleanup, run_on_schedule,
};

/// The REST API server for the society portal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The secret used to sign and encrypt session cookies.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// The society's timezone as a canonical timezone name.
    #[arg(long, env = "TIMEZONE", default_value = "Asia/Kolkata")]
    timezone: String,

    /// The SMTP relay used for OTPs and receipts.
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    #[arg(long, env = "SMTP_USERNAME")]
    smtp_username: String,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: String,

    /// The sender address for outgoing email. Defaults to the SMTP username.
    #[arg(long, env = "MAIL_FROM")]
    mail_from: Option<String>,

    /// The society name printed at the top of receipts.
    #[arg(long, env = "SOCIETY_NAME", default_value = "Residential Society")]
    society_name: String,

    /// The society address printed under the name on receipts.
    #[arg(long, env = "SOCIETY_ADDRESS", default_value = "")]
    society_address: String,

    /// Where receipt PDFs are written before being emailed.
    #[arg(long, env = "TEMP_DIR", default_value = "temp")]
    temp_dir: PathBuf,

    /// Send receipts every this many seconds instead of once a month.
    #[arg(long)]
    receipt_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if get_local_offset(&args.timezone).is_none() {
        panic!("\"{}\" is not a canonical timezone name", args.timezone);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let mail_config = MailConfig::new(
        &args.smtp_host,
        args.smtp_port,
        &args.smtp_username,
        &args.smtp_password,
        args.mail_from.clone(),
    );
    let mailer: Arc<dyn Mailer> =
        Arc::new(SmtpMailer::new(&mail_config).expect("Could not create the SMTP mailer."));

    let conn = Connection::open(&args.db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {}", args.db_path));
    let state = AppState::new(conn, &args.secret, &args.timezone, mailer.clone())
        .expect("Could not initialize the database.");

    spawn_receipt_notifier(&args, &state, mailer);
    spawn_complaint_cleanup(&state);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn spawn_receipt_notifier(args: &Args, state: &AppState, mailer: Arc<dyn Mailer>) {
    let notifier = Arc::new(MonthlyReceiptNotifier::new(
        state.db_connection.clone(),
        mailer,
        NotifierConfig {
            temp_dir: args.temp_dir.clone(),
            society: Society {
                name: args.society_name.clone(),
                address: args.society_address.clone(),
            },
        },
        &args.timezone,
    ));

    let schedule: Box<dyn Schedule> = match args.receipt_interval_secs {
        Some(seconds) => {
            tracing::info!("Sending receipts every {seconds} seconds");
            Box::new(IntervalSchedule::new(Duration::from_secs(seconds)))
        }
        None => Box::new(MonthlySchedule::receipts(&args.timezone)),
    };

    tokio::spawn(run_on_schedule(schedule, "monthly receipts", move || {
        let notifier = notifier.clone();
        async move { notifier.run_once().await }
    }));
}

fn spawn_complaint_cleanup(state: &AppState) {
    let db_connection = state.db_connection.clone();
    let schedule = Box::new(IntervalSchedule::new(Duration::from_secs(24 * 60 * 60)));

    tokio::spawn(run_on_schedule(schedule, "complaint cleanup", move || {
        let db_connection = db_connection.clone();
        async move { run_complaint_cleanup(&db_connection) }
    }));
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
