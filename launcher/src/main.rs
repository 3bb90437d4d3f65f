mod cli;

use axum::Router;
use backend::ServerConfig;
use backend::config::HelperCommand;
use clap::Parser;
use cli::{Command, InputArgs, RunArgs, ServeArgs, SettingsCommand};
use client::store::settings::reduce;
use client::store::{OutputBuffer, PatternAction, PatternStore, SettingsAction, SettingsStore};
use client::{
    CompanionApi, HttpCompanion, InputSource, LocalStorage, Orchestrator, ReaderProxy, RunOutcome,
};
use shared::models::AppSettings;
use std::error::Error;
use std::io::Write;
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult = Result<(), Box<dyn Error>>;

fn init_tracing(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with((!to_stderr).then(|| tracing_subscriber::fmt::layer()))
        .with(to_stderr.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn open_storage(path: Option<std::path::PathBuf>) -> Result<LocalStorage, Box<dyn Error>> {
    let path = path
        .or_else(LocalStorage::default_path)
        .ok_or("Could not determine a config directory; pass --storage")?;
    Ok(LocalStorage::open(path))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    // Only the server keeps stdout for logs; everything else prints results there.
    init_tracing(!matches!(cli.command, Command::Serve(_)));

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: cli::Cli) -> CliResult {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Run(args) => run(args, open_storage(cli.storage)?).await,
        Command::Patterns {
            query,
            favorites,
            server,
        } => list_patterns(open_storage(cli.storage)?, query, favorites, server).await,
        Command::Favorite { name } => toggle_favorite(open_storage(cli.storage)?, name),
        Command::Settings { action } => settings(open_storage(cli.storage)?, action),
    }
}

async fn serve(args: ServeArgs) -> CliResult {
    let config = ServerConfig {
        patterns_dir: args.patterns_dir,
        transcript_helper: args
            .transcript_helper
            .as_deref()
            .and_then(HelperCommand::parse)
            .unwrap_or_default(),
        ..ServerConfig::default()
    };
    if let Some(script) = config.transcript_helper.script()
        && !script.is_file()
    {
        tracing::warn!(
            "Transcript helper script not found at {}; YouTube input will fail",
            script.display()
        );
    }
    let addr = SocketAddr::new(args.host, args.port);
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let router = backend::init(Router::new(), &config);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

fn input_source(
    input: InputArgs,
    include_timestamps: bool,
    language: Option<String>,
) -> Result<InputSource, Box<dyn Error>> {
    let source = match (input.text, input.url, input.youtube) {
        (Some(text), _, _) if text == "-" => {
            InputSource::Text(std::io::read_to_string(std::io::stdin())?)
        }
        (Some(text), _, _) => InputSource::Text(text),
        (_, Some(url), _) => InputSource::Url(url),
        (_, _, Some(url)) => InputSource::YouTube {
            url,
            include_timestamps,
            language,
        },
        (None, None, None) => return Err("One of --text, --url or --youtube is required".into()),
    };
    Ok(source)
}

async fn run(args: RunArgs, storage: LocalStorage) -> CliResult {
    // Command line overrides apply to this run only.
    let mut settings = SettingsStore::load(storage.clone()).settings().clone();
    if let Some(vendor) = args.vendor {
        settings = reduce(&settings, SettingsAction::SetVendor(vendor));
    }
    if let Some(model) = args.model {
        settings = reduce(&settings, SettingsAction::SetModel(model));
    }
    if let Some(server) = args.server {
        settings = reduce(&settings, SettingsAction::SetServerUrl(server));
    }
    if let Some(strategy) = args.strategy {
        settings = reduce(&settings, SettingsAction::SetStrategy(strategy.into()));
    }

    let api = HttpCompanion::new(settings.server_url.clone());
    let reader = ReaderProxy::new(settings.reader_proxy.clone());
    let mut patterns = PatternStore::load(storage);
    if let Err(e) = patterns.load_catalog(api.list_patterns().await) {
        tracing::warn!("Pattern catalog unavailable, using demo patterns: {}", e);
    }
    patterns.dispatch(PatternAction::Select(args.pattern.clone()))?;
    if patterns.state().selected().is_none() {
        return Err(format!("Unknown pattern: {}", args.pattern).into());
    }

    let source = input_source(args.input, args.timestamps, args.lang)?;
    let orchestrator = Orchestrator::new(&api, &reader);
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut output = OutputBuffer::default();
    let mut stdout = std::io::stdout();
    let outcome = orchestrator
        .run(
            &settings,
            patterns.state().selected(),
            &source,
            &mut output,
            &mut |chunk: &str| {
                let _ = stdout.write_all(chunk.as_bytes());
                let _ = stdout.flush();
            },
        )
        .await;
    println!();

    match outcome? {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Cancelled => {
            eprintln!("Cancelled.");
            Ok(())
        }
    }
}

async fn list_patterns(
    storage: LocalStorage,
    query: Option<String>,
    favorites_only: bool,
    server: Option<String>,
) -> CliResult {
    let settings = SettingsStore::load(storage.clone()).settings().clone();
    let api = HttpCompanion::new(server.unwrap_or(settings.server_url));
    let mut patterns = PatternStore::load(storage);
    if let Err(e) = patterns.load_catalog(api.list_patterns().await) {
        eprintln!("Could not load patterns ({}); showing demo patterns.", e.message());
    }
    if let Some(query) = query {
        patterns.dispatch(PatternAction::SetQuery(query))?;
    }

    let state = patterns.state();
    for pattern in state.visible() {
        let favorite = state.is_favorite(&pattern.name);
        if favorites_only && !favorite {
            continue;
        }
        println!("{} {}", if favorite { "*" } else { " " }, pattern.name);
    }
    Ok(())
}

fn toggle_favorite(storage: LocalStorage, name: String) -> CliResult {
    let mut patterns = PatternStore::load(storage);
    patterns.dispatch(PatternAction::ToggleFavorite(name.clone()))?;
    if patterns.state().is_favorite(&name) {
        println!("Added {} to favorites", name);
    } else {
        println!("Removed {} from favorites", name);
    }
    Ok(())
}

/// Keys this short are hidden entirely.
const MIN_PARTIALLY_SHOWN_KEY: usize = 9;

fn mask(key: &str) -> String {
    if key.chars().count() < MIN_PARTIALLY_SHOWN_KEY {
        return "********".to_string();
    }
    let visible: String = key.chars().take(4).collect();
    format!("{visible}****")
}

fn masked(settings: &AppSettings) -> AppSettings {
    let mut shown = settings.clone();
    for key in shown.credentials.values_mut() {
        if !key.is_empty() {
            *key = mask(key);
        }
    }
    shown
}

fn settings(storage: LocalStorage, action: SettingsCommand) -> CliResult {
    let mut store = SettingsStore::load(storage);
    let actions = match action {
        SettingsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&masked(store.settings()))?);
            return Ok(());
        }
        SettingsCommand::SetKey { vendor, key } => {
            vec![SettingsAction::SetCredential { vendor, key }]
        }
        SettingsCommand::SetVendor { vendor } => vec![SettingsAction::SetVendor(vendor)],
        SettingsCommand::SetModel { model } => vec![SettingsAction::SetModel(model)],
        SettingsCommand::SetTheme { theme } => vec![SettingsAction::SetTheme(theme.into())],
        SettingsCommand::SetReasoning { effort } => {
            vec![SettingsAction::SetReasoningEffort(effort.into())]
        }
        SettingsCommand::SetStrategy { strategy } => {
            vec![SettingsAction::SetStrategy(strategy.into())]
        }
        SettingsCommand::SetSampling { temperature, top_p } => temperature
            .map(SettingsAction::SetTemperature)
            .into_iter()
            .chain(top_p.map(SettingsAction::SetTopP))
            .collect(),
        SettingsCommand::SetServer { url } => vec![SettingsAction::SetServerUrl(url)],
        SettingsCommand::SetOllamaUrl { url } => vec![SettingsAction::SetOllamaUrl(url)],
    };
    for action in actions {
        store.dispatch(action)?;
    }
    tracing::info!("Settings saved");
    Ok(())
}
