use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use terragrunt_analyzer::{ServerConfig, TerragruntLanguageServer};

const LOG_FILE_NAME: &str = "terragrunt-analyzer.log";

#[derive(Parser, Debug)]
#[command(name = "terragrunt-analyzer", version, about)]
struct Args {
    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs_or_tmp().join(LOG_FILE_NAME)
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".terragrunt-analyzer");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn init_logging(
    verbose: bool,
    log_path: &Path,
) -> Result<(), String> {
    let stderr_filter = if verbose {
        EnvFilter::new("terragrunt_analyzer=debug,tower_lsp=debug")
    } else {
        EnvFilter::new("terragrunt_analyzer=info,tower_lsp=warn")
    };

    let file_filter = if verbose {
        EnvFilter::new("terragrunt_analyzer=debug,tower_lsp=info")
    } else {
        EnvFilter::new("terragrunt_analyzer=info,tower_lsp=warn")
    };

    let directory = log_path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(directory).map_err(|err| format!("cannot create {}: {err}", directory.display()))?;
    let file_appender =
        tracing_appender::rolling::never(directory, log_path.file_name().unwrap_or(OsStr::new(LOG_FILE_NAME)));

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(file_filter);

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).try_init().map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);

    if let Err(err) = init_logging(args.verbose, &log_path) {
        eprintln!("terragrunt-analyzer: failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let config = Arc::new(ServerConfig::from_build());
    info!("Starting {} server v{}", config.server_info.name, config.server_info.version);
    info!("Log file: {}", log_path.display());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| TerragruntLanguageServer::new(client, Arc::clone(&config)));

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("{} server stopped", config.server_info.name);
    ExitCode::SUCCESS
}
