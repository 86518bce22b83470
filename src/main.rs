use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

mod cli;
mod config;
mod extract;
mod fetch;
mod host;
mod models;
mod naming;
mod pipeline;
mod rewrite;
mod server;

use cli::{Cli, Commands, LocalizeArgs, ServeArgs};
use config::{FetchConfig, LocalizeOptions};
use fetch::HttpFetcher;
use host::{DocumentHandle, FileDocument, LogNotifier, OpenError, WorkspaceRoot};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Localize(args) => localize(args).await,
        Commands::Serve(args) => serve(args).await,
    }
}

async fn localize(args: LocalizeArgs) -> ExitCode {
    let fetcher = match HttpFetcher::new(&FetchConfig::from_env().with_timeout(args.timeout)) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "cannot set up downloads");
            return ExitCode::FAILURE;
        }
    };

    let mut document = match FileDocument::open(&args.document) {
        Ok(doc) => Some(doc),
        Err(e @ OpenError::NotUtf8(_)) => {
            error!(error = %e, "document must be UTF-8 encoded");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(path = %args.document.display(), error = %e, "cannot open document");
            None
        }
    };

    let workspaces: Vec<WorkspaceRoot> = if args.workspaces.is_empty() {
        std::env::current_dir()
            .map(WorkspaceRoot::new)
            .into_iter()
            .collect()
    } else {
        args.workspaces.into_iter().map(WorkspaceRoot::new).collect()
    };

    let options = LocalizeOptions {
        images_dir: args.images_dir,
        dedup: args.dedup,
    };

    let result = pipeline::localize_images(
        document.as_mut().map(|d| d as &mut dyn DocumentHandle),
        &workspaces,
        &fetcher,
        &options,
        &mut LogNotifier,
    )
    .await;

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "localize failed");
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: ServeArgs) -> ExitCode {
    let fetcher = match HttpFetcher::new(&FetchConfig::from_env().with_timeout(args.timeout)) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "cannot set up downloads");
            return ExitCode::FAILURE;
        }
    };
    let app = server::router(server::AppState {
        fetcher: Arc::new(fetcher),
    });

    let listener = match tokio::net::TcpListener::bind(args.address).await {
        Ok(l) => l,
        Err(e) => {
            error!(address = %args.address, error = %e, "cannot bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(address = %args.address, "listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
