use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::DEFAULT_IMAGES_DIR;

#[derive(Parser, Debug)]
#[command(name = "localize-images")]
#[command(
    about = "Download remote <img> sources and point the HTML at local copies",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Localize the images of one HTML document
    Localize(LocalizeArgs),
    /// Serve the localize command over HTTP for editor integrations
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct LocalizeArgs {
    /// HTML document to rewrite
    pub document: PathBuf,

    /// Workspace root; repeatable, the first one is used. Defaults to the current directory
    #[arg(long = "workspace", short = 'w')]
    pub workspaces: Vec<PathBuf>,

    /// Directory created under the workspace root for downloaded images
    #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
    pub images_dir: String,

    /// Download each distinct URL once
    #[arg(long)]
    pub dedup: bool,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub address: SocketAddr,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
