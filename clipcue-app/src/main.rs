use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use clipcue_comment::CommentApi;
use clipcue_common::observability::{init_logging, LogConfig};
use clipcue_config::{ClipcueConfig, ClipcueConfigLoader};
use clipcue_extract::{extract, normalize_video_url};
use url::Url;

#[derive(Parser)]
#[command(name = "clipcue", version, about = "短视频评论助手")]
struct Cli {
    /// Configuration file. A missing file falls back to built-in defaults
    /// plus CLIPCUE-prefixed environment variables.
    #[arg(long, global = true, default_value = "clipcue.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the CORS-unlocking request-forwarding proxy.
    Serve,
    /// Extract a video's title and ask the API for a comment.
    Comment {
        /// Video page address.
        url: String,
        /// Read a saved HTML snapshot instead of fetching the page.
        #[arg(long)]
        html: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ClipcueConfigLoader::new();
    if cli.config.exists() {
        loader = loader.with_file(&cli.config);
    }
    let cfg = loader.load().context("load configuration")?;

    init_logging(LogConfig::default())?;

    match cli.command {
        Command::Serve => clipcue_proxy::serve(&cfg.proxy).await,
        Command::Comment { url, html } => comment(&cfg, &url, html.as_deref()).await,
    }
}

async fn comment(cfg: &ClipcueConfig, raw_url: &str, snapshot: Option<&Path>) -> Result<()> {
    let url = Url::parse(raw_url).with_context(|| format!("invalid video url: {raw_url}"))?;
    if !cfg.site.matches_host(&url) {
        bail!("请在抖音视频页面使用此插件");
    }
    let url = normalize_video_url(&url, &cfg.site);

    let html = match snapshot {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read snapshot {}", path.display()))?,
        None => fetch_page(&url).await?,
    };

    let Some(video) = extract(&html, &url, &cfg.site) else {
        bail!("无法获取视频信息");
    };
    tracing::info!(title=%video.title, url=%video.url, "app.video_extracted");

    let api = CommentApi::new(&cfg.comment_api.endpoint, cfg.comment_api.auth_token.clone())?;
    let comment = api.generate(&video).await?;

    println!("{comment}");
    Ok(())
}

async fn fetch_page(url: &Url) -> Result<String> {
    let resp = reqwest::get(url.as_str())
        .await
        .with_context(|| format!("fetch page {url}"))?
        .error_for_status()
        .with_context(|| format!("fetch page {url}"))?;
    resp.text().await.context("read page body")
}
