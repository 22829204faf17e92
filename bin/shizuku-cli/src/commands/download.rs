use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use clap::{Args, Parser};
use fake_user_agent::get_chrome_rua;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, REFERER},
    Client,
};
use shizuku::{
    event::DownloadEvent,
    fetch::HttpFetcher,
    track::{TrackOrchestrator, TrackSelection},
    util::fmt::format_bytes,
    DownloadConfig, DownloadConfigBuilder, HttpClient,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::config::load_config;

#[derive(Parser, Clone)]
#[clap(name = "download", visible_alias = "dl", short_flag = 'D')]
pub struct DownloadCommand {
    #[clap(flatten)]
    pub http: HttpOptions,

    #[clap(flatten)]
    pub download: DownloadOptions,

    /// Output file. The extension is replaced to match the stream format
    #[clap(short, long, default_value = "output.ts")]
    pub output: PathBuf,

    /// URL of the playlist to download
    pub url: String,
}

impl DownloadCommand {
    pub async fn download(self) -> anyhow::Result<()> {
        let config = self.download.into_config()?;
        let client = self.http.into_client(&self.url)?;
        let fetcher = HttpFetcher::new(client).with_manifest_timeout(config.manifest_timeout());
        let orchestrator = TrackOrchestrator::new(fetcher, config);

        // first ctrl-c stops the downloaders, the second one exits
        let cancel = orchestrator.cancellation_token();
        let ctrlc_handler = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::info!("Ctrl-C received, stopping downloader.");
            cancel.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received again, force exit.");
                std::process::exit(1);
            }
        });

        let (sender, receiver) = mpsc::unbounded_channel();
        let printer = tokio::spawn(print_events(receiver));
        let result = orchestrator.run(&self.url, Some(sender)).await;
        ctrlc_handler.abort();
        _ = printer.await;
        let output = result?;

        let path = self.output.with_extension(output.primary.extension());
        output.primary.save(&path).await?;
        if let Some(audio) = &output.audio {
            let path = self
                .output
                .with_extension(format!("audio.{}", audio.extension()));
            audio.save(&path).await?;
        }
        if !output.primary.skipped.is_empty() {
            tracing::warn!(
                "{} segments are missing from the output.",
                output.primary.skipped.len()
            );
        }

        Ok(())
    }
}

async fn print_events(mut receiver: UnboundedReceiver<DownloadEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            DownloadEvent::Progress {
                track,
                completed,
                total,
                bytes_downloaded,
            } => tracing::debug!(
                "[{track}] {completed} / {total} segments, {}",
                format_bytes(bytes_downloaded)
            ),
            DownloadEvent::Complete { total_size } => {
                tracing::info!("All finished. {} downloaded.", format_bytes(total_size as u64))
            }
            // info is logged where it is raised, errors are reported on exit
            DownloadEvent::Info(_) | DownloadEvent::Error(_) => {}
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct HttpOptions {
    /// Additional HTTP headers, e.g. "Origin: https://example.com"
    #[clap(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Cookies sent with every request, e.g. "a=1; b=2"
    #[clap(long)]
    pub cookies: Option<String>,

    /// Referer header
    #[clap(long)]
    pub referer: Option<String>,
}

impl HttpOptions {
    pub fn into_client(self, url: &str) -> anyhow::Result<HttpClient> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = &self.referer {
            headers.insert(REFERER, HeaderValue::from_str(referer)?);
        }
        for header in &self.headers {
            let (key, value) = header
                .split_once(':')
                .with_context(|| format!("Invalid header: {header}"))?;
            headers.insert(
                HeaderName::from_str(key.trim())?,
                HeaderValue::from_str(value.trim())?,
            );
        }

        let client = HttpClient::new(
            Client::builder()
                .default_headers(headers)
                .user_agent(get_chrome_rua()),
        )?;
        if let Some(cookies) = &self.cookies {
            client.add_cookies(cookies.split(';').map(str::trim), url)?;
        }
        Ok(client)
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct DownloadOptions {
    /// Segments downloaded at the same time, per stream
    #[clap(long, alias = "threads")]
    pub concurrency: Option<NonZeroUsize>,

    /// Segment retry limit
    #[clap(long, alias = "segment-retries")]
    pub retries: Option<u32>,

    /// Manifest retry limit
    #[clap(long)]
    pub manifest_retries: Option<u32>,

    /// Manifest request timeout, in seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Only download the audio track
    #[clap(long)]
    pub audio_only: bool,

    /// TOML file with download settings. Command line options take precedence
    #[clap(long, env = "SHIZUKU_CONFIG")]
    pub config: Option<PathBuf>,
}

impl DownloadOptions {
    pub fn into_config(self) -> anyhow::Result<DownloadConfig> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => DownloadConfig::default(),
        };

        let mut builder = DownloadConfigBuilder::from(base);
        if let Some(concurrency) = self.concurrency {
            builder = builder.concurrency(concurrency);
        }
        if let Some(retries) = self.retries {
            builder = builder.segment_retries(retries);
        }
        if let Some(retries) = self.manifest_retries {
            builder = builder.manifest_retries(retries);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.manifest_timeout(Duration::from_secs(timeout));
        }
        if self.audio_only {
            builder = builder.selection(TrackSelection::AudioOnly);
        }
        Ok(builder.build())
    }
}
