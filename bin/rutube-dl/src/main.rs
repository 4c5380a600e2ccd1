use std::path::PathBuf;

use clap::Parser;
use rutube::{DownloadSession, InterruptHandle, RutubeResult, SessionConfig};
use tokio::io::BufReader;

mod args;
mod config;
mod progress;
mod prompt;
mod report;

use args::RutubeArgs;
use report::Summary;

fn init_logger(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn handle_ctrl_c(interrupt: InterruptHandle) {
    tokio::spawn(async move {
        // the first ctrl-c stops after the running batch
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        log::warn!("Ctrl-C received, stopping after the current batch.");
        interrupt.interrupt();

        // the second one exits immediately
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received again, force exit.");
            std::process::exit(1);
        }
    });
}

async fn download(
    input: &str,
    config: &SessionConfig,
    choose_quality: bool,
    interrupt: InterruptHandle,
) -> RutubeResult<PathBuf> {
    let bar = progress::segment_bar();
    let mut session = DownloadSession::new(input, config.clone())?
        .with_interrupt_handle(interrupt)
        .on_progress({
            let bar = bar.clone();
            move |completed, total| progress::update(&bar, completed, total)
        });

    let info = session.fetch_info().await?;
    log::info!("Title: {}", info.title);
    if let Some(author) = &info.author {
        log::info!("Author: {author}");
    }
    if let Some(duration) = info.duration {
        log::info!("Duration: {}", report::format_duration(duration));
    }

    if choose_quality {
        let stdin = BufReader::new(tokio::io::stdin());
        let quality = prompt::choose_quality(stdin, &info.qualities).await?;
        session.select_quality(quality).await?;
    } else {
        let quality = session.select_best_quality().await?;
        log::info!("Quality: {quality}");
    }

    let path = session.download().await.inspect_err(|_| bar.abandon())?;
    log::info!("Saved to {}", path.display());
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RutubeArgs::parse();
    let config = args.session_config()?;
    init_logger(config.verbose);

    let urls = args.urls()?;
    if urls.is_empty() {
        anyhow::bail!("No url to download.");
    }
    log::info!("Videos will be saved to {}", config.output_dir.display());

    let interrupt = InterruptHandle::new();
    handle_ctrl_c(interrupt.clone());

    let mut summary = Summary::new(urls.len());
    for url in &urls {
        if interrupt.is_interrupted() {
            break;
        }

        let result = download(url, &config, args.quality, interrupt.clone()).await;
        if let Err(e) = &result {
            log::error!("{}", report::describe(url, e));
        }
        summary.record(&result);
    }

    if urls.len() > 1 {
        log::info!("{summary}");
    }
    if !summary.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
