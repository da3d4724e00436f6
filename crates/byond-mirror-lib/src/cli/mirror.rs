use crate::cli::MirrorParams;
use crate::config::Backend;
use crate::error::MirrorError;
use crate::mirror::{MirrorReport, run_mirror};
use crate::source::HttpSource;

pub async fn run_mirror_command(params: MirrorParams) -> Result<MirrorReport, MirrorError> {
    tracing::info!("Starting BYOND builds download");

    let report = match params.config.download.backend {
        Backend::Http => {
            let mut source = HttpSource::new(params.options.suffixes.clone())?;
            run_mirror(&params.channels, &params.options, &mut source).await?
        }
        Backend::Browser => run_with_browser(&params).await?,
    };

    for channel in &report.channels {
        tracing::info!(
            channel = %channel.channel_id,
            existing = channel.existing,
            remote = channel.remote,
            downloaded = channel.downloaded.len(),
            failed = channel.failed.len(),
            "Channel done"
        );
    }
    if report.failed_count() > 0 {
        tracing::warn!(
            "{} downloads failed; they will be retried on the next run",
            report.failed_count()
        );
    }

    tracing::info!("Finished BYOND builds download");
    Ok(report)
}

#[cfg(feature = "browser")]
async fn run_with_browser(params: &MirrorParams) -> Result<MirrorReport, MirrorError> {
    use crate::download::CompletionTimings;
    use crate::source::{BrowserSource, StdinPrompt};

    let mut source = BrowserSource::new(
        params.config.browser.clone(),
        params.options.suffixes.clone(),
        CompletionTimings::from(&params.config.download),
        params.scratch_dir.clone(),
        params.config.download.manual_pause,
        StdinPrompt::stdin(),
    );
    run_mirror(&params.channels, &params.options, &mut source).await
}

#[cfg(not(feature = "browser"))]
async fn run_with_browser(_params: &MirrorParams) -> Result<MirrorReport, MirrorError> {
    Err(MirrorError::CliArgumentValidation {
        details: "The browser back-end is not available in this build. Rebuild with --features browser.".to_string(),
    })
}
