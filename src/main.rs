use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use talkgen::{
    agents::gemini::gemini::GeminiClient,
    config::Config,
    errors::constants::DEFAULT_CONFIG_PATH,
    pipeline::{Pipeline, RenderTarget},
    render::{client::RenderJobClient, job::Credentials},
    speech::{gcp_tts::gcp_tts::GoogleTts, preview::PreviewCache, Voice},
    trace::init_tracing_subscriber,
};

#[derive(Parser, Debug)]
#[command(name = "talkgen", version, about = "Marketing copy and talking-avatar videos for a niche", long_about = None)]
struct Cli {
    /// Business niche, e.g. "Doces artesanais"
    #[arg(long)]
    niche: String,

    /// Config file; TALKGEN_* environment variables are used when it is missing
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write an MP3 preview of the script to this path
    #[arg(long)]
    preview_audio: Option<PathBuf>,

    /// Generate the copy only, without rendering a video
    #[arg(long)]
    skip_video: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config)
        .with_context(|| format!("Cannot load config from {}", cli.config.display()))?;

    let _otel_guard = init_tracing_subscriber(config.otel_http_url.as_deref())?;

    let generator = GeminiClient::new(config.gemini_api_key.clone())
        .with_model(config.gemini_model.clone())
        .with_temperature(config.temperature);

    let mut pipeline = Pipeline::new(generator, config.language.clone(), config.max_script_length);

    if cli.preview_audio.is_some() {
        let tts = GoogleTts::new(config.tts_key());
        pipeline = pipeline.with_preview(
            PreviewCache::new(tts),
            Voice::new(config.tts_language_code.clone(), config.tts_voice.clone()),
        );
    }

    match (&config.render_api_key, cli.skip_video) {
        (Some(render_api_key), false) => {
            let client = RenderJobClient::new(&config.render_base_url, config.request_timeout())?;
            pipeline = pipeline.with_render(RenderTarget {
                client,
                credentials: Credentials::new(render_api_key.clone()),
                voice_id: config.voice_id.clone(),
                voice_provider: config.voice_provider.clone(),
                source_url: config.source_url.clone(),
                policy: config.poll_policy(),
            });
        }
        (None, false) => warn!("No render_api_key configured, skipping video"),
        (_, true) => info!("Video rendering skipped"),
    }

    // Ctrl-C stops polling at the next poll boundary
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping render polling");
                cancel.cancel();
            }
        }
    });

    let output = pipeline.run(&cli.niche, &cancel).await?;

    for step in &output.copy.steps {
        println!("### {}\n\n{}\n", step.role, step.output);
    }
    println!("### Script\n\n{}\n", output.utterance);

    if let (Some(path), Some(audio)) = (&cli.preview_audio, &output.preview_audio) {
        tokio::fs::write(path, audio)
            .await
            .with_context(|| format!("Cannot write preview to {}", path.display()))?;
        println!("Preview audio: {}", path.display());
    }

    if let Some(url) = output.video.as_ref().and_then(|video| video.result_url()) {
        println!("Video: {url}");
    }

    Ok(())
}
