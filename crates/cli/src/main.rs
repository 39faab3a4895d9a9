#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use magic_mirror_core::config::{
    resolve_api_key, resolve_string_with_default, ApiKeys, AppConfig, CameraConfig, Env,
    GenerationConfig, GenerationTimeout, RefreshCooldown, StdEnv, WindowCapacity,
    DEFAULT_API_BASE, DEFAULT_CASCADE_PATH, DEFAULT_COOLDOWN_MS, DEFAULT_DEVICE_INDEX,
    DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_GENERATION_MODEL,
    DEFAULT_GENERATION_TIMEOUT_MS, DEFAULT_WINDOW_CAPACITY, ENV_CASCADE_PATH, ENV_GROQ_API_KEY,
};
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "magic-mirror")]
#[command(about = "Interactive mirror kiosk: emotion-aware captions over a live camera feed")]
struct Args {
    #[arg(long, default_value_t = DEFAULT_DEVICE_INDEX)]
    device: i32,

    #[arg(long, default_value_t = DEFAULT_FRAME_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = DEFAULT_FRAME_HEIGHT)]
    height: u32,

    #[arg(long, default_value_t = DEFAULT_WINDOW_CAPACITY)]
    window_capacity: usize,

    #[arg(long, default_value_t = DEFAULT_COOLDOWN_MS)]
    cooldown_ms: u64,

    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT_MS)]
    generation_timeout_ms: u64,

    #[arg(long)]
    groq_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_GENERATION_MODEL)]
    model: String,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    #[arg(long)]
    cascade: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        device = cfg.camera.device_index,
        width = cfg.camera.frame_width,
        height = cfg.camera.frame_height,
        window_capacity = cfg.window_capacity.get(),
        cooldown_ms = cfg.cooldown.millis,
        model = %cfg.generation.model,
        "config loaded"
    );

    run_mirror(cfg).await
}

#[cfg(feature = "opencv")]
async fn run_mirror(cfg: AppConfig) -> anyhow::Result<()> {
    use magic_mirror_core::capture::OpenCvCaptureSource;
    use magic_mirror_core::emotion::EmotionAggregator;
    use magic_mirror_core::pipeline::MirrorPipeline;
    use magic_mirror_core::quote::{
        CannedQuoteGenerator, GenerationGate, GroqQuoteGenerator, QuoteGenerator,
    };
    use magic_mirror_core::render::HighguiRenderSink;
    use magic_mirror_core::vision::{BasicFaceClassifier, CascadeFaceLocator};
    use std::sync::Arc;

    let capture = OpenCvCaptureSource::new(cfg.camera)?;
    let locator = CascadeFaceLocator::new(&cfg.cascade_path)?;
    let classifier = BasicFaceClassifier::new();

    let generator: Arc<dyn QuoteGenerator> = match cfg.api_keys.groq.clone() {
        Some(key) => Arc::new(GroqQuoteGenerator::new(
            key.expose().to_owned(),
            cfg.generation.model.clone(),
            cfg.generation.api_base.clone(),
        )),
        None => {
            tracing::warn!("no Groq API key configured, falling back to canned quotes");
            Arc::new(CannedQuoteGenerator::new())
        }
    };

    let render = HighguiRenderSink::new(
        "Magic Mirror",
        cfg.camera.frame_width,
        cfg.camera.frame_height,
    )?;

    let mut pipeline = MirrorPipeline {
        capture,
        locator,
        classifier,
        generator,
        render,
        aggregator: Arc::new(EmotionAggregator::new(cfg.window_capacity)),
        gate: Arc::new(GenerationGate::new(cfg.cooldown, cfg.generation.timeout)),
    };

    pipeline.run().await?;
    Ok(())
}

#[cfg(not(feature = "opencv"))]
async fn run_mirror(_cfg: AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("built without camera support; rebuild with the `opencv` feature")
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let window_capacity = WindowCapacity::new(args.window_capacity)?;
    let cooldown = RefreshCooldown::new(args.cooldown_ms)?;
    let timeout = GenerationTimeout::new(args.generation_timeout_ms)?;
    let generation = GenerationConfig::new(args.model, &args.api_base, timeout)?;

    let groq = resolve_api_key(args.groq_api_key, ENV_GROQ_API_KEY, env)?;
    let cascade_path =
        resolve_string_with_default(args.cascade, ENV_CASCADE_PATH, env, DEFAULT_CASCADE_PATH);

    Ok(AppConfig {
        camera: CameraConfig {
            device_index: args.device,
            frame_width: args.width,
            frame_height: args.height,
        },
        window_capacity,
        cooldown,
        generation,
        api_keys: ApiKeys { groq },
        cascade_path,
        start_time: SystemTime::now(),
    })
}
