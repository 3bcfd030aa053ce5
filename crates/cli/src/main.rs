use anyhow::{Context, Result, bail};
use clap::Parser;
use codeclip_core::{
    ClipboardSink, CodeClip, Config, MonitorEvent, MonitorState, Rectangle, ScreenCapturer,
    SystemClipboard, init,
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often the headless loop drains poller events.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Select which monitor to capture
    #[arg(long)]
    monitor: Option<usize>,

    /// List available monitors and exit
    #[arg(long)]
    list_monitors: bool,

    /// Tesseract language, e.g. "eng" or "eng+deu"
    #[arg(long)]
    lang: Option<String>,

    /// Tesseract page segmentation mode (0-13)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Pause after a code was found, in milliseconds
    #[arg(long)]
    found_pause_ms: Option<u64>,

    /// Pause after a cycle without a code, in milliseconds
    #[arg(long)]
    idle_pause_ms: Option<u64>,

    /// Pause after a failed cycle, in milliseconds
    #[arg(long)]
    failure_pause_ms: Option<u64>,

    /// Region to monitor as X1,Y1,X2,Y2 in physical pixels of the monitor
    #[arg(long, value_name = "X1,Y1,X2,Y2")]
    region: Option<Rectangle>,

    /// Monitor the region without a window (requires --region)
    #[arg(long, requires = "region")]
    headless: bool,

    /// Select a region, scan it once and exit
    #[arg(long, conflicts_with_all = ["region", "headless"])]
    once: bool,
}

impl Args {
    /// Applies command-line overrides on top of settings and environment.
    fn apply(&self, config: &mut Config) {
        if let Some(index) = self.monitor {
            config.monitor_index = index;
        }
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if let Some(psm) = self.psm {
            config.ocr.page_seg_mode = psm;
        }
        if let Some(ms) = self.found_pause_ms {
            config.timings.found = Duration::from_millis(ms);
        }
        if let Some(ms) = self.idle_pause_ms {
            config.timings.idle = Duration::from_millis(ms);
        }
        if let Some(ms) = self.failure_pause_ms {
            config.timings.failure = Duration::from_millis(ms);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Handle --list-monitors
    if args.list_monitors {
        let capturer = ScreenCapturer::new(0).context("Failed to initialize screen capturer")?;
        println!("Available monitors:");
        for info in capturer.list_screens() {
            println!("{}", info);
        }
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    if config.ocr.language.trim().is_empty() {
        bail!("OCR language must not be empty");
    }

    let app = CodeClip::with_config(config)
        .context("Failed to initialize screen capturer. Try using --list-monitors to check indices")?;

    match app.check_ocr() {
        Ok(version) => info!("Using {}", version),
        Err(e) => warn!("{}", e),
    }

    if args.once {
        return run_once(&app);
    }

    match (args.region, args.headless) {
        (Some(region), true) => run_headless(app, region).await,
        (Some(region), false) => app
            .run_with_region(region)
            .context("Failed to run monitor window"),
        (None, _) => app.run_interactive().context("Failed to run monitor window"),
    }
}

/// Selects a region on a frozen snapshot, scans it once and prints the result.
fn run_once(app: &CodeClip) -> Result<()> {
    let shot = match app.run_once() {
        Ok(shot) => shot,
        Err(codeclip_core::AppError::NoRegion) => {
            println!("No region selected");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to scan region"),
    };

    println!("Recognized text:");
    println!("{}", shot.extraction.text);
    println!();

    match &shot.extraction.code {
        Some(code) => {
            println!("Code: {}", code);
            match SystemClipboard::new().set_text(code.as_str()) {
                Ok(()) => println!("(Copied to clipboard)"),
                Err(e) => eprintln!("Warning: Failed to copy to clipboard: {}", e),
            }
        }
        None => println!("No matching code found"),
    }

    let region = shot.region;
    println!(
        "Pixel range: x {}..{}, y {}..{} ({}x{})",
        region.x1(),
        region.x2(),
        region.y1(),
        region.y2(),
        region.width(),
        region.height()
    );
    Ok(())
}

/// Monitors `region` without a window until Ctrl+C.
async fn run_headless(app: CodeClip, region: Rectangle) -> Result<()> {
    let mut controller = app.into_controller();
    controller
        .select_region(region)
        .context("Invalid region")?;
    controller.start().context("Failed to start monitoring")?;
    println!("{}", controller.status());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stop_requested = false;

    loop {
        tokio::select! {
            result = &mut ctrl_c, if !stop_requested => {
                result.context("Failed to listen for Ctrl+C")?;
                controller.stop().context("Failed to stop monitoring")?;
                stop_requested = true;
                println!("Stopping after the current pause...");
            }
            _ = tokio::time::sleep(EVENT_POLL_INTERVAL) => {}
        }

        for event in controller.poll_events() {
            if let MonitorEvent::Status(status) = event {
                println!("{}", status);
            }
        }

        if controller.state() == MonitorState::Selected {
            break;
        }
    }

    controller.shutdown();
    if let Some(code) = controller.last_code() {
        info!("Last code: {}", code);
    }
    Ok(())
}
