//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    inspect_dir, run, BatchConfig, BatchOutput, BatchProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

/// Colour only when stderr is a terminal and `NO_COLOR` is unset.
fn colour_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none())
}

fn paint(code: &str, s: &str, enabled: bool) -> String {
    if enabled {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

fn green(s: &str) -> String {
    paint("32", s, colour_enabled())
}
fn red(s: &str) -> String {
    paint("31", s, colour_enabled())
}
fn dim(s: &str) -> String {
    paint("2", s, colour_enabled())
}
fn bold(s: &str) -> String {
    paint("1", s, colour_enabled())
}
fn cyan(s: &str) -> String {
    paint("36", s, colour_enabled())
}

/// How per-document progress is reported on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feedback {
    /// indicatif bar; only drawn on a terminal.
    Bar,
    /// One plain line per event.
    Plain,
    /// `--quiet`.
    Silent,
}

fn choose_feedback(quiet: bool, no_progress: bool, stderr_is_terminal: bool) -> Feedback {
    if quiet {
        Feedback::Silent
    } else if no_progress || !stderr_is_terminal {
        Feedback::Plain
    } else {
        Feedback::Bar
    }
}

/// Default log filter when `RUST_LOG` is unset. Progress lines already
/// cover what the library logs at INFO.
fn log_filter(verbose: bool, feedback: Feedback) -> &'static str {
    match (verbose, feedback) {
        (true, _) => "debug",
        (false, Feedback::Plain) => "warn",
        (false, Feedback::Bar | Feedback::Silent) => "error",
    }
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar over documents plus one log line
/// per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the document currently being converted.
    started: Mutex<Option<Instant>>,
    pages: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` tells us how many documents there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Listing PDF files…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            pages: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Leave the bar on screen after a fail-fast abort.
    fn abandon(&self) {
        self.bar.abandon();
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_documents} PDF files"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, name: &str, page_count: usize) {
        let secs = self.elapsed_secs();
        self.pages.fetch_add(page_count, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{page_count} pages")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, name: &str, error: String) {
        let secs = self.elapsed_secs();
        let first_line = error.lines().next().unwrap_or_default().to_string();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, converted: usize) {
        let failed = total_documents.saturating_sub(converted);
        let pages = self.pages.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} All PDF conversions completed: {} documents, {} pages",
                green("✔"),
                bold(&converted.to_string()),
                bold(&pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted, {} pages  ({} failed)",
                if converted == 0 { red("✘") } else { cyan("⚠") },
                bold(&converted.to_string()),
                total_documents,
                pages,
                red(&failed.to_string()),
            );
        }
    }
}

/// Plain line-per-event output for `--no-progress` or when stderr is not a
/// terminal.
struct PlainProgressCallback;

impl BatchProgressCallback for PlainProgressCallback {
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        eprintln!("[{index}/{total}] Converting: {name}");
    }

    fn on_document_complete(&self, _index: usize, _total: usize, name: &str, page_count: usize) {
        eprintln!("{name} conversion completed: {page_count} pages");
    }

    fn on_document_error(&self, _index: usize, _total: usize, name: &str, error: String) {
        eprintln!("{name} failed: {error}");
    }

    fn on_batch_complete(&self, total_documents: usize, converted: usize) {
        eprintln!("All PDF conversions completed ({converted}/{total_documents} documents)");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every PDF in ./pdfs into ./images/{name}/{name}_page_{n}.jpg
  pdf2img ./pdfs ./images

  # Lower resolution, higher JPEG quality
  pdf2img --dpi 150 --quality 90 ./pdfs ./images

  # Record broken PDFs and keep converting the rest
  pdf2img --keep-going ./pdfs ./images

  # Show which files would be converted
  pdf2img --list-only ./pdfs ./images

  # Machine-readable summary
  pdf2img --json --no-progress ./pdfs ./images > summary.json

OUTPUT LAYOUT:
  OUTPUT_DIR/
  └── report/
      ├── report_page_1.jpg
      └── report_page_2.jpg

  Only files directly in SOURCE_DIR whose name ends in .pdf (any case) are
  converted. Reruns overwrite pages with the same name.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter (e.g. edgequake_pdf2img=debug)

SETUP:
  pdf2img needs the pdfium shared library. It is searched for in this order:
  --pdfium-lib, PDFIUM_LIB_PATH, next to the pdf2img executable, the current
  directory, then the system library path.
  Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases
"#;

/// Convert every PDF in a folder into per-page JPEG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Convert every PDF in a folder into per-page JPEG images",
    long_about = "Convert every PDF file directly inside SOURCE_DIR into JPEG images, one per \
page, written to OUTPUT_DIR/{name}/{name}_page_{n}.jpg. Pages are rendered with pdfium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the PDF files (not searched recursively).
    #[arg(env = "PDF2IMG_SOURCE_DIR")]
    source_dir: PathBuf,

    /// Output root; one subfolder per PDF is created here.
    #[arg(env = "PDF2IMG_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDF2IMG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Record failed PDFs and continue with the rest instead of stopping.
    #[arg(long, env = "PDF2IMG_KEEP_GOING")]
    keep_going: bool,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDF2IMG_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print the batch summary (BatchOutput) as JSON on stdout.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// List the PDFs that would be converted, then exit.
    #[arg(long)]
    list_only: bool,

    /// Print plain progress lines instead of a progress bar. Implied when
    /// stderr is not a terminal.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let feedback = choose_feedback(cli.quiet, cli.no_progress, io::stderr().is_terminal());
    let filter = log_filter(cli.verbose, feedback);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_only {
        let candidates = inspect_dir(&cli.source_dir)
            .await
            .context("Failed to list source directory")?;

        if cli.json {
            let names: Vec<_> = candidates
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "path": c.path,
                        "base_name": c.base_name,
                        "output_dir": cli.output_dir.join(&c.base_name),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&names).context("Failed to serialise listing")?
            );
        } else {
            for c in &candidates {
                println!(
                    "{}  →  {}",
                    c.path.display(),
                    cli.output_dir.join(&c.base_name).display()
                );
            }
            if !cli.quiet {
                eprintln!("{} PDF files", candidates.len());
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let bar_cb = match feedback {
        Feedback::Bar => Some(CliProgressCallback::new_dynamic()),
        Feedback::Plain | Feedback::Silent => None,
    };
    let progress_cb: Option<ProgressCallback> = match (feedback, &bar_cb) {
        (Feedback::Bar, Some(cb)) => Some(Arc::clone(cb) as Arc<dyn BatchProgressCallback>),
        (Feedback::Plain, _) => Some(Arc::new(PlainProgressCallback)),
        _ => None,
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run batch ────────────────────────────────────────────────────────
    let output = match run(&config).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref cb) = bar_cb {
                cb.abandon();
            }
            return Err(e).context("Batch conversion failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        print_summary(&output);
    }

    let failed = output.stats.failed_documents;
    if failed > 0 {
        anyhow::bail!(
            "{} of {} documents failed",
            failed,
            output.stats.total_documents
        );
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder(&cli.source_dir, &cli.output_dir)
        .dpi(cli.dpi)
        .jpeg_quality(cli.quality)
        .keep_going(cli.keep_going);

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &BatchOutput) {
    for doc in output.failures() {
        if let Some(ref e) = doc.error {
            eprintln!("   {} {}", red("✗"), e);
        }
    }
    eprintln!(
        "   {} pages in {}  —  {}ms total",
        dim(&output.stats.total_pages.to_string()),
        dim(&format!("{} documents", output.stats.converted_documents)),
        output.stats.total_duration_ms,
    );
}
