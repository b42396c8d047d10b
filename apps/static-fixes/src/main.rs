mod script;

use clap::ArgAction;
use clap::Parser;
use script::Script;
use sf_core::FixError;
use sf_core::FixResult;
use sf_fixes::FixesConfig;
use sf_fixes::Page;
use sf_fixes::PageLocation;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Applies the static-site DOM fixes to an exported HTML page and writes the
/// patched document.
#[derive(Parser, Debug)]
#[command(name = "static-fixes", version, about, long_about = None)]
struct Cli {
    /// HTML file to patch
    #[arg(required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "STATIC_FIXES_CONFIG")]
    config: Option<PathBuf>,

    /// URL or path the page is served from
    #[arg(short, long, default_value = "/")]
    location: String,

    /// Event script replayed after boot
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Content-Type header value used as a charset hint
    #[arg(long)]
    content_type: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("static-fixes error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
    tracing::debug!(%level, "logging initialised");
}

fn run(cli: &Cli) -> FixResult<()> {
    let config = load_config(cli.config.as_deref())?;
    if cli.print_config {
        return write_output(None, &config.to_toml_string()?);
    }
    let Some(input) = cli.input.as_deref() else {
        return Err(FixError::new("cli.input_missing", "no input file given"));
    };

    let location = PageLocation::parse(&cli.location)?;
    let bytes = std::fs::read(input).map_err(|error| io_error("cli.input_read", input, &error))?;
    let decoded = sf_html::decode_html_bytes(&bytes, cli.content_type.as_deref());
    tracing::debug!(
        path = %input.display(),
        bytes = bytes.len(),
        encoding = decoded.encoding,
        "input decoded"
    );

    let mut page = Page::from_html(&decoded.text, location, config);
    for line in page.boot().to_string().lines() {
        tracing::info!("{line}");
    }

    if let Some(events) = cli.events.as_deref() {
        let text = std::fs::read_to_string(events)
            .map_err(|error| io_error("cli.events_read", events, &error))?;
        let replayed = Script::parse(&text)?.replay(&mut page)?;
        tracing::info!(replayed, path = %events.display(), "event script replayed");
    }

    write_output(cli.output.as_deref(), &page.to_html())
}

/// Defaults when no path is given; otherwise the file must parse and validate.
fn load_config(path: Option<&Path>) -> FixResult<FixesConfig> {
    let Some(path) = path else {
        return Ok(FixesConfig::default());
    };
    let text =
        std::fs::read_to_string(path).map_err(|error| io_error("cli.config_read", path, &error))?;
    let config = FixesConfig::from_toml_str(&text)?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn write_output(path: Option<&Path>, text: &str) -> FixResult<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text).map_err(|error| io_error("cli.output_write", path, &error))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|error| FixError::new("cli.output_write", format!("stdout: {error}")))
        }
    }
}

fn io_error(code: &'static str, path: &Path, error: &std::io::Error) -> FixError {
    FixError::new(code, format!("{}: {error}", path.display()))
}
