//! Take a screenshot with ImageMagick's `import`, optionally of a window
//! picked through `xwininfo`, and store it under a numbered filename.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, ArgGroup, Parser};
use log::LevelFilter;
use serde::Serialize;

use xshot_core::capture::DEFAULT_CAPTURE_TOOL;
use xshot_core::settings::{
    SettingsSnapshot, DEFAULT_DATE_FORMAT, DEFAULT_DIGITS, DEFAULT_DIRECTORY, DEFAULT_NAME_FORMAT,
};
use xshot_core::window::{parse_window_id, DEFAULT_SELECT_TOOL};
use xshot_core::{
    validate, CaptureInvoker, FileNamer, ImageFormat, NamingSettings, ProcessRunner,
    SelectionMode, WindowHandle, WindowSelector, XshotError,
};

#[derive(Parser, Debug)]
#[command(
    name = "xshot",
    about = "Take a screenshot using ImageMagick's `import', and X window selection"
)]
#[command(group(ArgGroup::new("selection").multiple(false)))]
struct Args {
    /// Select a window to screenshot
    #[arg(short = 'w', long = "window", group = "selection")]
    window_select: bool,

    /// Take screenshot of window with ID <id> (0x.. hex, 0o.. octal, or decimal)
    #[arg(short = 'W', long, value_name = "id", value_parser = window_id, group = "selection")]
    window_id: Option<u64>,

    /// Take screenshot of the root window
    #[arg(short = 'r', long, group = "selection")]
    window_root: bool,

    /// Take screenshot of window named <name>
    #[arg(long, value_name = "name", group = "selection")]
    window_name: Option<String>,

    /// Include window manager decorations in windowed screenshot
    #[arg(short = 'b', long)]
    border: bool,

    /// Store screenshot(s) in <dir>
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "dir",
        default_value = DEFAULT_DIRECTORY,
        value_parser = directory
    )]
    directory: PathBuf,

    /// Use format <format> for the datetime
    #[arg(
        long,
        value_name = "format",
        default_value = DEFAULT_DATE_FORMAT,
        value_parser = date_format
    )]
    date_format: String,

    /// Use format <format> for the filename ({number} and {datetime})
    #[arg(long = "format", value_name = "format", default_value = DEFAULT_NAME_FORMAT)]
    name_format: String,

    /// Prefix every filename with <str>
    #[arg(short = 'p', long, value_name = "str")]
    file_prefix: Option<String>,

    /// Set the screenshot file type to <ext> (png, jpg, gif)
    #[arg(
        short = 't',
        long = "type",
        value_name = "ext",
        default_value = "png",
        value_parser = extension
    )]
    ext: ImageFormat,

    /// Zero-pad the sequence number to <n> digits
    #[arg(long, value_name = "n", default_value_t = DEFAULT_DIGITS)]
    digits: usize,

    /// Write to <file> instead of the next numbered name
    #[arg(short = 'f', long = "file", value_name = "file")]
    filename: Option<PathBuf>,

    /// Print a JSON report instead of the bare filename
    #[arg(long)]
    json: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(long, requires = "json")]
    compact: bool,

    /// Capture program
    #[arg(long, value_name = "prog", default_value = DEFAULT_CAPTURE_TOOL)]
    capture_tool: String,

    /// Window selection program
    #[arg(long, value_name = "prog", default_value = DEFAULT_SELECT_TOOL)]
    select_tool: String,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn selection(&self) -> Option<SelectionMode> {
        if self.window_select {
            Some(SelectionMode::Interactive)
        } else if let Some(id) = self.window_id {
            Some(SelectionMode::Id(id))
        } else if let Some(name) = &self.window_name {
            Some(SelectionMode::Name(name.clone()))
        } else if self.window_root {
            Some(SelectionMode::Root)
        } else {
            None
        }
    }

    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

fn window_id(s: &str) -> Result<u64, String> {
    parse_window_id(s).map_err(|e| e.to_string())
}

fn directory(s: &str) -> Result<PathBuf, String> {
    validate::directory(Path::new(s)).map_err(|e| e.to_string())
}

fn date_format(s: &str) -> Result<String, String> {
    validate::date_format(s).map_err(|e| e.to_string())
}

fn extension(s: &str) -> Result<ImageFormat, String> {
    s.parse::<ImageFormat>().map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Report {
    filename: PathBuf,
    window: Option<WindowHandle>,
    settings: SettingsSnapshot,
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn build_namer(args: &Args) -> Result<FileNamer, XshotError> {
    let mut builder = NamingSettings::builder()
        .directory(&args.directory)
        .name_format(&args.name_format)
        .date_format(&args.date_format)
        .extension(args.ext)
        .digits(args.digits);
    if let Some(prefix) = &args.file_prefix {
        builder = builder.prefix(prefix);
    }
    Ok(FileNamer::new(builder.build()?))
}

fn run(args: &Args) -> Result<Report, XshotError> {
    let mut namer = build_namer(args)?;
    let filename = namer.resolve(args.filename.as_deref())?;

    let runner = ProcessRunner::new();
    let window = match args.selection() {
        Some(mode) => Some(
            WindowSelector::new(&runner)
                .with_program(&args.select_tool)
                .select(&mode)?,
        ),
        None => None,
    };

    let settings = namer.settings().snapshot();
    if let Ok(json) = serde_json::to_string(&settings) {
        log::debug!("taking screenshot with settings: {json}");
    }
    CaptureInvoker::new(&runner)
        .with_program(&args.capture_tool)
        .capture(&filename, window.as_ref(), args.border)?;
    log::info!("screenshot written to {:?}", filename.display().to_string());

    Ok(Report {
        filename,
        window,
        settings,
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level());

    match run(&args) {
        Ok(report) if args.json => {
            let json = if args.compact {
                serde_json::to_string(&report)
            } else {
                serde_json::to_string_pretty(&report)
            };
            match json {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("SerializationError: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Ok(report) => {
            println!("{}", report.filename.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
