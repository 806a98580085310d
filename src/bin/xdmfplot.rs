//! Command line pseudocolor plotting of XDMF simulation frames
#![doc(hidden)]

// standard library
use std::path::Path;

// Crate modules
use xdmfplot::plot;
use xdmfplot::settings::Settings;
use xdmfplot::store::Store;
use xdmfplot::transform::PolarGrid;
use xdmfplot::utils::*;
use xdmfplot::varname::{self, VarNames};
use xdmfplot::xdmf::{Document, TimeSource};

// External crates
use anyhow::{anyhow, Result};
use clap::{ArgGroup, Parser};
use kdam::{tqdm, Bar, BarExt};
use log::*;

fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make Info the default)
    let verbosity = cli.verbose + 2;
    logging_init(verbosity, cli.quiet);

    if let Some(n) = cli.threads {
        info!("Thread count {n} accepted, processing stays sequential");
    }

    // tree mode lists the index content and never plots
    if cli.tree {
        for file in &cli.frames {
            let document = Document::read(file)?;
            println!("{}", document.tree_listing());
        }
        return Ok(());
    }

    let path = cli
        .settings
        .as_deref()
        .ok_or_else(|| anyhow!("No settings file provided"))?;
    if matches!(path, "help" | "h") {
        println!("{}", Settings::grammar_help());
        return Ok(());
    }

    if cli.frames.is_empty() {
        return Err(anyhow!("No input frames provided"));
    }

    debug!("Reading settings from {path}");
    let mut settings = Settings::from_file(path)?;
    debug!("Settings: {}", serde_json::to_string_pretty(&settings)?);

    let names = varname::resolve(&settings.variable);
    debug!("Resolved grid '{}', variable '{}'", names.grid, names.variable);
    settings.substitute_placeholders(&names);

    // progress over the file loop unless logging would fight with it
    let mut progress = progress_bar(&cli);
    for file in &cli.frames {
        process_frame(Path::new(file), &settings, &names)?;
        if let Some(bar) = &mut progress {
            bar.update(1)?;
        }
    }

    Ok(())
}

/// Pseudocolor plots of scalar fields from XDMF simulation frames
///
/// Reads each XDMF index, resolves the requested grid and attribute
/// against the HDF5 store it references, and writes one image per frame
/// named <Variable>_<frame stem>.<format>.
///
/// All plot options live in the plaintext settings file. Pass 'help' as
/// the settings path to print the full settings grammar.
///
/// Examples
/// --------
///
///  Typical use:
///     $ xdmfplot -s plot.config frame_0100.xmf
///
///  Every frame of a run:
///     $ xdmfplot -s plot.config run/frame_*.xmf
///
///  List the grids and variables a frame contains:
///     $ xdmfplot --tree frame_0100.xmf
///
///  Print the settings file grammar:
///     $ xdmfplot -s help
///
#[allow(rustdoc::invalid_rust_codeblocks)]
#[derive(Parser, Debug)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help("Typical use: xdmfplot -s plot.config frame_0100.xmf\n\nNOTE: --help shows more detail and examples"),
    term_width(70),
    hide_possible_values(true),
    override_usage("xdmfplot <-s <path>|--tree> <frames>... [options]"),
    group(ArgGroup::new("mode").required(true).args(["settings", "tree"]))
)]
struct Cli {
    // * Positional
    /// Paths to input XDMF frame files
    #[arg(name = "frames")]
    frames: Vec<String>,

    // * Optional
    /// Path to the plaintext settings file
    ///
    /// One option per line as '-option value...'. Pass 'help' or 'h'
    /// instead of a path to print the full grammar.
    #[arg(help_heading("Plot options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    settings: Option<String>,

    /// List all grids and variables found, then exit
    ///
    /// No plotting is attempted and no settings file is needed.
    #[arg(help_heading("Plot options"))]
    #[arg(short, long)]
    tree: bool,

    /// Worker thread count
    ///
    /// Accepted for compatibility. Frames are currently processed
    /// strictly one after another regardless of this value.
    #[arg(help_heading("Plot options"))]
    #[arg(long)]
    #[arg(value_name = "n")]
    threads: Option<usize>,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Resolve, slice and render a single frame
fn process_frame(path: &Path, settings: &Settings, names: &VarNames) -> Result<()> {
    info!("Reading {}", path.display());
    let document = Document::read(path)?;
    match document.creation_time() {
        Some(ctime) => info!("{ctime}"),
        None => warn!("Could not find ctime"),
    }

    let selection = document.resolve(names)?;
    let store = Store::open(&selection.store_path)?;

    let rho = store.read_coordinate(&selection.coordinates[0])?;
    let phi = store.read_coordinate(&selection.coordinates[1])?;
    let field = store.read_field(&selection.field, (rho.len(), phi.len()))?;
    debug!("Field is {:?}, {} coordinate samples", field.dim(), rho.len() + phi.len());

    let (time, since_bounce) = match &selection.time {
        Some(source) => {
            let value = store.time(source)?;
            let since_bounce = matches!(source, TimeSource::Difference { .. });
            debug!("Frame time {value} s (bounce-relative: {since_bounce})");
            (Some(value), since_bounce)
        }
        None => {
            warn!("Static time not found in '{}'", names.grid);
            (None, false)
        }
    };

    let grid = PolarGrid::new(rho, phi);
    let frame = plot::Frame::new(&field, &grid, settings, time, since_bounce)?;

    let output = plot::output_name(names, path, settings.image_format);
    info!("Writing {}", output.display());
    plot::render(&frame, settings.image_size, settings.image_format, &output)?;
    Ok(())
}

/// Progress bar over the frame loop, skipped when logging would clash
fn progress_bar(cli: &Cli) -> Option<Bar> {
    (cli.frames.len() > 1 && !cli.quiet && cli.verbose == 0)
        .then(|| tqdm!(total = cli.frames.len(), desc = "frames"))
}

/// generates a banner for cli tool consistency
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "XdmfPlot :: Pseudocolor");
    s += &f!("{:-<1$}", "", 70);
    s
}

fn logging_init(verbosity: u8, quiet: bool) {
    stderrlog::new()
        .modules(vec![
            module_path!(),
            "xdmfplot::settings",
            "xdmfplot::xdmf",
            "xdmfplot::store",
            "xdmfplot::plot",
        ])
        .quiet(quiet)
        .verbosity(verbosity as usize)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}
