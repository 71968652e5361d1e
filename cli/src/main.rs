use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use gtfs_via_postgres::{Input, Options, Script, reader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Convert GTFS files into one PostgreSQL/PostGIS script.
#[derive(Parser, Debug, Clone)]
#[command(name = "gtfs-to-sql", version)]
struct Args {
    /// GTFS files, or directories to take every `*.txt` file from.
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    /// Don't show progress on stderr.
    #[arg(short, long)]
    silent: bool,

    /// Fail if a file depends on another one which wasn't passed.
    #[arg(short = 'd', long)]
    require_dependencies: bool,

    /// Skip files without a formatter instead of failing.
    #[arg(short = 'u', long = "ignore-unsupported")]
    ignore_unsupported_files: bool,

    /// Don't check that trips reference an existing shape. Implied unless
    /// `shapes.txt` is passed.
    #[arg(long)]
    trips_without_shape_id: bool,

    /// Don't require routes to reference an agency.
    #[arg(long)]
    routes_without_agency_id: bool,

    /// Don't import `stops.level_id`. Implied unless `levels.txt` is passed.
    #[arg(long)]
    stops_without_level_id: bool,

    /// Create a spatial index on the stop locations.
    #[arg(long)]
    stops_location_index: bool,

    /// Schema to create all tables, views and functions in.
    #[arg(long, default_value = "public")]
    schema: String,

    /// Create a read-only `postgraphile` role at the end of the script.
    #[arg(long)]
    postgraphile: bool,

    /// Write the script to this file instead of stdout.
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Print the task graph as a Mermaid diagram instead of the script.
    #[arg(long)]
    graph: bool,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            silent: self.silent,
            require_dependencies: self.require_dependencies,
            ignore_unsupported_files: self.ignore_unsupported_files,
            trips_without_shape_id: self.trips_without_shape_id.then_some(true),
            routes_without_agency_id: self.routes_without_agency_id,
            stops_without_level_id: self.stops_without_level_id.then_some(true),
            stops_location_index: self.stops_location_index,
            schema: self.schema.clone(),
            postgraphile: self.postgraphile,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let opts = args.options();

    let paths = expand(&args.files)?;
    debug!(?paths, "input files");

    let inputs = paths
        .iter()
        .map(|path| reader::open(path).with_context(|| format!("Couldn't open {path}")))
        .collect::<anyhow::Result<Vec<Input>>>()?;

    if args.graph {
        let registry = gtfs_via_postgres::plan(inputs, opts)?;
        print!("{registry}");
        return Ok(());
    }

    let script = gtfs_via_postgres::convert(inputs, opts)?;

    match &args.output {
        Some(path) => write_file(script, path),
        None => write_to(script, &mut BufWriter::new(io::stdout().lock())),
    }
}

/// Replaces directories with the `*.txt` files inside them, sorted by name.
fn expand(paths: &[Utf8PathBuf]) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let pattern = format!("{}/*.txt", glob::Pattern::escape(path.as_str()));
        let mut found = glob::glob(&pattern)
            .with_context(|| format!("Invalid directory {path}"))?
            .map(|entry| {
                let entry = entry?;
                Utf8PathBuf::try_from(entry).context("Non UTF-8 file name")
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if found.is_empty() {
            bail!("No *.txt files in {path}");
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn write_to(script: Script, out: &mut impl Write) -> anyhow::Result<()> {
    for chunk in script {
        out.write_all(chunk?.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the script to `path`, removing the file again if anything fails.
fn write_file(script: Script, path: &Utf8Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Couldn't create {path}"))?;

    match write_to(script, &mut BufWriter::new(file)) {
        Ok(()) => {
            info!(%path, "wrote script");
            Ok(())
        }
        Err(err) => {
            if let Err(remove) = fs::remove_file(path) {
                debug!(%path, %remove, "couldn't remove partial output");
            }
            Err(err)
        }
    }
}
