mod grid_export;
mod ingest;
mod potentially_compressed;
mod progress_reader;
mod render;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use geoscatter::{BoundingBox, CategoryTable, Dataset, GeoGrid};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ingest::{ColumnRef, IngestConfig, DEFAULT_LATITUDE_COLUMN, DEFAULT_LONGITUDE_COLUMN};
use render::Colormap;

#[derive(clap::Parser)]
#[command(about = "Plot geocoded samples and grid bounding boxes with real-world proportions")]
struct ClArgs {
    #[command(subcommand)]
    command: Command,

    /// Verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbosity: u8,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Render a scatter plot of the samples in a CSV file
    Plot(PlotArgs),

    /// Partition a bounding box into cells that are close to square in meters
    Grid(GridArgs),

    /// Print the great-circle distance in meters between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lng1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lng2: f64,
    },
}

#[derive(clap::Args)]
struct CsvArgs {
    /// JSON file listing the categories to count: [{"code": ..., "title": ...}, ...]
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Latitude column, as a zero-based index or a header name
    #[arg(long, default_value_t = ColumnRef::Index(DEFAULT_LATITUDE_COLUMN))]
    lat_column: ColumnRef,

    /// Longitude column, as a zero-based index or a header name
    #[arg(long, default_value_t = ColumnRef::Index(DEFAULT_LONGITUDE_COLUMN))]
    lng_column: ColumnRef,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

impl CsvArgs {
    fn load(&self) -> Result<(CategoryTable, IngestConfig), Box<dyn Error>> {
        let categories = match &self.categories {
            Some(path) => CategoryTable::load(path)?,
            None => CategoryTable::default(),
        };
        if categories.is_empty() {
            return Err("the category table is empty".into());
        }
        let config = IngestConfig {
            latitude: self.lat_column.clone(),
            longitude: self.lng_column.clone(),
            delimiter: u8::try_from(self.delimiter)?,
        };
        Ok((categories, config))
    }

    fn read(&self, input: &Path) -> Result<Dataset, Box<dyn Error>> {
        let (categories, config) = self.load()?;
        info!("Parsing {}", input.display());
        let dataset = ingest::read_dataset_from_path(input, categories, &config)?;
        Ok(dataset)
    }
}

#[derive(clap::Args)]
struct PlotArgs {
    /// Input CSV file (plain or gzip-compressed)
    input: PathBuf,

    /// Output image path; the format follows the extension
    #[arg(short = 'o', long = "output", default_value = "plot.png")]
    output: PathBuf,

    /// Raster width in pixels; the height follows from the data's aspect ratio
    #[arg(long, default_value_t = 512)]
    width: u32,

    /// Point colours (mono, jet, viridis, turbo); all but mono colour by dominant category
    #[arg(long, default_value = "mono")]
    colormap: String,

    #[command(flatten)]
    csv: CsvArgs,
}

#[derive(clap::Args)]
struct GridArgs {
    /// Western edge in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["right", "top", "bottom"])]
    left: Option<f64>,

    /// Eastern edge in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["left", "top", "bottom"])]
    right: Option<f64>,

    /// Northern edge in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["left", "right", "bottom"])]
    top: Option<f64>,

    /// Southern edge in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["left", "right", "top"])]
    bottom: Option<f64>,

    /// Grid the envelope of this CSV file instead, counting samples per cell
    #[arg(long, conflicts_with_all = ["left", "right", "top", "bottom"])]
    input: Option<PathBuf>,

    /// Number of columns; the row count follows from the box's aspect ratio
    #[arg(long)]
    columns: usize,

    /// Print cell centers as `latitude,longitude` instead of JSON records
    #[arg(long)]
    centers: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[command(flatten)]
    csv: CsvArgs,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = ClArgs::parse();
    init_tracing(args.verbosity);

    match args.command {
        Command::Plot(plot) => run_plot(plot),
        Command::Grid(grid) => run_grid(grid),
        Command::Distance { lat1, lng1, lat2, lng2 } => {
            let meters = geoscatter::spherical_distance(lat1, lng1, lat2, lng2)?;
            println!("{}", meters);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("plot_preparer={level}"))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_plot(args: PlotArgs) -> Result<(), Box<dyn Error>> {
    let colormap = Colormap::from_name(&args.colormap).unwrap_or_else(|| {
        warn!("Unknown colormap '{}', using 'mono'", args.colormap);
        Colormap::Mono
    });

    let dataset = args.csv.read(&args.input)?;
    info!("Envelope: {}", dataset.bounding_box()?);

    let projector = dataset.projector(args.width)?;
    info!(
        "Plotting {} samples onto {}x{} pixels",
        dataset.len(),
        projector.width(),
        projector.height()
    );
    let drawn = render::save_scatter_to_image(&dataset, &projector, &args.output, colormap)?;

    for (category, count) in dataset.categories().iter().zip(dataset.dominance_tally()) {
        if count > 0 {
            debug!("{} ({}): dominant in {} samples", category.title, category.code, count);
        }
    }
    info!("Saved {} ({} points)", args.output.display(), drawn);
    Ok(())
}

fn run_grid(args: GridArgs) -> Result<(), Box<dyn Error>> {
    let (bbox, dataset) = match (&args.input, args.left, args.right, args.top, args.bottom) {
        (Some(input), ..) => {
            let dataset = args.csv.read(input)?;
            (dataset.bounding_box()?, Some(dataset))
        }
        (None, Some(left), Some(right), Some(top), Some(bottom)) => {
            (BoundingBox::new(left, right, top, bottom)?, None)
        }
        _ => return Err("either --input or all of --left, --right, --top and --bottom are required".into()),
    };

    let grid = GeoGrid::new(bbox, args.columns)?;
    info!("Rows: {}", grid.rows());
    info!("Columns: {}", grid.columns());
    let (cell_width, cell_height) = grid.cell_meter_size();
    debug!("Cells are about {:.0} x {:.0} m", cell_width, cell_height);

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let written = if args.centers {
        grid_export::write_centers(&grid, out)?
    } else {
        let counts = dataset.as_ref().map(|d| grid_export::count_samples(&grid, d));
        grid_export::write_cells(&grid, counts.as_deref(), out)?
    };
    debug!("Wrote {} cells", written);
    Ok(())
}
