use std::convert::Infallible;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use geoscatter::{CategoryTable, CoordGeo, Dataset, Sample};
use thiserror::Error;
use tracing::{debug, info, span, trace, Level};

use crate::potentially_compressed::PotentiallyCompressedStream;
use crate::progress_reader::ProgressReader;

/// Column layout of socialexplorer.com exports
pub const DEFAULT_LATITUDE_COLUMN: usize = 72;
pub const DEFAULT_LONGITUDE_COLUMN: usize = 73;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column {0} not found in header")]
    MissingColumn(ColumnRef),

    #[error("category {code} not found in header")]
    MissingCategory { code: String },

    #[error("line {line}: row has no column {column}")]
    ShortRow { line: u64, column: usize },

    #[error("line {line}: cannot parse {value:?} in column {column} as {expected}")]
    BadValue {
        line: u64,
        column: usize,
        value: String,
        expected: &'static str,
    },

    #[error("line {line}: {source}")]
    Geometry {
        line: u64,
        #[source]
        source: geoscatter::Error,
    },

    #[error("input contains no samples")]
    EmptyDataset,
}

// --------------------------------------------------------------------------
// ColumnRef

/// A CSV column, given either as a zero-based index or as a header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    fn resolve(&self, header: &StringRecord) -> Result<usize, IngestError> {
        match self {
            ColumnRef::Index(index) if *index < header.len() => Ok(*index),
            ColumnRef::Name(name) => header
                .iter()
                .position(|h| h.trim() == name.as_str())
                .ok_or_else(|| IngestError::MissingColumn(self.clone())),
            _ => Err(IngestError::MissingColumn(self.clone())),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(match s.parse::<usize>() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(index) => write!(f, "{}", index),
            ColumnRef::Name(name) => write!(f, "{}", name),
        }
    }
}

// --------------------------------------------------------------------------
// Reading

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub latitude: ColumnRef,
    pub longitude: ColumnRef,
    pub delimiter: u8,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            latitude: ColumnRef::Index(DEFAULT_LATITUDE_COLUMN),
            longitude: ColumnRef::Index(DEFAULT_LONGITUDE_COLUMN),
            delimiter: b',',
        }
    }
}

/// Opens a plain or gzip-compressed CSV file and reads it into a dataset,
/// logging progress as the file is consumed.
pub fn read_dataset_from_path(
    path: &Path,
    categories: CategoryTable,
    config: &IngestConfig,
) -> Result<Dataset, IngestError> {
    let file = File::open(path)?;
    let progress = ProgressReader::new(file, |n| debug!("Read {} MiB", n / MIB));
    let stream = PotentiallyCompressedStream::detect(BufReader::new(progress))?;
    if stream.is_compressed() {
        debug!("{} is gzip-compressed", path.display());
    }
    read_dataset(stream, categories, config)
}

/// Reads one sample per CSV row. The header row locates the latitude and
/// longitude columns and one column per category code.
pub fn read_dataset<R: Read>(
    reader: R,
    categories: CategoryTable,
    config: &IngestConfig,
) -> Result<Dataset, IngestError> {
    let _span = span!(Level::DEBUG, "read_dataset").entered();

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = csv_reader.headers()?.clone();
    let lat_column = config.latitude.resolve(&header)?;
    let lng_column = config.longitude.resolve(&header)?;
    let category_columns = categories
        .iter()
        .map(|category| {
            header
                .iter()
                .position(|h| h.trim() == category.code)
                .ok_or_else(|| IngestError::MissingCategory {
                    code: category.code.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Latitude in column {}, longitude in column {}, categories in columns {:?}",
        lat_column, lng_column, category_columns
    );

    let mut dataset = Dataset::new(categories);
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let latitude = parse_coordinate(&record, lat_column, line)?;
        let longitude = parse_coordinate(&record, lng_column, line)?;
        let location = CoordGeo::new(latitude, longitude);
        location
            .validate()
            .map_err(|source| IngestError::Geometry { line, source })?;

        let counts = category_columns
            .iter()
            .map(|&column| parse_count(&record, column, line))
            .collect::<Result<Vec<_>, _>>()?;

        let sample = Sample::new(location, counts);
        trace!("line {}: {} dominant={:?}", line, location, sample.dominant_category());
        dataset.push(sample);
    }

    if dataset.is_empty() {
        return Err(IngestError::EmptyDataset);
    }
    info!("Read {} samples", dataset.len());
    Ok(dataset)
}

fn field<'r>(record: &'r StringRecord, column: usize, line: u64) -> Result<&'r str, IngestError> {
    record
        .get(column)
        .map(str::trim)
        .ok_or(IngestError::ShortRow { line, column })
}

fn parse_coordinate(record: &StringRecord, column: usize, line: u64) -> Result<f64, IngestError> {
    let value = field(record, column, line)?;
    value.parse::<f64>().map_err(|_| IngestError::BadValue {
        line,
        column,
        value: value.to_string(),
        expected: "a decimal degree",
    })
}

/// Empty cells count as zero.
fn parse_count(record: &StringRecord, column: usize, line: u64) -> Result<u64, IngestError> {
    let value = field(record, column, line)?;
    if value.is_empty() {
        return Ok(0);
    }
    value.parse::<u64>().map_err(|_| IngestError::BadValue {
        line,
        column,
        value: value.to_string(),
        expected: "a non-negative integer",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscatter::Category;
    use std::io::Cursor;

    fn table() -> CategoryTable {
        CategoryTable::new(vec![
            Category::new("POP_A", "Group A"),
            Category::new("POP_B", "Group B"),
        ])
    }

    fn config() -> IngestConfig {
        IngestConfig {
            latitude: ColumnRef::Name("lat".to_string()),
            longitude: ColumnRef::Name("lng".to_string()),
            delimiter: b',',
        }
    }

    fn read(csv: &str) -> Result<Dataset, IngestError> {
        read_dataset(Cursor::new(csv.as_bytes().to_vec()), table(), &config())
    }

    #[test]
    fn reads_samples_and_envelope() {
        let dataset = read(
            "name,POP_B,lat,lng,POP_A\n\
             \"Tract 1, Manhattan\",10,40.70,-74.00,3\n\
             \"Tract 2, Brooklyn\",2,40.65,-73.95,8\n\
             Tract 3,0,40.80,-73.90,0\n",
        )
        .unwrap();

        assert_eq!(dataset.len(), 3);
        let first = &dataset.samples()[0];
        // counts follow the category table, not the file's column order
        assert_eq!(first.counts(), &[3, 10]);
        assert_eq!(first.dominant_category(), Some(1));
        assert_eq!(dataset.samples()[1].dominant_category(), Some(0));
        assert_eq!(dataset.samples()[2].dominant_category(), None);

        let envelope = dataset.envelope();
        assert_eq!(envelope.min_lat(), Some(40.65));
        assert_eq!(envelope.max_lat(), Some(40.80));
        assert_eq!(envelope.min_lng(), Some(-74.00));
        assert_eq!(envelope.max_lng(), Some(-73.90));
    }

    #[test]
    fn columns_can_be_given_by_index() {
        let config = IngestConfig {
            latitude: ColumnRef::Index(1),
            longitude: ColumnRef::Index(2),
            delimiter: b';',
        };
        let csv = "POP_A;y;x;POP_B\n1;10.5;20.5;2\n";
        let dataset = read_dataset(Cursor::new(csv.as_bytes().to_vec()), table(), &config).unwrap();
        assert_eq!(dataset.samples()[0].location(), CoordGeo::new(10.5, 20.5));
    }

    #[test]
    fn empty_count_cells_are_zero() {
        let dataset = read("lat,lng,POP_A,POP_B\n1.0,2.0,,4\n").unwrap();
        assert_eq!(dataset.samples()[0].counts(), &[0, 4]);
    }

    #[test]
    fn missing_category_column_is_reported() {
        let err = read("lat,lng,POP_A\n1.0,2.0,3\n").unwrap_err();
        assert!(matches!(err, IngestError::MissingCategory { ref code } if code == "POP_B"));
    }

    #[test]
    fn missing_coordinate_column_is_reported() {
        let err = read("latitude,lng,POP_A,POP_B\n1.0,2.0,3,4\n").unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ColumnRef::Name(ref n)) if n == "lat"));
    }

    #[test]
    fn unparsable_values_name_their_line() {
        let err = read("lat,lng,POP_A,POP_B\n1.0,2.0,3,4\nnorth,2.0,3,4\n").unwrap_err();
        assert!(matches!(err, IngestError::BadValue { line: 3, column: 0, .. }));

        let err = read("lat,lng,POP_A,POP_B\n1.0,2.0,-3,4\n").unwrap_err();
        assert!(matches!(err, IngestError::BadValue { line: 2, column: 2, .. }));
    }

    #[test]
    fn short_rows_are_reported() {
        let err = read("lat,lng,POP_A,POP_B\n1.0,2.0,3\n").unwrap_err();
        assert!(matches!(err, IngestError::ShortRow { line: 2, column: 3 }));
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let err = read("lat,lng,POP_A,POP_B\n95.0,2.0,3,4\n").unwrap_err();
        assert!(matches!(err, IngestError::Geometry { line: 2, .. }));
    }

    #[test]
    fn header_only_input_is_empty() {
        let err = read("lat,lng,POP_A,POP_B\n").unwrap_err();
        assert!(matches!(err, IngestError::EmptyDataset));
    }

    #[test]
    fn column_ref_parses_indices_and_names() {
        assert_eq!("72".parse::<ColumnRef>().unwrap(), ColumnRef::Index(72));
        assert_eq!(
            "INTPTLAT".parse::<ColumnRef>().unwrap(),
            ColumnRef::Name("INTPTLAT".to_string())
        );
    }
}
