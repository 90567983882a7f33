//! Queue-metric CSV loading.
//!
//! Columns are found by header name. Each logical column accepts its domain
//! symbol and a few ASCII aliases (matched case-insensitively):
//!
//! | Column        | Header names                          |
//! |---------------|---------------------------------------|
//! | arrival rate  | `λ`, `lambda`, `arrival_rate`         |
//! | queue length  | `Lq`, `queue_length`                  |
//! | wait time     | `Wq`, `wait_time`                     |
//! | servers       | `s`, `servers`, `c`                   |
//! | utilization   | `ρ`, `rho`, `utilization`             |
//!
//! Rows whose used cells are empty, unparsable, NaN or infinite are dropped
//! and counted.

use crate::backend::{Backend, Tensor1D, Tensor2D};
use crate::config::DatasetKind;
use crate::error::{ModelError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const ARRIVAL_RATE: &[&str] = &["λ", "lambda", "arrival_rate"];
const QUEUE_LENGTH: &[&str] = &["lq", "queue_length"];
const WAIT_TIME: &[&str] = &["wq", "wait_time"];
const SERVERS: &[&str] = &["s", "servers", "c"];
const UTILIZATION: &[&str] = &["ρ", "rho", "utilization"];

/// One filtered row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueRecord {
    pub arrival_rate: f64,
    pub queue_length: f64,
    pub wait_time: f64,
    /// Present only when the file has a servers column with a finite value.
    pub servers: Option<f64>,
    /// Always present for the multi-server dataset.
    pub utilization: Option<f64>,
}

/// Filtered rows of one dataset.
#[derive(Debug, Clone)]
pub struct QueueData {
    kind: DatasetKind,
    records: Vec<QueueRecord>,
    total_rows: usize,
}

struct Columns {
    arrival_rate: usize,
    queue_length: usize,
    wait_time: usize,
    servers: Option<usize>,
    utilization: Option<usize>,
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

fn require_column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    find_column(headers, names).ok_or_else(|| {
        ModelError::MissingColumn(format!(
            "none of [{}] in header [{}]",
            names.join(", "),
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })
}

impl Columns {
    fn resolve(headers: &StringRecord, kind: DatasetKind) -> Result<Self> {
        let utilization = if kind.has_utilization() {
            Some(require_column(headers, UTILIZATION)?)
        } else {
            None
        };
        Ok(Self {
            arrival_rate: require_column(headers, ARRIVAL_RATE)?,
            queue_length: require_column(headers, QUEUE_LENGTH)?,
            wait_time: require_column(headers, WAIT_TIME)?,
            servers: find_column(headers, SERVERS),
            utilization,
        })
    }
}

/// `Some` for a finite number, `None` for anything else.
fn finite_cell(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl QueueData {
    /// Loads and filters a CSV file.
    ///
    /// # Errors
    /// I/O and CSV structure errors, or [`ModelError::MissingColumn`].
    pub fn load<P: AsRef<Path>>(path: P, kind: DatasetKind) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let data = Self::from_reader(BufReader::new(file), kind)?;
        info!(
            "Loaded {} dataset from {}: {} rows kept, {} dropped",
            kind,
            path.display(),
            data.len(),
            data.dropped()
        );
        Ok(data)
    }

    pub fn from_reader<R: Read>(reader: R, kind: DatasetKind) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let cols = Columns::resolve(&headers, kind)?;

        let mut records = Vec::new();
        let mut total_rows = 0;
        for result in rdr.records() {
            let record = result?;
            total_rows += 1;

            let parsed = (
                finite_cell(&record, cols.arrival_rate),
                finite_cell(&record, cols.queue_length),
                finite_cell(&record, cols.wait_time),
            );
            let utilization = cols.utilization.map(|i| finite_cell(&record, i));

            match (parsed, utilization) {
                ((Some(arrival_rate), Some(queue_length), Some(wait_time)), None | Some(Some(_))) => {
                    records.push(QueueRecord {
                        arrival_rate,
                        queue_length,
                        wait_time,
                        servers: cols.servers.and_then(|i| finite_cell(&record, i)),
                        utilization: utilization.flatten(),
                    });
                }
                _ => debug!("Dropping row {}: {:?}", total_rows, record),
            }
        }

        Ok(Self {
            kind,
            records,
            total_rows,
        })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn records(&self) -> &[QueueRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Data rows read, before filtering.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Rows removed by filtering.
    pub fn dropped(&self) -> usize {
        self.total_rows - self.records.len()
    }

    pub fn arrival_rates(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.arrival_rate).collect()
    }

    pub fn queue_lengths(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.queue_length).collect()
    }

    pub fn wait_times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.wait_time).collect()
    }

    /// `None` for the single-server dataset.
    pub fn utilizations(&self) -> Option<Vec<f64>> {
        self.records.iter().map(|r| r.utilization).collect()
    }

    /// `(λ, Lq)` feature matrix and `Wq` target.
    pub fn to_tensors<B: Backend>(&self) -> (Tensor2D<B>, Tensor1D<B>) {
        let x: Vec<f64> = self
            .records
            .iter()
            .flat_map(|r| [r.arrival_rate, r.queue_length])
            .collect();
        (
            Tensor2D::new(x, self.records.len(), 2),
            Tensor1D::new(self.wait_times()),
        )
    }
}
