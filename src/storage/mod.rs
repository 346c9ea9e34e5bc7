// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{new_null_array, Array, ArrayRef, Float64Array, Int64Array, RecordBatch};
use arrow_schema::{ArrowError, DataType, Field as ArrowField, Schema, SchemaRef};
use arrow_select::concat::concat_batches;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::utils::error::StorageError;

pub const DATASET_EXTENSION: &str = ".parquet";

/// What to do when the dataset file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WritePolicy {
    /// Append the new rows after the stored ones (no deduplication).
    #[value(name = "merge")]
    MergeWithExisting,
    /// Replace the stored rows with the new batch.
    #[value(name = "overwrite")]
    OverwriteExisting,
}

/// Owns the dataset files under one directory.
///
/// Saves are read-modify-write without locking: only one writer per
/// dataset name may run at a time.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a manager for `base_dir`. The directory is created on first save.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self { base_dir: base_dir.as_ref().to_path_buf() }
    }

    /// Path of the dataset file, adding the extension when `name` lacks it.
    pub fn dataset_path(&self, name: &str) -> PathBuf {
        if name.ends_with(DATASET_EXTENSION) {
            self.base_dir.join(name)
        } else {
            self.base_dir.join(format!("{}{}", name, DATASET_EXTENSION))
        }
    }

    /// Reads a stored dataset back as one batch, or `None` if it does not exist.
    pub fn load(&self, name: &str) -> Result<Option<RecordBatch>, StorageError> {
        let path = self.dataset_path(name);
        if !path.exists() {
            return Ok(None);
        }
        read_dataset(&path).map(Some)
    }

    /// Persists `batch` under `name` following `policy`.
    ///
    /// A fresh dataset is always written as-is. The file is replaced through
    /// a sibling temporary file, so a failed write leaves the previous
    /// contents in place.
    pub fn save(&self, batch: &RecordBatch, name: &str, policy: WritePolicy) -> Result<PathBuf, StorageError> {
        let path = self.dataset_path(name);

        let to_write = if path.exists() {
            match policy {
                WritePolicy::MergeWithExisting => {
                    let existing = read_dataset(&path)?;
                    tracing::info!(
                        "Merging {} new rows into {} stored rows at {}",
                        batch.num_rows(),
                        existing.num_rows(),
                        path.display()
                    );
                    merge_batches(&existing, batch)?
                }
                WritePolicy::OverwriteExisting => {
                    tracing::info!("Overwriting {} with {} rows", path.display(), batch.num_rows());
                    batch.clone()
                }
            }
        } else {
            fs::create_dir_all(&self.base_dir)?;
            tracing::info!("Creating dataset {} with {} rows", path.display(), batch.num_rows());
            batch.clone()
        };

        write_atomically(&path, &to_write)?;
        Ok(path)
    }
}

fn read_dataset(path: &Path) -> Result<RecordBatch, StorageError> {
    let file = fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder.build()?.collect::<Result<Vec<_>, ArrowError>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Column type both sides of a merge agree on.
///
/// A column that is entirely null carries no type information and takes the
/// other side's type. Integer and float columns widen to float.
fn unified_type(name: &str, existing: &ArrayRef, incoming: &ArrayRef) -> Result<DataType, StorageError> {
    let (stored, fresh) = (existing.data_type(), incoming.data_type());
    if stored == fresh || is_all_null(incoming) {
        return Ok(stored.clone());
    }
    if is_all_null(existing) {
        return Ok(fresh.clone());
    }
    match (stored, fresh) {
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => Ok(DataType::Float64),
        _ => Err(StorageError::SchemaConflict(format!(
            "column '{}' is {} in the stored dataset but {} in the new batch",
            name, stored, fresh
        ))),
    }
}

fn is_all_null(column: &ArrayRef) -> bool {
    column.null_count() == column.len()
}

/// Row concatenation over the union of both column sets, stored columns first.
fn merge_batches(existing: &RecordBatch, incoming: &RecordBatch) -> Result<RecordBatch, StorageError> {
    let mut fields: Vec<ArrowField> = Vec::new();
    for (name, column) in named_columns(existing).chain(named_columns(incoming)) {
        if fields.iter().any(|f| f.name() == name) {
            continue;
        }
        let data_type = match (existing.column_by_name(name), incoming.column_by_name(name)) {
            (Some(stored), Some(fresh)) => unified_type(name, stored, fresh)?,
            _ => column.data_type().clone(),
        };
        fields.push(ArrowField::new(name, data_type, true));
    }
    let schema: SchemaRef = Arc::new(Schema::new(fields));

    let aligned = [existing, incoming]
        .iter()
        .map(|batch| align_to_schema(batch, &schema))
        .collect::<Result<Vec<_>, StorageError>>()?;
    Ok(concat_batches(&schema, &aligned)?)
}

fn named_columns(batch: &RecordBatch) -> impl Iterator<Item = (&str, &ArrayRef)> + '_ {
    let schema = batch.schema_ref();
    schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .zip(batch.columns())
}

/// Reorders columns to `schema`, filling columns the batch lacks with nulls.
fn align_to_schema(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch, StorageError> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(column) => conform(field.name(), column, field.data_type()),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>, StorageError>>()?;
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Converts a column to the merged type chosen by `unified_type`.
fn conform(name: &str, column: &ArrayRef, data_type: &DataType) -> Result<ArrayRef, StorageError> {
    if column.data_type() == data_type {
        return Ok(column.clone());
    }
    if is_all_null(column) {
        return Ok(new_null_array(data_type, column.len()));
    }
    match column.as_any().downcast_ref::<Int64Array>() {
        Some(ints) if *data_type == DataType::Float64 => Ok(Arc::new(
            ints.iter().map(|v| v.map(|i| i as f64)).collect::<Float64Array>(),
        )),
        _ => Err(StorageError::SchemaConflict(format!(
            "column '{}' cannot be stored as {}",
            name, data_type
        ))),
    }
}

fn write_atomically(path: &Path, batch: &RecordBatch) -> Result<(), StorageError> {
    let tmp_path = path.with_extension("parquet.tmp");

    let written = write_parquet(&tmp_path, batch).and_then(|_| Ok(fs::rename(&tmp_path, path)?));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    sync_parent_dir(path);

    tracing::debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    fs::File::open(path)?.sync_all()?;
    Ok(())
}

/// Persists the rename itself. Directories cannot be opened for syncing on
/// every platform, so failures are only logged.
fn sync_parent_dir(path: &Path) {
    let Some(dir) = path.parent() else { return };
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!("Could not sync directory {}: {}", dir.display(), e);
    }
}
