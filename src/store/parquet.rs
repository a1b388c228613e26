// src/store/parquet.rs

use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, instrument};

use super::{artifact_paths, Format, TableStore};
use crate::table::{Cell, Table};

/// One `<name>.parquet` per table, SNAPPY-compressed.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    dir: PathBuf,
}

impl ParquetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// A column is Utf8 if any present cell is text; everything else is Float64.
fn column_type(table: &Table, idx: usize) -> DataType {
    let text = table
        .rows()
        .iter()
        .any(|r| matches!(r[idx], Cell::Text(_)));
    if text {
        DataType::Utf8
    } else {
        DataType::Float64
    }
}

/// Arrow schema for `table`, every field nullable.
pub fn build_arrow_schema(table: &Table) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| ArrowField::new(name, column_type(table, i), true))
        .collect();
    Arc::new(ArrowSchema::new(fields))
}

fn to_arrays(table: &Table, schema: &ArrowSchema) -> Vec<ArrayRef> {
    schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| -> ArrayRef {
            match field.data_type() {
                DataType::Utf8 => Arc::new(StringArray::from(
                    table
                        .rows()
                        .iter()
                        .map(|r| match &r[i] {
                            Cell::Absent => None,
                            c => Some(c.to_string()),
                        })
                        .collect::<Vec<Option<String>>>(),
                )),
                _ => Arc::new(Float64Array::from(
                    table
                        .rows()
                        .iter()
                        .map(|r| r[i].as_f64())
                        .collect::<Vec<Option<f64>>>(),
                )),
            }
        })
        .collect()
}

fn from_batch(batch: &RecordBatch, rows: &mut Vec<Vec<Cell>>) -> Result<()> {
    let start = rows.len();
    rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(batch.num_columns())));
    for (c, column) in batch.columns().iter().enumerate() {
        let name = batch.schema().field(c).name().clone();
        if let Some(arr) = column.as_any().downcast_ref::<StringArray>() {
            for (r, v) in arr.iter().enumerate() {
                rows[start + r].push(v.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Absent));
            }
        } else if let Some(arr) = column.as_any().downcast_ref::<Float64Array>() {
            for (r, v) in arr.iter().enumerate() {
                rows[start + r].push(v.map(Cell::Number).unwrap_or(Cell::Absent));
            }
        } else {
            bail!("column `{name}` has unsupported type {}", column.data_type());
        }
    }
    Ok(())
}

impl TableStore for ParquetStore {
    #[instrument(level = "debug", skip(self, table), fields(rows = table.len()))]
    fn write(&self, name: &str, table: &Table) -> Result<PathBuf> {
        let (final_path, tmp_path) = artifact_paths(&self.dir, name, Format::Parquet);
        let schema = build_arrow_schema(table);
        let batch = RecordBatch::try_new(schema.clone(), to_arrays(table, &schema))
            .context("building record batch")?;

        let file = File::create(&tmp_path)
            .with_context(|| format!("creating `{}`", tmp_path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
            .context("initializing Parquet writer")?;
        writer.write(&batch).context("writing batch to Parquet")?;
        writer.close().context("closing Parquet writer")?;

        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("renaming into `{}`", final_path.display()))?;
        debug!(path = %final_path.display(), "wrote table");
        Ok(final_path)
    }

    #[instrument(level = "debug", skip(self))]
    fn read(&self, name: &str) -> Result<Table> {
        let (path, _) = artifact_paths(&self.dir, name, Format::Parquet);
        let file = File::open(&path).with_context(|| format!("opening `{}`", path.display()))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("reading Parquet metadata of `{}`", path.display()))?;
        let columns: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let reader = builder.with_batch_size(1024).build()?;

        let mut rows = Vec::new();
        for batch in reader {
            from_batch(&batch?, &mut rows)?;
        }
        debug!(rows = rows.len(), "read table");
        Ok(Table::new(name, columns, rows))
    }

    fn dir(&self) -> &Path {
        &self.dir
    }
}
