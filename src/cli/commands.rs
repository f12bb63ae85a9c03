use crate::error::SheetResult;
use crate::excel::{column_labels, RowBatchSink, RowImporter};
use crate::job::{self, ExportJob, ImportJob};
use crate::types::Record;
use colored::Colorize;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Directory a job file's relative paths are resolved against
fn job_dir(job: &Path) -> PathBuf {
    job.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Execute the export command
pub fn export(input: PathBuf, job: PathBuf, output: PathBuf, verbose: bool) -> SheetResult<()> {
    println!("{}", "📤 Sheetport - Export".bold().green());
    println!("   Records: {}", input.display());
    println!("   Job:     {}", job.display());
    println!("   Output:  {}\n", output.display());

    let export_job = ExportJob::load(&job)?;
    let records = job::load_records(&input)?;

    if verbose {
        println!(
            "   {} records, {} columns",
            records.len(),
            export_job.header.len()
        );
        if let Some(template) = &export_job.template {
            println!("   Template: {}", template.display());
        }
        println!("   First data row: {}\n", export_job.start_write_line);
    }

    let count = records.len();
    let exporter = export_job.exporter(records, &job_dir(&job))?;
    exporter.export_to_path(&output)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   {} rows written to {}\n", count, output.display());
    Ok(())
}

/// Execute the import command
pub fn import(
    input: PathBuf,
    job: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
) -> SheetResult<()> {
    let import_job = ImportJob::load(&job)?;
    let mut importer = import_job.importer(&input)?;

    if verbose {
        eprintln!("{}", "📥 Sheetport - Import".bold().green());
        eprintln!("   Input: {}", input.display());
        eprintln!("   Header row: {}", import_job.start_read_line);
        eprintln!("   Mapped fields: {}\n", import_job.fields.len());
    }

    match import_job.chunk_size {
        Some(size) => {
            let out: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout()),
            };
            let count = read_in_batches(importer, size, out, verbose)?;
            if let Some(path) = &output {
                eprintln!("{}", "✅ Import Complete!".bold().green());
                eprintln!("   {} rows streamed to {}\n", count, path.display());
            }
        }
        None => {
            let records = importer.read_rows()?;
            match output {
                Some(path) => {
                    job::write_records(&path, &records)?;
                    eprintln!("{}", "✅ Import Complete!".bold().green());
                    eprintln!("   {} rows written to {}\n", records.len(), path.display());
                }
                None => {
                    println!("{}", serde_json::to_string_pretty(&records)?);
                }
            }
        }
    }

    Ok(())
}

/// Writes every delivered row as one JSON line, flushing after each batch
struct JsonLinesSink {
    out: Box<dyn Write>,
    batches: usize,
    rows: Rc<Cell<usize>>,
    verbose: bool,
}

impl RowBatchSink for JsonLinesSink {
    fn deliver(&mut self, batch: Vec<Record>) -> anyhow::Result<()> {
        self.batches += 1;
        if self.verbose {
            eprintln!("   {} batch {} ({} rows)", "📦".cyan(), self.batches, batch.len());
        }
        for record in &batch {
            serde_json::to_writer(&mut self.out, record)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        self.rows.set(self.rows.get() + batch.len());
        Ok(())
    }
}

/// Run a chunked import, streaming each batch to `out` as it arrives.
///
/// Returns the number of rows written.
fn read_in_batches(
    importer: RowImporter,
    size: usize,
    out: Box<dyn Write>,
    verbose: bool,
) -> SheetResult<usize> {
    let rows = Rc::new(Cell::new(0));
    let sink = JsonLinesSink {
        out,
        batches: 0,
        rows: Rc::clone(&rows),
        verbose,
    };

    importer.with_chunks(size, sink)?.read_rows()?;
    Ok(rows.get())
}

/// Print the first `count` column labels
pub fn columns(count: usize) -> SheetResult<()> {
    for (idx, label) in column_labels(count).iter().enumerate() {
        println!("{:>5}  {}", idx + 1, label);
    }
    Ok(())
}
