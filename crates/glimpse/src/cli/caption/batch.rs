//! Directory captioning with progress, skip-existing, and streaming output.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use glimpse_core::pipeline::hash::file_hash;
use glimpse_core::pipeline::DiscoveredFile;
use glimpse_core::{CaptionRecord, OutputFormat, OutputWriter, ProcessingStats};

use super::{CaptionArgs, CaptionContext};

/// Caption every discovered file.
///
/// JSONL and text are streamed as each image finishes; JSON needs the whole
/// batch for its array wrapper and is written at the end.
pub async fn caption_batch(
    ctx: CaptionContext,
    args: &CaptionArgs,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let existing = if args.skip_existing {
        ExistingOutput::load(args.output.as_deref())?
    } else {
        ExistingOutput::default()
    };
    if !existing.is_empty() {
        tracing::info!(
            "Loaded {} existing entries from output file",
            existing.len()
        );
    }

    let progress = create_progress_bar(files.len() as u64);
    let mut stats = ProcessingStats::default();
    let mut total_bytes: u64 = 0;
    let start_time = Instant::now();

    let mut stream = if ctx.format == OutputFormat::Json {
        None
    } else {
        let sink = open_sink(args.output.as_deref(), args.skip_existing)?;
        Some(OutputWriter::new(sink, ctx.format, false))
    };
    let mut records = Vec::new();

    for file in &files {
        if existing.contains(&file.path) {
            stats.skipped += 1;
            progress.inc(1);
            continue;
        }

        match ctx.processor.process(&file.path).await {
            Ok(record) => {
                stats.succeeded += 1;
                if record.search.truncated {
                    stats.truncated += 1;
                }
                total_bytes += record.file_size;

                match stream.as_mut() {
                    Some(writer) => writer.write(&record)?,
                    None => records.push(record),
                }
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!("Failed: {:?} - {}", file.path, e);
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = (stats.succeeded + stats.failed) as f64 / elapsed;
            progress.set_message(format!("{:.1} img/sec", rate));
        }
    }

    if let Some(mut writer) = stream {
        writer.flush()?;
    } else if !records.is_empty() {
        // Appending to a JSON array is invalid, so the previous records are merged in.
        let mut all_records = existing.records;
        all_records.extend(records);

        let sink = open_sink(args.output.as_deref(), false)?;
        let pretty = ctx.pretty || args.output.is_none();
        let mut writer = OutputWriter::new(sink, ctx.format, pretty);
        writer.write_all(&all_records)?;
        writer.flush()?;
    }
    if let Some(output_path) = &args.output {
        tracing::info!("Output written to {:?}", output_path);
    }

    progress.finish_and_clear();
    print_summary(&stats, total_bytes, start_time.elapsed());

    Ok(())
}

/// Stdout, or the output file (appended to when `append` is set and it exists).
fn open_sink(output: Option<&Path>, append: bool) -> io::Result<Box<dyn Write>> {
    let Some(path) = output else {
        return Ok(Box::new(io::stdout().lock()));
    };
    let file = if append && path.exists() {
        OpenOptions::new().append(true).open(path)?
    } else {
        File::create(path)?
    };
    Ok(Box::new(BufWriter::new(file)))
}

/// What a previous run already wrote to the output file.
#[derive(Debug, Default)]
struct ExistingOutput {
    /// Parsed records, kept so a JSON array can be rewritten with them
    records: Vec<CaptionRecord>,
    hashes: HashSet<String>,
    /// Paths from text output, which carries no hashes
    paths: HashSet<PathBuf>,
}

impl ExistingOutput {
    /// Read a JSON array, JSONL, or text output file. A missing file is empty.
    fn load(output_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut existing = Self::default();
        let Some(path) = output_path else {
            return Ok(existing);
        };
        if !path.exists() {
            return Ok(existing);
        }

        let content = std::fs::read_to_string(path)?;

        if let Ok(records) = serde_json::from_str::<Vec<CaptionRecord>>(&content) {
            existing.add_records(records);
            return Ok(existing);
        }

        tracing::debug!("Output file is not a JSON array, reading it line by line");
        let mut skipped_lines = 0u64;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Ok(record) = serde_json::from_str::<CaptionRecord>(line) {
                existing.add_records([record]);
            } else if let Some((path, _caption)) = line.split_once('\t') {
                existing.paths.insert(PathBuf::from(path));
            } else {
                skipped_lines += 1;
            }
        }
        if skipped_lines > 0 {
            tracing::warn!(
                "--skip-existing: {skipped_lines} lines in output file could not be parsed; \
                 those images will be captioned again"
            );
        }

        Ok(existing)
    }

    fn add_records(&mut self, records: impl IntoIterator<Item = CaptionRecord>) {
        for record in records {
            self.hashes.insert(record.content_hash.clone());
            self.paths.insert(record.file_path.clone());
            self.records.push(record);
        }
    }

    fn len(&self) -> usize {
        self.hashes.len().max(self.paths.len())
    }

    fn is_empty(&self) -> bool {
        self.hashes.is_empty() && self.paths.is_empty()
    }

    /// Matched by path first, then by content hash so moved files are
    /// still recognized.
    fn contains(&self, path: &Path) -> bool {
        if self.paths.contains(path) {
            return true;
        }
        if self.hashes.is_empty() {
            return false;
        }
        file_hash(path)
            .map(|hash| self.hashes.contains(&hash))
            .unwrap_or(false)
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

fn print_summary(stats: &ProcessingStats, total_bytes: u64, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.succeeded as f64 / secs
    } else {
        0.0
    };
    let throughput = if secs > 0.0 {
        total_bytes as f64 / 1_000_000.0 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.truncated > 0 {
        eprintln!("    Truncated:    {:>8}", stats.truncated);
    }
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::decoding::{DecodeOutcome, StopReason};

    fn sample_record(path: &str, hash: &str) -> CaptionRecord {
        CaptionRecord {
            file_path: PathBuf::from(path),
            file_name: "image.jpg".to_string(),
            content_hash: hash.to_string(),
            width: 100,
            height: 100,
            format: "jpeg".to_string(),
            file_size: 1000,
            caption: "a dog".to_string(),
            words: vec!["a".to_string(), "dog".to_string()],
            search: DecodeOutcome {
                tokens: vec![3, 4],
                log_prob: -0.5,
                normalized_score: -0.25,
                finished: true,
                truncated: false,
                stop_reason: StopReason::AllFinished,
                steps: 3,
                scorer_calls: 7,
            },
            vocabulary_hash: "vocab".to_string(),
        }
    }

    #[test]
    fn loads_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        let records = vec![
            sample_record("/a.jpg", "hash_a"),
            sample_record("/b.jpg", "hash_b"),
        ];
        std::fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();

        let existing = ExistingOutput::load(Some(&path)).unwrap();
        assert_eq!(existing.records.len(), 2);
        assert!(existing.hashes.contains("hash_a"));
        assert!(existing.contains(Path::new("/b.jpg")));
    }

    #[test]
    fn loads_jsonl_and_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.jsonl");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{}", serde_json::to_string(&sample_record("/c.jpg", "hash_c")).unwrap())
            .unwrap();
        writeln!(f, "this is not valid json at all").unwrap();
        writeln!(f, "{}", serde_json::to_string(&sample_record("/d.jpg", "hash_d")).unwrap())
            .unwrap();

        let existing = ExistingOutput::load(Some(&path)).unwrap();
        assert_eq!(existing.hashes.len(), 2);
        assert!(existing.hashes.contains("hash_c"));
        assert!(existing.hashes.contains("hash_d"));
    }

    #[test]
    fn loads_text_output_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.txt");
        std::fs::write(&path, "/photos/a.jpg\ta dog\n/photos/b.png\ta cat\n").unwrap();

        let existing = ExistingOutput::load(Some(&path)).unwrap();
        assert!(existing.hashes.is_empty());
        assert!(existing.contains(Path::new("/photos/a.jpg")));
        assert!(!existing.contains(Path::new("/photos/c.jpg")));
    }

    #[test]
    fn matches_moved_file_by_hash() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("moved.png");
        std::fs::write(&image, b"pixels").unwrap();
        let hash = file_hash(&image).unwrap();

        let output = dir.path().join("output.jsonl");
        let record = sample_record("/old/place.png", &hash);
        std::fs::write(&output, serde_json::to_string(&record).unwrap()).unwrap();

        let existing = ExistingOutput::load(Some(&output)).unwrap();
        assert!(existing.contains(&image));
    }

    #[test]
    fn missing_or_unset_output_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nonexistent.json");

        assert!(ExistingOutput::load(Some(&missing)).unwrap().is_empty());
        assert!(ExistingOutput::load(None).unwrap().is_empty());
    }

    #[test]
    fn empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "").unwrap();

        assert!(ExistingOutput::load(Some(&path)).unwrap().is_empty());
    }
}
