//! Batch conversion over a bounded worker pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::bounded;

use super::paths::{generate_output_filename, OUTPUT_EXTENSION};
use super::{convert, ConversionResult, ConvertOptions};

/// Convert every input into `output_dir`, `options.workers` files at a
/// time.
///
/// Returns one result per input, in input order. A failing file yields a
/// failed result and never stops the others.
pub fn convert_batch<P: AsRef<Path>>(
    inputs: &[P],
    output_dir: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Vec<ConversionResult> {
    if inputs.is_empty() {
        return Vec::new();
    }

    let jobs: Vec<(PathBuf, PathBuf)> = inputs
        .iter()
        .map(|p| p.as_ref().to_path_buf())
        .zip(unique_outputs(inputs, output_dir.as_ref()))
        .collect();
    let workers = options.workers.clamp(1, jobs.len());
    log::debug!("converting {} files with {} workers", jobs.len(), workers);

    // Both queues are bounded so at most `workers` documents are in flight.
    let (job_tx, job_rx) = bounded::<usize>(workers);
    let (result_tx, result_rx) = bounded::<(usize, ConversionResult)>(workers);
    let mut results: Vec<Option<ConversionResult>> = jobs.iter().map(|_| None).collect();

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let jobs = &jobs;
            scope.spawn(move || {
                for index in job_rx.iter() {
                    let (input, output) = &jobs[index];
                    let result = convert(input, output, options).unwrap_or_else(|e| {
                        log::warn!("{}: {}", input.display(), e);
                        ConversionResult::failed(input.clone(), output.clone(), e)
                    });
                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        let count = jobs.len();
        scope.spawn(move || {
            for index in 0..count {
                if job_tx.send(index).is_err() {
                    break;
                }
            }
        });

        for (index, result) in result_rx.iter() {
            results[index] = Some(result);
        }
    });

    results.into_iter().flatten().collect()
}

/// Output paths inside `dir`, suffixing `-2`, `-3`, ... when two inputs
/// share a file stem.
fn unique_outputs<P: AsRef<Path>>(inputs: &[P], dir: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let name = generate_output_filename(input.as_ref());
            let stem = name
                .strip_suffix(&format!(".{}", OUTPUT_EXTENSION))
                .unwrap_or(&name)
                .to_string();
            let mut candidate = name.to_lowercase();
            let mut file_name = name.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                file_name = format!("{}-{}.{}", stem, n, OUTPUT_EXTENSION);
                candidate = file_name.to_lowercase();
                n += 1;
            }
            dir.join(file_name)
        })
        .collect()
}
