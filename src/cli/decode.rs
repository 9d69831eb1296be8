use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;

use super::command::{Cli, DecodeArgs, OutputFormat};
use crate::byteorder::WriteBytesLe;
use crate::input::{InputReader, is_pipe};
use crate::params::DecodeParams;
use crate::pgm::PgmWriter;
use crw::process::{DecodeSummary, Decompressor};
use crw::structs::image::RawImage;

fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        _ => base_path.with_extension(expected_ext),
    }
}

/// Chooses where the decoded image of `input` goes.
///
/// An explicit output path is a file for a single input and a directory otherwise.
/// Without one, the image is written next to the input.
fn output_path_for(
    input: &Path,
    output_path: Option<&Path>,
    single_input: bool,
    format: OutputFormat,
) -> Result<PathBuf> {
    let ext = format.extension();

    match output_path {
        Some(path) if single_input && !path.is_dir() => Ok(path.to_path_buf()),
        Some(dir) => {
            if is_pipe(input) {
                bail!("Cannot name the output for stdin inside directory {}", dir.display());
            }
            let name = input
                .file_name()
                .with_context(|| format!("Input {} has no file name", input.display()))?;
            Ok(create_path_with_extension(&dir.join(name), ext))
        }
        None if is_pipe(input) => bail!("--output-path is required when reading stdin"),
        None => Ok(create_path_with_extension(input, ext)),
    }
}

fn write_image(path: &Path, image: &RawImage, format: OutputFormat, max_value: u16) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    match format {
        OutputFormat::Pgm => {
            let mut writer = PgmWriter::new(file, image.width(), image.height(), max_value);
            writer.write_header()?;
            for y in 0..image.height() {
                writer.write_row(image.row(y))?;
            }
            writer.finish()?;
            writer.into_inner()?;
        }
        OutputFormat::Raw16 => {
            let mut writer = BufWriter::new(file);
            let mut buffer = Vec::with_capacity(image.width() * 2);
            for y in 0..image.height() {
                buffer.clear();
                image.row(y).write_le(&mut buffer);
                writer.write_all(&buffer)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

fn decode_one(
    input: &Path,
    output: &Path,
    params: &DecodeParams,
    decompressor: &Decompressor,
    format: OutputFormat,
) -> Result<DecodeSummary> {
    let data = InputReader::new(input)?.read_all()?;

    let mut image = RawImage::new(params.width, params.height)?;
    let summary = decompressor
        .decompress(&mut image, &data, params.variant, params.low_bits)
        .with_context(|| format!("Failed to decompress {}", input.display()))?;

    write_image(output, &image, format, params.max_value())?;

    Ok(summary)
}

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let params = DecodeParams::from_args(&args.raw)?;

    log::info!(
        "Decoding {} input(s) as {}x{} (variant: {:?}, low bits: {}, strict mode: {})",
        args.input.len(),
        params.width,
        params.height,
        params.variant,
        params.low_bits,
        cli.strict
    );

    let mut decompressor = Decompressor::default();

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };
    decompressor.set_fail_level(fail_level);

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new(args.input.len() as u64));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} files ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let single_input = args.input.len() == 1;
    let mut failures = 0usize;

    for input in &args.input {
        if let Some(ref pb) = pb {
            pb.set_message(input.display().to_string());
        }

        let start = Instant::now();
        let result = output_path_for(
            input,
            args.output_path.as_deref(),
            single_input,
            args.format,
        )
        .and_then(|output| {
            decode_one(input, &output, &params, &decompressor, args.format)
                .map(|summary| (output, summary))
        });

        match result {
            Ok((output, summary)) => {
                log::info!(
                    "{} -> {} in {:.3}s ({} blocks in {} bands, {} bits, {} low-bit bytes)",
                    input.display(),
                    output.display(),
                    start.elapsed().as_secs_f64(),
                    summary.blocks,
                    summary.bands,
                    summary.bits_consumed,
                    summary.low_bit_bytes
                );
                if summary.overflows > 0 {
                    log::debug!("{} blocks ended in a run overflow", summary.overflows);
                }
            }
            Err(e) => {
                if cli.strict {
                    return Err(e);
                }
                log::error!("{e:#}");
                failures += 1;
            }
        }

        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    if failures > 0 {
        bail!("{failures} of {} input(s) failed to decode", args.input.len());
    }

    Ok(())
}
