use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;
use serde::Serialize;

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;
use crate::params::DecodeParams;
use crw::process::{DecodeSummary, Decompressor, StreamLayout};
use crw::structs::image::RawImage;

#[derive(Debug, Serialize)]
struct LayoutReport {
    file_size: usize,
    width: usize,
    height: usize,
    variant: u32,
    low_bits: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    low_bit_region: Option<[usize; 2]>,
    high_bits_offset: usize,
    high_bits_bytes: usize,
    decode: DecodeReport,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum DecodeReport {
    Ok {
        blocks: usize,
        bands: usize,
        overflows: usize,
        bits_consumed: u64,
        unused_stream_bytes: usize,
    },
    Failed {
        error: String,
    },
}

impl LayoutReport {
    fn new(data: &[u8], params: &DecodeParams, decode: DecodeReport) -> Self {
        let layout = StreamLayout::new(params.width, params.height, params.low_bits);

        Self {
            file_size: data.len(),
            width: params.width,
            height: params.height,
            variant: params.variant as u32,
            low_bits: params.low_bits,
            low_bit_region: layout.low_bits.as_ref().map(|r| [r.start, r.end]),
            high_bits_offset: layout.high_bits_offset,
            high_bits_bytes: data.len().saturating_sub(layout.high_bits_offset),
            decode,
        }
    }

    fn print_text(&self) {
        println!();
        println!("CRW Raw Data Layout");
        println!("===================");
        println!();
        println!("File size                   {} bytes", self.file_size);
        println!("Geometry                    {}x{}", self.width, self.height);
        println!("Decoder table variant       {}", self.variant);
        match self.low_bit_region {
            Some([start, end]) => {
                println!("Low bits                    {start}..{end} ({} bytes)", end - start)
            }
            None => println!("Low bits                    none"),
        }
        println!(
            "High-bit stream             from {} ({} bytes)",
            self.high_bits_offset, self.high_bits_bytes
        );
        println!();

        match &self.decode {
            DecodeReport::Ok {
                blocks,
                bands,
                overflows,
                bits_consumed,
                unused_stream_bytes,
            } => {
                println!("Decode check                OK");
                println!("Blocks                      {blocks} in {bands} bands");
                println!("Run overflows               {overflows}");
                println!("Stream bits consumed        {bits_consumed}");
                println!("Unused stream bytes         {unused_stream_bytes}");
            }
            DecodeReport::Failed { error } => {
                println!("Decode check                FAILED");
                println!("Error                       {error}");
            }
        }
        println!();
    }
}

fn decode_report(
    data: &[u8],
    params: &DecodeParams,
    summary: Result<DecodeSummary>,
) -> DecodeReport {
    match summary {
        Ok(summary) => {
            let layout = StreamLayout::new(params.width, params.height, params.low_bits);
            let stream_bytes = data.len().saturating_sub(layout.high_bits_offset);
            let consumed_bytes = summary.bits_consumed.div_ceil(8) as usize;

            DecodeReport::Ok {
                blocks: summary.blocks,
                bands: summary.bands,
                overflows: summary.overflows,
                bits_consumed: summary.bits_consumed,
                unused_stream_bytes: stream_bytes.saturating_sub(consumed_bytes),
            }
        }
        Err(e) => DecodeReport::Failed {
            error: format!("{e:#}"),
        },
    }
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing raw data: {}", args.input.display());

    let params = DecodeParams::from_args(&args.raw)?;
    let data = InputReader::new(&args.input)?.read_all()?;

    let mut decompressor = Decompressor::default();

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };
    decompressor.set_fail_level(fail_level);

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Decoding...");
        Some(pb)
    } else {
        None
    };

    let mut image = RawImage::new(params.width, params.height)?;
    let summary = decompressor.decompress(&mut image, &data, params.variant, params.low_bits);

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if let Err(ref e) = summary {
        if cli.strict {
            anyhow::bail!("{e:#}");
        }
        log::warn!("Decode check failed: {e:#}");
    }

    let report = LayoutReport::new(&data, &params, decode_report(&data, &params, summary));

    if args.yaml {
        print!("{}", serde_yaml_ng::to_string(&report)?);
    } else {
        report.print_text();
    }

    Ok(())
}
