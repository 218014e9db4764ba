//! EV Telemetry CLI Application
//!
//! Command-line front end for the ev-telemetry-decoder library. It reads
//! hex-encoded captured frames (one per line), decodes them in parallel and
//! emits the telemetry records as JSON lines. Frames are independent of one
//! another, so the decode fans out across a rayon thread pool while the
//! output preserves input order.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ev_telemetry_decoder::{DecodedFrame, Decoder, DecoderConfig, SourceHint};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

mod config;
mod hex;

/// EV Telemetry Decoder - decode captured remote-monitoring frames
#[derive(Parser, Debug)]
#[command(name = "ev-telemetry-cli")]
#[command(about = "Decode EV remote-monitoring frames into JSON records", long_about = None)]
#[command(version)]
struct Args {
    /// File of hex-encoded frames, one per line ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Envelope convention of the feed
    #[arg(long, value_enum, value_name = "SOURCE")]
    source: Option<SourceArg>,

    /// Discard frames whose XOR checksum does not match
    #[arg(long)]
    strict_checksum: bool,

    /// Civil timezone offset for protocol timestamps, in hours
    #[arg(long, value_name = "HOURS")]
    utc_offset_hours: Option<i32>,

    /// Output file for JSON records (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Command-line spelling of [`SourceHint`]
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SourceArg {
    Streaming,
    PlatformAggregation,
}

impl From<SourceArg> for SourceHint {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Streaming => SourceHint::Streaming,
            SourceArg::PlatformAggregation => SourceHint::PlatformAggregation,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("EV Telemetry CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", ev_telemetry_decoder::VERSION);

    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::AppConfig::default(),
    };

    // Flags win over config-file values
    let input = args
        .input
        .clone()
        .or(file_config.input.file)
        .ok_or_else(|| anyhow!("no input given; pass --input or set [input].file"))?;
    let source: SourceHint = args
        .source
        .map(SourceHint::from)
        .unwrap_or(file_config.input.source);
    let output = args.output.clone().or(file_config.output.file);

    let mut decoder_config: DecoderConfig = file_config.decoder.decoder;
    if let Some(hours) = args.utc_offset_hours {
        decoder_config = decoder_config.with_utc_offset_hours(hours);
    }
    if args.strict_checksum {
        decoder_config = decoder_config.with_checksum_enforcement(true);
    }

    let decoder = Decoder::new(decoder_config);
    let text = read_input(&input)?;

    let outcomes = decode_all(&decoder, &text, source);

    let mut writer: BufWriter<Box<dyn Write>> = match &output {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("failed to create {:?}", path))?,
        )),
        None => BufWriter::new(Box::new(io::stdout())),
    };

    let mut frames = 0usize;
    let mut records = 0usize;
    let mut errors = 0usize;

    for (line_no, outcome) in outcomes {
        match outcome {
            Ok(frame) => {
                frames += 1;
                records += frame.records.len();
                if frame.is_partial() {
                    log::warn!(
                        "line {line_no}: frame from {} decoded partially: {}",
                        frame.vin,
                        frame.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                    );
                }
                for diagnostic in &frame.diagnostics {
                    log::warn!("line {line_no}: {:?}", diagnostic);
                }
                write_records(&mut writer, &frame)?;
            }
            Err(e) => {
                errors += 1;
                log::error!("line {line_no}: {e:#}");
            }
        }
    }
    writer.flush()?;

    log::info!("done: {frames} frame(s), {records} record(s), {errors} error(s)");
    Ok(())
}

/// Decode every input line on the rayon pool, keeping input order
fn decode_all<'a>(
    decoder: &Decoder,
    text: &'a str,
    source: SourceHint,
) -> Vec<(usize, Result<DecodedFrame>)> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();

    lines
        .into_par_iter()
        .map(|(line_no, line)| {
            let outcome = hex::decode_line(line)
                .and_then(|buf| decoder.decode(&buf, source).map_err(Into::into));
            (line_no, outcome)
        })
        .collect()
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))
    }
}

fn write_records(writer: &mut impl Write, frame: &DecodedFrame) -> Result<()> {
    for record in &frame.records {
        serde_json::to_writer(&mut *writer, record)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buffer() -> String {
        // Logout frame (serial 7) in the default streaming envelope
        let mut frame = vec![0x23, 0x23, 0x04, 0xFE];
        frame.extend_from_slice(b"LEWTEB144KA000001");
        frame.push(0x01);
        frame.extend_from_slice(&8u16.to_be_bytes());
        frame.extend_from_slice(&[21, 4, 29, 11, 16, 39, 0x00, 0x07]);
        let xor = frame[2..].iter().fold(0u8, |acc, b| acc ^ b);
        frame.push(xor);

        let mut buf = Vec::new();
        buf.extend_from_slice(b"89860121234567890123");
        buf.extend_from_slice(b"2021-04-29 11:16:39");
        buf.extend_from_slice(&frame);
        buf.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_decode_all_skips_comments_and_keeps_order() {
        let text = format!("# capture 2021-04-29\n\n{}\nzz\n{}\n", sample_buffer(), sample_buffer());
        let decoder = Decoder::new(DecoderConfig::new());

        let outcomes = decode_all(&decoder, &text, SourceHint::Streaming);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].0, 3);
        assert!(outcomes[0].1.is_ok());
        // The garbage line fails hex decoding but not the run
        assert_eq!(outcomes[1].0, 4);
        assert!(outcomes[1].1.is_err());
        assert_eq!(outcomes[2].0, 5);
        assert!(outcomes[2].1.is_ok());
    }

    #[test]
    fn test_write_records_emits_json_lines() {
        let decoder = Decoder::new(DecoderConfig::new());
        let buf = hex::decode_line(&sample_buffer()).unwrap();
        let frame = decoder.decode(&buf, SourceHint::Streaming).unwrap();

        let mut out = Vec::new();
        write_records(&mut out, &frame).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["vin"], "LEWTEB144KA000001");
        assert_eq!(first["data"]["type"], "command_observed");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["data"]["type"], "logout");
        assert_eq!(second["data"]["serial"], 7);
    }
}
