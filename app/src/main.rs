//! Cat-Phones pipeline runner
//!
//! Reads interleaved s16le stereo PCM from stdin, runs it through the
//! processing chain and writes the result to stdout (or, with the
//! `playback` feature, to the default output device).

use std::io::{self, ErrorKind, Read};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use catphones_core::{
    ByteSink, ChainConfig, ProcessingChain, RingSink, WriterSink, BYTES_PER_FRAME,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Psychoacoustic enhancement for raw s16le stereo PCM")]
struct Cli {
    /// Enhancement preset (Default, Speaker, Flat)
    #[arg(short, long, default_value = "Default")]
    preset: String,

    /// Pass audio through untouched (beeps still sound)
    #[arg(long)]
    no_enhance: bool,

    /// Extra tone after the startup beep, as FREQ:MS
    #[arg(long, value_parser = parse_beep)]
    beep: Option<(f32, i32)>,

    /// Input sample rate in Hz
    #[arg(short, long, default_value_t = catphones_core::SAMPLE_RATE)]
    rate: u32,

    /// Frames read from stdin per write
    #[arg(long, default_value_t = 512)]
    block_frames: usize,

    /// Play on the default output device instead of writing stdout
    #[cfg(feature = "playback")]
    #[arg(long)]
    play: bool,
}

fn parse_beep(arg: &str) -> Result<(f32, i32), String> {
    let (freq, ms) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected FREQ:MS, got '{}'", arg))?;
    let freq: f32 = freq
        .trim()
        .parse()
        .map_err(|e| format!("bad frequency '{}': {}", freq, e))?;
    let ms: i32 = ms
        .trim()
        .parse()
        .map_err(|e| format!("bad duration '{}': {}", ms, e))?;
    Ok((freq, ms))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catphones=debug")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.block_frames == 0 {
        bail!("--block-frames must be at least 1");
    }

    let mut config = ChainConfig::from_preset(&cli.preset)?;
    config.sample_rate = cli.rate;
    if cli.no_enhance {
        config.processor.enabled = false;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    info!(
        preset = %cli.preset,
        enhance = config.processor.enabled,
        rate = config.sample_rate,
        "Starting Cat-Phones pipeline"
    );

    #[cfg(feature = "playback")]
    if cli.play {
        return play(&cli, config);
    }

    let stdout = io::BufWriter::new(io::stdout());
    let mut chain = ProcessingChain::new(WriterSink::new(stdout), config)?;
    let frames = pump(&mut chain, &cli, |_, _| true)?;
    info!(frames, "Input drained");
    Ok(())
}

#[cfg(feature = "playback")]
fn play(cli: &Cli, config: ChainConfig) -> anyhow::Result<()> {
    use catphones_core::PlaybackStream;

    let (stream, ring) = PlaybackStream::open_default(&config)?;
    ensure_block_fits(&ring, cli.block_frames)?;
    info!(device = stream.device_name(), "Playing to output device");

    let mut chain = ProcessingChain::new(ring, config)?;
    let frames = pump(&mut chain, cli, ring_has_room)?;

    while chain.sink().pending_bytes() > 0 && !chain.sink().is_abandoned() {
        thread::sleep(Duration::from_millis(5));
    }
    info!(frames, "Playback finished");
    drop(stream);
    Ok(())
}

/// Reject read blocks the playback ring could never hold in one piece
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
fn ensure_block_fits(ring: &RingSink, block_frames: usize) -> anyhow::Result<()> {
    let capacity_frames = ring.capacity_bytes() / BYTES_PER_FRAME;
    if block_frames > capacity_frames {
        bail!(
            "--block-frames {} exceeds the playback buffer of {} frames",
            block_frames,
            capacity_frames
        );
    }
    Ok(())
}

#[cfg_attr(not(feature = "playback"), allow(dead_code))]
fn ring_has_room(ring: &RingSink, len: usize) -> bool {
    ring.free_bytes() >= len || ring.is_abandoned()
}

/// Feed stdin through the chain block by block
///
/// `has_room` is polled before each write so a bounded sink never drops
/// processed frames. Returns the number of frames forwarded.
fn pump<S, F>(chain: &mut ProcessingChain<S>, cli: &Cli, has_room: F) -> anyhow::Result<u64>
where
    S: ByteSink,
    F: Fn(&S, usize) -> bool,
{
    let mut input = io::stdin().lock();
    let mut block = vec![0u8; cli.block_frames * BYTES_PER_FRAME];
    let mut pending_beep = cli.beep;
    let mut forwarded = 0u64;

    loop {
        let len = read_block(&mut input, &mut block).context("reading stdin")?;
        if len == 0 {
            break;
        }
        let usable = len - len % BYTES_PER_FRAME;
        if usable < len {
            warn!(dropped = len - usable, "Input ended on a partial frame");
        }

        while !has_room(chain.sink(), usable) {
            thread::sleep(Duration::from_millis(1));
        }

        let written = chain.write(&block[..len]);
        forwarded += (written / BYTES_PER_FRAME) as u64;
        if written < usable {
            warn!(written, expected = usable, "Output stopped accepting data");
            break;
        }

        // The first write arms the startup beep; queue ours behind it
        if let Some((frequency, duration_ms)) = pending_beep.take() {
            chain.trigger_beep(frequency, duration_ms);
        }
    }

    chain.flush();
    Ok(forwarded)
}

/// Fill `buf` from `input`, stopping early only at end of stream
fn read_block(input: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
