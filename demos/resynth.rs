//! An example showcasing how to resynthesize a wav file with a sinusoidal model: the input file
//! gets analysed into partials, which then drive an oscillator bank. Without an input file, a
//! generated test signal is used.

use std::{
    io,
    path::{Path, PathBuf},
};

use arg::{parse_args, Args};

use partials::{
    utils::PinkNoise, Error, ModelOptions, ProcessingMode, SinusoidalProcessor, WaveformType,
    WindowType,
};

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const TEST_SIGNAL_SAMPLE_RATE: u32 = 44100;
const TEST_SIGNAL_DURATION_SECS: u32 = 4;

const BUFFER_SIZE_FRAMES: usize = 512;

// -------------------------------------------------------------------------------------------------

/// Resynthesize a wav file with a sinusoidal model.
#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "i", long = "input")]
    /// Wav file to resynthesize. By default a generated test signal.
    input_path: Option<PathBuf>,
    #[arg(short = "o", long = "output")]
    /// Wav file to write the result into. By default \"resynth.wav\".
    output_path: Option<PathBuf>,
    #[arg(short = "w", long = "waveform")]
    /// Oscillator waveform: \"Sine\", \"Triangle\", \"Sawtooth\" or \"Square\".
    waveform: Option<String>,
    #[arg(short = "s", long = "window-size")]
    /// Analysis window size in samples. By default 1024.
    window_size: Option<usize>,
    #[arg(short = "p", long = "passthrough")]
    /// Run a plain STFT passthrough instead of resynthesizing.
    passthrough: bool,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    /// By default \"debug\" in dev builds and \"warn\" in release builds.
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()
        .expect("Failed to set logger");

    // Read or generate the input signal
    let (mut samples, sample_rate, channel_count) = match &args.input_path {
        Some(path) => read_wav(path)?,
        None => (test_signal()?, TEST_SIGNAL_SAMPLE_RATE, 1),
    };
    log::info!(
        "Processing {} frames of {channel_count} channel audio at {sample_rate} Hz",
        samples.len() / channel_count
    );

    // Create the processor
    let waveform = match &args.waveform {
        Some(name) => name
            .parse::<WaveformType>()
            .map_err(|err| Error::ParameterError(format!("Invalid waveform '{name}': {err}")))?,
        None => WaveformType::default(),
    };
    let options = ModelOptions::default()
        .window(WindowType::Hann, args.window_size.unwrap_or(1024))
        .sample_rate(sample_rate)
        .waveform(waveform);
    let mut processor = SinusoidalProcessor::new(channel_count, options)?;
    if args.passthrough {
        processor.set_mode(ProcessingMode::Passthrough);
    }

    // Process in small blocks, as an audio callback would
    for block in samples.chunks_mut(BUFFER_SIZE_FRAMES * channel_count) {
        processor.process(block);
    }

    let active = processor
        .models()
        .iter()
        .map(|model| model.num_active())
        .sum::<usize>();
    log::info!("Finished with {active} active partials");

    // Write results
    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("resynth.wav"));
    write_wav(&output_path, &samples, sample_rate, channel_count)?;
    log::info!("Wrote '{}'", output_path.display());

    Ok(())
}

// -------------------------------------------------------------------------------------------------

fn wav_error(err: hound::Error) -> Error {
    Error::IoError(io::Error::other(err))
}

fn read_wav(path: &Path) -> Result<(Vec<f32>, u32, usize), Error> {
    let mut reader = hound::WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(wav_error)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 * scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_error)?
        }
    };
    Ok((samples, spec.sample_rate, spec.channels as usize))
}

fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    channel_count: usize,
) -> Result<(), Error> {
    let spec = hound::WavSpec {
        channels: channel_count as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in samples {
        writer.write_sample(*sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)
}

/// A gliding sine, a steady sine and a bit of pink noise.
fn test_signal() -> Result<Vec<f32>, Error> {
    let mut noise = PinkNoise::new(-0.02, 0.02, Some(0x5eed))?;
    let len = (TEST_SIGNAL_SAMPLE_RATE * TEST_SIGNAL_DURATION_SECS) as usize;
    let mut glide_phase = 0.0f32;
    let samples = (0..len)
        .map(|index| {
            let time = index as f32 / TEST_SIGNAL_SAMPLE_RATE as f32;
            let glide_frequency = 220.0 + 220.0 * time / TEST_SIGNAL_DURATION_SECS as f32;
            glide_phase += glide_frequency / TEST_SIGNAL_SAMPLE_RATE as f32;
            let glide = (std::f32::consts::TAU * glide_phase).sin();
            let steady = (std::f32::consts::TAU * 1250.0 * time).sin();
            0.3 * glide + 0.2 * steady + noise.next()
        })
        .collect();
    Ok(samples)
}
