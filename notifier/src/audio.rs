//! Audible alert cues with ordered fallback.
//!
//! A fired reminder keeps an audible cue looping until the alert is
//! dismissed. Sound environments vary wildly, so the cue is chosen from a
//! list of sources tried in order:
//!
//! 1. [`WavFileCue`] - a WAV asset on disk (user-replaceable)
//! 2. [`EmbeddedChimeCue`] - a small chime carried inside the binary
//! 3. [`SynthBeepCue`] - a synthesized two-beep square-wave pattern
//!
//! Each source either decodes to samples or fails over to the next with an
//! internal log; playback failures are never surfaced to the user. When every
//! source fails the alert is simply silent - the in-app alert still shows.
//!
//! Playback runs on a dedicated thread through the default output device and
//! loops until the returned [`CueHandle`] is stopped.

use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use base64::prelude::*;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Sample rate of the embedded and synthesized cues.
const CUE_SAMPLE_RATE: u32 = 8000;

/// Playback volume applied to the on-disk cue asset.
const FILE_CUE_GAIN: f32 = 0.7;

/// Playback volume applied to the embedded chime.
const EMBEDDED_CUE_GAIN: f32 = 0.5;

/// Amplitude of the synthesized beep pattern.
const SYNTH_AMPLITUDE: f32 = 0.2;

/// Frequency of the synthesized beep (A5).
const SYNTH_FREQ_HZ: f32 = 880.0;

/// Length of one loop of the synthesized pattern.
const SYNTH_LOOP_SECS: f32 = 2.0;

/// How often the playback thread polls the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Embedded chime asset: a complete 8 kHz mono WAV, base64-encoded.
const CHIME_WAV_BASE64: &str = "\
UklGRkQNAABXQVZFZm10IBAAAAABAAEAQB8AAEAfAAABAAgAZGF0YSANAACAsMrCm2hANUx7q8fD
n21ENkp2p8XDonJIOEhyosLDpXdMOUdunb/DqHtQO0VqmbvCq39UPUVnlLjCrYRZQERkkLTBr4hd
QkRgjLG/sYthRUNeh62+so9lR0Rbg6q8s5JpSkRZgKa6tJVtTUVXfKK4tZhxUEZVeJ62tZt1VEdU
dZu0tZ54V0hTcpextaB8WklSb5OvtKKAXUtRbJCstKSDYU1QaYyps6WGZE9QZ4mnsqaJZ1FQZYak
saeMa1NQY4OhsKiOblVQYYCerqmRcVhRX32bramTdFpSXnqYq6qVd11TXXeVqaqXel9UXHWSp6qZ
fWJVW3KPpambf2VWW3CMo6mcgmdXWm6KoaidhWpZWmyHnqeeh2xbWmqEnKefiW9cWmmCmqagi3Fe
Wmd/l6SgjXRgW2Z9laOhj3ZiW2V7k6KhkXlkXGR5kaChkntmXWN3jp+hlH1oXmN1jJ2hlX9qX2Jz
ipugloJsYGJyiJqgl4RuYWJwhZifmIVwYmJvg5aemYdyZGJugZSemYl0ZWJsgJKdmYp2Z2JrfpGc
mox4aGNrfI+bmo16amNqeo2Zmo58a2RpeYuYmo9+bWVpd4mXmpB/b2ZodoiWmZGBcGZodYaUmZKD
cmdoc4STmZOEdGhocoORmJOGdWpocYGQl5SHd2tocICPl5SIeGxocH6NlpSJem1pb32MlZSKe25p
bnuKlJSLfXBqbnqJk5SMfnFqbnmHkpSNf3JrbXiGkZSOgXNsbXeFkJSOgnVsbXaDj5OPg3ZtbXWC
jpOPhHdubXSBjZKPhXlvbXR/i5KQhnpwbXN+ipGQh3txbnJ9iZCQiHxybnJ8iJCQiX1zbnJ7h4+Q
iX50b3F6ho6QioB1b3F5hY2Qi4F2cHF5g4yPi4F3cHF4goyPjIJ4cXF3gYuPjIN5cnF3gIqOjIR6
cnF2gImOjIV7c3F2f4iNjIZ8dHF1foeNjYZ9dXJ1fYaMjYd+dnJ0fIWMjYd/dnJ0e4SLjIh/d3N0
e4SKjIiAeHN0eoOKjImBeXR0eYKJjImCenR0eYGIjImDenV0eICIi4qDe3V0eICHi4qEfHZ0eH+G
i4qEfXZ0d36FioqFfXd0d32FioqFfnh1d32EiYqGf3h1d3yDiYqGf3l1dnyDiIqGgHp2dnuCiImH
gXp2dnuBh4mHgXt2dnqBh4mHgnt3dnqAhomHgnx3dnqAhYmIg314dnl/hYiIg314d3l+hIiIhH55
d3l+hIiIhH55d3l9g4eIhH96d3h9g4eIhX96d3h9goaIhYB7eHh8gYaHhYB7eHh8gYWHhYF8eHh7
gIWHhoF8eXh7gIWHhoJ9eXh7gISHhoJ9eXh7f4SGhoN+enh6f4OGhoN+enl6foOGhoN/e3l6foKG
hoN/e3l6fYKFhoR/e3l6fYGFhoSAfHl6fYGFhoSAfHp6fYGEhoSBfXp6fICEhYSBfXp6fICEhYSB
fXp6fICDhYWCfnt6fH+DhYWCfnt6e3+ChYWCfnt6e36ChYWCf3x6e36ChIWDf3x6e36BhIWDgHx6
e36BhIWDgH17e32BhISDgH17e32Ag4SDgH17e32Ag4SDgX17e32Ag4SDgX57e31/goSDgX58e3x/
goSEgX58e3x/goSEgn98e3x/goOEgn98e3x+gYOEgn99e3x+gYOEgn99fHx+gYODgoB9fHx+gIOD
goB9fHx+gIKDgoB+fICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICA
gICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgIC8yZtYNEyNwsOOTjVXmca8gUY4
Y6TIsnVAPW+uyKhpO0R8tsWdXTlNiL3AkVQ6V5TBuoVMPGKfw7J5RUBtqcOobUFGebHBnmI+ToW3
vZNZPleQvLiHUUBhmr6xfEpDa6S/qHFGSHasvp9nQ0+BsruUXkJXjLe2ilZDYJa6r39PRmqfu6h1
S0p0p7qfa0dQfq24lmJGWIiytIxbR2CSta6CVElpm7eneE9NcqK3n29MUnyptZdmSliFrrGOX0pg
jrGthFhMaJezpntTT3Ges59yUFN6pLKXak5Zg6qvj2NNYIutq4ZdTmeTr6Z+V1FvmrCfdVRVeKGv
mG5RWoCmrZBmUWCIqamIYFFnkKylgFtTbpetn3hXVnadrJhxVVt+oquRalRghqaoimRUZ42opIJf
VW2Uqp57W1h1mqqYdFhcfJ+okm1XYYOipotnV2eKpaKEYlhtkaeefV5ac5anmHZbXXqbppJwWmKB
n6SMallniKKhhWVabI6knX9hXHKTpZh4Xl95mKSTclxif5yijW1cZ4WfoIdoXGyLoZyBZF1ykaKY
e2FgeJWik3VfY36ZoY5vXmeEnJ6Ia15siZ+bgmdfcY6gmHxkYXeToJN3YmR8l5+OcmBogpqdiW1g
bIecmoNpYXGMnZd+ZmN2kZ6TeWRle5SdjnRjaICXnIpwYmyFmpmFbGNwipuWgGlkdY6ck3tmZnqS
m492ZWl/lZqKcmRshJiYhm5kcIiZloFrZXSMmpN8aWd5kJqPeGdqfpOZi3RmbYKVl4ZwZnCGl5WC
bWd0ipiSfmtoeI6Yj3lpan2RmIt1aG2Bk5aHcmhwhZWUg29odImWkn9taXiMl497a2t8j5aLd2pt
gJKViHRpcIOTlIRxaXSHlZGAbmp3ipWPfGxse42Vi3lrbn+QlIh1a3GCkpOFcmtzhpORgXBrd4mU
jn1ubXqMlIx6bW9+jpOId2xxgZCShXRsc4SRkIJybHaIko5+cG56ipKLe25vfY2SiXhtcYCPkYZ1
bXSDkJCCc252hpGOf3FueYmRi3xwcHyLkYl5b3J/jZCGd250go+Pg3RvdoWQjYBzb3mIkIt9cXB8
ipCJenByfoyPhnhwdIGNjoR2cHaEjo2BdHB5ho+LfnJxe4mPiXxxcn6Ljod5cXSAjI6Ed3F2g42M
gXVxeIWOi390cnuIjol8cnN9iY6HenJ0gIuNhHhydoKMjIJ2cniEjYqAdXJ6ho2JfXRzfYiNh3tz
dX+KjIV5cnaBi4uCd3N4hIyKgHZzeoaMiX51dHyHjId8dHV+iYyFenN2gYqLg3hzeIOLioF3dHqF
i4h/dnR8houHfXV1foiLhXt0d4CJioN5dHiCiomBeHR6hIqIf3Z1fIWLh312dn6HioV8dXd/iIqD
enV4gYmJgnl1eoOKiIB3dXuFiod+dnZ9hoqFfHZ3f4eJhHt2eIGIiYJ5dnqCiYiAeHZ7hImHf3d3
fYWJhX13d3+GiYR7dniAh4iCenZ6goiHgXl2e4OIhn94d32FiIV9d3h+hoiEfHd5gIeIgnt3eoGH
h4F6d3uDiIZ/eXd8hIiFfnh4foWIhH14eX+Gh4N7d3qBh4eBend7goeGgHl4fIOHhX55eH6Eh4R9
eHl/hYeDfHh6gIaHgnt4e4KHhoB6eHyDh4V/eXl9hIeEfnl5f4WHg3x4eoCFhoJ7eHuBhoaBe3l8
goaFf3p5fYOGhH55eX6EhoN9eXqAhYaCfHl7gYWFgXt5fIKGhYB6eX2DhoR+enp+hIaDfXl6f4SG
gnx5e4CFhYF8eXyBhYWAe3p9goWEf3p6foOFg356en+EhYJ9enuAhIWBfHp8gYWEgHt6fYKFhH97
en6DhYN+ent/g4WCfXp7gISFgXx6fIGEhIB8en2ChYR/e3p+goWDf3t7f4OFgn57e3+EhIF9enyA
hISBfHp9gYSEgHx7foKEg397e36DhIJ+e3t/g4SCfXt8gISEgX17fYGEg4B8e32ChIN/fHt+goSC
fnt8f4OEgn57fICDhIF9e32BhIOAfHt9gYSDf3x7foKEgn98fH+ChIJ+e3yAg4SBfXt9gIODgH17
fYGDg4B8fH6ChIJ/fHx/goOCfnx8f4ODgX58fYCDg4B9fH2Bg4OAfXw=";

/// Errors that can occur while decoding or playing an alert cue.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The cue source could not be decoded into samples.
    #[error("decode error: {0}")]
    Decode(String),

    /// No usable output device, or the device rejected the stream.
    #[error("device error: {0}")]
    Device(String),

    /// Playback could not be started.
    #[error("playback error: {0}")]
    Playback(String),
}

/// Decoded cue audio: mono samples in `[-1.0, 1.0]` at `rate` Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct CueSamples {
    /// Sample rate in Hz.
    pub rate: u32,

    /// Mono samples.
    pub samples: Vec<f32>,
}

/// One candidate source of cue audio.
pub trait CueSource: Send + Sync {
    /// Short name used in fallback logs.
    fn name(&self) -> &'static str;

    /// Decodes this source into samples.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Decode`] when the source is unavailable or its
    /// contents cannot be decoded.
    fn samples(&self) -> Result<CueSamples, AudioError>;
}

/// Primary cue: a WAV asset on disk.
#[derive(Debug)]
pub struct WavFileCue {
    path: PathBuf,
}

impl WavFileCue {
    /// Creates a file cue reading from the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CueSource for WavFileCue {
    fn name(&self) -> &'static str {
        "wav-file"
    }

    fn samples(&self) -> Result<CueSamples, AudioError> {
        let reader = hound::WavReader::open(&self.path)
            .map_err(|e| AudioError::Decode(format!("{}: {e}", self.path.display())))?;
        let mut cue = decode_wav(reader)?;
        apply_gain(&mut cue.samples, FILE_CUE_GAIN);
        Ok(cue)
    }
}

/// Secondary cue: the chime embedded in the binary.
#[derive(Debug, Default)]
pub struct EmbeddedChimeCue;

impl CueSource for EmbeddedChimeCue {
    fn name(&self) -> &'static str {
        "embedded-chime"
    }

    fn samples(&self) -> Result<CueSamples, AudioError> {
        let compact: String = CHIME_WAV_BASE64.split_whitespace().collect();
        let bytes = BASE64_STANDARD
            .decode(compact)
            .map_err(|e| AudioError::Decode(format!("embedded chime: {e}")))?;
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes))
            .map_err(|e| AudioError::Decode(format!("embedded chime: {e}")))?;
        let mut cue = decode_wav(reader)?;
        apply_gain(&mut cue.samples, EMBEDDED_CUE_GAIN);
        Ok(cue)
    }
}

/// Tertiary cue: a synthesized square-wave double beep.
#[derive(Debug, Default)]
pub struct SynthBeepCue;

impl CueSource for SynthBeepCue {
    fn name(&self) -> &'static str {
        "synth-beep"
    }

    fn samples(&self) -> Result<CueSamples, AudioError> {
        Ok(synth_beep_pattern())
    }
}

/// Builds the default cue fallback chain for the given primary asset path.
#[must_use]
pub fn default_chain(sound_file: impl Into<PathBuf>) -> Vec<Box<dyn CueSource>> {
    vec![
        Box::new(WavFileCue::new(sound_file)),
        Box::new(EmbeddedChimeCue),
        Box::new(SynthBeepCue),
    ]
}

/// Handle to a looping cue; stopping it ends playback.
#[derive(Debug, Clone)]
pub struct CueHandle {
    stop: Arc<AtomicBool>,
}

impl CueHandle {
    /// Stops the looping cue. Safe to call more than once.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once the cue has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Starts the first playable cue from `sources`, looping until stopped.
///
/// Returns `None` when every source fails to decode or play; the failure is
/// logged and the caller proceeds without sound.
pub fn play_cue(sources: &[Box<dyn CueSource>]) -> Option<CueHandle> {
    for source in sources {
        let cue = match source.samples() {
            Ok(cue) => cue,
            Err(err) => {
                debug!(source = source.name(), error = %err, "cue source unavailable");
                continue;
            }
        };

        match start_playback(cue) {
            Ok(handle) => {
                debug!(source = source.name(), "alert cue playing");
                return Some(handle);
            }
            Err(err) => {
                warn!(source = source.name(), error = %err, "cue playback failed");
            }
        }
    }

    warn!("all alert cue sources failed; alert will be silent");
    None
}

/// Spawns the playback thread and waits for the stream to start.
fn start_playback(cue: CueSamples) -> Result<CueHandle, AudioError> {
    if cue.samples.is_empty() {
        return Err(AudioError::Decode("cue has no samples".to_string()));
    }

    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let (ready_tx, ready_rx) = mpsc::channel();

    thread::Builder::new()
        .name("taskflow-cue".to_string())
        .spawn(move || playback_thread(cue, thread_stop, ready_tx))
        .map_err(|e| AudioError::Playback(format!("failed to spawn playback thread: {e}")))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(CueHandle { stop }),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(AudioError::Playback(
            "playback thread exited before starting".to_string(),
        )),
    }
}

/// Owns the output stream for the lifetime of the cue.
///
/// The stream must be built and dropped on the same thread on platforms where
/// it is not `Send`, so setup errors travel back over `ready`.
fn playback_thread(
    cue: CueSamples,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), AudioError>>,
) {
    let stream = match build_loop_stream(&cue) {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    if let Err(err) = stream.play() {
        let _ = ready.send(Err(AudioError::Playback(format!(
            "failed to start output stream: {err}"
        ))));
        return;
    }
    let _ = ready.send(Ok(()));

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(STOP_POLL_INTERVAL);
    }
    drop(stream);
}

/// Builds an output stream that loops the cue through the default device.
fn build_loop_stream(cue: &CueSamples) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Device("no default output device".to_string()))?;

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Device(format!("cannot query output config: {e}")))?;
    let channels = supported.channels() as usize;
    let device_rate = supported.sample_rate().0;

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples = resample_linear(&cue.samples, cue.rate, device_rate);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples[position];
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                    position = (position + 1) % samples.len();
                }
            },
            move |err| {
                warn!("audio output stream error: {err}");
            },
            None,
        )
        .map_err(|e| AudioError::Device(format!("failed to build output stream: {e}")))?;

    Ok(stream)
}

/// Decodes a WAV stream into mono f32 samples.
fn decode_wav<R: Read>(mut reader: hound::WavReader<R>) -> Result<CueSamples, AudioError> {
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode(e.to_string()))?
        }
    };

    if raw.is_empty() {
        return Err(AudioError::Decode("WAV contains no samples".to_string()));
    }

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        raw
    } else {
        // Downmix interleaved frames by averaging.
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(CueSamples {
        rate: spec.sample_rate,
        samples,
    })
}

/// Scales samples in place.
fn apply_gain(samples: &mut [f32], gain: f32) {
    for sample in samples {
        *sample *= gain;
    }
}

/// Generates the synthesized fallback pattern: two short 880 Hz square-wave
/// beeps with a decaying envelope, padded with silence so the loop repeats
/// every two seconds.
fn synth_beep_pattern() -> CueSamples {
    let rate = CUE_SAMPLE_RATE;
    let total = (SYNTH_LOOP_SECS * rate as f32) as usize;
    let mut samples = vec![0.0f32; total];

    let beep_len = (0.2 * rate as f32) as usize;
    for start in [0usize, (0.3 * rate as f32) as usize] {
        for i in 0..beep_len {
            let t = i as f32 / rate as f32;
            let phase = (t * SYNTH_FREQ_HZ).fract();
            let square = if phase < 0.5 { 1.0 } else { -1.0 };
            let envelope = (-6.0 * i as f32 / beep_len as f32).exp();
            if start + i < total {
                samples[start + i] = SYNTH_AMPLITUDE * square * envelope;
            }
        }
    }

    CueSamples { rate, samples }
}

/// Linear resampling between sample rates. Returns the input unchanged when
/// the rates already match.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_len = ((samples.len() as f64) / ratio).round().max(1.0) as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 * ratio;
        let i0 = src_pos.floor() as usize;
        let i1 = (i0 + 1).min(samples.len() - 1);
        let frac = (src_pos - i0 as f64) as f32;
        let i0 = i0.min(samples.len() - 1);
        out.push(samples[i0] * (1.0 - frac) + samples[i1] * frac);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cue source that always fails, for exercising the fallback chain.
    struct BrokenCue;

    impl CueSource for BrokenCue {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn samples(&self) -> Result<CueSamples, AudioError> {
            Err(AudioError::Decode("intentionally broken".to_string()))
        }
    }

    #[test]
    fn embedded_chime_decodes() {
        let cue = EmbeddedChimeCue.samples().unwrap();
        assert_eq!(cue.rate, CUE_SAMPLE_RATE);
        assert!(!cue.samples.is_empty());

        let peak = cue.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.01, "chime should be audible, peak {peak}");
        assert!(peak <= EMBEDDED_CUE_GAIN + 0.01, "gain not applied, peak {peak}");
    }

    #[test]
    fn synth_pattern_loops_at_two_seconds() {
        let cue = SynthBeepCue.samples().unwrap();
        assert_eq!(cue.rate, CUE_SAMPLE_RATE);
        assert_eq!(cue.samples.len(), (SYNTH_LOOP_SECS * CUE_SAMPLE_RATE as f32) as usize);

        // Beeps at the front, silence at the tail.
        assert!(cue.samples[..100].iter().any(|s| s.abs() > 0.0));
        assert!(cue.samples[cue.samples.len() - 100..].iter().all(|s| *s == 0.0));

        let peak = cue.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= SYNTH_AMPLITUDE + f32::EPSILON);
    }

    #[test]
    fn missing_wav_file_is_a_decode_error() {
        let cue = WavFileCue::new("/nonexistent/notify.wav");
        assert!(matches!(cue.samples(), Err(AudioError::Decode(_))));
    }

    #[test]
    fn decode_wav_downmixes_stereo() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-16384i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        buf.set_position(0);

        let cue = decode_wav(hound::WavReader::new(buf).unwrap()).unwrap();
        assert_eq!(cue.samples.len(), 100);
        // Opposite-phase channels cancel to (near) zero.
        assert!(cue.samples.iter().all(|s| s.abs() < 0.001));
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 8000, 8000), samples);
    }

    #[test]
    fn resample_changes_length_proportionally() {
        let samples = vec![0.0; 8000];
        let out = resample_linear(&samples, 8000, 48000);
        assert!((out.len() as i64 - 48000).abs() <= 1, "got {}", out.len());
    }

    #[test]
    fn resample_stays_in_range() {
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 / 50.0) - 1.0).collect();
        let out = resample_linear(&samples, 8000, 44100);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn play_cue_with_all_sources_broken_is_none() {
        let sources: Vec<Box<dyn CueSource>> = vec![Box::new(BrokenCue), Box::new(BrokenCue)];
        assert!(play_cue(&sources).is_none());
    }

    #[test]
    fn cue_handle_stop_is_idempotent() {
        let handle = CueHandle {
            stop: Arc::new(AtomicBool::new(false)),
        };
        assert!(!handle.is_stopped());
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn default_chain_has_three_sources() {
        let chain = default_chain("/tmp/notify.wav");
        let names: Vec<_> = chain.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["wav-file", "embedded-chime", "synth-beep"]);
    }
}
