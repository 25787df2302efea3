/// Sound engine: procedural retro sound effects via rodio.
///
/// Every effect is synthesized into an in-memory WAV buffer at startup.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Build without the "sound" feature to disable audio entirely; the
/// stub SoundEngine keeps the same API and does nothing.

use crate::domain::tile::TileKind;
use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Move,
    Dig,
    Collect,
    BoulderFall,
    Crush,
    LevelComplete,
    Death,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::Move,
        Sfx::Dig,
        Sfx::Collect,
        Sfx::BoulderFall,
        Sfx::Crush,
        Sfx::LevelComplete,
        Sfx::Death,
    ];

    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Moved { .. } => Some(Sfx::Move),
            GameEvent::DugDirt { .. } => Some(Sfx::Dig),
            GameEvent::GemCollected { .. } => Some(Sfx::Collect),
            GameEvent::ObjectLanded { kind: TileKind::Boulder, .. } => Some(Sfx::BoulderFall),
            GameEvent::PlayerCrushed { .. } => Some(Sfx::Crush),
            GameEvent::LevelComplete { .. } => Some(Sfx::LevelComplete),
            GameEvent::TimeUp => Some(Sfx::Death),
            GameEvent::ObjectLanded { .. } | GameEvent::BoulderPushed { .. } | GameEvent::ExitOpened => None,
        }
    }

    /// Effects for one tick's events, each at most once.
    /// A footstep is dropped when something louder happened at the same cell.
    pub fn for_events(events: &[GameEvent]) -> Vec<Sfx> {
        let mut out: Vec<Sfx> = Vec::new();
        for sfx in events.iter().filter_map(Sfx::for_event) {
            if !out.contains(&sfx) {
                out.push(sfx);
            }
        }
        if out.iter().any(|s| matches!(s, Sfx::Dig | Sfx::Collect)) {
            out.retain(|s| *s != Sfx::Move);
        }
        out
    }

    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    fn index(self) -> usize {
        self as usize
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis: mono f32 samples, then 16-bit PCM WAV
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::Sfx;

    pub const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        Square,
        Saw,
    }

    impl Wave {
        fn at(self, phase: f32) -> f32 {
            match self {
                Wave::Sine => phase.sin(),
                Wave::Square => if phase.sin() >= 0.0 { 0.6 } else { -0.6 },
                Wave::Saw => ((phase / TAU).fract() * 2.0 - 1.0) * 0.8,
            }
        }
    }

    pub fn render(sfx: Sfx, volume: f32) -> Vec<f32> {
        let v = volume.clamp(0.0, 1.0);
        match sfx {
            Sfx::Move => sweep(Wave::Sine, 150.0, 80.0, 0.04, v * 0.12),
            Sfx::Dig => noise_burst(0.08, 12.0, v * 0.16, None),
            Sfx::Collect => melody(Wave::Sine, &[
                (880.0, 0.0, 0.12),     // A5
                (1108.73, 0.05, 0.12),  // C#6
                (1318.51, 0.10, 0.12),  // E6
            ], v * 0.3),
            Sfx::BoulderFall => sweep(Wave::Sine, 120.0, 40.0, 0.15, v * 0.4),
            Sfx::Crush => noise_burst(0.2, 8.0, v * 0.5, Some((60.0, 15.0))),
            Sfx::LevelComplete => melody(Wave::Square, &[
                (523.25, 0.0, 0.12),    // C5
                (659.25, 0.12, 0.12),   // E5
                (783.99, 0.24, 0.12),   // G5
                (1046.50, 0.36, 0.25),  // C6
            ], v * 0.3),
            Sfx::Death => sweep(Wave::Saw, 400.0, 50.0, 0.4, v * 0.35),
        }
    }

    fn sample_count(seconds: f32) -> usize {
        (SAMPLE_RATE as f32 * seconds) as usize
    }

    /// Exponential fade from `gain` to near-silence over t ∈ [0, 1].
    fn decay(gain: f32, t: f32) -> f32 {
        if gain <= 0.01 {
            gain * (1.0 - t)
        } else {
            gain * (0.01 / gain).powf(t)
        }
    }

    /// Exponential pitch glide from `f0` to `f1`.
    fn sweep(wave: Wave, f0: f32, f1: f32, seconds: f32, gain: f32) -> Vec<f32> {
        let n = sample_count(seconds);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = f0 * (f1 / f0).powf(t);
                phase += TAU * freq / SAMPLE_RATE as f32;
                wave.at(phase) * decay(gain, t)
            })
            .collect()
    }

    /// Overlapping notes: (frequency, start, duration) in seconds.
    /// 20 ms linear attack, then an exponential tail.
    fn melody(wave: Wave, notes: &[(f32, f32, f32)], gain: f32) -> Vec<f32> {
        let end = notes.iter().map(|&(_, start, dur)| start + dur).fold(0.0, f32::max);
        let mut out = vec![0.0_f32; sample_count(end)];
        let attack = sample_count(0.02).max(1);

        for &(freq, start, dur) in notes {
            let offset = sample_count(start);
            let n = sample_count(dur);
            for i in 0..n {
                let Some(slot) = out.get_mut(offset + i) else { break };
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = if i < attack {
                    gain * i as f32 / attack as f32
                } else {
                    decay(gain, (i - attack) as f32 / (n - attack).max(1) as f32)
                };
                *slot += wave.at(t * freq * TAU) * env;
            }
        }
        out
    }

    /// Decaying white noise, optionally mixed with a decaying low thump
    /// `(cycles over the burst, decay rate)`.
    fn noise_burst(seconds: f32, rate: f32, gain: f32, thump: Option<(f32, f32)>) -> Vec<f32> {
        let n = sample_count(seconds);
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let noise = (rng >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let sample = match thump {
                    Some((cycles, k)) => noise * 0.5 + (TAU * cycles * t).sin() * (-t * k).exp(),
                    None => noise,
                };
                (sample * (-t * rate).exp() * gain).clamp(-1.0, 1.0)
            })
            .collect()
    }

    /// Wrap mono samples into a 16-bit PCM WAV buffer.
    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let byte_rate = SAMPLE_RATE * u32::from(CHANNELS) * u32::from(BITS) / 8;
        let block_align = CHANNELS * BITS / 8;
        let data_size = samples.len() as u32 * u32::from(block_align);

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            buf.extend_from_slice(&pcm.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Playback
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// One WAV per `Sfx`, in `Sfx::ALL` order.
        buffers: Vec<Arc<[u8]>>,
    }

    impl SoundEngine {
        /// None when no audio device is available.
        pub fn new(volume: f32) -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::from(synth::make_wav(&synth::render(sfx, volume))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx.index()) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(Arc::clone(buf))) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: f32) -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in Sfx::for_events(events) {
            self.play(sfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_effect_renders_in_range() {
        for sfx in Sfx::ALL {
            let samples = synth::render(sfx, 1.0);
            assert!(!samples.is_empty(), "{sfx:?}");
            assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0), "{sfx:?}");
        }
    }

    #[test]
    fn zero_volume_is_silent() {
        for sfx in Sfx::ALL {
            assert!(synth::render(sfx, 0.0).iter().all(|s| *s == 0.0), "{sfx:?}");
        }
    }

    #[test]
    fn wav_header() {
        let wav = synth::make_wav(&[0.0, 0.5, -0.5]);
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 6);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
    }

    #[test]
    fn event_mapping() {
        assert_eq!(Sfx::for_event(&GameEvent::TimeUp), Some(Sfx::Death));
        assert_eq!(Sfx::for_event(&GameEvent::PlayerCrushed { x: 0, y: 0 }), Some(Sfx::Crush));
        assert_eq!(
            Sfx::for_event(&GameEvent::ObjectLanded { x: 0, y: 0, kind: TileKind::Boulder }),
            Some(Sfx::BoulderFall)
        );
        assert_eq!(Sfx::for_event(&GameEvent::ObjectLanded { x: 0, y: 0, kind: TileKind::Gem }), None);
        assert_eq!(Sfx::for_event(&GameEvent::ExitOpened), None);
    }

    #[test]
    fn dig_suppresses_footstep_and_dedups() {
        let events = [
            GameEvent::DugDirt { x: 2, y: 1 },
            GameEvent::Moved { x: 2, y: 1 },
            GameEvent::ObjectLanded { x: 4, y: 4, kind: TileKind::Boulder },
            GameEvent::ObjectLanded { x: 6, y: 4, kind: TileKind::Boulder },
        ];
        assert_eq!(Sfx::for_events(&events), vec![Sfx::Dig, Sfx::BoulderFall]);
        assert_eq!(Sfx::for_events(&[GameEvent::Moved { x: 1, y: 1 }]), vec![Sfx::Move]);
    }
}
