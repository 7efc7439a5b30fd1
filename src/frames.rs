//! Bounded-buffer PCM transfer between host sequences and the codec.
//!
//! One pipeline per sample representation (f32, s32, s16). Buffer memory is
//! fixed and small regardless of how much data the host asks to move; big
//! requests are satisfied chunk by chunk until done or until the codec
//! reports a short transfer.
//!
//! Unit asymmetry, preserved from the original contract: the write loops
//! return a count in **samples**, the read loops return a sequence sized in
//! **frames** (length = frames read x channels).

use crate::BridgeError;
use crate::codec::PcmCodec;
use crate::value::f64_to_i64;

/// Transfer-chunk capacity in samples, per pipeline.
pub(crate) const F32_BUFFER: usize = 4096;
pub(crate) const S32_BUFFER: usize = F32_BUFFER;
pub(crate) const S16_BUFFER: usize = S32_BUFFER * 2;

/// Don't let an absurd frame request preallocate unbounded memory; the
/// output grows past this on demand.
const PREALLOC_FRAME_CAP: u64 = 1 << 20;

/// Owns the transfer buffers. Buffers are sized on first use and reused for
/// the lifetime of the binding instance.
#[derive(Default)]
pub struct FrameBuffer {
    pcm_f32: Vec<f32>,
    pcm_s32: Vec<i32>,
    pcm_s16: Vec<i16>,
}

/// Whole-frame alignment check shared by all write pipelines.
fn check_alignment(sample_count: u64, channels: u64) -> Result<(), BridgeError> {
    if channels == 0 {
        return Err(BridgeError::InvalidParams("channel count is zero"));
    }
    if sample_count % channels != 0 {
        return Err(BridgeError::IncompleteFrame {
            samples: sample_count,
            channels,
        });
    }
    Ok(())
}

fn prealloc(frames: u64, channels: u64) -> Vec<f64> {
    Vec::with_capacity((frames.min(PREALLOC_FRAME_CAP) * channels) as usize)
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_f32(
        &mut self,
        codec: &mut dyn PcmCodec,
        samples: &[f64],
    ) -> Result<u64, BridgeError> {
        let channels = codec.channels() as u64;
        let total = samples.len() as u64;
        check_alignment(total, channels)?;
        if self.pcm_f32.len() < F32_BUFFER {
            self.pcm_f32.resize(F32_BUFFER, 0.0);
        }

        let mut transferred = 0u64;
        while transferred < total {
            let n = (total - transferred).min(F32_BUFFER as u64);
            for i in 0..n as usize {
                self.pcm_f32[i] = samples[transferred as usize + i] as f32;
            }
            let t = codec.write_pcm_frames_f32(n / channels, &self.pcm_f32[..n as usize]);
            let moved = t * channels;
            transferred += moved;
            if moved != n {
                break;
            }
        }
        Ok(transferred)
    }

    pub fn write_s32(
        &mut self,
        codec: &mut dyn PcmCodec,
        samples: &[f64],
    ) -> Result<u64, BridgeError> {
        let channels = codec.channels() as u64;
        let total = samples.len() as u64;
        check_alignment(total, channels)?;
        if self.pcm_s32.len() < S32_BUFFER {
            self.pcm_s32.resize(S32_BUFFER, 0);
        }

        let mut transferred = 0u64;
        while transferred < total {
            let n = (total - transferred).min(S32_BUFFER as u64);
            for i in 0..n as usize {
                self.pcm_s32[i] = f64_to_i64(samples[transferred as usize + i]) as i32;
            }
            let t = codec.write_pcm_frames_s32(n / channels, &self.pcm_s32[..n as usize]);
            let moved = t * channels;
            transferred += moved;
            if moved != n {
                break;
            }
        }
        Ok(transferred)
    }

    pub fn write_s16(
        &mut self,
        codec: &mut dyn PcmCodec,
        samples: &[f64],
    ) -> Result<u64, BridgeError> {
        let channels = codec.channels() as u64;
        let total = samples.len() as u64;
        check_alignment(total, channels)?;
        if self.pcm_s16.len() < S16_BUFFER {
            self.pcm_s16.resize(S16_BUFFER, 0);
        }

        let mut transferred = 0u64;
        while transferred < total {
            let n = (total - transferred).min(S16_BUFFER as u64);
            for i in 0..n as usize {
                self.pcm_s16[i] = f64_to_i64(samples[transferred as usize + i]) as i16;
            }
            let t = codec.write_pcm_frames_s16(n / channels, &self.pcm_s16[..n as usize]);
            let moved = t * channels;
            transferred += moved;
            if moved != n {
                break;
            }
        }
        Ok(transferred)
    }

    pub fn read_f32(&mut self, codec: &mut dyn PcmCodec, frames: u64) -> Vec<f64> {
        let channels = codec.channels() as u64;
        if channels == 0 {
            return Vec::new();
        }
        let per_chunk = F32_BUFFER as u64 / channels;
        if per_chunk == 0 {
            return Vec::new();
        }
        if self.pcm_f32.len() < F32_BUFFER {
            self.pcm_f32.resize(F32_BUFFER, 0.0);
        }

        let mut out = prealloc(frames, channels);
        let mut read = 0u64;
        while read < frames {
            let n = (frames - read).min(per_chunk);
            let t = codec.read_pcm_frames_f32(n, &mut self.pcm_f32[..(n * channels) as usize]);
            for i in 0..(t * channels) as usize {
                out.push(self.pcm_f32[i] as f64);
            }
            if t != n {
                break;
            }
            read += t;
        }
        out
    }

    pub fn read_s32(&mut self, codec: &mut dyn PcmCodec, frames: u64) -> Vec<f64> {
        let channels = codec.channels() as u64;
        if channels == 0 {
            return Vec::new();
        }
        let per_chunk = S32_BUFFER as u64 / channels;
        if per_chunk == 0 {
            return Vec::new();
        }
        if self.pcm_s32.len() < S32_BUFFER {
            self.pcm_s32.resize(S32_BUFFER, 0);
        }

        let mut out = prealloc(frames, channels);
        let mut read = 0u64;
        while read < frames {
            let n = (frames - read).min(per_chunk);
            let t = codec.read_pcm_frames_s32(n, &mut self.pcm_s32[..(n * channels) as usize]);
            for i in 0..(t * channels) as usize {
                out.push(self.pcm_s32[i] as f64);
            }
            if t != n {
                break;
            }
            read += t;
        }
        out
    }

    pub fn read_s16(&mut self, codec: &mut dyn PcmCodec, frames: u64) -> Vec<f64> {
        let channels = codec.channels() as u64;
        if channels == 0 {
            return Vec::new();
        }
        let per_chunk = S16_BUFFER as u64 / channels;
        if per_chunk == 0 {
            return Vec::new();
        }
        if self.pcm_s16.len() < S16_BUFFER {
            self.pcm_s16.resize(S16_BUFFER, 0);
        }

        let mut out = prealloc(frames, channels);
        let mut read = 0u64;
        while read < frames {
            let n = (frames - read).min(per_chunk);
            let t = codec.read_pcm_frames_s16(n, &mut self.pcm_s16[..(n * channels) as usize]);
            for i in 0..(t * channels) as usize {
                out.push(self.pcm_s16[i] as f64);
            }
            if t != n {
                break;
            }
            read += t;
        }
        out
    }
}
