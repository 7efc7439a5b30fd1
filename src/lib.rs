//! Host-side bridge for a pull/push-callback WAV codec.
//!
//! The codec speaks synchronous read/seek/write callbacks and exact 64-bit
//! counts; the host speaks closures and doubles. This crate sits between
//! them: [`value::Value`] carries sizes, offsets and frame counts that a
//! double cannot hold losslessly, the registry/stream/chunk modules route
//! the codec's callback protocol into host closures, and [`Wav`] drives the
//! initialization decision table and the bounded PCM transfer loops.
//!
//! The codec itself lives behind the [`codec::PcmCodec`] trait and is not
//! implemented here.

pub mod chunk;
pub mod codec;
pub mod frames;
mod prelude;
pub mod registry;
pub mod status;
pub mod stream;
pub mod value;

use std::any::Any;

use log::debug;
use thiserror::Error;

use crate::chunk::ChunkBridge;
use crate::codec::{DataFormat, DecodedFrames, Fmt, PcmCodec, SampleLayout};
use crate::frames::FrameBuffer;
use crate::prelude::*;
use crate::registry::{
    CallbackRegistry, ChunkCallbacks, ChunkFn, Direction, ReadFn, SeekFn, StreamCallbacks, WriteFn,
};
use crate::stream::StreamBridge;

/// Misuse failures: the call itself is wrong and should be fixed, not
/// retried. Environment failures (unreadable input, sink trouble) are never
/// reported this way; they come back as falsey results or short transfers.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BridgeError {
    /// A closure required for the requested stream direction was absent.
    #[error("missing required {0} callback")]
    MissingCallback(&'static str),

    /// A sample sequence does not divide into whole frames.
    #[error("incomplete frame: {samples} samples over {channels} channels")]
    IncompleteFrame { samples: u64, channels: u64 },

    /// No transfer pipeline exists for the requested format.
    #[error("unsupported format: tag {format} at {bits_per_sample} bits per sample")]
    UnsupportedFormat { format: u16, bits_per_sample: u32 },

    /// Read/write attempted without an open session.
    #[error("stream is not initialized")]
    NotInitialized,

    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),
}

/// Everything a host may supply to [`Wav::init`] / [`Wav::init_write`].
/// Unused fields are ignored by the path that ends up selected.
#[derive(Default)]
pub struct InitSettings {
    /// When present, byte I/O goes straight to the file and the callback
    /// bridge is bypassed.
    pub filename: Option<String>,
    pub on_read: Option<ReadFn>,
    pub on_seek: Option<SeekFn>,
    pub on_write: Option<WriteFn>,
    pub on_chunk: Option<ChunkFn>,
    pub user_data: Option<Box<dyn Any>>,
    pub chunk_user_data: Option<Box<dyn Any>>,
    /// Parse-strictness bits forwarded to the codec untouched.
    pub flags: u32,
    /// Selects sequential write mode, counted in samples.
    pub total_samples: Option<Value>,
    /// Selects sequential write mode, counted in frames. Wins over
    /// `total_samples` when both are present.
    pub total_frames: Option<Value>,
}

/// One binding instance: one codec session, one callback registration per
/// direction, one set of transfer buffers.
pub struct Wav {
    codec: Box<dyn PcmCodec>,
    registry: CallbackRegistry,
    frames: FrameBuffer,
    write_layout: Option<SampleLayout>,
    initialized: bool,
}

/// Pick the transfer pipeline for a write format. This is the only accepted
/// combination table; everything else is rejected up front.
fn select_layout(format: &DataFormat) -> Result<SampleLayout, BridgeError> {
    if format.format == status::FORMAT_IEEE_FLOAT {
        return Ok(SampleLayout::F32);
    }
    if format.format == status::FORMAT_PCM {
        match format.bits_per_sample {
            32 => return Ok(SampleLayout::S32),
            16 => return Ok(SampleLayout::S16),
            _ => {}
        }
    }
    Err(BridgeError::UnsupportedFormat {
        format: format.format,
        bits_per_sample: format.bits_per_sample,
    })
}

impl Wav {
    pub fn new(codec: Box<dyn PcmCodec>) -> Self {
        Self {
            codec,
            registry: CallbackRegistry::new(),
            frames: FrameBuffer::new(),
            write_layout: None,
            initialized: false,
        }
    }

    /// Close the current session and drop every registration. Safe to call
    /// repeatedly and on a never-initialized instance.
    pub fn uninit(&mut self) {
        self.codec.uninit();
        self.registry.release_all();
        self.write_layout = None;
        self.initialized = false;
    }

    /// Open for reading. The path is chosen by what `settings` carries:
    /// a filename alone opens the file directly; a filename plus an
    /// `on_chunk` closure adds the chunk bridge; otherwise `on_read` and
    /// `on_seek` are required and all byte I/O goes through the bridge.
    ///
    /// Returns `Ok(Some(fmt))` on success and `Ok(None)` when the codec
    /// rejects the input; `Err` is reserved for misuse.
    pub fn init(&mut self, settings: InitSettings) -> R<Option<Fmt>> {
        // initializing twice without teardown is a logic error; prevent it
        // by always uninitializing first
        self.uninit();

        let ok = match self.init_read_session(settings) {
            Ok(ok) => ok,
            Err(e) => {
                self.registry.release_all();
                return Err(e);
            }
        };

        if ok {
            self.initialized = true;
            Ok(Some(self.codec.fmt()))
        } else {
            self.registry.release_all();
            Ok(None)
        }
    }

    fn init_read_session(&mut self, settings: InitSettings) -> R<bool> {
        let InitSettings {
            filename,
            on_read,
            on_seek,
            on_chunk,
            user_data,
            chunk_user_data,
            flags,
            ..
        } = settings;

        let with_chunk = if let Some(on_chunk) = on_chunk {
            self.registry.register_chunk(ChunkCallbacks {
                on_chunk: Some(on_chunk),
                chunk_user_data,
            })?;
            true
        } else {
            false
        };

        if let Some(path) = filename {
            debug!("init: file path, chunk bridge {}", with_chunk);
            let ok = if with_chunk {
                let state = self.registry.chunk_state().ok_or(BridgeError::NotInitialized)?;
                let mut sink = ChunkBridge::new(state, None);
                self.codec.init_file(&path, Some(&mut sink), flags)
            } else {
                self.codec.init_file(&path, None, flags)
            };
            return Ok(ok);
        }

        self.registry.register_stream(
            StreamCallbacks {
                on_read,
                on_seek,
                on_write: None,
                user_data,
            },
            Direction::Read,
        )?;
        let stream_state = self
            .registry
            .stream_state()
            .ok_or(BridgeError::NotInitialized)?;
        let stream = Box::new(StreamBridge::new(stream_state));

        debug!("init: callback stream, chunk bridge {}", with_chunk);
        let ok = if with_chunk {
            let state = self.registry.chunk_state().ok_or(BridgeError::NotInitialized)?;
            let mut sink = ChunkBridge::new(state, self.registry.stream_state());
            self.codec.init(stream, Some(&mut sink), flags)
        } else {
            self.codec.init(stream, None, flags)
        };
        Ok(ok)
    }

    /// Open for writing with the given output format. A filename opens the
    /// file directly. Otherwise `on_write` is required; a total
    /// sample/frame count selects sequential mode (no seek closure needed),
    /// and without a total count `on_seek` is required so the codec can
    /// patch the header afterwards.
    ///
    /// Returns `Ok(true)` on success, `Ok(false)` when the codec fails;
    /// `Err` is reserved for misuse.
    pub fn init_write(&mut self, settings: InitSettings, format: DataFormat) -> R<bool> {
        self.uninit();

        let layout = select_layout(&format)?;
        let ok = match self.init_write_session(settings, &format) {
            Ok(ok) => ok,
            Err(e) => {
                self.registry.release_all();
                return Err(e);
            }
        };

        if ok {
            self.write_layout = Some(layout);
            self.initialized = true;
            Ok(true)
        } else {
            self.registry.release_all();
            Ok(false)
        }
    }

    fn init_write_session(&mut self, settings: InitSettings, format: &DataFormat) -> R<bool> {
        let InitSettings {
            filename,
            on_seek,
            on_write,
            user_data,
            total_samples,
            total_frames,
            ..
        } = settings;

        if let Some(path) = filename {
            debug!("init_write: file path");
            return Ok(self.codec.init_file_write(&path, format));
        }

        // totalFrames wins when both totals are present
        let sequential = if let Some(frames) = total_frames {
            Some((true, frames.to_u64()?))
        } else if let Some(samples) = total_samples {
            Some((false, samples.to_u64()?))
        } else {
            None
        };

        let direction = if sequential.is_some() {
            Direction::SequentialWrite
        } else {
            Direction::RandomWrite
        };
        self.registry.register_stream(
            StreamCallbacks {
                on_read: None,
                on_seek,
                on_write,
                user_data,
            },
            direction,
        )?;
        let stream_state = self
            .registry
            .stream_state()
            .ok_or(BridgeError::NotInitialized)?;
        let stream = Box::new(StreamBridge::new(stream_state));

        let ok = match sequential {
            Some((true, frames)) => {
                debug!("init_write: sequential, {} frames", frames);
                self.codec
                    .init_write_sequential_pcm_frames(format, frames, stream)
            }
            Some((false, samples)) => {
                debug!("init_write: sequential, {} samples", samples);
                self.codec.init_write_sequential(format, samples, stream)
            }
            None => {
                debug!("init_write: random access");
                self.codec.init_write(format, stream)
            }
        };
        Ok(ok)
    }

    /// Format descriptor of the open session.
    pub fn fmt(&self) -> R<Fmt> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized.into());
        }
        Ok(self.codec.fmt())
    }

    /// Read up to `frames` frames as 32-bit floats. The result holds
    /// `frames_read * channels` doubles; shorter than requested means the
    /// stream ran out.
    pub fn read_pcm_frames_f32(&mut self, frames: impl Into<Operand>) -> R<Vec<f64>> {
        let frames = self.frame_request(frames)?;
        Ok(self.frames.read_f32(self.codec.as_mut(), frames))
    }

    /// Read up to `frames` frames as 32-bit integers.
    pub fn read_pcm_frames_s32(&mut self, frames: impl Into<Operand>) -> R<Vec<f64>> {
        let frames = self.frame_request(frames)?;
        Ok(self.frames.read_s32(self.codec.as_mut(), frames))
    }

    /// Read up to `frames` frames as 16-bit integers.
    pub fn read_pcm_frames_s16(&mut self, frames: impl Into<Operand>) -> R<Vec<f64>> {
        let frames = self.frame_request(frames)?;
        Ok(self.frames.read_s16(self.codec.as_mut(), frames))
    }

    fn frame_request(&self, frames: impl Into<Operand>) -> R<u64> {
        if !self.initialized {
            return Err(BridgeError::NotInitialized.into());
        }
        Ok(Value::unsigned(frames)?.to_u64()?)
    }

    /// Write a whole-frame sample sequence through the pipeline selected at
    /// `init_write`. Returns the count actually transferred, in **samples**
    /// (the read side counts frames; the asymmetry is part of the
    /// contract). A count shorter than the input means the sink stopped
    /// accepting data.
    pub fn write_pcm_frames(&mut self, samples: &[f64]) -> R<Value> {
        let layout = self.write_layout.ok_or(BridgeError::NotInitialized)?;
        let transferred = match layout {
            SampleLayout::F32 => self.frames.write_f32(self.codec.as_mut(), samples)?,
            SampleLayout::S32 => self.frames.write_s32(self.codec.as_mut(), samples)?,
            SampleLayout::S16 => self.frames.write_s16(self.codec.as_mut(), samples)?,
        };
        Ok(Value::Unsigned(transferred))
    }
}

impl Drop for Wav {
    fn drop(&mut self) {
        self.uninit();
    }
}

/// Whole-file shortcut: open, decode everything in the requested layout,
/// tear down. With a filename this bypasses the callback bridge entirely;
/// otherwise `on_read` and `on_seek` are required and a transient stream
/// registration is created for the duration of the call.
pub fn open_and_read_pcm_frames(
    codec: &mut dyn PcmCodec,
    layout: SampleLayout,
    settings: InitSettings,
) -> R<Option<DecodedFrames>> {
    let InitSettings {
        filename,
        on_read,
        on_seek,
        user_data,
        ..
    } = settings;

    if let Some(path) = filename {
        return Ok(codec.open_file_and_read(layout, &path));
    }

    let mut registry = CallbackRegistry::new();
    registry.register_stream(
        StreamCallbacks {
            on_read,
            on_seek,
            on_write: None,
            user_data,
        },
        Direction::Read,
    )?;
    let stream_state = registry
        .stream_state()
        .ok_or(BridgeError::NotInitialized)?;
    let stream = Box::new(StreamBridge::new(stream_state));
    let decoded = codec.open_and_read(layout, stream);
    registry.release_all();
    Ok(decoded)
}
