//! The external codec boundary.
//!
//! The bit-level WAV work lives outside this crate; everything it needs from
//! us, and everything we need from it, is pinned down here. The codec pulls
//! bytes through a [`CodecStream`] it owns for the session, reports chunks it
//! does not interpret to a [`CodecChunkSink`] during initialization, and
//! moves PCM through the typed frame entry points.

/// Seek origin for [`CodecStream::seek`]. Forwarded to the host verbatim;
/// the bridge never rewrites one origin into the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SeekOrigin {
    Start = 0,
    Current = 1,
}

/// Container kind of the stream being parsed or produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Container {
    Riff = 0,
    W64 = 1,
    Rf64 = 2,
}

/// Identifier of a chunk the codec did not interpret: a four-byte code for
/// RIFF/RF64 containers, a sixteen-byte identifier for W64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkId {
    FourCc([u8; 4]),
    Guid([u8; 16]),
}

/// Header of an unhandled chunk, alive only for the duration of one
/// [`CodecChunkSink::on_chunk`] call-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: ChunkId,
    pub size_in_bytes: u64,
    pub padding_size: u32,
}

/// Format descriptor snapshot produced by the codec after a successful
/// read-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fmt {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extended_size: u16,
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: [u8; 16],
}

/// Host-supplied format for a write session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    pub container: Container,
    pub format: u16,
    pub channels: u32,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
}

/// Whole-file decode result handed back by the shortcut entry points.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrames {
    pub channels: u32,
    pub sample_rate: u32,
    pub frame_count: u64,
    pub samples: Vec<f64>,
}

/// Which PCM representation a transfer pipeline moves. Selected once at
/// initialization and dispatched exhaustively, never through a stored
/// callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    F32,
    S32,
    S16,
}

/// The synchronous byte-stream contract the codec demands. Implemented by
/// the stream bridge; every call lands in a host closure.
pub trait CodecStream {
    /// Fill up to `out.len()` bytes, returning how many were produced. A
    /// short count signals end of input and is not an error.
    fn read(&mut self, out: &mut [u8]) -> usize;

    /// Reposition the stream. `false` aborts the surrounding codec
    /// operation.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> bool;

    /// Accept `data`, returning how many bytes the sink took. A short count
    /// signals sink failure.
    fn write(&mut self, data: &[u8]) -> usize;
}

/// Receiver for chunks the codec skips. Returns the byte count the receiver
/// consumed; the codec skips whatever remains of the chunk itself.
pub trait CodecChunkSink {
    fn on_chunk(&mut self, header: &ChunkHeader, container: Container, fmt: &Fmt) -> u64;
}

/// Entry points of the external codec. Read sessions hand the codec an owned
/// stream; the chunk sink is only borrowed for the duration of
/// initialization, which is the only time the codec reports chunks.
pub trait PcmCodec {
    /// Open for reading over a callback stream. Returns false on
    /// malformed/unreadable input (an environment failure, not a misuse).
    fn init(
        &mut self,
        stream: Box<dyn CodecStream>,
        chunk: Option<&mut dyn CodecChunkSink>,
        flags: u32,
    ) -> bool;

    /// Open a file directly, bypassing the callback bridge for byte I/O.
    fn init_file(
        &mut self,
        path: &str,
        chunk: Option<&mut dyn CodecChunkSink>,
        flags: u32,
    ) -> bool;

    /// Open for random-access writing; the codec seeks back to patch header
    /// fields when the session ends.
    fn init_write(&mut self, format: &DataFormat, stream: Box<dyn CodecStream>) -> bool;

    /// Open for sequential writing with the total sample count known up
    /// front, so the header never needs rewriting.
    fn init_write_sequential(
        &mut self,
        format: &DataFormat,
        total_samples: u64,
        stream: Box<dyn CodecStream>,
    ) -> bool;

    /// Sequential write keyed by total frame count instead of samples.
    fn init_write_sequential_pcm_frames(
        &mut self,
        format: &DataFormat,
        total_frames: u64,
        stream: Box<dyn CodecStream>,
    ) -> bool;

    /// Open a file directly for writing.
    fn init_file_write(&mut self, path: &str, format: &DataFormat) -> bool;

    /// Tear down the current session. Must be safe to call when no session
    /// is open.
    fn uninit(&mut self);

    /// Format descriptor of the open read session.
    fn fmt(&self) -> Fmt;

    /// Channel count of the open session.
    fn channels(&self) -> u16;

    /// Read up to `frames` whole frames into `out` (`frames * channels`
    /// samples), returning frames actually produced.
    fn read_pcm_frames_f32(&mut self, frames: u64, out: &mut [f32]) -> u64;
    fn read_pcm_frames_s32(&mut self, frames: u64, out: &mut [i32]) -> u64;
    fn read_pcm_frames_s16(&mut self, frames: u64, out: &mut [i16]) -> u64;

    /// Write `frames` whole frames from `data`, returning frames actually
    /// written. A short count signals a sink failure.
    fn write_pcm_frames_f32(&mut self, frames: u64, data: &[f32]) -> u64;
    fn write_pcm_frames_s32(&mut self, frames: u64, data: &[i32]) -> u64;
    fn write_pcm_frames_s16(&mut self, frames: u64, data: &[i16]) -> u64;

    /// Whole-file shortcut: open over a callback stream, decode everything,
    /// tear down. None on any failure.
    fn open_and_read(
        &mut self,
        layout: SampleLayout,
        stream: Box<dyn CodecStream>,
    ) -> Option<DecodedFrames>;

    /// Whole-file shortcut over a file path.
    fn open_file_and_read(&mut self, layout: SampleLayout, path: &str) -> Option<DecodedFrames>;
}
