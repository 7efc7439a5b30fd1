//! End-to-end tests: host closures on one side, a byte-faithful stub codec
//! on the other, with the full bridge stack in between.
//!
//! The stub speaks a minimal little-endian container: a `WBRG` magic, a
//! format/channels/rate/bits header, an optional auxiliary chunk, then raw
//! 16-bit PCM frames until the stream runs out. Small, but enough to make
//! every byte travel through the callback bridge.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};

use wavbridge::codec::{
    ChunkHeader, ChunkId, CodecChunkSink, CodecStream, Container, DataFormat, DecodedFrames, Fmt,
    PcmCodec, SampleLayout, SeekOrigin,
};
use wavbridge::value::Value;
use wavbridge::{open_and_read_pcm_frames, status, InitSettings, Wav};

const MAGIC: &[u8; 4] = b"WBRG";
const HEADER_LEN: usize = 16;

/// In-memory byte store the host closures operate on through user data.
struct HostBuffer {
    data: Vec<u8>,
    pos: usize,
    /// Caps how many bytes a single store accepts in total; simulates a
    /// sink that stops taking data.
    write_budget: Option<usize>,
}

impl HostBuffer {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            write_budget: None,
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }
}

fn host_read(user: &mut dyn Any, len: usize) -> Vec<u8> {
    let buf = user.downcast_mut::<HostBuffer>().unwrap();
    let end = (buf.pos + len).min(buf.data.len());
    let out = buf.data[buf.pos..end].to_vec();
    buf.pos = end;
    out
}

fn host_seek(user: &mut dyn Any, offset: i64, origin: SeekOrigin) -> bool {
    let buf = user.downcast_mut::<HostBuffer>().unwrap();
    let base = match origin {
        SeekOrigin::Start => 0i64,
        SeekOrigin::Current => buf.pos as i64,
    };
    let target = base + offset;
    if target < 0 || target as usize > buf.data.len() {
        return false;
    }
    buf.pos = target as usize;
    true
}

fn host_write(user: &mut dyn Any, data: &[u8]) -> usize {
    let buf = user.downcast_mut::<HostBuffer>().unwrap();
    let take = match buf.write_budget {
        Some(budget) => data.len().min(budget.saturating_sub(buf.data.len())),
        None => data.len(),
    };
    buf.data.extend_from_slice(&data[..take]);
    take
}

fn read_settings(buf: HostBuffer) -> InitSettings {
    InitSettings {
        on_read: Some(Box::new(host_read)),
        on_seek: Some(Box::new(host_seek)),
        user_data: Some(Box::new(buf)),
        ..Default::default()
    }
}

fn write_settings(buf: HostBuffer) -> InitSettings {
    InitSettings {
        on_write: Some(Box::new(host_write)),
        on_seek: Some(Box::new(host_seek)),
        user_data: Some(Box::new(buf)),
        ..Default::default()
    }
}

/// The codec side of the wire format. Owns its stream for the session, the
/// way the real codec does.
#[derive(Default)]
struct WireCodec {
    stream: Option<Box<dyn CodecStream>>,
    fmt: Fmt,
}

impl WireCodec {
    fn read_exact(stream: &mut dyn CodecStream, out: &mut [u8]) -> bool {
        stream.read(out) == out.len()
    }

    fn parse_header(
        stream: &mut dyn CodecStream,
        chunk: Option<&mut dyn CodecChunkSink>,
    ) -> Option<Fmt> {
        let mut header = [0u8; HEADER_LEN];
        if !Self::read_exact(stream, &mut header) || &header[..4] != MAGIC {
            return None;
        }
        let fmt = Fmt {
            format_tag: LittleEndian::read_u16(&header[4..6]),
            channels: LittleEndian::read_u16(&header[6..8]),
            sample_rate: LittleEndian::read_u32(&header[8..12]),
            bits_per_sample: LittleEndian::read_u16(&header[12..14]),
            ..Default::default()
        };
        let aux_len = LittleEndian::read_u16(&header[14..16]) as u64;
        if aux_len > 0 {
            let mut fourcc = [0u8; 4];
            if !Self::read_exact(stream, &mut fourcc) {
                return None;
            }
            let consumed = match chunk {
                Some(sink) => {
                    let hdr = ChunkHeader {
                        id: ChunkId::FourCc(fourcc),
                        size_in_bytes: aux_len,
                        padding_size: 0,
                    };
                    sink.on_chunk(&hdr, Container::Riff, &fmt).min(aux_len)
                }
                None => 0,
            };
            let remaining = (aux_len - consumed) as i64;
            if remaining > 0 && !stream.seek(remaining, SeekOrigin::Current) {
                return None;
            }
        }
        Some(fmt)
    }

    fn write_header(&self, stream: &mut dyn CodecStream, format: &DataFormat) -> bool {
        let mut header = [0u8; HEADER_LEN];
        header[..4].copy_from_slice(MAGIC);
        LittleEndian::write_u16(&mut header[4..6], format.format);
        LittleEndian::write_u16(&mut header[6..8], format.channels as u16);
        LittleEndian::write_u32(&mut header[8..12], format.sample_rate);
        LittleEndian::write_u16(&mut header[12..14], format.bits_per_sample as u16);
        LittleEndian::write_u16(&mut header[14..16], 0);
        stream.write(&header) == HEADER_LEN
    }
}

impl PcmCodec for WireCodec {
    fn init(
        &mut self,
        mut stream: Box<dyn CodecStream>,
        chunk: Option<&mut dyn CodecChunkSink>,
        _flags: u32,
    ) -> bool {
        match Self::parse_header(stream.as_mut(), chunk) {
            Some(fmt) => {
                self.fmt = fmt;
                self.stream = Some(stream);
                true
            }
            None => false,
        }
    }

    fn init_file(
        &mut self,
        _path: &str,
        _chunk: Option<&mut dyn CodecChunkSink>,
        _flags: u32,
    ) -> bool {
        false
    }

    fn init_write(&mut self, format: &DataFormat, mut stream: Box<dyn CodecStream>) -> bool {
        if !self.write_header(stream.as_mut(), format) {
            return false;
        }
        self.fmt = Fmt {
            format_tag: format.format,
            channels: format.channels as u16,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample as u16,
            ..Default::default()
        };
        self.stream = Some(stream);
        true
    }

    fn init_write_sequential(
        &mut self,
        format: &DataFormat,
        _total_samples: u64,
        stream: Box<dyn CodecStream>,
    ) -> bool {
        self.init_write(format, stream)
    }

    fn init_write_sequential_pcm_frames(
        &mut self,
        format: &DataFormat,
        _total_frames: u64,
        stream: Box<dyn CodecStream>,
    ) -> bool {
        self.init_write(format, stream)
    }

    fn init_file_write(&mut self, _path: &str, _format: &DataFormat) -> bool {
        false
    }

    fn uninit(&mut self) {
        self.stream = None;
        self.fmt = Fmt::default();
    }

    fn fmt(&self) -> Fmt {
        self.fmt
    }

    fn channels(&self) -> u16 {
        self.fmt.channels
    }

    fn read_pcm_frames_f32(&mut self, _frames: u64, _out: &mut [f32]) -> u64 {
        0
    }

    fn read_pcm_frames_s32(&mut self, _frames: u64, _out: &mut [i32]) -> u64 {
        0
    }

    fn read_pcm_frames_s16(&mut self, frames: u64, out: &mut [i16]) -> u64 {
        let channels = self.fmt.channels as usize;
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return 0,
        };
        let want = frames as usize * channels * 2;
        let mut bytes = vec![0u8; want];
        let got = stream.read(&mut bytes);
        let whole = got / (channels * 2) * channels;
        for (i, slot) in out[..whole].iter_mut().enumerate() {
            *slot = LittleEndian::read_i16(&bytes[i * 2..i * 2 + 2]);
        }
        (whole / channels) as u64
    }

    fn write_pcm_frames_f32(&mut self, _frames: u64, _data: &[f32]) -> u64 {
        0
    }

    fn write_pcm_frames_s32(&mut self, _frames: u64, _data: &[i32]) -> u64 {
        0
    }

    fn write_pcm_frames_s16(&mut self, frames: u64, data: &[i16]) -> u64 {
        let channels = self.fmt.channels as usize;
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return 0,
        };
        let samples = frames as usize * channels;
        let mut bytes = vec![0u8; samples * 2];
        for (i, &sample) in data[..samples].iter().enumerate() {
            LittleEndian::write_i16(&mut bytes[i * 2..i * 2 + 2], sample);
        }
        let accepted = stream.write(&bytes);
        (accepted / (channels * 2)) as u64
    }

    fn open_and_read(
        &mut self,
        layout: SampleLayout,
        stream: Box<dyn CodecStream>,
    ) -> Option<DecodedFrames> {
        if layout != SampleLayout::S16 || !self.init(stream, None, 0) {
            return None;
        }
        let channels = self.fmt.channels as u32;
        let mut samples = Vec::new();
        let mut chunk = vec![0i16; 256 * channels as usize];
        loop {
            let got = self.read_pcm_frames_s16(256, &mut chunk);
            samples.extend(
                chunk[..got as usize * channels as usize]
                    .iter()
                    .map(|&s| s as f64),
            );
            if got < 256 {
                break;
            }
        }
        let decoded = DecodedFrames {
            channels,
            sample_rate: self.fmt.sample_rate,
            frame_count: samples.len() as u64 / channels as u64,
            samples,
        };
        self.uninit();
        Some(decoded)
    }

    fn open_file_and_read(&mut self, _layout: SampleLayout, _path: &str) -> Option<DecodedFrames> {
        None
    }
}

fn pcm16_format(channels: u32) -> DataFormat {
    DataFormat {
        container: Container::Riff,
        format: status::FORMAT_PCM,
        channels,
        sample_rate: 44100,
        bits_per_sample: 16,
    }
}

/// Build a valid byte stream: header, optional aux chunk, s16 frames.
fn encode(channels: u16, aux: Option<(&[u8; 4], &[u8])>, samples: &[i16]) -> Vec<u8> {
    let mut out = vec![0u8; HEADER_LEN];
    out[..4].copy_from_slice(MAGIC);
    LittleEndian::write_u16(&mut out[4..6], status::FORMAT_PCM);
    LittleEndian::write_u16(&mut out[6..8], channels);
    LittleEndian::write_u32(&mut out[8..12], 44100);
    LittleEndian::write_u16(&mut out[12..14], 16);
    let aux_len = aux.map(|(_, body)| body.len()).unwrap_or(0);
    LittleEndian::write_u16(&mut out[14..16], aux_len as u16);
    if let Some((fourcc, body)) = aux {
        out.extend_from_slice(fourcc);
        out.extend_from_slice(body);
    }
    for &sample in samples {
        let mut b = [0u8; 2];
        LittleEndian::write_i16(&mut b, sample);
        out.extend_from_slice(&b);
    }
    out
}

/// Write settings whose sink closure also mirrors every accepted byte into
/// a caller-held buffer, so tests can inspect what actually went out.
fn observed_write_settings(observer: Rc<RefCell<Vec<u8>>>) -> InitSettings {
    InitSettings {
        on_write: Some(Box::new(move |user, data| {
            let taken = host_write(user, data);
            observer.borrow_mut().extend_from_slice(&data[..taken]);
            taken
        })),
        on_seek: Some(Box::new(host_seek)),
        user_data: Some(Box::new(HostBuffer::empty())),
        ..Default::default()
    }
}

#[test]
fn write_then_read_round_trip_through_closures() {
    // write four samples over two channels into a host-owned buffer
    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    let ok = wav
        .init_write(observed_write_settings(Rc::clone(&sink)), pcm16_format(2))
        .unwrap();
    assert!(ok);

    let written = wav.write_pcm_frames(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(written, Value::Unsigned(4));

    // the bytes the sink closure collected are a valid stream on their own
    let bytes = sink.borrow().clone();
    assert_eq!(bytes, encode(2, None, &[1, 2, 3, 4]));

    // decode them back through a fresh read session
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    let fmt = wav
        .init(read_settings(HostBuffer::new(bytes)))
        .unwrap()
        .unwrap();
    assert_eq!(fmt.channels, 2);
    assert_eq!(fmt.sample_rate, 44100);

    let frames = wav.read_pcm_frames_s16(2u64).unwrap();
    assert_eq!(frames, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn short_stream_returns_what_remains() {
    let bytes = encode(2, None, &[10, 20, 30, 40]);
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    wav.init(read_settings(HostBuffer::new(bytes))).unwrap();

    // five frames requested, only two exist
    let frames = wav.read_pcm_frames_s16(5u64).unwrap();
    assert_eq!(frames, vec![10.0, 20.0, 30.0, 40.0]);

    // stream is exhausted now
    let frames = wav.read_pcm_frames_s16(1u64).unwrap();
    assert!(frames.is_empty());
}

#[test]
fn malformed_input_is_not_an_error() {
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    let out = wav
        .init(read_settings(HostBuffer::new(b"RIFFxxxx".to_vec())))
        .unwrap();
    assert!(out.is_none());
}

#[test]
fn chunk_closure_sees_skipped_chunks_and_controls_consumption() {
    let bytes = encode(1, Some((b"smpl", &[9u8; 12])), &[7, 8]);
    let seen: Rc<RefCell<Vec<(ChunkId, u64)>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_in_closure = Rc::clone(&seen);

    let mut settings = read_settings(HostBuffer::new(bytes));
    settings.on_chunk = Some(Box::new(move |_, stream_user, header, container, fmt| {
        assert_eq!(container, Container::Riff);
        assert_eq!(fmt.channels, 1);
        // the read session's user data is visible from the chunk closure
        assert!(stream_user.unwrap().downcast_mut::<HostBuffer>().is_some());
        seen_in_closure
            .borrow_mut()
            .push((header.id, header.size_in_bytes));
        // consume nothing; the codec seeks past the chunk body itself
        Value::Unsigned(0)
    }));

    let mut wav = Wav::new(Box::new(WireCodec::default()));
    assert!(wav.init(settings).unwrap().is_some());
    assert_eq!(*seen.borrow(), vec![(ChunkId::FourCc(*b"smpl"), 12)]);

    // the seek past the unconsumed body landed at the sample data
    let frames = wav.read_pcm_frames_s16(2u64).unwrap();
    assert_eq!(frames, vec![7.0, 8.0]);
}

#[test]
fn sink_that_stops_accepting_yields_true_sample_count() {
    // room for the header plus three of the five frames
    let mut buf = HostBuffer::empty();
    buf.write_budget = Some(HEADER_LEN + 3 * 2 * 2);

    let mut wav = Wav::new(Box::new(WireCodec::default()));
    assert!(wav.init_write(write_settings(buf), pcm16_format(2)).unwrap());

    let written = wav
        .write_pcm_frames(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0])
        .unwrap();
    assert_eq!(written, Value::Unsigned(6));
}

#[test]
fn sequential_write_mode_needs_no_seek_closure() {
    let settings = InitSettings {
        on_write: Some(Box::new(host_write)),
        user_data: Some(Box::new(HostBuffer::empty())),
        total_frames: Some(Value::Unsigned(2)),
        ..Default::default()
    };
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    assert!(wav.init_write(settings, pcm16_format(1)).unwrap());
    let written = wav.write_pcm_frames(&[5.0, 6.0]).unwrap();
    assert_eq!(written, Value::Unsigned(2));
}

#[test]
fn doubles_are_truncated_toward_zero_on_write() {
    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut wav = Wav::new(Box::new(WireCodec::default()));
    assert!(
        wav.init_write(observed_write_settings(Rc::clone(&sink)), pcm16_format(1))
            .unwrap()
    );
    wav.write_pcm_frames(&[1.9, -1.9]).unwrap();
    assert_eq!(*sink.borrow(), encode(1, None, &[1, -1]));
}

#[test]
fn whole_stream_decode_shortcut() {
    let bytes = encode(2, None, &[1, 2, 3, 4, 5, 6]);
    let mut codec = WireCodec::default();
    let decoded = open_and_read_pcm_frames(
        &mut codec,
        SampleLayout::S16,
        read_settings(HostBuffer::new(bytes)),
    )
    .unwrap()
    .unwrap();
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.frame_count, 3);
    assert_eq!(decoded.samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}
