//! Forwarding of unhandled-chunk notifications into a host closure.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::codec::{ChunkHeader, ChunkId, CodecChunkSink, Container, Fmt};
use crate::registry::{ChunkState, StreamState};

/// Implements the codec's custom-chunk callback over a chunk registration.
/// When the session also carries a stream registration, its user data is
/// surfaced to the closure alongside the chunk's own.
pub struct ChunkBridge {
    chunk: Rc<RefCell<ChunkState>>,
    stream: Option<Rc<RefCell<StreamState>>>,
}

impl ChunkBridge {
    pub(crate) fn new(
        chunk: Rc<RefCell<ChunkState>>,
        stream: Option<Rc<RefCell<StreamState>>>,
    ) -> Self {
        Self { chunk, stream }
    }
}

/// RIFF and RF64 chunks carry a four-byte code; W64 chunks a sixteen-byte
/// identifier. The header handed to the host always matches the container.
fn normalize_id(id: ChunkId, container: Container) -> ChunkId {
    match (container, id) {
        (Container::Riff | Container::Rf64, ChunkId::Guid(guid)) => {
            let mut fourcc = [0u8; 4];
            fourcc.copy_from_slice(&guid[..4]);
            ChunkId::FourCc(fourcc)
        }
        (Container::W64, ChunkId::FourCc(fourcc)) => {
            let mut guid = [0u8; 16];
            guid[..4].copy_from_slice(&fourcc);
            ChunkId::Guid(guid)
        }
        (_, id) => id,
    }
}

impl CodecChunkSink for ChunkBridge {
    fn on_chunk(&mut self, header: &ChunkHeader, container: Container, fmt: &Fmt) -> u64 {
        let host_header = ChunkHeader {
            id: normalize_id(header.id, container),
            size_in_bytes: header.size_in_bytes,
            padding_size: header.padding_size,
        };

        let mut chunk = self.chunk.borrow_mut();
        let ChunkState {
            on_chunk,
            user_data,
        } = &mut *chunk;

        let consumed = match &self.stream {
            Some(stream) => {
                let mut stream = stream.borrow_mut();
                on_chunk(
                    user_data.as_mut(),
                    Some(stream.user_data.as_mut()),
                    &host_header,
                    container,
                    fmt,
                )
            }
            None => on_chunk(user_data.as_mut(), None, &host_header, container, fmt),
        };

        consumed.to_u64().unwrap_or_else(|_| {
            warn!("chunk closure returned a negative consumed count, treating as 0");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CallbackRegistry, ChunkCallbacks, Direction, StreamCallbacks};
    use crate::value::Value;

    fn fmt_stub() -> Fmt {
        Fmt {
            format_tag: 1,
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            ..Default::default()
        }
    }

    #[test]
    fn fourcc_for_riff_and_rf64() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut registry = CallbackRegistry::new();
        registry
            .register_chunk(ChunkCallbacks {
                on_chunk: Some(Box::new(move |_, _, header, container, _| {
                    log.borrow_mut().push((header.id, container));
                    Value::Unsigned(0)
                })),
                chunk_user_data: None,
            })
            .unwrap();
        let mut bridge = ChunkBridge::new(registry.chunk_state().unwrap(), None);

        let header = ChunkHeader {
            id: ChunkId::FourCc(*b"smpl"),
            size_in_bytes: 60,
            padding_size: 0,
        };
        bridge.on_chunk(&header, Container::Riff, &fmt_stub());
        bridge.on_chunk(&header, Container::Rf64, &fmt_stub());

        let mut guid = [0u8; 16];
        guid[..4].copy_from_slice(b"smpl");
        let w64_header = ChunkHeader {
            id: ChunkId::Guid(guid),
            size_in_bytes: 60,
            padding_size: 0,
        };
        bridge.on_chunk(&w64_header, Container::W64, &fmt_stub());

        let seen = seen.borrow();
        assert_eq!(seen[0], (ChunkId::FourCc(*b"smpl"), Container::Riff));
        assert_eq!(seen[1], (ChunkId::FourCc(*b"smpl"), Container::Rf64));
        assert_eq!(seen[2], (ChunkId::Guid(guid), Container::W64));
    }

    #[test]
    fn consumed_count_round_trips_through_value() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_chunk(ChunkCallbacks {
                on_chunk: Some(Box::new(|_, _, header, _, _| {
                    // consume half the chunk, leave the rest to the codec
                    Value::Unsigned(header.size_in_bytes / 2)
                })),
                chunk_user_data: None,
            })
            .unwrap();
        let mut bridge = ChunkBridge::new(registry.chunk_state().unwrap(), None);
        let header = ChunkHeader {
            id: ChunkId::FourCc(*b"bext"),
            size_in_bytes: 602,
            padding_size: 0,
        };
        assert_eq!(bridge.on_chunk(&header, Container::Riff, &fmt_stub()), 301);
    }

    #[test]
    fn negative_consumed_count_treated_as_zero() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_chunk(ChunkCallbacks {
                on_chunk: Some(Box::new(|_, _, _, _, _| Value::Signed(-5))),
                chunk_user_data: None,
            })
            .unwrap();
        let mut bridge = ChunkBridge::new(registry.chunk_state().unwrap(), None);
        let header = ChunkHeader {
            id: ChunkId::FourCc(*b"bext"),
            size_in_bytes: 10,
            padding_size: 0,
        };
        assert_eq!(bridge.on_chunk(&header, Container::Riff, &fmt_stub()), 0);
    }

    #[test]
    fn stream_user_data_surfaced_to_closure() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_stream(
                StreamCallbacks {
                    on_read: Some(Box::new(|_, n| vec![0; n])),
                    on_seek: Some(Box::new(|_, _, _| true)),
                    user_data: Some(Box::new("stream-marker")),
                    ..Default::default()
                },
                Direction::Read,
            )
            .unwrap();
        registry
            .register_chunk(ChunkCallbacks {
                on_chunk: Some(Box::new(|chunk_user, stream_user, _, _, _| {
                    assert_eq!(*chunk_user.downcast_ref::<u8>().unwrap(), 9);
                    let marker = stream_user
                        .and_then(|s| s.downcast_ref::<&str>().copied())
                        .unwrap();
                    assert_eq!(marker, "stream-marker");
                    Value::Unsigned(1)
                })),
                chunk_user_data: Some(Box::new(9u8)),
            })
            .unwrap();

        let mut bridge = ChunkBridge::new(
            registry.chunk_state().unwrap(),
            registry.stream_state(),
        );
        let header = ChunkHeader {
            id: ChunkId::FourCc(*b"cue "),
            size_in_bytes: 4,
            padding_size: 0,
        };
        assert_eq!(bridge.on_chunk(&header, Container::Riff, &fmt_stub()), 1);
    }
}
