//! Ownership of host-supplied callback sets.
//!
//! One binding instance holds at most one stream registration and one chunk
//! registration at a time. Registering into an occupied slot releases the
//! previous occupant first, and release is idempotent: stale or unknown ids
//! are no-ops. The live state is shared with the bridges through
//! `Rc<RefCell<..>>`; everything here is single-threaded and synchronous.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::BridgeError;
use crate::codec::{ChunkHeader, Container, Fmt, SeekOrigin};
use crate::value::Value;

/// Host read closure: (user data, bytes requested) -> bytes produced. A
/// result shorter than requested means end of input.
pub type ReadFn = Box<dyn FnMut(&mut dyn Any, usize) -> Vec<u8>>;

/// Host seek closure: (user data, offset, origin) -> success.
pub type SeekFn = Box<dyn FnMut(&mut dyn Any, i64, SeekOrigin) -> bool>;

/// Host write closure: (user data, bytes) -> bytes accepted.
pub type WriteFn = Box<dyn FnMut(&mut dyn Any, &[u8]) -> usize>;

/// Host chunk closure: (chunk user data, stream user data if a stream
/// registration is active, header, container, format) -> bytes consumed.
pub type ChunkFn =
    Box<dyn FnMut(&mut dyn Any, Option<&mut dyn Any>, &ChunkHeader, Container, &Fmt) -> Value>;

/// Which closures a stream registration must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Random-access reading: on_read and on_seek required.
    Read,
    /// Sequential writing (total count known up front): on_write required.
    SequentialWrite,
    /// Random-access writing: on_write and on_seek required.
    RandomWrite,
}

/// Closure set offered for a stream registration.
#[derive(Default)]
pub struct StreamCallbacks {
    pub on_read: Option<ReadFn>,
    pub on_seek: Option<SeekFn>,
    pub on_write: Option<WriteFn>,
    pub user_data: Option<Box<dyn Any>>,
}

/// Closure set offered for a chunk registration.
#[derive(Default)]
pub struct ChunkCallbacks {
    pub on_chunk: Option<ChunkFn>,
    pub chunk_user_data: Option<Box<dyn Any>>,
}

pub(crate) struct StreamState {
    pub on_read: Option<ReadFn>,
    pub on_seek: Option<SeekFn>,
    pub on_write: Option<WriteFn>,
    pub user_data: Box<dyn Any>,
}

pub(crate) struct ChunkState {
    pub on_chunk: ChunkFn,
    pub user_data: Box<dyn Any>,
}

/// Opaque handle to a live registration. Ids are never reused within one
/// registry, so a stale handle can only ever hit a no-op release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationId(u64);

/// Owns the closure sets for one open stream.
#[derive(Default)]
pub struct CallbackRegistry {
    stream: Option<(RegistrationId, Rc<RefCell<StreamState>>)>,
    chunk: Option<(RegistrationId, Rc<RefCell<ChunkState>>)>,
    next_id: u64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> RegistrationId {
        self.next_id += 1;
        RegistrationId(self.next_id)
    }

    /// Validate and store a stream closure set. An existing stream
    /// registration is released first.
    pub fn register_stream(
        &mut self,
        callbacks: StreamCallbacks,
        direction: Direction,
    ) -> Result<RegistrationId, BridgeError> {
        match direction {
            Direction::Read => {
                if callbacks.on_read.is_none() {
                    return Err(BridgeError::MissingCallback("onRead"));
                }
                if callbacks.on_seek.is_none() {
                    return Err(BridgeError::MissingCallback("onSeek"));
                }
            }
            Direction::SequentialWrite => {
                if callbacks.on_write.is_none() {
                    return Err(BridgeError::MissingCallback("onWrite"));
                }
            }
            Direction::RandomWrite => {
                if callbacks.on_write.is_none() {
                    return Err(BridgeError::MissingCallback("onWrite"));
                }
                if callbacks.on_seek.is_none() {
                    return Err(BridgeError::MissingCallback("onSeek"));
                }
            }
        }

        if let Some((old, _)) = self.stream.take() {
            debug!("releasing stream registration {:?} before re-register", old);
        }

        let id = self.fresh_id();
        let state = StreamState {
            on_read: callbacks.on_read,
            on_seek: callbacks.on_seek,
            on_write: callbacks.on_write,
            user_data: callbacks.user_data.unwrap_or_else(|| Box::new(())),
        };
        self.stream = Some((id, Rc::new(RefCell::new(state))));
        Ok(id)
    }

    /// Validate and store a chunk closure set, releasing any prior one.
    pub fn register_chunk(
        &mut self,
        callbacks: ChunkCallbacks,
    ) -> Result<RegistrationId, BridgeError> {
        let on_chunk = callbacks
            .on_chunk
            .ok_or(BridgeError::MissingCallback("onChunk"))?;

        if let Some((old, _)) = self.chunk.take() {
            debug!("releasing chunk registration {:?} before re-register", old);
        }

        let id = self.fresh_id();
        let state = ChunkState {
            on_chunk,
            user_data: callbacks.chunk_user_data.unwrap_or_else(|| Box::new(())),
        };
        self.chunk = Some((id, Rc::new(RefCell::new(state))));
        Ok(id)
    }

    /// Drop the registration behind `id`, unreferencing its closures. Safe
    /// to call with an already-released or never-issued id.
    pub fn release(&mut self, id: RegistrationId) {
        if self.stream.as_ref().is_some_and(|(sid, _)| *sid == id) {
            self.stream = None;
            debug!("released stream registration {:?}", id);
        } else if self.chunk.as_ref().is_some_and(|(cid, _)| *cid == id) {
            self.chunk = None;
            debug!("released chunk registration {:?}", id);
        }
    }

    /// Drop both slots. Used on teardown and re-initialization.
    pub fn release_all(&mut self) {
        self.stream = None;
        self.chunk = None;
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn has_chunk(&self) -> bool {
        self.chunk.is_some()
    }

    pub(crate) fn stream_state(&self) -> Option<Rc<RefCell<StreamState>>> {
        self.stream.as_ref().map(|(_, state)| Rc::clone(state))
    }

    pub(crate) fn chunk_state(&self) -> Option<Rc<RefCell<ChunkState>>> {
        self.chunk.as_ref().map(|(_, state)| Rc::clone(state))
    }
}
