//! Forwarding of codec byte I/O into host closures.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::codec::{CodecStream, SeekOrigin};
use crate::registry::StreamState;

/// Implements the codec's read/seek/write contract over a registered
/// closure set. The codec owns one of these for the duration of a session;
/// the registry keeps the other reference so a chunk bridge can surface the
/// same user data.
pub struct StreamBridge {
    state: Rc<RefCell<StreamState>>,
}

impl StreamBridge {
    pub(crate) fn new(state: Rc<RefCell<StreamState>>) -> Self {
        Self { state }
    }
}

impl CodecStream for StreamBridge {
    fn read(&mut self, out: &mut [u8]) -> usize {
        let mut state = self.state.borrow_mut();
        let StreamState {
            on_read, user_data, ..
        } = &mut *state;
        let Some(on_read) = on_read else {
            return 0;
        };
        let data = on_read(user_data.as_mut(), out.len());
        // never trust the closure to honour the requested size
        let n = data.len().min(out.len());
        out[..n].copy_from_slice(&data[..n]);
        trace!("read: requested {} got {}", out.len(), n);
        n
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> bool {
        let mut state = self.state.borrow_mut();
        let StreamState {
            on_seek, user_data, ..
        } = &mut *state;
        let Some(on_seek) = on_seek else {
            return false;
        };
        // origin goes through untouched
        let ok = on_seek(user_data.as_mut(), offset, origin);
        trace!("seek: offset {} origin {:?} -> {}", offset, origin, ok);
        ok
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let mut state = self.state.borrow_mut();
        let StreamState {
            on_write, user_data, ..
        } = &mut *state;
        let Some(on_write) = on_write else {
            return 0;
        };
        let written = on_write(user_data.as_mut(), data);
        trace!("write: offered {} accepted {}", data.len(), written);
        written
    }
}
