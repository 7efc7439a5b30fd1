pub use crate::*;
pub use anyhow::{Result as R, anyhow};

pub use crate::codec::{CodecChunkSink, CodecStream, Container, DataFormat, Fmt, SeekOrigin};
pub use crate::value::{Operand, Value, ValueError};
