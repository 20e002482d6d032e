//! Incremental decoding of a byte stream carrying back-to-back messages.

use std::collections::VecDeque;

use graphpack_buffers::{BufferError, StreamingReader};

use crate::config::CodecConfig;
use crate::decoder::GraphDecoder;
use crate::error::{GraphError, Result};
use crate::registry::ModelRegistry;
use crate::value::ValueTree;

/// Buffers received bytes and decodes every complete message.
///
/// A message split across several chunks is retried when more bytes
/// arrive. Any other decode error is fatal for the stream; call
/// [`StreamDecoder::reset`] before reusing it.
#[derive(Default)]
pub struct StreamDecoder {
    decoder: GraphDecoder,
    input: StreamingReader,
    ready: VecDeque<ValueTree>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            decoder: GraphDecoder::with_config(config),
            input: StreamingReader::with_alloc_size(config.alloc_size),
            ready: VecDeque::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.decoder.registry
    }

    /// Bytes received but not yet part of a decoded message.
    pub fn pending(&self) -> usize {
        self.input.size()
    }

    /// Appends `bytes[offset..offset + length]` and decodes what it can.
    ///
    /// Returns the number of bytes taken up by the messages completed during
    /// this call.
    pub fn on_bytes_received(&mut self, bytes: &[u8], offset: usize, length: usize) -> Result<usize> {
        let chunk = offset
            .checked_add(length)
            .and_then(|end| bytes.get(offset..end))
            .ok_or(GraphError::Buffer(BufferError::InvalidRange))?;
        self.input.push(chunk);
        let mut consumed = 0;
        while self.input.size() > 0 {
            let mut reader = self.input.reader();
            let start = reader.x;
            match self.decoder.read_object(&mut reader) {
                Ok(tree) => {
                    let used = reader.x - start;
                    self.input.skip(used)?;
                    self.input.consume();
                    consumed += used;
                    self.ready.push_back(tree);
                }
                Err(err) if err.is_end_of_buffer() => break,
                Err(err) => return Err(err),
            }
        }
        if consumed > 0 {
            tracing::trace!(consumed, pending = self.input.size(), "stream.decoded");
        }
        Ok(consumed)
    }

    /// Oldest decoded message not yet taken.
    pub fn pop(&mut self) -> Option<ValueTree> {
        self.ready.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ValueTree> + '_ {
        self.ready.drain(..)
    }

    /// Drops buffered input, queued messages and all learned models.
    pub fn reset(&mut self) {
        self.input.reset(&[]);
        self.ready.clear();
        self.decoder.reset();
    }
}
