//! Live relay of synthesized audio to a downstream consumer.

pub mod messages;
pub mod sink;

pub use messages::{RelayControl, RelayFrame, RelayPayload, SentenceMarker};
pub use sink::{
    ChannelDownstream, DEFAULT_CHUNK_SIZE, DownstreamTransport, RelayConfig, RelaySink,
    SentenceInfo, SentenceRelay,
};
