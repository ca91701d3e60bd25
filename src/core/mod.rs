pub mod audio;
pub mod relay;
pub mod tts;

pub use audio::{AudioFormat, AudioReassembler, pcm_to_wav};

pub use relay::{
    ChannelDownstream, DownstreamTransport, RelayConfig, RelayControl, RelayFrame, RelayPayload,
    RelaySink, SentenceInfo,
};

pub use tts::{
    SeedTts, SeedTtsConfig, TTSError, TTSResult, create_tts_provider, get_tts_provider_urls,
};
