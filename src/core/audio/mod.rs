//! Audio capture and container packaging.

pub mod reassembler;
pub mod wav;

pub use reassembler::AudioReassembler;
pub use wav::{AudioFormat, f32_to_pcm16, pcm_to_wav};
