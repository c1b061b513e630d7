/// Where a muxer session is in its lifecycle
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    /// Streams are still being registered
    Created,

    /// Both the video and the audio stream are registered
    Configured,

    /// The container header went out, packets can be written
    HeaderWritten,

    /// At least one packet has been written
    Streaming,

    /// Writing the header failed.  The only valid operation left is `finalize()`.
    Faulted,

    /// Resources have been released, no further operations are valid
    Finalized,
}

impl SessionState {
    /// True once the container header has been written and packets are accepted
    pub fn accepts_packets(&self) -> bool {
        match *self {
            SessionState::HeaderWritten | SessionState::Streaming => true,
            _ => false,
        }
    }
}
