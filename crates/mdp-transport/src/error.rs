/// Transport-level return codes (spec.md §6 transport contract, §7 error
/// kinds). Mirrors the reference tool's signed-`RsslRet` convention with
/// named variants instead of magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// `>= 0`: bytes remain queued internally; caller must flush before
    /// more writes will succeed.
    FlushPending,
    /// Write fully drained; nothing more to do.
    Success,
    /// Transport-transient: out of output buffers. Caller should request
    /// a flush and move on to the next item rather than retrying this one
    /// (spec.md §5 "Backpressure").
    NoBuffers,
    /// Transport-transient: call again after flushing.
    CallAgain,
    /// Transport-transient on an otherwise-active channel: treat as "must
    /// flush", not fatal (spec.md §4.G).
    FlushFailedButActive,
    /// Transport-fatal: caller must close the channel.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] mdp_wire::CodecError),
    #[error("channel closed: {0}")]
    Closed(String),
    #[error("pre-encoded message too large for buffer")]
    PreEncodedTooLarge,
    #[error("encode overflow guard exceeded")]
    EncodeOverflow,
    #[error("configuration error: {0}")]
    Config(String),
}
