//! Wire message types
//!
//! One message per UDP datagram. Every message carries a fixed address and a
//! fixed argument signature; anything else on the wire is an unknown message
//! and gets dropped by the codec.

/// Messages exchanged over the remote link.
///
/// Initiator to peer: everything except `Resp`. Peer to initiator: `Resp`
/// only. `Hello` and `Load` (and `Screenshot`, when the peer supports it)
/// are answered exactly once per valid receipt with a `Resp`; no reply is
/// ever awaited by the sender.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    /// Handshake request; answered with a features reply then a hello reply
    Hello,

    /// Push a host-exposed parameter value to the peer
    HostParam { param_id: i32, value: f32 },

    /// Push a full patch snapshot (archive or raw description blob)
    Load { blob: Vec<u8> },

    /// Push one module parameter value
    Param {
        module_id: i64,
        param_id: i32,
        value: f32,
    },

    /// Forward a screenshot of the patch view (PNG bytes)
    Screenshot { image: Vec<u8> },

    /// Peer reply; terminal, never answered
    Resp { kind: String, payload: String },
}

impl WireMessage {
    /// Wire address of this message
    pub fn address(&self) -> &'static str {
        match self {
            Self::Hello => "/hello",
            Self::HostParam { .. } => "/host-param",
            Self::Load { .. } => "/load",
            Self::Param { .. } => "/param",
            Self::Screenshot { .. } => "/screenshot",
            Self::Resp { .. } => "/resp",
        }
    }

    /// Argument type tags of this message
    pub fn type_tags(&self) -> &'static str {
        match self {
            Self::Hello => "",
            Self::HostParam { .. } => "if",
            Self::Load { .. } => "b",
            Self::Param { .. } => "hif",
            Self::Screenshot { .. } => "b",
            Self::Resp { .. } => "ss",
        }
    }

    /// Build a reply message
    pub fn resp(kind: ReplyKind, payload: impl Into<String>) -> Self {
        Self::Resp {
            kind: kind.as_str().into(),
            payload: payload.into(),
        }
    }

    /// Build an ok/fail status reply
    pub fn status_resp(kind: ReplyKind, ok: bool) -> Self {
        let status = if ok { ReplyStatus::Ok } else { ReplyStatus::Fail };
        Self::resp(kind, status.as_str())
    }
}

/// What a `/resp` message is replying to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Hello,
    Features,
    Load,
    Screenshot,
}

impl ReplyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Features => "features",
            Self::Load => "load",
            Self::Screenshot => "screenshot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hello" => Some(Self::Hello),
            "features" => Some(Self::Features),
            "load" => Some(Self::Load),
            "screenshot" => Some(Self::Screenshot),
            _ => None,
        }
    }
}

/// Reply status payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Fail,
}

impl ReplyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Fail => "fail",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Peer-advertised optional features, learned once at hello time.
///
/// Encoded on the wire as a colon-delimited token string, e.g.
/// `":screenshot:"`, or the empty string when the peer supports nothing
/// optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub screenshot: bool,
}

impl Capabilities {
    pub const SCREENSHOT_TOKEN: &'static str = "screenshot";

    /// Parse the wire token string
    pub fn from_tokens(s: &str) -> Self {
        let mut caps = Self::default();
        for token in s.split(':').filter(|t| !t.is_empty()) {
            if token == Self::SCREENSHOT_TOKEN {
                caps.screenshot = true;
            }
            // Unknown tokens come from newer peers; ignore them.
        }
        caps
    }

    /// Encode as the wire token string
    pub fn to_tokens(self) -> String {
        if self.screenshot {
            format!(":{}:", Self::SCREENSHOT_TOKEN)
        } else {
            String::new()
        }
    }
}
