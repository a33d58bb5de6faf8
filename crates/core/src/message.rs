use std::borrow::Cow;
use std::str::Utf8Error;

use bytes::Bytes;

use crate::topic::Topic;

/// A raw Pub/Sub delivery: the channel it was published on and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    channel: Bytes,
    body: Bytes,
}

impl Message {
    pub fn new(channel: impl Into<Bytes>, body: impl Into<Bytes>) -> Self {
        Self {
            channel: channel.into(),
            body: body.into(),
        }
    }

    pub fn channel(&self) -> &[u8] {
        &self.channel
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Return the channel name, replacing invalid UTF-8 sequences.
    pub fn channel_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.channel)
    }
}

/// Headers describing how a message reached its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeaders {
    /// The channel the message was published on.
    pub channel: Topic,
    /// The subscription topic that matched: the pattern for pattern
    /// deliveries, the channel otherwise.
    pub topic: Topic,
    /// The matching pattern, present only for pattern deliveries.
    pub pattern: Option<Topic>,
}

impl MessageHeaders {
    /// Build the headers for a delivery on `channel`, optionally through
    /// `pattern`.
    pub fn for_delivery(channel: &str, pattern: Option<&str>) -> Self {
        let channel = Topic::channel(channel);
        match pattern {
            Some(pattern) => {
                let pattern = Topic::pattern(pattern);
                Self {
                    channel,
                    topic: pattern.clone(),
                    pattern: Some(pattern),
                }
            }
            None => Self {
                topic: channel.clone(),
                channel,
                pattern: None,
            },
        }
    }
}

/// The payload and headers handed to a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    payload: Bytes,
    headers: MessageHeaders,
}

impl MessageEnvelope {
    pub fn new(payload: Bytes, headers: MessageHeaders) -> Self {
        Self { payload, headers }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Return the payload as UTF-8 text.
    pub fn payload_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.payload)
    }

    pub fn headers(&self) -> &MessageHeaders {
        &self.headers
    }
}
