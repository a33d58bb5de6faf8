use redbind_core::Message;

/// Receives messages delivered by a listener container.
///
/// `pattern` carries the matching pattern when the message arrived through a
/// pattern subscription.
pub trait MessageListener: Send + Sync {
    fn on_message(&self, message: &Message, pattern: Option<&[u8]>);
}
