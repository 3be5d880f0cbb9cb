//! JSON encoding for outbound messages

use dispatch_domain::constants::DEAD_LETTER_TOPIC;
use dispatch_domain::{DeadLetterRecord, OutboundBatch, Result, SerializedMessage};
use serde::Serialize;

/// Encode each payload as JSON text, preserving caller order
pub fn encode_batch<T: Serialize>(topic: &str, messages: &[T]) -> Result<OutboundBatch> {
    let encoded = messages
        .iter()
        .map(|message| serde_json::to_string(message).map(SerializedMessage::new))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(OutboundBatch::new(topic, encoded))
}

/// Single-message batch carrying `record` to the dead-letter topic
pub fn encode_dead_letter(record: &DeadLetterRecord) -> Result<OutboundBatch> {
    encode_batch(DEAD_LETTER_TOPIC, std::slice::from_ref(record))
}
