//! JSON wire codec for notification batches.
//!
//! A batch is a JSON array of notification objects, all written by one
//! writer. Decoding is tolerant per entry: entries from a schema version we
//! do not understand, or naming an operation we do not know, are dropped so
//! newer writers cannot wedge older readers. Anything that is not an array
//! of well-formed objects fails the whole batch.

use crate::error::{CodecError, Result};
use crate::message::{NotificationMessage, NotificationOpType, SelfWriteMessage, NOTIFICATION_V2};
use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

fn to_wire<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Encode a batch of notifications.
pub fn encode(notifications: &[NotificationMessage]) -> Result<String> {
    to_wire(notifications)
}

/// Encode a self-write envelope.
pub fn encode_self_write(message: &SelfWriteMessage) -> Result<String> {
    to_wire(message)
}

/// Decode one batch, keeping batch order.
///
/// Each returned notification has `within_revision_index` set to its
/// position in the encoded array, counting dropped entries too.
pub fn decode_batch(batch: &str) -> Result<Vec<NotificationMessage>> {
    let entries: Vec<Value> =
        serde_json::from_str(batch).map_err(|e| CodecError::MalformedBatch(e.to_string()))?;

    let mut decoded = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let version = entry
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| CodecError::MalformedBatch(format!("entry {index} has no version")))?;
        if version != u64::from(NOTIFICATION_V2) {
            trace!(index, version, "skipping notification with unsupported version");
            continue;
        }

        let mut message: NotificationMessage = serde_json::from_value(entry)
            .map_err(|e| CodecError::MalformedBatch(format!("entry {index}: {e}")))?;
        if message.op_type == NotificationOpType::Unknown {
            warn!(
                index,
                revision = message.revision,
                filename = %message.filename,
                "skipping notification with unknown operation type"
            );
            continue;
        }
        message.within_revision_index = index;
        decoded.push(message);
    }
    Ok(decoded)
}
