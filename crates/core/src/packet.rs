//! The packet: one sequence-tagged payload unit.
//!
//! Packets carry no behavior of their own. They are created by the record
//! reader, owned by the heap while buffered, and handed to the group writer
//! once drained. No validation happens at construction; negative and
//! duplicate sequence numbers are accepted and left to the resequencer.

/// A payload tagged with the sequence number that fixes its output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Ordering key; arrival order is unrelated to its value
    pub sequence_number: i64,

    /// Opaque payload, carried through unmodified
    pub payload: String,
}

impl Packet {
    /// Create a new packet.
    pub fn new(sequence_number: i64, payload: impl Into<String>) -> Self {
        Self {
            sequence_number,
            payload: payload.into(),
        }
    }

    /// Consume the packet and return its payload.
    pub fn into_payload(self) -> String {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_negative_sequence() {
        let packet = Packet::new(-3, "aa,bb");
        assert_eq!(packet.sequence_number, -3);
        assert_eq!(packet.payload, "aa,bb");
    }

    #[test]
    fn test_into_payload() {
        let packet = Packet::new(7, String::from("0a,ff"));
        assert_eq!(packet.into_payload(), "0a,ff");
    }
}
