//! Config packet merging.
//!
//! Video decoders need the codec config (SPS/PPS) attached to the media
//! packet that depends on it. The merger keeps a copy of the last config
//! packet and prepends it to the next media packet, once.

use crate::packet::Packet;

#[derive(Debug, Default)]
pub struct PacketMerger {
    config: Option<Vec<u8>>,
}

impl PacketMerger {
    pub fn new() -> PacketMerger {
        PacketMerger { config: None }
    }

    /// Merge in place. A config packet is stored (replacing any previous
    /// one); a media packet grows by the pending config, which is cleared.
    pub fn merge(&mut self, packet: &mut Packet) {
        if packet.is_config() {
            self.config = Some(packet.data.clone());
        } else if let Some(config) = self.config.take() {
            let media = std::mem::replace(&mut packet.data, config);
            packet.data.extend_from_slice(&media);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_prepends_once() {
        let mut merger = PacketMerger::new();

        let mut config = Packet::config(vec![0x00, 0x01, 0x02, 0x03]);
        merger.merge(&mut config);
        // The config packet itself is left as-is.
        assert_eq!(config.data, [0x00, 0x01, 0x02, 0x03]);

        let mut media = Packet::media(vec![0x10, 0x11], 0);
        merger.merge(&mut media);
        assert_eq!(media.data, [0x00, 0x01, 0x02, 0x03, 0x10, 0x11]);

        // Idempotence: the next media packet passes through unchanged.
        let mut next = Packet::media(vec![0x20], 1);
        merger.merge(&mut next);
        assert_eq!(next.data, [0x20]);
    }

    #[test]
    fn newer_config_replaces_pending_one() {
        let mut merger = PacketMerger::new();
        merger.merge(&mut Packet::config(vec![0xAA]));
        merger.merge(&mut Packet::config(vec![0xBB]));
        let mut media = Packet::media(vec![0x01], 0);
        merger.merge(&mut media);
        assert_eq!(media.data, [0xBB, 0x01]);
    }

    #[test]
    fn media_without_config_passes_through() {
        let mut merger = PacketMerger::new();
        let mut media = Packet::media(vec![0x42], 7);
        merger.merge(&mut media);
        assert_eq!(media.data, [0x42]);
    }
}
