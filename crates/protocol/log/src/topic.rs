//! Log topics and the bloom topic matcher.

use crate::{LogDecodeError, LogDecodeResult};
use alloy_primitives::{Address, B256, Bloom, BloomInput, hex};
use alloy_rlp::{BufMut, Encodable, Header};
use core::fmt;
use derive_more::{AsRef, Deref, From};

/// The encoded length of a topic.
const TOPIC_LENGTH: usize = 32;

/// The number of leading zero bytes in a topic that embeds an [Address].
const ADDRESS_PADDING: usize = TOPIC_LENGTH - 20;

/// A 32-byte log topic.
///
/// Topics are either event signature hashes, indexed event arguments, or addresses embedded
/// right-aligned with twelve leading zero bytes (see [LogTopic::from_address]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Deref, AsRef)]
pub struct LogTopic(pub B256);

impl LogTopic {
    /// The empty topic, returned in place of topics that do not exist.
    pub const EMPTY: Self = Self(B256::ZERO);

    /// Embeds an [Address] into a topic: 12 zero bytes followed by the 20 address bytes.
    pub fn from_address(address: Address) -> Self {
        Self(address.into_word())
    }

    /// Returns the lower 20 bytes of the topic as an [Address].
    ///
    /// This does not check that the topic actually embeds an address; see
    /// [LogTopic::matches_address].
    pub fn as_address(&self) -> Address {
        Address::from_word(self.0)
    }

    /// Projects the topic into a [Bloom] filter.
    pub fn bloom_filter(&self) -> Bloom {
        let mut bloom = Bloom::ZERO;
        bloom.accrue(BloomInput::Raw(self.0.as_slice()));
        bloom
    }

    /// Projects an [Address] into a [Bloom] filter by way of its topic embedding.
    pub fn bloom_filter_for_address(address: Address) -> Bloom {
        Self::from_address(address).bloom_filter()
    }

    /// Returns `true` iff the topic embeds exactly `address`: the upper 12 bytes are zero and
    /// the lower 20 bytes equal the address.
    ///
    /// Unlike a [Bloom] lookup this test is exact.
    pub fn matches_address(&self, address: &Address) -> bool {
        let (padding, suffix) = self.0.split_at(ADDRESS_PADDING);
        padding.iter().all(|byte| *byte == 0) && suffix == address.as_slice()
    }

    /// Decodes a topic from its RLP string encoding, requiring exactly 32 bytes.
    pub fn decode(buf: &mut &[u8]) -> LogDecodeResult<Self> {
        let header = Header::decode(buf)?;
        if header.list {
            return Err(alloy_rlp::Error::UnexpectedList.into());
        }
        if header.payload_length != TOPIC_LENGTH {
            return Err(LogDecodeError::MalformedTopic { length: header.payload_length });
        }
        if buf.len() < TOPIC_LENGTH {
            return Err(alloy_rlp::Error::InputTooShort.into());
        }

        let topic = B256::from_slice(&buf[..TOPIC_LENGTH]);
        *buf = &buf[TOPIC_LENGTH..];
        Ok(Self(topic))
    }
}

impl From<Address> for LogTopic {
    fn from(address: Address) -> Self {
        Self::from_address(address)
    }
}

impl fmt::Display for LogTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0))
    }
}

impl Encodable for LogTopic {
    fn encode(&self, out: &mut dyn BufMut) {
        self.0.encode(out);
    }

    fn length(&self) -> usize {
        self.0.length()
    }
}
