//! RLP encoding of [LogRecord]s.
//!
//! A log has two encodings:
//! - [RlpType::Network], `[address, [topic, ...], data]`, the consensus encoding of a receipt
//!   log. The status is never sent over the wire.
//! - [RlpType::Archive], `[address, [topic, ...], data, status]`, used to persist a log along
//!   with its locally derived [LogStatus].

use crate::{
    LogDecodeError, LogDecodeResult, LogRecord, LogStatus, LogTopic, rlp::decode_list_items,
};
use alloy_primitives::{Address, Bytes};
use alloy_rlp::{BufMut, Decodable, Encodable, Header, encode_list, list_length};

/// The encoding mode of a [LogRecord].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RlpType {
    /// The three-field wire encoding.
    Network,
    /// The four-field encoding carrying the status.
    Archive,
}

impl RlpType {
    /// Returns the number of fields in an envelope of this type.
    pub const fn field_count(self) -> usize {
        match self {
            Self::Network => 3,
            Self::Archive => 4,
        }
    }
}

impl LogRecord {
    fn rlp_payload_length(&self, rlp_type: RlpType) -> usize {
        let length = self.address().length()
            + list_length::<_, LogTopic>(self.topics())
            + self.data_ref().length();
        match rlp_type {
            RlpType::Network => length,
            RlpType::Archive => length + self.status().length(),
        }
    }

    /// Returns the length of the encoding of the given type.
    pub fn rlp_length(&self, rlp_type: RlpType) -> usize {
        let payload_length = self.rlp_payload_length(rlp_type);
        Header { list: true, payload_length }.length() + payload_length
    }

    /// Encodes the record into `out`.
    pub fn rlp_encode(&self, rlp_type: RlpType, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length(rlp_type) }.encode(out);
        self.address().encode(out);
        encode_list::<_, LogTopic>(self.topics(), out);
        self.data_ref().encode(out);
        if rlp_type == RlpType::Archive {
            self.status().encode(out);
        }
    }

    /// Encodes the record into a new buffer.
    pub fn rlp_bytes(&self, rlp_type: RlpType) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rlp_length(rlp_type));
        self.rlp_encode(rlp_type, &mut out);
        out
    }

    /// Decodes a record of the given type.
    ///
    /// A network record decodes with an [LogStatus::default] status and should be given its
    /// identifier with [LogRecord::initialize_status]. An archive record takes its identity
    /// from the decoded status.
    pub fn rlp_decode(buf: &mut &[u8], rlp_type: RlpType) -> LogDecodeResult<Self> {
        let items = decode_list_items(buf)?;
        if items.len() != rlp_type.field_count() {
            return Err(LogDecodeError::MalformedLog {
                expected: rlp_type.field_count(),
                actual: items.len(),
            });
        }

        let address = Address::decode(&mut &items[0][..])?;
        let topics = decode_list_items(&mut &items[1][..])?
            .into_iter()
            .map(|mut topic| LogTopic::decode(&mut topic))
            .collect::<LogDecodeResult<Vec<_>>>()?;
        let data = Bytes::decode(&mut &items[2][..])?;
        let status = match rlp_type {
            RlpType::Network => LogStatus::default(),
            RlpType::Archive => LogStatus::decode(&mut &items[3][..])?,
        };

        Ok(Self::from_parts(address, topics, data, status))
    }
}

impl Encodable for LogRecord {
    fn encode(&self, out: &mut dyn BufMut) {
        self.rlp_encode(RlpType::Network, out);
    }

    fn length(&self) -> usize {
        self.rlp_length(RlpType::Network)
    }
}

/// Decodes the network-encoded log list of a receipt, one result per log.
///
/// A malformed log does not abort the list: the caller receives its error and keeps every
/// well-formed log. Only a broken outer list fails the whole call.
pub fn decode_network_logs(buf: &mut &[u8]) -> LogDecodeResult<Vec<LogDecodeResult<LogRecord>>> {
    Ok(decode_list_items(buf)?
        .into_iter()
        .map(|mut item| LogRecord::rlp_decode(&mut item, RlpType::Network))
        .collect())
}
