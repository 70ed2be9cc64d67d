//! The log status state machine.
//!
//! A log is observed with an identifier, `{transaction hash, receipt index}`, that stays fixed
//! for its whole life, while its [LogState] moves from pending to included or errored as the
//! chain view changes. Only the identifier feeds the identity hash, so the same log keeps the
//! same identity when a reorg moves it to a different block.

use crate::{LogDecodeError, LogDecodeResult, rlp::decode_list_items};
use alloy_primitives::{B256, keccak256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header, RlpDecodable, RlpEncodable};

/// The maximum length, in bytes, of the reason attached to an errored status.
///
/// Sized to the included payload (a block hash and a block number).
pub const MAX_ERRORED_REASON_LENGTH: usize = 32 + 8;

/// The pair uniquely labelling a log occurrence.
///
/// One transaction may emit several logs, even byte-identical ones, so the transaction hash
/// alone does not identify a log. Log emission order within a receipt is deterministic, which
/// makes the receipt index a stable disambiguator.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, RlpEncodable, RlpDecodable,
)]
pub struct LogIdentifier {
    /// The hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// The position of the log within the transaction receipt.
    pub receipt_index: u64,
}

impl LogIdentifier {
    /// Creates a new [LogIdentifier].
    pub const fn new(transaction_hash: B256, receipt_index: u64) -> Self {
        Self { transaction_hash, receipt_index }
    }

    /// Returns the identity hash: the [keccak256] of the RLP-encoded identifier.
    pub fn identity_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(self.length());
        self.encode(&mut buf);
        keccak256(&buf)
    }
}

/// The tag of a [LogState], as carried in the status encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LogStatusType {
    /// The log has not been associated with a transaction yet.
    #[default]
    Unknown = 0,
    /// The log was observed but is not confirmed in any block.
    Pending = 1,
    /// The log is confirmed in a block.
    Included = 2,
    /// The log was invalidated.
    Errored = 3,
}

impl TryFrom<u64> for LogStatusType {
    type Error = LogDecodeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Pending),
            2 => Ok(Self::Included),
            3 => Ok(Self::Errored),
            _ => Err(LogDecodeError::MalformedStatus("unrecognized status type")),
        }
    }
}

/// The inclusion state of a log.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub enum LogState {
    /// No inclusion information.
    #[default]
    Unknown,
    /// Observed but not yet confirmed in any block.
    Pending,
    /// Confirmed in a specific block.
    Included {
        /// The hash of the including block.
        block_hash: B256,
        /// The number of the including block.
        block_number: u64,
    },
    /// Invalidated, e.g. because the originating transaction was dropped.
    Errored {
        /// Why the log was invalidated, at most [MAX_ERRORED_REASON_LENGTH] bytes.
        reason: String,
    },
}

impl LogState {
    /// Returns the [LogStatusType] tag of the state.
    pub const fn status_type(&self) -> LogStatusType {
        match self {
            Self::Unknown => LogStatusType::Unknown,
            Self::Pending => LogStatusType::Pending,
            Self::Included { .. } => LogStatusType::Included,
            Self::Errored { .. } => LogStatusType::Errored,
        }
    }
}

/// The status of a log: its fixed [LogIdentifier] and its current [LogState].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct LogStatus {
    identifier: LogIdentifier,
    state: LogState,
}

impl LogStatus {
    /// Creates a status of the given type. Variant fields default to the zero hash, block zero
    /// and an empty reason.
    pub fn new(status_type: LogStatusType, transaction_hash: B256, receipt_index: u64) -> Self {
        let state = match status_type {
            LogStatusType::Unknown => LogState::Unknown,
            LogStatusType::Pending => LogState::Pending,
            LogStatusType::Included => {
                LogState::Included { block_hash: B256::ZERO, block_number: 0 }
            }
            LogStatusType::Errored => LogState::Errored { reason: String::new() },
        };
        Self { identifier: LogIdentifier::new(transaction_hash, receipt_index), state }
    }

    /// Creates a [LogState::Pending] status.
    pub const fn pending(identifier: LogIdentifier) -> Self {
        Self { identifier, state: LogState::Pending }
    }

    /// Creates a [LogState::Included] status.
    pub const fn included(identifier: LogIdentifier, block_hash: B256, block_number: u64) -> Self {
        Self { identifier, state: LogState::Included { block_hash, block_number } }
    }

    /// Creates a [LogState::Errored] status. The reason is truncated to
    /// [MAX_ERRORED_REASON_LENGTH] bytes on a character boundary.
    pub fn errored(identifier: LogIdentifier, reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        if reason.len() > MAX_ERRORED_REASON_LENGTH {
            let mut end = MAX_ERRORED_REASON_LENGTH;
            while !reason.is_char_boundary(end) {
                end -= 1;
            }
            reason.truncate(end);
        }
        Self { identifier, state: LogState::Errored { reason } }
    }

    /// Returns the [LogIdentifier].
    pub const fn identifier(&self) -> &LogIdentifier {
        &self.identifier
    }

    /// Returns the current [LogState].
    pub const fn state(&self) -> &LogState {
        &self.state
    }

    /// Returns the [LogStatusType] tag of the current state.
    pub const fn status_type(&self) -> LogStatusType {
        self.state.status_type()
    }

    /// Returns the identity hash, a function of the identifier only.
    pub fn identity_hash(&self) -> B256 {
        self.identifier.identity_hash()
    }

    /// Returns the including block hash and number, or [None] if the log is not included.
    pub const fn extract_included(&self) -> Option<(B256, u64)> {
        match &self.state {
            LogState::Included { block_hash, block_number } => Some((*block_hash, *block_number)),
            _ => None,
        }
    }

    fn rlp_payload_length(&self) -> usize {
        (self.status_type() as u64).length() +
            self.identifier.transaction_hash.length() +
            self.identifier.receipt_index.length() +
            self.state_payload_length()
    }

    fn state_payload_length(&self) -> usize {
        match &self.state {
            LogState::Unknown | LogState::Pending => "".length(),
            LogState::Included { block_hash, block_number } => {
                let payload_length = block_hash.length() + block_number.length();
                Header { list: true, payload_length }.length() + payload_length
            }
            LogState::Errored { reason } => reason.as_str().length(),
        }
    }

    /// Decodes a status from its four-field envelope
    /// `[type, transaction_hash, receipt_index, payload]`.
    pub fn decode(buf: &mut &[u8]) -> LogDecodeResult<Self> {
        let items = decode_list_items(buf)?;
        let &[status_type, transaction_hash, receipt_index, payload] = items.as_slice() else {
            return Err(LogDecodeError::MalformedStatus("status must carry 4 fields"));
        };

        let status_type = LogStatusType::try_from(u64::decode(&mut &status_type[..])?)?;
        let identifier = LogIdentifier::new(
            B256::decode(&mut &transaction_hash[..])?,
            u64::decode(&mut &receipt_index[..])?,
        );

        let state = match status_type {
            LogStatusType::Unknown => LogState::Unknown,
            LogStatusType::Pending => LogState::Pending,
            LogStatusType::Included => {
                let mut payload = payload;
                let fields = decode_list_items(&mut payload).map_err(|_| {
                    LogDecodeError::MalformedStatus("included payload must be a list")
                })?;
                let &[block_hash, block_number] = fields.as_slice() else {
                    return Err(LogDecodeError::MalformedStatus(
                        "included payload must carry 2 fields",
                    ));
                };
                LogState::Included {
                    block_hash: B256::decode(&mut &block_hash[..])?,
                    block_number: u64::decode(&mut &block_number[..])?,
                }
            }
            LogStatusType::Errored => {
                let mut payload = payload;
                let reason = Header::decode_bytes(&mut payload, false).map_err(|_| {
                    LogDecodeError::MalformedStatus("errored payload must be a string")
                })?;
                if reason.len() > MAX_ERRORED_REASON_LENGTH {
                    return Err(LogDecodeError::MalformedStatus("errored reason is too long"));
                }
                let reason = core::str::from_utf8(reason).map_err(|_| {
                    LogDecodeError::MalformedStatus("errored reason must be utf-8")
                })?;
                LogState::Errored { reason: reason.to_owned() }
            }
        };

        Ok(Self { identifier, state })
    }
}

impl Encodable for LogStatus {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        (self.status_type() as u64).encode(out);
        self.identifier.transaction_hash.encode(out);
        self.identifier.receipt_index.encode(out);

        match &self.state {
            LogState::Unknown | LogState::Pending => "".encode(out),
            LogState::Included { block_hash, block_number } => {
                let payload_length = block_hash.length() + block_number.length();
                Header { list: true, payload_length }.encode(out);
                block_hash.encode(out);
                block_number.encode(out);
            }
            LogState::Errored { reason } => reason.as_str().encode(out),
        }
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        Header { list: true, payload_length }.length() + payload_length
    }
}
