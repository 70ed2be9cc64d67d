//! The [LogRecord] entity.

use crate::{LogDecodeResult, LogIdentifier, LogStatus, LogStatusType, LogTopic, RlpType};
use alloy_primitives::{Address, B256, Bloom, BloomInput, Bytes, Log};
use core::{
    borrow::Borrow,
    hash::{Hash, Hasher},
};
use tracing::error;

/// An Ethereum log as tracked by the wallet manager.
///
/// A log entry is the emitting contract's address, an ordered series of 32-byte topics and some
/// bytes of data, plus the locally derived [LogStatus].
///
/// Equality and hashing are defined solely over the identity hash, a function of the log's
/// [LogIdentifier]. Two records for the same log in different chain views (say, included in one
/// block, then pending again after a reorg) compare equal, so an identity-keyed collection
/// treats the second as an update of the first rather than a new log.
///
/// The identity hash must not change once the record is in such a collection: call
/// [LogRecord::initialize_status] before inserting, and only ever [LogRecord::set_status] with
/// a status carrying the same identifier.
#[derive(Debug, Clone)]
pub struct LogRecord {
    identity_hash: B256,
    address: Address,
    topics: Vec<LogTopic>,
    data: Bytes,
    status: LogStatus,
}

impl LogRecord {
    /// Creates a new [LogRecord] with an [LogStatusType::Unknown] status.
    pub fn new(address: Address, topics: Vec<LogTopic>, data: impl Into<Bytes>) -> Self {
        Self::from_parts(address, topics, data.into(), LogStatus::default())
    }

    pub(crate) fn from_parts(
        address: Address,
        topics: Vec<LogTopic>,
        data: Bytes,
        status: LogStatus,
    ) -> Self {
        Self { identity_hash: status.identity_hash(), address, topics, data, status }
    }

    /// Sets a [LogStatusType::Pending] status for the given identifier and recomputes the
    /// identity hash.
    ///
    /// Call this once, when the log is first observed and before it is inserted into any
    /// identity-keyed collection.
    pub fn initialize_status(&mut self, transaction_hash: B256, receipt_index: u64) {
        let identifier = LogIdentifier::new(transaction_hash, receipt_index);
        if self.status.status_type() != LogStatusType::Unknown {
            self.check_identifier(&identifier);
        }

        self.status = LogStatus::pending(identifier);
        self.identity_hash = self.status.identity_hash();
    }

    /// Returns the [LogStatus].
    pub const fn status(&self) -> &LogStatus {
        &self.status
    }

    /// Overwrites the [LogStatus].
    ///
    /// No transition rules are enforced here; deciding whether a log may move from, say,
    /// included back to pending needs chain context that belongs to the caller. The new status
    /// must carry the log's current identifier.
    pub fn set_status(&mut self, status: LogStatus) {
        self.check_identifier(status.identifier());
        self.status = status;
    }

    fn check_identifier(&self, identifier: &LogIdentifier) {
        let consistent = self.status.identifier() == identifier;
        if !consistent {
            error!(
                target: "ewm::log",
                identity = %self.identity_hash,
                current = ?self.status.identifier(),
                requested = ?identifier,
                "Attempted to change the identifier of an initialized log"
            );
        }
        debug_assert!(consistent, "the identifier of an initialized log must not change");
    }

    /// Returns the identity hash.
    pub const fn identity_hash(&self) -> B256 {
        self.identity_hash
    }

    /// Returns the address of the emitting contract.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns `true` if the log was emitted by `address`.
    pub fn has_address(&self, address: &Address) -> bool {
        self.address == *address
    }

    /// Returns the topics, in emission order.
    pub fn topics(&self) -> &[LogTopic] {
        &self.topics
    }

    /// Returns the number of topics.
    pub fn topics_count(&self) -> usize {
        self.topics.len()
    }

    /// Returns the topic at `index`, or [LogTopic::EMPTY] if there is none.
    pub fn topic(&self, index: usize) -> LogTopic {
        self.topics.get(index).copied().unwrap_or(LogTopic::EMPTY)
    }

    /// Returns an independent copy of the data.
    pub fn data(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }

    pub(crate) const fn data_ref(&self) -> &Bytes {
        &self.data
    }

    /// Returns `true` if any topic embeds `address` or, unless `topics_only` is set, the log
    /// was emitted by `address`.
    pub fn matches_address(&self, address: &Address, topics_only: bool) -> bool {
        self.topics.iter().any(|topic| topic.matches_address(address)) ||
            (!topics_only && self.has_address(address))
    }

    /// Returns the including block hash and number, or [None] if the log is not included.
    pub const fn extract_included(&self) -> Option<(B256, u64)> {
        self.status.extract_included()
    }

    /// Returns the log bloom accrued from the address and every topic, as contributed to a
    /// block header's bloom.
    pub fn bloom(&self) -> Bloom {
        let mut bloom = Bloom::ZERO;
        bloom.accrue(BloomInput::Raw(self.address.as_slice()));
        for topic in &self.topics {
            bloom.accrue(BloomInput::Raw(topic.as_slice()));
        }
        bloom
    }

    /// Probabilistic pre-filter for [LogRecord::matches_address] over [LogRecord::bloom].
    ///
    /// A `false` result is definitive; a `true` result must be confirmed with the exact test.
    pub fn bloom_matches_address(&self, address: &Address) -> bool {
        let bloom = self.bloom();
        bloom.contains(&LogTopic::bloom_filter_for_address(*address)) ||
            bloom.contains_input(BloomInput::Raw(address.as_slice()))
    }

    /// Returns a fully independent copy, produced by a round trip through the
    /// [RlpType::Archive] encoding.
    pub fn copy(&self) -> LogDecodeResult<Self> {
        let encoded = self.rlp_bytes(RlpType::Archive);
        Self::rlp_decode(&mut encoded.as_slice(), RlpType::Archive)
    }

    /// Converts the record into a consensus [Log], dropping the status.
    pub fn to_primitive_log(&self) -> Log {
        Log::new_unchecked(
            self.address,
            self.topics.iter().map(|topic| topic.0).collect(),
            self.data.clone(),
        )
    }
}

impl From<Log> for LogRecord {
    fn from(log: Log) -> Self {
        let topics = log.topics().iter().copied().map(LogTopic).collect();
        Self::new(log.address, topics, log.data.data)
    }
}

impl PartialEq for LogRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity_hash == other.identity_hash
    }
}

impl Eq for LogRecord {}

impl Hash for LogRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_hash.hash(state);
    }
}

impl Borrow<B256> for LogRecord {
    fn borrow(&self) -> &B256 {
        &self.identity_hash
    }
}
