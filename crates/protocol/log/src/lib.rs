#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{LogDecodeError, LogDecodeResult};

mod rlp;

mod topic;
pub use topic::LogTopic;

mod status;
pub use status::{
    LogIdentifier, LogState, LogStatus, LogStatusType, MAX_ERRORED_REASON_LENGTH,
};

mod record;
pub use record::LogRecord;

mod codec;
pub use codec::{RlpType, decode_network_logs};
