//! # Workbench Core Data Channel Errors
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Module instance '{instance_id}' has no channel '{channel_id}'")]
    ChannelNotFound {
        instance_id: String,
        channel_id: String,
    },

    #[error("Module instance '{instance_id}' has no receiver '{receiver_id}'")]
    ReceiverNotFound {
        instance_id: String,
        receiver_id: String,
    },

    #[error("Receiver '{receiver_id}' does not accept channels of kind '{kind}'")]
    UnsupportedKind { receiver_id: String, kind: String },

    #[error("Receiver '{receiver_id}' accepts a single content but {requested} were selected")]
    MultipleContentsNotSupported { receiver_id: String, requested: usize },

    #[error("Channel '{channel_id}' has been removed")]
    ChannelRemoved { channel_id: String },
}
