use byteorder::ByteOrder;

use crate::crypt;
use crate::cursor::ByteCursor;
use crate::error::{CursorError, DecodeError};
use crate::{
    MAGIC, MESSAGE_BLOCK_SIZE_V1, MESSAGE_BLOCK_SIZE_V3, MESSAGE_DIRECTION_OFFSET,
    MESSAGE_TIMESTAMP_OFFSET, MESSAGE_TYPE_OFFSET,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryHeader {
    /// Format version
    pub version: u8,
    /// File size declared by the header (informational, known to be unreliable)
    pub declared_size: u32,
    /// Message count declared by the header (informational, known to be unreliable)
    pub declared_count: u32,
    /// Contact identifier
    pub uin: String,
    /// Contact nickname
    pub nickname: String,
}

/// Direction of a message relative to the local user.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Message type code mapped to its known meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Online,
    SendingDate,
    Sender,
    AuthorizationRequest,
    FriendRequest,
    Offline,
    AuthorizationAccepted,
    ServiceConnection,
    ServiceBirthday,
    Unknown(u8),
}

impl MessageKind {
    /// Raw type code as stored in the message block
    pub fn code(&self) -> u8 {
        match self {
            MessageKind::Online => 1,
            MessageKind::SendingDate => 2,
            MessageKind::Sender => 3,
            MessageKind::AuthorizationRequest => 5,
            MessageKind::FriendRequest => 6,
            MessageKind::Offline => 13,
            MessageKind::AuthorizationAccepted => 14,
            MessageKind::ServiceConnection => 80,
            MessageKind::ServiceBirthday => 81,
            MessageKind::Unknown(code) => *code,
        }
    }

    /// Human-readable label of the type code
    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Online => "Online message",
            MessageKind::SendingDate => "Message sending date",
            MessageKind::Sender => "Message sender",
            MessageKind::AuthorizationRequest => "Authorization request",
            MessageKind::FriendRequest => "Friend request",
            MessageKind::Offline => "Offline message",
            MessageKind::AuthorizationAccepted => "Authorization request accepted",
            MessageKind::ServiceConnection => "QIP/ICQ service message (connection)",
            MessageKind::ServiceBirthday => "QIP/ICQ service message (birthday)",
            MessageKind::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRecord {
    /// Message creation time (Unix seconds)
    pub timestamp: u32,
    /// Who sent the message
    pub direction: Direction,
    /// Message type
    pub kind: MessageKind,
    /// Decrypted message text
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRecord {
    pub header: HistoryHeader,
    /// Messages in file order
    pub messages: Vec<MessageRecord>,
}

/// Decode a complete QHF buffer into a history record.
///
/// The buffer must hold the entire file. Decoding runs until the buffer is
/// exhausted; the message count declared by the header is never used to bound
/// the loop. Any failure aborts the whole decode.
pub fn decode_history(buffer: &[u8]) -> Result<HistoryRecord, DecodeError> {
    let mut cursor = ByteCursor::new(buffer);

    let header = decode_header(&mut cursor)?;
    let block_size = message_block_size(header.version);

    if u64::from(header.declared_size) != buffer.len() as u64 {
        log::debug!(
            "header declares {} bytes, file is {} bytes",
            header.declared_size,
            buffer.len()
        );
    }

    let mut messages: Vec<MessageRecord> = Vec::new();
    while cursor.remaining() > 0 {
        let message =
            decode_message(&mut cursor, block_size).map_err(|source| DecodeError::Message {
                index: messages.len(),
                source,
            })?;
        messages.push(message);
    }

    if header.declared_count as usize != messages.len() {
        log::debug!(
            "header declares {} messages, decoded {}",
            header.declared_count,
            messages.len()
        );
    }

    Ok(HistoryRecord { header, messages })
}

/// Size of the fixed message block for the given format version
pub fn message_block_size(version: u8) -> usize {
    if version >= 3 {
        MESSAGE_BLOCK_SIZE_V3
    } else {
        MESSAGE_BLOCK_SIZE_V1
    }
}

/// Map a raw type code to its known message kind.
pub fn parse_kind(raw: u8) -> MessageKind {
    match raw {
        1 => MessageKind::Online,
        2 => MessageKind::SendingDate,
        3 => MessageKind::Sender,
        5 => MessageKind::AuthorizationRequest,
        6 => MessageKind::FriendRequest,
        13 => MessageKind::Offline,
        14 => MessageKind::AuthorizationAccepted,
        80 => MessageKind::ServiceConnection,
        81 => MessageKind::ServiceBirthday,
        other => MessageKind::Unknown(other),
    }
}

fn decode_header(cursor: &mut ByteCursor) -> Result<HistoryHeader, DecodeError> {
    let magic = cursor.read_bytes(MAGIC.len()).map_err(DecodeError::Header)?;
    if magic != MAGIC {
        let mut received = [0u8; 3];
        received.copy_from_slice(magic);
        return Err(DecodeError::BadMagic { received });
    }

    let version = cursor.read_u8().map_err(DecodeError::Header)?;
    let declared_size = cursor.read_u32().map_err(DecodeError::Header)?;
    let declared_count = cursor.read_u32().map_err(DecodeError::Header)?;
    let uin = cursor
        .read_length_prefixed_string()
        .map_err(DecodeError::Header)?;
    let nickname = cursor
        .read_length_prefixed_string()
        .map_err(DecodeError::Header)?;

    Ok(HistoryHeader {
        version,
        declared_size,
        declared_count,
        uin,
        nickname,
    })
}

fn decode_message(
    cursor: &mut ByteCursor,
    block_size: usize,
) -> Result<MessageRecord, CursorError> {
    let block = cursor.read_bytes(block_size)?;

    let timestamp = byteorder::BigEndian::read_u32(
        &block[MESSAGE_TIMESTAMP_OFFSET..MESSAGE_TIMESTAMP_OFFSET + 4],
    );
    let direction = match block[MESSAGE_DIRECTION_OFFSET] {
        0 => Direction::Incoming,
        _ => Direction::Outgoing,
    };
    let kind = parse_kind(block[MESSAGE_TYPE_OFFSET]);

    // The encrypted payload length sits in the last four bytes of the fixed
    // block; the bytes between the type code and the length field carry no
    // known meaning and are skipped.
    let length = byteorder::BigEndian::read_u32(&block[block_size - 4..]);
    let length_offset = cursor.position() - 4;

    let wanted = match usize::try_from(length) {
        Err(_) => usize::MAX,
        Ok(value) => value,
    };
    if wanted > cursor.remaining() {
        return Err(CursorError::InvalidLength {
            offset: length_offset,
            received: length,
            remaining: cursor.remaining(),
        });
    }

    let payload_offset = cursor.position();
    let payload = cursor.read_bytes(wanted)?;
    let plain = crypt::decrypt(payload);

    match String::from_utf8(plain) {
        Err(_) => Err(CursorError::InvalidEncoding {
            offset: payload_offset,
        }),
        Ok(text) => Ok(MessageRecord {
            timestamp,
            direction,
            kind,
            text,
        }),
    }
}
