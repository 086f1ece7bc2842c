use chrono::{DateTime, Utc};
use libqhf::reader::{Direction, HistoryRecord, MessageRecord};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize, Debug)]
struct JsonHistory<'a> {
    uin: &'a str,
    nickname: &'a str,
    messages: Vec<JsonMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct JsonMessage<'a> {
    sender: &'a str,
    timestamp_unix: u32,
    timestamp_iso: String,
    is_outgoing: bool,
    message_type_code: u8,
    message_type_description: &'a str,
    text: &'a str,
}

/// Render a history record as a pretty-printed JSON document.
pub fn to_json(record: &HistoryRecord) -> Result<String> {
    let messages = record
        .messages
        .iter()
        .map(|message| JsonMessage {
            sender: sender_name(record, message),
            timestamp_unix: message.timestamp,
            timestamp_iso: timestamp(message).to_rfc3339(),
            is_outgoing: message.direction == Direction::Outgoing,
            message_type_code: message.kind.code(),
            message_type_description: message.kind.label(),
            text: &message.text,
        })
        .collect();

    let history = JsonHistory {
        uin: &record.header.uin,
        nickname: &record.header.nickname,
        messages,
    };

    serde_json::to_string_pretty(&history).into_diagnostic()
}

/// Render a history record as a line-oriented chat log.
pub fn to_txt(record: &HistoryRecord) -> String {
    let entries: Vec<String> = record
        .messages
        .iter()
        .map(|message| {
            format!(
                "{} [{}]\n{}",
                sender_name(record, message),
                timestamp(message).format("%Y-%m-%d %H:%M:%S UTC"),
                message.text
            )
        })
        .collect();

    entries.join("\n\n")
}

fn sender_name<'a>(record: &'a HistoryRecord, message: &MessageRecord) -> &'a str {
    match message.direction {
        Direction::Outgoing => "Me",
        Direction::Incoming => &record.header.nickname,
    }
}

fn timestamp(message: &MessageRecord) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(message.timestamp), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libqhf::reader::{HistoryHeader, MessageKind};

    fn sample_record() -> HistoryRecord {
        HistoryRecord {
            header: HistoryHeader {
                version: 2,
                declared_size: 0,
                declared_count: 2,
                uin: "123456".to_string(),
                nickname: "Bob".to_string(),
            },
            messages: vec![
                MessageRecord {
                    timestamp: 1_700_000_000,
                    direction: Direction::Outgoing,
                    kind: MessageKind::Online,
                    text: "hello".to_string(),
                },
                MessageRecord {
                    timestamp: 1_700_000_060,
                    direction: Direction::Incoming,
                    kind: MessageKind::Unknown(250),
                    text: "hi there".to_string(),
                },
            ],
        }
    }

    #[test]
    fn txt_names_sender_per_direction() {
        let text = to_txt(&sample_record());
        let entries: Vec<&str> = text.split("\n\n").collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "Me [2023-11-14 22:13:20 UTC]\nhello");
        assert_eq!(entries[1], "Bob [2023-11-14 22:14:20 UTC]\nhi there");
    }

    #[test]
    fn json_carries_numeric_and_mapped_type() {
        let json = to_json(&sample_record()).expect("render failed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("invalid JSON");

        assert_eq!(value["uin"], "123456");
        assert_eq!(value["nickname"], "Bob");
        assert_eq!(value["messages"][0]["sender"], "Me");
        assert_eq!(value["messages"][0]["message_type_code"], 1);
        assert_eq!(
            value["messages"][0]["message_type_description"],
            "Online message"
        );
        assert_eq!(value["messages"][1]["message_type_code"], 250);
        assert_eq!(value["messages"][1]["message_type_description"], "Unknown");
        assert_eq!(value["messages"][1]["is_outgoing"], false);
        assert_eq!(
            value["messages"][0]["timestamp_iso"],
            "2023-11-14T22:13:20+00:00"
        );
    }
}
