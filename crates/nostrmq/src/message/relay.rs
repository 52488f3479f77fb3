// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay messages

use core::fmt;

use serde_json::{json, Value};

use super::{Error, SubscriptionId};
use crate::event::{Event, EventId};

/// Machine-readable prefixes carried by `OK` and `CLOSED` messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MachineReadablePrefix {
    /// Duplicate
    Duplicate,
    /// POW
    Pow,
    /// Blocked
    Blocked,
    /// Rate limited
    RateLimited,
    /// Invalid
    Invalid,
    /// Error
    Error,
    /// Unsupported
    Unsupported,
    /// Restricted
    Restricted,
}

impl fmt::Display for MachineReadablePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::Pow => write!(f, "pow"),
            Self::Blocked => write!(f, "blocked"),
            Self::RateLimited => write!(f, "rate-limited"),
            Self::Invalid => write!(f, "invalid"),
            Self::Error => write!(f, "error"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Restricted => write!(f, "restricted"),
        }
    }
}

impl MachineReadablePrefix {
    /// Parse the prefix of a relay-provided message, if any
    pub fn parse(message: &str) -> Option<Self> {
        match message {
            m if m.starts_with("duplicate:") => Some(Self::Duplicate),
            m if m.starts_with("pow:") => Some(Self::Pow),
            m if m.starts_with("blocked:") => Some(Self::Blocked),
            m if m.starts_with("rate-limited:") => Some(Self::RateLimited),
            m if m.starts_with("invalid:") => Some(Self::Invalid),
            m if m.starts_with("error:") => Some(Self::Error),
            m if m.starts_with("unsupported:") => Some(Self::Unsupported),
            m if m.starts_with("restricted:") => Some(Self::Restricted),
            _ => None,
        }
    }
}

/// Messages sent by relays, received by clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event JSON>]`
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// `["OK", <event_id>, <true|false>, <message>]`
    Ok {
        /// Event ID
        event_id: EventId,
        /// Acceptance
        status: bool,
        /// Message
        message: String,
    },
    /// `["EOSE", <subscription_id>]`
    EndOfStoredEvents(SubscriptionId),
    /// `["CLOSED", <subscription_id>, <message>]`
    Closed {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Message
        message: String,
    },
    /// `["NOTICE", <message>]`
    Notice(String),
}

impl RelayMessage {
    /// Create an `EVENT` message
    #[inline]
    pub fn event(subscription_id: SubscriptionId, event: Event) -> Self {
        Self::Event {
            subscription_id,
            event: Box::new(event),
        }
    }

    /// Create an `OK` message
    #[inline]
    pub fn ok<S>(event_id: EventId, status: bool, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Ok {
            event_id,
            status,
            message: message.into(),
        }
    }

    /// Create an `EOSE` message
    #[inline]
    pub fn eose(subscription_id: SubscriptionId) -> Self {
        Self::EndOfStoredEvents(subscription_id)
    }

    /// Create a `CLOSED` message
    #[inline]
    pub fn closed<S>(subscription_id: SubscriptionId, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Closed {
            subscription_id,
            message: message.into(),
        }
    }

    /// Create a `NOTICE` message
    #[inline]
    pub fn notice<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Notice(message.into())
    }

    /// Serialize as JSON string
    pub fn as_json(&self) -> String {
        match self {
            Self::Event {
                subscription_id,
                event,
            } => json!(["EVENT", subscription_id, event]).to_string(),
            Self::Ok {
                event_id,
                status,
                message,
            } => json!(["OK", event_id, status, message]).to_string(),
            Self::EndOfStoredEvents(subscription_id) => {
                json!(["EOSE", subscription_id]).to_string()
            }
            Self::Closed {
                subscription_id,
                message,
            } => json!(["CLOSED", subscription_id, message]).to_string(),
            Self::Notice(message) => json!(["NOTICE", message]).to_string(),
        }
    }

    /// Deserialize from JSON string.
    ///
    /// Messages of an unrecognized kind come back as
    /// [`Error::UnknownMessageKind`]: the connection logs and drops them
    /// without dying.
    pub fn from_json<T>(json: T) -> Result<Self, Error>
    where
        T: AsRef<[u8]>,
    {
        let value: Value = serde_json::from_slice(json.as_ref())?;
        let Value::Array(array) = value else {
            return Err(Error::InvalidMessageFormat);
        };

        let get = |idx: usize| array.get(idx).cloned().ok_or(Error::InvalidMessageFormat);

        match array.first().and_then(Value::as_str) {
            Some("EVENT") => Ok(Self::Event {
                subscription_id: serde_json::from_value(get(1)?)?,
                event: Box::new(serde_json::from_value(get(2)?)?),
            }),
            Some("OK") => Ok(Self::Ok {
                event_id: serde_json::from_value(get(1)?)?,
                status: serde_json::from_value(get(2)?)?,
                message: serde_json::from_value(get(3)?)?,
            }),
            Some("EOSE") => Ok(Self::EndOfStoredEvents(serde_json::from_value(get(1)?)?)),
            Some("CLOSED") => Ok(Self::Closed {
                subscription_id: serde_json::from_value(get(1)?)?,
                message: serde_json::from_value(get(2)?)?,
            }),
            Some("NOTICE") => Ok(Self::Notice(serde_json::from_value(get(1)?)?)),
            Some(other) => Err(Error::UnknownMessageKind(other.to_string())),
            None => Err(Error::InvalidMessageFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "2be17aa3031bdcb006f0fce80c146dea9c1c0268b0af2398bb673365c6444d45";

    #[test]
    fn test_ok_round_trip() {
        let json = format!(r#"["OK","{ID}",true,""]"#);
        let msg = RelayMessage::from_json(&json).unwrap();
        assert_eq!(
            msg,
            RelayMessage::ok(EventId::from_hex(ID).unwrap(), true, "")
        );
        assert_eq!(msg.as_json(), json);
    }

    #[test]
    fn test_eose_and_closed() {
        let msg = RelayMessage::from_json(r#"["EOSE","sub1"]"#).unwrap();
        assert_eq!(msg, RelayMessage::eose(SubscriptionId::new("sub1")));

        let msg = RelayMessage::from_json(r#"["CLOSED","sub1","error: shutting down"]"#).unwrap();
        assert_eq!(
            msg,
            RelayMessage::closed(SubscriptionId::new("sub1"), "error: shutting down")
        );
    }

    #[test]
    fn test_unknown_kind_is_survivable() {
        assert!(matches!(
            RelayMessage::from_json(r#"["AUTH","challenge-string"]"#),
            Err(Error::UnknownMessageKind(kind)) if kind == "AUTH"
        ));
        assert!(matches!(
            RelayMessage::from_json(r#"{"not":"an array"}"#),
            Err(Error::InvalidMessageFormat)
        ));
    }

    #[test]
    fn test_machine_readable_prefix() {
        assert_eq!(
            MachineReadablePrefix::parse("rate-limited: slow down"),
            Some(MachineReadablePrefix::RateLimited)
        );
        assert_eq!(
            MachineReadablePrefix::parse("pow: 28 bits required"),
            Some(MachineReadablePrefix::Pow)
        );
        assert_eq!(MachineReadablePrefix::parse("all good"), None);
    }
}
