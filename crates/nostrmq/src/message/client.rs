// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Client messages

use serde_json::{json, Value};

use super::{Error, Filter, SubscriptionId};
use crate::event::Event;

/// Messages sent by clients, received by relays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `["EVENT", <event JSON>]`
    Event(Box<Event>),
    /// `["REQ", <subscription_id>, <filter JSON>...]`
    Req {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters
        filters: Vec<Filter>,
    },
    /// `["CLOSE", <subscription_id>]`
    Close(SubscriptionId),
}

impl ClientMessage {
    /// Create an `EVENT` message
    #[inline]
    pub fn event(event: Event) -> Self {
        Self::Event(Box::new(event))
    }

    /// Create a `REQ` message
    #[inline]
    pub fn req(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Req {
            subscription_id,
            filters,
        }
    }

    /// Create a `CLOSE` message
    #[inline]
    pub fn close(subscription_id: SubscriptionId) -> Self {
        Self::Close(subscription_id)
    }

    /// Check if is an `EVENT` message
    #[inline]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(..))
    }

    /// Check if is a `REQ` message
    #[inline]
    pub fn is_req(&self) -> bool {
        matches!(self, Self::Req { .. })
    }

    /// Check if is a `CLOSE` message
    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(..))
    }

    /// Serialize as JSON string
    pub fn as_json(&self) -> String {
        match self {
            Self::Event(event) => json!(["EVENT", event]).to_string(),
            Self::Req {
                subscription_id,
                filters,
            } => {
                let mut json: Vec<Value> = vec![json!("REQ"), json!(subscription_id)];
                json.extend(filters.iter().map(|f| json!(f)));
                Value::Array(json).to_string()
            }
            Self::Close(subscription_id) => json!(["CLOSE", subscription_id]).to_string(),
        }
    }

    /// Deserialize from JSON string
    pub fn from_json<T>(json: T) -> Result<Self, Error>
    where
        T: AsRef<[u8]>,
    {
        let value: Value = serde_json::from_slice(json.as_ref())?;
        let Value::Array(array) = value else {
            return Err(Error::InvalidMessageFormat);
        };

        match array.first().and_then(Value::as_str) {
            Some("EVENT") => {
                let event: Value = array.get(1).cloned().ok_or(Error::InvalidMessageFormat)?;
                Ok(Self::event(serde_json::from_value(event)?))
            }
            Some("REQ") => {
                let subscription_id: SubscriptionId =
                    serde_json::from_value(array.get(1).cloned().ok_or(Error::InvalidMessageFormat)?)?;
                let filters: Vec<Filter> = array[2..]
                    .iter()
                    .cloned()
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()?;
                Ok(Self::req(subscription_id, filters))
            }
            Some("CLOSE") => {
                let subscription_id: SubscriptionId =
                    serde_json::from_value(array.get(1).cloned().ok_or(Error::InvalidMessageFormat)?)?;
                Ok(Self::close(subscription_id))
            }
            Some(other) => Err(Error::UnknownMessageKind(other.to_string())),
            None => Err(Error::InvalidMessageFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Kind;
    use crate::key::PublicKey;

    #[test]
    fn test_req_json() {
        let pk =
            PublicKey::from_hex("379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe")
                .unwrap();
        let msg = ClientMessage::req(
            SubscriptionId::new("test"),
            vec![
                Filter::new().kind(Kind::from(4)),
                Filter::new().pubkey(pk),
            ],
        );
        assert_eq!(
            msg.as_json(),
            r##"["REQ","test",{"kinds":[4]},{"#p":["379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe"]}]"##
        );
    }

    #[test]
    fn test_close_json_round_trip() {
        let msg = ClientMessage::close(SubscriptionId::new("abc"));
        assert_eq!(msg.as_json(), r#"["CLOSE","abc"]"#);
        assert_eq!(ClientMessage::from_json(msg.as_json()).unwrap(), msg);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(matches!(
            ClientMessage::from_json(r#"["AUTH","challenge"]"#),
            Err(Error::UnknownMessageKind(kind)) if kind == "AUTH"
        ));
    }
}
