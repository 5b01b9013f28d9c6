use std::fmt;

/// Broker-assigned position of a delivery, used to acknowledge it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryTag {
    pub partition: i32,
    pub offset: i64,
}

/// A message handed to the consumer, owned by the broker until acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub tag: DeliveryTag,
    /// Set when the broker already handed this message out once
    pub redelivered: bool,
}

impl Delivery {
    /// Payload as text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Notifications emitted by the directory.
///
/// Rendered as a human-readable line; that line is the message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    UserRegistered {
        email: String,
    },
    ContactAdded {
        name: String,
        email: String,
        owner: String,
    },
}

impl fmt::Display for DirectoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryEvent::UserRegistered { email } => write!(f, "User Registered: {}", email),
            DirectoryEvent::ContactAdded { name, email, owner } => {
                write!(f, "Contact Added: {} <{}> (owner {})", name, email, owner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_text() {
        let registered = DirectoryEvent::UserRegistered {
            email: "alice@example.com".to_string(),
        };
        assert_eq!(registered.to_string(), "User Registered: alice@example.com");

        let added = DirectoryEvent::ContactAdded {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            owner: "42".to_string(),
        };
        assert_eq!(
            added.to_string(),
            "Contact Added: Bob <bob@example.com> (owner 42)"
        );
    }

    #[test]
    fn test_delivery_text() {
        let delivery = Delivery {
            routing_key: "directory".to_string(),
            payload: vec![0xff, 0xfe],
            tag: DeliveryTag {
                partition: 0,
                offset: 1,
            },
            redelivered: false,
        };

        assert_eq!(delivery.text(), None);
    }
}
