//! Shadow topic names.
//!
//! Requests go to `$aws/things/{thing}/shadow/{get,update}`; the service
//! answers on the same topic suffixed with `/accepted` or `/rejected`.

use gasguard_domain::id::DeviceId;

const PREFIX: &str = "$aws/things/";
const SHADOW: &str = "/shadow/";

/// Which shadow operation a topic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Update,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Update => "update",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "get" => Some(Self::Get),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// Outcome suffix of a response topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// A parsed response topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTopic<'a> {
    pub thing: &'a str,
    pub operation: Operation,
    pub verdict: Verdict,
}

/// Topic a request for `operation` on `thing` is published to.
#[must_use]
pub fn request(thing: &DeviceId, operation: Operation) -> String {
    format!("{PREFIX}{thing}{SHADOW}{}", operation.as_str())
}

/// Wildcard filters covering every response this client waits for.
#[must_use]
pub fn response_filters() -> [String; 4] {
    let filter = |operation: Operation, verdict: &str| {
        format!("{PREFIX}+{SHADOW}{}/{verdict}", operation.as_str())
    };
    [
        filter(Operation::Get, "accepted"),
        filter(Operation::Get, "rejected"),
        filter(Operation::Update, "accepted"),
        filter(Operation::Update, "rejected"),
    ]
}

/// Parse a response topic. Anything else (deltas, documents, requests)
/// yields `None`.
#[must_use]
pub fn parse_response(topic: &str) -> Option<ResponseTopic<'_>> {
    let rest = topic.strip_prefix(PREFIX)?;
    let (thing, rest) = rest.split_once(SHADOW)?;
    let (operation, verdict) = rest.split_once('/')?;
    let verdict = match verdict {
        "accepted" => Verdict::Accepted,
        "rejected" => Verdict::Rejected,
        _ => return None,
    };
    Some(ResponseTopic {
        thing,
        operation: Operation::parse(operation)?,
        verdict,
    })
}
