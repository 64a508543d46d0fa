//! Git commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (none for a root commit)
//! - Author and committer identities
//! - Commit message
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Other headers (`encoding`, `gpgsig`, `mergetag`, ...) are kept verbatim, including
//! their space-prefixed continuation lines.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bstr::{BStr, BString, ByteSlice};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use derive_new::new;

/// Author or committer information
///
/// Name and email are kept as raw bytes: commits written under a legacy `encoding`
/// are not UTF-8 and must hash back to the same id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Identity {
    name: BString,
    email: BString,
    timestamp: DateTime<FixedOffset>,
}

impl Identity {
    pub fn new(name: impl Into<BString>, email: impl Into<BString>, timestamp: DateTime<FixedOffset>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
            timestamp,
        }
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    pub fn email(&self) -> &BStr {
        self.email.as_bstr()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Offset from UTC in minutes
    pub fn timezone_offset(&self) -> i32 {
        self.timestamp.offset().local_minus_utc() / 60
    }

    /// Format as stored in commits, "Name <email> seconds +hhmm", lossily decoded for display
    pub fn to_external_string(&self) -> String {
        self.to_string()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.name.len() + self.email.len() + 20);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(b" <");
        bytes.extend_from_slice(&self.email);
        bytes.extend_from_slice(b"> ");
        bytes.extend_from_slice(self.timestamp.timestamp().to_string().as_bytes());
        bytes.push(b' ');
        bytes.extend_from_slice(self.timestamp.format("%z").to_string().as_bytes());
        bytes
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::malformed(ObjectType::Commit, format!("{reason} in identity {:?}", value.as_bstr()))
        };

        // Split from the right: timezone, then timestamp, then "name <email>"
        let mut parts = value.rsplitn_str(3, " ");
        let timezone = parts.next().ok_or_else(|| invalid("missing timezone"))?;
        let seconds = parts
            .next()
            .and_then(|seconds| seconds.to_str().ok())
            .and_then(|seconds| seconds.parse::<i64>().ok())
            .ok_or_else(|| invalid("invalid timestamp"))?;
        let name_email = parts.next().ok_or_else(|| invalid("missing name"))?;

        let email_start = name_email.find_byte(b'<').ok_or_else(|| invalid("missing '<'"))?;
        let email_end = name_email.rfind_byte(b'>').ok_or_else(|| invalid("missing '>'"))?;
        if email_end < email_start {
            return Err(invalid("misplaced '>'"));
        }

        let offset = timezone
            .to_str()
            .ok()
            .and_then(parse_timezone)
            .ok_or_else(|| invalid("invalid timezone"))?;
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| invalid("timestamp out of range"))?
            .with_timezone(&offset);

        Ok(Identity {
            name: BString::from(name_email[..email_start].trim_end()),
            email: BString::from(&name_email[email_start + 1..email_end]),
            timestamp,
        })
    }
}

impl TryFrom<&str> for Identity {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Identity::try_from(value.as_bytes())
    }
}

fn parse_timezone(timezone: &str) -> Option<FixedOffset> {
    let (sign, digits) = match timezone.as_bytes().first()? {
        b'+' => (1, &timezone[1..]),
        b'-' => (-1, &timezone[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours = digits[..2].parse::<i32>().ok()?;
    let minutes = digits[2..].parse::<i32>().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Git commit object
///
/// The message and extra header values are raw bytes; an `encoding` header names
/// their charset but decoding is left to the reader.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Commit {
    tree: ObjectId,
    parents: Vec<ObjectId>,
    author: Identity,
    committer: Identity,
    #[new(into)]
    message: BString,
    #[new(default)]
    extra_headers: Vec<(String, BString)>,
}

impl Commit {
    pub fn tree(&self) -> &ObjectId {
        &self.tree
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }

    pub fn committer(&self) -> &Identity {
        &self.committer
    }

    pub fn message(&self) -> &BStr {
        self.message.as_bstr()
    }

    /// First line of the message
    pub fn title_line(&self) -> &BStr {
        self.message.lines().next().unwrap_or_default().as_bstr()
    }

    /// Headers other than tree, parent, author and committer, in their stored order
    pub fn extra_headers(&self) -> &[(String, BString)] {
        &self.extra_headers
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::with_capacity(256 + self.message.len());
        let mut header = |key: &str, value: &[u8]| {
            content.extend_from_slice(key.as_bytes());
            content.push(b' ');
            content.extend_from_slice(value);
            content.push(b'\n');
        };

        header("tree", self.tree.to_string().as_bytes());
        for parent in &self.parents {
            header("parent", parent.to_string().as_bytes());
        }
        header("author", self.author.to_bytes().as_slice());
        header("committer", self.committer.to_bytes().as_slice());
        for (key, value) in &self.extra_headers {
            header(key.as_str(), value.replace("\n", "\n ").as_slice());
        }

        content.push(b'\n');
        content.extend_from_slice(&self.message);
        Ok(Bytes::from(content))
    }
}

impl Unpackable for Commit {
    fn deserialize(content: Bytes) -> Result<Self> {
        let (headers, message) = match content.find("\n\n") {
            Some(split) => (&content[..split], &content[split + 2..]),
            None => (&content[..], &b""[..]),
        };

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra_headers: Vec<(String, BString)> = Vec::new();

        for line in headers.lines() {
            if let Some(continuation) = line.strip_prefix(b" ") {
                let (_, value) = extra_headers.last_mut().ok_or_else(|| {
                    Error::malformed(ObjectType::Commit, "continuation line without a header")
                })?;
                value.push(b'\n');
                value.extend_from_slice(continuation);
                continue;
            }

            let invalid_line =
                || Error::malformed(ObjectType::Commit, format!("invalid header line {:?}", line.as_bstr()));
            let (key, value) = line.split_once_str(" ").ok_or_else(invalid_line)?;
            let key = key.to_str().map_err(|_| invalid_line())?;

            match key {
                "tree" if tree.is_none() && parents.is_empty() => {
                    tree = Some(parse_oid(value)?);
                }
                "parent" if tree.is_some() && author.is_none() => {
                    parents.push(parse_oid(value)?);
                }
                "author" if tree.is_some() && author.is_none() => {
                    author = Some(Identity::try_from(value)?);
                }
                "committer" if author.is_some() && committer.is_none() => {
                    committer = Some(Identity::try_from(value)?);
                }
                "tree" | "parent" | "author" | "committer" => {
                    return Err(Error::malformed(
                        ObjectType::Commit,
                        format!("unexpected {key} header"),
                    ));
                }
                _ => extra_headers.push((key.to_string(), BString::from(value))),
            }
        }

        let missing = |header: &str| Error::malformed(ObjectType::Commit, format!("missing {header} header"));

        Ok(Commit {
            tree: tree.ok_or_else(|| missing("tree"))?,
            parents,
            author: author.ok_or_else(|| missing("author"))?,
            committer: committer.ok_or_else(|| missing("committer"))?,
            message: BString::from(message),
            extra_headers,
        })
    }
}

fn parse_oid(value: &[u8]) -> Result<ObjectId> {
    value
        .to_str()
        .ok()
        .and_then(|hex| ObjectId::try_parse(hex).ok())
        .ok_or_else(|| {
            Error::malformed(ObjectType::Commit, format!("invalid object id {:?}", value.as_bstr()))
        })
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}
