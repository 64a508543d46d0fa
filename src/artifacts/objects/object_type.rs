use std::io::BufRead;

/// Kind tag carried in every stored object's header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Canonical header hashed and stored in front of the content: `<type> <size>\0`
    pub fn header(&self, size: usize) -> String {
        format!("{} {}\0", self.as_str(), size)
    }

    /// Read the `<type> <size>\0` header, returning the kind and the declared size
    ///
    /// Any deviation is reported as a plain reason; the database attaches the object id.
    pub fn parse_header(data_reader: &mut impl BufRead) -> Result<(Self, usize), String> {
        let mut object_type = Vec::new();
        data_reader
            .read_until(b' ', &mut object_type)
            .map_err(|e| e.to_string())?;
        if object_type.pop() != Some(b' ') {
            return Err("missing object type".to_string());
        }

        let object_type = std::str::from_utf8(&object_type)
            .ok()
            .and_then(|kind| ObjectType::try_from(kind).ok())
            .ok_or_else(|| format!("unknown object type {:?}", String::from_utf8_lossy(&object_type)))?;

        let mut size = Vec::new();
        data_reader
            .read_until(b'\0', &mut size)
            .map_err(|e| e.to_string())?;
        if size.pop() != Some(b'\0') {
            return Err("missing object size terminator".to_string());
        }

        let size = std::str::from_utf8(&size)
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .ok_or_else(|| "invalid object size".to_string())?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(format!("invalid object type {value:?}")),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
