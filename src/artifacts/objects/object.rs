use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;

/// Encodes an object's content, without the `<type> <size>\0` header
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decodes an object's content, the header having been stripped by the database
pub trait Unpackable {
    fn deserialize(content: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn object_id(&self) -> Result<ObjectId> {
        Ok(hash_object(self.object_type(), &self.serialize()?))
    }
}

/// Prefix `content` with its canonical header
pub fn frame_object(object_type: ObjectType, content: &[u8]) -> Bytes {
    let header = object_type.header(content.len());
    let mut framed = Vec::with_capacity(header.len() + content.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(content);

    Bytes::from(framed)
}

/// Content address of `content` stored as `object_type`
pub fn hash_object(object_type: ObjectType, content: &[u8]) -> ObjectId {
    ObjectId::digest(&frame_object(object_type, content))
}
