//! Reference names and on-disk reference formats

pub mod packed_refs;
pub mod ref_name;

/// Anything matching this can escape the git directory or collide with git's own syntax
pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\/\/|\.lock$|\.lock\/|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Content of a symbolic reference file
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};

pub const HEAD_REF_NAME: &str = "HEAD";

pub const PACKED_REFS_FILE: &str = "packed-refs";

/// Prefixes tried, in order, when looking up a short reference name
pub const REF_SEARCH_PREFIXES: [&str; 5] = ["", "refs/", "refs/tags/", "refs/heads/", "refs/remotes/"];
