use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::storage::error::{invalid_argument, StorageResult};

/// Characters left unescaped in object paths, matching `encodeURIComponent`.
const OBJECT_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A bucket plus an object path inside it. The empty path is the bucket root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    bucket: String,
    path: String,
}

impl Location {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            bucket: bucket.into(),
            path: canonical_path(&path),
        }
    }

    pub fn root(bucket: impl Into<String>) -> Self {
        Self::new(bucket, "")
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Location of `segment` beneath this one; slashes inside `segment` nest further.
    pub fn child(&self, segment: &str) -> Location {
        let child = canonical_path(segment);
        let path = if self.path.is_empty() {
            child
        } else if child.is_empty() {
            self.path.clone()
        } else {
            format!("{}/{}", self.path, child)
        };
        Location {
            bucket: self.bucket.clone(),
            path,
        }
    }

    /// Last path component, empty for the root.
    pub fn name(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }

    pub fn to_gs_url(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.path)
    }

    /// `/b/{bucket}/o/{path}` with both parts percent-encoded.
    pub fn full_server_url(&self) -> String {
        format!(
            "/b/{}/o/{}",
            utf8_percent_encode(&self.bucket, OBJECT_PATH),
            utf8_percent_encode(&self.path, OBJECT_PATH)
        )
    }

    /// Public URL serving the object's bytes, authorized by a download token.
    pub fn download_url(&self, host: &str, token: &str) -> StorageResult<String> {
        let base = format!("https://{host}/v0{}", self.full_server_url());
        let mut url = Url::parse(&base)
            .map_err(|err| invalid_argument(format!("Invalid storage host '{host}': {err}")))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }
}

fn canonical_path(path: &str) -> String {
    path.split('/')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
