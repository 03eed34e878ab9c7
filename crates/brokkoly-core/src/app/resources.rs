//! Static assets for the schema page (`brokkoly.js`).
//!
//! 配布されたバイナリではコンパイル時に埋め込んだアセットを返し、
//! ソースツリーから動かす場合は `static_dir` を設定するとディスクから読みます。

use std::path::PathBuf;

use tracing::debug;

/// Assets compiled into the binary.
const EMBEDDED: &[(&str, &[u8])] = &[(
    "brokkoly.js",
    include_bytes!("../../resources/brokkoly.js"),
)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    dir: Option<PathBuf>,
}

impl StaticResources {
    /// Serve only the embedded assets.
    pub fn embedded() -> Self {
        Self { dir: None }
    }

    /// Serve from `dir` first, falling back to the embedded assets.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub async fn load(&self, name: &str) -> Option<Resource> {
        if !is_plain_name(name) {
            return None;
        }

        if let Some(dir) = &self.dir {
            match tokio::fs::read(dir.join(name)).await {
                Ok(bytes) => {
                    return Some(Resource {
                        content_type: content_type(name),
                        bytes,
                    });
                }
                Err(e) => debug!(resource = name, dir = %dir.display(), error = %e, "not on disk"),
            }
        }

        EMBEDDED
            .iter()
            .find(|(embedded, _)| *embedded == name)
            .map(|(_, bytes)| Resource {
                content_type: content_type(name),
                bytes: bytes.to_vec(),
            })
    }
}

/// A single path segment: no separators, no parent references, no hidden files.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

pub fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
