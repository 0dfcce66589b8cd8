//! Slash-delimited addresses into Caddy's configuration tree.

use std::fmt;
use std::str::FromStr;

/// Normalized config tree path such as `/apps/http/servers/srv0`.
///
/// Always starts with `/`, never ends with one (except the root), and never
/// contains empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigPath(String);

impl ConfigPath {
    pub fn new(raw: &str) -> Self {
        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        Self(format!("/{}", segments.join("/")))
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one or more segments (`"servers/srv0"` is split on `/`).
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        Self::new(&format!("{}/{}", self.0, segment.as_ref()))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Every prefix of this path from the shortest to itself, root excluded.
    pub fn ancestors(&self) -> Vec<ConfigPath> {
        let mut current = ConfigPath::root();
        self.segments()
            .map(|segment| {
                current = current.join(segment);
                current.clone()
            })
            .collect()
    }

    /// Path on the admin API, e.g. `/config/apps/http`.
    pub fn api_path(&self) -> String {
        if self.is_root() {
            "/config/".to_string()
        } else {
            format!("/config{}", self.0)
        }
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ConfigPath {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&ConfigPath> for ConfigPath {
    fn from(path: &ConfigPath) -> Self {
        path.clone()
    }
}

impl FromStr for ConfigPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
