use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset type a clientlib renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientlibType {
    Link,
    Css,
    Js,
    Img,
}

impl ClientlibType {
    pub const ALL: [ClientlibType; 4] = [Self::Link, Self::Css, Self::Js, Self::Img];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Css => "css",
            Self::Js => "js",
            Self::Img => "img",
        }
    }

    /// File extension appended to rendered paths; `img` and `link` keep
    /// their paths untouched.
    #[must_use]
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::Css => Some("css"),
            Self::Js => Some("js"),
            Self::Link | Self::Img => None,
        }
    }

    /// Types that are combined into a single served bundle.
    #[must_use]
    pub fn is_bundled(self) -> bool {
        self.extension().is_some()
    }

    /// Bundle type for a request extension (`css`, `js`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "css" => Some(Self::Css),
            "js" => Some(Self::Js),
            _ => None,
        }
    }
}

impl fmt::Display for ClientlibType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
