/// Selector that switches a request to the minified variant.
pub const MIN_SELECTOR: &str = "min";

/// Request path split the way the content platform does it:
/// `{resource_path}.{selectors...}.{extension}{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestPathInfo {
    pub resource_path: String,
    pub selectors: Vec<String>,
    pub extension: Option<String>,
    pub suffix: String,
}

impl RequestPathInfo {
    /// Split `path` at the first dot that ends a known resource.
    ///
    /// `exists(resource, extension)` is asked for every dot from left to
    /// right; the first candidate it accepts wins. When no candidate is
    /// accepted the first dot of the path is used.
    pub fn parse(path: &str, exists: impl Fn(&str, &str) -> bool) -> Self {
        let dots: Vec<usize> = path.match_indices('.').map(|(idx, _)| idx).collect();
        let Some(&first) = dots.first() else {
            return Self {
                resource_path: path.to_string(),
                ..Self::default()
            };
        };

        let chosen = dots
            .iter()
            .copied()
            .find(|&dot| {
                let info = Self::split_at(path, dot);
                info.extension
                    .as_deref()
                    .is_some_and(|ext| exists(&info.resource_path, ext))
            })
            .unwrap_or(first);
        Self::split_at(path, chosen)
    }

    fn split_at(path: &str, dot: usize) -> Self {
        let resource_path = path[..dot].to_string();
        let rest = &path[dot + 1..];
        let (dotted, suffix) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, ""),
        };
        let mut parts: Vec<String> = dotted
            .split('.')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let extension = parts.pop();
        Self {
            resource_path,
            selectors: parts,
            extension,
            suffix: suffix.to_string(),
        }
    }

    #[must_use]
    pub fn is_minified(&self) -> bool {
        is_minified(&self.selectors)
    }
}

/// True when the selector list asks for the minified variant.
#[must_use]
pub fn is_minified(selectors: &[String]) -> bool {
    selectors.iter().any(|s| s == MIN_SELECTOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nothing_exists(_: &str, _: &str) -> bool {
        false
    }

    #[test]
    fn category_request_splits_into_selectors_and_suffix() {
        let info = RequestPathInfo::parse(
            "/bin/public/clientlibs.min.js/a1b2c3/mybundle.js",
            nothing_exists,
        );
        assert_eq!(info.resource_path, "/bin/public/clientlibs");
        assert_eq!(info.selectors, vec!["min".to_string()]);
        assert_eq!(info.extension.as_deref(), Some("js"));
        assert_eq!(info.suffix, "/a1b2c3/mybundle.js");
        assert!(info.is_minified());
    }

    #[test]
    fn direct_request_without_suffix() {
        let info = RequestPathInfo::parse("/apps/site/clientlib.css", nothing_exists);
        assert_eq!(info.resource_path, "/apps/site/clientlib");
        assert!(info.selectors.is_empty());
        assert_eq!(info.extension.as_deref(), Some("css"));
        assert_eq!(info.suffix, "");
        assert!(!info.is_minified());
    }

    #[test]
    fn known_resource_wins_over_first_dot() {
        let info = RequestPathInfo::parse("/libs/jquery/3.1.1/jquery.min.js", |res, ext| {
            res == "/libs/jquery/3.1.1/jquery" && ext == "js"
        });
        assert_eq!(info.resource_path, "/libs/jquery/3.1.1/jquery");
        assert_eq!(info.selectors, vec!["min".to_string()]);
        assert_eq!(info.extension.as_deref(), Some("js"));
    }

    #[test]
    fn path_without_dot_has_no_extension() {
        let info = RequestPathInfo::parse("/apps/site/clientlib", nothing_exists);
        assert_eq!(info.resource_path, "/apps/site/clientlib");
        assert_eq!(info.extension, None);
    }
}
