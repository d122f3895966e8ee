use clientlib_model::{ClientlibType, Link, LinkTarget, REL_PROPERTY};

/// Maps repository paths to public URLs
pub trait UrlMapper: Send + Sync {
    fn map(&self, path: &str) -> String;
}

/// Prepends a context path; the empty prefix is the identity mapping.
#[derive(Debug, Clone, Default)]
pub struct PrefixMapper {
    prefix: String,
}

impl PrefixMapper {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl UrlMapper for PrefixMapper {
    fn map(&self, path: &str) -> String {
        if self.prefix.is_empty() || !path.starts_with('/') {
            return path.to_string();
        }
        format!("{}{}", self.prefix, path)
    }
}

/// Renders links as HTML tags.
pub struct LinkRenderer<'a> {
    mapper: Option<&'a dyn UrlMapper>,
}

impl<'a> LinkRenderer<'a> {
    /// `mapper` is applied to tree links only; external URIs are emitted verbatim.
    pub fn new(mapper: Option<&'a dyn UrlMapper>) -> Self {
        Self { mapper }
    }

    #[must_use]
    pub fn url(&self, link: &Link) -> String {
        let url = link.url();
        match (self.mapper, link.target()) {
            (Some(mapper), LinkTarget::Resource | LinkTarget::Category { .. }) => mapper.map(&url),
            _ => url,
        }
    }

    /// Tag for `link`; images have no tag form.
    #[must_use]
    pub fn tag(&self, link: &Link) -> Option<String> {
        let url = escape_attr(&self.url(link));
        let extra: String = link
            .properties()
            .iter()
            .filter(|(name, _)| *name != REL_PROPERTY)
            .map(|(name, value)| format!(" {}=\"{}\"", escape_attr(name), escape_attr(value)))
            .collect();
        match link.kind() {
            ClientlibType::Js => Some(format!(
                "<script type=\"text/javascript\" src=\"{url}\"{extra}></script>"
            )),
            ClientlibType::Css => Some(format!(
                "<link rel=\"stylesheet\" href=\"{url}\" type=\"text/css\"{extra}>"
            )),
            ClientlibType::Link => {
                let rel = link.properties().get(REL_PROPERTY).unwrap_or("preload");
                Some(format!(
                    "<link rel=\"{}\" href=\"{url}\"{extra}>",
                    escape_attr(rel)
                ))
            }
            ClientlibType::Img => None,
        }
    }
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientlib_model::Properties;

    #[test]
    fn script_and_stylesheet_tags() {
        let renderer = LinkRenderer::new(None);
        let js = Link::resource(ClientlibType::Js, "/libs/app", Properties::new(), true)
            .with_hash("abc");
        assert_eq!(
            renderer.tag(&js).unwrap(),
            "<script type=\"text/javascript\" src=\"/libs/app.min.js/abc/app.min.js\"></script>"
        );
        let css = Link::category(
            ClientlibType::Css,
            "/bin/public/clientlibs",
            "site",
            Properties::new(),
            false,
        );
        assert_eq!(
            renderer.tag(&css).unwrap(),
            "<link rel=\"stylesheet\" href=\"/bin/public/clientlibs.css/site.css\" type=\"text/css\">"
        );
    }

    #[test]
    fn prefix_mapper_skips_external_uris() {
        let mapper = PrefixMapper::new("/ctx");
        let renderer = LinkRenderer::new(Some(&mapper));
        let local = Link::resource(ClientlibType::Js, "/libs/a.js", Properties::new(), false);
        let external = Link::external(
            ClientlibType::Js,
            "https://cdn.example.com/x.js",
            Properties::new(),
        );
        assert_eq!(renderer.url(&local), "/ctx/libs/a.js");
        assert_eq!(renderer.url(&external), "https://cdn.example.com/x.js");
    }

    #[test]
    fn link_type_uses_rel_and_escapes_attributes() {
        let mut props = Properties::new();
        props.insert("rel", "Pre Connect");
        props.insert("title", "a \"b\" & <c>");
        let link = Link::external(ClientlibType::Link, "//fonts.example.com", props);
        assert_eq!(
            LinkRenderer::new(None).tag(&link).unwrap(),
            "<link rel=\"pre connect\" href=\"//fonts.example.com\" title=\"a &quot;b&quot; &amp; &lt;c&gt;\">"
        );
    }

    #[test]
    fn images_have_no_tag() {
        let img = Link::resource(ClientlibType::Img, "/libs/logo.png", Properties::new(), false);
        assert!(LinkRenderer::new(None).tag(&img).is_none());
    }
}
