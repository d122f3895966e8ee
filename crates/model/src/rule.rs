use crate::error::{ModelError, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `(cond:preferred)` segment of a rule
static ALTERNATIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^():]*):([^()]*)\)").expect("valid alternative regex"));

/// Compiled reference rule.
///
/// Grammar: a path of literal segments with at most one `(cond:preferred)`
/// alternative. `cond` is a regex fragment where a trailing `*` means "any
/// suffix"; `*` in literal segments matches within one segment and every
/// other literal character matches itself; a literal `.min` is optional.
/// Rules not starting with `/` match under any leading path.
///
/// ```text
/// jslibs/jquery/([1-3]*:3.1.1)/jquery.js
///   pattern:   ^(.*/)?jslibs/jquery/([1-3].*)/jquery\.js$
///   preferred: jslibs/jquery/3.1.1/jquery.js
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: Regex,
    preferred: String,
}

impl Rule {
    pub fn compile(rule: &str) -> Result<Self> {
        let source = rule.trim().to_string();
        let preferred = ALTERNATIVE
            .replacen(&source, 1, |caps: &Captures| caps[2].to_string())
            .into_owned();

        let alternative = ALTERNATIVE.captures(&source).and_then(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), condition_pattern(&caps[1])))
        });
        let (head, tail) = match &alternative {
            Some((start, end, _)) => (&source[..*start], &source[*end..]),
            None => (source.as_str(), ""),
        };
        if [head, tail].iter().any(|part| part.contains(['(', ')'])) {
            return Err(ModelError::InvalidRule {
                rule: source.clone(),
                reason: "unbalanced or repeated alternative group".to_string(),
            });
        }
        let body = match &alternative {
            Some((_, _, condition)) => format!(
                "{}({condition}){}",
                literal_pattern(head),
                literal_pattern(tail),
            ),
            None => literal_pattern(head),
        };
        let anchored = if source.starts_with('/') {
            format!("^{body}$")
        } else {
            format!("^(.*/)?{body}$")
        };

        let pattern = Regex::new(&anchored).map_err(|err| ModelError::InvalidRule {
            rule: source.clone(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            source,
            pattern,
            preferred,
        })
    }

    /// The rule as declared.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path rendered when no already-rendered alternative matches.
    #[must_use]
    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub fn has_alternative(&self) -> bool {
        ALTERNATIVE.is_match(&self.source)
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

fn literal_pattern(literal: &str) -> String {
    literal
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^/]*")
        .replace(r"\.min", r"(\.min)?")
}

fn condition_pattern(cond: &str) -> String {
    let escaped = cond.replace('.', r"\.");
    match escaped.strip_suffix('*') {
        Some(prefix) => format!("{prefix}.*"),
        None => escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_range_rule_compiles_to_pattern_and_preferred() {
        let rule = Rule::compile("jslibs/jquery/([1-3]*:3.1.1)/jquery.js").unwrap();
        assert_eq!(rule.preferred(), "jslibs/jquery/3.1.1/jquery.js");
        assert_eq!(
            rule.pattern().as_str(),
            r"^(.*/)?jslibs/jquery/([1-3].*)/jquery\.js$"
        );
        assert!(rule.has_alternative());
        assert!(rule.matches("/libs/jslibs/jquery/2.2.4/jquery.js"));
        assert!(rule.matches("jslibs/jquery/3.1.1/jquery.js"));
        assert!(!rule.matches("/libs/jslibs/jquery/4.0.0/jquery.js"));
        assert!(!rule.matches("/libs/jslibs/jquery/2.2.4/jquery.jsx"));
    }

    #[test]
    fn absolute_rule_is_anchored_at_root() {
        let rule = Rule::compile("/libs/app/main.js").unwrap();
        assert!(rule.matches("/libs/app/main.js"));
        assert!(!rule.matches("/apps/libs/app/main.js"));
    }

    #[test]
    fn min_suffix_is_optional() {
        let rule = Rule::compile("vendor/lib.min.js").unwrap();
        assert!(rule.matches("/apps/vendor/lib.js"));
        assert!(rule.matches("/apps/vendor/lib.min.js"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let rule = Rule::compile("vendor/Lib.js").unwrap();
        assert!(!rule.matches("/apps/vendor/lib.js"));
    }

    #[test]
    fn unbalanced_parentheses_are_a_configuration_error() {
        let err = Rule::compile("jslibs/jquery/([1-3]*:3.1.1/jquery.js").unwrap_err();
        assert!(matches!(err, ModelError::InvalidRule { .. }));
    }

    #[test]
    fn regex_characters_in_paths_match_literally() {
        let rule = Rule::compile("/libs/app/a+b.js").unwrap();
        assert!(rule.matches("/libs/app/a+b.js"));
        assert!(!rule.matches("/libs/app/aab.js"));

        let rule = Rule::compile("vendor/[legacy]/x$1{2}.js").unwrap();
        assert!(rule.matches("/apps/vendor/[legacy]/x$1{2}.js"));

        let rule = Rule::compile("vendor/what?/*.js").unwrap();
        assert!(rule.matches("/libs/vendor/what?/anything.js"));
        assert!(!rule.matches("/libs/vendor/what/anything.js"));
        assert!(!rule.matches("/libs/vendor/what?/deep/anything.js"));
    }

    #[test]
    fn second_alternative_group_is_rejected() {
        let err = Rule::compile("a/(1*:1)/b/(2*:2)/c.js").unwrap_err();
        assert!(matches!(err, ModelError::InvalidRule { .. }));
    }

    #[test]
    fn plain_rule_prefers_itself() {
        let rule = Rule::compile("css/site.css").unwrap();
        assert_eq!(rule.preferred(), "css/site.css");
        assert!(!rule.has_alternative());
    }
}
