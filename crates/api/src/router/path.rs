//! Route template compilation.
//!
//! A template such as `/items/{id}/tags/{tag}` becomes an anchored regex with one positional group per
//! `{token}`; each group takes the pattern of the parameter's declared type. Literal text is escaped, and
//! trailing slashes are ignored on both the template and the matched path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RouteError;
use crate::param::ParameterSpec;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([\w-]*)\}").expect("token regex is valid"));

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compiles `template`, typing each token by the parameter of the same name.
    pub fn compile(template: &str, params: &[ParameterSpec]) -> Result<Self, RouteError> {
        let trimmed = template.trim_end_matches('/');
        let mut pattern = String::from("^");
        let mut names = Vec::new();
        let mut last = 0;

        for captures in TOKEN.captures_iter(trimmed) {
            let (Some(token), Some(name)) = (captures.get(0), captures.get(1)) else { continue };
            let name = name.as_str();

            let param = params.iter().find(|param| param.name() == name).ok_or_else(|| {
                RouteError::MissingPathParameter { template: template.to_owned(), name: name.to_owned() }
            })?;
            let value_type = param.kind().value_type().ok_or_else(|| RouteError::UnsupportedPathType {
                template: template.to_owned(),
                name: name.to_owned(),
            })?;

            pattern.push_str(&regex::escape(&trimmed[last..token.start()]));
            pattern.push('(');
            pattern.push_str(value_type.pattern());
            pattern.push(')');
            names.push(name.to_owned());
            last = token.end();
        }
        pattern.push_str(&regex::escape(&trimmed[last..]));
        pattern.push('$');

        let regex = Regex::new(&pattern)
            .map_err(|e| RouteError::InvalidPattern { template: template.to_owned(), reason: e.to_string() })?;
        Ok(Self { template: template.to_owned(), regex, names })
    }

    /// Matches a request path, returning each token's raw value
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<(&str, &'p str)>> {
        let captures = self.regex.captures(path.trim_end_matches('/'))?;
        let values = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| captures.get(i + 1).map(|value| (name.as_str(), value.as_str())))
            .collect();
        Some(values)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled regex source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Param;

    #[test]
    fn compile_typed_tokens() {
        let params = [Param::int("id"), Param::float("weight"), Param::string("tag")];
        let pattern = PathPattern::compile("/items/{id}/{weight}/{tag}/", &params).unwrap();

        assert_eq!(pattern.as_str(), r"^/items/([0-9]+)/([0-9]+(?:\.[0-9]*)?)/([^/\s]+)$");
        assert_eq!(pattern.names(), ["id", "weight", "tag"]);
        assert_eq!(pattern.template(), "/items/{id}/{weight}/{tag}/");
    }

    #[test]
    fn match_paths() {
        let pattern = PathPattern::compile("/items/{id}", &[Param::int("id")]).unwrap();

        assert_eq!(pattern.captures("/items/42"), Some(vec![("id", "42")]));
        assert_eq!(pattern.captures("/items/42/"), Some(vec![("id", "42")]));
        assert_eq!(pattern.captures("/items/abc"), None);
        assert_eq!(pattern.captures("/items/42/extra"), None);
        assert_eq!(pattern.captures("/prefix/items/42"), None);
    }

    #[test]
    fn numbers_are_ascii_digits() {
        let pattern = PathPattern::compile("/items/{id}/{weight}", &[Param::int("id"), Param::float("weight")]).unwrap();

        assert_eq!(pattern.captures("/items/7/2.5"), Some(vec![("id", "7"), ("weight", "2.5")]));
        assert_eq!(pattern.captures("/items/\u{664}\u{662}/2.5"), None);
        assert_eq!(pattern.captures("/items/7/\u{663}.5"), None);
    }

    #[test]
    fn literals_are_escaped() {
        let pattern = PathPattern::compile("/v1.0/items", &[]).unwrap();
        assert!(pattern.captures("/v1.0/items").is_some());
        assert!(pattern.captures("/v1x0/items").is_none());
    }

    #[test]
    fn root_template() {
        let pattern = PathPattern::compile("/", &[]).unwrap();
        assert_eq!(pattern.captures("/"), Some(vec![]));
        assert_eq!(pattern.captures(""), Some(vec![]));
        assert_eq!(pattern.captures("/items"), None);
    }

    #[test]
    fn undeclared_token() {
        let error = PathPattern::compile("/items/{id}", &[Param::int("item_id")]).unwrap_err();
        assert_eq!(error, RouteError::MissingPathParameter { template: "/items/{id}".into(), name: "id".into() });
    }

    #[test]
    fn unsupported_token_type() {
        let error = PathPattern::compile("/items/{body}", &[Param::raw_body("body")]).unwrap_err();
        assert!(matches!(error, RouteError::UnsupportedPathType { name, .. } if name == "body"));
    }
}
