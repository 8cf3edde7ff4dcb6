//! Environment variable substitution

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for placeholders: `$$`, `${VAR_NAME}` or `$VAR_NAME`
static ENV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(\$)|\{([A-Z_][A-Z0-9_]*)\}|([A-Z_][A-Z0-9_]*))").unwrap()
});

/// Environment variable substitutor
pub struct EnvSubstitutor;

impl EnvSubstitutor {
    /// Substitute placeholders in `content` using `lookup`.
    ///
    /// Returns the distinct unbound names, in first-seen order, when any
    /// placeholder has no value.
    pub fn substitute(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, Vec<String>> {
        let mut unbound: Vec<String> = Vec::new();

        let result = ENV_PATTERN.replace_all(content, |cap: &regex::Captures<'_>| {
            if cap.get(1).is_some() {
                return "$".to_string();
            }
            let name = match cap.get(2).or_else(|| cap.get(3)) {
                Some(name) => name.as_str(),
                None => return String::new(),
            };
            match lookup(name) {
                Some(value) => value,
                None => {
                    if !unbound.iter().any(|n| n == name) {
                        unbound.push(name.to_string());
                    }
                    String::new()
                }
            }
        });

        if unbound.is_empty() {
            Ok(result.into_owned())
        } else {
            Err(unbound)
        }
    }

    /// Escape every `$` so the text survives a later substitution pass unchanged
    pub fn escape(value: &str) -> String {
        value.replace('$', "$$")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DOCKER_HOST", "tcp://10.0.2.1:2375"),
            ("TOKEN", "abcd"),
        ])
    }

    fn lookup(name: &str) -> Option<String> {
        vars().get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_substitute() {
        let result =
            EnvSubstitutor::substitute("local: $DOCKER_HOST\ntoken: ${TOKEN}x", lookup).unwrap();
        assert_eq!(result, "local: tcp://10.0.2.1:2375\ntoken: abcdx");
    }

    #[test]
    fn test_escape() {
        let result = EnvSubstitutor::substitute("cost: $$TOKEN", lookup).unwrap();
        assert_eq!(result, "cost: $TOKEN");
        assert_eq!(
            EnvSubstitutor::substitute(&EnvSubstitutor::escape("a$TOKEN$"), lookup).unwrap(),
            "a$TOKEN$"
        );
    }

    #[test]
    fn test_unbound_reported_once_per_name() {
        let unbound =
            EnvSubstitutor::substitute("$MISSING_ONE ${MISSING_ONE} $MISSING_TWO $TOKEN", lookup)
                .unwrap_err();
        assert_eq!(unbound, vec!["MISSING_ONE".to_string(), "MISSING_TWO".to_string()]);
    }
}
