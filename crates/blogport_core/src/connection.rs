use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

const HOST: &str = "Host";
const PORT: &str = "Port";
const USERNAME: &str = "Username";
const PASSWORD: &str = "Password";
const DATABASE: &str = "Database";

fn password_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(password|pwd)(\s*=\s*)([^;]+)(;?)").expect("static password pattern")
    })
}

/// Replaces the values of `password`/`pwd` keys in a rendered connection
/// string with `******`.
pub fn mask_connection_string(connection_string: &str) -> String {
    password_pattern()
        .replace_all(connection_string, "${1}${2}******${4}")
        .into_owned()
}

/// Ordered key/value connection parameters with case-insensitive keys.
///
/// Setting a key removes any earlier entry for it and appends the new one, so
/// the rendered string reflects the order in which values were last set.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    parameters: Vec<(String, String)>,
}

impl ConnectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `key=value;key=value`. Segments without `=` are ignored.
    pub fn parse(connection_string: &str) -> Self {
        let mut params = Self::new();
        for segment in connection_string.split(';') {
            if let Some((key, value)) = segment.split_once('=') {
                params.set(key.trim(), value.trim());
            }
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if key.is_empty() {
            return;
        }
        self.remove(&key);
        self.parameters.push((key, value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.parameters.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }

    /// Sets `key` when `value` is present, removes it otherwise.
    pub fn set_optional(&mut self, key: &str, value: Option<impl Into<String>>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn host(&self) -> Option<&str> {
        self.get(HOST)
    }

    pub fn set_host(&mut self, host: Option<impl Into<String>>) {
        self.set_optional(HOST, host);
    }

    /// Port as a number; a value that does not parse is treated as unset.
    pub fn port(&self) -> Option<u16> {
        self.get(PORT).and_then(|p| p.trim().parse().ok())
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        self.set_optional(PORT, port.map(|p| p.to_string()));
    }

    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME)
    }

    pub fn set_username(&mut self, username: Option<impl Into<String>>) {
        self.set_optional(USERNAME, username);
    }

    pub fn password(&self) -> Option<&str> {
        self.get(PASSWORD)
    }

    pub fn set_password(&mut self, password: Option<impl Into<String>>) {
        self.set_optional(PASSWORD, password);
    }

    pub fn database(&self) -> Option<&str> {
        self.get(DATABASE)
    }

    pub fn set_database(&mut self, database: Option<impl Into<String>>) {
        self.set_optional(DATABASE, database);
    }

    /// A relational source needs at least a host and a database name.
    pub fn is_configured(&self) -> bool {
        self.host().is_some_and(|h| !h.is_empty()) && self.database().is_some_and(|d| !d.is_empty())
    }

    pub fn to_connection_string(&self, mask_password: bool) -> String {
        let rendered = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";");
        if mask_password {
            mask_connection_string(&rendered)
        } else {
            rendered
        }
    }
}

/// Debug output never shows the password.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionParams")
            .field(&self.to_connection_string(true))
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_connection_string(true))
    }
}
