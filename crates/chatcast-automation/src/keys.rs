//! Key chord parsing for `sendKeys`.

use serde::Serialize;

/// A parsed chord such as `Ctrl+Shift+Enter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStroke {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
    pub alt: bool,
}

impl KeyStroke {
    /// Modifiers are detected by substring; the key is the last `+` part.
    pub fn parse(keys: &str) -> Self {
        let key = if keys.contains('+') {
            keys.rsplit('+').next().unwrap_or("")
        } else {
            keys
        };
        let key_code = if key == "Enter" { 13 } else { 0 };
        Self {
            key: key.to_string(),
            code: key.to_string(),
            key_code,
            ctrl: keys.contains("Ctrl"),
            shift: keys.contains("Shift"),
            meta: keys.contains("Meta") || keys.contains("Command"),
            alt: keys.contains("Alt"),
        }
    }

    /// `keyup` is only sent for chords.
    pub fn has_modifiers(&self) -> bool {
        self.ctrl || self.shift || self.meta || self.alt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_enter() {
        let k = KeyStroke::parse("Enter");
        assert_eq!(k.key, "Enter");
        assert_eq!(k.code, "Enter");
        assert_eq!(k.key_code, 13);
        assert!(!k.has_modifiers());
    }

    #[test]
    fn test_chord() {
        let k = KeyStroke::parse("Ctrl+Shift+Enter");
        assert_eq!(k.key, "Enter");
        assert!(k.ctrl && k.shift);
        assert!(!k.meta && !k.alt);
        assert!(k.has_modifiers());
    }

    #[test]
    fn test_command_is_meta() {
        let k = KeyStroke::parse("Command+k");
        assert!(k.meta);
        assert_eq!(k.key, "k");
        assert_eq!(k.key_code, 0);
    }

    #[test]
    fn test_trailing_plus_gives_empty_key() {
        let k = KeyStroke::parse("Alt+");
        assert_eq!(k.key, "");
        assert!(k.alt);
    }
}
