//! Keyboard key names
//!
//! Key commands only accept names from a closed set. The set is fixed at
//! compile time so an unknown name is rejected when a command is built,
//! never when it is replayed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unsupported key name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0}")]
pub struct UnknownKey(pub String);

macro_rules! keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A keyboard key that can be pressed or released by a script
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Key {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl Key {
            /// Every supported key, in display order
            pub const ALL: &'static [Key] = &[$(Key::$variant),+];

            /// The stable name used in script files
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Key::$variant => $name,)+
                }
            }
        }

        impl FromStr for Key {
            type Err = UnknownKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Key::$variant),)+
                    other => Err(UnknownKey(other.to_string())),
                }
            }
        }
    };
}

keys! {
    Backspace => "backspace",
    Tab => "tab",
    Enter => "enter",
    Shift => "shift",
    Ctrl => "ctrl",
    Alt => "alt",
    Pause => "pause",
    CapsLock => "caps_lock",
    Esc => "esc",
    Space => "space",
    PageUp => "page_up",
    PageDown => "page_down",
    End => "end",
    Home => "home",
    Left => "left",
    Up => "up",
    Right => "right",
    Down => "down",
    Insert => "insert",
    Delete => "delete",
    Key0 => "key_0",
    Key1 => "key_1",
    Key2 => "key_2",
    Key3 => "key_3",
    Key4 => "key_4",
    Key5 => "key_5",
    Key6 => "key_6",
    Key7 => "key_7",
    Key8 => "key_8",
    Key9 => "key_9",
    A => "a",
    B => "b",
    C => "c",
    D => "d",
    E => "e",
    F => "f",
    G => "g",
    H => "h",
    I => "i",
    J => "j",
    K => "k",
    L => "l",
    M => "m",
    N => "n",
    O => "o",
    P => "p",
    Q => "q",
    R => "r",
    S => "s",
    T => "t",
    U => "u",
    V => "v",
    W => "w",
    X => "x",
    Y => "y",
    Z => "z",
    Numpad0 => "numpad_0",
    Numpad1 => "numpad_1",
    Numpad2 => "numpad_2",
    Numpad3 => "numpad_3",
    Numpad4 => "numpad_4",
    Numpad5 => "numpad_5",
    Numpad6 => "numpad_6",
    Numpad7 => "numpad_7",
    Numpad8 => "numpad_8",
    Numpad9 => "numpad_9",
    Multiply => "multiply",
    Add => "add",
    Subtract => "subtract",
    Decimal => "decimal",
    Divide => "divide",
    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    F11 => "f11",
    F12 => "f12",
    NumLock => "num_lock",
    ScrollLock => "scroll_lock",
    LeftShift => "left_shift",
    RightShift => "right_shift",
    LeftCtrl => "left_ctrl",
    RightCtrl => "right_ctrl",
    LeftAlt => "left_alt",
    RightAlt => "right_alt",
    Menu => "menu",
    PrintScreen => "print_screen",
    LeftBracket => "left_bracket",
    RightBracket => "right_bracket",
    Semicolon => "semicolon",
    Comma => "comma",
    Period => "period",
    Quote => "quote",
    ForwardSlash => "forward_slash",
    BackSlash => "back_slash",
    Equal => "equal",
    Hyphen => "hyphen",
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_names_round_trip() {
        for key in Key::ALL {
            assert_eq!(key.as_str().parse::<Key>(), Ok(*key));
        }
    }

    #[test]
    fn test_key_names_are_unique() {
        let names: HashSet<_> = Key::ALL.iter().map(Key::as_str).collect();
        assert_eq!(names.len(), Key::ALL.len());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert_eq!(
            "hyper".parse::<Key>(),
            Err(UnknownKey("hyper".to_string()))
        );
        // Names are case sensitive, as written by the recorder
        assert!("Enter".parse::<Key>().is_err());
    }

    #[test]
    fn test_key_serde_uses_stable_name() {
        let json = serde_json::to_value(Key::PageUp).unwrap();
        assert_eq!(json, serde_json::json!("page_up"));

        let key: Key = serde_json::from_value(serde_json::json!("numpad_7")).unwrap();
        assert_eq!(key, Key::Numpad7);
    }
}
