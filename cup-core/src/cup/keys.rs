//! `ctrl+shift+p`-style key combo parsing and OS dispatch.
//!
//! Grounded in `tests/test_actions.py::TestParseCombo`'s 13 fixtures:
//! `+`-separated, case-insensitive, whitespace-tolerant, empty parts
//! ignored, `return`/`esc`/`win`/`cmd` aliased, modifier order preserved.

use crate::errors::WindowsMcpError;
use crate::input::send_hotkey_raw;

const MODIFIERS: &[&str] = &["ctrl", "alt", "shift", "meta"];

fn normalize_token(token: &str) -> String {
    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "return" => "enter".to_string(),
        "esc" => "escape".to_string(),
        "win" | "cmd" => "meta".to_string(),
        other => other.to_string(),
    }
}

/// Parse a combo string like `"ctrl+shift+p"` into `(modifiers, keys)`.
/// Modifiers preserve the order they appeared in; non-modifier tokens
/// (including function keys and single characters) are collected as
/// `keys` in their original order. Whitespace around `+` and around the
/// whole string is stripped; doubled `+` separators yield empty parts
/// that are silently dropped.
pub fn parse_combo(combo: &str) -> (Vec<String>, Vec<String>) {
    let mut modifiers = Vec::new();
    let mut keys = Vec::new();

    for raw in combo.split('+') {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let token = normalize_token(trimmed);
        if MODIFIERS.contains(&token.as_str()) {
            if !modifiers.contains(&token) {
                modifiers.push(token);
            }
        } else {
            keys.push(token);
        }
    }

    (modifiers, keys)
}

/// Map a canonical key/modifier name to its Win32 virtual-key code.
/// Single ASCII letters and digits map to their own character code,
/// matching `SendInput`'s convention that VK_A..VK_Z and VK_0..VK_9
/// equal the ASCII codes of 'A'..'Z' and '0'..'9'.
fn vk_for_key(key: &str) -> Option<u16> {
    if key.len() == 1 {
        let c = key.chars().next().unwrap().to_ascii_uppercase();
        if c.is_ascii_alphanumeric() {
            return Some(c as u16);
        }
    }
    if let Some(n) = key.strip_prefix('f') {
        if let Ok(n) = n.parse::<u16>() {
            if (1..=24).contains(&n) {
                return Some(0x70 + (n - 1));
            }
        }
    }
    Some(match key {
        "ctrl" => 0x11,
        "alt" => 0x12,
        "shift" => 0x10,
        "meta" => 0x5B,
        "enter" => 0x0D,
        "escape" => 0x1B,
        "tab" => 0x09,
        "space" => 0x20,
        "backspace" => 0x08,
        "delete" => 0x2E,
        "insert" => 0x2D,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" => 0x21,
        "pagedown" => 0x22,
        "up" => 0x26,
        "down" => 0x28,
        "left" => 0x25,
        "right" => 0x27,
        _ => return None,
    })
}

/// Render `(modifiers, keys)` back into a `"+"`-joined combo string, the
/// inverse of [`parse_combo`] up to alias normalization: `render_combo` never
/// reintroduces `return`/`esc`/`win`/`cmd` since `parse_combo` already
/// canonicalized those away, so `parse_combo(&render_combo(m, k)) == (m, k)`
/// holds for any `(m, k)` that `parse_combo` could have produced.
pub fn render_combo(modifiers: &[String], keys: &[String]) -> String {
    modifiers.iter().chain(keys.iter()).cloned().collect::<Vec<_>>().join("+")
}

/// Parse and immediately dispatch a combo as OS input events, generalizing
/// [`send_hotkey_raw`]'s press-all-then-release-reverse pattern to consume
/// the parser's canonical `(modifiers, keys)` tuple.
pub fn press_combo(combo: &str) -> Result<(), WindowsMcpError> {
    let (modifiers, keys) = parse_combo(combo);
    let mut vk_codes = Vec::with_capacity(modifiers.len() + keys.len());
    for name in modifiers.iter().chain(keys.iter()) {
        let vk = vk_for_key(name)
            .ok_or_else(|| WindowsMcpError::InputError(format!("unknown key: {name}")))?;
        vk_codes.push(vk);
    }
    send_hotkey_raw(&vk_codes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key() {
        let (mods, keys) = parse_combo("enter");
        assert!(mods.is_empty());
        assert_eq!(keys, vec!["enter"]);
    }

    #[test]
    fn single_character() {
        let (mods, keys) = parse_combo("a");
        assert!(mods.is_empty());
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn modifier_plus_key() {
        let (mods, keys) = parse_combo("ctrl+s");
        assert_eq!(mods, vec!["ctrl"]);
        assert_eq!(keys, vec!["s"]);
    }

    #[test]
    fn multiple_modifiers_preserve_order() {
        let (mods, keys) = parse_combo("ctrl+shift+p");
        assert_eq!(mods, vec!["ctrl", "shift"]);
        assert_eq!(keys, vec!["p"]);
    }

    #[test]
    fn alias_return() {
        let (_, keys) = parse_combo("return");
        assert_eq!(keys, vec!["enter"]);
    }

    #[test]
    fn alias_esc() {
        let (_, keys) = parse_combo("esc");
        assert_eq!(keys, vec!["escape"]);
    }

    #[test]
    fn alias_win() {
        let (mods, keys) = parse_combo("win+e");
        assert_eq!(mods, vec!["meta"]);
        assert_eq!(keys, vec!["e"]);
    }

    #[test]
    fn alias_cmd() {
        let (mods, keys) = parse_combo("cmd+c");
        assert_eq!(mods, vec!["meta"]);
        assert_eq!(keys, vec!["c"]);
    }

    #[test]
    fn spaces_in_combo_are_trimmed() {
        let (mods, keys) = parse_combo(" ctrl + s ");
        assert_eq!(mods, vec!["ctrl"]);
        assert_eq!(keys, vec!["s"]);
    }

    #[test]
    fn empty_parts_are_ignored() {
        let (mods, keys) = parse_combo("ctrl++s");
        assert_eq!(mods, vec!["ctrl"]);
        assert_eq!(keys, vec!["s"]);
    }

    #[test]
    fn function_key_passes_through() {
        let (mods, keys) = parse_combo("f5");
        assert!(mods.is_empty());
        assert_eq!(keys, vec!["f5"]);
    }

    #[test]
    fn alt_f4() {
        let (mods, keys) = parse_combo("alt+f4");
        assert_eq!(mods, vec!["alt"]);
        assert_eq!(keys, vec!["f4"]);
    }

    #[test]
    fn case_insensitive() {
        let (mods, keys) = parse_combo("CTRL+SHIFT+P");
        assert_eq!(mods, vec!["ctrl", "shift"]);
        assert_eq!(keys, vec!["p"]);
    }

    #[test]
    fn render_combo_round_trips_through_parse_combo() {
        for combo in ["ctrl+shift+p", "alt+f4", "enter", "meta+e", "a"] {
            let (mods, keys) = parse_combo(combo);
            let rendered = render_combo(&mods, &keys);
            assert_eq!(parse_combo(&rendered), (mods, keys));
        }
    }

    #[test]
    fn render_combo_normalizes_aliases_before_rendering() {
        let (mods, keys) = parse_combo("cmd+return");
        assert_eq!(render_combo(&mods, &keys), "meta+enter");
    }
}
