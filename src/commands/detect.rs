use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screen metrics reported by the client, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ScreenSize {
    type Err = String;

    /// Parses `"1920x1080"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got \"{s}\""))?;
        let width = w.trim().parse().map_err(|_| format!("Invalid width \"{w}\""))?;
        let height = h.trim().parse().map_err(|_| format!("Invalid height \"{h}\""))?;
        Ok(Self { width, height })
    }
}

/// A browser family rule. `version_token` is the agent prefix the major version follows.
struct BrowserRule {
    matches: fn(&str) -> bool,
    label: &'static str,
    version_token: &'static str,
}

/// Evaluated in order, first match wins. Edge and Chrome both advertise
/// `Chrome`, and Chrome also advertises `Safari`, so the exclusions matter.
const BROWSER_RULES: &[BrowserRule] = &[
    BrowserRule {
        matches: |ua| ua.contains("Chrome") && !ua.contains("Edg"),
        label: "Chrome",
        version_token: "Chrome/",
    },
    BrowserRule {
        matches: |ua| ua.contains("Firefox"),
        label: "Firefox",
        version_token: "Firefox/",
    },
    BrowserRule {
        matches: |ua| ua.contains("Safari") && !ua.contains("Chrome"),
        label: "Safari",
        version_token: "Version/",
    },
    BrowserRule {
        matches: |ua| ua.contains("Edg"),
        label: "Edge",
        version_token: "Edg/",
    },
];

/// Mobile markers come first: Android agents also say `Linux`, iOS agents say `Mac OS X`.
const DEVICE_RULES: &[(&str, &str)] = &[
    ("iPhone", "iPhone"),
    ("iPad", "iPad"),
    ("Android", "Android"),
    ("Windows", "Windows"),
    ("Mac", "Mac"),
    ("Linux", "Linux"),
];

/// Browser family plus major version, e.g. `"Chrome 120"`. `"Unknown"` when no rule matches.
pub fn detect_browser(user_agent: &str) -> String {
    let Some(rule) = BROWSER_RULES.iter().find(|r| (r.matches)(user_agent)) else {
        return "Unknown".to_string();
    };
    match major_version(user_agent, rule.version_token) {
        Some(version) => format!("{} {version}", rule.label),
        None => rule.label.to_string(),
    }
}

/// Device class, with the resolution appended when known: `"Windows (1920x1080)"`.
pub fn detect_device(user_agent: &str, screen: Option<ScreenSize>) -> String {
    let label = DEVICE_RULES
        .iter()
        .find(|(marker, _)| user_agent.contains(marker))
        .map(|(_, label)| *label)
        .unwrap_or("Desktop");

    match screen {
        Some(size) => format!("{label} ({size})"),
        None => label.to_string(),
    }
}

/// Digits immediately after `token`, e.g. `"120"` from `"Chrome/120.0.6099.71"`.
fn major_version(user_agent: &str, token: &str) -> Option<String> {
    let start = user_agent.find(token)? + token.len();
    let digits: String = user_agent[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.71 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.61";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.43 Mobile Safari/537.36";

    #[test]
    fn test_browser_rules_in_order() {
        assert_eq!(detect_browser(CHROME_WIN), "Chrome 120");
        assert_eq!(detect_browser(EDGE_WIN), "Edge 120");
        assert_eq!(detect_browser(FIREFOX_LINUX), "Firefox 121");
        assert_eq!(detect_browser(SAFARI_IPHONE), "Safari 17");
        assert_eq!(detect_browser("curl/8.4.0"), "Unknown");
        assert_eq!(detect_browser(""), "Unknown");
    }

    #[test]
    fn test_browser_without_version() {
        assert_eq!(detect_browser("SomeFirefox build"), "Firefox");
    }

    #[test]
    fn test_device_prefers_mobile_markers() {
        assert_eq!(detect_device(SAFARI_IPHONE, None), "iPhone");
        assert_eq!(detect_device(CHROME_ANDROID, None), "Android");
        assert_eq!(detect_device(FIREFOX_LINUX, None), "Linux");
        assert_eq!(detect_device(CHROME_WIN, None), "Windows");
        assert_eq!(detect_device("curl/8.4.0", None), "Desktop");
    }

    #[test]
    fn test_device_appends_resolution() {
        let screen = ScreenSize {
            width: 1920,
            height: 1080,
        };
        assert_eq!(detect_device(CHROME_WIN, Some(screen)), "Windows (1920x1080)");
    }

    #[test]
    fn test_parse_screen_size() {
        assert_eq!(
            "390x844".parse::<ScreenSize>().unwrap(),
            ScreenSize {
                width: 390,
                height: 844
            }
        );
        assert!("wide".parse::<ScreenSize>().is_err());
        assert!("100x".parse::<ScreenSize>().is_err());
    }
}
