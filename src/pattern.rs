// SPDX-License-Identifier: Apache-2.0 OR MIT
// Pattern rendering: token substitution and the {json} record shape

use crate::event::LogEvent;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::SystemTime;

/// Special pattern that switches a sink to structured JSON-line output
pub const JSON_PATTERN: &str = "{json}";

/// Render one event against a pattern.
///
/// Tokens are replaced literally and non-overlappingly in a single pass;
/// unknown tokens (and stray braces) pass through untouched. Token-shaped
/// text inside substituted values is never re-scanned.
pub(crate) fn render(pattern: &str, event: &LogEvent) -> String {
    if pattern == JSON_PATTERN {
        return render_json(event);
    }

    let mut out = String::with_capacity(pattern.len() + event.payload.len() + 32);
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let inner = &tail[1..];
        match (inner.find('}'), inner.find('{')) {
            // A second '{' before any '}': this one cannot start a token.
            (Some(close), Some(next_open)) if next_open < close => {
                out.push('{');
                rest = inner;
            }
            (Some(close), _) => {
                let token = &tail[..close + 2];
                if !append_token(&mut out, token, event) {
                    out.push_str(token);
                }
                rest = &tail[close + 2..];
            }
            (None, _) => {
                out.push_str(tail);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Append the rendered form of a known token; false if the token is unknown.
/// Absent captures render as the empty string.
fn append_token(out: &mut String, token: &str, e: &LogEvent) -> bool {
    match token {
        "{ts}" => out.push_str(&timestamp_string(e.ts)),
        "{date}" => out.push_str(&date_string(e.ts)),
        "{time}" => out.push_str(&time_string(e.ts)),
        "{ms}" => {
            if let Some(ts) = e.ts {
                let _ = write!(out, "{:03}", millis_of_second(ts));
            }
        }
        "{lvl}" => out.push_str(e.level.as_str()),
        "{tid}" => {
            if let Some(tid) = e.tid {
                let _ = write!(out, "{tid}");
            }
        }
        "{name}" => out.push_str(&e.name),
        "{msg}" => out.push_str(&e.payload),
        "{file}" => out.push_str(e.loc.file),
        "{line}" => {
            if e.loc.is_known() {
                let _ = write!(out, "{}", e.loc.line);
            }
        }
        "{func}" => out.push_str(e.loc.func),
        _ => return false,
    }
    true
}

/// One-line JSON record. Field order here is the wire order; compact
/// serde_json output gives the exact spacing and escaping (control
/// characters below 0x20 as \u00XX).
#[derive(Serialize)]
struct JsonRecord<'a> {
    ts: String,
    lvl: &'static str,
    tid: String,
    name: &'a str,
    seq: u64,
    file: &'a str,
    line: u32,
    func: &'a str,
    msg: &'a str,
}

pub(crate) fn render_json(e: &LogEvent) -> String {
    let record = JsonRecord {
        ts: timestamp_string(e.ts),
        lvl: e.level.as_str(),
        tid: e.tid.map(|t| t.to_string()).unwrap_or_default(),
        name: &e.name,
        seq: e.seq,
        file: e.loc.file,
        line: e.loc.line,
        func: e.loc.func,
        msg: &e.payload,
    };
    serde_json::to_string(&record).unwrap_or_default()
}

#[inline]
fn local(ts: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(ts)
}

/// `YYYY-MM-DD HH:MM:SS.mmm` in local time, empty if no timestamp
pub(crate) fn timestamp_string(ts: Option<SystemTime>) -> String {
    match ts {
        Some(t) => local(t).format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => String::new(),
    }
}

/// `YYYY-MM-DD` in local time, empty if no timestamp
pub(crate) fn date_string(ts: Option<SystemTime>) -> String {
    match ts {
        Some(t) => local(t).format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

fn time_string(ts: Option<SystemTime>) -> String {
    match ts {
        Some(t) => local(t).format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

fn millis_of_second(ts: SystemTime) -> u32 {
    local(ts).timestamp_subsec_millis() % 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceLocation;
    use crate::level::Level;
    use std::time::Duration;

    fn event() -> LogEvent {
        LogEvent {
            ts: Some(SystemTime::UNIX_EPOCH + Duration::from_millis(86_400_234)),
            level: Level::Warn,
            tid: Some(4242),
            name: "net".to_string(),
            payload: "queue nearly full".to_string(),
            seq: 17,
            loc: SourceLocation {
                file: "src/relay.rs",
                line: 88,
                func: "relay::run",
            },
        }
    }

    #[test]
    fn test_basic_tokens() {
        let e = event();
        assert_eq!(render("{lvl}", &e), "WARN");
        assert_eq!(render("{tid}", &e), "4242");
        assert_eq!(render("{name}", &e), "net");
        assert_eq!(render("{msg}", &e), "queue nearly full");
        assert_eq!(render("{file}:{line} {func}", &e), "src/relay.rs:88 relay::run");
        assert_eq!(render("{seq}", &e), "{seq}"); // not a token
    }

    #[test]
    fn test_ms_is_zero_padded() {
        // Offsets between local time and UTC are whole seconds, so the
        // millisecond-of-second is timezone independent.
        assert_eq!(render("{ms}", &event()), "234");

        let mut e = event();
        e.ts = Some(SystemTime::UNIX_EPOCH + Duration::from_millis(7));
        assert_eq!(render("{ms}", &e), "007");
    }

    #[test]
    fn test_ts_shape() {
        let rendered = render("{ts}", &event());
        // "YYYY-MM-DD HH:MM:SS.mmm"
        assert_eq!(rendered.len(), 23);
        assert_eq!(&rendered[4..5], "-");
        assert_eq!(&rendered[10..11], " ");
        assert_eq!(&rendered[19..20], ".");
        assert_eq!(render("{date} {time}.{ms}", &event()), rendered);
    }

    #[test]
    fn test_absent_captures_render_empty() {
        let e = LogEvent {
            ts: None,
            level: Level::Info,
            tid: None,
            name: String::new(),
            payload: "x".to_string(),
            seq: 0,
            loc: SourceLocation::UNKNOWN,
        };
        assert_eq!(render("[{ts}][{tid}][{name}][{file}:{line}] {msg}", &e), "[][][][:] x");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let e = event();
        assert_eq!(render("{nope} {msg} {}", &e), "{nope} queue nearly full {}");
    }

    #[test]
    fn test_token_in_payload_is_not_rescanned() {
        let mut e = event();
        e.payload = "literal {file} inside".to_string();
        assert_eq!(render("{msg}", &e), "literal {file} inside");
    }

    #[test]
    fn test_stray_braces() {
        let e = event();
        assert_eq!(render("{{msg}}", &e), "{queue nearly full}");
        assert_eq!(render("open { brace", &e), "open { brace");
        assert_eq!(render("trailing {", &e), "trailing {");
    }

    #[test]
    fn test_json_record_shape() {
        let line = render(JSON_PATTERN, &event());
        assert!(line.starts_with("{\"ts\":\""));
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["lvl"], "WARN");
        assert_eq!(v["tid"], "4242");
        assert_eq!(v["name"], "net");
        assert_eq!(v["seq"], 17);
        assert_eq!(v["file"], "src/relay.rs");
        assert_eq!(v["line"], 88);
        assert_eq!(v["func"], "relay::run");
        assert_eq!(v["msg"], "queue nearly full");
        // exact key order on the wire
        let mut last = 0;
        for key in ["ts", "lvl", "tid", "name", "seq", "file", "line", "func", "msg"] {
            let needle = format!("\"{key}\":");
            let at = line[last..]
                .find(&needle)
                .unwrap_or_else(|| panic!("key {key} missing or out of order"));
            last += at + needle.len();
        }
    }

    #[test]
    fn test_json_escapes_control_characters() {
        let mut e = event();
        e.payload = "tab\t quote\" backslash\\ newline\n bell\u{0007}".to_string();
        let line = render_json(&e);
        assert!(!line.contains('\n'));
        assert!(line.contains("\\t"));
        assert!(line.contains("\\\""));
        assert!(line.contains("\\\\"));
        assert!(line.contains("\\n"));
        assert!(line.contains("\\u0007"));
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["msg"], e.payload);
    }
}
