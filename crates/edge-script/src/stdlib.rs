//! Built-in functions available to every handler module.

use crate::convert::{dynamic_to_json, json_to_dynamic};
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rhai::{Dynamic, Engine};
use tracing::{debug, error, info, warn};

pub(crate) fn register(engine: &mut Engine) {
    // Logging, routed to tracing inside the gateway's per-request `handler` span
    engine.on_print(|msg| info!(target: "edge_script::handler", "{msg}"));
    engine.on_debug(|msg, source, pos| {
        debug!(target: "edge_script::handler", source = source.unwrap_or(""), %pos, "{msg}")
    });
    engine.register_fn("log", |msg: &str| info!(target: "edge_script::handler", "{msg}"));
    engine.register_fn("warn", |msg: &str| warn!(target: "edge_script::handler", "{msg}"));
    engine.register_fn("error", |msg: &str| error!(target: "edge_script::handler", "{msg}"));

    // JSON
    engine.register_fn("to_json", |value: Dynamic| -> String {
        dynamic_to_json(&value).to_string()
    });
    engine.register_fn("from_json", |json: &str| -> Dynamic {
        serde_json::from_str::<serde_json::Value>(json)
            .map(|v| json_to_dynamic(&v))
            .unwrap_or(Dynamic::UNIT)
    });

    // Strings
    engine.register_fn("upper", |s: &str| s.to_uppercase());
    engine.register_fn("lower", |s: &str| s.to_lowercase());
    engine.register_fn("random_string", |len: i64| -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len.max(0) as usize)
            .map(char::from)
            .collect()
    });

    // Numbers
    engine.register_fn("parse_number", parse_number);
    engine.register_fn("fmt_number", |x: f64| fmt_number(x));
    engine.register_fn("fmt_number", |x: i64| x.to_string());

    // Time
    engine.register_fn("now", || Utc::now().timestamp());
    engine.register_fn("now_ms", || Utc::now().timestamp_millis());
    engine.register_fn("iso_now", || {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    });
    engine.register_fn("sleep", |ms: i64| {
        std::thread::sleep(std::time::Duration::from_millis(ms.max(0) as u64));
    });

    // UUID
    engine.register_fn("uuid", || uuid::Uuid::now_v7().to_string());

    // Type checks
    engine.register_fn("is_null", |v: Dynamic| v.is_unit());
    engine.register_fn("is_string", |v: Dynamic| v.is_string());
    engine.register_fn("is_int", |v: Dynamic| v.is_int());
    engine.register_fn("is_float", |v: Dynamic| v.is_float());
    engine.register_fn("is_number", |v: Dynamic| v.is_int() || v.is_float());
    engine.register_fn("is_bool", |v: Dynamic| v.is_bool());
    engine.register_fn("is_array", |v: Dynamic| v.is_array());
    engine.register_fn("is_map", |v: Dynamic| v.is_map());
}

/// Lenient number parsing: integers and floats pass through as floats,
/// strings parse from their longest numeric prefix, anything else is `()`.
pub(crate) fn parse_number(value: Dynamic) -> Dynamic {
    if let Ok(i) = value.as_int() {
        return Dynamic::from(i as f64);
    }
    if let Ok(f) = value.as_float() {
        return Dynamic::from(f);
    }
    if !value.is_string() {
        return Dynamic::UNIT;
    }
    let text = value.to_string();
    let text = text.trim();
    let end = numeric_prefix_len(text);
    text[..end]
        .parse::<f64>()
        .map(Dynamic::from)
        .unwrap_or(Dynamic::UNIT)
}

/// Length of the leading `[+-]digits[.digits][e[+-]digits]` run.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Display a float the way a JavaScript template literal would.
pub(crate) fn fmt_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(s: &str) -> Option<f64> {
        parse_number(Dynamic::from(s.to_string())).as_float().ok()
    }

    #[test]
    fn parse_number_accepts_numeric_prefixes() {
        assert_eq!(parsed("42"), Some(42.0));
        assert_eq!(parsed(" -3.5 "), Some(-3.5));
        assert_eq!(parsed("12abc"), Some(12.0));
        assert_eq!(parsed(".5"), Some(0.5));
        assert_eq!(parsed("1e3"), Some(1000.0));
        assert_eq!(parsed("1e"), Some(1.0));
        assert_eq!(parsed("abc"), None);
        assert_eq!(parsed(""), None);
        assert_eq!(parsed("-"), None);
    }

    #[test]
    fn parse_number_converts_ints_and_rejects_other_types() {
        assert_eq!(parse_number(Dynamic::from(2_i64)).as_float().ok(), Some(2.0));
        assert!(parse_number(Dynamic::from(true)).is_unit());
        assert!(parse_number(Dynamic::UNIT).is_unit());
    }

    #[test]
    fn fmt_number_drops_integral_fraction() {
        assert_eq!(fmt_number(2.0), "2");
        assert_eq!(fmt_number(-7.0), "-7");
        assert_eq!(fmt_number(2.5), "2.5");
        assert_eq!(fmt_number(f64::INFINITY), "inf");
    }
}
