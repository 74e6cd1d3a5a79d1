//! Utilities: logging setup and the duration syntax used by `--kube-timeout`.
//!
//! Key items:
//!   init_logging / derive_level
//!   parse_duration
//!   parse_env_pair / overlay_environment (`--kube-env`)

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::time::Duration;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable holding a full `tracing` filter (overrides flags).
pub const LOG_ENV: &str = "KUBE_LOG";

/// Map `--kube-verbose` / `--kube-quiet` onto a log level.
///
/// The default is `WARN`: stdout belongs to the wrapped tool.
pub fn derive_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber. `KUBE_LOG` wins over `level` when set.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse `500ms`, `30s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };
    if digits.is_empty() {
        return Err(format!("invalid duration '{raw}': missing number"));
    }
    let n: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration '{raw}': {e}"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => scaled(raw, n, 60),
        "h" => scaled(raw, n, 3600),
        other => Err(format!(
            "invalid duration '{raw}': unknown unit '{other}' (use ms, s, m or h)"
        )),
    }
}

fn scaled(raw: &str, n: u64, unit_secs: u64) -> Result<Duration, String> {
    n.checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("invalid duration '{raw}': too large"))
}

/// Parse a `KEY=VALUE` pair. The value may be empty or contain `=`.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid environment entry '{raw}': expected KEY=VALUE")),
    }
}

/// `base` (normally `std::env::vars_os()`) with `overrides` applied on top,
/// later entries winning. Sorted by key so the result is stable.
pub fn overlay_environment(
    base: impl IntoIterator<Item = (OsString, OsString)>,
    overrides: &[(String, String)],
) -> Vec<(OsString, OsString)> {
    let mut vars: BTreeMap<OsString, OsString> = base.into_iter().collect();
    for (k, v) in overrides {
        vars.insert(k.into(), v.into());
    }
    vars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping() {
        assert_eq!(derive_level(0, false), Level::WARN);
        assert_eq!(derive_level(1, false), Level::INFO);
        assert_eq!(derive_level(2, false), Level::DEBUG);
        assert_eq!(derive_level(7, false), Level::TRACE);
        assert_eq!(derive_level(3, true), Level::ERROR, "quiet wins");
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 15 ").unwrap(), Duration::from_secs(15));
    }

    #[test]
    fn bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("10d").unwrap_err().contains("unknown unit"));
    }

    #[test]
    fn env_pairs() {
        assert_eq!(
            parse_env_pair("A=b=c").unwrap(),
            ("A".to_string(), "b=c".to_string())
        );
        assert_eq!(parse_env_pair("EMPTY=").unwrap().1, "");
        assert!(parse_env_pair("=x").is_err());
        assert!(parse_env_pair("NOEQ").is_err());
    }

    fn os(s: &str) -> OsString {
        OsString::from(s)
    }

    #[test]
    fn overlay_replaces_and_adds() {
        let base = vec![(os("PATH"), os("/bin")), (os("HOME"), os("/root"))];
        let overrides = vec![
            ("HOME".to_string(), "/tmp".to_string()),
            ("NEW".to_string(), "1".to_string()),
        ];
        let vars = overlay_environment(base, &overrides);
        assert_eq!(
            vars,
            vec![
                (os("HOME"), os("/tmp")),
                (os("NEW"), os("1")),
                (os("PATH"), os("/bin")),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn overlay_keeps_non_utf8_entries() {
        use std::os::unix::ffi::OsStringExt;
        let raw = OsString::from_vec(vec![0xff, 0xfe]);
        let base = vec![(os("KUBE_RAW"), raw.clone())];
        let vars = overlay_environment(base, &[("A".to_string(), "1".to_string())]);
        assert_eq!(vars, vec![(os("A"), os("1")), (os("KUBE_RAW"), raw)]);
    }

    #[test]
    fn huge_durations_are_rejected() {
        let err = parse_duration(&format!("{}h", u64::MAX)).unwrap_err();
        assert!(err.contains("too large"), "{err}");
        assert!(parse_duration(&format!("{}m", u64::MAX / 2)).is_err());
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)).unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }
}
