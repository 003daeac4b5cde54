use std::collections::HashMap;
use std::io::{self, BufRead};

/// Variables exported by one run of the env command.
pub type EnvironmentMap = HashMap<String, String>;

const EXPORT: &str = "export";

/// Recognizes a single `export NAME=VALUE` statement.
///
/// The `export` keyword and exactly one following character are dropped.
/// The remainder must contain exactly one `=`, otherwise the line is skipped.
/// Name and value are trimmed, then one leading and one trailing `"` are
/// stripped from the value independently of each other.
pub fn parse_export_line(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix(EXPORT)?;
    let sep = rest.chars().next()?;
    let assignment = &rest[sep.len_utf8()..];

    let mut parts = assignment.split('=');
    let (name, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(value), None) => (name.trim(), value.trim()),
        _ => return None,
    };

    if name.is_empty() {
        return None;
    }

    Some((name.to_string(), trim_quotes(value).to_string()))
}

/// Literal affix strip, not balanced-quote parsing.
pub fn trim_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Output that could only be partly read. `partial` holds whatever was
/// parsed before the stream failed.
#[derive(Debug)]
pub struct PartialRead {
    pub partial: EnvironmentMap,
    pub error: io::Error,
}

/// Reads one line, replacing invalid UTF-8 instead of failing on it.
/// Returns `None` at end of stream. The line ending is not included.
pub fn read_lossy_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Parses every line of `reader`. Later assignments of a name win.
pub fn parse_docker_env<R: BufRead>(mut reader: R) -> Result<EnvironmentMap, PartialRead> {
    let mut env = EnvironmentMap::new();
    loop {
        let line = match read_lossy_line(&mut reader) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(env),
            Err(error) => {
                return Err(PartialRead {
                    partial: env,
                    error,
                })
            }
        };
        if let Some((name, value)) = parse_export_line(&line) {
            env.insert(name, value);
        }
    }
}
