// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SshdConfig`: the two settings this agent cares about out of sshd's
//! config file (spec §4.2). Parsing is a pure function of file contents so
//! it can be unit-tested without touching disk; `agentadapters::sshd_config`
//! supplies the file I/O and the change-watcher.

pub const DEFAULT_AUTHORIZED_KEYS_PATTERN: &str = "%h/.ssh/authorized_keys";
pub const DEFAULT_SSHD_PORT: u16 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshdConfig {
    pub authorized_keys_pattern: String,
    pub sshd_port: u16,
}

impl Default for SshdConfig {
    fn default() -> Self {
        SshdConfig {
            authorized_keys_pattern: DEFAULT_AUTHORIZED_KEYS_PATTERN.to_string(),
            sshd_port: DEFAULT_SSHD_PORT,
        }
    }
}

/// Parse `AuthorizedKeysFile` and the listening port out of an sshd config's
/// contents. `launched_port_override`, when present, wins over anything
/// found in the file (spec §4.2 precedence). All per-line parse problems are
/// swallowed (defaults remain); there is no I/O here to fail.
pub fn parse_sshd_config(contents: &str, launched_port_override: Option<u16>) -> SshdConfig {
    let mut pattern: Option<String> = None;
    let mut port: Option<u16> = None;

    for raw_line in contents.lines() {
        let line = raw_line.replace('#', " #").replace('\t', " ");
        let line = line.trim_start();

        if pattern.is_none() {
            if let Some(rest) = line.strip_prefix("AuthorizedKeysFile ") {
                if let Some(p) = parse_authorized_keys_file(rest) {
                    pattern = Some(p);
                }
            }
        }

        if port.is_none() {
            if line.starts_with("Port") {
                if let Some(p) = parse_port_line(line) {
                    port = Some(p);
                }
            } else if line.starts_with("ListenAddress") {
                if let Some(p) = parse_listen_address_line(line) {
                    port = Some(p);
                }
            }
        }
    }

    SshdConfig {
        authorized_keys_pattern: pattern.unwrap_or_else(|| DEFAULT_AUTHORIZED_KEYS_PATTERN.to_string()),
        sshd_port: launched_port_override.or(port).unwrap_or(DEFAULT_SSHD_PORT),
    }
}

fn parse_authorized_keys_file(rest: &str) -> Option<String> {
    let token = rest
        .split_whitespace()
        .find(|tok| !tok.is_empty() && *tok != "#")?;

    if token.starts_with('/') || token.starts_with('%') {
        Some(token.to_string())
    } else {
        Some(format!("%h/{token}"))
    }
}

fn parse_port_line(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("Port")?.trim_start();
    let token = rest.split_whitespace().next()?;
    let value: u32 = token.parse().ok()?;
    if (1..=65535).contains(&value) {
        Some(value as u16)
    } else {
        None
    }
}

fn parse_listen_address_line(line: &str) -> Option<u16> {
    let rest = line.strip_prefix("ListenAddress")?.trim_start();
    let token = rest.split_whitespace().next()?;

    let port_str = if let Some(bracket_end) = token.strip_prefix('[') {
        // [::1]:22 form
        let close = bracket_end.find(']')?;
        let after = &bracket_end[close + 1..];
        after.strip_prefix(':')?
    } else {
        // host:port form; last colon separates host from port for IPv4/hostname
        let idx = token.rfind(':')?;
        &token[idx + 1..]
    };

    if port_str.is_empty() {
        return None;
    }
    let value: u32 = port_str.parse().ok()?;
    if (1..=65535).contains(&value) {
        Some(value as u16)
    } else {
        None
    }
}

/// Expand `%%` -> `%`, `%h` -> `home` (trailing separators stripped), `%u` ->
/// `user` in an `AuthorizedKeysFile`-style pattern.
pub fn expand_pattern(pattern: &str, home: &str, user: &str) -> String {
    let home = home.trim_end_matches('/');
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('%') => {
                    out.push('%');
                    chars.next();
                }
                Some('h') => {
                    out.push_str(home);
                    chars.next();
                }
                Some('u') => {
                    out.push_str(user);
                    chars.next();
                }
                _ => out.push('%'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[path = "sshd_config_tests.rs"]
mod tests;
