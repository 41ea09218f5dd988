// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helper-subprocess mode (spec §4.3): some deployments run the
//! `authorized_keys` write as a dedicated subprocess invocation of this same
//! binary, under the target user's credentials, rather than in-process. The
//! daemon re-execs itself with `-util <read|write> <path>`; `read` prints the
//! existing file to stdout, `write` takes the desired final lines on stdin.
//!
//! Selected uniformly at start-up, not a fallback (spec §4.3).

use agentcore::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const SSH_DIR_MODE: u32 = 0o700;
const TEMP_FILE_MODE: u32 = 0o600;

/// Dispatches `-util` subcommands. Returns the process exit code.
pub fn run(args: &[String]) -> i32 {
    match args {
        [op, path] if op == "read" => match helper_read(Path::new(path)) {
            Ok(contents) => {
                print!("{contents}");
                0
            }
            Err(err) => {
                eprintln!("util read failed: {err}");
                1
            }
        },
        [op, path] if op == "write" => {
            let mut input = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut input) {
                eprintln!("util write failed to read stdin: {err}");
                return 1;
            }
            match helper_write(Path::new(path), &input) {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("util write failed: {err}");
                    1
                }
            }
        }
        _ => {
            eprintln!("usage: droplet-agent -util <read|write> <path>");
            2
        }
    }
}

/// Prints `path`'s contents, or nothing if it does not exist (spec §4.3's
/// `NotExist` → empty-input rule, mirrored here for the helper's read path).
fn helper_read(path: &Path) -> Result<String, Error> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::ReadAuthorizedKeysFileFailed(e.to_string())),
    }
}

/// Writes `lines` to `path`: refuses a symlinked target, ensures the parent
/// `.ssh` directory exists at `0700`, writes a `0600` temp file, copies the
/// existing file's mode onto it if one was there, and renames atomically.
fn helper_write(path: &Path, lines: &str) -> Result<(), Error> {
    if path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false) {
        return Err(Error::WriteAuthorizedKeysFileFailed("refusing to write through a symlink".to_string()));
    }

    let parent = path.parent().ok_or_else(|| Error::WriteAuthorizedKeysFileFailed("target has no parent directory".to_string()))?;
    fs::create_dir_all(parent).map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;
    fs::set_permissions(parent, fs::Permissions::from_mode(SSH_DIR_MODE)).map_err(|e| Error::WriteAuthorizedKeysFileFailed(e.to_string()))?;

    let existing_mode = fs::metadata(path).ok().map(|m| m.permissions().mode());

    let tmp_path = path.with_extension("agent-helper-tmp");
    let write_result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(lines.as_bytes())?;
        file.set_permissions(fs::Permissions::from_mode(TEMP_FILE_MODE))?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::WriteAuthorizedKeysFileFailed(e.to_string()));
    }

    if let Some(mode) = existing_mode {
        if let Err(e) = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::WriteAuthorizedKeysFileFailed(e.to_string()));
        }
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::WriteAuthorizedKeysFileFailed(e.to_string()));
    }

    Ok(())
}

#[cfg(test)]
#[path = "util_mode_tests.rs"]
mod tests;
