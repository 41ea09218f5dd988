// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn invalid_port_number_includes_value() {
    let err = Error::InvalidPortNumber(70000);
    assert!(err.to_string().contains("70000"));
}

#[test]
fn user_not_found_includes_user() {
    let err = Error::UserNotFound("deploy".to_string());
    assert!(err.to_string().contains("deploy"));
}
