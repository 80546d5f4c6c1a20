// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn per_profile_artifact_paths() {
    let admin = Path::new("/var/run/resmon");
    assert_eq!(
        lock_path(admin, "web"),
        PathBuf::from("/var/run/resmon/profile-web.lock")
    );
    assert_eq!(
        socket_path(admin, "web"),
        PathBuf::from("/var/run/resmon/profile-web.sock")
    );
}
