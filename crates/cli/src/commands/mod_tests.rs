// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use rstest::rstest;

#[rstest]
#[case::unset(None, 10_000, 10_000)]
#[case::shorter(Some(2_500), 2_500, 10_000)]
#[case::longer(Some(30_000), 30_000, 30_250)]
fn test_lock_policy_timeout_covers_stale_threshold(
    #[case] stale_ms: Option<u64>,
    #[case] stale_after_ms: u64,
    #[case] timeout_ms: u64,
) {
    let policy = lock_policy(stale_ms);
    assert_eq!(policy.stale_after, Duration::from_millis(stale_after_ms));
    assert_eq!(policy.timeout, Duration::from_millis(timeout_ms));
    assert!(policy.timeout > policy.stale_after || stale_ms.is_none());
}
