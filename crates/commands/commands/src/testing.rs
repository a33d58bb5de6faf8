use std::time::Duration;

use bytes::Bytes;
use redbind_core::CompareCondition;

use crate::connection::{KeyCommands, SetOptions};
use crate::error::CommandError;

fn test_key(id: &str) -> String {
    format!("conformance:{id}")
}

fn bytes(value: &'static str) -> Bytes {
    Bytes::from_static(value.as_bytes())
}

/// Run the conditional command conformance test suite.
///
/// Call this from your backend's test module with a fresh backend instance.
/// Keys are written under the `conformance:` prefix.
///
/// # Errors
///
/// Returns an error if a command fails to dispatch.
///
/// # Panics
///
/// Panics if the backend violates the conditional command semantics.
pub async fn run_conditional_command_conformance_tests(
    commands: &dyn KeyCommands,
) -> Result<(), CommandError> {
    test_get_missing(commands).await?;
    test_set_and_get(commands).await?;
    test_unconditional_delete(commands).await?;
    test_delete_if_equals(commands).await?;
    test_delete_if_not_equals(commands).await?;
    test_conditional_delete_missing_key(commands).await?;
    test_delete_if_digest_equals(commands).await?;
    test_delete_if_digest_not_equals(commands).await?;
    test_empty_comparand(commands).await?;
    test_set_conditions_on_missing_key(commands).await?;
    test_set_if_equals(commands).await?;
    test_set_if_digest_equals(commands).await?;
    test_set_with_expiration(commands).await?;
    test_digest(commands).await?;
    Ok(())
}

async fn test_get_missing(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let val = commands.get(&test_key("missing")).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("set-get");
    let written = commands
        .set(&key, bytes("hello"), &SetOptions::default())
        .await?;
    assert!(written, "unconditional set should always write");
    let val = commands.get(&key).await?;
    assert_eq!(val.as_deref(), Some(b"hello".as_slice()));
    Ok(())
}

async fn test_unconditional_delete(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("delete");
    commands
        .set(&key, bytes("bye"), &SetOptions::default())
        .await?;
    assert!(
        commands.delete(&key, None).await?,
        "delete should return true for existing key"
    );
    assert!(commands.get(&key).await?.is_none());
    assert!(
        !commands.delete(&key, None).await?,
        "delete on missing key should return false"
    );
    Ok(())
}

async fn test_delete_if_equals(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("delete-ifeq");
    commands
        .set(&key, bytes("v1"), &SetOptions::default())
        .await?;

    let mismatch = CompareCondition::if_equals("v2");
    assert!(
        !commands.delete(&key, Some(&mismatch)).await?,
        "IFEQ with a different value should not delete"
    );
    assert!(commands.get(&key).await?.is_some(), "key should remain");

    let matching = CompareCondition::if_equals("v1");
    assert!(
        commands.delete(&key, Some(&matching)).await?,
        "IFEQ with the stored value should delete"
    );
    assert!(commands.get(&key).await?.is_none());
    Ok(())
}

async fn test_delete_if_not_equals(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("delete-ifne");
    commands
        .set(&key, bytes("v1"), &SetOptions::default())
        .await?;

    let same = CompareCondition::if_not_equals("v1");
    assert!(
        !commands.delete(&key, Some(&same)).await?,
        "IFNE with the stored value should not delete"
    );

    let different = CompareCondition::if_not_equals("v2");
    assert!(
        commands.delete(&key, Some(&different)).await?,
        "IFNE with a different value should delete"
    );
    Ok(())
}

async fn test_conditional_delete_missing_key(
    commands: &dyn KeyCommands,
) -> Result<(), CommandError> {
    let key = test_key("delete-missing");
    let conditions = [
        CompareCondition::if_equals("v1"),
        CompareCondition::if_not_equals("v1"),
        CompareCondition::if_digest_equals("0000000000000000"),
        CompareCondition::if_digest_not_equals("0000000000000000"),
    ];
    for condition in &conditions {
        assert!(
            !commands.delete(&key, Some(condition)).await?,
            "{condition} on a missing key should not delete"
        );
    }
    Ok(())
}

async fn test_delete_if_digest_equals(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("delete-ifdeq");
    commands
        .set(&key, bytes("payload"), &SetOptions::default())
        .await?;
    let digest = commands
        .digest(&key)
        .await?
        .expect("digest of existing key");

    let stale = CompareCondition::if_digest_equals("0000000000000000");
    assert!(
        !commands.delete(&key, Some(&stale)).await?,
        "IFDEQ with a foreign digest should not delete"
    );

    let matching = CompareCondition::if_digest_equals(digest.to_uppercase());
    assert!(
        commands.delete(&key, Some(&matching)).await?,
        "IFDEQ should match the digest regardless of hex case"
    );
    Ok(())
}

async fn test_delete_if_digest_not_equals(
    commands: &dyn KeyCommands,
) -> Result<(), CommandError> {
    let key = test_key("delete-ifdne");
    commands
        .set(&key, bytes("payload"), &SetOptions::default())
        .await?;
    let digest = commands
        .digest(&key)
        .await?
        .expect("digest of existing key");

    let same = CompareCondition::if_digest_not_equals(digest);
    assert!(
        !commands.delete(&key, Some(&same)).await?,
        "IFDNE with the current digest should not delete"
    );

    let other = CompareCondition::if_digest_not_equals("0000000000000000");
    assert!(
        commands.delete(&key, Some(&other)).await?,
        "IFDNE with a foreign digest should delete"
    );
    Ok(())
}

async fn test_empty_comparand(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("empty");
    commands
        .set(&key, Bytes::new(), &SetOptions::default())
        .await?;
    let condition = CompareCondition::if_equals(Bytes::new());
    assert!(
        commands.delete(&key, Some(&condition)).await?,
        "IFEQ with an empty comparand should match an empty value"
    );
    Ok(())
}

async fn test_set_conditions_on_missing_key(
    commands: &dyn KeyCommands,
) -> Result<(), CommandError> {
    let key = test_key("set-missing-ifeq");
    let options = SetOptions::default().with_condition(CompareCondition::if_equals("v1"));
    assert!(
        !commands.set(&key, bytes("v2"), &options).await?,
        "IFEQ on a missing key should not write"
    );
    assert!(commands.get(&key).await?.is_none());

    let key = test_key("set-missing-ifdeq");
    let options = SetOptions::default()
        .with_condition(CompareCondition::if_digest_equals("0000000000000000"));
    assert!(
        !commands.set(&key, bytes("v2"), &options).await?,
        "IFDEQ on a missing key should not write"
    );

    let key = test_key("set-missing-ifne");
    let options = SetOptions::default().with_condition(CompareCondition::if_not_equals("v1"));
    assert!(
        commands.set(&key, bytes("v2"), &options).await?,
        "IFNE on a missing key should write"
    );
    assert_eq!(commands.get(&key).await?.as_deref(), Some(b"v2".as_slice()));

    let key = test_key("set-missing-ifdne");
    let options = SetOptions::default()
        .with_condition(CompareCondition::if_digest_not_equals("0000000000000000"));
    assert!(
        commands.set(&key, bytes("v2"), &options).await?,
        "IFDNE on a missing key should write"
    );
    Ok(())
}

async fn test_set_if_equals(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("set-ifeq");
    commands
        .set(&key, bytes("v1"), &SetOptions::default())
        .await?;

    let stale = SetOptions::default().with_condition(CompareCondition::if_equals("v0"));
    assert!(!commands.set(&key, bytes("v2"), &stale).await?);
    assert_eq!(commands.get(&key).await?.as_deref(), Some(b"v1".as_slice()));

    let current = SetOptions::default().with_condition(CompareCondition::if_equals("v1"));
    assert!(commands.set(&key, bytes("v2"), &current).await?);
    assert_eq!(commands.get(&key).await?.as_deref(), Some(b"v2".as_slice()));
    Ok(())
}

async fn test_set_if_digest_equals(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("set-ifdeq");
    commands
        .set(&key, bytes("v1"), &SetOptions::default())
        .await?;
    let digest = commands
        .digest(&key)
        .await?
        .expect("digest of existing key");

    let options = SetOptions::default().with_condition(CompareCondition::if_digest_equals(digest));
    assert!(commands.set(&key, bytes("v2"), &options).await?);
    assert!(
        !commands.set(&key, bytes("v3"), &options).await?,
        "digest of the replaced value should no longer match"
    );
    assert_eq!(commands.get(&key).await?.as_deref(), Some(b"v2".as_slice()));
    Ok(())
}

async fn test_set_with_expiration(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    let key = test_key("set-px");
    let options = SetOptions::default().with_expiration(Duration::from_secs(3600));
    assert!(commands.set(&key, bytes("ephemeral"), &options).await?);
    assert_eq!(
        commands.get(&key).await?.as_deref(),
        Some(b"ephemeral".as_slice())
    );
    Ok(())
}

async fn test_digest(commands: &dyn KeyCommands) -> Result<(), CommandError> {
    assert!(commands.digest(&test_key("digest-missing")).await?.is_none());

    let a = test_key("digest-a");
    let b = test_key("digest-b");
    let c = test_key("digest-c");
    commands.set(&a, bytes("same"), &SetOptions::default()).await?;
    commands.set(&b, bytes("same"), &SetOptions::default()).await?;
    commands.set(&c, bytes("other"), &SetOptions::default()).await?;

    let digest_a = commands.digest(&a).await?.expect("digest of a");
    let digest_b = commands.digest(&b).await?.expect("digest of b");
    let digest_c = commands.digest(&c).await?.expect("digest of c");
    assert!(
        digest_a.chars().all(|c| c.is_ascii_hexdigit()),
        "digest should be hexadecimal: {digest_a}"
    );
    assert_eq!(digest_a, digest_b, "equal values should share a digest");
    assert_ne!(digest_a, digest_c);
    Ok(())
}
