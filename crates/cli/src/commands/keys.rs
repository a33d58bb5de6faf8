use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use redbind_commands::{DeleteSpec, KeyCommands, SetSpec, StringSerializer, ValueOperations};
use redbind_commands_redis::{RedisConfig, RedisKeyCommands};

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Key name (the configured prefix is applied).
    pub key: String,
}

/// Precondition flags shared by `set` and `del`. At most one may be given.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct ConditionArgs {
    /// Only if the stored value equals VALUE.
    #[arg(long = "if-eq", value_name = "VALUE")]
    pub if_eq: Option<String>,
    /// Only if the stored value differs from VALUE.
    #[arg(long = "if-ne", value_name = "VALUE")]
    pub if_ne: Option<String>,
    /// Only if the digest of the stored value equals DIGEST.
    #[arg(long = "if-digest-eq", value_name = "DIGEST")]
    pub if_digest_eq: Option<String>,
    /// Only if the digest of the stored value differs from DIGEST.
    #[arg(long = "if-digest-ne", value_name = "DIGEST")]
    pub if_digest_ne: Option<String>,
}

impl ConditionArgs {
    fn stage_delete(&self, spec: DeleteSpec<String>) -> DeleteSpec<String> {
        if let Some(value) = &self.if_eq {
            spec.if_equals().value(value.clone())
        } else if let Some(value) = &self.if_ne {
            spec.if_not_equals().value(value.clone())
        } else if let Some(digest) = &self.if_digest_eq {
            spec.if_equals().digest(digest.clone())
        } else if let Some(digest) = &self.if_digest_ne {
            spec.if_not_equals().digest(digest.clone())
        } else {
            spec.always()
        }
    }

    fn stage_set(&self, spec: SetSpec<String>) -> SetSpec<String> {
        if let Some(value) = &self.if_eq {
            spec.if_equals().value(value.clone())
        } else if let Some(value) = &self.if_ne {
            spec.if_not_equals().value(value.clone())
        } else if let Some(digest) = &self.if_digest_eq {
            spec.if_equals().digest(digest.clone())
        } else if let Some(digest) = &self.if_digest_ne {
            spec.if_not_equals().digest(digest.clone())
        } else {
            spec.always()
        }
    }
}

#[derive(Args, Debug)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
    /// Expire the key after this many milliseconds.
    #[arg(long)]
    pub px: Option<u64>,
    #[command(flatten)]
    pub condition: ConditionArgs,
}

#[derive(Args, Debug)]
pub struct DelArgs {
    pub key: String,
    #[command(flatten)]
    pub condition: ConditionArgs,
}

fn connect(config: &RedisConfig) -> anyhow::Result<Arc<RedisKeyCommands>> {
    Ok(Arc::new(RedisKeyCommands::new(config)?))
}

fn operations(config: &RedisConfig) -> anyhow::Result<ValueOperations<String, StringSerializer>> {
    Ok(ValueOperations::new(connect(config)?, StringSerializer))
}

pub async fn get(
    config: &RedisConfig,
    args: &KeyArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let value = connect(config)?.get(&args.key).await?;
    let value = value.map(|v| String::from_utf8_lossy(&v).into_owned());
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "key": args.key, "value": value }));
        }
        OutputFormat::Text => match value {
            Some(value) => println!("{value}"),
            None => println!("(nil)"),
        },
    }
    Ok(())
}

pub async fn set(
    config: &RedisConfig,
    args: &SetArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let ops = operations(config)?;
    let written = ops
        .set_if(&args.key, &args.value, |spec| {
            let spec = args.condition.stage_set(spec);
            match args.px {
                Some(ms) => spec.expire(Duration::from_millis(ms)),
                None => spec,
            }
        })
        .await?;
    report("written", &args.key, written, format);
    Ok(())
}

pub async fn del(
    config: &RedisConfig,
    args: &DelArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let ops = operations(config)?;
    let deleted = ops
        .delete_if(&args.key, |spec| args.condition.stage_delete(spec))
        .await?;
    report("deleted", &args.key, deleted, format);
    Ok(())
}

pub async fn digest(
    config: &RedisConfig,
    args: &KeyArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let digest = connect(config)?.digest(&args.key).await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "key": args.key, "digest": digest }));
        }
        OutputFormat::Text => println!("{}", digest.as_deref().unwrap_or("(nil)")),
    }
    Ok(())
}

fn report(outcome: &str, key: &str, applied: bool, format: &OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "key": key, outcome: applied }));
        }
        OutputFormat::Text => {
            if applied {
                println!("{key}: {outcome}");
            } else {
                println!("{key}: condition not met");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use redbind_core::CompareCondition;

    use super::*;

    fn utf8(value: &String) -> Result<bytes::Bytes, redbind_commands::CommandError> {
        Ok(bytes::Bytes::from(value.clone()))
    }

    #[test]
    fn no_flags_is_unconditional() {
        let spec = ConditionArgs::default().stage_delete(DeleteSpec::new());
        assert_eq!(spec.to_compare_condition(utf8).unwrap(), None);
    }

    #[test]
    fn each_flag_maps_to_its_condition() {
        let cases = [
            (
                ConditionArgs {
                    if_eq: Some("a".into()),
                    ..ConditionArgs::default()
                },
                CompareCondition::if_equals("a"),
            ),
            (
                ConditionArgs {
                    if_ne: Some("a".into()),
                    ..ConditionArgs::default()
                },
                CompareCondition::if_not_equals("a"),
            ),
            (
                ConditionArgs {
                    if_digest_eq: Some("ff".into()),
                    ..ConditionArgs::default()
                },
                CompareCondition::if_digest_equals("ff"),
            ),
            (
                ConditionArgs {
                    if_digest_ne: Some("ff".into()),
                    ..ConditionArgs::default()
                },
                CompareCondition::if_digest_not_equals("ff"),
            ),
        ];
        for (args, expected) in cases {
            let delete = args.stage_delete(DeleteSpec::new());
            assert_eq!(delete.to_compare_condition(utf8).unwrap(), Some(expected.clone()));
            let set = args.stage_set(SetSpec::new());
            assert_eq!(set.to_compare_condition(utf8).unwrap(), Some(expected));
        }
    }
}
