use clap::Args;
use redbind_listener::ListenerConfig;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct TopicArgs {
    /// Channel name or glob pattern.
    pub destination: String,
}

fn kind(is_pattern: bool) -> &'static str {
    if is_pattern { "pattern" } else { "channel" }
}

pub fn topic(
    config: &ListenerConfig,
    args: &TopicArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let topic = config.resolver().resolve(&args.destination)?;
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "topic": topic.name(), "kind": kind(topic.is_pattern()) })
            );
        }
        OutputFormat::Text => println!("{}: {}", topic.name(), kind(topic.is_pattern())),
    }
    Ok(())
}

pub fn listeners(config: &ListenerConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let resolver = config.resolver();
    let mut rows = Vec::with_capacity(config.listeners.len());
    for definition in &config.listeners {
        let topic = resolver.resolve(&definition.topic)?;
        rows.push(serde_json::json!({
            "id": definition.id,
            "container": definition.container,
            "topic": topic.name(),
            "kind": kind(topic.is_pattern()),
            "handler": format!("{}.{}", definition.bean, definition.method),
        }));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            println!("{} listeners:", rows.len());
            for (definition, row) in config.listeners.iter().zip(&rows) {
                println!(
                    "  {id} | {topic} ({kind}) | {bean}.{method}",
                    id = definition.id.as_deref().unwrap_or("(generated)"),
                    topic = definition.topic,
                    kind = row["kind"].as_str().unwrap_or("?"),
                    bean = definition.bean,
                    method = definition.method,
                );
            }
        }
    }
    Ok(())
}
