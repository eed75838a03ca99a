use std::io::Read;
use std::path::Path;

use crate::app::{AppContext, Result};
use crate::chunker::Chunker;
use crate::config::Config;
use crate::domain::PostId;
use crate::narration::KNOWN_VOICES;
use crate::observer::ChromeMutationSource;
use crate::registry::SelectorRegistry;

use super::session;

pub async fn watch(mut config: Config, url: &str, platform: Option<&str>, headful: bool) -> Result<()> {
    let platform = AppContext::resolve_platform(&config, url, platform)?;
    if headful {
        config.browser.headless = false;
    }

    let ctx = AppContext::new(config, platform)?;
    println!("Opening {} as {}...", url, ctx.status().await.platform);
    let source = ChromeMutationSource::launch(&ctx.config.browser, url).await?;

    session::run(ctx, source).await
}

pub fn chunk_text(file: Option<&Path>, max: usize) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let chunker = Chunker::new(max);
    let id = PostId::from_content(&"cli".into(), &text);
    let chunks = chunker.chunk(&id, &text);

    if chunks.is_empty() {
        println!("No text");
        return Ok(());
    }

    let total: usize = chunks.iter().map(|c| c.len()).sum();
    for chunk in &chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!("{:>3}  {:>5} chars  {}", chunk.index, chunk.len(), preview);
    }
    println!(
        "{} chunk(s), {} of {} chars kept (max {})",
        chunks.len(),
        total,
        text.chars().count(),
        chunker.max_size()
    );
    Ok(())
}

pub fn list_voices(config: &Config) {
    for voice in KNOWN_VOICES {
        let marker = if voice.id == config.narration.voice.voice_id {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<15} {:<8} {:<6} {}",
            marker, voice.id, voice.name, voice.language, voice.style
        );
    }
}

pub fn list_platforms(config: &Config) {
    let registry = SelectorRegistry::new(&config.platform_entries());
    for rules in registry.platforms() {
        println!(
            "{:<10} {:>2} rule(s)  {}",
            rules.id.as_str(),
            rules.post_rules.len(),
            rules.hosts.join(", ")
        );
    }
}
