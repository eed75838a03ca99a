//! Interactive `watch` session: observation, narration and playback run in
//! the background while commands are read line by line from stdin.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::app::{AppContext, Result};
use crate::observer::{MutationSource, ObservationLoop};
use crate::playback::{Ack, PlaybackController, TransportCommand, TransportEvent};

const CLOCK_INTERVAL: Duration = Duration::from_millis(250);

const HELP: &str = "\
Commands:
  start | stop              listen for posts / stop listening and playback
  play | pause | skip | replay
  status                    show counters and playback state
  digest [HOURS]            narrate everything collected (optionally last HOURS)
  voice <ID>                change the narration voice
  say <utterance>           voice command, e.g. \"say please skip this one\"
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Transport(TransportCommand),
    Status,
    Digest(Option<u32>),
    Voice(String),
    Say(String),
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        if let Some(command) = TransportCommand::parse(word) {
            return Ok(Self::Transport(command));
        }

        match word.to_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "digest" if rest.is_empty() => Ok(Self::Digest(None)),
            "digest" => rest
                .parse()
                .map(|hours| Self::Digest(Some(hours)))
                .map_err(|_| format!("digest takes a number of hours, got {:?}", rest)),
            "voice" if rest.is_empty() => Err("voice needs an id (see `socialcast voices`)".into()),
            "voice" => Ok(Self::Voice(rest.to_string())),
            "say" if rest.is_empty() => Err("say needs an utterance".into()),
            "say" => Ok(Self::Say(rest.to_string())),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".into()),
            other => Err(format!("unknown command {:?}, try `help`", other)),
        }
    }
}

/// Run one command against the session and describe the outcome.
pub async fn execute(ctx: &AppContext, command: SessionCommand) -> String {
    match command {
        SessionCommand::Transport(command) => ctx.dispatch(command).await.to_string(),
        SessionCommand::Status => ctx.status().await.to_string(),
        SessionCommand::Digest(hours) => match ctx.request_digest(hours).await {
            Ok(Some(unit)) => Ack::ok(format!(
                "digest queued ({} chunk(s), {:.0}s)",
                unit.chunks.len(),
                unit.duration().as_secs_f64()
            )),
            Ok(None) => Ack::ok("no posts collected for a digest"),
            Err(e) => Ack::fail(e.to_string()),
        }
        .to_string(),
        SessionCommand::Voice(id) => ctx.set_voice(&id).await.to_string(),
        SessionCommand::Say(utterance) => ctx.voice_command(&utterance).await.to_string(),
        SessionCommand::Help => HELP.to_string(),
        SessionCommand::Quit => Ack::ok("bye").to_string(),
    }
}

fn spawn_playback_clock(playback: Arc<Mutex<PlaybackController>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLOCK_INTERVAL);
        let mut last = Instant::now();
        loop {
            interval.tick().await;
            let now = Instant::now();
            playback.lock().await.tick(now - last);
            last = now;
        }
    })
}

fn spawn_event_printer(mut events: broadcast::Receiver<TransportEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TransportEvent::Started(unit)) => {
                    println!("Now playing {}", unit.post_id.short());
                    for audio in &unit.chunks {
                        println!("  {}", audio.url);
                    }
                }
                Ok(TransportEvent::Drained) => println!("Queue empty"),
                Ok(event) => debug!("Transport: {:?}", event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Missed {} transport events", n)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub async fn run<S: MutationSource + Sync + 'static>(ctx: AppContext, source: S) -> Result<()> {
    let ctx = Arc::new(ctx);

    let worker = ctx.spawn_narration_worker();
    let observation = ObservationLoop::new(
        source,
        ctx.pipeline.clone(),
        ctx.digest.clone(),
        worker.clone(),
    );
    let observer_task = tokio::spawn(observation.run());
    let clock_task = spawn_playback_clock(ctx.playback.clone());
    let events_task = spawn_event_printer(ctx.playback.lock().await.subscribe());

    println!("{}", ctx.dispatch(TransportCommand::Start).await);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match SessionCommand::parse(&line) {
            Ok(SessionCommand::Quit) => break,
            Ok(command) => println!("{}", execute(&ctx, command).await),
            Err(message) => println!("{}", Ack::fail(message)),
        }
    }

    worker.shutdown().await;
    observer_task.abort();
    clock_task.abort();
    events_task.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::PlatformId;
    use crate::narration::testing::FakeSpeech;

    #[test]
    fn test_parse_transport_words() {
        assert_eq!(
            SessionCommand::parse("  Skip "),
            Ok(SessionCommand::Transport(TransportCommand::Skip))
        );
        assert_eq!(
            SessionCommand::parse("stop"),
            Ok(SessionCommand::Transport(TransportCommand::Stop))
        );
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(SessionCommand::parse("digest"), Ok(SessionCommand::Digest(None)));
        assert_eq!(SessionCommand::parse("digest 6"), Ok(SessionCommand::Digest(Some(6))));
        assert!(SessionCommand::parse("digest soon").is_err());
        assert_eq!(
            SessionCommand::parse("voice en-US-mike"),
            Ok(SessionCommand::Voice("en-US-mike".into()))
        );
        assert_eq!(
            SessionCommand::parse("say please skip this one"),
            Ok(SessionCommand::Say("please skip this one".into()))
        );
        assert!(SessionCommand::parse("say").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        assert!(SessionCommand::parse("rewind").is_err());
        assert!(SessionCommand::parse("   ").is_err());
        assert_eq!(SessionCommand::parse("EXIT"), Ok(SessionCommand::Quit));
    }

    #[tokio::test]
    async fn test_execute_reports_acknowledgments() {
        let ctx = AppContext::with_speech(
            Config::default(),
            PlatformId::new("linkedin"),
            Arc::new(FakeSpeech::new()),
        )
        .unwrap();

        let out = execute(&ctx, SessionCommand::Transport(TransportCommand::Start)).await;
        assert_eq!(out, "[ok] listening");

        let out = execute(&ctx, SessionCommand::Transport(TransportCommand::Pause)).await;
        assert!(out.starts_with("[failed]"));

        let out = execute(&ctx, SessionCommand::Digest(None)).await;
        assert_eq!(out, "[ok] no posts collected for a digest");

        let out = execute(&ctx, SessionCommand::Status).await;
        assert!(out.starts_with("Listening on linkedin"));
    }
}
