use crate::playback::TransportCommand;

/// Substring rules for free-text utterances, checked in order; first hit wins.
///
/// "stop" maps to `Pause` here, not to the `Stop` transport command. The
/// rule order also means anything containing "replay" matches "play" first.
const RULES: &[(&[&str], TransportCommand)] = &[
    (&["pause", "stop"], TransportCommand::Pause),
    (&["skip", "next"], TransportCommand::Skip),
    (&["play", "start"], TransportCommand::Play),
    (&["replay"], TransportCommand::Replay),
];

/// Map a spoken utterance to a transport command, case-insensitively.
pub fn parse_utterance(utterance: &str) -> Option<TransportCommand> {
    let lower = utterance.to_lowercase();
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, command)| *command)
}
