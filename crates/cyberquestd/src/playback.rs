//! Plain-text playback of scripted sequences.
//!
//! A sequence is revealed one character at a time at the step's speed, with
//! the current speaker named at the start of each line. Colours are carried
//! by the content but the terminal output is uncoloured.

use tracing::debug;

use crate::dispatch::{CommandContext, CommandError};
use crate::world::SequenceStep;

const PLAYBACK_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::playback");

/// Plays `steps` into the context's output.
///
/// # Errors
///
/// Returns [`CommandError::Output`] when the client disconnects mid-sequence.
pub fn play(context: &mut CommandContext<'_>, steps: &[SequenceStep]) -> Result<(), CommandError> {
    let mut player = Player::default();
    debug!(target: PLAYBACK_TARGET, steps = steps.len(), "playing sequence");
    for step in steps {
        player.step(context, step)?;
    }
    Ok(())
}

#[derive(Default)]
struct Player {
    speaker: Option<String>,
    mid_line: bool,
}

impl Player {
    fn step(
        &mut self,
        context: &mut CommandContext<'_>,
        step: &SequenceStep,
    ) -> Result<(), CommandError> {
        if let Some(speaker) = step.speaker.as_deref() {
            self.speaker = Some(speaker.to_owned());
        }

        if !self.mid_line
            && let Some(speaker) = self
                .speaker
                .as_deref()
                .filter(|speaker| !speaker.trim().is_empty())
        {
            context.write(&format!("{speaker}: "))?;
        }

        let per_char = character_delay(step.chars_per_second);
        let mut buffer = [0_u8; 4];
        for ch in step.text.chars() {
            context.write(ch.encode_utf8(&mut buffer))?;
            if per_char > 0 {
                context.pause(per_char);
            }
        }

        if step.line_break {
            context.write_line("")?;
            self.mid_line = false;
        } else {
            self.mid_line = true;
        }
        context.pause(step.delay_ms);
        Ok(())
    }
}

/// Milliseconds between characters; zero speed reveals the text at once.
fn character_delay(chars_per_second: u32) -> u64 {
    1000_u64
        .checked_div(u64::from(chars_per_second))
        .unwrap_or_default()
}
