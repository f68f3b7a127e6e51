//! Prints narration cues to the terminal.

use cr_director::{Cue, Narrator};

/// Stands in for a speech synthesizer: each cue is printed on its own line.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn speak(&self, cue: &Cue) {
        println!("\n  \u{201c}{}\u{201d} [{}]", cue.text, cue.lang);
    }
}
