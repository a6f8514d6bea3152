// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Quiz sessions: play a word, ask for its meaning, keep score.

use std::{fmt, sync::Arc, time::Duration};

use rand::seq::SliceRandom;
use tracing::{error, info, span, Level, Span};

use crate::{notice::Notifier, player::Player, vocabulary::VocabularyItem};

/// The default pause between playing a word and asking for its meaning.
pub const DEFAULT_PROMPT_DELAY: Duration = Duration::from_millis(2000);

/// The default pause between showing a result and moving on.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

/// The result of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} out of {}", self.correct, self.total)
    }
}

/// Returns true if the answer matches the expected meaning, ignoring case only.
pub fn is_correct(answer: &str, expected: &str) -> bool {
    answer.to_lowercase() == expected.to_lowercase()
}

/// Returns the items in random order.
pub fn shuffled(items: &[VocabularyItem]) -> Vec<VocabularyItem> {
    let mut items = items.to_vec();
    items.shuffle(&mut rand::thread_rng());
    items
}

/// A practice session.
pub struct Session {
    player: Arc<Player>,
    notifier: Arc<dyn Notifier>,
    prompt_delay: Duration,
    advance_delay: Duration,
    span: Span,
}

impl Session {
    pub fn new(player: Arc<Player>, notifier: Arc<dyn Notifier>) -> Session {
        Session {
            player,
            notifier,
            prompt_delay: DEFAULT_PROMPT_DELAY,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            span: span!(Level::INFO, "practice"),
        }
    }

    /// Overrides the pacing of the session.
    pub fn with_delays(mut self, prompt_delay: Duration, advance_delay: Duration) -> Session {
        self.prompt_delay = prompt_delay;
        self.advance_delay = advance_delay;
        self
    }

    /// Runs through the items in order: plays each one, asks for its meaning, and shows
    /// whether the answer was right. A dismissed prompt counts as a wrong answer.
    pub async fn start(&self, items: &[VocabularyItem]) -> Score {
        let mut score = Score {
            correct: 0,
            total: items.len(),
        };
        if items.is_empty() {
            self.alert("There's nothing to practice.").await;
            return score;
        }

        for (index, item) in items.iter().enumerate() {
            {
                let _enter = self.span.enter();
                info!(index, clip = %item.clip(), "Practicing item");
            }
            // The outcome doesn't matter here, a spoken word is just as good.
            let _ = self.player.play(item.clip());

            tokio::time::sleep(self.prompt_delay).await;

            let answer = self
                .prompt(format!(
                    "What does \"{}\" mean in English? ({}/{})",
                    item.urdu(),
                    index + 1,
                    items.len()
                ))
                .await;

            let correct = answer
                .as_deref()
                .is_some_and(|answer| is_correct(answer, item.english()));
            {
                let _enter = self.span.enter();
                info!(index, answer, correct, "Answered");
            }
            if correct {
                score.correct += 1;
                self.alert("Correct!").await;
            } else {
                self.alert(&format!(
                    "Incorrect. The correct answer is \"{}\".",
                    item.english()
                ))
                .await;
            }

            tokio::time::sleep(self.advance_delay).await;
        }

        self.player.stop();
        self.alert(&format!("Practice complete! You got {} correct.", score))
            .await;
        score
    }

    async fn alert(&self, message: &str) {
        let notifier = self.notifier.clone();
        let message = message.to_string();
        if let Err(e) = tokio::task::spawn_blocking(move || notifier.alert(&message)).await {
            error!(err = e.to_string(), "Unable to show notice");
        }
    }

    async fn prompt(&self, message: String) -> Option<String> {
        let notifier = self.notifier.clone();
        match tokio::task::spawn_blocking(move || notifier.prompt(&message)).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(err = e.to_string(), "Unable to prompt for an answer");
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use super::{is_correct, shuffled, Score, Session};
    use crate::{
        audio::mock::{ClipEvent, Device},
        clip::ClipId,
        notice,
        testutil::harness,
        vocabulary::VocabularyItem,
    };

    fn items() -> Vec<VocabularyItem> {
        vec![
            VocabularyItem::new("پانی", "Water", ClipId::from("pani.mp3")),
            VocabularyItem::new("کتاب", "Book", ClipId::from("kitab.mp3")),
            VocabularyItem::new("دوست", "Friend", ClipId::from("dost.mp3")),
        ]
    }

    #[test]
    fn test_is_correct() {
        assert!(is_correct("water", "Water"));
        assert!(is_correct("WATER", "Water"));
        assert!(!is_correct("Waterr", "Water"));
        // No trimming.
        assert!(!is_correct(" water", "Water"));
        assert!(!is_correct("", "Water"));
    }

    #[test]
    fn test_shuffled_keeps_items() {
        let items = items();
        let mut shuffled = shuffled(&items);
        assert_eq!(items.len(), shuffled.len());
        shuffled.sort_by(|a, b| a.english().cmp(b.english()));
        assert_eq!(
            vec!["Book", "Friend", "Water"],
            shuffled.iter().map(|i| i.english()).collect::<Vec<_>>()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_session() {
        let device = Device::get("mock-device")
            .with_clip("pani.mp3", Duration::from_millis(20))
            .with_clip("kitab.mp3", Duration::from_millis(20))
            .with_clip("dost.mp3", Duration::from_millis(20));
        let h = harness(device.clone());
        let notifier = Arc::new(notice::mock::Notifier::new(vec![
            Some("water".to_string()),
            Some("Bookk".to_string()),
            None,
        ]));
        let session = Session::new(h.player.clone(), notifier.clone())
            .with_delays(Duration::from_millis(50), Duration::from_millis(10));

        let score = session.start(&items()).await;
        assert_eq!(
            Score {
                correct: 1,
                total: 3
            },
            score
        );

        let prompts = notifier.prompts();
        assert_eq!(3, prompts.len());
        assert!(prompts[0].contains("پانی"));

        let alerts = notifier.alerts();
        assert_eq!(4, alerts.len());
        assert_eq!("Correct!", alerts[0]);
        assert!(alerts[1].contains("Book"));
        assert!(alerts[2].contains("Friend"));
        assert!(alerts[3].contains("1 out of 3"));

        for clip in ["pani.mp3", "kitab.mp3", "dost.mp3"] {
            assert!(device
                .events_for(clip)
                .iter()
                .any(|(event, _)| *event == ClipEvent::Started));
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_clip_is_spoken_during_practice() {
        let h = harness(Device::get("mock-device"));
        let notifier = Arc::new(notice::mock::Notifier::new(vec![Some("water".to_string())]));
        let session = Session::new(h.player.clone(), notifier.clone())
            .with_delays(Duration::from_millis(50), Duration::ZERO);

        let items = vec![VocabularyItem::new(
            "پانی",
            "Water",
            ClipId::from("nonexistent.mp3"),
        )];
        let score = session.start(&items).await;

        assert_eq!(1, score.correct);
        assert_eq!("nonexistent.mp3", h.engine.spoken()[0].text);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_session() {
        let h = harness(Device::get("mock-device"));
        let notifier = Arc::new(notice::mock::Notifier::new(Vec::new()));
        let session = Session::new(h.player.clone(), notifier.clone());

        assert_eq!(Score::default(), session.start(&[]).await);
        assert!(notifier.prompts().is_empty());
        assert_eq!(1, notifier.alerts().len());
    }
}
