//! Fire-and-forget sound cues raised by thinkers.
//!
//! The simulation never talks to a mixer directly. State machines push
//! [`SoundEvent`]s into a [`SoundOutbox`] and whoever owns the audio device
//! drains it between tics.

use crate::numeric::Fixed;

/// Sound effects the simulation core can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sfx {
    /// Grinding stone, repeated while a plane moves.
    Stnmov,
    /// Platform starts moving.
    Pstart,
    /// Platform or crusher stops.
    Pstop,
    /// Door opens.
    Doropn,
    /// Door closes.
    Dorcls,
    /// Fast door opens.
    Bdopn,
    /// Fast door closes.
    Bdcls,
    /// Player grunt, used when a locked door refuses.
    Oof,
    /// Switch flips back.
    Swtchn,
    /// Item reappears.
    Itmbk,
}

/// Where a sound originates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundOrigin {
    /// The centre of a sector, by index.
    Sector(usize),
    /// A fixed map position.
    Point {
        /// Map x.
        x: Fixed,
        /// Map y.
        y: Fixed,
    },
    /// Not positioned.
    Global,
}

/// One requested sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundEvent {
    /// Effect to play.
    pub sfx: Sfx,
    /// Position the effect plays from.
    pub origin: SoundOrigin,
}

/// Buffered sound requests awaiting the audio layer.
#[derive(Debug, Default, Clone)]
pub struct SoundOutbox {
    events: Vec<SoundEvent>,
}

impl SoundOutbox {
    /// Queues `sfx` at `origin`.
    pub fn start(&mut self, origin: SoundOrigin, sfx: Sfx) {
        self.push(SoundEvent { sfx, origin });
    }

    /// Queues a prepared request.
    pub fn push(&mut self, event: SoundEvent) {
        self.events.push(event);
    }

    /// Queues several requests in order.
    pub fn extend<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = SoundEvent>,
    {
        self.events.extend(events);
    }

    /// Hands every pending request to the audio layer, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, SoundEvent> {
        self.events.drain(..)
    }

    /// Whether nothing is waiting to play.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending requests, oldest first.
    #[must_use]
    pub const fn pending(&self) -> &[SoundEvent] {
        self.events.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn start_appends_single_event() {
        let mut outbox = SoundOutbox::default();
        assert!(outbox.is_empty());
        outbox.start(SoundOrigin::Sector(3), Sfx::Pstart);
        assert!(!outbox.is_empty());
        let drained: Vec<_> = outbox.drain().collect();
        assert_eq!(
            drained,
            vec![SoundEvent {
                sfx: Sfx::Pstart,
                origin: SoundOrigin::Sector(3)
            }]
        );
        assert!(outbox.is_empty());
    }

    #[rstest]
    fn extend_keeps_request_order() {
        let mut outbox = SoundOutbox::default();
        let first = SoundEvent {
            sfx: Sfx::Doropn,
            origin: SoundOrigin::Global,
        };
        let second = SoundEvent {
            sfx: Sfx::Dorcls,
            origin: SoundOrigin::Sector(0),
        };
        outbox.extend(vec![first, second]);
        assert_eq!(outbox.pending(), &[first, second]);
    }
}
