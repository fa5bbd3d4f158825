//! Event selection from an age's pool and resolution of branch and
//! post-event chains.

use rand::rngs::StdRng;

use crate::core::draw::weighted_pick;
use crate::core::property::PropertyState;
use crate::core::session::ContentLine;
use crate::schema::age::AgeSlot;
use crate::schema::config::GameConfig;
use crate::schema::event::PostEvent;

/// What one event chain produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChain {
    pub lines: Vec<ContentLine>,
    /// Every event that fired, in order.
    pub fired: Vec<i32>,
    /// A fired event ends the life.
    pub terminal: bool,
}

/// Choose the event that fires from `slot`'s pool.
///
/// The first eligible no-random event in pool order fires without a draw.
/// Otherwise one eligible event is drawn by weight. Pool entries naming
/// unknown events are ignored.
pub fn select(
    config: &GameConfig,
    slot: &AgeSlot,
    state: &PropertyState,
    rng: &mut StdRng,
) -> Option<i32> {
    let mut drawable: Vec<(i32, f64)> = Vec::with_capacity(slot.pool.len());
    for entry in &slot.pool {
        let Some(event) = config.event(entry.event_id) else {
            tracing::debug!(age = slot.age, event = entry.event_id, "pool names unknown event");
            continue;
        };
        if !event.is_eligible(state) {
            continue;
        }
        if event.no_random {
            tracing::trace!(age = slot.age, event = event.id, "no-random event fires");
            return Some(event.id);
        }
        drawable.push((entry.event_id, entry.weight));
    }

    let picked = weighted_pick(&drawable, rng);
    tracing::trace!(age = slot.age, candidates = drawable.len(), picked = ?picked, "event draw");
    picked
}

/// Fire `first` and follow its branches and post-events.
///
/// Each hop applies the event's effect, then checks its branches in order
/// against the updated state; the first match is the next hop, otherwise a
/// post-event id is. Post-event text is appended to the event's own line.
/// The chain stops at an unknown id or after `max_chain_depth` hops.
pub fn fire(
    config: &GameConfig,
    first: i32,
    state: &mut PropertyState,
    rng: &mut StdRng,
) -> EventChain {
    let mut chain = EventChain::default();
    let mut next = Some(first);
    let max_depth = config.settings.max_chain_depth;

    while let Some(id) = next.take() {
        if chain.fired.len() >= max_depth {
            tracing::debug!(event = id, depth = max_depth, "event chain cut at depth cap");
            break;
        }
        let Some(event) = config.event(id) else {
            tracing::debug!(event = id, "chain names unknown event");
            break;
        };

        state.record_event(id);
        chain.fired.push(id);
        if let Some(ref effect) = event.effect {
            state.apply(effect, rng);
        }
        chain.terminal |= event.terminal;

        let mut text = event.text.clone();
        let branch = event
            .branches
            .iter()
            .find(|branch| branch.condition.check(&*state));
        next = match (branch, &event.post_event) {
            (Some(branch), _) => Some(branch.event_id),
            (None, Some(PostEvent::Event(target))) => Some(*target),
            (None, Some(PostEvent::Text(extra))) => {
                text.push_str(extra);
                None
            }
            (None, None) => None,
        };
        chain.lines.push(ContentLine::event(text, event.grade));
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::Stat;
    use rand::SeedableRng;
    use serde_json::json;

    fn config() -> GameConfig {
        GameConfig::from_json_value(json!({
            "events": {
                "1": {"event": "Born.", "effect": {"CHR": 3},
                      "branch": ["CHR>=3:2", "CHR<3:3"]},
                "2": {"event": "A pretty baby.", "postEvent": " Everyone smiled."},
                "3": {"event": "A plain baby."},
                "4": {"event": "Loop.", "postEvent": 4},
                "5": {"event": "Dangling.", "postEvent": 999},
                "6": {"event": "Forced.", "NoRandom": true, "include": "CHR>5"},
                "7": {"event": "Ordinary."},
                "8": {"event": "Never.", "exclude": "AGE>=0"},
                "9": {"event": "Death.", "isEnd": true, "effect": {"LIF": -1}}
            },
            "ages": {
                "0": {"events": [[7, 1.0], [6, 1.0], [8, 100.0]]},
                "1": {"events": [[7, 0.0], [999, 1.0]]}
            }
        }))
        .unwrap()
    }

    fn setup() -> (GameConfig, PropertyState, StdRng) {
        let config = config();
        let mut state = PropertyState::new(&config.settings);
        state.next_year();
        (config, state, StdRng::seed_from_u64(11))
    }

    #[test]
    fn branch_is_checked_after_the_effect() {
        let (config, mut state, mut rng) = setup();
        let chain = fire(&config, 1, &mut state, &mut rng);
        assert_eq!(chain.fired, vec![1, 2]);
        assert_eq!(chain.lines.len(), 2);
        assert_eq!(chain.lines[1].description, "A pretty baby. Everyone smiled.");
        assert_eq!(state.events(), &[1, 2]);
        assert!(!chain.terminal);
    }

    #[test]
    fn cyclic_chain_stops_at_depth_cap() {
        let (config, mut state, mut rng) = setup();
        let chain = fire(&config, 4, &mut state, &mut rng);
        assert_eq!(chain.fired.len(), config.settings.max_chain_depth);
        assert_eq!(state.events(), &[4]);
    }

    #[test]
    fn dangling_post_event_is_skipped() {
        let (config, mut state, mut rng) = setup();
        let chain = fire(&config, 5, &mut state, &mut rng);
        assert_eq!(chain.fired, vec![5]);
    }

    #[test]
    fn terminal_event_marks_chain() {
        let (config, mut state, mut rng) = setup();
        let chain = fire(&config, 9, &mut state, &mut rng);
        assert!(chain.terminal);
        assert!(state.is_dead());
    }

    #[test]
    fn no_random_event_fires_when_eligible() {
        let (config, mut state, mut rng) = setup();
        let slot = config.age(0).unwrap();
        for _ in 0..20 {
            assert_eq!(select(&config, slot, &state, &mut rng), Some(7));
        }
        state.set(Stat::Charm, 6);
        assert_eq!(select(&config, slot, &state, &mut rng), Some(6));
    }

    #[test]
    fn unknown_and_weightless_entries_leave_nothing_to_draw() {
        let (config, state, mut rng) = setup();
        let slot = config.age(1).unwrap();
        assert_eq!(select(&config, slot, &state, &mut rng), None);
    }
}
