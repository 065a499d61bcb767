//! Parameter change notification.
//!
//! Writers publish [`ParamChange`]s; once per frame the queue is dispatched to
//! every observer in publish order. Store and scene never reference each other.

use crate::params::ParamChange;
use std::collections::VecDeque;

pub trait ParamObserver {
    fn param_changed(&mut self, change: &ParamChange);
}

#[derive(Debug, Default)]
pub struct ParamBus {
    pending: VecDeque<ParamChange>,
}

impl ParamBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, change: ParamChange) {
        log::trace!("publish {} = {}", change.param, change.value);
        self.pending.push_back(change);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Delivers and drains every queued change. Returns how many were delivered.
    pub fn dispatch(&mut self, observers: &mut [&mut dyn ParamObserver]) -> usize {
        let mut delivered = 0;
        while let Some(change) = self.pending.pop_front() {
            for observer in observers.iter_mut() {
                observer.param_changed(&change);
            }
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::{ParamBus, ParamObserver};
    use crate::params::{Param, ParamChange};

    #[derive(Default)]
    struct Recorder {
        seen: Vec<ParamChange>,
    }

    impl ParamObserver for Recorder {
        fn param_changed(&mut self, change: &ParamChange) {
            self.seen.push(*change);
        }
    }

    #[test]
    fn dispatch_delivers_in_publish_order_to_every_observer() {
        let mut bus = ParamBus::new();
        bus.publish(ParamChange::scalar(Param::Scale, 1.0));
        bus.publish(ParamChange::flag(Param::ShowGrid, false));
        assert_eq!(bus.pending(), 2);

        let mut first = Recorder::default();
        let mut second = Recorder::default();
        let delivered = bus.dispatch(&mut [&mut first, &mut second]);

        assert_eq!(delivered, 2);
        assert_eq!(bus.pending(), 0);
        assert_eq!(first.seen, second.seen);
        assert_eq!(first.seen[0].param, Param::Scale);
        assert_eq!(first.seen[1].param, Param::ShowGrid);
    }

    #[test]
    fn dispatch_without_observers_still_drains() {
        let mut bus = ParamBus::new();
        bus.publish(ParamChange::scalar(Param::Shininess, 5.0));
        assert_eq!(bus.dispatch(&mut []), 1);
        assert_eq!(bus.pending(), 0);
    }
}
