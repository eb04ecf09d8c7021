use crate::{channel_map::ChannelMap, event::Event, parameters::ParameterStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouteSummary {
    pub routed: usize,
    pub unmapped: usize,
}

/// Fans the hits of an event into the parameters of the channel map.
#[derive(Debug)]
pub struct EventDecoder {
    channel_map: ChannelMap,
}

impl EventDecoder {
    pub fn new(channel_map: ChannelMap) -> Self {
        Self { channel_map }
    }

    pub fn channel_map(&self) -> &ChannelMap {
        &self.channel_map
    }

    /// Hits whose identifier is not mapped are skipped. If two hits share a
    /// parameter the later one wins.
    pub fn route(&self, event: &Event, store: &mut ParameterStore) -> RouteSummary {
        let mut summary = RouteSummary::default();
        for hit in event.hits() {
            match self.channel_map.resolve(hit.id) {
                Some(id) => {
                    store.set(id, hit.value);
                    summary.routed += 1;
                }
                None => summary.unmapped += 1,
            }
        }
        summary
    }
}
