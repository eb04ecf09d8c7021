use serde::Deserialize;
use specter_common::{BoardId, Channel, ChannelUuid, board_channel_uuid};
use std::io::{self, BufRead};

/// One digitised channel reading within an event.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Hit {
    pub id: ChannelUuid,
    pub value: f64,
}

impl Hit {
    pub fn new(id: ChannelUuid, value: f64) -> Self {
        Self { id, value }
    }

    /// `None` if the pair has no identifier, see [board_channel_uuid].
    pub fn from_board_channel(board: BoardId, channel: Channel, value: f64) -> Option<Self> {
        board_channel_uuid(board, channel).map(|id| Self::new(id, value))
    }
}

/// The hits sharing one trigger.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Event {
    hits: Vec<Hit>,
}

impl Event {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl FromIterator<Hit> for Event {
    fn from_iter<I: IntoIterator<Item = Hit>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A decoded line of a JSON-lines event stream, numbered from one.
pub type EventLine = (usize, Result<Event, serde_json::Error>);

/// Reads one event per line, skipping blank lines.
///
/// A line which is not a valid event, including one which is not UTF-8, is
/// yielded as its decode error so the caller can carry on with the next line.
/// Only failures of the underlying reader are returned as `io::Error`.
pub fn read_events<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<EventLine>> {
    reader
        .split(b'\n')
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) => {
                let line = line.trim_ascii();
                (!line.is_empty()).then(|| Ok((index + 1, serde_json::from_slice(line))))
            }
            Err(e) => Some(Err(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn event_deserialises_from_json() {
        let event: Event =
            serde_json::from_str(r#"{"hits": [{"id": 29, "value": 1200}, {"id": 3, "value": 1.5}]}"#)
                .unwrap();
        assert_eq!(
            event.hits(),
            &[Hit::new(29, 1200.0), Hit::new(3, 1.5)]
        );
    }

    #[test]
    fn hit_from_board_channel_uses_pairing() {
        assert_eq!(Hit::from_board_channel(4, 5, 10.0).map(|hit| hit.id), Some(29));
        assert_eq!(Hit::from_board_channel(70_000, 0, 10.0), None);
    }

    #[test]
    fn bad_lines_do_not_stop_the_stream() {
        let mut input = b"{\"hits\": [{\"id\": 29, \"value\": 1}]}\n".to_vec();
        input.extend_from_slice(b"{\"hits\":\xff\xfe}\n");
        input.extend_from_slice(b"\n{\"hits\": [\n");
        input.extend_from_slice(b"{\"hits\": []}\r\n");

        let lines = read_events(Cursor::new(input))
            .collect::<io::Result<Vec<_>>>()
            .unwrap();

        let numbers: Vec<_> = lines.iter().map(|(number, _)| *number).collect();
        assert_eq!(numbers, [1, 2, 4, 5]);
        let decoded: Vec<_> = lines.iter().map(|(_, event)| event.is_ok()).collect();
        assert_eq!(decoded, [true, false, false, true]);
        assert_eq!(
            lines.first().and_then(|(_, event)| event.as_ref().ok()),
            Some(&Event::new(vec![Hit::new(29, 1.0)]))
        );
    }
}
