//! JSON-lines event stream driving a controller, as used by `strata replay`.

use std::io::BufRead;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use strata_blocks::StateId;
use strata_world::BlockPos;

use crate::assets::AssetLoader;
use crate::dispatch::DispatchController;
use crate::scene::Scene;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Version {
        version: String,
    },
    /// `chunk` is a column snapshot, inline or as a JSON-encoded string.
    Chunk {
        x: i32,
        z: i32,
        chunk: Value,
    },
    Unload {
        x: i32,
        z: i32,
    },
    Block {
        x: i32,
        y: i32,
        z: i32,
        #[serde(rename = "stateId")]
        state_id: StateId,
    },
    Reset,
    /// Wait for outstanding work before continuing.
    Settle,
}

impl StreamEvent {
    /// `None` for blank and `#` comment lines.
    pub fn parse_line(line: &str) -> Option<Result<StreamEvent, serde_json::Error>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        Some(serde_json::from_str(line))
    }

    /// Feeds the event to `ctl`. Returns `false` only when a settle timed out.
    pub fn apply<S: Scene>(
        self,
        ctl: &mut DispatchController<S>,
        assets: &mut AssetLoader,
        settle_timeout: Duration,
    ) -> bool {
        match self {
            StreamEvent::Version { version } => ctl.set_version(&version, assets),
            StreamEvent::Chunk { x, z, chunk } => {
                let raw = match chunk {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                ctl.add_column(x, z, raw);
            }
            StreamEvent::Unload { x, z } => ctl.remove_column(x, z),
            StreamEvent::Block { x, y, z, state_id } => {
                ctl.set_block_state_id(BlockPos::new(x, y, z), state_id)
            }
            StreamEvent::Reset => ctl.reset_world(),
            StreamEvent::Settle => {
                if !ctl.wait_until_settled(settle_timeout) {
                    log::warn!(
                        target: "dispatch",
                        "settle timed out with {} sections outstanding",
                        ctl.outstanding_len()
                    );
                    return false;
                }
            }
        }
        true
    }
}

/// Parses every line of `reader`, logging and skipping malformed ones.
pub fn read_events(reader: impl BufRead) -> Vec<StreamEvent> {
    let mut out = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("stream read failed at line {}: {}", n + 1, e);
                break;
            }
        };
        match StreamEvent::parse_line(&line) {
            None => {}
            Some(Ok(ev)) => out.push(ev),
            Some(Err(e)) => log::warn!("skipping malformed line {}: {}", n + 1, e),
        }
    }
    out
}
