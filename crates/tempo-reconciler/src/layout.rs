//! Calendar geometry for a day view.
//!
//! Events become absolutely positioned blocks: the vertical offset and
//! height follow from the clock times, and overlapping events share the
//! width side by side. Overlap is transitive; a chain of overlapping
//! events forms one cluster whose column count is the widest point of the
//! chain.

use serde::{Deserialize, Serialize};
use tempo_types::{Event, EventId};
use ts_rs::TS;

/// Pixel scale of the day view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct LayoutOptions {
    /// Height of one hour in pixels.
    pub hour_height: u32,
    /// Hour drawn at the top of the view.
    pub day_start_hour: u16,
    /// Smallest block height in pixels.
    pub min_height: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            hour_height: 60,
            day_start_hour: 0,
            min_height: 20,
        }
    }
}

/// One positioned event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventBlock {
    /// The event drawn.
    pub event_id: EventId,
    /// Offset from the top of the view, in pixels.
    pub top: u32,
    /// Block height, in pixels.
    pub height: u32,
    /// Zero-based column within the overlap cluster.
    pub column: u32,
    /// Columns in the overlap cluster.
    pub columns: u32,
}

/// Position `events` (any order) for display.
///
/// Blocks are returned in start order. Events starting before
/// `day_start_hour` are pinned to the top.
pub fn layout(events: &[Event], options: &LayoutOptions) -> Vec<EventBlock> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let view_start = u32::from(options.day_start_hour).saturating_mul(60);
    let to_px = |minutes: u32| {
        minutes
            .saturating_sub(view_start)
            .saturating_mul(options.hour_height)
            .checked_div(60)
            .unwrap_or(0)
    };

    let mut blocks = Vec::with_capacity(sorted.len());
    let mut cluster: Vec<usize> = Vec::new();
    let mut column_ends: Vec<u16> = Vec::new();
    let mut cluster_end: u16 = 0;

    for event in sorted {
        let start = event.start.minutes();
        let end = event.effective_end().minutes();

        if !cluster.is_empty() && start >= cluster_end {
            close_cluster(&mut blocks, &cluster, column_ends.len());
            cluster.clear();
            column_ends.clear();
        }

        let column = match column_ends.iter().position(|&col_end| col_end <= start) {
            Some(free) => {
                if let Some(slot) = column_ends.get_mut(free) {
                    *slot = end;
                }
                free
            }
            None => {
                column_ends.push(end);
                column_ends.len().saturating_sub(1)
            }
        };
        cluster_end = if cluster.is_empty() { end } else { cluster_end.max(end) };

        let top = to_px(u32::from(start));
        let bottom = to_px(u32::from(end));
        cluster.push(blocks.len());
        blocks.push(EventBlock {
            event_id: event.id.clone(),
            top,
            height: bottom.saturating_sub(top).max(options.min_height),
            column: u32::try_from(column).unwrap_or(u32::MAX),
            columns: 1,
        });
    }
    close_cluster(&mut blocks, &cluster, column_ends.len());
    blocks
}

fn close_cluster(blocks: &mut [EventBlock], cluster: &[usize], columns: usize) {
    let columns = u32::try_from(columns.max(1)).unwrap_or(u32::MAX);
    for &index in cluster {
        if let Some(block) = blocks.get_mut(index) {
            block.columns = columns;
        }
    }
}
