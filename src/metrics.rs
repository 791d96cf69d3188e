//! Stage lifecycle metrics recorded through the `metrics` facade.
//!
//! Nothing is exported unless the application installs a recorder.

use ::metrics::{counter, describe_counter, describe_gauge, gauge, Unit};

pub const STREAMS_OPENED: &str = "conveyor_streams_opened_total";
pub const STREAMS_CLOSED: &str = "conveyor_streams_closed_total";
pub const STREAMS_ACTIVE: &str = "conveyor_streams_active";

/// Register descriptions for every metric this crate records.
///
/// Optional; call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(STREAMS_OPENED, Unit::Count, "Stream tasks started");
    describe_counter!(STREAMS_CLOSED, Unit::Count, "Stream tasks finished");
    describe_gauge!(STREAMS_ACTIVE, Unit::Count, "Stream tasks currently running");
}

#[inline]
pub(crate) fn stream_opened(stage: &str) {
    counter!(STREAMS_OPENED, "stage" => stage.to_string()).increment(1);
    gauge!(STREAMS_ACTIVE, "stage" => stage.to_string()).increment(1.0);
}

#[inline]
pub(crate) fn stream_closed(stage: &str) {
    counter!(STREAMS_CLOSED, "stage" => stage.to_string()).increment(1);
    gauge!(STREAMS_ACTIVE, "stage" => stage.to_string()).decrement(1.0);
}
