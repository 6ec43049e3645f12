//! Request and payload types for the portal's paginated gadget endpoint.

use vivagenda_core::AppConfig;

/// Raw payload as returned by the gadget endpoint: an untyped JSON object
/// whose `"data"` key holds an array of fixed-width rows. It stays untyped
/// because the normalizer must degrade gracefully on any structural drift.
pub type RawPayload = serde_json::Value;

/// Query parameters for `bit/gadget/view_paginate.json`.
///
/// The endpoint is built for incremental UI pagination (`draw`/`start`/
/// `length` follow the DataTables protocol), but the pipeline requests the
/// whole dataset in one call with a page length far above the observed row
/// counts.
#[derive(Debug, Clone)]
pub struct ScheduleQuery {
    /// Portal-side id of the configured schedule gadget.
    pub gadget_id: u32,
    /// DataTables draw counter; the portal echoes it back.
    pub draw: u32,
    /// Row offset to start from.
    pub start: u32,
    /// Page size. The default covers the whole dataset.
    pub length: u32,
}

impl Default for ScheduleQuery {
    fn default() -> Self {
        Self {
            gadget_id: 225,
            draw: 1,
            start: 0,
            length: 10_000,
        }
    }
}

impl ScheduleQuery {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            gadget_id: config.gadget_id,
            length: config.page_length,
            ..Self::default()
        }
    }
}
