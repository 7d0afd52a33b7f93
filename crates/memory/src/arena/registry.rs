//! The three long-lived arenas and their reset cadences

use core::cell::Cell;

use strata_log::{debug, info};

use super::{Arena, ArenaConfig, ArenaSnapshot};
use crate::core::config::MemoryConfig;
use crate::error::{MemoryError, MemoryResult};

/// Application, session and frame arenas
///
/// - the application arena is never reset
/// - the session arena rewinds to the snapshot taken when the session began
/// - the frame arena rewinds once per iteration of the update loop
#[derive(Debug)]
pub struct ArenaRegistry {
    app: Arena,
    session: Arena,
    frame: Arena,
    session_snapshot: Cell<Option<ArenaSnapshot>>,
    frame_snapshot: Cell<Option<ArenaSnapshot>>,
    frame_index: Cell<u64>,
}

fn create(label: &str, config: &ArenaConfig) -> MemoryResult<Arena> {
    Arena::try_new(config)
        .map_err(|e| MemoryError::initialization_failed(format!("{label} arena: {e}")))
}

impl ArenaRegistry {
    /// Create all three arenas and open the first session
    ///
    /// Fails if any arena cannot be created; arenas created before the
    /// failure are released.
    pub fn new(config: &MemoryConfig) -> MemoryResult<Self> {
        config.validate()?;
        let app = create("app", &config.app)?;
        let session = create("session", &config.session)?;
        let frame = create("frame", &config.frame)?;

        let session_snapshot = session.snapshot_begin();
        info!(
            app = app.reserved(),
            session = session.reserved(),
            frame = frame.reserved(),
            "arena registry ready"
        );
        Ok(Self {
            app,
            session,
            frame,
            session_snapshot: Cell::new(Some(session_snapshot)),
            frame_snapshot: Cell::new(None),
            frame_index: Cell::new(0),
        })
    }

    /// Arena that lives as long as the process
    #[inline]
    pub fn app(&self) -> &Arena {
        &self.app
    }

    /// Arena reclaimed when the session is reset
    #[inline]
    pub fn session(&self) -> &Arena {
        &self.session
    }

    /// Arena reclaimed every frame
    #[inline]
    pub fn frame(&self) -> &Arena {
        &self.frame
    }

    /// Frames begun so far
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index.get()
    }

    /// Whether a frame snapshot is open
    #[must_use]
    pub fn in_frame(&self) -> bool {
        self.frame_snapshot.get().is_some()
    }

    /// Start a frame, first reclaiming the previous one if it is still open
    pub fn begin_frame(&self) -> MemoryResult<u64> {
        if let Some(snapshot) = self.frame_snapshot.take() {
            self.frame.snapshot_end(snapshot)?;
        }
        self.frame_snapshot.set(Some(self.frame.snapshot_begin()));
        let index = self.frame_index.get() + 1;
        self.frame_index.set(index);
        Ok(index)
    }

    /// Reclaim everything pushed to the frame arena since [`begin_frame`](Self::begin_frame)
    pub fn end_frame(&self) -> MemoryResult<()> {
        let Some(snapshot) = self.frame_snapshot.take() else {
            return Err(MemoryError::invalid_state("end_frame without begin_frame"));
        };
        if let Err(err) = self.frame.snapshot_end(snapshot) {
            self.frame_snapshot.set(Some(snapshot));
            return Err(err);
        }
        Ok(())
    }

    /// Open a session; fails if one is already open
    pub fn begin_session(&self) -> MemoryResult<()> {
        if self.session_snapshot.get().is_some() {
            return Err(MemoryError::invalid_state("session already open"));
        }
        self.session_snapshot.set(Some(self.session.snapshot_begin()));
        debug!("session begun");
        Ok(())
    }

    /// Close the session, reclaiming everything pushed to the session arena
    pub fn end_session(&self) -> MemoryResult<()> {
        let Some(snapshot) = self.session_snapshot.take() else {
            return Err(MemoryError::invalid_state("end_session without an open session"));
        };
        if let Err(err) = self.session.snapshot_end(snapshot) {
            self.session_snapshot.set(Some(snapshot));
            return Err(err);
        }
        debug!("session ended");
        Ok(())
    }

    /// End the current session and immediately open a new one
    pub fn reset_session(&self) -> MemoryResult<()> {
        if self.session_snapshot.get().is_some() {
            self.end_session()?;
        }
        self.begin_session()
    }
}

impl Drop for ArenaRegistry {
    fn drop(&mut self) {
        if let Some(snapshot) = self.frame_snapshot.take() {
            let _ = self.frame.snapshot_end(snapshot);
        }
        if let Some(snapshot) = self.session_snapshot.take() {
            let _ = self.session.snapshot_end(snapshot);
        }
    }
}
