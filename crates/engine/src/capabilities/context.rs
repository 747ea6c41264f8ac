//! Database selection and ownership mode.

use ember_core::{Context, Error, Result};
use tracing::debug;

use crate::invocation::{invocation, invocation_ref, Ownership};

pub(super) fn get_selected_db(ctx: &Context) -> usize {
    invocation_ref(ctx).map_or(0, |inv| inv.db)
}

/// The selection outlives the invocation: it becomes the session's.
pub(super) fn select_db(ctx: &mut Context, db: usize) -> Result<()> {
    let inv = invocation(ctx)?;
    if db >= inv.shared.config.databases {
        return Err(Error::NoSuchDb {
            index: i64::try_from(db).unwrap_or(i64::MAX),
        });
    }
    inv.db = db;
    Ok(())
}

/// Switch to scoped ownership. There is no way back.
pub(super) fn auto_memory(ctx: &mut Context) {
    if let Ok(inv) = invocation(ctx) {
        if inv.ownership != Ownership::Scoped {
            debug!(target: "ember::dispatch", command = %inv.command, "scoped ownership");
            inv.ownership = Ownership::Scoped;
        }
    }
}
