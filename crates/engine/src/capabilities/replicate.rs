//! Replication capabilities.

use ember_core::{pack, CallArg, Context, Result};
use tracing::debug;

use crate::invocation::invocation;
use crate::propagate::Propagated;

/// Replicate: queue a synthesized command against the selected database.
///
/// The arguments are packed exactly like `Call`; a `!` code is accepted
/// and has no effect.
pub(super) fn replicate(ctx: &mut Context, command: &str, format: &str, args: &[CallArg]) -> Result<()> {
    let packed = pack(command, format, args)?;
    let inv = invocation(ctx)?;
    debug!(target: "ember::propagate", command, caller = %inv.command, "replicate");
    inv.propagator.push(Propagated::new(inv.db, packed.argv));
    Ok(())
}

/// ReplicateVerbatim: propagate the client command as issued.
pub(super) fn verbatim(ctx: &mut Context) -> Result<()> {
    let inv = invocation(ctx)?;
    debug!(target: "ember::propagate", caller = %inv.command, pending = inv.propagator.len(), "replicate verbatim");
    inv.propagator.set_verbatim();
    Ok(())
}
