//! Load-time capabilities.

use ember_core::{CommandFn, Context, Error, Result, API_VERSION_1};
use tracing::{debug, warn};

use crate::invocation::{loading, LoadFrame};
use crate::registry::ModuleAttribs;

/// CreateCommand: stage a command for registration.
///
/// The name must be free among built-ins, loaded modules and this module's
/// own staged commands. Matching ignores ASCII case.
pub(super) fn create_command(ctx: &mut Context, name: &str, handler: CommandFn) -> Result<()> {
    let frame = loading(ctx)?;
    if name.is_empty() {
        return Err(Error::invalid_value("command name must not be empty"));
    }
    let taken = frame.shared.registry.read().contains(name)
        || frame
            .staged
            .iter()
            .any(|(staged, _)| staged.eq_ignore_ascii_case(name));
    if taken {
        warn!(target: "ember::module", command = name, "duplicate command registration");
        return reject(frame, || Error::DuplicateCommand {
            name: name.to_string(),
        });
    }
    debug!(target: "ember::module", command = name, "command staged");
    frame.staged.push((name.to_string(), handler));
    Ok(())
}

/// SetModuleAttribs: declare the module and the protocol version it speaks.
pub(super) fn set_module_attribs(
    ctx: &mut Context,
    name: &str,
    version: u32,
    api_version: u32,
) -> Result<()> {
    let frame = loading(ctx)?;
    if api_version != API_VERSION_1 {
        return reject(frame, || Error::UnsupportedApiVersion {
            requested: api_version,
        });
    }
    if frame.shared.registry.read().has_module(name) {
        return reject(frame, || Error::ModuleAlreadyLoaded {
            name: name.to_string(),
        });
    }
    frame.attribs = Some(ModuleAttribs {
        name: name.to_string(),
        version,
        api_version,
    });
    Ok(())
}

/// Fail a load-time call, remembering the first failure so the host can
/// report it if the entry point gives up.
fn reject(frame: &mut LoadFrame, error: impl Fn() -> Error) -> Result<()> {
    frame.failure.get_or_insert_with(&error);
    Err(error())
}
