//! Capability vocabulary shared by the host and modules.
//!
//! A module never links against the host. At load time it receives a
//! [`Context`] whose first field is a bootstrap accessor; asking that accessor
//! for a capability name yields a [`Capability`], a tagged entry point with a
//! fixed signature. The module keeps the resolved entry points for the rest
//! of the process and reaches the host only through them.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::call::CallArg;
use crate::error::Result;
use crate::range::ZsetRange;
use crate::reply::ReplyType;
use crate::string::ModuleString;
use crate::types::{
    KeyHandle, KeyType, ListEnd, OpenMode, ReplyHandle, Status, ZaddMode, ZaddOutcome,
};

/// Bootstrap accessor: resolves a capability by name.
pub type GetApiFn = fn(&str) -> Option<Capability>;

/// Command handler. The argument slice includes the command name at index 0.
pub type CommandFn = fn(&mut Context, &[ModuleString]) -> Status;

/// Module entry point run once when the module is loaded.
pub type OnLoadFn = fn(&mut Context, &[ModuleString]) -> Status;

/// Context handed to module code by the host.
///
/// The bootstrap accessor is the first field and the layout is fixed, so a
/// module can find it without knowing anything else about the host. The rest
/// is host state that modules treat as opaque.
#[repr(C)]
pub struct Context {
    bootstrap: GetApiFn,
    host: Box<dyn Any>,
}

impl Context {
    /// Create a context around host-private state.
    pub fn new(bootstrap: GetApiFn, host: Box<dyn Any>) -> Self {
        Context { bootstrap, host }
    }

    /// The accessor modules use to resolve capabilities.
    pub fn bootstrap(&self) -> GetApiFn {
        self.bootstrap
    }

    /// Host-private state. Only the host knows its concrete type.
    #[doc(hidden)]
    pub fn host_state(&self) -> &dyn Any {
        self.host.as_ref()
    }

    /// Host-private state. Only the host knows its concrete type.
    #[doc(hidden)]
    pub fn host_state_mut(&mut self) -> &mut dyn Any {
        self.host.as_mut()
    }

    /// Tear the context down, returning the host state.
    pub fn into_host_state(self) -> Box<dyn Any> {
        self.host
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

/// Direct, mutable view of a stored string value.
///
/// Writes through the view land in the stored value immediately. The view
/// borrows the context, so no other capability can run while it is alive.
pub struct StringDma<'a> {
    bytes: Box<dyn DerefMut<Target = [u8]> + 'a>,
}

impl<'a> StringDma<'a> {
    /// Wrap a host guard over the stored bytes.
    pub fn new(bytes: impl DerefMut<Target = [u8]> + 'a) -> Self {
        StringDma {
            bytes: Box::new(bytes),
        }
    }
}

impl Deref for StringDma<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for StringDma<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

// ---------------------------------------------------------------------------
// Entry point signatures
// ---------------------------------------------------------------------------

/// Register a command while loading.
pub type CreateCommandFn = fn(&mut Context, &str, CommandFn) -> Result<()>;
/// Record module name, version and protocol version while loading.
pub type SetModuleAttribsFn = fn(&mut Context, &str, u32, u32) -> Result<()>;

/// Reply with the standard arity error.
pub type WrongArityFn = fn(&mut Context) -> Status;
/// Reply with an integer.
pub type ReplyWithLongLongFn = fn(&mut Context, i64) -> Status;
/// Reply with an error string (`<CLASS-TOKEN> <message>`).
pub type ReplyWithErrorFn = fn(&mut Context, &str) -> Status;
/// Reply with a status string.
pub type ReplyWithSimpleStringFn = fn(&mut Context, &str) -> Status;
/// Start an array reply of the given length.
pub type ReplyWithArrayFn = fn(&mut Context, usize) -> Status;
/// Reply with a bulk string from raw bytes.
pub type ReplyWithStringBufferFn = fn(&mut Context, &[u8]) -> Status;
/// Reply with a bulk string from a module string.
pub type ReplyWithStringFn = fn(&mut Context, &ModuleString) -> Status;
/// Reply with null.
pub type ReplyWithNullFn = fn(&mut Context) -> Status;
/// Relay a reply object unchanged.
pub type ReplyWithCallReplyFn = fn(&mut Context, ReplyHandle) -> Status;
/// Reply with a double, encoded as a bulk string.
pub type ReplyWithDoubleFn = fn(&mut Context, f64) -> Status;

/// Currently selected logical database.
pub type GetSelectedDbFn = fn(&Context) -> usize;
/// Select another logical database for the rest of the invocation.
pub type SelectDbFn = fn(&mut Context, usize) -> Result<()>;

/// Open a key. Never fails because the key does not exist.
pub type OpenKeyFn = fn(&mut Context, &[u8], OpenMode) -> Result<KeyHandle>;
/// Release a key handle.
pub type CloseKeyFn = fn(&mut Context, KeyHandle) -> Result<()>;
/// Type of the value behind a key handle.
pub type KeyTypeFn = fn(&mut Context, KeyHandle) -> Result<KeyType>;
/// Length of the value: bytes, elements or members.
pub type ValueLengthFn = fn(&mut Context, KeyHandle) -> Result<usize>;
/// Delete the value behind a key handle.
pub type DeleteKeyFn = fn(&mut Context, KeyHandle) -> Result<()>;

/// Push onto a list, creating it if empty. Returns the new length.
pub type ListPushFn = fn(&mut Context, KeyHandle, ListEnd, &ModuleString) -> Result<usize>;
/// Pop from a list; `None` when there is nothing to pop.
pub type ListPopFn = fn(&mut Context, KeyHandle, ListEnd) -> Result<Option<ModuleString>>;

/// Overwrite the value with a string.
pub type StringSetFn = fn(&mut Context, KeyHandle, &ModuleString) -> Result<()>;
/// Mutable view of a stored string.
pub type StringDmaFn = for<'a> fn(&'a mut Context, KeyHandle) -> Result<StringDma<'a>>;
/// Resize a stored string, zero padding when growing.
pub type StringTruncateFn = fn(&mut Context, KeyHandle, usize) -> Result<()>;

/// Remaining time to live in milliseconds, or `NO_EXPIRE`.
pub type GetExpireFn = fn(&mut Context, KeyHandle) -> Result<i64>;
/// Set time to live in milliseconds, or remove it with `NO_EXPIRE`.
pub type SetExpireFn = fn(&mut Context, KeyHandle, i64) -> Result<()>;

/// Add or update a member.
pub type ZsetAddFn = fn(&mut Context, KeyHandle, f64, &ModuleString, ZaddMode) -> Result<ZaddOutcome>;
/// Increment a member's score; returns the outcome and the new score.
pub type ZsetIncrbyFn =
    fn(&mut Context, KeyHandle, f64, &ModuleString, ZaddMode) -> Result<(ZaddOutcome, Option<f64>)>;
/// Score of a member.
pub type ZsetScoreFn = fn(&mut Context, KeyHandle, &ModuleString) -> Result<Option<f64>>;
/// Remove a member; returns whether it existed.
pub type ZsetRemFn = fn(&mut Context, KeyHandle, &ModuleString) -> Result<bool>;
/// Position the key's range cursor on the first member of a range.
pub type ZsetFirstInRangeFn = fn(&mut Context, KeyHandle, &ZsetRange) -> Result<()>;
/// Member and score under the cursor.
pub type ZsetRangeCurrentElementFn = fn(&mut Context, KeyHandle) -> Result<(ModuleString, f64)>;
/// Advance the cursor; returns whether it landed on a member.
pub type ZsetRangeNextFn = fn(&mut Context, KeyHandle) -> Result<bool>;
/// Whether the cursor moved past the end of its range.
pub type ZsetRangeEndReachedFn = fn(&mut Context, KeyHandle) -> Result<bool>;
/// Release the cursor.
pub type ZsetRangeStopFn = fn(&mut Context, KeyHandle) -> Result<()>;

/// Run a command synchronously and return its reply.
pub type CallFn = fn(&mut Context, &str, &str, &[CallArg]) -> Result<ReplyHandle>;
/// Encoded bytes of a reply.
pub type CallReplyProtoFn = fn(&Context, ReplyHandle) -> Result<&[u8]>;
/// Release a reply.
pub type FreeCallReplyFn = fn(&mut Context, ReplyHandle) -> Result<()>;
/// Tag of a reply.
pub type CallReplyTypeFn = fn(&Context, ReplyHandle) -> Result<ReplyType>;
/// Integer payload of a reply.
pub type CallReplyIntegerFn = fn(&Context, ReplyHandle) -> Result<i64>;
/// String length or element count of a reply.
pub type CallReplyLengthFn = fn(&Context, ReplyHandle) -> Result<usize>;
/// Nested reply at an index of an array reply.
pub type CallReplyArrayElementFn = fn(&mut Context, ReplyHandle, usize) -> Result<Option<ReplyHandle>>;
/// String payload of a reply.
pub type CallReplyStringPtrFn = fn(&Context, ReplyHandle) -> Result<Option<&[u8]>>;
/// Copy a reply's string payload into a module string.
pub type CreateStringFromCallReplyFn = fn(&Context, ReplyHandle) -> Result<Option<ModuleString>>;

/// Switch the invocation to scoped ownership.
pub type AutoMemoryFn = fn(&mut Context);

/// Queue a synthesized command for propagation.
pub type ReplicateFn = fn(&mut Context, &str, &str, &[CallArg]) -> Result<()>;
/// Propagate the invocation as the original client command.
pub type ReplicateVerbatimFn = fn(&mut Context) -> Result<()>;

macro_rules! capabilities {
    ($($name:ident($sig:ty)),* $(,)?) => {
        /// A host entry point, tagged by the capability it implements.
        #[derive(Clone, Copy)]
        pub enum Capability {
            $(
                #[allow(missing_docs)]
                $name($sig),
            )*
        }

        impl Capability {
            /// Name under which the capability is resolved.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Capability::$name(_) => stringify!($name),)*
                }
            }
        }

        /// Every capability name a host speaking `API_VERSION_1` provides.
        pub const CAPABILITY_NAMES: &[&str] = &[$(stringify!($name)),*];
    };
}

capabilities! {
    CreateCommand(CreateCommandFn),
    SetModuleAttribs(SetModuleAttribsFn),
    WrongArity(WrongArityFn),
    ReplyWithLongLong(ReplyWithLongLongFn),
    ReplyWithError(ReplyWithErrorFn),
    ReplyWithSimpleString(ReplyWithSimpleStringFn),
    ReplyWithArray(ReplyWithArrayFn),
    ReplyWithStringBuffer(ReplyWithStringBufferFn),
    ReplyWithString(ReplyWithStringFn),
    ReplyWithNull(ReplyWithNullFn),
    ReplyWithCallReply(ReplyWithCallReplyFn),
    ReplyWithDouble(ReplyWithDoubleFn),
    GetSelectedDb(GetSelectedDbFn),
    SelectDb(SelectDbFn),
    OpenKey(OpenKeyFn),
    CloseKey(CloseKeyFn),
    KeyType(KeyTypeFn),
    ValueLength(ValueLengthFn),
    DeleteKey(DeleteKeyFn),
    ListPush(ListPushFn),
    ListPop(ListPopFn),
    StringSet(StringSetFn),
    StringDMA(StringDmaFn),
    StringTruncate(StringTruncateFn),
    GetExpire(GetExpireFn),
    SetExpire(SetExpireFn),
    ZsetAdd(ZsetAddFn),
    ZsetIncrby(ZsetIncrbyFn),
    ZsetScore(ZsetScoreFn),
    ZsetRem(ZsetRemFn),
    ZsetFirstInRange(ZsetFirstInRangeFn),
    ZsetRangeCurrentElement(ZsetRangeCurrentElementFn),
    ZsetRangeNext(ZsetRangeNextFn),
    ZsetRangeEndReached(ZsetRangeEndReachedFn),
    ZsetRangeStop(ZsetRangeStopFn),
    Call(CallFn),
    CallReplyProto(CallReplyProtoFn),
    FreeCallReply(FreeCallReplyFn),
    CallReplyType(CallReplyTypeFn),
    CallReplyInteger(CallReplyIntegerFn),
    CallReplyLength(CallReplyLengthFn),
    CallReplyArrayElement(CallReplyArrayElementFn),
    CallReplyStringPtr(CallReplyStringPtrFn),
    CreateStringFromCallReply(CreateStringFromCallReplyFn),
    AutoMemory(AutoMemoryFn),
    Replicate(ReplicateFn),
    ReplicateVerbatim(ReplicateVerbatimFn),
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({})", self.name())
    }
}
