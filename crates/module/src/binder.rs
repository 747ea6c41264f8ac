//! Capability table, resolved from the host once at load time.
//!
//! The host hands the module a [`Context`] whose first field is a bootstrap
//! accessor. [`init`] asks it for every capability this SDK uses, checks
//! that each name resolved to an entry point of the expected kind, lets the
//! host accept the module's name and protocol version, and only then
//! publishes the table for the rest of the process.

use std::fmt;

use ember_core::capability::*;
use ember_core::{Capability, Context, Error, GetApiFn, Result};
use once_cell::sync::OnceCell;
use tracing::debug;

static TABLE: OnceCell<CapabilityTable> = OnceCell::new();

/// Resolve one capability or return the binding error.
macro_rules! resolve {
    ($get_api:expr, $name:ident) => {
        match ($get_api)(stringify!($name)) {
            Some(Capability::$name(entry)) => entry,
            Some(_) => {
                return Err(Error::CapabilityMismatch {
                    name: stringify!($name).to_string(),
                })
            }
            None => {
                return Err(Error::CapabilityMissing {
                    name: stringify!($name).to_string(),
                })
            }
        }
    };
}

macro_rules! capability_table {
    ($($field:ident: $name:ident($sig:ty)),* $(,)?) => {
        /// Host entry points, one field per capability.
        #[derive(Clone, Copy)]
        pub struct CapabilityTable {
            $(
                #[allow(missing_docs)]
                pub $field: $sig,
            )*
        }

        impl CapabilityTable {
            /// Resolve every capability through the bootstrap accessor.
            ///
            /// Fails on the first name that is missing or resolves to an
            /// entry point of another kind.
            pub fn resolve(get_api: GetApiFn) -> Result<Self> {
                Ok(CapabilityTable {
                    $($field: resolve!(get_api, $name),)*
                })
            }
        }
    };
}

capability_table! {
    create_command: CreateCommand(CreateCommandFn),
    set_module_attribs: SetModuleAttribs(SetModuleAttribsFn),
    wrong_arity: WrongArity(WrongArityFn),
    reply_with_long_long: ReplyWithLongLong(ReplyWithLongLongFn),
    reply_with_error: ReplyWithError(ReplyWithErrorFn),
    reply_with_simple_string: ReplyWithSimpleString(ReplyWithSimpleStringFn),
    reply_with_array: ReplyWithArray(ReplyWithArrayFn),
    reply_with_string_buffer: ReplyWithStringBuffer(ReplyWithStringBufferFn),
    reply_with_string: ReplyWithString(ReplyWithStringFn),
    reply_with_null: ReplyWithNull(ReplyWithNullFn),
    reply_with_call_reply: ReplyWithCallReply(ReplyWithCallReplyFn),
    reply_with_double: ReplyWithDouble(ReplyWithDoubleFn),
    get_selected_db: GetSelectedDb(GetSelectedDbFn),
    select_db: SelectDb(SelectDbFn),
    open_key: OpenKey(OpenKeyFn),
    close_key: CloseKey(CloseKeyFn),
    key_type: KeyType(KeyTypeFn),
    value_length: ValueLength(ValueLengthFn),
    delete_key: DeleteKey(DeleteKeyFn),
    list_push: ListPush(ListPushFn),
    list_pop: ListPop(ListPopFn),
    string_set: StringSet(StringSetFn),
    string_dma: StringDMA(StringDmaFn),
    string_truncate: StringTruncate(StringTruncateFn),
    get_expire: GetExpire(GetExpireFn),
    set_expire: SetExpire(SetExpireFn),
    zset_add: ZsetAdd(ZsetAddFn),
    zset_incrby: ZsetIncrby(ZsetIncrbyFn),
    zset_score: ZsetScore(ZsetScoreFn),
    zset_rem: ZsetRem(ZsetRemFn),
    zset_first_in_range: ZsetFirstInRange(ZsetFirstInRangeFn),
    zset_range_current_element: ZsetRangeCurrentElement(ZsetRangeCurrentElementFn),
    zset_range_next: ZsetRangeNext(ZsetRangeNextFn),
    zset_range_end_reached: ZsetRangeEndReached(ZsetRangeEndReachedFn),
    zset_range_stop: ZsetRangeStop(ZsetRangeStopFn),
    call: Call(CallFn),
    call_reply_proto: CallReplyProto(CallReplyProtoFn),
    free_call_reply: FreeCallReply(FreeCallReplyFn),
    call_reply_type: CallReplyType(CallReplyTypeFn),
    call_reply_integer: CallReplyInteger(CallReplyIntegerFn),
    call_reply_length: CallReplyLength(CallReplyLengthFn),
    call_reply_array_element: CallReplyArrayElement(CallReplyArrayElementFn),
    call_reply_string_ptr: CallReplyStringPtr(CallReplyStringPtrFn),
    create_string_from_call_reply: CreateStringFromCallReply(CreateStringFromCallReplyFn),
    auto_memory: AutoMemory(AutoMemoryFn),
    replicate: Replicate(ReplicateFn),
    replicate_verbatim: ReplicateVerbatim(ReplicateVerbatimFn),
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable").finish_non_exhaustive()
    }
}

/// Bind the module to the host. Must be the first thing `on_load` does.
///
/// Fails, and leaves nothing published, if a capability is missing or of
/// the wrong kind, or if the host rejects the module name or
/// `api_version`. The first successful bind in the process publishes the
/// table; later binds are still validated against their host but keep it.
pub fn init(ctx: &mut Context, name: &str, version: u32, api_version: u32) -> Result<()> {
    let table = CapabilityTable::resolve(ctx.bootstrap())?;
    (table.set_module_attribs)(ctx, name, version, api_version)?;
    TABLE.get_or_init(|| table);
    debug!(target: "ember::module", module = name, version, api_version, "capabilities bound");
    Ok(())
}

/// Whether [`init`] has succeeded in this process.
pub fn is_bound() -> bool {
    TABLE.get().is_some()
}

/// The bound capability table.
///
/// # Panics
///
/// Panics if called before [`init`] succeeded. Hosts only dispatch to a
/// module's commands after its `on_load`, and so its `init`, succeeded.
pub fn api() -> &'static CapabilityTable {
    TABLE
        .get()
        .expect("ember_module::init must succeed before capabilities are used")
}
