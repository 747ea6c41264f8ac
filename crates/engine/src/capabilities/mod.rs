//! Host implementations of every capability.
//!
//! Modules reach the host only through [`get_api`], the bootstrap accessor
//! stored first in every [`Context`](ember_core::Context) the host creates.
//!
//! | Module | Capabilities |
//! |--------|--------------|
//! | `load` | CreateCommand SetModuleAttribs |
//! | `reply` | WrongArity and the ReplyWith* family |
//! | `context` | GetSelectedDb SelectDb AutoMemory |
//! | `key` | key, list, string and expire operations |
//! | `zset` | sorted set operations and the range cursor |
//! | `call` | Call and the CallReply* family |
//! | `replicate` | Replicate ReplicateVerbatim |

mod call;
mod context;
mod key;
mod load;
mod replicate;
mod reply;
mod zset;

use ember_core::Capability;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

static CAPABILITIES: Lazy<FxHashMap<&'static str, Capability>> = Lazy::new(|| {
    [
        Capability::CreateCommand(load::create_command),
        Capability::SetModuleAttribs(load::set_module_attribs),
        Capability::WrongArity(reply::wrong_arity),
        Capability::ReplyWithLongLong(reply::with_long_long),
        Capability::ReplyWithError(reply::with_error),
        Capability::ReplyWithSimpleString(reply::with_simple_string),
        Capability::ReplyWithArray(reply::with_array),
        Capability::ReplyWithStringBuffer(reply::with_string_buffer),
        Capability::ReplyWithString(reply::with_string),
        Capability::ReplyWithNull(reply::with_null),
        Capability::ReplyWithCallReply(reply::with_call_reply),
        Capability::ReplyWithDouble(reply::with_double),
        Capability::GetSelectedDb(context::get_selected_db),
        Capability::SelectDb(context::select_db),
        Capability::OpenKey(key::open_key),
        Capability::CloseKey(key::close_key),
        Capability::KeyType(key::key_type),
        Capability::ValueLength(key::value_length),
        Capability::DeleteKey(key::delete_key),
        Capability::ListPush(key::list_push),
        Capability::ListPop(key::list_pop),
        Capability::StringSet(key::string_set),
        Capability::StringDMA(key::string_dma),
        Capability::StringTruncate(key::string_truncate),
        Capability::GetExpire(key::get_expire),
        Capability::SetExpire(key::set_expire),
        Capability::ZsetAdd(zset::add),
        Capability::ZsetIncrby(zset::incrby),
        Capability::ZsetScore(zset::score),
        Capability::ZsetRem(zset::rem),
        Capability::ZsetFirstInRange(zset::first_in_range),
        Capability::ZsetRangeCurrentElement(zset::current_element),
        Capability::ZsetRangeNext(zset::next),
        Capability::ZsetRangeEndReached(zset::end_reached),
        Capability::ZsetRangeStop(zset::stop),
        Capability::Call(call::call),
        Capability::CallReplyProto(call::proto),
        Capability::FreeCallReply(call::free),
        Capability::CallReplyType(call::reply_type),
        Capability::CallReplyInteger(call::integer),
        Capability::CallReplyLength(call::length),
        Capability::CallReplyArrayElement(call::array_element),
        Capability::CallReplyStringPtr(call::string_ptr),
        Capability::CreateStringFromCallReply(call::create_string),
        Capability::AutoMemory(context::auto_memory),
        Capability::Replicate(replicate::replicate),
        Capability::ReplicateVerbatim(replicate::verbatim),
    ]
    .into_iter()
    .map(|capability| (capability.name(), capability))
    .collect()
});

/// Bootstrap accessor: resolve a capability by name.
pub fn get_api(name: &str) -> Option<Capability> {
    CAPABILITIES.get(name).copied()
}
