//! Capabilities as methods on [`Context`].

use ember_core::{
    CallArg, CommandFn, Context, Error, KeyHandle, KeyType, ListEnd, ModuleString, OpenMode,
    ReplyHandle, ReplyType, Result, Status, StringDma, ZaddMode, ZaddOutcome, ZsetRange,
};

use crate::binder::api;

/// Host operations available to module code.
///
/// Every method forwards to the bound capability table, so none of them may
/// be used before [`init`](crate::init) succeeded.
pub trait ModuleContext {
    /// Stage a command during `on_load`.
    fn create_command(&mut self, name: &str, handler: CommandFn) -> Result<()>;

    /// Reply with the standard wrong-arity error for the running command.
    fn wrong_arity(&mut self) -> Status;
    /// Reply with an integer.
    fn reply_with_long_long(&mut self, value: i64) -> Status;
    /// Reply with an error; `message` should start with a class token.
    fn reply_with_error(&mut self, message: &str) -> Status;
    /// Reply with a status line.
    fn reply_with_simple_string(&mut self, status: &str) -> Status;
    /// Open an array of `len` elements.
    fn reply_with_array(&mut self, len: usize) -> Status;
    /// Reply with a binary-safe string.
    fn reply_with_string_buffer(&mut self, bytes: &[u8]) -> Status;
    /// Reply with a module string.
    fn reply_with_string(&mut self, s: &ModuleString) -> Status;
    /// Reply with null.
    fn reply_with_null(&mut self) -> Status;
    /// Relay a nested call's reply unchanged.
    fn reply_with_call_reply(&mut self, reply: ReplyHandle) -> Status;
    /// Reply with a double.
    fn reply_with_double(&mut self, value: f64) -> Status;

    /// Reply with `err` rendered as `<CLASS> <message>`.
    fn reply_with_result_error(&mut self, err: &Error) -> Status {
        self.reply_with_error(&err.reply_message())
    }

    /// Database the invocation currently targets.
    fn selected_db(&self) -> usize;
    /// Switch the invocation to another database.
    fn select_db(&mut self, db: usize) -> Result<()>;

    /// Open a key handle.
    fn open_key(&mut self, name: &[u8], mode: OpenMode) -> Result<KeyHandle>;
    /// Release a key handle.
    fn close_key(&mut self, key: KeyHandle) -> Result<()>;
    /// Type of the value behind the handle.
    fn key_type(&mut self, key: KeyHandle) -> Result<KeyType>;
    /// Length of the value; 0 for an empty key.
    fn value_length(&mut self, key: KeyHandle) -> Result<usize>;
    /// Delete the key.
    fn delete_key(&mut self, key: KeyHandle) -> Result<()>;
    /// Push onto a list, returning the new length.
    fn list_push(&mut self, key: KeyHandle, end: ListEnd, element: &ModuleString) -> Result<usize>;
    /// Pop from a list.
    fn list_pop(&mut self, key: KeyHandle, end: ListEnd) -> Result<Option<ModuleString>>;
    /// Replace the value with a string.
    fn string_set(&mut self, key: KeyHandle, value: &ModuleString) -> Result<()>;
    /// Borrow the stored string bytes for in-place mutation.
    fn string_dma(&mut self, key: KeyHandle) -> Result<StringDma<'_>>;
    /// Resize the stored string, zero-padding when it grows.
    fn string_truncate(&mut self, key: KeyHandle, len: usize) -> Result<()>;
    /// Remaining time to live in milliseconds, or `NO_EXPIRE`.
    fn get_expire(&mut self, key: KeyHandle) -> Result<i64>;
    /// Set the time to live in milliseconds from now; `NO_EXPIRE` persists.
    fn set_expire(&mut self, key: KeyHandle, millis: i64) -> Result<()>;

    /// Add or update a sorted set member.
    fn zset_add(
        &mut self,
        key: KeyHandle,
        score: f64,
        member: &ModuleString,
        mode: ZaddMode,
    ) -> Result<ZaddOutcome>;
    /// Increment a member's score, returning the new score if it changed.
    fn zset_incrby(
        &mut self,
        key: KeyHandle,
        delta: f64,
        member: &ModuleString,
        mode: ZaddMode,
    ) -> Result<(ZaddOutcome, Option<f64>)>;
    /// Score of a member.
    fn zset_score(&mut self, key: KeyHandle, member: &ModuleString) -> Result<Option<f64>>;
    /// Remove a member; true if it was present.
    fn zset_rem(&mut self, key: KeyHandle, member: &ModuleString) -> Result<bool>;
    /// Position the key's range cursor at the first element of `range`.
    fn zset_first_in_range(&mut self, key: KeyHandle, range: &ZsetRange) -> Result<()>;
    /// Element under the cursor.
    fn zset_range_current_element(&mut self, key: KeyHandle) -> Result<(ModuleString, f64)>;
    /// Advance the cursor; false once past the end.
    fn zset_range_next(&mut self, key: KeyHandle) -> Result<bool>;
    /// Whether the cursor is past the end.
    fn zset_range_end_reached(&mut self, key: KeyHandle) -> Result<bool>;
    /// Drop the cursor.
    fn zset_range_stop(&mut self, key: KeyHandle) -> Result<()>;

    /// Run a command through the host's own dispatcher.
    fn call(&mut self, command: &str, format: &str, args: &[CallArg]) -> Result<ReplyHandle>;
    /// Encoded bytes of a reply.
    fn call_reply_proto(&self, reply: ReplyHandle) -> Result<&[u8]>;
    /// Release a reply and every element handle derived from it.
    fn free_call_reply(&mut self, reply: ReplyHandle) -> Result<()>;
    /// Kind of a reply.
    fn call_reply_type(&self, reply: ReplyHandle) -> Result<ReplyType>;
    /// Integer value; 0 for non-integers.
    fn call_reply_integer(&self, reply: ReplyHandle) -> Result<i64>;
    /// String length or element count.
    fn call_reply_length(&self, reply: ReplyHandle) -> Result<usize>;
    /// Handle to an array element.
    fn call_reply_array_element(
        &mut self,
        reply: ReplyHandle,
        index: usize,
    ) -> Result<Option<ReplyHandle>>;
    /// Bytes of a string or error reply.
    fn call_reply_string_ptr(&self, reply: ReplyHandle) -> Result<Option<&[u8]>>;
    /// Copy a string-like reply into a module string.
    fn create_string_from_call_reply(&self, reply: ReplyHandle) -> Result<Option<ModuleString>>;

    /// Release everything still open when the invocation ends.
    fn auto_memory(&mut self);
    /// Queue a command for replicas and the append-only log.
    fn replicate(&mut self, command: &str, format: &str, args: &[CallArg]) -> Result<()>;
    /// Propagate the client's command as issued instead of anything queued.
    fn replicate_verbatim(&mut self) -> Result<()>;
}

impl ModuleContext for Context {
    fn create_command(&mut self, name: &str, handler: CommandFn) -> Result<()> {
        (api().create_command)(self, name, handler)
    }

    fn wrong_arity(&mut self) -> Status {
        (api().wrong_arity)(self)
    }

    fn reply_with_long_long(&mut self, value: i64) -> Status {
        (api().reply_with_long_long)(self, value)
    }

    fn reply_with_error(&mut self, message: &str) -> Status {
        (api().reply_with_error)(self, message)
    }

    fn reply_with_simple_string(&mut self, status: &str) -> Status {
        (api().reply_with_simple_string)(self, status)
    }

    fn reply_with_array(&mut self, len: usize) -> Status {
        (api().reply_with_array)(self, len)
    }

    fn reply_with_string_buffer(&mut self, bytes: &[u8]) -> Status {
        (api().reply_with_string_buffer)(self, bytes)
    }

    fn reply_with_string(&mut self, s: &ModuleString) -> Status {
        (api().reply_with_string)(self, s)
    }

    fn reply_with_null(&mut self) -> Status {
        (api().reply_with_null)(self)
    }

    fn reply_with_call_reply(&mut self, reply: ReplyHandle) -> Status {
        (api().reply_with_call_reply)(self, reply)
    }

    fn reply_with_double(&mut self, value: f64) -> Status {
        (api().reply_with_double)(self, value)
    }

    fn selected_db(&self) -> usize {
        (api().get_selected_db)(self)
    }

    fn select_db(&mut self, db: usize) -> Result<()> {
        (api().select_db)(self, db)
    }

    fn open_key(&mut self, name: &[u8], mode: OpenMode) -> Result<KeyHandle> {
        (api().open_key)(self, name, mode)
    }

    fn close_key(&mut self, key: KeyHandle) -> Result<()> {
        (api().close_key)(self, key)
    }

    fn key_type(&mut self, key: KeyHandle) -> Result<KeyType> {
        (api().key_type)(self, key)
    }

    fn value_length(&mut self, key: KeyHandle) -> Result<usize> {
        (api().value_length)(self, key)
    }

    fn delete_key(&mut self, key: KeyHandle) -> Result<()> {
        (api().delete_key)(self, key)
    }

    fn list_push(&mut self, key: KeyHandle, end: ListEnd, element: &ModuleString) -> Result<usize> {
        (api().list_push)(self, key, end, element)
    }

    fn list_pop(&mut self, key: KeyHandle, end: ListEnd) -> Result<Option<ModuleString>> {
        (api().list_pop)(self, key, end)
    }

    fn string_set(&mut self, key: KeyHandle, value: &ModuleString) -> Result<()> {
        (api().string_set)(self, key, value)
    }

    fn string_dma(&mut self, key: KeyHandle) -> Result<StringDma<'_>> {
        (api().string_dma)(self, key)
    }

    fn string_truncate(&mut self, key: KeyHandle, len: usize) -> Result<()> {
        (api().string_truncate)(self, key, len)
    }

    fn get_expire(&mut self, key: KeyHandle) -> Result<i64> {
        (api().get_expire)(self, key)
    }

    fn set_expire(&mut self, key: KeyHandle, millis: i64) -> Result<()> {
        (api().set_expire)(self, key, millis)
    }

    fn zset_add(
        &mut self,
        key: KeyHandle,
        score: f64,
        member: &ModuleString,
        mode: ZaddMode,
    ) -> Result<ZaddOutcome> {
        (api().zset_add)(self, key, score, member, mode)
    }

    fn zset_incrby(
        &mut self,
        key: KeyHandle,
        delta: f64,
        member: &ModuleString,
        mode: ZaddMode,
    ) -> Result<(ZaddOutcome, Option<f64>)> {
        (api().zset_incrby)(self, key, delta, member, mode)
    }

    fn zset_score(&mut self, key: KeyHandle, member: &ModuleString) -> Result<Option<f64>> {
        (api().zset_score)(self, key, member)
    }

    fn zset_rem(&mut self, key: KeyHandle, member: &ModuleString) -> Result<bool> {
        (api().zset_rem)(self, key, member)
    }

    fn zset_first_in_range(&mut self, key: KeyHandle, range: &ZsetRange) -> Result<()> {
        (api().zset_first_in_range)(self, key, range)
    }

    fn zset_range_current_element(&mut self, key: KeyHandle) -> Result<(ModuleString, f64)> {
        (api().zset_range_current_element)(self, key)
    }

    fn zset_range_next(&mut self, key: KeyHandle) -> Result<bool> {
        (api().zset_range_next)(self, key)
    }

    fn zset_range_end_reached(&mut self, key: KeyHandle) -> Result<bool> {
        (api().zset_range_end_reached)(self, key)
    }

    fn zset_range_stop(&mut self, key: KeyHandle) -> Result<()> {
        (api().zset_range_stop)(self, key)
    }

    fn call(&mut self, command: &str, format: &str, args: &[CallArg]) -> Result<ReplyHandle> {
        (api().call)(self, command, format, args)
    }

    fn call_reply_proto(&self, reply: ReplyHandle) -> Result<&[u8]> {
        (api().call_reply_proto)(self, reply)
    }

    fn free_call_reply(&mut self, reply: ReplyHandle) -> Result<()> {
        (api().free_call_reply)(self, reply)
    }

    fn call_reply_type(&self, reply: ReplyHandle) -> Result<ReplyType> {
        (api().call_reply_type)(self, reply)
    }

    fn call_reply_integer(&self, reply: ReplyHandle) -> Result<i64> {
        (api().call_reply_integer)(self, reply)
    }

    fn call_reply_length(&self, reply: ReplyHandle) -> Result<usize> {
        (api().call_reply_length)(self, reply)
    }

    fn call_reply_array_element(
        &mut self,
        reply: ReplyHandle,
        index: usize,
    ) -> Result<Option<ReplyHandle>> {
        (api().call_reply_array_element)(self, reply, index)
    }

    fn call_reply_string_ptr(&self, reply: ReplyHandle) -> Result<Option<&[u8]>> {
        (api().call_reply_string_ptr)(self, reply)
    }

    fn create_string_from_call_reply(&self, reply: ReplyHandle) -> Result<Option<ModuleString>> {
        (api().create_string_from_call_reply)(self, reply)
    }

    fn auto_memory(&mut self) {
        (api().auto_memory)(self)
    }

    fn replicate(&mut self, command: &str, format: &str, args: &[CallArg]) -> Result<()> {
        (api().replicate)(self, command, format, args)
    }

    fn replicate_verbatim(&mut self) -> Result<()> {
        (api().replicate_verbatim)(self)
    }
}

/// Run a handler body, turning an `Err` into an error reply.
///
/// Handlers written against `Result` stay free of reply plumbing on their
/// error paths:
///
/// ```ignore
/// fn handler(ctx: &mut Context, argv: &[ModuleString]) -> Status {
///     reply_on_error(ctx, |ctx| {
///         let key = ctx.open_key(&argv[1], OpenMode::READ)?;
///         let len = ctx.value_length(key)?;
///         Ok(ctx.reply_with_long_long(len as i64))
///     })
/// }
/// ```
pub fn reply_on_error(
    ctx: &mut Context,
    body: impl FnOnce(&mut Context) -> Result<Status>,
) -> Status {
    match body(ctx) {
        Ok(status) => status,
        Err(err) => {
            ctx.reply_with_result_error(&err);
            Status::Err
        }
    }
}
