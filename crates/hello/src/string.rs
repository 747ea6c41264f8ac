use ember_module::prelude::*;

use crate::with_open_key;

/// `hello.toggle.case <key>`: swap the case of every ASCII letter in place.
/// An absent key is left absent.
pub(crate) fn toggle_case(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 2 {
        return ctx.wrong_arity();
    }
    reply_on_error(ctx, |ctx| {
        with_open_key(ctx, &argv[1], OpenMode::READ_WRITE, |ctx, key| {
            match ctx.key_type(key)? {
                KeyType::String => {
                    let mut bytes = ctx.string_dma(key)?;
                    bytes.iter_mut().for_each(toggle);
                }
                KeyType::Empty => {}
                _ => return Err(Error::WrongType),
            }
            Ok(())
        })?;
        ctx.replicate_verbatim()?;
        Ok(ctx.reply_with_simple_string("OK"))
    })
}

fn toggle(byte: &mut u8) {
    if byte.is_ascii_alphabetic() {
        *byte ^= 0x20;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_only_touches_letters() {
        let mut bytes = b"Hello, World 42!".to_vec();
        bytes.iter_mut().for_each(toggle);
        assert_eq!(bytes, b"hELLO, wORLD 42!");
    }
}
