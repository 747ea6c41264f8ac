//! Per-invocation replication state.
//!
//! A handler queues commands with `Replicate` and with `Call(..., "!")`, in
//! the order it makes those calls. When the invocation ends the queue turns
//! into what replicas and the append-only log receive:
//!
//! | State | Propagated |
//! |-------|------------|
//! | verbatim requested | the original client command only |
//! | one entry | that entry |
//! | several entries | `MULTI`, the entries, `EXEC` |
//! | empty | nothing |

/// One command bound for replicas and the append-only log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagated {
    /// Database the command applies to. `None` for transaction markers,
    /// which apply to whatever database is current.
    pub db: Option<usize>,
    /// Command name and arguments
    pub argv: Vec<Vec<u8>>,
}

impl Propagated {
    /// A command applied to `db`
    pub fn new(db: usize, argv: Vec<Vec<u8>>) -> Self {
        Propagated { db: Some(db), argv }
    }

    fn marker(name: &str) -> Self {
        Propagated {
            db: None,
            argv: vec![name.as_bytes().to_vec()],
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Propagator {
    pending: Vec<Propagated>,
    verbatim: bool,
}

impl Propagator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue an entry, unless the whole invocation already goes out verbatim.
    pub(crate) fn push(&mut self, entry: Propagated) {
        if !self.verbatim {
            self.pending.push(entry);
        }
    }

    /// Drop everything queued so far and propagate the original command.
    pub(crate) fn set_verbatim(&mut self) {
        self.pending.clear();
        self.verbatim = true;
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// What this invocation propagates, given the client command as issued.
    pub(crate) fn finish(self, db: usize, original: &[Vec<u8>]) -> Vec<Propagated> {
        if self.verbatim {
            return vec![Propagated::new(db, original.to_vec())];
        }
        match self.pending.len() {
            0 | 1 => self.pending,
            _ => {
                let mut batch = Vec::with_capacity(self.pending.len() + 2);
                batch.push(Propagated::marker("MULTI"));
                batch.extend(self.pending);
                batch.push(Propagated::marker("EXEC"));
                batch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cmd(parts: &[&str]) -> Vec<Vec<u8>> {
        parts.iter().map(|p| p.as_bytes().to_vec()).collect()
    }

    fn names_of(batch: &[Propagated]) -> Vec<String> {
        batch
            .iter()
            .map(|p| String::from_utf8_lossy(&p.argv[0]).into_owned())
            .collect()
    }

    #[test]
    fn test_empty_propagates_nothing() {
        assert!(Propagator::new().finish(0, &cmd(&["X"])).is_empty());
    }

    #[test]
    fn test_single_entry_is_unwrapped() {
        let mut p = Propagator::new();
        p.push(Propagated::new(0, cmd(&["INCR", "a"])));
        let batch = p.finish(0, &cmd(&["orig"]));
        assert_eq!(batch, vec![Propagated::new(0, cmd(&["INCR", "a"]))]);
    }

    #[test]
    fn test_several_entries_are_wrapped_in_order() {
        let mut p = Propagator::new();
        for name in ["X", "Y", "Z"] {
            p.push(Propagated::new(0, cmd(&[name])));
        }
        let batch = p.finish(0, &cmd(&["orig"]));
        assert_eq!(names_of(&batch), vec!["MULTI", "X", "Y", "Z", "EXEC"]);
        assert_eq!(batch[0].db, None);
    }

    #[test]
    fn test_verbatim_discards_before_and_after() {
        let mut p = Propagator::new();
        p.push(Propagated::new(0, cmd(&["X"])));
        p.set_verbatim();
        p.push(Propagated::new(0, cmd(&["Y"])));
        assert_eq!(p.len(), 0);
        let batch = p.finish(3, &cmd(&["hello.cmd", "k"]));
        assert_eq!(batch, vec![Propagated::new(3, cmd(&["hello.cmd", "k"]))]);
    }

    proptest! {
        #[test]
        fn envelope_only_around_several_entries(names in prop::collection::vec("[A-Z]{1,6}", 0..8)) {
            let mut p = Propagator::new();
            for name in &names {
                p.push(Propagated::new(0, cmd(&[name.as_str()])));
            }
            let batch = p.finish(0, &cmd(&["orig"]));
            let mut got = names_of(&batch);
            if names.len() > 1 {
                prop_assert_eq!(got.remove(0), "MULTI");
                prop_assert_eq!(got.pop(), Some("EXEC".to_string()));
            }
            prop_assert_eq!(got, names);
        }
    }
}
