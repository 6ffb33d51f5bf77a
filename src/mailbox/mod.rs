//! Mailbox sessions: the [`Mailbox`] seam and guaranteed release.

pub mod imap;

use std::ops::{Deref, DerefMut};

use chrono::NaiveDate;

use crate::model::record::{MessageId, RawMessage};

pub use self::imap::ImapMailbox;

/// An open, authenticated mailbox with one folder selected.
pub trait Mailbox {
    /// Identifiers of messages dated on or after `since`, in server order.
    ///
    /// A failed query is logged and yields an empty list.
    fn list_recent(&mut self, since: NaiveDate) -> Vec<MessageId>;

    /// Full wire bytes of one message, or `None` if the server would not
    /// return them. Per-message failures never end the session.
    fn fetch_raw(&mut self, id: MessageId) -> Option<RawMessage>;

    /// Release the connection. Errors are logged, not returned.
    fn close(&mut self);
}

/// Owns a [`Mailbox`] and closes it exactly once.
///
/// Call [`SessionGuard::close`] on the normal path; if the guard is dropped
/// first (early return, `?`, panic) the mailbox is closed on drop.
pub struct SessionGuard<M: Mailbox> {
    mailbox: M,
    closed: bool,
}

impl<M: Mailbox> SessionGuard<M> {
    pub fn new(mailbox: M) -> Self {
        Self {
            mailbox,
            closed: false,
        }
    }

    /// Close now. Consumes the guard so it cannot be closed twice.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.mailbox.close();
        }
    }
}

impl<M: Mailbox> Deref for SessionGuard<M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.mailbox
    }
}

impl<M: Mailbox> DerefMut for SessionGuard<M> {
    fn deref_mut(&mut self) -> &mut M {
        &mut self.mailbox
    }
}

impl<M: Mailbox> Drop for SessionGuard<M> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!("Session guard dropped before close, releasing mailbox");
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counting {
        closes: Rc<Cell<u32>>,
    }

    impl Mailbox for Counting {
        fn list_recent(&mut self, _since: NaiveDate) -> Vec<MessageId> {
            vec![MessageId(1)]
        }

        fn fetch_raw(&mut self, _id: MessageId) -> Option<RawMessage> {
            None
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    fn counting() -> (Counting, Rc<Cell<u32>>) {
        let closes = Rc::new(Cell::new(0));
        (
            Counting {
                closes: Rc::clone(&closes),
            },
            closes,
        )
    }

    #[test]
    fn test_explicit_close_runs_once() {
        let (mailbox, closes) = counting();
        let guard = SessionGuard::new(mailbox);
        guard.close();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_drop_closes() {
        let (mailbox, closes) = counting();
        {
            let mut guard = SessionGuard::new(mailbox);
            let since = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
            assert_eq!(guard.list_recent(since), vec![MessageId(1)]);
        }
        assert_eq!(closes.get(), 1);
    }
}
