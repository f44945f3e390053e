use tokio::sync::mpsc;

use crate::event::PollEvent;

pub trait Dispatcher {
    fn dispatch(&self, event: PollEvent);
}

/// Send errors are swallowed: a dropped receiver just means nobody is
/// listening anymore, which must never stall a poll tick.
impl Dispatcher for mpsc::UnboundedSender<PollEvent> {
    fn dispatch(&self, event: PollEvent) {
        let _ = self.send(event);
    }
}
